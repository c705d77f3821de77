//! HTTP server for the LibraAI assistant.
//!
//! Serves the browser page and exposes every assistant operation as a tool
//! dispatched through the same `POST /tools/{name}` handler.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Browser UI |
//! | `GET`  | `/tools/list` | List all registered tools with schemas |
//! | `POST` | `/tools/{name}` | Call any registered tool by name |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "title must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `tool_error` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::library::Library;
use crate::traits::{validate_params, ToolContext, ToolRegistry};

const INDEX_HTML: &str = include_str!("ui/index.html");

#[derive(Clone)]
struct AppState {
    library: Arc<Library>,
    tools: Arc<ToolRegistry>,
}

/// Build the library from `config` and serve it on `[server].bind`.
///
/// Runs until the process is terminated; returns an error if binding fails.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let library = Arc::new(Library::from_config(config));
    if let Some(warning) = library.load_warning() {
        tracing::warn!("{}", warning);
    }
    run_server_with_library(&config.server.bind, library, ToolRegistry::with_builtins()).await
}

/// Serve an already-built [`Library`] with the given tools.
///
/// # Example
///
/// ```rust,no_run
/// use libra_ai::library::Library;
/// use libra_ai::server::run_server_with_library;
/// use libra_ai::traits::ToolRegistry;
/// use std::sync::Arc;
///
/// # async fn example(library: Library) -> anyhow::Result<()> {
/// let mut tools = ToolRegistry::with_builtins();
/// // tools.register(Box::new(MyTool::new()));
/// run_server_with_library("127.0.0.1:8501", Arc::new(library), tools).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_server_with_library(
    bind_addr: &str,
    library: Arc<Library>,
    tools: ToolRegistry,
) -> anyhow::Result<()> {
    for t in tools.tools() {
        let tag = if t.is_builtin() { "builtin" } else { "custom" };
        tracing::debug!(tool = t.name(), tag, "registered tool");
    }

    let state = AppState {
        library,
        tools: Arc::new(tools),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(handle_index))
        .route("/tools/list", get(handle_list_tools))
        .route("/tools/{name}", post(handle_tool_call))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("LibraAI listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn tool_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "tool_error".to_string(),
        message: message.into(),
    }
}

/// Map a tool failure to a status code by its message: blank or malformed
/// input is the caller's fault (400), everything else is ours (500).
fn classify_tool_error(tool_name: &str, err: anyhow::Error) -> AppError {
    let msg = format!("{:#}", err);

    if msg.contains("must not be empty") || msg.contains("invalid") {
        bad_request(format!("{}: {}", tool_name, msg))
    } else {
        tracing::error!(tool = tool_name, error = %msg, "tool failed");
        tool_error(format!("{}: {}", tool_name, msg))
    }
}

// ============ GET / ============

async fn handle_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /tools/list ============

#[derive(Serialize)]
struct ToolInfo {
    name: String,
    description: String,
    builtin: bool,
    parameters: serde_json::Value,
}

#[derive(Serialize)]
struct ToolListResponse {
    tools: Vec<ToolInfo>,
}

async fn handle_list_tools(State(state): State<AppState>) -> Json<ToolListResponse> {
    let tools = state
        .tools
        .tools()
        .iter()
        .map(|t| ToolInfo {
            name: t.name().to_string(),
            description: t.description().to_string(),
            builtin: t.is_builtin(),
            parameters: t.parameters_schema(),
        })
        .collect();

    Json(ToolListResponse { tools })
}

// ============ POST /tools/{name} ============

/// Look up the tool, validate parameters against its schema, and execute.
///
/// Returns `404` for an unknown tool, `400` for parameter errors, and `500`
/// for execution errors.
async fn handle_tool_call(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(params): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, AppError> {
    let tool = state
        .tools
        .find(&name)
        .ok_or_else(|| not_found(format!("no tool registered with name: {}", name)))?;

    let validated_params = validate_params(&tool.parameters_schema(), &params)
        .map_err(|e| bad_request(format!("{}: {}", name, e)))?;

    let ctx = ToolContext::new(state.library.clone());
    let result = tool
        .execute(validated_params, &ctx)
        .await
        .map_err(|e| classify_tool_error(&name, e))?;

    Ok(Json(serde_json::json!({ "result": result })))
}
