//! Tool trait and registry.
//!
//! Every operation the assistant exposes over HTTP is a [`Tool`]: a name, a
//! description, a JSON Schema for its parameters, and an async `execute`.
//! The server lists them at `GET /tools/list` and dispatches
//! `POST /tools/{name}` through [`ToolRegistry`], validating parameters with
//! [`validate_params`] first.
//!
//! # Usage
//!
//! ```rust
//! use libra_ai::traits::ToolRegistry;
//!
//! let mut tools = ToolRegistry::with_builtins();
//! assert!(tools.find("search_books").is_some());
//! // tools.register(Box::new(MyTool::new()));
//! ```

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::assistant;
use crate::library::Library;

// ═══════════════════════════════════════════════════════════════════════
// Tool Trait
// ═══════════════════════════════════════════════════════════════════════

/// An operation callable via `POST /tools/{name}`.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use anyhow::Result;
/// use serde_json::{json, Value};
/// use libra_ai::traits::{Tool, ToolContext};
///
/// pub struct CountBooksTool;
///
/// #[async_trait]
/// impl Tool for CountBooksTool {
///     fn name(&self) -> &str { "count_books" }
///     fn description(&self) -> &str { "Count catalog records" }
///
///     fn parameters_schema(&self) -> Value {
///         json!({ "type": "object", "properties": {}, "required": [] })
///     }
///
///     async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<Value> {
///         let info = ctx.library().catalog_info()?;
///         Ok(json!({ "books": info.books }))
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Route name, lowercase with underscores (e.g. `"search_books"`).
    fn name(&self) -> &str;

    /// One-line description shown in `GET /tools/list`.
    fn description(&self) -> &str;

    /// Whether this tool ships with the crate. Defaults to `false`.
    fn is_builtin(&self) -> bool {
        false
    }

    /// JSON Schema object with `type: "object"`, `properties`, and
    /// optionally `required`.
    fn parameters_schema(&self) -> Value;

    /// Execute with validated parameters. The returned value is wrapped in
    /// `{ "result": ... }` by the server.
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value>;
}

// ═══════════════════════════════════════════════════════════════════════
// ToolContext
// ═══════════════════════════════════════════════════════════════════════

/// Bridge from a tool invocation to the shared [`Library`].
pub struct ToolContext {
    library: Arc<Library>,
}

impl ToolContext {
    pub fn new(library: Arc<Library>) -> Self {
        Self { library }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }
}

/// Fetch a required, non-blank string parameter.
fn required_str<'a>(params: &'a Value, name: &str) -> Result<&'a str> {
    let value = params[name].as_str().unwrap_or("");
    if value.trim().is_empty() {
        bail!("{} must not be empty", name);
    }
    Ok(value)
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in Tool Implementations
// ═══════════════════════════════════════════════════════════════════════

pub struct SearchBooksTool;

#[async_trait]
impl Tool for SearchBooksTool {
    fn name(&self) -> &str {
        "search_books"
    }

    fn description(&self) -> &str {
        "Search the catalog by title"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Text to look for in book titles" }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let query = required_str(&params, "query")?;
        let results = ctx.library.search(query)?;
        let message = results.is_empty().then_some("No books found.");
        Ok(json!({ "results": results, "message": message }))
    }
}

pub struct RecommendBooksTool;

#[async_trait]
impl Tool for RecommendBooksTool {
    fn name(&self) -> &str {
        "recommend_books"
    }

    fn description(&self) -> &str {
        "Recommend books by genre and skill level"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "genre": { "type": "string", "default": "" },
                "skill_level": { "type": "string", "default": "" }
            }
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let genre = params["genre"].as_str().unwrap_or("");
        let skill = params["skill_level"].as_str().unwrap_or("");
        let results = ctx.library.recommend(genre, skill)?;
        let message = results.is_empty().then_some("No recommendations available.");
        Ok(json!({ "results": results, "message": message }))
    }
}

pub struct CheckAvailabilityTool;

#[async_trait]
impl Tool for CheckAvailabilityTool {
    fn name(&self) -> &str {
        "check_availability"
    }

    fn description(&self) -> &str {
        "Check whether a book can be borrowed"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "title": { "type": "string", "description": "Full or partial book title" }
            },
            "required": ["title"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let title = required_str(&params, "title")?;
        let message = ctx.library.check_availability(title)?;
        Ok(json!({ "message": message }))
    }
}

pub struct BorrowBookTool;

#[async_trait]
impl Tool for BorrowBookTool {
    fn name(&self) -> &str {
        "borrow_book"
    }

    fn description(&self) -> &str {
        "Borrow a book and email a confirmation"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "title": { "type": "string" },
                "email": { "type": "string", "description": "Confirmation recipient", "default": "" }
            },
            "required": ["title"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let title = required_str(&params, "title")?;
        let email = params["email"].as_str().unwrap_or("");
        let outcome = ctx.library.borrow(title, email).await?;
        Ok(serde_json::to_value(&outcome)?)
    }
}

pub struct RenewBookTool;

#[async_trait]
impl Tool for RenewBookTool {
    fn name(&self) -> &str {
        "renew_book"
    }

    fn description(&self) -> &str {
        "Auto-renew a borrowed book that is nearly due"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "title": { "type": "string" }
            },
            "required": ["title"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let title = required_str(&params, "title")?;
        let renewal = ctx.library.renew(title)?;
        Ok(serde_json::to_value(&renewal)?)
    }
}

pub struct SubscribeTool;

#[async_trait]
impl Tool for SubscribeTool {
    fn name(&self) -> &str {
        "subscribe"
    }

    fn description(&self) -> &str {
        "Subscribe an email address to new-arrival notifications"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "email": { "type": "string" }
            },
            "required": ["email"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let email = required_str(&params, "email")?;
        let (status, message) = ctx.library.subscribe(email).await;
        Ok(json!({ "email": status, "message": message }))
    }
}

pub struct ChatTool;

#[async_trait]
impl Tool for ChatTool {
    fn name(&self) -> &str {
        "chat"
    }

    fn description(&self) -> &str {
        "Chat with LibraAI"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "message": { "type": "string" }
            },
            "required": ["message"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let message = required_str(&params, "message")?;
        let reply = assistant::respond(&ctx.library, message).await?;
        Ok(serde_json::to_value(&reply)?)
    }
}

pub struct AskTool;

#[async_trait]
impl Tool for AskTool {
    fn name(&self) -> &str {
        "ask"
    }

    fn description(&self) -> &str {
        "AI suggestion plus catalog search for a question about books"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string" }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let query = required_str(&params, "query")?;
        let response = assistant::ask(&ctx.library, query).await?;
        Ok(serde_json::to_value(&response)?)
    }
}

pub struct LookupServiceTool;

#[async_trait]
impl Tool for LookupServiceTool {
    fn name(&self) -> &str {
        "lookup_service"
    }

    fn description(&self) -> &str {
        "Find the library service that best matches a query"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string" }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let query = required_str(&params, "query")?;
        let found = ctx.library.lookup_service(query);
        Ok(json!({ "match": found }))
    }
}

pub struct CatalogInfoTool;

#[async_trait]
impl Tool for CatalogInfoTool {
    fn name(&self) -> &str {
        "catalog_info"
    }

    fn description(&self) -> &str {
        "Catalog size, genres, skill levels, and titles"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<Value> {
        let info = ctx.library.catalog_info()?;
        Ok(serde_json::to_value(&info)?)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════

pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty tool registry.
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Create a tool registry pre-loaded with every built-in tool.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(SearchBooksTool));
        registry.register(Box::new(RecommendBooksTool));
        registry.register(Box::new(CheckAvailabilityTool));
        registry.register(Box::new(BorrowBookTool));
        registry.register(Box::new(RenewBookTool));
        registry.register(Box::new(SubscribeTool));
        registry.register(Box::new(ChatTool));
        registry.register(Box::new(AskTool));
        registry.register(Box::new(LookupServiceTool));
        registry.register(Box::new(CatalogInfoTool));
        registry
    }

    /// Register a tool. A later tool with the same name shadows nothing;
    /// [`find`](ToolRegistry::find) returns the first registered.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Parameter validation
// ═══════════════════════════════════════════════════════════════════════

/// Check `params` against a tool's schema and fill in schema defaults.
///
/// Rejects parameters the schema does not declare, required parameters that
/// are missing, null, or blank strings, and values of the wrong JSON type.
/// Messages name the offending parameter and use the same wording the tools
/// use (`"<name> must not be empty"`).
pub fn validate_params(schema: &Value, params: &Value) -> Result<Value> {
    let mut given = match params {
        Value::Object(map) => map.clone(),
        Value::Null => serde_json::Map::new(),
        other => bail!("parameters must be a JSON object, got {}", json_type_name(other)),
    };

    let no_properties = serde_json::Map::new();
    let properties = schema["properties"].as_object().unwrap_or(&no_properties);
    let required = schema["required"].as_array().map(Vec::as_slice).unwrap_or(&[]);

    if let Some(unknown) = given.keys().find(|k| !properties.contains_key(*k)) {
        bail!("unknown parameter: {}", unknown);
    }

    for name in required.iter().filter_map(Value::as_str) {
        match given.get(name) {
            None | Some(Value::Null) => bail!("missing required parameter: {}", name),
            Some(Value::String(s)) if s.trim().is_empty() => bail!("{} must not be empty", name),
            Some(_) => {}
        }
    }

    for (name, prop) in properties {
        if let Some(value) = given.get(name) {
            check_type(name, prop, value)?;
        } else if let Some(default) = prop.get("default") {
            given.insert(name.clone(), default.clone());
        }
    }

    Ok(Value::Object(given))
}

fn check_type(name: &str, prop: &Value, value: &Value) -> Result<()> {
    let Some(expected) = prop["type"].as_str() else {
        return Ok(());
    };
    let matches = match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        _ => true,
    };
    if !matches {
        bail!("{} must be a {}, got {}", name, expected, json_type_name(value));
    }
    Ok(())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::config::ServicesConfig;
    use crate::models::{Availability, Book};
    use crate::services::ServiceTable;

    fn ctx() -> ToolContext {
        let catalog = Catalog::new(vec![Book {
            title: "Clean Code".to_string(),
            author: "Robert Martin".to_string(),
            genre: "Software Engineering".to_string(),
            skill_level: "Intermediate".to_string(),
            location: "Shelf C3".to_string(),
            available: Availability::Yes,
        }]);
        ToolContext::new(Arc::new(Library::new(
            catalog,
            ServiceTable::from_config(&ServicesConfig::default()),
        )))
    }

    #[test]
    fn test_validate_missing_required() {
        let schema = SearchBooksTool.parameters_schema();
        let err = validate_params(&schema, &json!({})).unwrap_err();
        assert_eq!(err.to_string(), "missing required parameter: query");
    }

    #[test]
    fn test_validate_wrong_type() {
        let schema = SearchBooksTool.parameters_schema();
        let err = validate_params(&schema, &json!({ "query": 5 })).unwrap_err();
        assert_eq!(err.to_string(), "query must be a string, got number");
    }

    #[test]
    fn test_validate_blank_required_string() {
        let schema = CheckAvailabilityTool.parameters_schema();
        let err = validate_params(&schema, &json!({ "title": " \t " })).unwrap_err();
        assert_eq!(err.to_string(), "title must not be empty");

        let err = validate_params(&schema, &json!({ "title": null })).unwrap_err();
        assert_eq!(err.to_string(), "missing required parameter: title");
    }

    #[test]
    fn test_validate_blank_optional_string_is_kept() {
        let schema = BorrowBookTool.parameters_schema();
        let params = validate_params(&schema, &json!({ "title": "Dune", "email": "" })).unwrap();
        assert_eq!(params["email"], "");
    }

    #[test]
    fn test_validate_unknown_parameter() {
        let schema = SearchBooksTool.parameters_schema();
        let err = validate_params(&schema, &json!({ "query": "dune", "limit": 3 })).unwrap_err();
        assert_eq!(err.to_string(), "unknown parameter: limit");
    }

    #[test]
    fn test_validate_injects_defaults() {
        let schema = RecommendBooksTool.parameters_schema();
        let params = validate_params(&schema, &json!({ "genre": "AI" })).unwrap();
        assert_eq!(params["genre"], "AI");
        assert_eq!(params["skill_level"], "");
    }

    #[test]
    fn test_validate_rejects_non_object() {
        assert!(validate_params(&json!({}), &json!([1, 2])).is_err());
        assert!(validate_params(&json!({}), &Value::Null).is_ok());
    }

    #[test]
    fn test_builtins_have_unique_names() {
        let registry = ToolRegistry::with_builtins();
        assert_eq!(registry.len(), 10);
        let mut names: Vec<&str> = registry.tools().iter().map(|t| t.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 10);
        assert!(registry.tools().iter().all(|t| t.is_builtin()));
    }

    #[tokio::test]
    async fn test_search_tool_reports_no_results() {
        let out = SearchBooksTool
            .execute(json!({ "query": "dune" }), &ctx())
            .await
            .unwrap();
        assert_eq!(out["message"], "No books found.");
        assert_eq!(out["results"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_blank_title_is_rejected() {
        let err = CheckAvailabilityTool
            .execute(json!({ "title": "  " }), &ctx())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "title must not be empty");
    }

    #[tokio::test]
    async fn test_borrow_then_check() {
        let ctx = ctx();
        let out = BorrowBookTool
            .execute(json!({ "title": "clean", "email": "" }), &ctx)
            .await
            .unwrap();
        assert_eq!(out["borrowed"], true);
        assert_eq!(out["title"], "Clean Code");
        assert_eq!(out["email"]["status"], "skipped");

        let out = CheckAvailabilityTool
            .execute(json!({ "title": "Clean Code" }), &ctx)
            .await
            .unwrap();
        assert_eq!(out["message"], "'Clean Code' is not available.");
    }
}
