//! End-to-end tests driving the `libra` binary against a temporary catalog.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn libra_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("libra");
    path
}

const BOOKS_CSV: &str = "\
Title,Author,Genre,Skill_Level,Location,Available
Python Crash Course,Eric Matthes,Programming,Beginner,Shelf A1,Yes
Fluent Python,Luciano Ramalho,Programming,Advanced,Shelf A2,No
Deep Learning,Ian Goodfellow,Artificial Intelligence,Advanced,Shelf B1,Yes
Hands-On Machine Learning,Aurelien Geron,Artificial Intelligence,Intermediate,Shelf B2,Yes
The Hobbit,J.R.R. Tolkien,Fantasy,Beginner,Shelf F1,Yes
";

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(root.join("books.csv"), BOOKS_CSV).unwrap();

    let config_content = format!(
        r#"[catalog]
path = "{}/books.csv"

[llm]
provider = "disabled"

[server]
bind = "127.0.0.1:8501"
"#,
        root.display()
    );

    let config_path = config_dir.join("libra.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_libra(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = libra_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run libra binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_search_is_case_insensitive() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_libra(&config_path, &["search", "PYTHON"]);
    assert!(success, "search failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("**Python Crash Course** by Eric Matthes"));
    assert!(stdout.contains("**Fluent Python** by Luciano Ramalho"));
    assert!(!stdout.contains("Hobbit"));
}

#[test]
fn test_search_no_results() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_libra(&config_path, &["search", "cryptonomicon"]);
    assert!(success);
    assert_eq!(stdout.trim(), "No books found.");
}

#[test]
fn test_recommend_filters_both_fields() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_libra(
        &config_path,
        &["recommend", "--genre", "artificial", "--skill-level", "advanced"],
    );
    assert!(success, "recommend failed: {}", stderr);
    assert!(stdout.contains("Deep Learning"));
    assert!(!stdout.contains("Hands-On Machine Learning"));
}

#[test]
fn test_recommend_without_filters_lists_everything() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_libra(&config_path, &["recommend"]);
    assert!(success);
    assert_eq!(stdout.matches("📖").count(), 5);
}

#[test]
fn test_check_availability() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_libra(&config_path, &["check", "hobbit"]);
    assert!(success);
    assert_eq!(stdout.trim(), "'hobbit' is available!");

    let (stdout, _, _) = run_libra(&config_path, &["check", "Fluent Python"]);
    assert_eq!(stdout.trim(), "'Fluent Python' is not available.");

    let (stdout, _, _) = run_libra(&config_path, &["check", "Dune"]);
    assert_eq!(stdout.trim(), "'Dune' is not available.");
}

#[test]
fn test_chat_rules_without_llm() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_libra(&config_path, &["chat", "who are you?"]);
    assert!(success);
    assert!(stdout.starts_with("I am LibraAI"));

    let (stdout, _, _) = run_libra(&config_path, &["chat", "tell me about the hobbit"]);
    assert!(stdout.contains("**The Hobbit** by J.R.R. Tolkien"));

    let (stdout, _, _) = run_libra(&config_path, &["chat", "tell me a joke"]);
    assert!(stdout.starts_with("Sorry, I didn't understand that."));
}

#[test]
fn test_services_lookup() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_libra(&config_path, &["services"]);
    assert!(success);
    assert!(stdout.contains("eLibrary registration"));

    let (stdout, _, _) = run_libra(&config_path, &["services", "how do I regsiter"]);
    assert!(stdout.contains("https://archives.daffodilvarsity.edu.bd/login"));

    let (stdout, _, _) = run_libra(&config_path, &["services", "opening hours"]);
    assert_eq!(stdout.trim(), "No matching library service.");
}

#[test]
fn test_info_summary() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_libra(&config_path, &["info"]);
    assert!(success);
    assert!(stdout.contains("Books:        5 (4 available)"));
    assert!(stdout.contains("Programming, Artificial Intelligence, Fantasy"));
    assert!(stdout.contains("LLM model:    disabled"));
}

#[test]
fn test_subscribe_without_smtp_fails() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_libra(&config_path, &["subscribe", "reader@example.edu"]);
    assert!(!success);
    assert!(stdout.contains("Error sending email"));
}

#[test]
fn test_missing_catalog_degrades_to_empty() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("libra.toml");
    fs::write(
        &config_path,
        format!("[catalog]\npath = \"{}/nope.csv\"\n", tmp.path().display()),
    )
    .unwrap();

    let (stdout, stderr, success) = run_libra(&config_path, &["search", "python"]);
    assert!(success, "search should not fail: {}", stderr);
    assert!(stderr.contains("could not be loaded"));
    assert_eq!(stdout.trim(), "No books found.");
}

#[test]
fn test_invalid_config_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("libra.toml");
    fs::write(&config_path, "[loans]\nloan_days = 0\n").unwrap();

    let (_, stderr, success) = run_libra(&config_path, &["info"]);
    assert!(!success);
    assert!(stderr.contains("loans.loan_days"));
}

#[tokio::test]
async fn test_serve_command_answers_health() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("books.csv"), BOOKS_CSV).unwrap();
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let config_path = tmp.path().join("libra.toml");
    fs::write(
        &config_path,
        format!(
            "[catalog]\npath = \"{}/books.csv\"\n\n[llm]\nprovider = \"disabled\"\n\n[server]\nbind = \"127.0.0.1:{}\"\n",
            tmp.path().display(),
            port
        ),
    )
    .unwrap();

    let mut child = Command::new(libra_binary())
        .arg("--config")
        .arg(&config_path)
        .arg("serve")
        .env_remove("RUST_LOG")
        .spawn()
        .unwrap();

    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    let mut healthy = false;
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                healthy = true;
                break;
            }
        }
    }
    child.kill().unwrap();
    child.wait().unwrap();

    assert!(healthy, "libra serve did not answer /health within 5 seconds");
}
