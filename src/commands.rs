//! CLI command runners.
//!
//! Each `run_*` function performs one `libra` subcommand against a
//! [`Library`] and prints a human-readable result to stdout.

use anyhow::Result;

use crate::assistant::{self, book_card};
use crate::library::{EmailStatus, Library};
use crate::models::Book;

fn print_books(books: &[Book], empty: &str) {
    if books.is_empty() {
        println!("{}", empty);
        return;
    }
    for (i, book) in books.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{}", book_card(book));
    }
}

pub fn run_search(library: &Library, query: &str) -> Result<()> {
    let results = library.search(query)?;
    print_books(&results, "No books found.");
    Ok(())
}

pub fn run_recommend(library: &Library, genre: &str, skill_level: &str) -> Result<()> {
    let results = library.recommend(genre, skill_level)?;
    print_books(&results, "No recommendations available.");
    Ok(())
}

pub fn run_check(library: &Library, title: &str) -> Result<()> {
    println!("{}", library.check_availability(title)?);
    Ok(())
}

pub async fn run_chat(library: &Library, message: &str) -> Result<()> {
    let reply = assistant::respond(library, message).await?;
    println!("{}", reply.text);
    Ok(())
}

pub async fn run_ask(library: &Library, query: &str) -> Result<()> {
    let response = assistant::ask(library, query).await?;
    println!("AI suggestion:\n{}\n", response.ai_suggestion);
    println!("Catalog results:");
    print_books(&response.results, "No books found.");
    Ok(())
}

/// With a query, print the best-matching service; without, list them all.
pub fn run_services(library: &Library, query: Option<&str>) -> Result<()> {
    match query {
        Some(q) => match library.lookup_service(q) {
            Some(found) => {
                println!("{}", found.reply_text());
                println!("(matched '{}' at {:.0})", found.keyword, found.score);
            }
            None => println!("No matching library service."),
        },
        None => {
            for service in library.service_list() {
                println!("{:<24} {}", service.name, service.url);
                if !service.keywords.is_empty() {
                    println!("{:<24} keywords: {}", "", service.keywords.join(", "));
                }
            }
        }
    }
    Ok(())
}

pub async fn run_subscribe(library: &Library, email: &str) -> Result<()> {
    let (status, message) = library.subscribe(email).await;
    println!("{}", message);
    if let EmailStatus::Failed(_) = status {
        anyhow::bail!("subscription email was not sent");
    }
    Ok(())
}

pub fn run_info(library: &Library) -> Result<()> {
    let info = library.catalog_info()?;
    if let Some(warning) = &info.warning {
        println!("Warning: {}", warning);
    }
    println!("Books:        {} ({} available)", info.books, info.available);
    println!("Genres:       {}", info.genres.join(", "));
    println!("Skill levels: {}", info.skill_levels.join(", "));
    println!("LLM model:    {}", info.llm_model);
    Ok(())
}
