//! The LibraAI chat assistant.
//!
//! [`respond`] answers a free-form chat message. Local rules are tried
//! first, in order:
//!
//! 1. a library service keyword (fuzzy) → the service link
//! 2. "who are you" → identity and capabilities
//! 3. a catalog title mentioned → that book's card
//! 4. a catalog genre mentioned → up to three random books of the genre
//!
//! Anything else goes to the hosted LLM when one is configured, otherwise a
//! fixed "didn't understand" reply is returned.
//!
//! [`ask`] is the "ask me anything about books" flow: an LLM suggestion
//! next to plain catalog search results for the same text.

use anyhow::Result;
use rand::Rng;
use serde::Serialize;

use crate::library::Library;
use crate::models::Book;

pub const GENRE_PICKS: usize = 3;

const IDENTITY: &str = "I am LibraAI, the AI librarian of DIU Library. 📚
I can help you with:
✅ Personalized book recommendations 📖
✅ AI-powered search engine 🔍
✅ Real-time book availability updates 🏷️
✅ Alternative book suggestions if your desired title is unavailable 🔄
✅ Automated book renewal & smart reminders 📅
✅ New arrival & trending book notifications 🚀
✅ 24/7 AI chatbot for book searches, renewals, and reservations 🤖
Just ask me anything about DIU Library, and I'll assist you!";

const FALLBACK: &str = "Sorry, I didn't understand that. You can ask me about books, \
recommendations, availability, or how I can assist you!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    Identity,
    Book,
    Genre,
    Service,
    Ai,
    AiError,
    Fallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub kind: ReplyKind,
    pub text: String,
}

impl ChatReply {
    fn new(kind: ReplyKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    pub query: String,
    pub ai_suggestion: String,
    pub results: Vec<Book>,
    /// `"No books found."` when `results` is empty.
    pub message: Option<String>,
}

/// Answer a chat message.
pub async fn respond(library: &Library, message: &str) -> Result<ChatReply> {
    let local = respond_locally(library, message, &mut rand::thread_rng())?;
    if let Some(reply) = local {
        return Ok(reply);
    }

    let chat = library.chat_provider();
    if !chat.is_enabled() {
        return Ok(ChatReply::new(ReplyKind::Fallback, FALLBACK));
    }

    match chat.complete(message).await {
        Ok(text) => Ok(ChatReply::new(ReplyKind::Ai, text)),
        Err(e) => {
            tracing::warn!(error = %e, "LLM chat fallback failed");
            Ok(ChatReply::new(
                ReplyKind::AiError,
                format!("Sorry, the AI assistant is unavailable right now: {:#}", e),
            ))
        }
    }
}

/// The rule-based part of [`respond`]; `None` when no rule applies.
pub fn respond_locally<R: Rng + ?Sized>(
    library: &Library,
    message: &str,
    rng: &mut R,
) -> Result<Option<ChatReply>> {
    if let Some(found) = library.lookup_service(message) {
        return Ok(Some(ChatReply::new(ReplyKind::Service, found.reply_text())));
    }

    let lowered = message.to_lowercase();
    if lowered.contains("who are you") {
        return Ok(Some(ChatReply::new(ReplyKind::Identity, IDENTITY)));
    }

    library.with_catalog(|catalog| {
        if let Some(book) = catalog.find_mentioned(&lowered) {
            return Some(ChatReply::new(ReplyKind::Book, book_card(book)));
        }
        if let Some(genre) = catalog.genre_mentioned(&lowered) {
            let picks = catalog.sample_genre(&genre, GENRE_PICKS, rng);
            return Some(ChatReply::new(ReplyKind::Genre, genre_list(&genre, &picks)));
        }
        None
    })
}

/// LLM suggestion plus catalog search for the same query.
pub async fn ask(library: &Library, query: &str) -> Result<AskResponse> {
    let results = library.search(query)?;

    let ai_suggestion = match library.chat_provider().complete(query).await {
        Ok(text) => text,
        Err(e) => format!("AI suggestions are unavailable: {:#}", e),
    };

    let message = results.is_empty().then(|| "No books found.".to_string());
    Ok(AskResponse {
        query: query.to_string(),
        ai_suggestion,
        results,
        message,
    })
}

pub fn book_card(book: &Book) -> String {
    format!(
        "📖 **{}** by {}\n📂 Genre: {}\n🎯 Skill Level: {}\n📍 Location: {}\n✅ Available: {}",
        book.title, book.author, book.genre, book.skill_level, book.location, book.available
    )
}

fn genre_list(genre: &str, picks: &[Book]) -> String {
    let mut text = format!("📚 Here are some **{}** books you might like:\n", genre);
    for book in picks {
        text.push_str(&format!(
            "- **{}** by {} 📍({})\n",
            book.title, book.author, book.location
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::config::ServicesConfig;
    use crate::llm::ChatProvider;
    use crate::models::Availability;
    use crate::services::ServiceTable;
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    struct CannedChat(&'static str);

    #[async_trait]
    impl ChatProvider for CannedChat {
        fn model_name(&self) -> &str {
            "canned"
        }
        async fn complete(&self, prompt: &str) -> Result<String> {
            Ok(format!("{} [{}]", self.0, prompt))
        }
    }

    struct FailingChat;

    #[async_trait]
    impl ChatProvider for FailingChat {
        fn model_name(&self) -> &str {
            "failing"
        }
        async fn complete(&self, _prompt: &str) -> Result<String> {
            anyhow::bail!("503 Service Unavailable")
        }
    }

    fn book(title: &str, genre: &str) -> Book {
        Book {
            title: title.to_string(),
            author: "Someone".to_string(),
            genre: genre.to_string(),
            skill_level: "Beginner".to_string(),
            location: "Shelf 4".to_string(),
            available: Availability::Yes,
        }
    }

    fn library() -> Library {
        Library::new(
            Catalog::new(vec![
                book("The Hobbit", "Fantasy"),
                book("Mistborn", "Fantasy"),
                book("Eragon", "Fantasy"),
                book("Piranesi", "Fantasy"),
                book("Gone Girl", "Thriller"),
            ]),
            ServiceTable::from_config(&ServicesConfig::default()),
        )
    }

    #[tokio::test]
    async fn test_identity() {
        let reply = respond(&library(), "Hi, who are you?").await.unwrap();
        assert_eq!(reply.kind, ReplyKind::Identity);
        assert!(reply.text.starts_with("I am LibraAI"));
    }

    #[tokio::test]
    async fn test_title_mention_wins_over_genre() {
        let reply = respond(&library(), "Is THE HOBBIT a good fantasy read?")
            .await
            .unwrap();
        assert_eq!(reply.kind, ReplyKind::Book);
        assert!(reply.text.contains("**The Hobbit** by Someone"));
        assert!(reply.text.contains("Available: Yes"));
    }

    #[test]
    fn test_genre_mention_samples_three() {
        let mut rng = StdRng::seed_from_u64(1);
        let reply = respond_locally(&library(), "any fantasy suggestions?", &mut rng)
            .unwrap()
            .unwrap();
        assert_eq!(reply.kind, ReplyKind::Genre);
        let picks = reply.text.lines().filter(|l| l.starts_with("- ")).count();
        assert_eq!(picks, GENRE_PICKS);
        assert!(!reply.text.contains("Gone Girl"));
    }

    #[tokio::test]
    async fn test_service_lookup() {
        let reply = respond(&library(), "how can I register?").await.unwrap();
        assert_eq!(reply.kind, ReplyKind::Service);
        assert!(reply.text.contains("https://archives.daffodilvarsity.edu.bd/login"));
    }

    #[tokio::test]
    async fn test_service_rule_runs_first() {
        let lib = library();
        let reply = respond(&lib, "who are you? how do I join the library").await.unwrap();
        assert_eq!(reply.kind, ReplyKind::Service);

        let reply = respond(&lib, "Is The Hobbit in the library?").await.unwrap();
        assert_eq!(reply.kind, ReplyKind::Service);
        assert!(reply.text.contains("eLibrary registration"));
    }

    #[tokio::test]
    async fn test_short_keyword_lookalike_reaches_llm() {
        let lib = library().with_chat(Arc::new(CannedChat("LLM says")));
        let reply = respond(&lib, "Do you have a book about logic?").await.unwrap();
        assert_eq!(reply.kind, ReplyKind::Ai);
    }

    #[tokio::test]
    async fn test_fallback_without_llm() {
        let reply = respond(&library(), "tell me a joke").await.unwrap();
        assert_eq!(reply.kind, ReplyKind::Fallback);
        assert!(reply.text.starts_with("Sorry, I didn't understand that."));
    }

    #[tokio::test]
    async fn test_unmatched_goes_to_llm() {
        let lib = library().with_chat(Arc::new(CannedChat("LLM says")));
        let reply = respond(&lib, "tell me a joke").await.unwrap();
        assert_eq!(reply.kind, ReplyKind::Ai);
        assert_eq!(reply.text, "LLM says [tell me a joke]");
    }

    #[tokio::test]
    async fn test_llm_error_is_inline() {
        let lib = library().with_chat(Arc::new(FailingChat));
        let reply = respond(&lib, "tell me a joke").await.unwrap();
        assert_eq!(reply.kind, ReplyKind::AiError);
        assert!(reply.text.contains("503 Service Unavailable"));
    }

    #[tokio::test]
    async fn test_ask_combines_ai_and_search() {
        let lib = library().with_chat(Arc::new(CannedChat("Try")));
        let resp = ask(&lib, "mistborn").await.unwrap();
        assert_eq!(resp.ai_suggestion, "Try [mistborn]");
        assert_eq!(resp.results.len(), 1);
        assert!(resp.message.is_none());

        let resp = ask(&library(), "dune").await.unwrap();
        assert!(resp.results.is_empty());
        assert_eq!(resp.message.as_deref(), Some("No books found."));
        assert!(resp.ai_suggestion.starts_with("AI suggestions are unavailable"));
    }
}
