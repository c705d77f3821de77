//! The library facade.
//!
//! [`Library`] owns all mutable state of a running assistant (the catalog's
//! availability flags and the due-date map) together with the external
//! collaborators (LLM provider, email notifier). Every user-facing operation
//! of the CLI, the HTTP tools, and the chat assistant goes through it.
//!
//! Locks are never held across an `.await`: borrowing updates the catalog and
//! due dates under one write lock, releases it, and only then sends email.

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::{Arc, Mutex, RwLock};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::llm::{self, ChatProvider, DisabledChat};
use crate::loans::{DueDates, LoanPolicy, RenewalOutcome};
use crate::mailer::{self, DisabledNotifier, Notifier};
use crate::models::{Availability, Book, LibraryService};
use crate::services::{ServiceMatch, ServiceTable};

pub const NEW_ARRIVALS_SUBJECT: &str = "Library New Arrivals";

const NEW_ARRIVALS_BODY: &str = "You have been subscribed to book updates! Thank you for subscribing! \
You will now receive updates on new arrivals.\n\n\
Click here to register for the DIU eLibrary >> https://archives.daffodilvarsity.edu.bd/login";

/// Outcome of an email attempt attached to an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum EmailStatus {
    Sent,
    Failed(String),
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct BorrowOutcome {
    pub borrowed: bool,
    pub title: String,
    pub due_date: Option<NaiveDate>,
    pub message: String,
    pub email: EmailStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenewalResponse {
    pub title: String,
    #[serde(flatten)]
    pub outcome: RenewalOutcome,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogInfo {
    pub books: usize,
    pub available: usize,
    pub genres: Vec<String>,
    pub skill_levels: Vec<String>,
    pub titles: Vec<String>,
    pub warning: Option<String>,
    pub llm_model: String,
}

pub struct Library {
    catalog: RwLock<Catalog>,
    due_dates: Mutex<DueDates>,
    services: ServiceTable,
    policy: LoanPolicy,
    chat: Arc<dyn ChatProvider>,
    notifier: Arc<dyn Notifier>,
    load_warning: Option<String>,
}

impl Library {
    pub fn new(catalog: Catalog, services: ServiceTable) -> Self {
        Self {
            catalog: RwLock::new(catalog),
            due_dates: Mutex::new(DueDates::new()),
            services,
            policy: LoanPolicy::default(),
            chat: Arc::new(DisabledChat),
            notifier: Arc::new(DisabledNotifier),
            load_warning: None,
        }
    }

    pub fn with_policy(mut self, policy: LoanPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_chat(mut self, chat: Arc<dyn ChatProvider>) -> Self {
        self.chat = chat;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_load_warning(mut self, warning: Option<String>) -> Self {
        self.load_warning = warning;
        self
    }

    /// Assemble a library from configuration.
    ///
    /// A missing catalog file, an unusable LLM provider, or unusable SMTP
    /// settings degrade to an empty catalog / disabled collaborator with a
    /// warning rather than failing startup.
    pub fn from_config(config: &Config) -> Self {
        let (catalog, warning) = Catalog::load_or_empty(&config.catalog.path);

        let chat = llm::create_provider(&config.llm).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not create LLM provider; AI replies disabled");
            Arc::new(DisabledChat) as Arc<dyn ChatProvider>
        });
        let notifier = mailer::create_notifier(config.smtp.as_ref()).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not configure SMTP; email disabled");
            Arc::new(DisabledNotifier) as Arc<dyn Notifier>
        });

        Self::new(catalog, ServiceTable::from_config(&config.services))
            .with_policy(LoanPolicy::from(&config.loans))
            .with_chat(chat)
            .with_notifier(notifier)
            .with_load_warning(warning)
    }

    fn read_catalog(&self) -> Result<std::sync::RwLockReadGuard<'_, Catalog>> {
        self.catalog
            .read()
            .map_err(|_| anyhow!("catalog lock poisoned"))
    }

    fn lock_due_dates(&self) -> Result<std::sync::MutexGuard<'_, DueDates>> {
        self.due_dates
            .lock()
            .map_err(|_| anyhow!("due-date lock poisoned"))
    }

    pub fn chat_provider(&self) -> &dyn ChatProvider {
        self.chat.as_ref()
    }

    pub fn services(&self) -> &ServiceTable {
        &self.services
    }

    pub fn policy(&self) -> LoanPolicy {
        self.policy
    }

    pub fn load_warning(&self) -> Option<&str> {
        self.load_warning.as_deref()
    }

    // ============ Catalog queries ============

    pub fn search(&self, query: &str) -> Result<Vec<Book>> {
        Ok(self.read_catalog()?.search(query))
    }

    pub fn recommend(&self, genre: &str, skill_level: &str) -> Result<Vec<Book>> {
        Ok(self.read_catalog()?.recommend(genre, skill_level))
    }

    pub fn check_availability(&self, title: &str) -> Result<String> {
        Ok(self.read_catalog()?.check_availability(title))
    }

    pub fn lookup_service(&self, query: &str) -> Option<ServiceMatch> {
        self.services.lookup(query)
    }

    pub fn service_list(&self) -> &[LibraryService] {
        self.services.services()
    }

    /// Run `f` against a read-locked catalog.
    pub fn with_catalog<T>(&self, f: impl FnOnce(&Catalog) -> T) -> Result<T> {
        let catalog = self.read_catalog()?;
        Ok(f(&catalog))
    }

    pub fn catalog_info(&self) -> Result<CatalogInfo> {
        let catalog = self.read_catalog()?;
        Ok(CatalogInfo {
            books: catalog.len(),
            available: catalog
                .books()
                .iter()
                .filter(|b| b.available.is_available())
                .count(),
            genres: catalog.genres(),
            skill_levels: catalog.skill_levels(),
            titles: catalog.titles(),
            warning: self.load_warning.clone(),
            llm_model: self.chat.model_name().to_string(),
        })
    }

    pub fn due_date(&self, title: &str) -> Result<Option<NaiveDate>> {
        Ok(self.lock_due_dates()?.get(title))
    }

    // ============ Loans ============

    pub async fn borrow(&self, title: &str, email: &str) -> Result<BorrowOutcome> {
        self.borrow_on(title, email, today()).await
    }

    /// Borrow the first copy whose title contains `title`, as of `today`.
    pub async fn borrow_on(&self, title: &str, email: &str, today: NaiveDate) -> Result<BorrowOutcome> {
        let reserved = {
            let mut catalog = self
                .catalog
                .write()
                .map_err(|_| anyhow!("catalog lock poisoned"))?;
            // Both guards are held before the flag changes
            let mut due_dates = self.lock_due_dates()?;
            match catalog.find_mut(title) {
                Some(book) if book.available.is_available() => {
                    book.available = Availability::No;
                    let resolved = book.title.clone();
                    let due = due_dates.record_loan(&resolved, today, &self.policy);
                    Some((resolved, due))
                }
                _ => None,
            }
        };

        let Some((resolved, due)) = reserved else {
            return Ok(BorrowOutcome {
                borrowed: false,
                title: title.to_string(),
                due_date: None,
                message: format!(
                    "Sorry, '{}' is not available for borrowing at the moment.",
                    title
                ),
                email: EmailStatus::Skipped,
            });
        };

        tracing::info!(title = %resolved, due = %due, "book borrowed");

        let email_status = if email.trim().is_empty() {
            EmailStatus::Skipped
        } else {
            let subject = format!("Book Borrowed: {}", resolved);
            let body = format!(
                "Dear User,\n\nYou have successfully borrowed the book '{}'.\n\n\
                 Please return it by {}.\n\nThank you!",
                resolved,
                due.format("%Y-%m-%d")
            );
            match self.notifier.send(email.trim(), &subject, &body).await {
                Ok(()) => EmailStatus::Sent,
                Err(e) => {
                    tracing::warn!(error = %e, "borrow confirmation email failed");
                    EmailStatus::Failed(format!("Error sending email: {:#}", e))
                }
            }
        };

        let mut message = format!(
            "You have successfully borrowed '{}'. Due date: {}.",
            resolved,
            due.format("%Y-%m-%d")
        );
        match &email_status {
            EmailStatus::Sent => {
                message.push_str(&format!(" A confirmation email has been sent to {}.", email.trim()))
            }
            EmailStatus::Failed(err) => {
                message.push(' ');
                message.push_str(err);
            }
            EmailStatus::Skipped => {}
        }

        Ok(BorrowOutcome {
            borrowed: true,
            title: resolved,
            due_date: Some(due),
            message,
            email: email_status,
        })
    }

    pub fn renew(&self, title: &str) -> Result<RenewalResponse> {
        self.renew_on(title, today())
    }

    pub fn renew_on(&self, title: &str, today: NaiveDate) -> Result<RenewalResponse> {
        let outcome = self.lock_due_dates()?.auto_renew(title, today, &self.policy);
        Ok(RenewalResponse {
            title: title.to_string(),
            message: outcome.message(title),
            outcome,
        })
    }

    // ============ Notifications ============

    /// Subscribe `email` to new-arrival updates. Delivery failures come back
    /// as the returned message.
    pub async fn subscribe(&self, email: &str) -> (EmailStatus, String) {
        match self
            .notifier
            .send(email.trim(), NEW_ARRIVALS_SUBJECT, NEW_ARRIVALS_BODY)
            .await
        {
            Ok(()) => (EmailStatus::Sent, "Email sent successfully!".to_string()),
            Err(e) => {
                tracing::warn!(error = %e, "subscription email failed");
                let msg = format!("Error sending email: {:#}", e);
                (EmailStatus::Failed(msg.clone()), msg)
            }
        }
    }
}

/// Today's date in local time.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
