//! Due-date tracking and auto-renewal.
//!
//! One due date per book title. Borrowing or renewing overwrites it; there
//! is no loan history and nothing survives a restart.

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;

use crate::config::LoansConfig;

/// How long loans and renewals last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanPolicy {
    pub loan_days: i64,
    /// A loan due within this many days of today is eligible for renewal.
    pub renewal_window_days: i64,
    pub renewal_days: i64,
}

impl Default for LoanPolicy {
    fn default() -> Self {
        Self::from(&LoansConfig::default())
    }
}

impl From<&LoansConfig> for LoanPolicy {
    fn from(cfg: &LoansConfig) -> Self {
        Self {
            loan_days: cfg.loan_days,
            renewal_window_days: cfg.renewal_window_days,
            renewal_days: cfg.renewal_days,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RenewalOutcome {
    Renewed { due_date: NaiveDate },
    NotDue { due_date: NaiveDate },
    NotFound,
}

impl RenewalOutcome {
    pub fn message(&self, title: &str) -> String {
        match self {
            RenewalOutcome::Renewed { due_date } => format!(
                "Book '{}' has been auto-renewed. New due date: {}",
                title,
                due_date.format("%Y-%m-%d")
            ),
            RenewalOutcome::NotDue { due_date } => format!(
                "Book '{}' is not due for renewal yet. Current due date: {}",
                title,
                due_date.format("%Y-%m-%d")
            ),
            RenewalOutcome::NotFound => format!("Book '{}' not found in due dates.", title),
        }
    }
}

/// Title → due date. Keys are compared case-insensitively.
#[derive(Debug, Default)]
pub struct DueDates {
    dates: HashMap<String, NaiveDate>,
}

impl DueDates {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(title: &str) -> String {
        title.trim().to_lowercase()
    }

    pub fn get(&self, title: &str) -> Option<NaiveDate> {
        self.dates.get(&Self::key(title)).copied()
    }

    pub fn set(&mut self, title: &str, due: NaiveDate) {
        self.dates.insert(Self::key(title), due);
    }

    /// Start a loan today and return its due date.
    pub fn record_loan(&mut self, title: &str, today: NaiveDate, policy: &LoanPolicy) -> NaiveDate {
        let due = today + Duration::days(policy.loan_days);
        self.set(title, due);
        due
    }

    /// Renew a loan if it falls due within the renewal window.
    pub fn auto_renew(&mut self, title: &str, today: NaiveDate, policy: &LoanPolicy) -> RenewalOutcome {
        let Some(due) = self.get(title) else {
            return RenewalOutcome::NotFound;
        };

        if due <= today + Duration::days(policy.renewal_window_days) {
            let new_due = today + Duration::days(policy.renewal_days);
            self.set(title, new_due);
            RenewalOutcome::Renewed { due_date: new_due }
        } else {
            RenewalOutcome::NotDue { due_date: due }
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}
