//! Core data models used throughout LibraAI.
//!
//! These types represent the catalog rows, their availability flag, and the
//! library services the assistant can point patrons to.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether a book can currently be borrowed.
///
/// Stored in the catalog file as `Yes` / `No`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    Yes,
    No,
}

impl Availability {
    pub fn is_available(self) -> bool {
        self == Availability::Yes
    }
}

impl FromStr for Availability {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" => Ok(Availability::Yes),
            "no" => Ok(Availability::No),
            other => bail!("invalid availability value: '{}'", other),
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Availability::Yes => f.write_str("Yes"),
            Availability::No => f.write_str("No"),
        }
    }
}

/// A single catalog record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Book {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub skill_level: String,
    pub location: String,
    pub available: Availability,
}

/// A library service the assistant can link to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryService {
    pub name: String,
    pub url: String,
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}
