//! # LibraAI
//!
//! An AI librarian for a university library.
//!
//! LibraAI loads a book catalog from CSV and answers patrons through a CLI,
//! a JSON tool API, and a small browser UI: title search, genre and
//! skill-level recommendations, availability checks, borrowing with email
//! confirmation, due-date auto-renewal, new-arrival subscriptions, fuzzy
//! lookup of library services, and free-form chat backed by a hosted LLM.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────────────────┐   ┌────────────┐
//! │ books.csv│──▶│         Library          │──▶│ LLM (HTTP) │
//! └──────────┘   │ catalog · due dates ·    │   └────────────┘
//!                │ services · assistant     │   ┌────────────┐
//!                └────────────┬─────────────┘──▶│ SMTP relay │
//!                             │                 └────────────┘
//!                   ┌─────────┴─────────┐
//!                   ▼                   ▼
//!              ┌──────────┐       ┌──────────┐
//!              │   CLI    │       │   HTTP   │
//!              │ (libra)  │       │ UI+tools │
//!              └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! libra search "python"
//! libra recommend --genre "Computer Science" --skill-level Beginner
//! libra chat "who are you?"
//! libra serve                  # http://127.0.0.1:8501
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`logging`] | tracing subscriber setup |
//! | [`models`] | Book and service records |
//! | [`catalog`] | CSV loading, search, recommendations |
//! | [`loans`] | Due dates and auto-renewal |
//! | [`services`] | Fuzzy library-service lookup |
//! | [`llm`] | Hosted chat-completion providers |
//! | [`mailer`] | SMTP notifications |
//! | [`library`] | Shared state and user-facing operations |
//! | [`assistant`] | Chat rules and AI pass-through |
//! | [`traits`] | Tool trait and registry |
//! | [`server`] | HTTP server |
//! | [`commands`] | CLI command runners |

pub mod assistant;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod library;
pub mod llm;
pub mod loans;
pub mod logging;
pub mod mailer;
pub mod models;
pub mod server;
pub mod services;
pub mod traits;
