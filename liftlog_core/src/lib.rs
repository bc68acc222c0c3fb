#![forbid(unsafe_code)]

//! Core domain model and business logic for liftlog.
//!
//! This crate provides:
//! - Domain types (exercises, workouts, sets, personal records)
//! - The `AMOUNTxREPSxWEIGHT` set shorthand parser
//! - Personal record recalculation
//! - Persistence (ledger store, locked JSON file, CSV export)
//! - The operations the CLI is built on

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod parser;
pub mod records;
pub mod store;
pub mod state;
pub mod service;
pub mod history;
pub mod export;

// Re-export commonly used types
pub use error::{Error, ParseError, Result};
pub use types::*;
pub use catalog::seed_default_exercises;
pub use config::Config;
pub use parser::{format_compact, parse_sets};
pub use records::recalculate_prs;
pub use store::{Ledger, RecordStore};
pub use state::LedgerFile;
pub use history::{workout_history, workout_on_date, WorkoutSummary};
pub use export::export_records_csv;
pub use rust_decimal::Decimal;
