//! SQLite ledger store for Fundflow.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `fundflow-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - Repository implementations for every ledger entity
//! - Database-specific model types (with Diesel derives)
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel dependencies exist.
//! The core crate is database-agnostic and works with traits.
//!
//! ```text
//! core (domain)        server (HTTP)
//!       │                    │
//!       └─────────┬──────────┘
//!                 │
//!                 ▼
//!         storage-sqlite (this crate)
//!                 │
//!                 ▼
//!             SQLite DB
//! ```
//!
//! All writes go through a single writer task ([`WriteHandle`]); each job runs
//! in one immediate transaction, so a multi-table settlement step either lands
//! completely or not at all.

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod allotments;
pub mod drawdowns;
pub mod funds;
pub mod payments;
pub mod reports;
pub mod settings;
pub mod transactions;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, get_db_path, init, run_migrations, spawn_writer, DbConnection,
    DbPool, WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

pub use allotments::AllotmentRepository;
pub use drawdowns::DrawdownRepository;
pub use funds::ProfileRepository;
pub use payments::PaymentRepository;
pub use reports::ReportRepository;
pub use settings::SettingsRepository;
pub use transactions::TransactionRepository;

// Re-export from fundflow-core for convenience
pub use fundflow_core::errors::{DatabaseError, Error, Result};
