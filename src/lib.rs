//! # Sermon Library
//!
//! A local-first indexer for a folder of sermon documents (`.docx`, `.hwp`,
//! `.hwpx`, `.pdf`, `.txt`). Each sync pass extracts plain text, derives a
//! date from the file name and scripture tags from the title and opening
//! content, and keeps a SQLite store reconciled with the folder.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────┐   ┌──────────┐
//! │  Archive │──▶│   Pipeline     │──▶│  SQLite   │
//! │  folder  │   │ extract+parse │   │   (WAL)   │
//! └──────────┘   └───────────────┘   └────┬─────┘
//!                                         │
//!                                         ▼
//!                                   ┌──────────┐
//!                                   │ Query    │
//!                                   │ layer    │
//!                                   └──────────┘
//! ```
//!
//! Data flows one direction: folder → extractor → metadata parser → store.
//! The query layer reads the store independently; WAL keeps readers
//! unblocked while a sync pass writes.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`scan`] | Recursive archive folder scan |
//! | [`extract`] | Per-format text extraction and PDF reflow |
//! | [`meta`] | Date inference from file names |
//! | [`books`] | Canonical book tables and scripture tagging |
//! | [`sync`] | Incremental sync pipeline |
//! | [`query`] | Search, sorting, pagination, statistics |
//! | [`progress`] | Sync progress reporting |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod books;
pub mod config;
pub mod db;
pub mod extract;
pub mod meta;
pub mod migrate;
pub mod models;
pub mod progress;
pub mod query;
pub mod scan;
pub mod sync;
