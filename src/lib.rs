//! # ECLI Dashboard
//!
//! Corpus statistics and query engine for a metadata index of scanned
//! legal documents identified by ECLI-style ids.
//!
//! The engine reads a SQLite store with four tables (`documents`,
//! `document_metrics`, `corpus_stats`, `user_feedback`) and returns plain
//! structured data to its callers: the `ecli` CLI and the JSON API served
//! to the browser dashboard.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────────────────────────────┐   ┌──────────┐
//! │   CLI    │──▶│ stats │ aggregate │ search │ recent   │──▶│  SQLite  │
//! │  (ecli)  │   │       get │ feedback                 │   │  (db)    │
//! └──────────┘   └──────────────────────────────────────┘   └──────────┘
//!      ▲                          ▲
//!      │                    ┌──────────┐
//!      └────────────────────│   HTTP   │
//!                           │ (server) │
//!                           └──────────┘
//! ```
//!
//! Each public operation opens its own connection, does one unit of work
//! and closes it again; no state is shared between calls.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Connection handling and row conversion |
//! | [`migrate`] | Schema creation |
//! | [`models`] | Result and row types |
//! | [`stats`] | Snapshot resolution and regeneration |
//! | [`aggregate`] | Group-by queries for charts |
//! | [`search`] | Filter query builder |
//! | [`recent`] | Recently added documents |
//! | [`get`] | Document lookup by ECLI id |
//! | [`feedback`] | Feedback submission |
//! | [`seed`] | Sample data and row writers |
//! | [`server`] | JSON HTTP API |

pub mod aggregate;
pub mod config;
pub mod db;
pub mod error;
pub mod feedback;
pub mod get;
pub mod migrate;
pub mod models;
pub mod recent;
pub mod search;
pub mod seed;
pub mod server;
pub mod stats;

pub use error::{Error, Result};
