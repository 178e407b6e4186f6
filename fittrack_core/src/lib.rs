#![forbid(unsafe_code)]

//! Core domain model and business logic for FitTrack.
//!
//! This crate provides:
//! - Domain types (workouts, sets, overrides, progress, food logs)
//! - Workout catalog management
//! - Schedule resolution over a rotation with fixed rest days
//! - Copy-on-first-edit daily progress
//! - Sync cache between a local cache and a remote document store
//! - Calendar aggregation and CSV export

pub mod types;
pub mod error;
pub mod date_key;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod schedule;
pub mod progress;
pub mod food;
pub mod store;
pub mod local_cache;
pub mod sync;
pub mod day_plan;
pub mod calendar;

// Re-export commonly used types
pub use error::{Error, Result};
pub use date_key::DateKey;
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog};
pub use config::Config;
pub use schedule::{Rotation, ScheduleDay};
pub use store::{FileStore, MemoryStore, RemoteStore};
pub use local_cache::{FileCache, LocalCache, MemoryCache};
pub use sync::SyncCache;
pub use day_plan::DayPlan;
pub use calendar::{export_csv, summarize_month, DaySummary};
