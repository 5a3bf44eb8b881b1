//! Oracle-backed API spec detection for Specsniff
//!
//! This crate wraps a metered LLM "oracle" behind a daily budget and a
//! fingerprint-keyed result cache, and drives it over batches of files in
//! paced, bounded-concurrency groups.

pub mod bridge;
pub mod prompt;
pub mod providers;
pub mod cache;
pub mod budget;
pub mod detector;


pub use bridge::*;
pub use budget::{BudgetTracker, BudgetSnapshot, BudgetWarning};
pub use cache::{ResultCache, CacheStats};
pub use detector::{SpecDetector, BatchOptions, BatchOutcome, BatchSummary};
pub use tokio_util::sync::CancellationToken;
