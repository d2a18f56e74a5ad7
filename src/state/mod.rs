//! State module for tracking crawl progress
//!
//! This module provides the per-invocation state the coordinator keeps while
//! walking through result pages.
//!
//! # Components
//!
//! - `CrawlState`: pages issued, records accumulated, target and termination
//! - `StopReason`: why a crawl ended

mod crawl_state;

// Re-export main types
pub use crawl_state::{CrawlState, StopReason};
