//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `DispatchState`: Where a single URL is in the crawl (pending, dispatched, done)
//! - `CrawlSession`: The frontier, visited set and results shared by all workers

mod dispatch_state;
mod session;

// Re-export main types
pub use dispatch_state::DispatchState;
pub use session::{CrawlSession, FrontierEntry, SessionSnapshot};
