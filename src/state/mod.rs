//! State module for tracking traversal progress
//!
//! # Components
//!
//! - `TraversalState`: Which phase a comment traversal is in
//! - `TraversalStats`: Counters a traversal accumulates while it runs

mod traversal_state;

// Re-export main types
pub use traversal_state::{TraversalState, TraversalStats};
