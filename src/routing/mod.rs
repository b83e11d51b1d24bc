//! Routing module
//!
//! Hand-built request routing:
//! - Route templates with `:name` parameters compiled into segment patterns
//! - First-match dispatch over (method, path) in registration order
//! - Flat query string decoding

mod matcher;
mod pattern;
mod query;

pub use matcher::{Router, TaskAction};
pub use query::extract_query_params;
