//! Request handler module
//!
//! Body decoding, route dispatch and the task endpoint handlers.

mod decode;
mod error;
pub mod router;
mod tasks;

// Re-export main entry point
pub use router::handle_request;
