//! HTTP protocol layer module
//!
//! Response construction shared by every handler, decoupled from the task logic.

pub mod response;

pub use response::{
    build_empty_response, build_error_response, build_json_response, build_options_response,
    finalize_response,
};
