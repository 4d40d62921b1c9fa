//! HTTP protocol layer module
//!
//! Response construction shared by the router and the process handler.

pub mod response;

// Re-export commonly used builders
pub use response::{
    build_404_response, build_405_response, build_error_response, build_health_response,
    json_response, set_server_header,
};
