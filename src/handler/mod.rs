//! Request handler module
//!
//! Responsible for request routing dispatch and the form submission endpoint.

pub mod process;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
