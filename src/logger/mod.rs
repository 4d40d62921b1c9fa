//! Logger module
//!
//! Provides logging utilities for the server including:
//! - Server lifecycle logging with a level filter
//! - Access logging with multiple formats
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::{Config, LogLevel, LoggingConfig};
use chrono::Local;
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &LoggingConfig) -> std::io::Result<()> {
    writer::init(config)
}

/// Whether messages at `level` pass the configured filter (info before `init`)
fn enabled(level: LogLevel) -> bool {
    let threshold = writer::get().map_or(LogLevel::Info, writer::LogWriter::level);
    level >= threshold
}

fn stamp(tag: &str, message: &str) -> String {
    format!("{} [{tag}] {message}", Local::now().format("%Y-%m-%d %H:%M:%S"))
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

pub fn debug(message: &str) {
    if enabled(LogLevel::Debug) {
        write_info(&stamp("DEBUG", message));
    }
}

pub fn info(message: &str) {
    if enabled(LogLevel::Info) {
        write_info(&stamp("INFO", message));
    }
}

pub fn warn(message: &str) {
    if enabled(LogLevel::Warn) {
        write_error(&stamp("WARN", message));
    }
}

pub fn error(message: &str) {
    if enabled(LogLevel::Error) {
        write_error(&stamp("ERROR", message));
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    info("======================================");
    info(&format!("Listening on: http://{addr}"));
    info(&format!("Log level: {}", config.logging.level));
    match config.server.workers {
        Some(workers) => info(&format!("Worker threads: {workers}")),
        None => info("Worker threads: default (CPU cores)"),
    }
    if let Some(ref path) = config.logging.access_log_file {
        info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        info(&format!("Error log: {path}"));
    }
    info(&format!("Max body size: {} bytes", config.http.max_body_size));
    if let Some(max) = config.performance.max_connections {
        info(&format!("Max connections: {max}"));
    }
    info("======================================");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    debug(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    error(&format!("Failed to serve connection: {err:?}"));
}

/// Log formatted access log entry (not subject to the level filter)
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_info(&entry.format(format));
}
