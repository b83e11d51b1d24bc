//! Logger module
//!
//! Provides logging utilities for the tasks server including:
//! - Server lifecycle logging
//! - Store load and persistence events
//! - Access logging with multiple formats
//! - Leveled error/warning/info/debug output, optionally to files

mod format;
pub mod writer;

pub use format::{AccessLogEntry, AccessLogFormat};

use crate::config::Config;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};

/// Verbosity threshold, ordered from quietest to noisiest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    /// Unknown names fall back to `Info`
    pub fn parse(level: &str) -> Self {
        match level.to_ascii_lowercase().as_str() {
            "error" => Self::Error,
            "warn" | "warning" => Self::Warn,
            "debug" | "trace" => Self::Debug,
            _ => Self::Info,
        }
    }
}

static LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

fn enabled(level: LogLevel) -> bool {
    level as u8 <= LEVEL.load(Ordering::Relaxed)
}

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    LEVEL.store(LogLevel::parse(&config.logging.level) as u8, Ordering::Relaxed);
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config, task_count: usize) {
    if !enabled(LogLevel::Info) {
        return;
    }
    write_info("======================================");
    write_info("Tasks server started successfully");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!(
        "Database: {} ({task_count} tasks)",
        config.storage.database_path
    ));
    write_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(max) = config.performance.max_connections {
        write_info(&format!("Max connections: {max}"));
    }
    write_info(&format!("Max body size: {} bytes", config.http.max_body_size));
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================\n");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    log_debug(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    log_error(&format!("Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    if enabled(LogLevel::Error) {
        write_error(&format!("[ERROR] {message}"));
    }
}

pub fn log_warning(message: &str) {
    if enabled(LogLevel::Warn) {
        write_error(&format!("[WARN] {message}"));
    }
}

pub fn log_info(message: &str) {
    if enabled(LogLevel::Info) {
        write_info(&format!("[INFO] {message}"));
    }
}

pub fn log_debug(message: &str) {
    if enabled(LogLevel::Debug) {
        write_info(&format!("[DEBUG] {message}"));
    }
}

pub fn log_headers_count(count: usize, show: bool) {
    if show {
        log_info(&format!("[Headers] Count: {count}"));
    }
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &AccessLogFormat) {
    write_info(&entry.render(format));
}

pub fn log_route_not_found(method: &str, target: &str) {
    log_debug(&format!("[Router] No route for {method} {target}"));
}

pub fn log_store_loaded(path: &Path, count: usize) {
    log_info(&format!(
        "[Store] Loaded {count} records from {}",
        path.display()
    ));
}

pub fn log_store_initialized(path: &Path, reason: &impl std::fmt::Display) {
    log_warning(&format!(
        "[Store] Could not read {} ({reason}), starting with an empty database",
        path.display()
    ));
}

pub fn log_store_backed_up(path: &Path, backup: &Path) {
    log_warning(&format!(
        "[Store] Kept unreadable {} as {}",
        path.display(),
        backup.display()
    ));
}

pub fn log_persist_failed(path: &Path, err: &impl std::fmt::Display) {
    log_error(&format!("[Store] Failed to persist {}: {err}", path.display()));
}

pub fn log_shutdown_requested(signal: &str) {
    log_info(&format!("[SIGNAL] {signal} received, shutting down gracefully"));
}

pub fn log_shutdown_complete() {
    log_info("[Shutdown] Pending writes flushed, bye");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parse() {
        assert_eq!(LogLevel::parse("ERROR"), LogLevel::Error);
        assert_eq!(LogLevel::parse("warning"), LogLevel::Warn);
        assert_eq!(LogLevel::parse("debug"), LogLevel::Debug);
        assert_eq!(LogLevel::parse("verbose"), LogLevel::Info);
        assert!(LogLevel::Error < LogLevel::Debug);
    }
}
