// Configuration module entry point
// Loads layered configuration and holds the shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

pub use state::AppState;
pub use types::Config;

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// Sources, lowest priority first: built-in defaults, the config file
    /// (optional), then `TASKS_*` environment variables using `__` as the
    /// nesting separator (e.g. `TASKS_SERVER__PORT=8080`).
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3333)?
            .set_default("server.backlog", 128)?
            .set_default("storage.database_path", "db.json")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.show_headers", false)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "tasks-server/0.1")?
            .set_default("http.enable_cors", false)?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("TASKS")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let config = Config::load_from("definitely-missing-config-file").unwrap();
        assert_eq!(config.server.port, 3333);
        assert_eq!(config.storage.database_path, "db.json");
        assert_eq!(config.logging.access_log_format, "combined");
        assert_eq!(config.http.max_body_size, 10_485_760);
        assert!(config.performance.max_connections.is_none());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.toml");
        std::fs::write(
            &path,
            "[server]\nport = 4000\n\n[storage]\ndatabase_path = \"data/tasks.json\"\n",
        )
        .unwrap();

        let base = path.with_extension("");
        let config = Config::load_from(base.to_str().unwrap()).unwrap();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.storage.database_path, "data/tasks.json");
    }

    #[test]
    fn test_socket_addr() {
        let mut config = Config::load_from("definitely-missing-config-file").unwrap();
        assert_eq!(
            config.get_socket_addr().unwrap(),
            "127.0.0.1:3333".parse::<SocketAddr>().unwrap()
        );

        config.server.host = "not an address".to_string();
        assert!(config.get_socket_addr().is_err());
    }
}
