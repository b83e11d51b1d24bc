// Application state module
// Everything a request handler needs, shared behind an Arc

use crate::logger::AccessLogFormat;
use crate::routing::Router;
use crate::store::Store;

use super::types::Config;

/// Application state
pub struct AppState {
    pub config: Config,
    pub store: Store,
    pub router: Router,
    /// Parsed once from `logging.access_log_format`
    pub access_log_format: AccessLogFormat,
}

impl AppState {
    /// Create `AppState` serving the task routes against `store`
    pub fn new(config: Config, store: Store) -> Self {
        let access_log_format = AccessLogFormat::parse(&config.logging.access_log_format);
        Self {
            config,
            store,
            router: Router::tasks(),
            access_log_format,
        }
    }
}
