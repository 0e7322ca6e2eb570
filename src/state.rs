use crate::{
    audit::LogWriter,
    config::AppConfig,
    proxy::client::build_client,
    sanitizer::{PayloadSanitizer, ToolSchemaSanitizer},
};
use std::sync::Arc;

/// Everything a call needs, shared read-only across concurrent calls.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub client: reqwest::Client,
    pub log_writer: LogWriter,
    pub sanitizer: Arc<dyn PayloadSanitizer>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, reqwest::Error> {
        let client = build_client(config.upstream_timeout)?;
        let log_writer = LogWriter::new(config.log_dir.clone());

        Ok(Self {
            config: Arc::new(config),
            client,
            log_writer,
            sanitizer: Arc::new(ToolSchemaSanitizer),
        })
    }

    pub fn with_sanitizer(mut self, sanitizer: impl PayloadSanitizer + 'static) -> Self {
        self.sanitizer = Arc::new(sanitizer);
        self
    }
}
