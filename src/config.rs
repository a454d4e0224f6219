use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub pagination: PaginationConfig,
    /// Maximum upload size in bytes
    pub max_upload_size: u64,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Allowed CORS origins. Empty means any origin (development mode).
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding the metadata database
    pub data_dir: String,
    /// Root directory for uploaded blobs (`uploads/` lives below it)
    pub media_root: String,
}

#[derive(Debug, Clone)]
pub struct PaginationConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            media_root: "./media".to_string(),
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let cors_allowed_origins: Vec<String> = std::env::var("CORS_ALLOWED_ORIGINS")
            .map(|o| {
                o.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());
        let media_root = std::env::var("MEDIA_ROOT").unwrap_or_else(|_| "./media".to_string());

        let max_upload_size = std::env::var("MAX_UPLOAD_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(50 * 1024 * 1024); // 50MB

        let default_page_size = std::env::var("DEFAULT_PAGE_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        let max_page_size = std::env::var("MAX_PAGE_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(100);

        let config = Config {
            server: ServerConfig {
                bind_address,
                cors_allowed_origins,
            },
            storage: StorageConfig {
                data_dir,
                media_root,
            },
            pagination: PaginationConfig {
                default_page_size,
                max_page_size,
            },
            max_upload_size,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.data_dir.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "DATA_DIR cannot be empty".to_string(),
            ));
        }

        if self.storage.media_root.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "MEDIA_ROOT cannot be empty".to_string(),
            ));
        }

        if self.max_upload_size == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_UPLOAD_SIZE must be greater than 0".to_string(),
            ));
        }

        if self.pagination.default_page_size == 0 || self.pagination.max_page_size == 0 {
            return Err(ConfigError::ValidationError(
                "page sizes must be greater than 0".to_string(),
            ));
        }

        if self.pagination.default_page_size > self.pagination.max_page_size {
            return Err(ConfigError::ValidationError(format!(
                "DEFAULT_PAGE_SIZE ({}) exceeds MAX_PAGE_SIZE ({})",
                self.pagination.default_page_size, self.pagination.max_page_size
            )));
        }

        if self.server.cors_allowed_origins.is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; any origin will be allowed");
        }

        Ok(())
    }
}
