use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub blog: BlogConfig,
    pub seed_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogConfig {
    /// Maximum number of related posts shown under a post
    pub related_limit: usize,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self { related_limit: 4 }
    }
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .unwrap_or(5);
        if max_connections == 0 {
            return Err(AppError::ConfigurationError(
                "DATABASE_MAX_CONNECTIONS must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite:data/portfolio_content.db".to_string()),
                max_connections,
            },
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .unwrap_or(3000),
            },
            blog: BlogConfig {
                related_limit: env::var("RELATED_POSTS_LIMIT")
                    .unwrap_or_else(|_| "4".to_string())
                    .parse()
                    .unwrap_or(4),
            },
            seed_file: env::var("SEED_FILE").ok().filter(|path| !path.is_empty()),
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
