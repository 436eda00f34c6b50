use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: IpAddr,
    pub server_port: u16,
    pub environment: Environment,
    pub log_level: String,
    pub frontend_url: String,
    /// Directory of static client assets served on unmatched paths, if any.
    pub public_dir: Option<PathBuf>,
}

/// Deployment environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Self {
        match value {
            "production" => Self::Production,
            "staging" => Self::Staging,
            _ => Self::Development,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// All variables are optional: `SERVER_HOST`, `SERVER_PORT` (or `PORT`), `ENVIRONMENT`,
    /// `LOG_LEVEL`, `FRONTEND_URL`, `PUBLIC_DIR`.
    ///
    /// # Errors
    ///
    /// Returns an error if `SERVER_HOST` / `SERVER_PORT` contain invalid values.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let environment = Environment::parse(
            &std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        );

        // PORT wins over SERVER_PORT so hosting platforms can inject it
        let server_port = std::env::var("PORT")
            .or_else(|_| std::env::var("SERVER_PORT"))
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| anyhow::anyhow!("SERVER_PORT / PORT must be a valid u16"))?;

        let default_host = if environment == Environment::Production {
            "0.0.0.0"
        } else {
            "127.0.0.1"
        };

        let server_host = std::env::var("SERVER_HOST")
            .unwrap_or_else(|_| default_host.to_string())
            .parse::<IpAddr>()
            .map_err(|_| anyhow::anyhow!("SERVER_HOST must be a valid IP address"))?;

        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let frontend_url = std::env::var("FRONTEND_URL")
            .unwrap_or_else(|_| format!("http://localhost:{server_port}"));

        let public_dir = std::env::var("PUBLIC_DIR")
            .ok()
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            server_host,
            server_port,
            environment,
            log_level,
            frontend_url,
            public_dir,
        })
    }

    /// Build the socket address for the server to bind to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server_host, self.server_port)
    }
}
