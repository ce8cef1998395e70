use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// HTTP listener settings, read from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Allowed CORS origins; empty means no CORS layer at all.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 5000,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let host = match env::var("FYYUR_HOST") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "FYYUR_HOST is not an IP address, using default");
                defaults.host
            }),
            Err(_) => defaults.host,
        };
        let port = match env::var("FYYUR_PORT") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "FYYUR_PORT is not a port number, using default");
                defaults.port
            }),
            Err(_) => defaults.port,
        };

        Self {
            host,
            port,
            cors_origins: parse_origins(&env::var("CORS_ORIGINS").unwrap_or_default()),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
