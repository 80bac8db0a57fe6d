use std::env;
use std::net::SocketAddr;

use crate::error::ConfigError;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_ADMIN_PASSWORD: &str = "Admin";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// Shared secret for the quiz and poll admin consoles.
    pub admin_password: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(env::var("BIND_ADDR").ok(), env::var("ADMIN_PASSWORD").ok())
    }

    fn from_vars(
        bind_addr: Option<String>,
        admin_password: Option<String>,
    ) -> Result<Self, ConfigError> {
        let bind_addr = bind_addr
            .as_deref()
            .unwrap_or(DEFAULT_BIND_ADDR)
            .parse::<SocketAddr>()?;

        let admin_password =
            admin_password.unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string());
        if admin_password.is_empty() {
            return Err(ConfigError::EmptyAdminPassword);
        }

        Ok(Self {
            bind_addr,
            admin_password,
        })
    }
}
