use std::{net::SocketAddr, time::Duration};

use anyhow::Context;

pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub documents_dir: String,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub reminder_sweep: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let listen_addr: SocketAddr = std::env::var("FF_LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .context("Invalid FF_LISTEN_ADDR")?;
        let db_path = std::env::var("FF_DB_PATH").unwrap_or_else(|_| "./db/fundflow.db".into());
        let documents_dir =
            std::env::var("FF_DOCUMENTS_DIR").unwrap_or_else(|_| "./documents".into());
        let cors_allow = std::env::var("FF_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let timeout_ms: u64 = std::env::var("FF_REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|_| "30000".into())
            .parse()
            .unwrap_or(30000);
        let reminder_sweep = std::env::var("FF_REMINDER_SWEEP")
            .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"))
            .unwrap_or(true);
        Ok(Self {
            listen_addr,
            db_path,
            documents_dir,
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
            reminder_sweep,
        })
    }
}
