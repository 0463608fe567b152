//! Server configuration from flags and environment

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::{ServerError, ServerResult};

/// HTTP API for chart release lifecycle management
#[derive(Parser, Debug, Clone)]
#[command(name = "rudder")]
#[command(version)]
#[command(about = "HTTP API for chart release lifecycle management", long_about = None)]
pub struct Config {
    /// Address to bind the HTTP server to
    #[arg(long, env = "RUDDER_ADDRESS", default_value = "0.0.0.0")]
    pub address: String,

    /// Port to listen on
    #[arg(long, env = "RUDDER_PORT", default_value_t = 8181)]
    pub port: u16,

    /// Namespace the release backend itself runs in
    #[arg(long, env = "RUDDER_NAMESPACE", default_value = "kube-system")]
    pub namespace: String,

    /// Chart repository home (repositories.yaml, cached indexes)
    #[arg(long, env = "HELM_HOME")]
    pub home: Option<PathBuf>,

    /// Directory where release revisions are stored
    #[arg(long, env = "RUDDER_STORAGE_DIR")]
    pub storage_dir: Option<PathBuf>,

    /// Public key used when a request asks for signature verification
    #[arg(long, env = "RUDDER_KEYRING")]
    pub keyring: Option<PathBuf>,

    /// Directory downloaded charts are written to
    #[arg(long, env = "RUDDER_DOWNLOAD_DIR")]
    pub download_dir: Option<PathBuf>,

    /// Surface raw chart resolution errors
    #[arg(long)]
    pub debug: bool,
}

impl Config {
    /// Socket address to listen on
    pub fn listen_addr(&self) -> ServerResult<SocketAddr> {
        let raw = format!("{}:{}", self.address, self.port);
        raw.parse().map_err(|e| ServerError::Config {
            message: format!("invalid listen address {}: {}", raw, e),
        })
    }

    pub fn home_dir(&self) -> rudder_repo::RepoHome {
        match &self.home {
            Some(home) => rudder_repo::RepoHome::new(home),
            None => rudder_repo::RepoHome::new(rudder_repo::RepoHome::default_path()),
        }
    }

    pub fn storage_path(&self) -> PathBuf {
        self.storage_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("rudder")
                .join("releases")
        })
    }

    pub fn keyring_path(&self) -> PathBuf {
        self.keyring
            .clone()
            .unwrap_or_else(rudder_core::default_keyring_path)
    }

    pub fn download_path(&self) -> PathBuf {
        self.download_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}
