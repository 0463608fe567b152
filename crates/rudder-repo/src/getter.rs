//! Retrieval backends, selected by URL scheme
//!
//! `http`/`https` go through reqwest and honour a repository's TLS files;
//! `file` reads from the local filesystem. Additional providers can be
//! registered for other schemes.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::config::RepositoryEntry;
use crate::error::{RepoError, Result};

/// Fetches the bytes behind a URL
#[async_trait]
pub trait Getter: Send + Sync {
    async fn get(&self, url: &Url) -> Result<Vec<u8>>;
}

/// Client certificate settings of a repository (empty = unset)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsFiles {
    pub cert_file: String,
    pub key_file: String,
    pub ca_file: String,
}

impl From<&RepositoryEntry> for TlsFiles {
    fn from(entry: &RepositoryEntry) -> Self {
        Self {
            cert_file: entry.cert_file.clone(),
            key_file: entry.key_file.clone(),
            ca_file: entry.ca_file.clone(),
        }
    }
}

/// HTTP(S) getter
pub struct HttpGetter {
    client: reqwest::Client,
}

impl HttpGetter {
    pub fn new(tls: &TlsFiles) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(concat!("rudder/", env!("CARGO_PKG_VERSION")));

        if !tls.ca_file.is_empty() {
            let pem = std::fs::read(&tls.ca_file)?;
            builder = builder.add_root_certificate(reqwest::Certificate::from_pem(&pem)?);
        }

        if !tls.cert_file.is_empty() && !tls.key_file.is_empty() {
            let mut pem = std::fs::read(&tls.cert_file)?;
            pem.extend(std::fs::read(&tls.key_file)?);
            builder = builder.identity(reqwest::Identity::from_pem(&pem)?);
        }

        let client = builder.build().map_err(|e| RepoError::NetworkError {
            message: e.to_string(),
        })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Getter for HttpGetter {
    async fn get(&self, url: &Url) -> Result<Vec<u8>> {
        tracing::debug!(%url, "fetching");
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RepoError::HttpError {
                status: status.as_u16(),
                message: format!("failed to fetch {}", url),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// Local filesystem getter for `file://` URLs
#[derive(Debug, Default)]
pub struct FileGetter;

#[async_trait]
impl Getter for FileGetter {
    async fn get(&self, url: &Url) -> Result<Vec<u8>> {
        let path = url.to_file_path().map_err(|_| RepoError::InvalidReference {
            reference: url.to_string(),
            reason: "not a local file URL".to_string(),
        })?;
        Ok(std::fs::read(path)?)
    }
}

type Constructor = Arc<dyn Fn(&TlsFiles) -> Result<Arc<dyn Getter>> + Send + Sync>;

#[derive(Clone)]
struct Provider {
    schemes: Vec<String>,
    new: Constructor,
}

/// Registry of getters by URL scheme
#[derive(Clone, Default)]
pub struct Getters {
    providers: Vec<Provider>,
}

impl fmt::Debug for Getters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let schemes: Vec<_> = self.providers.iter().flat_map(|p| p.schemes.iter()).collect();
        f.debug_struct("Getters").field("schemes", &schemes).finish()
    }
}

impl Getters {
    /// `http`, `https` and `file`
    pub fn all() -> Self {
        Self::default()
            .with_provider(&["http", "https"], |tls| {
                Ok(Arc::new(HttpGetter::new(tls)?) as Arc<dyn Getter>)
            })
            .with_provider(&["file"], |_| Ok(Arc::new(FileGetter) as Arc<dyn Getter>))
    }

    /// Register a provider; later registrations take precedence
    pub fn with_provider<F>(mut self, schemes: &[&str], new: F) -> Self
    where
        F: Fn(&TlsFiles) -> Result<Arc<dyn Getter>> + Send + Sync + 'static,
    {
        self.providers.insert(
            0,
            Provider {
                schemes: schemes.iter().map(|s| s.to_string()).collect(),
                new: Arc::new(new),
            },
        );
        self
    }

    /// Build the getter serving `scheme`
    pub fn by_scheme(&self, scheme: &str, tls: &TlsFiles) -> Result<Arc<dyn Getter>> {
        let provider = self
            .providers
            .iter()
            .find(|p| p.schemes.iter().any(|s| s == scheme))
            .ok_or_else(|| RepoError::UnsupportedScheme {
                scheme: scheme.to_string(),
            })?;
        (provider.new)(tls)
    }
}
