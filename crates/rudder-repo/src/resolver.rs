//! Chart reference resolution
//!
//! Resolution order, first match wins:
//!
//! 1. an existing local path (verified in place when requested)
//! 2. absolute or `.`-prefixed names stop here with "not found"
//! 3. the local chart cache under `<home>/repository/<name>`
//! 4. a download through the registered getters into the download directory

use std::path::{Path, PathBuf};

use crate::downloader::ChartDownloader;
use crate::error::{RepoError, Result};
use crate::getter::Getters;
use crate::home::RepoHome;
use crate::verify::verify_chart;

/// Settings consulted while resolving one request
///
/// Built fresh for every operation; nothing in it is shared mutably
/// between requests.
#[derive(Debug, Clone)]
pub struct ResolveContext {
    pub home: RepoHome,
    pub getters: Getters,
    /// Where downloaded archives are written
    pub download_dir: PathBuf,
    /// Report the underlying download error instead of a plain "not found"
    pub debug: bool,
}

impl ResolveContext {
    pub fn new(home: RepoHome, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            home,
            getters: Getters::all(),
            download_dir: download_dir.into(),
            debug: false,
        }
    }

    pub fn with_getters(mut self, getters: Getters) -> Self {
        self.getters = getters;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// A symbolic chart reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartReference {
    /// Local path, `repo/chart`, or URL
    pub name: String,
    /// Empty selects the newest version
    pub version: String,
    pub verify: bool,
    pub keyring: PathBuf,
}

/// A chart reference resolved to a local file or directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedChart {
    pub path: PathBuf,
}

/// Resolves chart references to local paths
#[derive(Debug, Clone, Copy)]
pub struct ChartResolver<'a> {
    ctx: &'a ResolveContext,
}

impl<'a> ChartResolver<'a> {
    pub fn new(ctx: &'a ResolveContext) -> Self {
        Self { ctx }
    }

    pub async fn resolve(&self, reference: &ChartReference) -> Result<ResolvedChart> {
        let name = reference.name.trim();
        let version = reference.version.trim();

        if name.is_empty() {
            return Err(RepoError::InvalidReference {
                reference: String::new(),
                reason: "chart name is empty".to_string(),
            });
        }

        let local = Path::new(name);
        if let Ok(metadata) = std::fs::metadata(local) {
            let path = std::path::absolute(local)?;
            if reference.verify {
                if metadata.is_dir() {
                    return Err(RepoError::verification("cannot verify a directory"));
                }
                verify_chart(&path, &reference.keyring)?;
            }
            tracing::debug!(path = %path.display(), "resolved chart from local path");
            return Ok(ResolvedChart { path });
        }

        if local.is_absolute() || name.starts_with('.') {
            return Err(RepoError::ChartNotFound(format!("path {:?} not found", name)));
        }

        let cached = self.ctx.home.repository().join(name);
        if cached.exists() {
            let path = std::path::absolute(&cached)?;
            if reference.verify {
                verify_chart(&path, &reference.keyring)?;
            }
            tracing::debug!(path = %path.display(), "resolved chart from repository cache");
            return Ok(ResolvedChart { path });
        }

        let downloader = ChartDownloader {
            home: &self.ctx.home,
            getters: &self.ctx.getters,
            keyring: reference.keyring.clone(),
            verify: reference.verify,
        };

        match downloader
            .download_to(name, version, &self.ctx.download_dir)
            .await
        {
            Ok(archive) => {
                let path = std::path::absolute(&archive)?;
                tracing::debug!(reference = name, path = %path.display(), "fetched chart");
                Ok(ResolvedChart { path })
            }
            Err(e @ (RepoError::VerificationFailed { .. } | RepoError::DownloadFailed { .. })) => Err(e),
            Err(e) if self.ctx.debug => Err(e),
            Err(e) => {
                tracing::debug!(reference = name, error = %e, "chart download failed");
                Err(RepoError::ChartNotFound(format!("file {:?} not found", name)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RepositoryEntry, RepositoryFile};
    use crate::verify::{signature_path, tests::keyring};
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn reference(name: &str) -> ChartReference {
        ChartReference {
            name: name.to_string(),
            version: String::new(),
            verify: false,
            keyring: PathBuf::from("/nonexistent/rudder.pub"),
        }
    }

    fn context(temp: &TempDir) -> ResolveContext {
        ResolveContext::new(RepoHome::new(temp.path().join("home")), temp.path().join("dl"))
    }

    #[tokio::test]
    async fn test_local_directory() {
        let temp = TempDir::new().unwrap();
        let chart = temp.path().join("mychart");
        std::fs::create_dir_all(&chart).unwrap();

        let ctx = context(&temp);
        let resolved = ChartResolver::new(&ctx)
            .resolve(&reference(chart.to_str().unwrap()))
            .await
            .unwrap();
        assert_eq!(resolved.path, chart);
    }

    #[tokio::test]
    async fn test_verify_rejects_directory() {
        let temp = TempDir::new().unwrap();
        let chart = temp.path().join("mychart");
        std::fs::create_dir_all(&chart).unwrap();

        let ctx = context(&temp);
        let mut reference = reference(chart.to_str().unwrap());
        reference.verify = true;
        let err = ChartResolver::new(&ctx).resolve(&reference).await.unwrap_err();
        assert!(matches!(err, RepoError::VerificationFailed { .. }));
    }

    #[tokio::test]
    async fn test_verify_local_archive() {
        let temp = TempDir::new().unwrap();
        let (key, sign) = keyring(temp.path());
        let archive = temp.path().join("demo-0.1.0.tgz");
        std::fs::write(&archive, b"bytes").unwrap();
        std::fs::write(signature_path(&archive), sign(b"bytes")).unwrap();

        let ctx = context(&temp);
        let mut reference = reference(archive.to_str().unwrap());
        reference.verify = true;
        reference.keyring = key;
        let resolved = ChartResolver::new(&ctx).resolve(&reference).await.unwrap();
        assert_eq!(resolved.path, archive);
    }

    #[tokio::test]
    async fn test_missing_absolute_path() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        let missing = temp.path().join("nope");

        let err = ChartResolver::new(&ctx)
            .resolve(&reference(missing.to_str().unwrap()))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::ChartNotFound(_)));

        let err = ChartResolver::new(&ctx)
            .resolve(&reference("./definitely-not-here"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_repository_cache() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        let cached = ctx.home.repository().join("cached-chart-for-test");
        std::fs::create_dir_all(&cached).unwrap();

        let resolved = ChartResolver::new(&ctx)
            .resolve(&reference("cached-chart-for-test"))
            .await
            .unwrap();
        assert_eq!(resolved.path, cached);
    }

    #[tokio::test]
    async fn test_local_path_wins_over_repository_cache() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);

        // Relative to the working directory, like `./mychart`
        let local = tempfile::Builder::new()
            .prefix("rudder-local-chart")
            .tempdir_in(".")
            .unwrap();
        let name = local.path().file_name().unwrap().to_str().unwrap().to_string();
        std::fs::create_dir_all(ctx.home.repository().join(&name)).unwrap();

        let resolved = ChartResolver::new(&ctx).resolve(&reference(&name)).await.unwrap();
        assert_eq!(resolved.path, std::path::absolute(&name).unwrap());
        assert_ne!(resolved.path, ctx.home.repository().join(&name));

        let dotted = format!("./{}", name);
        let resolved = ChartResolver::new(&ctx).resolve(&reference(&dotted)).await.unwrap();
        assert_eq!(resolved.path, std::path::absolute(&dotted).unwrap());
    }

    #[tokio::test]
    async fn test_unknown_reference_is_not_found() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);

        let err = ChartResolver::new(&ctx)
            .resolve(&reference("stable/unknown-chart"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "file \"stable/unknown-chart\" not found");

        let ctx = context(&temp).with_debug(true);
        let err = ChartResolver::new(&ctx)
            .resolve(&reference("stable/unknown-chart"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::RepositoryFileMissing { .. }));
    }

    #[tokio::test]
    async fn test_download_from_repository() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/demo-0.1.0.tgz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"remote".to_vec()))
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        let mut file = RepositoryFile::default();
        file.update(RepositoryEntry::new("remote", server.uri()));
        file.save(&ctx.home.repository_file()).unwrap();
        std::fs::create_dir_all(ctx.home.cache()).unwrap();
        std::fs::write(
            ctx.home.cache_index("remote"),
            "entries:\n  demo:\n    - name: demo\n      version: 0.1.0\n      urls: [demo-0.1.0.tgz]\n",
        )
        .unwrap();

        let resolved = ChartResolver::new(&ctx)
            .resolve(&reference("remote/demo"))
            .await
            .unwrap();
        assert_eq!(resolved.path, temp.path().join("dl").join("demo-0.1.0.tgz"));
    }
}
