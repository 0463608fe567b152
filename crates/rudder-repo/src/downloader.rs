//! Chart downloads from configured repositories or absolute URLs

use std::path::{Path, PathBuf};
use url::Url;

use crate::config::RepositoryFile;
use crate::error::{RepoError, Result};
use crate::getter::{Getters, TlsFiles};
use crate::home::RepoHome;
use crate::index::IndexFile;
use crate::verify::{signature_path, verify_chart};

/// Downloads chart archives, optionally verifying their signatures
#[derive(Debug)]
pub struct ChartDownloader<'a> {
    pub home: &'a RepoHome,
    pub getters: &'a Getters,
    pub keyring: PathBuf,
    pub verify: bool,
}

impl ChartDownloader<'_> {
    /// Download `reference` at `version` into `dest`, returning the archive path
    ///
    /// `reference` is either an absolute URL or `repo/chart`.
    pub async fn download_to(&self, reference: &str, version: &str, dest: &Path) -> Result<PathBuf> {
        let (url, tls) = self.resolve_chart_version(reference, version)?;
        let getter = self.getters.by_scheme(url.scheme(), &tls)?;

        let filename = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| RepoError::InvalidReference {
                reference: url.to_string(),
                reason: "URL does not name a file".to_string(),
            })?
            .to_string();

        let data = getter.get(&url).await.map_err(|e| download_failed(reference, e))?;
        std::fs::create_dir_all(dest)?;
        let archive = dest.join(&filename);
        std::fs::write(&archive, &data)?;
        tracing::info!(%url, path = %archive.display(), "downloaded chart");

        if self.verify {
            let sig_url = Url::parse(&format!("{}.minisig", url))?;
            let signature = getter.get(&sig_url).await.map_err(|e| {
                RepoError::verification(format!("failed to fetch signature {}: {}", sig_url, e))
            })?;
            std::fs::write(signature_path(&archive), signature)?;
            verify_chart(&archive, &self.keyring)?;
        }

        Ok(archive)
    }

    /// Turn a reference into a download URL and the TLS settings to fetch it with
    pub fn resolve_chart_version(&self, reference: &str, version: &str) -> Result<(Url, TlsFiles)> {
        if let Some(url) = absolute_url(reference) {
            // Reuse the TLS settings of a repository serving this URL, if any
            let tls = RepositoryFile::load(&self.home.repository_file())
                .ok()
                .and_then(|file| {
                    file.repositories
                        .iter()
                        .find(|r| !r.url.is_empty() && reference.starts_with(&r.url))
                        .map(TlsFiles::from)
                })
                .unwrap_or_default();
            return Ok((url, tls));
        }

        let Some((repo_name, chart_name)) = reference.split_once('/') else {
            return Err(RepoError::InvalidReference {
                reference: reference.to_string(),
                reason: "non-absolute references should be in the form repo_name/chart_name"
                    .to_string(),
            });
        };

        let repositories = RepositoryFile::load(&self.home.repository_file())?;
        let repo = repositories
            .get(repo_name)
            .ok_or_else(|| RepoError::RepositoryNotFound {
                name: repo_name.to_string(),
            })?;

        let index = IndexFile::load(&self.home.index_for(repo))?;
        if !index.entries.contains_key(chart_name) {
            return Err(RepoError::ChartNotInRepository {
                name: chart_name.to_string(),
                repo: repo_name.to_string(),
            });
        }
        let chart = index
            .get(chart_name, version)
            .ok_or_else(|| RepoError::VersionNotFound {
                name: chart_name.to_string(),
                version: version.to_string(),
            })?;

        let raw = chart.urls.first().ok_or_else(|| RepoError::InvalidIndex {
            path: self.home.index_for(repo).display().to_string(),
            message: format!("chart {} {} has no download URL", chart.name, chart.version),
        })?;

        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(_) => {
                let base = Url::parse(&format!("{}/", repo.url.trim_end_matches('/')))?;
                base.join(raw)?
            }
        };

        Ok((url, TlsFiles::from(repo)))
    }
}

fn absolute_url(reference: &str) -> Option<Url> {
    let url = Url::parse(reference).ok()?;
    let has_location = url.has_host() || url.scheme() == "file";
    (has_location && !url.path().is_empty()).then_some(url)
}

fn download_failed(reference: &str, err: RepoError) -> RepoError {
    RepoError::DownloadFailed {
        reference: reference.to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RepositoryEntry;
    use crate::verify::tests::keyring;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn setup(repo_url: &str) -> (TempDir, RepoHome) {
        let temp = TempDir::new().unwrap();
        let home = RepoHome::new(temp.path().join("home"));
        let mut file = RepositoryFile::default();
        file.update(RepositoryEntry::new("stable", repo_url));
        file.save(&home.repository_file()).unwrap();

        std::fs::create_dir_all(home.cache()).unwrap();
        std::fs::write(
            home.cache_index("stable"),
            r#"
apiVersion: v1
entries:
  demo:
    - name: demo
      version: 0.2.0
      urls: [demo-0.2.0.tgz]
    - name: demo
      version: 0.1.0
      urls: [https://mirror.example.com/demo-0.1.0.tgz]
"#,
        )
        .unwrap();
        (temp, home)
    }

    fn downloader<'a>(home: &'a RepoHome, getters: &'a Getters) -> ChartDownloader<'a> {
        ChartDownloader {
            home,
            getters,
            keyring: PathBuf::from("/nonexistent"),
            verify: false,
        }
    }

    #[test]
    fn test_resolve_repo_reference() {
        let (_temp, home) = setup("https://charts.example.com/stable");
        let getters = Getters::all();
        let dl = downloader(&home, &getters);

        let (url, _) = dl.resolve_chart_version("stable/demo", "").unwrap();
        assert_eq!(url.as_str(), "https://charts.example.com/stable/demo-0.2.0.tgz");

        let (url, _) = dl.resolve_chart_version("stable/demo", "0.1.0").unwrap();
        assert_eq!(url.as_str(), "https://mirror.example.com/demo-0.1.0.tgz");
    }

    #[test]
    fn test_resolve_errors() {
        let (_temp, home) = setup("https://charts.example.com");
        let getters = Getters::all();
        let dl = downloader(&home, &getters);

        assert!(matches!(
            dl.resolve_chart_version("demo", ""),
            Err(RepoError::InvalidReference { .. })
        ));
        assert!(matches!(
            dl.resolve_chart_version("other/demo", ""),
            Err(RepoError::RepositoryNotFound { .. })
        ));
        assert!(matches!(
            dl.resolve_chart_version("stable/nope", ""),
            Err(RepoError::ChartNotInRepository { .. })
        ));
        assert!(matches!(
            dl.resolve_chart_version("stable/demo", "9.0.0"),
            Err(RepoError::VersionNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_download_and_verify() {
        let server = MockServer::start().await;
        let (temp, home) = setup(&server.uri());
        let (key, sign) = keyring(temp.path());

        Mock::given(method("GET"))
            .and(path("/demo-0.2.0.tgz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"chart-archive".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/demo-0.2.0.tgz.minisig"))
            .respond_with(ResponseTemplate::new(200).set_body_string(sign(b"chart-archive")))
            .mount(&server)
            .await;

        let getters = Getters::all();
        let dl = ChartDownloader {
            home: &home,
            getters: &getters,
            keyring: key,
            verify: true,
        };
        let dest = temp.path().join("downloads");
        let archive = dl.download_to("stable/demo", "", &dest).await.unwrap();

        assert_eq!(archive, dest.join("demo-0.2.0.tgz"));
        assert_eq!(std::fs::read(&archive).unwrap(), b"chart-archive");
        assert!(signature_path(&archive).exists());
    }

    #[tokio::test]
    async fn test_download_http_failure() {
        let server = MockServer::start().await;
        let (temp, home) = setup(&server.uri());
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let getters = Getters::all();
        let err = downloader(&home, &getters)
            .download_to("stable/demo", "", temp.path())
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::DownloadFailed { .. }));
    }

    #[tokio::test]
    async fn test_download_absolute_url() {
        let server = MockServer::start().await;
        let (temp, home) = setup("https://charts.example.com");
        Mock::given(method("GET"))
            .and(path("/direct/demo-1.0.0.tgz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"direct".to_vec()))
            .mount(&server)
            .await;

        let getters = Getters::all();
        let reference = format!("{}/direct/demo-1.0.0.tgz", server.uri());
        let archive = downloader(&home, &getters)
            .download_to(&reference, "", temp.path())
            .await
            .unwrap();
        assert_eq!(archive.file_name().unwrap(), "demo-1.0.0.tgz");
    }
}
