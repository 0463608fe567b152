//! Rudder Repository Management
//!
//! This crate provides the chart repository store used by Rudder:
//!
//! - **Home layout**: `repositories.yaml` and cached `index.yaml` files
//! - **Search**: scored search over every cached repository index
//! - **Getters**: pluggable retrieval by URL scheme (HTTP(S), file)
//! - **Downloads**: `repo/chart` or URL references fetched to disk
//! - **Verification**: minisign signatures next to chart archives
//! - **Resolution**: [`ChartResolver`] turns a chart reference into a local
//!   path, given an explicit per-request [`ResolveContext`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use rudder_repo::{ChartReference, ChartResolver, RepoHome, ResolveContext};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = ResolveContext::new(RepoHome::from_env(), ".");
//! let chart = ChartResolver::new(&ctx)
//!     .resolve(&ChartReference {
//!         name: "stable/nginx".to_string(),
//!         version: String::new(),
//!         verify: false,
//!         keyring: rudder_core::default_keyring_path(),
//!     })
//!     .await?;
//! println!("{}", chart.path.display());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod downloader;
pub mod error;
pub mod getter;
pub mod home;
pub mod index;
pub mod resolver;
pub mod search;
pub mod verify;

// Re-exports for convenience
pub use config::{RepositoryEntry, RepositoryFile, list_repositories};
pub use downloader::ChartDownloader;
pub use error::{RepoError, Result};
pub use getter::{FileGetter, Getter, Getters, HttpGetter, TlsFiles};
pub use home::RepoHome;
pub use index::{ChartVersion, IndexFile};
pub use resolver::{ChartReference, ChartResolver, ResolveContext, ResolvedChart};
pub use search::{SEARCH_MAX_SCORE, SearchIndex, SearchResult, list_charts};
pub use verify::verify_chart;
