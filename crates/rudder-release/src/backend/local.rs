//! Storage-backed release backend
//!
//! Records revisions and status transitions through a [`StorageDriver`]
//! without talking to a cluster. Mutations are serialized by one lock, so
//! concurrent requests for the same name cannot interleave.

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use regex::Regex;
use rudder_core::{Chart, SortBy, SortOrder, StatusCode};
use serde_json::Value;
use std::collections::HashSet;
use tokio::sync::Mutex;

use super::ReleaseBackend;
use crate::actions::{DeleteOptions, InstallOptions, ListOptions, RollbackOptions, UpdateOptions};
use crate::error::{BackendError, BackendResult};
use crate::release::{
    GetHistoryResponse, GetReleaseContentResponse, GetReleaseStatusResponse, ListReleasesResponse,
    Release, ReleaseResponse, UninstallReleaseResponse,
};
use crate::storage::StorageDriver;
use crate::values;

/// Longest accepted release name
pub const MAX_NAME_LEN: usize = 53;

const NAME_ATTEMPTS: usize = 5;

const ADJECTIVES: &[&str] = &[
    "amber", "bold", "brave", "calm", "clever", "crisp", "eager", "fancy", "gentle", "happy",
    "honest", "jolly", "kind", "lively", "lucky", "mellow", "nimble", "quiet", "rapid", "silent",
    "steady", "sunny", "swift", "tidy", "witty",
];

const NOUNS: &[&str] = &[
    "anchor", "badger", "beacon", "falcon", "ferret", "harbor", "heron", "lantern", "lynx",
    "marlin", "otter", "owl", "panda", "pelican", "puffin", "quokka", "raven", "sail", "seal",
    "sparrow", "tern", "tide", "walrus", "whale", "zebra",
];

/// Release backend persisting revisions through a storage driver
pub struct LocalBackend<S> {
    storage: S,
    writes: Mutex<()>,
}

impl<S: StorageDriver> LocalBackend<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            writes: Mutex::new(()),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// History, or an empty list when the release does not exist
    async fn history_or_empty(&self, name: &str) -> BackendResult<Vec<Release>> {
        match self.storage.history(name).await {
            Ok(history) => Ok(history),
            Err(BackendError::ReleaseNotFound { .. }) => Ok(vec![]),
            Err(e) => Err(e),
        }
    }

    /// Pick the name for a new install and return the existing history under it
    async fn reserve_name(&self, opts: &InstallOptions) -> BackendResult<(String, Vec<Release>)> {
        if opts.name.is_empty() {
            for _ in 0..NAME_ATTEMPTS {
                let candidate = generated_name();
                if !self.storage.exists(&candidate).await? {
                    tracing::info!(name = %candidate, "generated release name");
                    return Ok((candidate, vec![]));
                }
            }
            return Err(BackendError::Unavailable(
                "no available release name found".to_string(),
            ));
        }

        validate_name(&opts.name)?;

        let history = self.history_or_empty(&opts.name).await?;
        if let Some(latest) = history.first() {
            let reusable = matches!(latest.info.status, StatusCode::Deleted | StatusCode::Failed);
            if !(opts.reuse_name && reusable) {
                return Err(BackendError::AlreadyExists {
                    name: opts.name.clone(),
                });
            }
            tracing::info!(name = %opts.name, "name reuse requested, replacing release");
        }

        Ok((opts.name.clone(), history))
    }

    async fn supersede_deployed(&self, history: &[Release]) -> BackendResult<()> {
        for previous in history.iter().filter(|r| r.info.status == StatusCode::Deployed) {
            let mut previous = previous.clone();
            previous.mark_superseded();
            self.storage.update(&previous).await?;
        }
        Ok(())
    }

    async fn revision(&self, name: &str, version: u32) -> BackendResult<Release> {
        if version == 0 {
            self.storage.get_latest(name).await
        } else {
            self.storage.get(name, version).await
        }
    }
}

/// `adjective-noun`
fn generated_name() -> String {
    let mut rng = rand::rng();
    let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("calm");
    let noun = NOUNS.choose(&mut rng).copied().unwrap_or("otter");
    format!("{}-{}", adjective, noun)
}

/// Release names are at most [`MAX_NAME_LEN`] characters of ASCII letters,
/// digits, `-`, `_` and `.`, starting and ending with a letter or digit
pub fn validate_name(name: &str) -> BackendResult<()> {
    if name.len() > MAX_NAME_LEN {
        return Err(BackendError::InvalidRequest(format!(
            "release name {:?} exceeds max length of {}",
            name, MAX_NAME_LEN
        )));
    }
    let alnum = |c: char| c.is_ascii_alphanumeric();
    let valid = name.starts_with(alnum)
        && name.ends_with(alnum)
        && name.chars().all(|c| alnum(c) || matches!(c, '-' | '_' | '.'));
    if !valid {
        return Err(BackendError::InvalidRequest(format!(
            "release name {:?} is invalid: must consist of alphanumeric characters, '-', '_' or '.', and must start and end with an alphanumeric character",
            name
        )));
    }
    Ok(())
}

/// Namespaces are DNS-1123 labels
pub fn validate_namespace(namespace: &str) -> BackendResult<()> {
    let alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    let valid = namespace.len() <= 63
        && namespace.starts_with(alnum)
        && namespace.ends_with(alnum)
        && namespace.chars().all(|c| alnum(c) || c == '-');
    if !valid {
        return Err(BackendError::InvalidRequest(format!(
            "namespace {:?} is invalid: must be a lower case alphanumeric label of at most 63 characters",
            namespace
        )));
    }
    Ok(())
}

fn chart_values(chart: &Chart) -> BackendResult<Value> {
    let defaults = chart
        .default_values()
        .map_err(|e| BackendError::InvalidRequest(format!("chart {}: {}", chart.name(), e)))?;
    let defaults = serde_json::to_value(defaults)
        .map_err(|e| BackendError::InvalidRequest(format!("chart {}: {}", chart.name(), e)))?;
    Ok(match defaults {
        Value::Null => Value::Object(Default::default()),
        other => other,
    })
}

#[async_trait]
impl<S: StorageDriver> ReleaseBackend for LocalBackend<S> {
    async fn list_releases(&self, opts: ListOptions) -> BackendResult<ListReleasesResponse> {
        let filter = if opts.filter.is_empty() {
            None
        } else {
            Some(Regex::new(&opts.filter).map_err(|e| {
                BackendError::InvalidRequest(format!("invalid filter {:?}: {}", opts.filter, e))
            })?)
        };
        let codes: HashSet<StatusCode> = opts.status_codes.iter().copied().collect();

        let mut releases: Vec<Release> = self
            .storage
            .list()
            .await?
            .into_iter()
            .filter(|r| codes.contains(&r.info.status))
            .filter(|r| opts.namespace.is_empty() || r.namespace == opts.namespace)
            .filter(|r| filter.as_ref().is_none_or(|re| re.is_match(&r.name)))
            .collect();

        match opts.sort_by {
            SortBy::Name => releases.sort_by(|a, b| {
                a.name.cmp(&b.name).then_with(|| a.version.cmp(&b.version))
            }),
            SortBy::LastReleased => releases.sort_by(|a, b| {
                a.info
                    .last_deployed
                    .cmp(&b.info.last_deployed)
                    .then_with(|| a.name.cmp(&b.name))
            }),
        }
        if opts.sort_order == SortOrder::Desc {
            releases.reverse();
        }

        let total = releases.len() as i64;

        if !opts.offset.is_empty() {
            let start = releases
                .iter()
                .position(|r| r.name == opts.offset)
                .ok_or_else(|| {
                    BackendError::InvalidRequest(format!("offset {:?} not found", opts.offset))
                })?;
            releases.drain(..start);
        }

        let mut next = String::new();
        if opts.limit > 0 {
            let limit = opts.limit as usize;
            if releases.len() > limit {
                next = releases[limit].name.clone();
                releases.truncate(limit);
            }
        }

        Ok(ListReleasesResponse {
            count: releases.len() as i64,
            next,
            total,
            releases,
        })
    }

    async fn release_history(&self, name: &str, max: u32) -> BackendResult<GetHistoryResponse> {
        validate_name(name)?;
        let mut releases = self.storage.history(name).await?;
        if max > 0 {
            releases.truncate(max as usize);
        }
        Ok(GetHistoryResponse { releases })
    }

    async fn release_status(
        &self,
        name: &str,
        version: u32,
    ) -> BackendResult<GetReleaseStatusResponse> {
        validate_name(name)?;
        let release = self.revision(name, version).await?;
        Ok(GetReleaseStatusResponse::from(&release))
    }

    async fn release_content(
        &self,
        name: &str,
        version: u32,
    ) -> BackendResult<GetReleaseContentResponse> {
        validate_name(name)?;
        let release = self.revision(name, version).await?;
        Ok(GetReleaseContentResponse { release })
    }

    async fn install_release_from_chart(
        &self,
        chart: &Chart,
        opts: InstallOptions,
    ) -> BackendResult<ReleaseResponse> {
        validate_namespace(&opts.namespace)?;
        let _guard = self.writes.lock().await;

        let (name, history) = self.reserve_name(&opts).await?;
        let config = values::parse(&opts.values)?;

        let mut release = Release::for_install(
            name,
            opts.namespace.clone(),
            chart.metadata.clone(),
            chart_values(chart)?,
            config,
        );
        if let Some(latest) = history.first() {
            release.version = latest.version + 1;
        }

        if opts.dry_run {
            release.info.description = "Dry run complete".to_string();
            return Ok(ReleaseResponse {
                release: Some(release),
            });
        }

        release.mark_deployed("Install complete");
        self.storage.create(&release).await?;

        tracing::info!(
            name = %release.name,
            namespace = %release.namespace,
            revision = release.version,
            "release installed"
        );
        Ok(ReleaseResponse {
            release: Some(release),
        })
    }

    async fn update_release(
        &self,
        name: &str,
        chart: &Chart,
        opts: UpdateOptions,
    ) -> BackendResult<ReleaseResponse> {
        validate_name(name)?;
        let _guard = self.writes.lock().await;

        let history = self.storage.history(name).await?;
        let current = &history[0];
        if current.info.status == StatusCode::Deleted {
            return Err(BackendError::InvalidRequest(format!(
                "{:?} has no deployed releases",
                name
            )));
        }

        let overrides = values::parse(&opts.values)?;
        let config = if opts.reset_values {
            overrides
        } else if opts.reuse_values {
            let mut config = current.config.clone();
            values::merge(&mut config, &overrides);
            config
        } else if values::is_empty(&overrides) {
            current.config.clone()
        } else {
            overrides
        };

        let mut release =
            Release::for_upgrade(current, chart.metadata.clone(), chart_values(chart)?, config);

        if opts.dry_run {
            release.info.description = "Dry run complete".to_string();
            return Ok(ReleaseResponse {
                release: Some(release),
            });
        }

        self.supersede_deployed(&history).await?;
        release.mark_deployed("Upgrade complete");
        self.storage.create(&release).await?;

        tracing::info!(name, revision = release.version, "release upgraded");
        Ok(ReleaseResponse {
            release: Some(release),
        })
    }

    async fn rollback_release(
        &self,
        name: &str,
        opts: RollbackOptions,
    ) -> BackendResult<ReleaseResponse> {
        validate_name(name)?;
        let _guard = self.writes.lock().await;

        let history = self.storage.history(name).await?;
        let current = &history[0];

        let target_version = if opts.version == 0 {
            if current.version < 2 {
                return Err(BackendError::InvalidRequest(format!(
                    "release {:?} has no previous revision to roll back to",
                    name
                )));
            }
            current.version - 1
        } else {
            opts.version
        };
        let target = self.storage.get(name, target_version).await?;

        let mut release = Release::for_upgrade(
            current,
            target.chart.clone(),
            target.chart_values.clone(),
            target.config.clone(),
        );

        if opts.dry_run {
            release.info.description = "Dry run complete".to_string();
            return Ok(ReleaseResponse {
                release: Some(release),
            });
        }

        self.supersede_deployed(&history).await?;
        release.mark_deployed(format!("Rollback to {}", target_version));
        self.storage.create(&release).await?;

        tracing::info!(name, revision = release.version, target = target_version, "release rolled back");
        Ok(ReleaseResponse {
            release: Some(release),
        })
    }

    async fn delete_release(
        &self,
        name: &str,
        opts: DeleteOptions,
    ) -> BackendResult<UninstallReleaseResponse> {
        validate_name(name)?;
        let _guard = self.writes.lock().await;

        let mut latest = self.storage.get_latest(name).await?;

        if opts.dry_run {
            return Ok(UninstallReleaseResponse {
                release: Some(latest),
                info: String::new(),
            });
        }

        if opts.purge {
            let removed = self.storage.delete_all(name).await?;
            latest.mark_deleted();
            tracing::info!(name, revisions = removed.len(), "release purged");
            return Ok(UninstallReleaseResponse {
                release: Some(latest),
                info: format!("purged {} revision(s)", removed.len()),
            });
        }

        if latest.info.status == StatusCode::Deleted {
            return Err(BackendError::InvalidRequest(format!(
                "release: {:?} is already deleted",
                name
            )));
        }

        latest.mark_deleted();
        self.storage.update(&latest).await?;

        tracing::info!(name, revision = latest.version, "release deleted");
        Ok(UninstallReleaseResponse {
            release: Some(latest),
            info: String::new(),
        })
    }
}
