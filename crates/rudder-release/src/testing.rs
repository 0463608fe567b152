//! Scripted release backend for manager and query tests

use async_trait::async_trait;
use rudder_core::Chart;
use std::sync::Mutex;

use crate::actions::{DeleteOptions, InstallOptions, ListOptions, RollbackOptions, UpdateOptions};
use crate::backend::{LocalBackend, ReleaseBackend};
use crate::error::{BackendError, BackendResult};
use crate::release::{
    GetHistoryResponse, GetReleaseContentResponse, GetReleaseStatusResponse, ListReleasesResponse,
    ReleaseResponse, UninstallReleaseResponse,
};
use crate::storage::MemoryDriver;

/// Wraps a [`LocalBackend`] over memory, records every call, and can be
/// scripted to fail history probes or to report no release object
pub(crate) struct ScriptedBackend {
    inner: LocalBackend<MemoryDriver>,
    calls: Mutex<Vec<String>>,
    history_failure: Option<fn(&str) -> BackendError>,
    empty_responses: bool,
    last_list: Mutex<Option<ListOptions>>,
    last_install: Mutex<Option<InstallOptions>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            inner: LocalBackend::new(MemoryDriver::new()),
            calls: Mutex::default(),
            history_failure: None,
            empty_responses: false,
            last_list: Mutex::default(),
            last_install: Mutex::default(),
        }
    }

    /// Make every `release_history` call fail with the given error
    pub fn failing_history(mut self, failure: fn(&str) -> BackendError) -> Self {
        self.history_failure = Some(failure);
        self
    }

    /// Mutating operations report success without a release object
    pub fn with_empty_responses(mut self) -> Self {
        self.empty_responses = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_list(&self) -> Option<ListOptions> {
        self.last_list.lock().unwrap().clone()
    }

    pub fn last_install(&self) -> Option<InstallOptions> {
        self.last_install.lock().unwrap().clone()
    }

    pub fn local(&self) -> &LocalBackend<MemoryDriver> {
        &self.inner
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn maybe_empty(&self, res: ReleaseResponse) -> ReleaseResponse {
        if self.empty_responses {
            ReleaseResponse::default()
        } else {
            res
        }
    }
}

#[async_trait]
impl ReleaseBackend for ScriptedBackend {
    async fn list_releases(&self, opts: ListOptions) -> BackendResult<ListReleasesResponse> {
        self.record("list");
        *self.last_list.lock().unwrap() = Some(opts.clone());
        self.inner.list_releases(opts).await
    }

    async fn release_history(&self, name: &str, max: u32) -> BackendResult<GetHistoryResponse> {
        self.record(format!("history {} {}", name, max));
        if let Some(failure) = self.history_failure {
            return Err(failure(name));
        }
        self.inner.release_history(name, max).await
    }

    async fn release_status(
        &self,
        name: &str,
        version: u32,
    ) -> BackendResult<GetReleaseStatusResponse> {
        self.record(format!("status {} {}", name, version));
        self.inner.release_status(name, version).await
    }

    async fn release_content(
        &self,
        name: &str,
        version: u32,
    ) -> BackendResult<GetReleaseContentResponse> {
        self.record(format!("content {} {}", name, version));
        self.inner.release_content(name, version).await
    }

    async fn install_release_from_chart(
        &self,
        chart: &Chart,
        opts: InstallOptions,
    ) -> BackendResult<ReleaseResponse> {
        self.record(format!("install {}", opts.name));
        *self.last_install.lock().unwrap() = Some(opts.clone());
        let res = self.inner.install_release_from_chart(chart, opts).await?;
        Ok(self.maybe_empty(res))
    }

    async fn update_release(
        &self,
        name: &str,
        chart: &Chart,
        opts: UpdateOptions,
    ) -> BackendResult<ReleaseResponse> {
        self.record(format!("update {}", name));
        let res = self.inner.update_release(name, chart, opts).await?;
        Ok(self.maybe_empty(res))
    }

    async fn rollback_release(
        &self,
        name: &str,
        opts: RollbackOptions,
    ) -> BackendResult<ReleaseResponse> {
        self.record(format!("rollback {} {}", name, opts.version));
        let res = self.inner.rollback_release(name, opts).await?;
        Ok(self.maybe_empty(res))
    }

    async fn delete_release(
        &self,
        name: &str,
        opts: DeleteOptions,
    ) -> BackendResult<UninstallReleaseResponse> {
        self.record(format!("delete {}", name));
        self.inner.delete_release(name, opts).await
    }
}

/// Write a minimal chart directory and return its path
pub(crate) fn write_chart(dir: &std::path::Path, name: &str, version: &str) -> std::path::PathBuf {
    let chart = dir.join(name);
    std::fs::create_dir_all(chart.join("templates")).unwrap();
    std::fs::write(
        chart.join("Chart.yaml"),
        format!("apiVersion: v1\nname: {}\nversion: {}\n", name, version),
    )
    .unwrap();
    std::fs::write(chart.join("values.yaml"), "replicas: 1\n").unwrap();
    chart
}
