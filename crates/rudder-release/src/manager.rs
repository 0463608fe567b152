//! Release lifecycle: install, upgrade, rollback and delete
//!
//! Every mutating operation follows the same shape:
//!
//! 1. apply request defaults and check required fields
//! 2. resolve the chart reference to a local path and load it
//! 3. validate the chart's requirements against its bundled sub-charts
//! 4. call the backend
//! 5. re-query the backend for the release status
//!
//! Steps 2 and 3 run before any backend mutation, so a bad chart never
//! leaves partial state behind at this layer.

use rudder_core::{
    Chart, DeleteReleaseRequest, InstallReleaseRequest, UpdateReleaseRequest, validate_chart,
};
use rudder_engine::NameGenerator;
use rudder_repo::{ChartReference, ChartResolver, ResolveContext};
use std::path::PathBuf;
use std::sync::Arc;

use crate::actions::{DeleteOptions, InstallOptions, RollbackOptions, UpdateOptions};
use crate::backend::ReleaseBackend;
use crate::error::{BackendErrorKind, ReleaseError, Result};
use crate::release::{GetReleaseStatusResponse, ReleaseResponse, UninstallReleaseResponse};

/// Drives release mutations through a [`ReleaseBackend`]
pub struct ReleaseLifecycleManager<B> {
    backend: Arc<B>,
    names: NameGenerator,
}

impl<B: ReleaseBackend> ReleaseLifecycleManager<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            names: NameGenerator::new(),
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Install a chart as a new release
    ///
    /// Returns `None` when the backend reports no release object.
    pub async fn install_release(
        &self,
        ctx: &ResolveContext,
        mut req: InstallReleaseRequest,
    ) -> Result<Option<GetReleaseStatusResponse>> {
        tracing::info!(chart = %req.chart, name = %req.name, "install release");
        req.apply_defaults();

        if req.chart.trim().is_empty() {
            return Err(ReleaseError::validation("'install release' requires a chart name"));
        }

        let chart = self
            .load_chart(ctx, &req.chart, &req.version, req.verify, &req.keyring)
            .await?;

        if req.name.is_empty() && !req.name_template.is_empty() {
            req.name = self.names.generate(&req.name_template)?;
            tracing::info!(name = %req.name, template = %req.name_template, "generated release name from template");
        }

        let res = self
            .backend
            .install_release_from_chart(&chart, InstallOptions::from(&req))
            .await?;

        tracing::info!(name = %req.name, "install release succeeded");
        self.status_of(res, req.dry_run).await
    }

    /// Route an update request to rollback or upgrade
    pub async fn update_release(
        &self,
        ctx: &ResolveContext,
        req: UpdateReleaseRequest,
    ) -> Result<Option<GetReleaseStatusResponse>> {
        if req.rollback {
            self.rollback_release(req).await
        } else {
            self.upgrade_release(ctx, req).await
        }
    }

    /// Upgrade an existing release to a new chart
    ///
    /// With `install` set, a release the backend does not know is installed
    /// instead. Only a typed not-found from the history probe triggers that;
    /// any other probe failure is logged and the upgrade goes ahead.
    pub async fn upgrade_release(
        &self,
        ctx: &ResolveContext,
        mut req: UpdateReleaseRequest,
    ) -> Result<Option<GetReleaseStatusResponse>> {
        tracing::info!(release = %req.release, chart = %req.chart, "upgrade release");
        req.apply_upgrade_defaults();

        if req.release.is_empty() || req.chart.is_empty() {
            return Err(ReleaseError::validation(
                "'upgrade release' requires a release name and a chart name",
            ));
        }

        if req.install {
            match self.backend.release_history(&req.release, 1).await {
                Err(e) if e.kind() == BackendErrorKind::ReleaseNotFound => {
                    tracing::info!(release = %req.release, "release does not exist, installing it now");
                    return self.install_release(ctx, req.to_install_request()).await;
                }
                Err(e) => {
                    tracing::warn!(release = %req.release, error = %e, "history probe failed, continuing with upgrade");
                }
                Ok(_) => {}
            }
        }

        let chart = self
            .load_chart(ctx, &req.chart, &req.version, req.verify, &req.keyring)
            .await?;

        let res = self
            .backend
            .update_release(&req.release, &chart, UpdateOptions::from(&req))
            .await
            .map_err(ReleaseError::upgrade_failed)?;

        tracing::info!(release = %req.release, "upgrade release succeeded");
        self.status_of(res, req.dry_run).await
    }

    /// Roll a release back to an earlier revision
    pub async fn rollback_release(
        &self,
        mut req: UpdateReleaseRequest,
    ) -> Result<Option<GetReleaseStatusResponse>> {
        tracing::info!(release = %req.release, revision = req.revision, "rollback release");
        req.apply_rollback_defaults();

        if req.release.is_empty() {
            return Err(ReleaseError::validation("'rollback release' requires a release name"));
        }

        let res = self
            .backend
            .rollback_release(&req.release, RollbackOptions::from(&req))
            .await?;

        tracing::info!(release = %req.release, "rollback release succeeded");
        self.status_of(res, req.dry_run).await
    }

    /// Delete a release; the backend's uninstall result is returned as is
    pub async fn delete_release(&self, req: DeleteReleaseRequest) -> Result<UninstallReleaseResponse> {
        tracing::info!(name = %req.name, purge = req.purge, "delete release");

        if req.name.is_empty() {
            return Err(ReleaseError::validation("'delete release' requires a release name"));
        }

        let res = self
            .backend
            .delete_release(&req.name, DeleteOptions::from(&req))
            .await?;

        tracing::info!(name = %req.name, "delete release succeeded");
        Ok(res)
    }

    /// Resolve, load and validate a chart
    async fn load_chart(
        &self,
        ctx: &ResolveContext,
        name: &str,
        version: &str,
        verify: bool,
        keyring: &str,
    ) -> Result<Chart> {
        let reference = ChartReference {
            name: name.to_string(),
            version: version.to_string(),
            verify,
            keyring: PathBuf::from(keyring),
        };
        let resolved = ChartResolver::new(ctx).resolve(&reference).await?;
        tracing::info!(path = %resolved.path.display(), "chart path");

        let chart = Chart::load(&resolved.path)?;
        validate_chart(&chart)?;
        Ok(chart)
    }

    /// Current status of the release a mutation produced
    ///
    /// Dry runs store nothing, so their status comes from the returned
    /// release instead of a backend query.
    async fn status_of(
        &self,
        res: ReleaseResponse,
        dry_run: bool,
    ) -> Result<Option<GetReleaseStatusResponse>> {
        let Some(release) = res.release else {
            return Ok(None);
        };

        if dry_run {
            return Ok(Some(GetReleaseStatusResponse::from(&release)));
        }

        let status = self.backend.release_status(&release.name, 0).await?;
        Ok(Some(status))
    }
}
