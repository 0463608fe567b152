//! Read-only release queries

use rudder_core::{GetReleaseRequest, ListReleaseRequest};
use std::sync::Arc;

use crate::actions::ListOptions;
use crate::backend::ReleaseBackend;
use crate::error::{ReleaseError, Result};
use crate::release::{
    GetHistoryResponse, GetReleaseContentResponse, GetReleaseResponse, GetReleaseStatusResponse,
    ListReleasesResponse,
};

/// Answers list and get queries against a [`ReleaseBackend`]
pub struct ReleaseQueryService<B> {
    backend: Arc<B>,
}

/// Negative revisions select the latest, like zero
fn revision(revision: i32) -> u32 {
    u32::try_from(revision).unwrap_or(0)
}

impl<B: ReleaseBackend> ReleaseQueryService<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// List releases; `None` when nothing matches
    pub async fn list_releases(
        &self,
        mut req: ListReleaseRequest,
    ) -> Result<Option<ListReleasesResponse>> {
        req.apply_defaults();
        let opts = ListOptions::from(&req);
        tracing::debug!(?opts, "list releases");

        let res = self.backend.list_releases(opts).await?;
        if res.releases.is_empty() {
            return Ok(None);
        }
        Ok(Some(res))
    }

    /// History, status and content of one release in a single response
    pub async fn get_release(&self, mut req: GetReleaseRequest) -> Result<GetReleaseResponse> {
        require_name(&req)?;
        req.apply_defaults();
        tracing::info!(name = %req.name, revision = req.revision, "get release");

        let history = self.history(&req).await?;
        let status = self.status(&req).await?;
        let content = self.content(&req).await?;

        Ok(GetReleaseResponse {
            history,
            status,
            content,
        })
    }

    pub async fn get_release_history(&self, mut req: GetReleaseRequest) -> Result<GetHistoryResponse> {
        require_name(&req)?;
        req.apply_defaults();
        self.history(&req).await
    }

    pub async fn get_release_status(
        &self,
        mut req: GetReleaseRequest,
    ) -> Result<GetReleaseStatusResponse> {
        require_name(&req)?;
        req.apply_defaults();
        self.status(&req).await
    }

    pub async fn get_release_content(
        &self,
        mut req: GetReleaseRequest,
    ) -> Result<GetReleaseContentResponse> {
        require_name(&req)?;
        req.apply_defaults();
        self.content(&req).await
    }

    async fn history(&self, req: &GetReleaseRequest) -> Result<GetHistoryResponse> {
        Ok(self.backend.release_history(&req.name, revision(req.max)).await?)
    }

    async fn status(&self, req: &GetReleaseRequest) -> Result<GetReleaseStatusResponse> {
        Ok(self.backend.release_status(&req.name, revision(req.revision)).await?)
    }

    async fn content(&self, req: &GetReleaseRequest) -> Result<GetReleaseContentResponse> {
        Ok(self.backend.release_content(&req.name, revision(req.revision)).await?)
    }
}

fn require_name(req: &GetReleaseRequest) -> Result<()> {
    if req.name.is_empty() {
        return Err(ReleaseError::validation("release name is required"));
    }
    Ok(())
}
