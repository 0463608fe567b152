//! HTTP handlers for the `/api/v1` surface

use axum::Json;
use axum::extract::{Path, Query, State};
use rudder_core::{
    DeleteReleaseRequest, GetReleaseRequest, InstallReleaseRequest, ListChartRequest,
    ListReleaseRequest, UpdateReleaseRequest,
};
use rudder_release::{
    GetHistoryResponse, GetReleaseContentResponse, GetReleaseResponse, GetReleaseStatusResponse,
    ListReleasesResponse, ReleaseBackend, UninstallReleaseResponse,
};
use rudder_repo::{RepositoryEntry, SearchResult};
use serde::Serialize;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn list_repos<B: ReleaseBackend + 'static>(
    State(state): State<AppState<B>>,
) -> ApiResult<Json<Vec<RepositoryEntry>>> {
    let file = rudder_repo::list_repositories(&state.config.home_dir())?;
    Ok(Json(file.repositories))
}

pub async fn list_charts<B: ReleaseBackend + 'static>(
    State(state): State<AppState<B>>,
    Query(req): Query<ListChartRequest>,
) -> ApiResult<Json<Vec<SearchResult>>> {
    let charts = rudder_repo::list_charts(&state.config.home_dir(), &req)?;
    Ok(Json(charts))
}

pub async fn list_releases<B: ReleaseBackend + 'static>(
    State(state): State<AppState<B>>,
    Query(req): Query<ListReleaseRequest>,
) -> ApiResult<Json<Option<ListReleasesResponse>>> {
    Ok(Json(state.query.list_releases(req).await?))
}

pub async fn get_release<B: ReleaseBackend + 'static>(
    State(state): State<AppState<B>>,
    Path(name): Path<String>,
    Query(mut req): Query<GetReleaseRequest>,
) -> ApiResult<Json<GetReleaseResponse>> {
    req.name = name;
    Ok(Json(state.query.get_release(req).await?))
}

pub async fn get_release_history<B: ReleaseBackend + 'static>(
    State(state): State<AppState<B>>,
    Path(name): Path<String>,
    Query(mut req): Query<GetReleaseRequest>,
) -> ApiResult<Json<GetHistoryResponse>> {
    req.name = name;
    Ok(Json(state.query.get_release_history(req).await?))
}

pub async fn get_release_status<B: ReleaseBackend + 'static>(
    State(state): State<AppState<B>>,
    Path(name): Path<String>,
    Query(mut req): Query<GetReleaseRequest>,
) -> ApiResult<Json<GetReleaseStatusResponse>> {
    req.name = name;
    Ok(Json(state.query.get_release_status(req).await?))
}

pub async fn get_release_content<B: ReleaseBackend + 'static>(
    State(state): State<AppState<B>>,
    Path(name): Path<String>,
    Query(mut req): Query<GetReleaseRequest>,
) -> ApiResult<Json<GetReleaseContentResponse>> {
    req.name = name;
    Ok(Json(state.query.get_release_content(req).await?))
}

pub async fn install_release<B: ReleaseBackend + 'static>(
    State(state): State<AppState<B>>,
    Json(mut req): Json<InstallReleaseRequest>,
) -> ApiResult<Json<Option<GetReleaseStatusResponse>>> {
    if req.keyring.is_empty() {
        req.keyring = state.keyring();
    }
    let ctx = state.resolve_context();
    Ok(Json(state.manager.install_release(&ctx, req).await?))
}

/// Upgrade or roll back; the release named in the path wins over the body
pub async fn update_release<B: ReleaseBackend + 'static>(
    State(state): State<AppState<B>>,
    Path(name): Path<String>,
    Json(mut req): Json<UpdateReleaseRequest>,
) -> ApiResult<Json<Option<GetReleaseStatusResponse>>> {
    req.release = name;
    if req.keyring.is_empty() {
        req.keyring = state.keyring();
    }
    let ctx = state.resolve_context();
    Ok(Json(state.manager.update_release(&ctx, req).await?))
}

pub async fn delete_release<B: ReleaseBackend + 'static>(
    State(state): State<AppState<B>>,
    Path(name): Path<String>,
    Query(mut req): Query<DeleteReleaseRequest>,
) -> ApiResult<Json<UninstallReleaseResponse>> {
    req.name = name;
    Ok(Json(state.manager.delete_release(req).await?))
}
