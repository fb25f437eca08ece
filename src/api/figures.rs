use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_cookies::Cookies;

use super::ApiResponse;
use crate::auth::current_user;
use crate::search::{FigureFilter, FigureSummary, SearchError};
use crate::state::AppState;

type ApiResult = Result<Json<ApiResponse<Vec<FigureSummary>>>, (StatusCode, Json<Value>)>;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct FilterParams {
    pub manufacturer: Option<String>,
    pub name: Option<String>,
    pub scale: Option<String>,
    pub location: Option<String>,
    pub box_number: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

fn error_response(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    let mut body = ApiResponse::<()>::error(message);
    body.code = status.as_u16() as i32;
    (status, Json(json!(body)))
}

/// Malformed query string (e.g. `limit=-1`) / 查询参数格式错误
fn bad_query(rejection: QueryRejection) -> (StatusCode, Json<Value>) {
    let message = rejection.body_text();
    tracing::warn!("Figure search query rejected: {}", message);
    error_response(rejection.status(), &message)
}

fn search_error(e: SearchError) -> (StatusCode, Json<Value>) {
    let (status, message) = match &e {
        SearchError::InvalidIdentifier(_) => (StatusCode::BAD_REQUEST, e.to_string()),
        SearchError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "服务器错误".to_string()),
        SearchError::Index(_) | SearchError::Projection(_) => (StatusCode::BAD_GATEWAY, "搜索服务暂不可用".to_string()),
    };
    if status.is_server_error() {
        tracing::error!("Figure search failed: {}", e);
    } else {
        tracing::warn!("Figure search rejected: {}", e);
    }

    error_response(status, &message)
}

/// GET /api/figures/autocomplete - 联想搜索
pub async fn autocomplete(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult {
    let user = current_user(&state.db, &cookies).await?;
    let Query(params) = params.map_err(bad_query)?;
    let hits = state.search
        .autocomplete(&params.q, &user.id, params.limit)
        .await
        .map_err(search_error)?;
    Ok(Json(ApiResponse::success(hits)))
}

/// GET /api/figures/partial - 子串搜索（分页）
pub async fn partial(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult {
    let user = current_user(&state.db, &cookies).await?;
    let Query(params) = params.map_err(bad_query)?;
    let hits = state.search
        .partial(&params.q, &user.id, params.limit, params.offset)
        .await
        .map_err(search_error)?;
    Ok(Json(ApiResponse::success(hits)))
}

/// GET /api/figures/search - 多字段搜索
pub async fn search(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult {
    let user = current_user(&state.db, &cookies).await?;
    let Query(params) = params.map_err(bad_query)?;
    let hits = state.search
        .search(&params.q, &user.id)
        .await
        .map_err(search_error)?;
    Ok(Json(ApiResponse::success(hits)))
}

/// GET /api/figures/filter - 按字段过滤
pub async fn filter(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    params: Result<Query<FilterParams>, QueryRejection>,
) -> ApiResult {
    let user = current_user(&state.db, &cookies).await?;
    let Query(params) = params.map_err(bad_query)?;
    let filter = FigureFilter {
        manufacturer: params.manufacturer,
        name: params.name,
        scale: params.scale,
        location: params.location,
        box_number: params.box_number,
    };
    let hits = state.search
        .filter(&filter, &user.id, params.limit, params.offset)
        .await
        .map_err(search_error)?;
    Ok(Json(ApiResponse::success(hits)))
}
