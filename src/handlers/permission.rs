//! 权限管理的 HTTP 处理器

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::{found, non_empty, JsonBody},
    middleware::AppState,
    models::permission::*,
    query::{Filter, ListQuery, PageRequest, Paginated},
};

/// 分页列出权限，支持按名称过滤
pub async fn list_permissions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PermissionListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = PageRequest::new(params.page, state.page_size());
    let query = ListQuery::new(page)
        .filter(non_empty(params.name).map(|name| Filter::contains("name", name)));

    let rows = state.store.list_permissions(&query).await?;

    Ok(Json(Paginated::new(rows, &page)))
}

/// 列出全部权限（不分页）
pub async fn list_all_permissions(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.store.all_permissions().await?))
}

pub async fn create_permission(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<PermissionRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let permission = state.store.create_permission(&req).await?;
    tracing::info!(permission_id = permission.id, name = %permission.name, "Permission created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Permission created successfully",
            "permission": permission
        })),
    ))
}

pub async fn get_permission(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let permission = found(state.store.find_permission(id).await?, "permission")?;
    Ok(Json(permission))
}

pub async fn update_permission(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    JsonBody(req): JsonBody<PermissionRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let permission = found(state.store.update_permission(id, &req).await?, "permission")?;

    Ok(Json(json!({
        "message": "Permission updated successfully",
        "permission": permission
    })))
}

/// 删除权限；仍被角色引用时返回 Conflict
pub async fn delete_permission(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    if !state.store.delete_permission(id).await? {
        return Err(AppError::not_found("permission"));
    }

    tracing::info!(permission_id = id, "Permission deleted");
    Ok(Json(json!({
        "message": "Permission deleted successfully"
    })))
}

/// 角色的原始授权记录
pub async fn permissions_in_role(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RoleIdQuery>,
) -> Result<impl IntoResponse, AppError> {
    let role_id = params
        .role_id
        .ok_or_else(|| AppError::validation("'role_id' is required."))?;

    Ok(Json(state.store.grants_for_role(role_id).await?))
}
