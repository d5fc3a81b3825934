//! 角色管理的 HTTP 处理器

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
    models::{role::*, user::CandidateParams},
    query::{Filter, ListQuery, PageRequest, Paginated},
};

/// 分页列出角色，支持按名称过滤
pub async fn list_roles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RoleListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = PageRequest::new(params.page, state.page_size());
    let query = ListQuery::new(page)
        .filter(non_empty(params.name).map(|name| Filter::contains("name", name)));

    let rows = state.store.list_roles(&query).await?;

    Ok(Json(Paginated::new(rows, &page)))
}

/// 列出全部角色（不分页）
pub async fn list_all_roles(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.store.all_roles().await?))
}

pub async fn create_role(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<CreateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let role = state.store.create_role(&req).await?;
    tracing::info!(role_id = role.id, name = %role.name, "Role created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Role created successfully",
            "id": role.id
        })),
    ))
}

pub async fn get_role(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let role = found(state.store.find_role(id).await?, "role")?;
    Ok(Json(role))
}

pub async fn update_role(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    JsonBody(req): JsonBody<UpdateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let role = found(state.store.update_role(id, &req).await?, "role")?;

    Ok(Json(json!({
        "message": "Role updated successfully",
        "role": role
    })))
}

/// 删除角色；仍有授权时返回 Conflict
pub async fn delete_role(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    if !state.store.delete_role(id).await? {
        return Err(AppError::not_found("role"));
    }

    tracing::info!(role_id = id, "Role deleted");
    Ok(Json(json!({
        "message": "Role deleted successfully"
    })))
}

/// 角色下的用户
pub async fn role_users(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.store.users_in_role(id).await?))
}

/// 不在该角色中的用户，可按邮箱过滤
pub async fn role_candidates(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Query(params): Query<CandidateParams>,
) -> Result<impl IntoResponse, AppError> {
    let email = non_empty(params.email);
    Ok(Json(state.store.users_outside_role(id, email.as_deref()).await?))
}

/// 全部权限及其在该角色下的授权状态
pub async fn role_permissions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.store.permissions_for_role(id).await?))
}
