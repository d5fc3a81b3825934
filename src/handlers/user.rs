//! 用户管理的 HTTP 处理器

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
    models::user::*,
    query::{Filter, FilterValue, ListQuery, PageRequest, Paginated},
};

/// 解析状态过滤条件："1"/"true" 为启用，"0"/"false" 为禁用
fn parse_status_filter(raw: &str) -> Result<bool, AppError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(AppError::Validation(format!(
            "Invalid status filter: {}. Must be 0, 1, true or false",
            raw
        ))),
    }
}

/// 分页列出用户，支持按状态与邮箱过滤
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserListParams>,
) -> Result<impl IntoResponse, AppError> {
    let status = non_empty(params.status)
        .map(|raw| parse_status_filter(&raw))
        .transpose()?;

    let page = PageRequest::new(params.page, state.page_size());
    let query = ListQuery::new(page)
        .filter(status.map(|s| Filter::eq("status", FilterValue::Bool(s))))
        .filter(non_empty(params.email).map(|email| Filter::contains("email", email)));

    let rows = state.store.list_users(&query).await?;

    Ok(Json(Paginated::new(rows, &page)))
}

/// 创建用户
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let user = state.store.create_user(&req).await?;
    tracing::info!(user_id = user.user_id, "User created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully",
            "user": user
        })),
    ))
}

/// 获取用户详情
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let user = found(state.store.find_user(id).await?, "user")?;
    Ok(Json(user))
}

/// 更新用户基本信息（角色只能通过分配接口修改）
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    JsonBody(req): JsonBody<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let user = found(state.store.update_user(id, &req).await?, "user")?;

    Ok(Json(json!({
        "message": "User updated successfully",
        "user": user
    })))
}

/// 启用/禁用用户
pub async fn change_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    JsonBody(req): JsonBody<ChangeStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !state.store.set_user_status(id, req.status).await? {
        return Err(AppError::not_found("user"));
    }

    Ok(Json(json!({
        "message": "User status updated successfully"
    })))
}

/// 删除用户
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    state.association_service.delete_user(id).await?;

    Ok(Json(json!({
        "message": "User deleted successfully"
    })))
}
