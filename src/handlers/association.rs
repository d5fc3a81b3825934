//! 角色分配与权限授权的 HTTP 处理器

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::JsonBody,
    middleware::AppState,
    models::{
        permission::{PermissionAction, PermissionActionRequest},
        role::{AssignUsersRequest, UnassignUserRequest},
    },
};

/// 批量分配用户到角色
pub async fn assign_users_to_role(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<AssignUsersRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    // 缺失的 role_id 交给服务层按非法输入拒绝
    let updated_rows = state
        .association_service
        .assign_users_to_role(&req.users, req.role_id.unwrap_or(0))
        .await?;

    Ok(Json(json!({
        "message": "Role assigned successfully and user count updated",
        "updatedRows": updated_rows
    })))
}

/// 将用户移出角色
pub async fn unassign_user_role(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<UnassignUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .association_service
        .unassign_user_from_role(req.user_id.unwrap_or(0), req.role_id.unwrap_or(0))
        .await?;

    Ok(Json(json!({
        "message": "User unassigned successfully and user count updated"
    })))
}

/// 授予或撤销角色权限，action: 1 授予，0 撤销
pub async fn permission_actions(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<PermissionActionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(role_id), Some(permission_id), Some(code)) =
        (req.role_id, req.permission_id, req.action)
    else {
        return Err(AppError::validation(
            "'role_id', 'permission_id' and 'action' are required.",
        ));
    };

    let action = PermissionAction::try_from(code)?;

    state
        .association_service
        .set_role_permission(role_id, permission_id, action)
        .await?;

    let message = if action.is_grant() {
        "Permission assigned successfully"
    } else {
        "Permission unassigned successfully"
    };

    Ok(Json(json!({ "message": message })))
}
