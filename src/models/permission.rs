//! Permission and grant models

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;
use crate::query::{FilterValue, Filterable};

/// 权限
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Permission {
    pub id: i32,
    pub name: String,
    pub about: Option<String>,
}

impl Filterable for Permission {
    fn column_value(&self, column: &str) -> Option<FilterValue> {
        match column {
            "id" => Some(FilterValue::Int(self.id)),
            "name" => Some(FilterValue::Text(self.name.clone())),
            "about" => self.about.clone().map(FilterValue::Text),
            _ => None,
        }
    }
}

/// 带授权标记的权限（status = 1 表示已授予该角色）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct PermissionStatus {
    pub id: i32,
    pub name: String,
    pub about: Option<String>,
    pub status: i32,
}

/// 角色-权限授权记录
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, sqlx::FromRow)]
pub struct RolePermission {
    pub role_id: i32,
    pub permission_id: i32,
}

/// 创建/更新权限请求
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PermissionRequest {
    #[validate(length(min = 1, max = 255, message = "'name' is required"))]
    pub name: String,
    pub about: Option<String>,
}

/// 权限列表查询参数
#[derive(Debug, Default, Deserialize)]
pub struct PermissionListParams {
    pub page: Option<i64>,
    pub name: Option<String>,
}

/// 以 role_id 为查询参数的接口
#[derive(Debug, Default, Deserialize)]
pub struct RoleIdQuery {
    pub role_id: Option<i32>,
}

/// 授予/撤销权限请求，action: 1 授予，0 撤销
#[derive(Debug, Clone, Deserialize)]
pub struct PermissionActionRequest {
    #[serde(default, deserialize_with = "super::optional_int")]
    pub role_id: Option<i32>,
    #[serde(default, deserialize_with = "super::optional_int")]
    pub permission_id: Option<i32>,
    #[serde(default, deserialize_with = "super::optional_int")]
    pub action: Option<i64>,
}

/// 权限操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionAction {
    Grant,
    Revoke,
}

impl PermissionAction {
    pub fn is_grant(self) -> bool {
        matches!(self, PermissionAction::Grant)
    }
}

impl TryFrom<i64> for PermissionAction {
    type Error = AppError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(PermissionAction::Grant),
            0 => Ok(PermissionAction::Revoke),
            other => Err(AppError::Validation(format!(
                "Invalid action: {}. Must be 1 (assign) or 0 (unassign)",
                other
            ))),
        }
    }
}
