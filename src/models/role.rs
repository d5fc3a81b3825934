//! Role domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::query::{FilterValue, Filterable};

/// 角色
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    pub id: i32,
    pub name: String,
    pub message: Option<String>,
    /// 已分配用户数（冗余计数，由关联服务维护）
    pub user_count: i32,
    pub updated_at: DateTime<Utc>,
}

/// 创建角色请求
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRoleRequest {
    #[validate(length(min = 1, max = 255, message = "'name' is required"))]
    pub name: String,
    pub message: Option<String>,
}

/// 更新角色请求
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateRoleRequest {
    #[validate(length(min = 1, max = 255, message = "'name' is required"))]
    pub name: String,
    pub message: Option<String>,
}

/// 角色列表查询参数
#[derive(Debug, Default, Deserialize)]
pub struct RoleListParams {
    pub page: Option<i64>,
    pub name: Option<String>,
}

/// 批量分配用户到角色
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AssignUsersRequest {
    #[serde(default, deserialize_with = "super::int_list")]
    #[validate(length(
        min = 1,
        message = "Invalid input. 'users' must be a non-empty array and 'role_id' is required."
    ))]
    pub users: Vec<i32>,
    #[serde(default, deserialize_with = "super::optional_int")]
    pub role_id: Option<i32>,
}

/// 将用户移出角色
#[derive(Debug, Clone, Deserialize)]
pub struct UnassignUserRequest {
    #[serde(default, deserialize_with = "super::optional_int")]
    pub user_id: Option<i32>,
    #[serde(default, deserialize_with = "super::optional_int")]
    pub role_id: Option<i32>,
}

impl Filterable for Role {
    fn column_value(&self, column: &str) -> Option<FilterValue> {
        match column {
            "id" => Some(FilterValue::Int(self.id)),
            "name" => Some(FilterValue::Text(self.name.clone())),
            "message" => self.message.clone().map(FilterValue::Text),
            "user_count" => Some(FilterValue::Int(self.user_count)),
            _ => None,
        }
    }
}
