//! User domain models

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::query::{FilterValue, Filterable};

/// 用户
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub user_id: i32,
    pub username: String,
    pub email: String,
    pub status: bool,
    /// 当前所属角色，只能通过角色分配接口修改
    pub role: Option<i32>,
}

fn default_status() -> bool {
    true
}

/// 创建用户请求
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 255, message = "'name' is required"))]
    pub name: String,
    #[validate(email(message = "'email' must be a valid email address"))]
    pub email: String,
    #[serde(default = "default_status")]
    pub status: bool,
}

/// 更新用户请求
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 255, message = "'name' is required"))]
    pub name: String,
    #[validate(email(message = "'email' must be a valid email address"))]
    pub email: String,
    pub status: bool,
}

/// 修改用户状态请求
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: bool,
}

/// 用户列表查询参数
#[derive(Debug, Default, Deserialize)]
pub struct UserListParams {
    pub page: Option<i64>,
    /// "1"/"true" 为启用，"0"/"false" 为禁用
    pub status: Option<String>,
    pub email: Option<String>,
}

/// 候选用户（不在指定角色中的用户）查询参数
#[derive(Debug, Default, Deserialize)]
pub struct CandidateParams {
    pub email: Option<String>,
}

impl Filterable for User {
    fn column_value(&self, column: &str) -> Option<FilterValue> {
        match column {
            "user_id" => Some(FilterValue::Int(self.user_id)),
            "username" => Some(FilterValue::Text(self.username.clone())),
            "email" => Some(FilterValue::Text(self.email.clone())),
            "status" => Some(FilterValue::Bool(self.status)),
            "role" => self.role.map(FilterValue::Int),
            _ => None,
        }
    }
}
