//! HTTP 处理器模块

pub mod association;
pub mod health;
pub mod permission;
pub mod role;
pub mod user;

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};

use crate::error::AppError;

/// JSON 请求体提取器
/// 解析失败（语法错误、字段类型不符、缺少 content-type）按 Validation 返回统一错误体
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(JsonBody(value))
    }
}

/// 空字符串的查询参数视为未提供
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 资源不存在时统一返回 404
pub(crate) fn found<T>(value: Option<T>, resource: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::not_found(resource))
}
