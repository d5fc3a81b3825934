//! RBAC 管理后台
//! 用户、角色、权限及其关联关系的管理服务

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod query;
pub mod repository;
pub mod routes;
pub mod services;
pub mod store;
pub mod telemetry;
