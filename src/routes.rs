//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
};

use crate::{handlers, middleware::AppState};

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公开端点（健康检查）
    let probe_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check));

    // 关联操作（涉及多表一致性）
    let association_routes = Router::new()
        .route(
            "/assign-users-to-role",
            post(handlers::association::assign_users_to_role),
        )
        .route(
            "/unassign-user-role",
            post(handlers::association::unassign_user_role),
        )
        .route(
            "/permission-actions",
            post(handlers::association::permission_actions),
        );

    let user_routes = Router::new()
        .route(
            "/users",
            get(handlers::user::list_users).post(handlers::user::create_user),
        )
        .route(
            "/users/{id}",
            get(handlers::user::get_user)
                .put(handlers::user::update_user)
                .delete(handlers::user::delete_user),
        )
        .route("/users/{id}/status", post(handlers::user::change_status));

    let role_routes = Router::new()
        .route(
            "/roles",
            get(handlers::role::list_roles).post(handlers::role::create_role),
        )
        .route("/roles/all", get(handlers::role::list_all_roles))
        .route(
            "/roles/{id}",
            get(handlers::role::get_role)
                .put(handlers::role::update_role)
                .delete(handlers::role::delete_role),
        )
        .route("/roles/{id}/users", get(handlers::role::role_users))
        .route("/roles/{id}/candidates", get(handlers::role::role_candidates))
        .route("/roles/{id}/permissions", get(handlers::role::role_permissions));

    let permission_routes = Router::new()
        .route(
            "/permissions",
            get(handlers::permission::list_permissions)
                .post(handlers::permission::create_permission),
        )
        .route(
            "/permissions/all",
            get(handlers::permission::list_all_permissions),
        )
        .route(
            "/permissions/{id}",
            get(handlers::permission::get_permission)
                .put(handlers::permission::update_permission)
                .delete(handlers::permission::delete_permission),
        )
        .route(
            "/permissions-in-role",
            get(handlers::permission::permissions_in_role),
        );

    let cors = if state.config.server.cors_allow_any_origin {
        CorsLayer::permissive()
    } else {
        CorsLayer::new().allow_methods(Any).allow_headers(Any)
    };

    // 组合所有路由
    Router::new()
        .merge(probe_routes)
        .merge(association_routes)
        .merge(user_routes)
        .merge(role_routes)
        .merge(permission_routes)
        .layer(RequestBodyLimitLayer::new(state.config.server.body_limit_bytes))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(axum::middleware::from_fn(crate::middleware::request_tracking_middleware))
        .with_state(state)
}
