//! HTTP API 集成测试（内存存储，无需数据库）

use axum::http::{Method, StatusCode};
use serde_json::json;

mod common;
use common::{create_test_permission, create_test_role, create_test_users, memory_app, send, user_count};
use rbac_admin::store::RbacStore;

#[tokio::test]
async fn test_health_endpoint() {
    let (_, app) = memory_app();

    let (status, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
    assert!(body["uptime_secs"].is_number());
}

#[tokio::test]
async fn test_readiness_endpoint() {
    let (_, app) = memory_app();

    let (status, body) = send(&app, Method::GET, "/ready", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);
    assert_eq!(body["checks"][0]["name"], "memory");
}

#[tokio::test]
async fn test_assign_users_to_role() {
    let (store, app) = memory_app();
    let role = create_test_role(&*store, "ops").await;
    let users = create_test_users(&*store, "u", 3).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/assign-users-to-role",
        Some(json!({ "users": users, "role_id": role.id })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Role assigned successfully and user count updated");
    assert_eq!(body["updatedRows"], 3);
    assert_eq!(user_count(&*store, role.id).await, 3);
}

#[tokio::test]
async fn test_assign_rejects_empty_or_missing_fields() {
    let (store, app) = memory_app();
    let role = create_test_role(&*store, "ops").await;

    for payload in [
        json!({ "users": [], "role_id": role.id }),
        json!({ "role_id": role.id }),
        json!({ "users": [1, 2] }),
    ] {
        let (status, body) = send(&app, Method::POST, "/assign-users-to-role", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"]["message"],
            "Invalid input. 'users' must be a non-empty array and 'role_id' is required."
        );
        assert_eq!(body["error"]["code"], 400);
        assert!(body["error"]["request_id"].is_string());
    }

    assert_eq!(user_count(&*store, role.id).await, 0);
}

#[tokio::test]
async fn test_assign_unknown_role_is_404() {
    let (store, app) = memory_app();
    let users = create_test_users(&*store, "u", 1).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/assign-users-to-role",
        Some(json!({ "users": users, "role_id": 999 })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], 404);
}

#[tokio::test]
async fn test_unassign_user_role() {
    let (store, app) = memory_app();
    let role = create_test_role(&*store, "ops").await;
    let users = create_test_users(&*store, "u", 2).await;
    store.assign_users_to_role(&users, role.id).await.unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        "/unassign-user-role",
        Some(json!({ "user_id": users[0], "role_id": role.id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User unassigned successfully and user count updated");
    assert_eq!(user_count(&*store, role.id).await, 1);

    // 再次移出：未分配
    let (status, body) = send(
        &app,
        Method::POST,
        "/unassign-user-role",
        Some(json!({ "user_id": users[0], "role_id": role.id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"]["message"],
        "User is not assigned to the specified role or does not exist."
    );
    assert_eq!(user_count(&*store, role.id).await, 1);

    let (status, _) = send(
        &app,
        Method::POST,
        "/unassign-user-role",
        Some(json!({ "user_id": users[1] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_permission_actions() {
    let (store, app) = memory_app();
    let role = create_test_role(&*store, "ops").await;
    let permission = create_test_permission(&*store, "deploy").await;
    let grant = json!({ "role_id": role.id, "permission_id": permission.id, "action": 1 });

    let (status, body) = send(&app, Method::POST, "/permission-actions", Some(grant.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Permission assigned successfully");

    let (status, body) = send(&app, Method::POST, "/permission-actions", Some(grant)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Permission is already assigned to this role");

    let revoke = json!({ "role_id": role.id, "permission_id": permission.id, "action": 0 });
    for _ in 0..2 {
        let (status, body) =
            send(&app, Method::POST, "/permission-actions", Some(revoke.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Permission unassigned successfully");
    }
}

#[tokio::test]
async fn test_permission_actions_rejects_unknown_action() {
    let (store, app) = memory_app();
    let role = create_test_role(&*store, "ops").await;
    let permission = create_test_permission(&*store, "deploy").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/permission-actions",
        Some(json!({ "role_id": role.id, "permission_id": permission.id, "action": 2 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"]["message"],
        "Invalid action: 2. Must be 1 (assign) or 0 (unassign)"
    );
    assert!(store.grants_for_role(role.id).await.unwrap().is_empty());

    let (status, _) = send(
        &app,
        Method::POST,
        "/permission-actions",
        Some(json!({ "role_id": role.id, "permission_id": permission.id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_user_list_pagination_shape() {
    let (store, app) = memory_app();
    create_test_users(&*store, "u", 45).await;

    let (status, body) = send(&app, Method::GET, "/users?page=2", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 45);
    assert_eq!(body["page"], 2);
    assert_eq!(body["limit"], 30);
    assert_eq!(body["from"], 31);
    assert_eq!(body["to"], 45);
    assert_eq!(body["last_page"], 2);
    assert_eq!(body["rows"].as_array().unwrap().len(), 15);
}

#[tokio::test]
async fn test_user_list_filters() {
    let (store, app) = memory_app();
    create_test_users(&*store, "alice", 2).await;
    create_test_users(&*store, "bob", 3).await;
    store.set_user_status(1, false).await.unwrap();

    let (status, body) = send(&app, Method::GET, "/users?email=BOB", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);

    let (status, body) = send(&app, Method::GET, "/users?status=0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["rows"][0]["user_id"], 1);

    let (status, body) = send(&app, Method::GET, "/users?status=true&email=alice", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);

    let (status, _) = send(&app, Method::GET, "/users?status=maybe", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_list_has_zero_range() {
    let (_, app) = memory_app();

    let (status, body) = send(&app, Method::GET, "/roles?page=3", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
    assert_eq!(body["from"], 0);
    assert_eq!(body["to"], 0);
    assert_eq!(body["last_page"], 0);
    assert!(body["rows"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_user_crud() {
    let (_, app) = memory_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/users",
        Some(json!({ "name": "carol", "email": "carol@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["status"], true);
    let id = body["user"]["user_id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        Method::POST,
        "/users",
        Some(json!({ "name": "dave", "email": "not-an-email" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/users/{}", id),
        Some(json!({ "name": "carol b", "email": "carol@example.com", "status": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "carol b");

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/users/{}/status", id),
        Some(json!({ "status": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, &format!("/users/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], false);

    let (status, _) = send(&app, Method::DELETE, &format!("/users/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, &format!("/users/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], 404);
}

#[tokio::test]
async fn test_role_crud_and_lookups() {
    let (store, app) = memory_app();
    let users = create_test_users(&*store, "u", 3).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/roles",
        Some(json!({ "name": "auditor", "message": "read only" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let role_id = body["id"].as_i64().unwrap() as i32;

    store.assign_users_to_role(&users[..2], role_id).await.unwrap();

    let (_, body) = send(&app, Method::GET, &format!("/roles/{}/users", role_id), None).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = send(&app, Method::GET, &format!("/roles/{}/candidates", role_id), None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("/roles/{}/candidates?email=nobody", role_id),
        None,
    )
    .await;
    assert!(body.as_array().unwrap().is_empty());

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/roles/{}", role_id),
        Some(json!({ "name": "auditors" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"]["name"], "auditors");
    assert_eq!(body["role"]["user_count"], 2);

    let (status, body) = send(&app, Method::GET, "/roles/all", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::DELETE, &format!("/roles/{}", role_id), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, &format!("/roles/{}", role_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_role_permission_matrix() {
    let (store, app) = memory_app();
    let role = create_test_role(&*store, "ops").await;
    let deploy = create_test_permission(&*store, "deploy").await;
    create_test_permission(&*store, "restart").await;
    store.grant_permission(role.id, deploy.id).await.unwrap();

    let (status, body) =
        send(&app, Method::GET, &format!("/roles/{}/permissions", role.id), None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["name"], "deploy");
    assert_eq!(rows[0]["status"], 1);
    assert_eq!(rows[1]["status"], 0);

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/permissions-in-role?role_id={}", role.id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["permission_id"], deploy.id);

    let (status, _) = send(&app, Method::GET, "/permissions-in-role", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // 仍有授权时不能删除
    let (status, _) = send(&app, Method::DELETE, &format!("/roles/{}", role.id), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) =
        send(&app, Method::DELETE, &format!("/permissions/{}", deploy.id), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_permission_crud() {
    let (_, app) = memory_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/permissions",
        Some(json!({ "name": "deploy", "about": "ship builds" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["permission"]["id"].as_i64().unwrap();

    let (status, _) = send(&app, Method::POST, "/permissions", Some(json!({ "name": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::GET, "/permissions?name=DEP", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/permissions/{}", id),
        Some(json!({ "name": "deploy-prod" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["permission"]["name"], "deploy-prod");

    let (status, body) = send(&app, Method::GET, "/permissions/all", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::DELETE, &format!("/permissions/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, &format!("/permissions/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_responses_carry_trace_headers() {
    let (_, app) = memory_app();

    let response = tower::ServiceExt::oneshot(
        app,
        axum::http::Request::builder()
            .uri("/health")
            .header("x-trace-id", "trace-abc")
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.headers()["x-trace-id"], "trace-abc");
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_list_with_huge_page_number() {
    let (store, app) = memory_app();
    create_test_role(&*store, "ops").await;

    let (status, body) = send(&app, Method::GET, "/roles?page=9223372036854775807", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["page"], i64::MAX);
    assert!(body["from"].as_i64().unwrap() > 0);
    assert_eq!(body["to"], 1);
    assert!(body["rows"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_ids_are_validation_errors() {
    let (store, app) = memory_app();
    let role = create_test_role(&*store, "ops").await;
    let permission = create_test_permission(&*store, "deploy").await;

    for (uri, payload) in [
        ("/assign-users-to-role", json!({ "users": ["a"], "role_id": role.id })),
        ("/assign-users-to-role", json!({ "users": [1], "role_id": "three" })),
        ("/assign-users-to-role", json!({ "users": 5, "role_id": role.id })),
        ("/unassign-user-role", json!({ "user_id": "x", "role_id": role.id })),
        ("/unassign-user-role", json!({ "user_id": 1, "role_id": true })),
        (
            "/permission-actions",
            json!({ "role_id": role.id, "permission_id": "p", "action": 1 }),
        ),
    ] {
        let (status, body) = send(&app, Method::POST, uri, Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["error"]["code"], 400);
        assert!(!body["error"]["message"].as_str().unwrap().is_empty());
    }

    assert_eq!(user_count(&*store, role.id).await, 0);
    assert!(store.grants_for_role(role.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_numeric_string_ids_accepted() {
    let (store, app) = memory_app();
    let role = create_test_role(&*store, "ops").await;
    let users = create_test_users(&*store, "u", 2).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/assign-users-to-role",
        Some(json!({ "users": [users[0].to_string(), users[1]], "role_id": role.id.to_string() })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updatedRows"], 2);
    assert_eq!(user_count(&*store, role.id).await, 2);

    let (status, _) = send(
        &app,
        Method::POST,
        "/unassign-user-role",
        Some(json!({ "user_id": users[0].to_string(), "role_id": role.id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user_count(&*store, role.id).await, 1);
}

#[tokio::test]
async fn test_invalid_json_body_rejected() {
    let (_, app) = memory_app();

    let response = tower::ServiceExt::oneshot(
        app,
        axum::http::Request::builder()
            .method(Method::POST)
            .uri("/roles")
            .header("content-type", "application/json")
            .body(axum::body::Body::from("{\"name\": "))
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_error_body_request_id_matches_header() {
    use http_body_util::BodyExt;

    let (_, app) = memory_app();

    let response = tower::ServiceExt::oneshot(
        app,
        axum::http::Request::builder()
            .uri("/roles/4242")
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let header = response.headers()["x-request-id"].to_str().unwrap().to_string();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["error"]["request_id"], header.as_str());
}
