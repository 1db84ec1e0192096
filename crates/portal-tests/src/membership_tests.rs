use axum::http::StatusCode;
use pretty_assertions::assert_eq;

use crate::common::{admin_token, create_owc_user, delete, get, put_json, register, test_app, user_id_of};

#[tokio::test]
async fn assign_replaces_existing_membership() {
    let Some(app) = test_app().await else { return };
    let admin = admin_token(&app.router).await;
    let owc_id = create_owc_user(&app.router, &admin, "Mover", "mover@example.com").await;

    let first = serde_json::json!({ "owc_user_id": owc_id, "group_id": 2 });
    let (status, created) = put_json(&app.router, "/api/admin/memberships", &first.to_string(), Some(&admin)).await;
    assert_eq!(status, StatusCode::OK, "{created:?}");
    assert_eq!(created["group_id"], 2);

    let second = serde_json::json!({ "owc_user_id": owc_id, "group_id": 9 });
    let (status, replaced) = put_json(&app.router, "/api/admin/memberships", &second.to_string(), Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(replaced["group_id"], 9);
    assert_eq!(replaced["id"], created["id"]);

    let (status, list) = get(&app.router, "/api/admin/memberships", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    let rows = list.as_array().expect("array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["group_title"], "Claims Manager");
    assert_eq!(rows[0]["user_email"], "mover@example.com");
}

#[tokio::test]
async fn identity_memberships_are_listed_with_email() {
    let Some(app) = test_app().await else { return };
    let admin = admin_token(&app.router).await;
    let user = register(&app.router, "clerk@example.com").await;

    let body = serde_json::json!({ "user_id": user_id_of(&user), "group_id": 11 });
    let (status, _) = put_json(&app.router, "/api/admin/memberships", &body.to_string(), Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, list) = get(&app.router, "/api/admin/memberships", Some(&admin)).await;
    let row = &list.as_array().expect("array")[0];
    assert_eq!(row["user_id"], user_id_of(&user));
    assert_eq!(row["user_email"], "clerk@example.com");
    assert_eq!(row["group_title"], "Data Entry Officer");
}

#[tokio::test]
async fn assign_requires_exactly_one_subject() {
    let Some(app) = test_app().await else { return };
    let admin = admin_token(&app.router).await;
    let user = register(&app.router, "both@example.com").await;
    let owc_id = create_owc_user(&app.router, &admin, "Both", "both@example.com").await;

    let neither = serde_json::json!({ "group_id": 3 });
    let (status, _) = put_json(&app.router, "/api/admin/memberships", &neither.to_string(), Some(&admin)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let both = serde_json::json!({ "user_id": user_id_of(&user), "owc_user_id": owc_id, "group_id": 3 });
    let (status, _) = put_json(&app.router, "/api/admin/memberships", &both.to_string(), Some(&admin)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn assign_to_unknown_group_or_user_is_not_found() {
    let Some(app) = test_app().await else { return };
    let admin = admin_token(&app.router).await;
    let owc_id = create_owc_user(&app.router, &admin, "Lost", "lost@example.com").await;

    let bad_group = serde_json::json!({ "owc_user_id": owc_id, "group_id": 999 });
    let (status, _) = put_json(&app.router, "/api/admin/memberships", &bad_group.to_string(), Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let bad_user = serde_json::json!({ "owc_user_id": owc_id + 100, "group_id": 3 });
    let (status, _) = put_json(&app.router, "/api/admin/memberships", &bad_user.to_string(), Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn remove_from_group() {
    let Some(app) = test_app().await else { return };
    let admin = admin_token(&app.router).await;
    let owc_id = create_owc_user(&app.router, &admin, "Leaver", "leaver@example.com").await;

    let body = serde_json::json!({ "owc_user_id": owc_id, "group_id": 3 });
    let (_, membership) = put_json(&app.router, "/api/admin/memberships", &body.to_string(), Some(&admin)).await;
    let id = membership["id"].as_i64().expect("membership id");

    let (status, _) = delete(&app.router, &format!("/api/admin/memberships/{id}"), Some(&admin)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, list) = get(&app.router, "/api/admin/memberships", Some(&admin)).await;
    assert_eq!(list.as_array().map(Vec::len), Some(0));

    let (status, _) = delete(&app.router, &format!("/api/admin/memberships/{id}"), Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_user_removes_membership() {
    let Some(app) = test_app().await else { return };
    let admin = admin_token(&app.router).await;
    let owc_id = create_owc_user(&app.router, &admin, "Gone", "gone@example.com").await;

    let body = serde_json::json!({ "owc_user_id": owc_id, "group_id": 3 });
    put_json(&app.router, "/api/admin/memberships", &body.to_string(), Some(&admin)).await;

    let (status, _) = delete(&app.router, &format!("/api/admin/users/{owc_id}"), Some(&admin)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, list) = get(&app.router, "/api/admin/memberships", Some(&admin)).await;
    assert_eq!(list.as_array().map(Vec::len), Some(0));
}
