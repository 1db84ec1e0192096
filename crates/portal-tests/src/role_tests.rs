use axum::http::StatusCode;
use pretty_assertions::assert_eq;

use crate::common::{
    admin_token, create_owc_user, delete, get, login, put_json, register, test_app, token_of,
    user_id_of,
};

const OWC_ADMIN_GROUP: i64 = 1;
const REGISTRAR_GROUP: i64 = 7;
const PAYMENT_OFFICER_GROUP: i64 = 10;

#[tokio::test]
async fn bootstrap_admin_resolves_through_override() {
    let Some(app) = test_app().await else { return };

    let response = register(&app.router, "Administrator@Gmail.com").await;

    assert_eq!(response["resolution"]["source"], "OverrideHit");
    assert_eq!(response["resolution"]["role"], "OWC Admin");
    assert_eq!(response["dashboard"]["path"], "/admin");
    assert_eq!(response["dashboard"]["view"], "AdminDashboard");
}

#[tokio::test]
async fn direct_membership_resolves_group_title() {
    let Some(app) = test_app().await else { return };
    let admin = admin_token(&app.router).await;
    let user = register(&app.router, "registrar@example.com").await;

    let body = serde_json::json!({ "user_id": user_id_of(&user), "group_id": REGISTRAR_GROUP });
    let (status, response) = put_json(&app.router, "/api/admin/memberships", &body.to_string(), Some(&admin)).await;
    assert_eq!(status, StatusCode::OK, "{response:?}");

    let session = login(&app.router, "registrar@example.com").await;
    assert_eq!(session["resolution"]["source"], "DirectLookup");
    assert_eq!(session["resolution"]["role"], "Registrar");
    assert_eq!(session["dashboard"]["path"], "/registrar-dashboard");
    assert_eq!(session["dashboard"]["view"], "RegistrarDashboard");
}

#[tokio::test]
async fn second_lookup_in_a_session_is_served_from_cache() {
    let Some(app) = test_app().await else { return };
    let token = token_of(&register(&app.router, "cached@example.com").await);

    let (status, response) = get(&app.router, "/api/role", Some(&token)).await;

    assert_eq!(status, StatusCode::OK, "{response:?}");
    assert_eq!(response["resolution"]["source"], "CachedHit");
    assert_eq!(response["resolution"]["role"], "User");
    assert_eq!(response["dashboard"]["path"], "/dashboard");
}

#[tokio::test]
async fn cached_role_survives_membership_change_until_cleared() {
    let Some(app) = test_app().await else { return };
    let admin = admin_token(&app.router).await;
    let user = register(&app.router, "promoted@example.com").await;
    let token = token_of(&user);

    let body = serde_json::json!({ "user_id": user_id_of(&user), "group_id": REGISTRAR_GROUP });
    let (status, _) = put_json(&app.router, "/api/admin/memberships", &body.to_string(), Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, stale) = get(&app.router, "/api/role", Some(&token)).await;
    assert_eq!(stale["resolution"]["source"], "CachedHit");
    assert_eq!(stale["resolution"]["role"], "User");

    let (status, _) = delete(&app.router, "/api/role/cache", Some(&token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, fresh) = get(&app.router, "/api/role", Some(&token)).await;
    assert_eq!(fresh["resolution"]["source"], "DirectLookup");
    assert_eq!(fresh["resolution"]["role"], "Registrar");
}

#[tokio::test]
async fn email_fallback_uses_admin_managed_user() {
    let Some(app) = test_app().await else { return };
    let admin = admin_token(&app.router).await;
    register(&app.router, "payer@example.com").await;

    let owc_id = create_owc_user(&app.router, &admin, "Payer", "PAYER@example.com").await;
    let body = serde_json::json!({ "owc_user_id": owc_id, "group_id": PAYMENT_OFFICER_GROUP });
    let (status, _) = put_json(&app.router, "/api/admin/memberships", &body.to_string(), Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);

    let session = login(&app.router, "payer@example.com").await;
    assert_eq!(session["resolution"]["source"], "EmailFallback");
    assert_eq!(session["resolution"]["role"], "Payment Officer");
    assert_eq!(session["dashboard"]["path"], "/payment-dashboard");
}

#[tokio::test]
async fn dangling_membership_falls_through_to_email_fallback() {
    let Some(app) = test_app().await else { return };
    let admin = admin_token(&app.router).await;
    let user = register(&app.router, "dangling@example.com").await;

    sqlx::query("INSERT INTO user_groups (user_id, group_id) VALUES ($1::uuid, 999)")
        .bind(user_id_of(&user))
        .execute(&app.pool)
        .await
        .unwrap();

    let owc_id = create_owc_user(&app.router, &admin, "Dangling", "dangling@example.com").await;
    let body = serde_json::json!({ "owc_user_id": owc_id, "group_id": PAYMENT_OFFICER_GROUP });
    let (status, _) = put_json(&app.router, "/api/admin/memberships", &body.to_string(), Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);

    let session = login(&app.router, "dangling@example.com").await;
    assert_eq!(session["resolution"]["source"], "EmailFallback");
    assert_eq!(session["resolution"]["role"], "Payment Officer");
}

#[tokio::test]
async fn dangling_membership_without_fallback_defaults() {
    let Some(app) = test_app().await else { return };
    let user = register(&app.router, "orphan@example.com").await;

    sqlx::query("INSERT INTO user_groups (user_id, group_id) VALUES ($1::uuid, 999)")
        .bind(user_id_of(&user))
        .execute(&app.pool)
        .await
        .unwrap();

    let session = login(&app.router, "orphan@example.com").await;
    assert_eq!(session["resolution"]["source"], "Default");
    assert_eq!(session["resolution"]["role"], "User");
    assert_eq!(session["dashboard"]["path"], "/dashboard");
}

#[tokio::test]
async fn override_beats_group_membership() {
    let Some(app) = test_app().await else { return };
    let admin = register(&app.router, "administrator@gmail.com").await;
    let token = token_of(&admin);

    let body = serde_json::json!({ "user_id": user_id_of(&admin), "group_id": REGISTRAR_GROUP });
    let (status, _) = put_json(&app.router, "/api/admin/memberships", &body.to_string(), Some(&token)).await;
    assert_eq!(status, StatusCode::OK);

    let session = login(&app.router, "administrator@gmail.com").await;
    assert_eq!(session["resolution"]["source"], "OverrideHit");
    assert_eq!(session["resolution"]["role"], "OWC Admin");
}

#[tokio::test]
async fn role_requires_authentication() {
    let Some(app) = test_app().await else { return };

    let (status, _) = get(&app.router, "/api/role", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = delete(&app.router, "/api/role/cache", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_discards_cached_role() {
    let Some(app) = test_app().await else { return };
    let token = token_of(&register(&app.router, "short.session@example.com").await);

    let (status, _) = crate::common::post_json(&app.router, "/api/auth/logout", "{}", Some(&token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The token has not expired, but its session has ended.
    let (status, _) = get(&app.router, "/api/role", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = delete(&app.router, "/api/role/cache", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(app.state.sessions.is_empty());
}

#[tokio::test]
async fn demoted_admin_loses_admin_access_after_cache_clear() {
    let Some(app) = test_app().await else { return };
    let admin = admin_token(&app.router).await;
    let user = register(&app.router, "deputy@example.com").await;

    let body = serde_json::json!({ "user_id": user_id_of(&user), "group_id": OWC_ADMIN_GROUP });
    let (status, membership) = put_json(&app.router, "/api/admin/memberships", &body.to_string(), Some(&admin)).await;
    assert_eq!(status, StatusCode::OK, "{membership:?}");
    let membership_id = membership["id"].as_i64().expect("membership id");

    let session = login(&app.router, "deputy@example.com").await;
    assert_eq!(session["resolution"]["role"], "OWC Admin");
    let deputy = token_of(&session);
    let (status, _) = get(&app.router, "/api/admin/users", Some(&deputy)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = delete(&app.router, &format!("/api/admin/memberships/{membership_id}"), Some(&admin)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Still admin while the session caches the role.
    let (status, _) = get(&app.router, "/api/admin/users", Some(&deputy)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = delete(&app.router, "/api/role/cache", Some(&deputy)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, role) = get(&app.router, "/api/role", Some(&deputy)).await;
    assert_eq!(role["resolution"]["role"], "User");
    let (status, response) = get(&app.router, "/api/admin/users", Some(&deputy)).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{response:?}");
    let (status, _) = delete(&app.router, &format!("/api/admin/memberships/{membership_id}"), Some(&deputy)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn promoted_user_gains_admin_access_after_cache_clear() {
    let Some(app) = test_app().await else { return };
    let admin = admin_token(&app.router).await;
    let user = register(&app.router, "rising@example.com").await;
    let token = token_of(&user);

    let (status, _) = get(&app.router, "/api/admin/groups", Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let body = serde_json::json!({ "user_id": user_id_of(&user), "group_id": OWC_ADMIN_GROUP });
    let (status, _) = put_json(&app.router, "/api/admin/memberships", &body.to_string(), Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = delete(&app.router, "/api/role/cache", Some(&token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = get(&app.router, "/api/admin/groups", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
}
