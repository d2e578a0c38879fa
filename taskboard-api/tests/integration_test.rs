/// Integration tests for the task board API
///
/// These drive the full router (authentication, routing, extractors, error
/// mapping and middleware) against the in-memory store:
/// - Account lifecycle (register, login, check, refresh, logout)
/// - Board hierarchy CRUD and visibility
/// - Admin authority and membership management
/// - Attachment upload and download
///
/// Run with: cargo test --test integration_test

mod common;

use axum::http::{header, StatusCode};
use common::TestContext;
use serde_json::json;

#[tokio::test]
async fn test_health_without_database() {
    let ctx = TestContext::new();

    let response = ctx.request("GET", "/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "not_configured");
}

#[tokio::test]
async fn test_account_lifecycle() {
    let ctx = TestContext::new();

    let register = ctx
        .request(
            "POST",
            "/v1/auth/register",
            None,
            Some(json!({
                "email": "ada@example.com",
                "password": "hunter22",
                "password2": "hunter22",
                "first_name": "Ada",
                "sur_name": "Lovelace",
            })),
        )
        .await;
    assert_eq!(register.status, StatusCode::CREATED);
    assert_eq!(
        register.json()["message"],
        "Hi Ada Lovelace, your account has been created successfully."
    );

    let login = ctx
        .request(
            "POST",
            "/v1/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "hunter22" })),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    let login = login.json();
    assert_eq!(login["full_name"], "Ada Lovelace");
    let access = login["access_token"].as_str().unwrap().to_string();
    let refresh = login["refresh_token"].as_str().unwrap().to_string();

    let check = ctx.get("/v1/auth/check_token", &access).await;
    assert_eq!(check.status, StatusCode::OK);
    assert_eq!(check.json()["message"], "You are authenticated");

    let me = ctx.get("/v1/auth/me", &access).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.json()["email"], "ada@example.com");
    assert!(me.json().get("password_hash").is_none());

    let refreshed = ctx
        .request(
            "POST",
            "/v1/auth/refresh",
            None,
            Some(json!({ "refresh_token": refresh })),
        )
        .await;
    assert_eq!(refreshed.status, StatusCode::OK);
    assert!(refreshed.json()["access_token"].is_string());

    let logout = ctx
        .request(
            "POST",
            "/v1/auth/logout",
            None,
            Some(json!({ "refresh_token": refresh })),
        )
        .await;
    assert_eq!(logout.status, StatusCode::OK);
    assert_eq!(logout.json()["message"], "You have been logged out");

    let after_logout = ctx
        .request(
            "POST",
            "/v1/auth/refresh",
            None,
            Some(json!({ "refresh_token": refresh })),
        )
        .await;
    assert_eq!(after_logout.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let ctx = TestContext::new();
    ctx.signup("Ada").await;

    let response = ctx
        .request(
            "POST",
            "/v1/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "wrong-password" })),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.json()["message"], "Invalid credentials.");
}

#[tokio::test]
async fn test_register_validation_details() {
    let ctx = TestContext::new();

    let response = ctx
        .request(
            "POST",
            "/v1/auth/register",
            None,
            Some(json!({
                "email": "ada@example.com",
                "password": "hunter22",
                "password2": "hunter23",
                "first_name": "Ada",
                "sur_name": "Lovelace",
            })),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    let body = response.json();
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "password");
    assert_eq!(body["details"][0]["message"], "Password fields did not match.");
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let ctx = TestContext::new();
    ctx.signup("Ada").await;

    let response = ctx
        .request(
            "POST",
            "/v1/auth/register",
            None,
            Some(json!({
                "email": "ADA@example.com",
                "password": "hunter22",
                "password2": "hunter22",
                "first_name": "Other",
                "sur_name": "Ada",
            })),
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let ctx = TestContext::new();

    let missing = ctx.request("GET", "/v1/boards", None, None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.json()["error"], "unauthorized");

    let garbage = ctx.get("/v1/boards", "not-a-token").await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_is_not_an_access_token() {
    let ctx = TestContext::new();
    let login = ctx.signup("Ada").await;
    let refresh = login["refresh_token"].as_str().unwrap();

    let response = ctx.get("/v1/boards", refresh).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_board_hierarchy_crud() {
    let ctx = TestContext::new();
    let token = ctx.token("Ada").await;
    let (board, list, card) = ctx.hierarchy(&token).await;

    let boards = ctx.get("/v1/boards", &token).await;
    assert_eq!(boards.status, StatusCode::OK);
    assert_eq!(boards.json().as_array().unwrap().len(), 1);

    let lists = ctx.get(&format!("/v1/lists?parent={}", board), &token).await;
    assert_eq!(lists.json()[0]["slug"], list.as_str());

    let fetched = ctx.get(&format!("/v1/cards/{}", card), &token).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.json()["list"], list.as_str());
    assert_eq!(fetched.json()["name"], "Write tests");

    let renamed = ctx
        .patch(
            &format!("/v1/boards/{}", board),
            &token,
            json!({ "name": "Sprint 2" }),
        )
        .await;
    assert_eq!(renamed.status, StatusCode::OK);
    assert_eq!(renamed.json()["name"], "Sprint 2");
    assert_eq!(renamed.json()["slug"], board.as_str());

    let replaced = ctx
        .request(
            "PUT",
            &format!("/v1/lists/{}", list),
            Some(&token),
            Some(json!({ "name": "Doing", "description": "", "is_active": true })),
        )
        .await;
    assert_eq!(replaced.status, StatusCode::OK);
    assert_eq!(replaced.json()["name"], "Doing");

    let deleted = ctx.delete(&format!("/v1/boards/{}", board), &token).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let gone = ctx.get(&format!("/v1/cards/{}", card), &token).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_validation_error() {
    let ctx = TestContext::new();
    let token = ctx.token("Ada").await;

    let response = ctx
        .post("/v1/boards", &token, json!({ "name": "x".repeat(51) }))
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json()["details"][0]["field"], "name");
}

#[tokio::test]
async fn test_malformed_body_is_json_error() {
    let ctx = TestContext::new();
    let token = ctx.token("Ada").await;

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/v1/boards")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = ctx.send(request).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "bad_request");
}

#[tokio::test]
async fn test_outsider_sees_nothing() {
    let ctx = TestContext::new();
    let owner = ctx.token("Ada").await;
    let outsider = ctx.token("Mallory").await;
    let (board, list, card) = ctx.hierarchy(&owner).await;
    let comment = ctx
        .create(
            "/v1/comments",
            &owner,
            json!({ "card": card, "body": "Repro attached" }),
        )
        .await;
    let tag = ctx
        .create("/v1/tags", &owner, json!({ "card": card, "label": "urgent" }))
        .await;
    let uploaded = ctx
        .upload(&owner, &card, "crash.log", "text/plain", b"panic")
        .await;
    assert_eq!(uploaded.status, StatusCode::CREATED);
    let attachment = uploaded.json()["slug"].as_str().unwrap().to_string();

    for uri in [
        "/v1/boards".to_string(),
        "/v1/lists".to_string(),
        "/v1/cards".to_string(),
        "/v1/comments".to_string(),
        "/v1/attachments".to_string(),
        "/v1/tags".to_string(),
        format!("/v1/comments?parent={}", card),
        format!("/v1/attachments?parent={}", card),
        format!("/v1/tags?parent={}", card),
    ] {
        let response = ctx.get(&uri, &outsider).await;
        assert_eq!(response.status, StatusCode::OK, "{}", uri);
        assert_eq!(response.json().as_array().unwrap().len(), 0, "{}", uri);
    }

    for uri in [
        format!("/v1/boards/{}", board),
        format!("/v1/lists/{}", list),
        format!("/v1/cards/{}", card),
        format!("/v1/comments/{}", comment),
        format!("/v1/attachments/{}", attachment),
        format!("/v1/attachments/{}/content", attachment),
        format!("/v1/tags/{}", tag),
    ] {
        let response = ctx.get(&uri, &outsider).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{}", uri);
    }

    // Creating under a board that is not visible looks like a missing board
    let response = ctx
        .post("/v1/lists", &outsider, json!({ "board": board, "name": "Sneaky" }))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_member_reads_but_cannot_administer() {
    let ctx = TestContext::new();
    let owner = ctx.token("Ada").await;
    let member = ctx.token("Grace").await;
    let (board, _list, card) = ctx.hierarchy(&owner).await;

    let granted = ctx
        .post(
            &format!("/v1/boards/{}/members", board),
            &owner,
            json!({ "email": "grace@example.com" }),
        )
        .await;
    assert_eq!(granted.status, StatusCode::CREATED);
    assert_eq!(granted.json()["is_admin"], false);

    let fetched = ctx.get(&format!("/v1/boards/{}", board), &member).await;
    assert_eq!(fetched.status, StatusCode::OK);

    let rename = ctx
        .patch(
            &format!("/v1/boards/{}", board),
            &member,
            json!({ "name": "Mine now" }),
        )
        .await;
    assert_eq!(rename.status, StatusCode::FORBIDDEN);

    // Any member may comment
    let comment = ctx
        .post(
            "/v1/comments",
            &member,
            json!({ "card": card, "body": "Looks good" }),
        )
        .await;
    assert_eq!(comment.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_membership_endpoints() {
    let ctx = TestContext::new();
    let owner = ctx.token("Ada").await;
    let grace = ctx.signup("Grace").await;
    let grace_token = grace["access_token"].as_str().unwrap().to_string();
    let (board, list, card) = ctx.hierarchy(&owner).await;

    let me = ctx.get("/v1/auth/me", &grace_token).await.json();
    let grace_slug = me["slug"].as_str().unwrap().to_string();

    // Not yet a board member
    let early = ctx
        .post(
            &format!("/v1/cards/{}/members", card),
            &owner,
            json!({ "user": grace_slug }),
        )
        .await;
    assert_eq!(early.status, StatusCode::UNPROCESSABLE_ENTITY);

    let granted = ctx
        .post(
            &format!("/v1/boards/{}/members", board),
            &owner,
            json!({ "user": grace_slug, "is_admin": true }),
        )
        .await;
    assert_eq!(granted.status, StatusCode::CREATED);

    let members = ctx.get(&format!("/v1/boards/{}/members", board), &owner).await;
    assert_eq!(members.json().as_array().unwrap().len(), 2);

    let participant = ctx
        .post(
            &format!("/v1/lists/{}/members", list),
            &owner,
            json!({ "user": grace_slug }),
        )
        .await;
    assert_eq!(participant.status, StatusCode::CREATED);
    assert!(participant.json().get("is_admin").is_none());

    let deactivated = ctx
        .patch(
            &format!("/v1/lists/{}/members/{}", list, grace_slug),
            &owner,
            json!({ "is_active": false }),
        )
        .await;
    assert_eq!(deactivated.status, StatusCode::OK);
    assert_eq!(deactivated.json()["is_active"], false);

    let card_participant = ctx
        .post(
            &format!("/v1/cards/{}/members", card),
            &owner,
            json!({ "email": "grace@example.com" }),
        )
        .await;
    assert_eq!(card_participant.status, StatusCode::CREATED);
    let card_members = ctx.get(&format!("/v1/cards/{}/members", card), &grace_token).await;
    assert_eq!(card_members.json().as_array().unwrap().len(), 1);

    // Revoking the member hides the board from them
    let revoked = ctx
        .patch(
            &format!("/v1/boards/{}/members/{}", board, grace_slug),
            &owner,
            json!({ "is_active": false }),
        )
        .await;
    assert_eq!(revoked.status, StatusCode::OK);
    let hidden = ctx.get(&format!("/v1/boards/{}", board), &grace_token).await;
    assert_eq!(hidden.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_last_admin_cannot_step_down() {
    let ctx = TestContext::new();
    let owner = ctx.token("Ada").await;
    let board = ctx
        .create("/v1/boards", &owner, json!({ "name": "Solo" }))
        .await;
    let me = ctx.get("/v1/auth/me", &owner).await.json();
    let slug = me["slug"].as_str().unwrap();

    let response = ctx
        .patch(
            &format!("/v1/boards/{}/members/{}", board, slug),
            &owner,
            json!({ "is_admin": false }),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json()["details"][0]["field"], "is_admin");
}

#[tokio::test]
async fn test_regrant_keeps_admin_flag() {
    let ctx = TestContext::new();
    let owner = ctx.token("Ada").await;
    let board = ctx
        .create("/v1/boards", &owner, json!({ "name": "Solo" }))
        .await;

    let regranted = ctx
        .post(
            &format!("/v1/boards/{}/members", board),
            &owner,
            json!({ "email": "ada@example.com" }),
        )
        .await;
    assert_eq!(regranted.status, StatusCode::CREATED);
    assert_eq!(regranted.json()["is_admin"], true);

    let list = ctx
        .post("/v1/lists", &owner, json!({ "board": board, "name": "Todo" }))
        .await;
    assert_eq!(list.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_attachment_upload_and_download() {
    let ctx = TestContext::new();
    let token = ctx.token("Ada").await;
    let (_board, _list, card) = ctx.hierarchy(&token).await;

    let uploaded = ctx
        .upload(&token, &card, "notes.txt", "text/plain", b"hello board")
        .await;
    assert_eq!(uploaded.status, StatusCode::CREATED);
    let attachment = uploaded.json();
    assert_eq!(attachment["file_name"], "notes.txt");
    assert_eq!(attachment["content_type"], "text/plain");
    assert_eq!(attachment["size_bytes"], 11);
    assert_eq!(ctx.blobs.len().await, 1);

    let slug = attachment["slug"].as_str().unwrap();
    let content = ctx
        .get(&format!("/v1/attachments/{}/content", slug), &token)
        .await;
    assert_eq!(content.status, StatusCode::OK);
    assert_eq!(&content.body[..], b"hello board");
    assert_eq!(content.headers[header::CONTENT_TYPE], "text/plain");
    assert_eq!(
        content.headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"notes.txt\""
    );
    assert_eq!(content.headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");

    let listed = ctx
        .get(&format!("/v1/attachments?parent={}", card), &token)
        .await;
    assert_eq!(listed.json().as_array().unwrap().len(), 1);

    let deleted = ctx
        .delete(&format!("/v1/attachments/{}", slug), &token)
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert!(ctx.blobs.is_empty().await);
}

#[tokio::test]
async fn test_upload_rejections() {
    let mut config = taskboard_api::config::Config::for_testing();
    config.media.max_upload_bytes = 16;
    let ctx = TestContext::with_config(config);
    let token = ctx.token("Ada").await;
    let (_board, _list, card) = ctx.hierarchy(&token).await;

    let too_big = ctx
        .upload(&token, &card, "big.bin", "application/octet-stream", &[7u8; 32])
        .await;
    assert_eq!(too_big.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(too_big.json()["details"][0]["field"], "file");

    let empty = ctx
        .upload(&token, &card, "empty.txt", "text/plain", b"")
        .await;
    assert_eq!(empty.status, StatusCode::UNPROCESSABLE_ENTITY);

    let outsider = ctx.token("Mallory").await;
    let hidden = ctx
        .upload(&outsider, &card, "x.txt", "text/plain", b"x")
        .await;
    assert_eq!(hidden.status, StatusCode::NOT_FOUND);

    assert!(ctx.blobs.is_empty().await);
}

#[tokio::test]
async fn test_tags_and_comments() {
    let ctx = TestContext::new();
    let token = ctx.token("Ada").await;
    let (_board, _list, card) = ctx.hierarchy(&token).await;

    let tag = ctx
        .post("/v1/tags", &token, json!({ "card": card, "label": "  urgent " }))
        .await;
    assert_eq!(tag.status, StatusCode::CREATED);
    assert_eq!(tag.json()["label"], "urgent");

    let comment_slug = ctx
        .create(
            "/v1/comments",
            &token,
            json!({ "card": card, "body": "First!" }),
        )
        .await;
    let edited = ctx
        .patch(
            &format!("/v1/comments/{}", comment_slug),
            &token,
            json!({ "body": "Edited" }),
        )
        .await;
    assert_eq!(edited.status, StatusCode::OK);
    assert_eq!(edited.json()["body"], "Edited");

    let comments = ctx
        .get(&format!("/v1/comments?parent={}", card), &token)
        .await;
    assert_eq!(comments.json().as_array().unwrap().len(), 1);
}
