//! Web API comment tests.

mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{create_category, create_test_server, make_admin, register_and_login};

async fn setup_post(server: &axum_test::TestServer, db: &corkboard::Database) -> (String, i64) {
    let _category_id = create_category(db, "general", true, false).await;
    let (_alice_id, token) = register_and_login(server, "alice").await;

    let response = server
        .post("/api/posts")
        .authorization_bearer(&token)
        .json(&json!({
            "category_id": 1,
            "title": "Hello",
            "content": "First post",
        }))
        .await;
    let post_id = response.json::<Value>()["id"].as_i64().unwrap();
    (token, post_id)
}

#[tokio::test]
async fn test_comment_create_and_list() {
    let (server, db) = create_test_server().await;
    let (token, post_id) = setup_post(&server, &db).await;

    let response = server
        .post("/api/comments")
        .authorization_bearer(&token)
        .json(&json!({"post_id": post_id, "content": "nice post"}))
        .await;
    response.assert_status(StatusCode::CREATED);
    let comment = response.json::<Value>();
    assert_eq!(comment["is_anonymous"], false);
    assert_eq!(comment["author_nickname"], "alice");

    let response = server.get(&format!("/api/posts/{}/comments", post_id)).await;
    response.assert_status_ok();
    let comments = response.json::<Value>();
    assert_eq!(comments.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_anonymous_comment_and_reply() {
    let (server, db) = create_test_server().await;
    let (token, post_id) = setup_post(&server, &db).await;

    let parent = server
        .post("/api/comments")
        .authorization_bearer(&token)
        .json(&json!({"post_id": post_id, "content": "first"}))
        .await
        .json::<Value>();
    let parent_id = parent["id"].as_i64().unwrap();

    let response = server
        .post("/api/comments")
        .json(&json!({
            "post_id": post_id,
            "parent_comment_id": parent_id,
            "content": "reply",
            "nickname": "Guest",
            "author_password": "letmein123",
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let reply = response.json::<Value>();
    assert_eq!(reply["parent_comment_id"], parent_id);
    assert_eq!(reply["is_anonymous"], true);
}

#[tokio::test]
async fn test_reply_to_comment_on_other_post_rejected() {
    let (server, db) = create_test_server().await;
    let (token, post_id) = setup_post(&server, &db).await;

    let other_post = server
        .post("/api/posts")
        .authorization_bearer(&token)
        .json(&json!({"category_id": 1, "title": "Other", "content": "body"}))
        .await
        .json::<Value>();
    let other_post_id = other_post["id"].as_i64().unwrap();

    let comment = server
        .post("/api/comments")
        .authorization_bearer(&token)
        .json(&json!({"post_id": post_id, "content": "first"}))
        .await
        .json::<Value>();

    let response = server
        .post("/api/comments")
        .authorization_bearer(&token)
        .json(&json!({
            "post_id": other_post_id,
            "parent_comment_id": comment["id"],
            "content": "cross-post reply",
        }))
        .await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_comment_ownership_rules() {
    let (server, db) = create_test_server().await;
    let (token, post_id) = setup_post(&server, &db).await;
    let (_bob_id, bob_token) = register_and_login(&server, "bob").await;

    let comment = server
        .post("/api/comments")
        .authorization_bearer(&token)
        .json(&json!({"post_id": post_id, "content": "mine"}))
        .await
        .json::<Value>();
    let comment_id = comment["id"].as_i64().unwrap();

    // Another user cannot edit or delete
    server
        .put(&format!("/api/comments/{}", comment_id))
        .authorization_bearer(&bob_token)
        .json(&json!({"content": "stolen"}))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    server
        .delete(&format!("/api/comments/{}", comment_id))
        .authorization_bearer(&bob_token)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    // The owner can
    let response = server
        .put(&format!("/api/comments/{}", comment_id))
        .authorization_bearer(&token)
        .json(&json!({"content": "edited"}))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["content"], "edited");

    server
        .delete(&format!("/api/comments/{}", comment_id))
        .authorization_bearer(&token)
        .await
        .assert_status_ok();

    let comments = server
        .get(&format!("/api/posts/{}/comments", post_id))
        .await
        .json::<Value>();
    assert!(comments.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_admin_deletes_owned_and_anonymous_comments() {
    let (server, db) = create_test_server().await;
    let (token, post_id) = setup_post(&server, &db).await;
    let (root_id, _) = register_and_login(&server, "root").await;
    make_admin(&db, root_id).await;
    let root_token = common::login_user(&server, "root").await;

    let owned = server
        .post("/api/comments")
        .authorization_bearer(&token)
        .json(&json!({"post_id": post_id, "content": "owned"}))
        .await
        .json::<Value>();
    let anon = server
        .post("/api/comments")
        .json(&json!({
            "post_id": post_id,
            "content": "anonymous",
            "nickname": "Guest",
            "author_password": "letmein123",
        }))
        .await
        .json::<Value>();

    server
        .delete(&format!("/api/comments/{}", owned["id"]))
        .authorization_bearer(&root_token)
        .await
        .assert_status_ok();

    // The author password is not needed with an admin session
    server
        .delete(&format!("/api/comments/{}", anon["id"]))
        .authorization_bearer(&root_token)
        .await
        .assert_status_ok();

    let comments = server
        .get(&format!("/api/posts/{}/comments", post_id))
        .await
        .json::<Value>();
    assert!(comments.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_anonymous_comment_update_with_password() {
    let (server, db) = create_test_server().await;
    let (_token, post_id) = setup_post(&server, &db).await;

    let comment = server
        .post("/api/comments")
        .json(&json!({
            "post_id": post_id,
            "content": "anon",
            "nickname": "Guest",
            "author_password": "letmein123",
        }))
        .await
        .json::<Value>();
    let comment_id = comment["id"].as_i64().unwrap();

    server
        .put(&format!("/api/comments/{}", comment_id))
        .json(&json!({"content": "edited", "author_password": "wrong"}))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let response = server
        .put(&format!("/api/comments/{}", comment_id))
        .json(&json!({"content": "edited", "author_password": "letmein123"}))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_comment_on_missing_post() {
    let (server, db) = create_test_server().await;
    create_category(&db, "general", true, false).await;
    let (_alice_id, token) = register_and_login(&server, "alice").await;

    let response = server
        .post("/api/comments")
        .authorization_bearer(&token)
        .json(&json!({"post_id": 999, "content": "hi"}))
        .await;
    response.assert_status_not_found();
}
