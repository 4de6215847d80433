mod common;

use axum::http::StatusCode;
use cms_admin_backend::entities::prelude::*;
use common::{MockStorageService, presign_entry, register_and_login, send, test_app};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_tag_crud_and_duplicates() {
    let (app, _) = test_app(Arc::new(MockStorageService::new())).await;
    let token = register_and_login(&app, "editor").await;

    let (status, tag) = send(
        &app,
        "POST",
        "/api/tags",
        Some(&token),
        Some(json!({ "name": "Rust Tips" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", tag);
    assert_eq!(tag["slug"], "rust-tips");

    // Same name, and a different name colliding on slug
    for name in ["Rust Tips", "rust  tips!"] {
        let (status, body) = send(
            &app,
            "POST",
            "/api/tags",
            Some(&token),
            Some(json!({ "name": name })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT, "{}: {}", name, body);
    }

    let (status, _) = send(
        &app,
        "POST",
        "/api/tags",
        Some(&token),
        Some(json!({ "name": "!!!" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, list) = send(&app, "GET", "/api/tags", Some(&token), None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let uri = format!("/api/tags/{}", tag["id"].as_str().unwrap());
    let (status, _) = send(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_categories_and_subcategories() {
    let (app, state) = test_app(Arc::new(MockStorageService::new())).await;
    let token = register_and_login(&app, "editor").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/categories/missing/subcategories",
        Some(&token),
        Some(json!({ "name": "Async" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, category) = send(
        &app,
        "POST",
        "/api/categories",
        Some(&token),
        Some(json!({ "name": "Guides" })),
    )
    .await;
    let category_id = category["id"].as_str().unwrap();
    let sub_uri = format!("/api/categories/{}/subcategories", category_id);

    let (status, sub) = send(
        &app,
        "POST",
        &sub_uri,
        Some(&token),
        Some(json!({ "name": "Async Rust", "slug": "async" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", sub);
    assert_eq!(sub["slug"], "async");
    assert_eq!(sub["category_id"], category_id);

    let (status, _) = send(
        &app,
        "POST",
        &sub_uri,
        Some(&token),
        Some(json!({ "name": "Async" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, subs) = send(&app, "GET", &sub_uri, Some(&token), None).await;
    assert_eq!(subs.as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/categories/{}", category_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(Subcategories::find().count(&state.db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_post_lifecycle_with_taxonomy_and_seo() {
    let (app, state) = test_app(Arc::new(MockStorageService::new())).await;
    let token = register_and_login(&app, "author").await;

    let (_, tag) = send(&app, "POST", "/api/tags", Some(&token), Some(json!({ "name": "Axum" }))).await;
    let tag_id = tag["id"].as_str().unwrap().to_string();
    let (_, guides) = send(
        &app,
        "POST",
        "/api/categories",
        Some(&token),
        Some(json!({ "name": "Guides" })),
    )
    .await;
    let guides_id = guides["id"].as_str().unwrap().to_string();
    let (_, news) = send(
        &app,
        "POST",
        "/api/categories",
        Some(&token),
        Some(json!({ "name": "News" })),
    )
    .await;
    let news_id = news["id"].as_str().unwrap().to_string();
    let (_, sub) = send(
        &app,
        "POST",
        &format!("/api/categories/{}/subcategories", guides_id),
        Some(&token),
        Some(json!({ "name": "Web" })),
    )
    .await;
    let sub_id = sub["id"].as_str().unwrap().to_string();

    // Subcategory from another category
    let (status, _) = send(
        &app,
        "POST",
        "/api/posts",
        Some(&token),
        Some(json!({
            "title": "Hello Axum",
            "category_id": news_id,
            "subcategory_id": sub_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/posts",
        Some(&token),
        Some(json!({ "title": "Hello Axum", "tag_ids": ["nope"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/posts",
        Some(&token),
        Some(json!({ "title": "Hello Axum", "seo": { "canonical_url": "/relative" } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, post) = send(
        &app,
        "POST",
        "/api/posts",
        Some(&token),
        Some(json!({
            "title": "Hello Axum",
            "content": "<p>Routing basics</p>",
            "category_id": guides_id,
            "subcategory_id": sub_id,
            "tag_ids": [tag_id, tag_id],
            "seo": {
                "meta_title": "Hello Axum",
                "canonical_url": "https://blog.example.com/hello-axum",
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", post);
    assert_eq!(post["slug"], "hello-axum");
    assert_eq!(post["status"], "draft");
    assert!(post["published_at"].is_null());
    assert_eq!(post["tags"].as_array().unwrap().len(), 1);
    assert_eq!(post["seo"]["canonical_url"], "https://blog.example.com/hello-axum");
    let post_uri = format!("/api/posts/{}", post["id"].as_str().unwrap());

    let (status, _) = send(
        &app,
        "POST",
        "/api/posts",
        Some(&token),
        Some(json!({ "title": "Hello, Axum!" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, published) = send(
        &app,
        "PUT",
        &post_uri,
        Some(&token),
        Some(json!({ "status": "published", "tag_ids": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", published);
    assert_eq!(published["status"], "published");
    assert!(published["tags"].as_array().unwrap().is_empty());
    let first_published_at = published["published_at"].clone();
    assert!(first_published_at.is_string());

    // Unpublish and publish again: the first publication date sticks
    send(&app, "PUT", &post_uri, Some(&token), Some(json!({ "status": "draft" }))).await;
    let (_, again) = send(
        &app,
        "PUT",
        &post_uri,
        Some(&token),
        Some(json!({ "status": "published" })),
    )
    .await;
    assert_eq!(again["published_at"], first_published_at);

    // Moving category drops the subcategory that belonged to the old one
    let (status, moved) = send(
        &app,
        "PUT",
        &post_uri,
        Some(&token),
        Some(json!({ "category_id": news_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", moved);
    assert!(moved["subcategory_id"].is_null());

    let (_, listed) = send(&app, "GET", "/api/posts?status=published", Some(&token), None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "DELETE", &post_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(PostTags::find().count(&state.db).await.unwrap(), 0);
    assert_eq!(SeoMetadata::find().count(&state.db).await.unwrap(), 0);

    let (status, _) = send(&app, "GET", &post_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_tag_unlinks_posts() {
    let (app, state) = test_app(Arc::new(MockStorageService::new())).await;
    let token = register_and_login(&app, "author").await;

    let (_, tag) = send(&app, "POST", "/api/tags", Some(&token), Some(json!({ "name": "Tokio" }))).await;
    let (status, post) = send(
        &app,
        "POST",
        "/api/posts",
        Some(&token),
        Some(json!({ "title": "Runtime internals", "tag_ids": [tag["id"]] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(PostTags::find().count(&state.db).await.unwrap(), 1);

    send(
        &app,
        "DELETE",
        &format!("/api/tags/{}", tag["id"].as_str().unwrap()),
        Some(&token),
        None,
    )
    .await;

    let (_, reloaded) = send(
        &app,
        "GET",
        &format!("/api/posts/{}", post["id"].as_str().unwrap()),
        Some(&token),
        None,
    )
    .await;
    assert!(reloaded["tags"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_register_rules() {
    let (app, _) = test_app(Arc::new(MockStorageService::new())).await;
    register_and_login(&app, "taken").await;

    let (status, _) = send(
        &app,
        "POST",
        "/register",
        None,
        Some(json!({ "username": "taken", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        "POST",
        "/register",
        None,
        Some(json!({ "username": "shortpw", "password": "123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({ "username": "taken", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cover_must_be_a_confirmed_asset_of_the_editor() {
    let storage = Arc::new(MockStorageService::new());
    let (app, _) = test_app(storage.clone()).await;
    let author = register_and_login(&app, "author").await;
    let other = register_and_login(&app, "other").await;

    let (_, grants) = send(
        &app,
        "PUT",
        "/api/assets",
        Some(&author),
        Some(json!([presign_entry("assets/cover.png", b"cover")])),
    )
    .await;
    let cover_id = grants[0]["database_id"].as_str().unwrap().to_string();

    // Still pending: the upload was never confirmed
    let (status, _) = send(
        &app,
        "POST",
        "/api/posts",
        Some(&author),
        Some(json!({ "title": "With cover", "cover_asset_id": cover_id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    storage.put("assets/cover.png", b"cover");
    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/assets/{}/confirm", cover_id),
        Some(&author),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "POST",
        "/api/posts",
        Some(&other),
        Some(json!({ "title": "Borrowed cover", "cover_asset_id": cover_id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, post) = send(
        &app,
        "POST",
        "/api/posts",
        Some(&author),
        Some(json!({ "title": "With cover", "cover_asset_id": cover_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", post);
    let post_uri = format!("/api/posts/{}", post["id"].as_str().unwrap());

    // Another editor can still change the post without touching its cover
    let (status, edited) = send(
        &app,
        "PUT",
        &post_uri,
        Some(&other),
        Some(json!({ "title": "With cover, edited" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", edited);
    assert_eq!(edited["cover_asset_id"], cover_id);

    let (status, _) = send(
        &app,
        "DELETE",
        "/api/assets",
        Some(&author),
        Some(json!({ "key": "assets/cover.png" })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, reloaded) = send(&app, "GET", &post_uri, Some(&author), None).await;
    assert!(reloaded["cover_asset_id"].is_null());
}
