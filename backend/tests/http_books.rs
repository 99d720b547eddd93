//! Book and category endpoints.

mod support;

use axum::http::StatusCode;
use bookcase::cache::{AUTHOR_MENU_KEY, BOOK_MENU_KEY};
use serde_json::json;
use support::TestApp;

#[tokio::test]
async fn test_create_book_with_category_and_images() {
    let app = TestApp::new();
    let category = app.create("/category/create", json!({"name": "Science Fiction"})).await;

    let (status, book) = app
        .post(
            "/book/create",
            json!({
                "name": "Solaris",
                "avatar": "covers/solaris.png",
                "published_day": "1961-06-01",
                "category_id": category,
                "images": ["pages/solaris-1.png", "pages/solaris-2.png"]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(book["pdf"], serde_json::Value::Null);
    assert_eq!(book["images"].as_array().unwrap().len(), 2);

    let id = book["id"].as_i64().unwrap();
    let (status, detail) = app.get(&format!("/book/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["name"], "Solaris");
    assert_eq!(detail["published_day"], "1961-06-01");
    assert_eq!(detail["category"]["name"], "Science Fiction");
    assert_eq!(detail["authors"], json!([]));
    assert_eq!(detail["images"][1], "pages/solaris-2.png");
}

#[tokio::test]
async fn test_book_body_checks() {
    let app = TestApp::new();

    let (status, body) = app
        .post(
            "/book/create",
            json!({"name": "Escape", "images": ["ok.png", "../etc/passwd"]}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "images[1]");

    let (status, body) = app
        .post("/book/create", json!({"name": "   "}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "name");

    let (status, body) = app
        .post(
            "/book/create",
            json!({"name": "Bad Date", "published_day": "yesterday"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "published_day");
}

#[tokio::test]
async fn test_unknown_category_is_foreign_key_error() {
    let app = TestApp::new();
    let (status, body) = app
        .post("/book/create", json!({"name": "Orphan", "category_id": 4242}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "FOREIGN_KEY");
}

#[tokio::test]
async fn test_list_books_by_category() {
    let app = TestApp::new();
    let poetry = app.create("/category/create", json!({"name": "Poetry"})).await;
    app.create("/book/create", json!({"name": "Ariel", "category_id": poetry}))
        .await;
    app.create_book("Untagged").await;

    let (status, all) = app.get("/book").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all["total"], 2);

    let (status, filtered) = app.get(&format!("/book?category_id={}", poetry)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(filtered["total"], 1);
    assert_eq!(filtered["items"][0]["name"], "Ariel");
}

#[tokio::test]
async fn test_update_book_replaces_images() {
    let app = TestApp::new();
    let id = app
        .create(
            "/book/create",
            json!({"name": "Ficciones", "images": ["a.png", "b.png"]}),
        )
        .await;

    let (status, book) = app
        .put(&format!("/book/{}", id), json!({"images": ["c.png"]}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(book["images"], json!(["c.png"]));
    assert_eq!(book["name"], "Ficciones");
}

#[tokio::test]
async fn test_set_pdf() {
    let app = TestApp::new();
    let id = app.create_book("Dune").await;
    app.cache.seed(BOOK_MENU_KEY, vec!["{}".to_string()]);

    let (status, body) = app
        .put(&format!("/book/{}/pdf", id), json!({"pdf": "pdf/dune.epub"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "pdf");

    let (status, book) = app
        .put(&format!("/book/{}/pdf", id), json!({"pdf": "pdf/dune.pdf"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(book["pdf"], "pdf/dune.pdf");

    // The menu does not carry the pdf, so it stays cached.
    assert!(app.cache.snapshot(BOOK_MENU_KEY).is_some());
}

#[tokio::test]
async fn test_set_pdf_ignores_surrounding_whitespace() {
    let app = TestApp::new();
    let id = app.create_book("Dune").await;

    let (status, book) = app
        .put(&format!("/book/{}/pdf", id), json!({"pdf": " pdf/dune.pdf "}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(book["pdf"], "pdf/dune.pdf");
}

#[tokio::test]
async fn test_book_patch_without_values_rejected() {
    let app = TestApp::new();
    let id = app.create_book("Hyperion").await;
    app.cache.seed(BOOK_MENU_KEY, vec!["{}".to_string()]);

    let (status, body) = app
        .put(&format!("/book/{}", id), json!({"name": null, "images": null}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["errors"][0]["field"], ".");
    assert!(app.cache.snapshot(BOOK_MENU_KEY).is_some());
}

#[tokio::test]
async fn test_set_authors_and_book_menu() {
    let app = TestApp::new();
    let lem = app.create_author("Lem").await;
    let strugatsky = app.create_author("Strugatsky").await;
    let book = app.create_book("Roadside Picnic").await;
    app.create_book("No Authors Yet").await;

    let (status, detail) = app
        .put(
            &format!("/book/{}/authors", book),
            json!({"author_ids": [strugatsky, lem]}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["authors"].as_array().unwrap().len(), 2);

    let (status, menu) = app.get("/book/menu").await;
    assert_eq!(status, StatusCode::OK);
    let menu = menu.as_array().unwrap();
    assert_eq!(menu.len(), 1);
    assert_eq!(menu[0]["name"], "Roadside Picnic");
    assert!(app.cache.snapshot(BOOK_MENU_KEY).is_some());

    let (status, _) = app
        .put(&format!("/book/{}/authors", book), json!({"author_ids": [lem]}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.cache.snapshot(BOOK_MENU_KEY).is_none());

    let (_, menu) = app.get("/book/menu").await;
    assert_eq!(menu[0]["authors"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_set_authors_rejects_unknown_and_duplicate_ids() {
    let app = TestApp::new();
    let author = app.create_author("Known").await;
    let book = app.create_book("Linked").await;

    let (status, body) = app
        .put(
            &format!("/book/{}/authors", book),
            json!({"author_ids": [author, 9999]}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "FOREIGN_KEY");

    let (status, body) = app
        .put(
            &format!("/book/{}/authors", book),
            json!({"author_ids": [author, author]}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_delete_book() {
    let app = TestApp::new();
    let id = app.create_book("Gone").await;
    app.cache.seed(BOOK_MENU_KEY, vec!["{}".to_string()]);
    app.cache.seed(AUTHOR_MENU_KEY, vec!["{}".to_string()]);

    let (status, _) = app.delete(&format!("/book/{}", id)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(app.cache.snapshot(BOOK_MENU_KEY).is_none());
    assert!(app.cache.snapshot(AUTHOR_MENU_KEY).is_some());

    let (status, _) = app.get(&format!("/book/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_category_lifecycle() {
    let app = TestApp::new();
    let id = app.create("/category/create", json!({"name": "Essays"})).await;

    let (status, renamed) = app
        .put(&format!("/category/{}", id), json!({"name": "Essays & Letters"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["name"], "Essays & Letters");

    let book = app
        .create("/book/create", json!({"name": "Letters", "category_id": id}))
        .await;
    let (status, body) = app.delete(&format!("/category/{}", id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "FOREIGN_KEY");

    app.delete(&format!("/book/{}", book)).await;
    let (status, _) = app.delete(&format!("/category/{}", id)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, categories) = app.get("/category").await;
    assert_eq!(categories, json!([]));
}
