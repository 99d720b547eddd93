//! Reader and reader-list endpoints, including the published list events.

mod support;

use axum::http::StatusCode;
use bookcase::models::ListKind;
use serde_json::json;
use support::TestApp;

#[tokio::test]
async fn test_create_reader_normalizes_email() {
    let app = TestApp::new();
    let (status, reader) = app
        .post(
            "/reader/create",
            json!({"name": "Ada", "email": " Ada@Example.ORG "}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reader["email"], "ada@example.org");

    let (status, body) = app
        .post(
            "/reader/create",
            json!({"name": "Ada again", "email": "ada@example.org"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "CONFLICT");

    let (status, body) = app
        .post("/reader/create", json!({"name": "Bob", "email": "bob"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "email");
}

#[tokio::test]
async fn test_add_to_list_publishes_whole_list() {
    let app = TestApp::new();
    let reader = app.create_reader("ada@example.org").await;
    let first = app.create_book("Kindred").await;
    let second = app.create_book("Dawn").await;

    let (status, list) = app
        .post(&format!("/reader/{}/favorites", reader), json!({"book_id": first}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(list["kind"], "favorites");
    assert_eq!(list["books"].as_array().unwrap().len(), 1);

    let (status, list) = app
        .post(&format!("/reader/{}/favorites", reader), json!({"book_id": second}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    // Newest first.
    assert_eq!(list["books"][0]["book"]["name"], "Dawn");
    assert_eq!(list["books"][1]["book"]["name"], "Kindred");

    let published = app.events.published();
    assert_eq!(published.len(), 2);
    let last = &published[1];
    assert_eq!(last.event, "favorite_books");
    assert_eq!(last.kind, ListKind::Favorites);
    assert_eq!(last.reader_id.value(), reader);
    assert_eq!(last.books.len(), 2);
}

#[tokio::test]
async fn test_lists_are_independent() {
    let app = TestApp::new();
    let reader = app.create_reader("ada@example.org").await;
    let book = app.create_book("Parable of the Sower").await;

    let (status, _) = app
        .post(&format!("/reader/{}/read-late", reader), json!({"book_id": book}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(app.events.published()[0].event, "read_late");

    let (status, list) = app.get(&format!("/reader/{}/used-read", reader)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["books"], json!([]));

    let (status, list) = app.get(&format!("/reader/{}/read-late", reader)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["books"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_duplicate_and_unknown_book_rejected() {
    let app = TestApp::new();
    let reader = app.create_reader("ada@example.org").await;
    let book = app.create_book("Fledgling").await;
    let uri = format!("/reader/{}/used-read", reader);

    app.post(&uri, json!({"book_id": book})).await;
    let (status, body) = app.post(&uri, json!({"book_id": book})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "CONFLICT");

    let (status, body) = app.post(&uri, json!({"book_id": 31337})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "FOREIGN_KEY");

    // Only the successful add was published.
    assert_eq!(app.events.published().len(), 1);
}

#[tokio::test]
async fn test_remove_from_list() {
    let app = TestApp::new();
    let reader = app.create_reader("ada@example.org").await;
    let book = app.create_book("Wild Seed").await;
    app.post(&format!("/reader/{}/favorites", reader), json!({"book_id": book}))
        .await;
    app.events.clear();

    let (status, list) = app
        .delete(&format!("/reader/{}/favorites/{}", reader, book))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["books"], json!([]));

    let published = app.events.published();
    assert_eq!(published.len(), 1);
    assert!(published[0].books.is_empty());

    let (status, body) = app
        .delete(&format!("/reader/{}/favorites/{}", reader, book))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(app.events.published().len(), 1);
}

#[tokio::test]
async fn test_unknown_list_kind_and_reader() {
    let app = TestApp::new();
    let reader = app.create_reader("ada@example.org").await;

    let (status, body) = app.get(&format!("/reader/{}/wishlist", reader)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "unknown list 'wishlist'");

    let (status, _) = app.get("/reader/4040/favorites").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/reader/4040").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, reader_body) = app.get(&format!("/reader/{}", reader)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reader_body["email"], "ada@example.org");
}

#[tokio::test]
async fn test_deleting_book_drops_it_from_lists() {
    let app = TestApp::new();
    let reader = app.create_reader("ada@example.org").await;
    let book = app.create_book("Lilith's Brood").await;
    app.post(&format!("/reader/{}/favorites", reader), json!({"book_id": book}))
        .await;

    let (status, _) = app.delete(&format!("/book/{}", book)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, list) = app.get(&format!("/reader/{}/favorites", reader)).await;
    assert_eq!(list["books"], json!([]));
}
