use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use bookshelf_http::error::AppError;

use super::models::BookPayload;
use super::store::{ListFilter, Shelf, ShelfError};

#[derive(Clone)]
struct BooksState {
    shelf: Arc<Shelf>,
}

/// Build the books router with its store bound as state.
pub fn router(shelf: Arc<Shelf>) -> Router {
    Router::new()
        .route("/", get(list_books).post(add_book))
        .route(
            "/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(BooksState { shelf })
}

/// Raw query parameters of the list endpoint. Flags arrive as strings so that
/// unrecognized values can fall through instead of failing extraction.
#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    reading: Option<String>,
    finished: Option<String>,
    name: Option<String>,
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

/// Only the first recognized dimension is honored: reading, then finished,
/// then name. A flag with an unrecognized value or an empty name does not
/// count as recognized.
fn filter_from_query(query: &ListQuery) -> ListFilter {
    if let Some(flag) = query.reading.as_deref().and_then(parse_flag) {
        return ListFilter::Reading(flag);
    }
    if let Some(flag) = query.finished.as_deref().and_then(parse_flag) {
        return ListFilter::Finished(flag);
    }
    if let Some(needle) = query.name.as_deref().filter(|name| !name.is_empty()) {
        return ListFilter::NameContains(needle.to_string());
    }
    ListFilter::All
}

fn add_failure(err: ShelfError) -> AppError {
    match err {
        ShelfError::MissingName => {
            AppError::validation("Failed to add book. Please fill in the book name")
        }
        ShelfError::ReadPageExceedsPageCount => {
            AppError::validation("Failed to add book. readPage must not be greater than pageCount")
        }
        other => AppError::Internal(anyhow::anyhow!(other)),
    }
}

fn update_failure(err: ShelfError) -> AppError {
    match err {
        ShelfError::MissingName => {
            AppError::validation("Failed to update book. Please fill in the book name")
        }
        ShelfError::ReadPageExceedsPageCount => AppError::validation(
            "Failed to update book. readPage must not be greater than pageCount",
        ),
        ShelfError::NotFound => AppError::not_found("Failed to update book. Id not found"),
        other => AppError::Internal(anyhow::anyhow!(other)),
    }
}

async fn add_book(
    State(state): State<BooksState>,
    Json(payload): Json<BookPayload>,
) -> Result<impl IntoResponse, AppError> {
    let id = state.shelf.add(payload).map_err(add_failure)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": "Book added successfully",
            "data": { "bookId": id }
        })),
    ))
}

async fn list_books(
    State(state): State<BooksState>,
    Query(query): Query<ListQuery>,
) -> Json<serde_json::Value> {
    let books = state.shelf.list(&filter_from_query(&query));

    Json(json!({
        "status": "success",
        "data": { "books": books }
    }))
}

async fn get_book(
    State(state): State<BooksState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let book = state
        .shelf
        .get(&id)
        .map_err(|_| AppError::not_found("Book not found"))?;

    Ok(Json(json!({
        "status": "success",
        "data": { "book": book }
    })))
}

async fn update_book(
    State(state): State<BooksState>,
    Path(id): Path<String>,
    Json(payload): Json<BookPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.shelf.update(&id, payload).map_err(update_failure)?;

    Ok(Json(json!({
        "status": "success",
        "message": "Book updated successfully"
    })))
}

async fn delete_book(
    State(state): State<BooksState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    state
        .shelf
        .delete(&id)
        .map_err(|_| AppError::not_found("Failed to delete book. Id not found"))?;

    Ok(Json(json!({
        "status": "success",
        "message": "Book deleted successfully"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::Value;
    use std::sync::atomic::{AtomicI64, Ordering};
    use time::OffsetDateTime;
    use tower::ServiceExt;

    use bookshelf_kernel::Clock;

    #[derive(Default)]
    struct StepClock {
        ticks: AtomicI64,
    }

    impl Clock for StepClock {
        fn now_utc(&self) -> OffsetDateTime {
            let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
            OffsetDateTime::from_unix_timestamp(1_700_000_000 + tick).unwrap()
        }
    }

    fn test_router() -> Router {
        router(Arc::new(Shelf::new(Arc::new(StepClock::default()))))
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn sample_book(name: &str, page_count: u32, read_page: u32, reading: bool) -> Value {
        json!({
            "name": name,
            "year": 2010,
            "author": "Author",
            "summary": "Summary",
            "publisher": "Publisher",
            "pageCount": page_count,
            "readPage": read_page,
            "reading": reading,
        })
    }

    async fn add(router: &Router, book: Value) -> String {
        let (status, body) = send(router, json_request("POST", "/", book)).await;
        assert_eq!(status, StatusCode::CREATED);
        body["data"]["bookId"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn add_returns_created_with_book_id() {
        let router = test_router();

        let (status, body) = send(
            &router,
            json_request("POST", "/", sample_book("Harry Potter", 200, 200, false)),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "Book added successfully");
        assert!(body["data"]["bookId"].is_string());
    }

    #[tokio::test]
    async fn add_without_name_is_a_400_fail() {
        let router = test_router();

        let (status, body) = send(&router, json_request("POST", "/", json!({}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "fail");
        assert_eq!(
            body["message"],
            "Failed to add book. Please fill in the book name"
        );

        let (_, list) = send(&router, get_request("/")).await;
        assert_eq!(list["data"]["books"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn add_with_excessive_read_page_is_a_400_fail() {
        let router = test_router();

        let (status, body) = send(
            &router,
            json_request("POST", "/", sample_book("Book", 100, 101, false)),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "fail");
        assert_eq!(
            body["message"],
            "Failed to add book. readPage must not be greater than pageCount"
        );
    }

    #[tokio::test]
    async fn get_by_id_returns_the_full_record() {
        let router = test_router();
        let id = add(&router, sample_book("Harry Potter", 200, 200, false)).await;

        let (status, body) = send(&router, get_request(&format!("/{id}"))).await;

        assert_eq!(status, StatusCode::OK);
        let book = &body["data"]["book"];
        assert_eq!(book["id"], id.as_str());
        assert_eq!(book["name"], "Harry Potter");
        assert_eq!(book["pageCount"], 200);
        assert_eq!(book["readPage"], 200);
        assert_eq!(book["finished"], true);
        assert!(book["insertedAt"].is_string());
        assert_eq!(book["insertedAt"], book["updatedAt"]);
    }

    #[tokio::test]
    async fn get_unknown_id_is_a_404_fail() {
        let router = test_router();

        let (status, body) = send(&router, get_request("/missing")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "fail");
        assert_eq!(body["message"], "Book not found");
    }

    #[tokio::test]
    async fn list_honors_reading_filter() {
        let router = test_router();
        let reading = add(&router, sample_book("Reading", 100, 10, true)).await;
        add(&router, sample_book("Shelved", 100, 10, false)).await;

        let (status, body) = send(&router, get_request("/?reading=1")).await;

        assert_eq!(status, StatusCode::OK);
        let books = body["data"]["books"].as_array().unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0]["id"], reading.as_str());
        assert_eq!(
            books[0].as_object().unwrap().keys().collect::<Vec<_>>(),
            vec!["id", "name", "publisher"]
        );
    }

    #[tokio::test]
    async fn list_honors_finished_filter_with_numeric_flag() {
        let router = test_router();
        let done = add(&router, sample_book("Done", 200, 200, false)).await;
        add(&router, sample_book("Open", 200, 10, false)).await;

        let (_, body) = send(&router, get_request("/?finished=1")).await;

        let books = body["data"]["books"].as_array().unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0]["id"], done.as_str());
    }

    #[tokio::test]
    async fn list_uses_first_recognized_dimension() {
        let router = test_router();
        let reading = add(&router, sample_book("Alpha", 200, 200, true)).await;
        add(&router, sample_book("Beta", 200, 200, false)).await;

        // reading wins over finished and name.
        let (_, body) = send(&router, get_request("/?reading=1&finished=0&name=Beta")).await;

        let books = body["data"]["books"].as_array().unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0]["id"], reading.as_str());
    }

    #[tokio::test]
    async fn unrecognized_flag_value_falls_through() {
        let router = test_router();
        let done = add(&router, sample_book("Done", 200, 200, false)).await;
        add(&router, sample_book("Open", 200, 10, true)).await;

        // reading=2 is not a recognized flag, so finished=1 applies.
        let (_, body) = send(&router, get_request("/?reading=2&finished=1")).await;

        let books = body["data"]["books"].as_array().unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0]["id"], done.as_str());
    }

    #[tokio::test]
    async fn name_filter_without_matches_is_an_empty_success() {
        let router = test_router();
        add(&router, sample_book("Harry Potter", 100, 10, false)).await;

        let (status, body) = send(&router, get_request("/?name=tolkien")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["books"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn update_round_trips_through_get() {
        let router = test_router();
        let id = add(&router, sample_book("Old", 100, 10, false)).await;

        let (status, body) = send(
            &router,
            json_request(
                "PUT",
                &format!("/{id}"),
                sample_book("New name", 300, 150, true),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Book updated successfully");

        let (_, body) = send(&router, get_request(&format!("/{id}"))).await;
        let book = &body["data"]["book"];
        assert_eq!(book["name"], "New name");
        assert_eq!(book["pageCount"], 300);
        assert_eq!(book["readPage"], 150);
        assert_eq!(book["reading"], true);
        assert_ne!(book["insertedAt"], book["updatedAt"]);
    }

    #[tokio::test]
    async fn update_unknown_id_is_a_404_fail() {
        let router = test_router();

        let (status, body) = send(
            &router,
            json_request("PUT", "/missing", sample_book("Book", 100, 10, false)),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Failed to update book. Id not found");
    }

    #[tokio::test]
    async fn update_validation_outranks_missing_id() {
        let router = test_router();

        let (status, body) = send(&router, json_request("PUT", "/missing", json!({}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["message"],
            "Failed to update book. Please fill in the book name"
        );
    }

    #[tokio::test]
    async fn delete_removes_the_book() {
        let router = test_router();
        let id = add(&router, sample_book("Book", 100, 10, false)).await;

        let (status, body) = send(
            &router,
            Request::builder()
                .method("DELETE")
                .uri(format!("/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Book deleted successfully");

        let (status, _) = send(&router, get_request(&format!("/{id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_unknown_id_is_a_404_fail() {
        let router = test_router();

        let (status, body) = send(
            &router,
            Request::builder()
                .method("DELETE")
                .uri("/missing")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Failed to delete book. Id not found");
    }

    #[test]
    fn filter_precedence_is_reading_finished_name() {
        let query = ListQuery {
            reading: Some("0".to_string()),
            finished: Some("1".to_string()),
            name: Some("dune".to_string()),
        };
        assert_eq!(filter_from_query(&query), ListFilter::Reading(false));

        let query = ListQuery {
            reading: None,
            finished: Some("true".to_string()),
            name: Some("dune".to_string()),
        };
        assert_eq!(filter_from_query(&query), ListFilter::Finished(true));

        let query = ListQuery {
            reading: None,
            finished: None,
            name: Some("dune".to_string()),
        };
        assert_eq!(
            filter_from_query(&query),
            ListFilter::NameContains("dune".to_string())
        );
    }

    #[test]
    fn empty_name_is_not_a_recognized_dimension() {
        let query = ListQuery {
            reading: None,
            finished: None,
            name: Some(String::new()),
        };
        assert_eq!(filter_from_query(&query), ListFilter::All);
    }

    #[test]
    fn flags_accept_numeric_and_boolean_spellings() {
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("true"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("false"), Some(false));
        assert_eq!(parse_flag("2"), None);
        assert_eq!(parse_flag(""), None);
    }
}
