use super::*;

use async_trait::async_trait;
use axum::{body::Body, http::Request};
use catalog::{CatalogError, CatalogService};
use shared::domain::Game;
use tower::ServiceExt;

struct FakeCatalog {
    known_user: &'static str,
    collection: Vec<Game>,
}

#[async_trait]
impl CatalogService for FakeCatalog {
    async fn user_exists(&self, username: &str) -> Result<bool, CatalogError> {
        Ok(username == self.known_user)
    }

    async fn owned_collection(&self, _username: &str) -> Result<Vec<Game>, CatalogError> {
        Ok(self.collection.clone())
    }
}

fn game(name: &str, min: u32, max: u32, time: u32) -> Game {
    Game {
        name: name.into(),
        image: None,
        min_players: Some(min),
        max_players: Some(max),
        playing_time: Some(time),
    }
}

async fn test_app(collection: Vec<Game>) -> Router {
    let sessions = SessionStore::new("sqlite::memory:").await.expect("db");
    let state = AppState {
        api: ApiContext {
            catalog: Arc::new(FakeCatalog {
                known_user: "alice",
                collection,
            }),
        },
        sessions,
        session_ttl: chrono::Duration::minutes(30),
    };
    build_router(Arc::new(state))
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8")
}

fn post_form(body: &str) -> Request<Body> {
    Request::post("/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .expect("request")
}

#[tokio::test]
async fn entry_page_renders_the_form() {
    let app = test_app(vec![]).await;
    let response = app
        .oneshot(Request::get("/").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("<form method=\"post\""));
    assert!(body.contains("name=\"username\""));
}

#[tokio::test]
async fn unknown_username_redisplays_the_form_with_an_error() {
    let app = test_app(vec![]).await;
    let response = app
        .oneshot(post_form("username=mallory"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::LOCATION).is_none());
    let body = body_text(response).await;
    assert!(body.contains("no catalog user named"));
    assert!(body.contains("value=\"mallory\""));
}

#[tokio::test]
async fn blank_username_redisplays_the_form_with_an_error() {
    let app = test_app(vec![]).await;
    let response = app
        .oneshot(post_form("username=++"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("username is required"));
}

#[tokio::test]
async fn malformed_player_count_redisplays_the_form() {
    let app = test_app(vec![]).await;
    let response = app
        .oneshot(post_form("username=alice&player_count=abc"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("player count must be a positive number"));
}

#[tokio::test]
async fn zero_playing_time_redisplays_the_form() {
    let app = test_app(vec![]).await;
    let response = app
        .oneshot(post_form("username=alice&playing_time=0"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("playing time must be a positive number"));
}

#[tokio::test]
async fn valid_submission_sets_a_cookie_and_redirects() {
    let app = test_app(vec![game("Cascadia", 1, 4, 45)]).await;
    let response = app
        .oneshot(post_form("username=alice&player_count=2&playing_time="))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok()),
        Some("/boardgame/")
    );
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("cookie");
    assert!(cookie.starts_with("sid="));
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn result_page_without_a_cookie_redirects_home() {
    let app = test_app(vec![]).await;
    let response = app
        .oneshot(
            Request::get("/boardgame/")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok()),
        Some("/")
    );
}

#[tokio::test]
async fn result_page_with_an_unknown_cookie_redirects_home() {
    let app = test_app(vec![]).await;
    let response = app
        .oneshot(
            Request::get("/boardgame/")
                .header(header::COOKIE, "sid=not-a-session")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn full_flow_renders_the_picked_game() {
    let app = test_app(vec![game("Cascadia", 1, 4, 45)]).await;

    let submitted = app
        .clone()
        .oneshot(post_form("username=alice"))
        .await
        .expect("response");
    assert_eq!(submitted.status(), StatusCode::SEE_OTHER);
    let cookie = submitted
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .expect("cookie")
        .to_string();

    let response = app
        .oneshot(
            Request::get("/boardgame/")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Cascadia"));
    assert!(body.contains("45 minutes"));
}

#[tokio::test]
async fn filters_with_no_qualifying_game_render_the_no_match_page() {
    let app = test_app(vec![game("Onirim", 1, 2, 20)]).await;

    let submitted = app
        .clone()
        .oneshot(post_form("username=alice&player_count=5"))
        .await
        .expect("response");
    let cookie = submitted
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .expect("cookie")
        .to_string();

    let response = app
        .oneshot(
            Request::get("/boardgame/")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("No game found"));
}

#[tokio::test]
async fn empty_collection_renders_the_no_match_page() {
    let app = test_app(vec![]).await;

    let submitted = app
        .clone()
        .oneshot(post_form("username=alice"))
        .await
        .expect("response");
    let cookie = submitted
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .expect("cookie")
        .to_string();

    let response = app
        .oneshot(
            Request::get("/boardgame/")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("No game found"));
}
