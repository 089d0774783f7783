use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    extract::{Form, State},
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use catalog::{CatalogConfig, HttpCatalog};
use picker::ApiContext;
use serde::Deserialize;
use sessions::SessionStore;
use shared::{
    domain::{GameFilters, SessionId},
    error::{ApiError, ErrorCode},
};
use tracing::{error, info};

mod config;
mod pages;

use config::{load_settings, prepare_database_url};

const SESSION_COOKIE: &str = "sid";

#[derive(Clone)]
struct AppState {
    api: ApiContext,
    sessions: SessionStore,
    session_ttl: chrono::Duration,
}

/// Raw form fields. The optional integers arrive as strings so a blank
/// input and a malformed one can be told apart and reported inline.
#[derive(Debug, Deserialize)]
struct GameForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    player_count: Option<String>,
    #[serde(default)]
    playing_time: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let sessions = SessionStore::new(&database_url).await.map_err(|err| {
        error!(
            %database_url,
            %err,
            "failed to open session database; verify parent directory exists and permissions are correct"
        );
        err
    })?;
    let catalog = HttpCatalog::new(&CatalogConfig {
        base_url: settings.catalog_base_url.clone(),
        timeout: Duration::from_secs(settings.catalog_timeout_seconds),
    })?;

    let state = AppState {
        api: ApiContext {
            catalog: Arc::new(catalog),
        },
        sessions,
        session_ttl: chrono::Duration::seconds(settings.session_ttl_seconds),
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, catalog = %settings.catalog_base_url, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(show_form).post(submit_form))
        .route("/boardgame/", get(show_boardgame))
        .with_state(state)
}

async fn show_form() -> Html<String> {
    Html(pages::form_page("", None, None, None))
}

async fn submit_form(State(state): State<Arc<AppState>>, Form(form): Form<GameForm>) -> Response {
    let username = form.username.trim().to_string();

    let player_count = match parse_optional_count("player count", form.player_count.as_deref()) {
        Ok(v) => v,
        Err(message) => return form_error(&form, &message),
    };
    let playing_time = match parse_optional_count("playing time", form.playing_time.as_deref()) {
        Ok(v) => v,
        Err(message) => return form_error(&form, &message),
    };

    if let Err(err) = picker::validate_username(&state.api, &username).await {
        return match err.code {
            ErrorCode::Validation => form_error(&form, &err.message),
            _ => remote_failure(&err),
        };
    }

    let filters = GameFilters {
        player_count,
        playing_time,
    };
    let session_id = match state
        .sessions
        .create_session(&username, filters, state.session_ttl)
        .await
    {
        Ok(id) => id,
        Err(err) => {
            error!(%err, "failed to store session");
            return internal_failure();
        }
    };

    let cookie = format!(
        "{SESSION_COOKIE}={session_id}; Path=/; HttpOnly; Max-Age={}",
        state.session_ttl.num_seconds()
    );
    (
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Redirect::to("/boardgame/"),
    )
        .into_response()
}

async fn show_boardgame(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let Some(session_id) = session_id_from_headers(&headers) else {
        return Redirect::to("/").into_response();
    };

    let session = match state.sessions.load_session(session_id).await {
        Ok(Some(session)) => session,
        Ok(None) => return Redirect::to("/").into_response(),
        Err(err) => {
            error!(%err, "failed to load session");
            return internal_failure();
        }
    };

    match picker::random_game_for_user(&state.api, &session.username, &session.filters).await {
        Ok(game) => Html(pages::result_page(&game)).into_response(),
        Err(err) if err.code == ErrorCode::NoMatch => {
            Html(pages::no_match_page(&err.message)).into_response()
        }
        Err(err) => remote_failure(&err),
    }
}

fn parse_optional_count(label: &str, raw: Option<&str>) -> Result<Option<u32>, String> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    match raw.parse::<u32>() {
        Ok(0) => Err(format!("{label} must be a positive number")),
        Ok(value) => Ok(Some(value)),
        Err(_) => Err(format!("{label} must be a positive number")),
    }
}

fn form_error(form: &GameForm, message: &str) -> Response {
    let player_count = form
        .player_count
        .as_deref()
        .and_then(|v| v.trim().parse().ok());
    let playing_time = form
        .playing_time
        .as_deref()
        .and_then(|v| v.trim().parse().ok());
    Html(pages::form_page(
        form.username.trim(),
        player_count,
        playing_time,
        Some(message),
    ))
    .into_response()
}

fn remote_failure(err: &ApiError) -> Response {
    error!(%err, "catalog service request failed");
    (
        StatusCode::BAD_GATEWAY,
        Html(pages::error_page(
            "the catalog service could not be reached; try again later",
        )),
    )
        .into_response()
}

fn internal_failure() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(pages::error_page("an internal error occurred")),
    )
        .into_response()
}

fn session_id_from_headers(headers: &HeaderMap) -> Option<SessionId> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == SESSION_COOKIE {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
