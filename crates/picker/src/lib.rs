use std::sync::Arc;

use catalog::{CatalogError, CatalogService};
use rand::{seq::SliceRandom, Rng};
use shared::{
    domain::{Game, GameFilters},
    error::{ApiError, ErrorCode},
};
use thiserror::Error;
use tracing::info;

#[derive(Clone)]
pub struct ApiContext {
    pub catalog: Arc<dyn CatalogService>,
}

/// Selection over an empty candidate set is an explicit outcome, not a
/// panic. The two variants only differ in wording on the result page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SelectError {
    #[error("the collection has no entries")]
    EmptyCollection,
    #[error("no game in the collection matches the filters")]
    NoMatch,
}

/// Whether a game satisfies the active filters. A game missing the field a
/// filter looks at does not qualify; with no filters everything does.
pub fn qualifies(game: &Game, filters: &GameFilters) -> bool {
    if let Some(player_count) = filters.player_count {
        match (game.min_players, game.max_players) {
            (Some(min), Some(max)) if min <= player_count && player_count <= max => {}
            _ => return false,
        }
    }
    if let Some(limit) = filters.playing_time {
        match game.playing_time {
            Some(time) if time <= limit => {}
            _ => return false,
        }
    }
    true
}

/// Uniform random pick among the qualifying entries, driven by the caller's
/// rng so tests can seed it.
pub fn select_random_with(
    collection: &[Game],
    filters: &GameFilters,
    rng: &mut impl Rng,
) -> Result<Game, SelectError> {
    if collection.is_empty() {
        return Err(SelectError::EmptyCollection);
    }
    if filters.is_empty() {
        return collection
            .choose(rng)
            .cloned()
            .ok_or(SelectError::EmptyCollection);
    }

    let candidates: Vec<&Game> = collection
        .iter()
        .filter(|game| qualifies(game, filters))
        .collect();
    candidates
        .choose(rng)
        .map(|game| (*game).clone())
        .ok_or(SelectError::NoMatch)
}

pub fn select_random(collection: &[Game], filters: &GameFilters) -> Result<Game, SelectError> {
    select_random_with(collection, filters, &mut rand::thread_rng())
}

/// Form-side validation: the username must be non-empty and known to the
/// catalog service.
pub async fn validate_username(ctx: &ApiContext, username: &str) -> Result<(), ApiError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(ApiError::new(ErrorCode::Validation, "username is required"));
    }
    let exists = ctx.catalog.user_exists(username).await.map_err(upstream)?;
    if !exists {
        return Err(ApiError::new(
            ErrorCode::Validation,
            format!("no catalog user named '{username}'"),
        ));
    }
    Ok(())
}

/// Result-side operation: fetch the owned collection and pick one entry.
pub async fn random_game_for_user(
    ctx: &ApiContext,
    username: &str,
    filters: &GameFilters,
) -> Result<Game, ApiError> {
    let collection = ctx
        .catalog
        .owned_collection(username)
        .await
        .map_err(upstream)?;
    info!(username, owned = collection.len(), "picking a game");
    select_random(&collection, filters)
        .map_err(|err| ApiError::new(ErrorCode::NoMatch, err.to_string()))
}

fn upstream(err: CatalogError) -> ApiError {
    ApiError::new(ErrorCode::Upstream, err.to_string())
}
