use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one browser session across the form → result flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// One entry of a user's owned collection, as reported by the remote
/// catalog service. Fields the service leaves out stay `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub name: String,
    pub image: Option<String>,
    pub min_players: Option<u32>,
    pub max_players: Option<u32>,
    pub playing_time: Option<u32>,
}

/// Optional constraints applied before the random pick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameFilters {
    /// Desired player count; a game qualifies when
    /// `min_players <= player_count <= max_players`.
    pub player_count: Option<u32>,
    /// Upper bound on the game's playing time, in minutes.
    pub playing_time: Option<u32>,
}

impl GameFilters {
    pub fn is_empty(&self) -> bool {
        self.player_count.is_none() && self.playing_time.is_none()
    }
}
