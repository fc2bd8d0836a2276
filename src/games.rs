use std::collections::BTreeSet;
use std::fmt;

use rusqlite::Connection;
use serde::Serialize;

use crate::config::BloomConfig;
use crate::db::{self, GameLogRecord, GameScope, PlayerInfoRecord, UserRecord};
use crate::domain::outcome::WinStatus;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlayerSide {
    #[serde(skip)]
    pub user_id: i64,
    pub username: String,
    pub winner: bool,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GameView {
    pub id: i64,
    pub game_hash: String,
    pub number: i64,
    pub file_name: String,
    pub url: String,
    pub created_at: String,
    pub p1: PlayerSide,
    pub p2: PlayerSide,
}

impl GameView {
    fn sides(&self) -> [&PlayerSide; 2] {
        [&self.p1, &self.p2]
    }

    pub fn win_status_for(&self, user_id: i64) -> WinStatus {
        WinStatus::from_seats(
            self.p1.user_id == user_id,
            self.p2.user_id == user_id,
            self.p1.winner,
        )
    }

    /// Tags from the seats `user_id` played.
    pub fn tags_for(&self, user_id: i64) -> BTreeSet<String> {
        self.sides()
            .into_iter()
            .filter(|side| side.user_id == user_id)
            .flat_map(|side| side.tags.iter().cloned())
            .collect()
    }

    pub fn combined_tags(&self) -> BTreeSet<String> {
        self.sides()
            .into_iter()
            .flat_map(|side| side.tags.iter().cloned())
            .collect()
    }

    pub fn winner_name(&self) -> &str {
        if self.p1.winner {
            &self.p1.username
        } else {
            &self.p2.username
        }
    }
}

impl fmt::Display for GameView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vs. {}", self.p1.username, self.p2.username)
    }
}

/// A game seen from one user's seat.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserGameView {
    #[serde(flatten)]
    pub game: GameView,
    pub win_status: WinStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_tags: Option<BTreeSet<String>>,
}

/// A game seen from neither seat: who won and every tag either side carries.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TaggedGameView {
    #[serde(flatten)]
    pub game: GameView,
    pub winner: String,
    pub all_tags: BTreeSet<String>,
}

pub struct GameHistory<'a> {
    conn: &'a Connection,
    config: &'a BloomConfig,
}

impl<'a> GameHistory<'a> {
    pub fn new(conn: &'a Connection, config: &'a BloomConfig) -> Self {
        Self { conn, config }
    }

    pub fn all(&self) -> rusqlite::Result<Vec<GameView>> {
        self.load(GameScope::All)
    }

    pub fn mine(&self, user: &UserRecord) -> rusqlite::Result<Vec<GameView>> {
        self.load(GameScope::Involving(user.id))
    }

    pub fn ours(&self, me: &UserRecord, them: &UserRecord) -> rusqlite::Result<Vec<GameView>> {
        self.load(GameScope::Between(me.id, them.id))
    }

    /// Looks a game up by numeric id first, then by content hash.
    pub fn get(&self, key: &str) -> rusqlite::Result<Option<GameView>> {
        let key = key.trim();
        let record = match key.parse::<i64>() {
            Ok(id) => match db::get_game_log(self.conn, id)? {
                Some(record) => Some(record),
                None => db::get_game_log_by_hash(self.conn, key)?,
            },
            Err(_) => db::get_game_log_by_hash(self.conn, &key.to_ascii_lowercase())?,
        };
        record.map(|record| self.view(record)).transpose()
    }

    pub fn mine_with_win(&self, user: &UserRecord) -> rusqlite::Result<Vec<UserGameView>> {
        Ok(with_win_status(self.mine(user)?, user.id, false))
    }

    pub fn my_objects(&self, user: &UserRecord) -> rusqlite::Result<Vec<UserGameView>> {
        Ok(with_win_status(self.mine(user)?, user.id, true))
    }

    pub fn ours_with_data(
        &self,
        me: &UserRecord,
        them: &UserRecord,
    ) -> rusqlite::Result<Vec<UserGameView>> {
        Ok(with_win_status(self.ours(me, them)?, me.id, true))
    }

    pub fn mine_with_tag(
        &self,
        user: &UserRecord,
        tag: &str,
    ) -> rusqlite::Result<Vec<UserGameView>> {
        let games = self
            .mine(user)?
            .into_iter()
            .filter(|game| game.tags_for(user.id).contains(tag))
            .collect();
        Ok(with_win_status(games, user.id, true))
    }

    pub fn all_with_tag(&self, tag: &str) -> rusqlite::Result<Vec<TaggedGameView>> {
        Ok(with_winner(self.all()?)
            .into_iter()
            .filter(|view| view.all_tags.contains(tag))
            .collect())
    }

    pub fn objects_with_tags(&self) -> rusqlite::Result<Vec<TaggedGameView>> {
        Ok(with_winner(self.all()?))
    }

    fn load(&self, scope: GameScope) -> rusqlite::Result<Vec<GameView>> {
        db::list_game_logs(self.conn, scope)?
            .into_iter()
            .map(|record| self.view(record))
            .collect()
    }

    fn view(&self, record: GameLogRecord) -> rusqlite::Result<GameView> {
        Ok(GameView {
            url: self.config.file_url(&record.file_name),
            p1: self.side(record.p1)?,
            p2: self.side(record.p2)?,
            id: record.id,
            game_hash: record.game_hash,
            number: record.number,
            file_name: record.file_name,
            created_at: record.created_at,
        })
    }

    fn side(&self, info: PlayerInfoRecord) -> rusqlite::Result<PlayerSide> {
        Ok(PlayerSide {
            tags: db::player_tags(self.conn, info.id)?,
            user_id: info.user_id,
            username: info.username,
            winner: info.winner,
        })
    }
}

fn with_win_status(games: Vec<GameView>, user_id: i64, include_tags: bool) -> Vec<UserGameView> {
    games
        .into_iter()
        .map(|game| UserGameView {
            win_status: game.win_status_for(user_id),
            user_tags: include_tags.then(|| game.tags_for(user_id)),
            game,
        })
        .collect()
}

fn with_winner(games: Vec<GameView>) -> Vec<TaggedGameView> {
    games
        .into_iter()
        .map(|game| TaggedGameView {
            winner: game.winner_name().to_string(),
            all_tags: game.combined_tags(),
            game,
        })
        .collect()
}
