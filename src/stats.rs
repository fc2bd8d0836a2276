use std::fmt;

use rusqlite::Connection;
use serde::Serialize;
use tracing::debug;

use crate::config::BloomConfig;
use crate::db::{self, UserStatRecord};
use crate::domain::outcome::WinStatus;
use crate::games::GameHistory;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserStat {
    pub username: String,
    pub games: i64,
    pub wins: i64,
    pub losses: i64,
    pub ratio: i64,
}

impl UserStat {
    /// Whole-number win percentage, rounded down. Zero when no games were played.
    pub fn ratio(games: i64, wins: i64) -> i64 {
        if games == 0 {
            0
        } else {
            100 * wins / games
        }
    }
}

impl From<UserStatRecord> for UserStat {
    fn from(value: UserStatRecord) -> Self {
        Self {
            ratio: UserStat::ratio(value.games, value.wins),
            username: value.username,
            games: value.games,
            wins: value.wins,
            losses: value.losses,
        }
    }
}

impl fmt::Display for UserStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}/{})", self.username, self.wins, self.games)
    }
}

/// Recomputes every user's totals from the full game history. Ties count
/// toward games played but neither wins nor losses.
pub fn populate_stats(conn: &Connection, config: &BloomConfig) -> rusqlite::Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let history = GameHistory::new(&tx, config);
    let users = db::list_users(&tx)?;
    for user in &users {
        let (mut games, mut wins, mut losses) = (0i64, 0i64, 0i64);
        for game in history.mine_with_win(user)? {
            games += 1;
            match game.win_status {
                WinStatus::Win => wins += 1,
                WinStatus::Loss => losses += 1,
                WinStatus::Tie => {}
            }
        }
        debug!(username = %user.username, games, wins, losses, "stats: refreshed user");
        db::upsert_user_stat(&tx, user.id, games, wins, losses)?;
    }
    tx.commit()?;
    Ok(users.len())
}

pub fn list_stats(conn: &Connection) -> rusqlite::Result<Vec<UserStat>> {
    Ok(db::list_user_stats(conn)?
        .into_iter()
        .map(UserStat::from)
        .collect())
}
