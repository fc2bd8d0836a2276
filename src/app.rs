use std::error::Error;
use std::fmt;
use std::path::Path;

use rusqlite::Connection;
use serde::Serialize;
use tracing::info;

use crate::config::{BloomConfig, ConfigError};
use crate::db::{self, UserRecord};
use crate::games::{GameHistory, GameView, TaggedGameView, UserGameView};
use crate::ingest::{IngestError, IngestService, ScanSummary};
use crate::stats::{self, UserStat};

pub struct App {
    conn: Connection,
    config: BloomConfig,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserView {
    pub id: i64,
    pub username: String,
    pub created_at: String,
}

impl From<UserRecord> for UserView {
    fn from(value: UserRecord) -> Self {
        Self {
            id: value.id,
            username: value.username,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TagView {
    pub name: String,
    pub uses: i64,
}

/// The history listing a `games` query resolves to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameQuery {
    pub user: Option<String>,
    pub versus: Option<String>,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum GameListing {
    ForUser(Vec<UserGameView>),
    Everyone(Vec<TaggedGameView>),
}

impl GameListing {
    pub fn len(&self) -> usize {
        match self {
            GameListing::ForUser(views) => views.len(),
            GameListing::Everyone(views) => views.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl App {
    pub fn open(db_path: &str, config: BloomConfig) -> Result<Self, AppError> {
        ensure_parent_dir(db_path)?;
        let conn = db::open_connection(db_path)?;
        Ok(Self { conn, config })
    }

    pub fn add_user(&self, username: &str) -> Result<UserView, AppError> {
        let username = username.trim();
        if username.is_empty() || username.chars().any(char::is_whitespace) {
            return Err(AppError::InvalidArgument(format!(
                "username '{}' must be non-empty and contain no whitespace",
                username
            )));
        }
        if let Some(existing) = db::find_user_iexact(&self.conn, username)? {
            return Err(AppError::InvalidArgument(format!(
                "user '{}' already exists",
                existing.username
            )));
        }
        let id = db::insert_user(&self.conn, username, &db::now_utc_rfc3339())?;
        info!(id, username, "users: added user");
        Ok(UserView::from(self.require_user(username)?))
    }

    pub fn list_users(&self) -> Result<Vec<UserView>, AppError> {
        Ok(db::list_users(&self.conn)?
            .into_iter()
            .map(UserView::from)
            .collect())
    }

    pub fn ingest(&self, log_file: &Path, tag_file: &Path) -> Result<GameView, AppError> {
        let record = IngestService::new(&self.conn, &self.config).create_new(log_file, tag_file)?;
        self.show_game(&record.id.to_string())
    }

    pub fn scan(&self) -> Result<ScanSummary, AppError> {
        Ok(IngestService::new(&self.conn, &self.config).scan_inbox()?)
    }

    pub fn list_games(&self, query: &GameQuery) -> Result<GameListing, AppError> {
        let history = GameHistory::new(&self.conn, &self.config);
        let user = query.user.as_deref().and_then(non_empty);
        let versus = query.versus.as_deref().and_then(non_empty);
        let tag = query.tag.as_deref().and_then(non_empty);

        let listing = match (user, versus, tag) {
            (None, Some(_), _) => {
                return Err(AppError::InvalidArgument(
                    "--vs requires --user".to_string(),
                ))
            }
            (Some(_), Some(_), Some(_)) => {
                return Err(AppError::InvalidArgument(
                    "--vs and --tag cannot be combined".to_string(),
                ))
            }
            (Some(me), Some(them), None) => GameListing::ForUser(
                history.ours_with_data(&self.require_user(me)?, &self.require_user(them)?)?,
            ),
            (Some(me), None, Some(tag)) => {
                GameListing::ForUser(history.mine_with_tag(&self.require_user(me)?, tag)?)
            }
            (Some(me), None, None) => {
                GameListing::ForUser(history.my_objects(&self.require_user(me)?)?)
            }
            (None, None, Some(tag)) => GameListing::Everyone(history.all_with_tag(tag)?),
            (None, None, None) => GameListing::Everyone(history.objects_with_tags()?),
        };
        Ok(listing)
    }

    pub fn show_game(&self, key: &str) -> Result<GameView, AppError> {
        GameHistory::new(&self.conn, &self.config)
            .get(key)?
            .ok_or_else(|| AppError::NotFound(key.to_string()))
    }

    pub fn stats(&self, refresh: bool) -> Result<Vec<UserStat>, AppError> {
        if refresh {
            let refreshed = stats::populate_stats(&self.conn, &self.config)?;
            info!(users = refreshed, "stats: refreshed totals");
        }
        Ok(stats::list_stats(&self.conn)?)
    }

    pub fn list_tags(&self) -> Result<Vec<TagView>, AppError> {
        Ok(db::list_tag_counts(&self.conn)?
            .into_iter()
            .map(|row| TagView {
                name: row.name,
                uses: row.uses,
            })
            .collect())
    }

    fn require_user(&self, username: &str) -> Result<UserRecord, AppError> {
        db::find_user_iexact(&self.conn, username)?
            .ok_or_else(|| AppError::UnknownUser(username.to_string()))
    }
}

fn non_empty(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn ensure_parent_dir(path: &str) -> Result<(), AppError> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[derive(Debug)]
pub enum AppError {
    Io(std::io::Error),
    Db(rusqlite::Error),
    Config(ConfigError),
    Ingest(IngestError),
    InvalidArgument(String),
    UnknownUser(String),
    NotFound(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Io(err) => write!(f, "I/O error: {}", err),
            AppError::Db(err) => write!(f, "database error: {}", err),
            AppError::Config(err) => write!(f, "config error: {}", err),
            AppError::Ingest(err) => write!(f, "ingest error: {}", err),
            AppError::InvalidArgument(message) => write!(f, "{}", message),
            AppError::UnknownUser(name) => write!(f, "user '{}' not found", name),
            AppError::NotFound(key) => write!(f, "game '{}' not found", key),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Io(err) => Some(err),
            AppError::Db(err) => Some(err),
            AppError::Config(err) => Some(err),
            AppError::Ingest(err) => Some(err),
            AppError::InvalidArgument(_) => None,
            AppError::UnknownUser(_) => None,
            AppError::NotFound(_) => None,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        AppError::Io(value)
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(value: rusqlite::Error) -> Self {
        AppError::Db(value)
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        AppError::Config(value)
    }
}

impl From<IngestError> for AppError {
    fn from(value: IngestError) -> Self {
        AppError::Ingest(value)
    }
}
