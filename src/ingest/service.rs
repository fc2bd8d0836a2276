use std::path::{Path, PathBuf};

use rusqlite::Connection;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::BloomConfig;
use crate::db::{self, GameLogRecord, NewGameLog, PlayerInfoRecord};

use super::errors::IngestError;
use super::hashing::hash_file;
use super::tag_file::read_tag_file;

const LOG_EXTENSION: &str = "gamelog";
const TAG_EXTENSION: &str = "tags";

pub struct IngestService<'a> {
    conn: &'a Connection,
    config: &'a BloomConfig,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ScanSummary {
    pub in_dir: String,
    pub processed_count: u64,
    pub imported_count: u64,
    pub skipped_count: u64,
    pub error_count: u64,
    pub last_error: Option<String>,
}

impl<'a> IngestService<'a> {
    pub fn new(conn: &'a Connection, config: &'a BloomConfig) -> Self {
        Self { conn, config }
    }

    /// Records one finished game and moves its log into the output
    /// directory under its content hash. Nothing is written when the log is
    /// missing, the tag file is malformed, a player is unknown, or the same
    /// log was ingested before.
    pub fn create_new(
        &self,
        log_file: &Path,
        tag_file: &Path,
    ) -> Result<GameLogRecord, IngestError> {
        let game_hash =
            hash_file(log_file).ok_or_else(|| IngestError::MissingLog(log_file.to_path_buf()))?;
        let tags = read_tag_file(tag_file)?;

        let p1 = db::find_user_iexact(self.conn, &tags.p1_name)?
            .ok_or_else(|| IngestError::UnknownUser(tags.p1_name.clone()))?;
        let p2 = db::find_user_iexact(self.conn, &tags.p2_name)?
            .ok_or_else(|| IngestError::UnknownUser(tags.p2_name.clone()))?;

        if db::game_hash_exists(self.conn, &game_hash)? {
            return Err(IngestError::Duplicate(game_hash));
        }

        let file_name = format!("{game_hash}.{LOG_EXTENSION}");
        let tx = self.conn.unchecked_transaction()?;
        let p1_info = db::insert_player_info(&tx, p1.id, tags.p1_won())?;
        db::set_player_tags(&tx, p1_info, &tags.p1_tags)?;
        let p2_info = db::insert_player_info(&tx, p2.id, tags.p2_won())?;
        db::set_player_tags(&tx, p2_info, &tags.p2_tags)?;
        let created_at = db::now_utc_rfc3339();
        let id = db::insert_game_log(
            &tx,
            &NewGameLog {
                game_hash: &game_hash,
                file_name: &file_name,
                number: tags.number,
                p1_info,
                p2_info,
                created_at: &created_at,
            },
        )?;

        std::fs::create_dir_all(&self.config.out_dir)?;
        let destination = self.config.out_dir.join(&file_name);
        move_file(log_file, &destination)?;
        if let Err(err) = tx.commit() {
            if let Err(restore) = move_file(&destination, log_file) {
                warn!(
                    error = %restore,
                    path = %destination.display(),
                    "ingest: could not restore game log after failed commit"
                );
            }
            return Err(err.into());
        }

        info!(
            id,
            game_hash = %game_hash,
            number = tags.number,
            p1 = %p1.username,
            p2 = %p2.username,
            "ingest: recorded game log"
        );
        Ok(GameLogRecord {
            id,
            game_hash,
            file_name,
            number: tags.number,
            created_at,
            p1: PlayerInfoRecord {
                id: p1_info,
                user_id: p1.id,
                username: p1.username,
                winner: tags.p1_won(),
            },
            p2: PlayerInfoRecord {
                id: p2_info,
                user_id: p2.id,
                username: p2.username,
                winner: tags.p2_won(),
            },
        })
    }

    /// Ingests every `<stem>.gamelog` in the inbox that has a `<stem>.tags`
    /// companion. A rejected pair is counted and left in place, whatever the
    /// cause, and the scan moves on to the next one. The companion is removed
    /// once its log has been recorded.
    pub fn scan_inbox(&self) -> Result<ScanSummary, IngestError> {
        let in_dir = &self.config.in_dir;
        if !in_dir.is_dir() {
            return Err(IngestError::MissingInbox(in_dir.clone()));
        }

        let mut summary = ScanSummary {
            in_dir: in_dir.display().to_string(),
            processed_count: 0,
            imported_count: 0,
            skipped_count: 0,
            error_count: 0,
            last_error: None,
        };

        for (log_file, tag_file) in inbox_pairs(in_dir)? {
            summary.processed_count += 1;
            match self.create_new(&log_file, &tag_file) {
                Ok(_) => {
                    summary.imported_count += 1;
                    if let Err(err) = std::fs::remove_file(&tag_file) {
                        warn!(
                            error = %err,
                            path = %tag_file.display(),
                            "scan: tag file left behind"
                        );
                    }
                }
                Err(IngestError::Duplicate(hash)) => {
                    summary.skipped_count += 1;
                    info!(game_hash = %hash, path = %log_file.display(), "scan: duplicate skipped");
                }
                Err(err) => {
                    summary.error_count += 1;
                    warn!(error = %err, path = %log_file.display(), "scan: game log rejected");
                    summary.last_error = Some(format!("{}: {}", log_file.display(), err));
                }
            }
        }

        Ok(summary)
    }
}

fn inbox_pairs(in_dir: &Path) -> Result<Vec<(PathBuf, PathBuf)>, IngestError> {
    let mut pairs = Vec::new();
    for entry in std::fs::read_dir(in_dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some(LOG_EXTENSION)
        {
            continue;
        }
        let companion = path.with_extension(TAG_EXTENSION);
        if companion.is_file() {
            pairs.push((path, companion));
        }
    }
    pairs.sort();
    Ok(pairs)
}

fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    std::fs::copy(from, to)?;
    std::fs::remove_file(from)
}
