use std::time::Duration;

use rusqlite::{params, Connection, DatabaseName, OptionalExtension, Result, Row};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub const CURRENT_SCHEMA_VERSION: i64 = 2;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: [Migration; 2] = [
    Migration {
        version: 1,
        name: "baseline_game_log_schema_v1",
        sql: r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE COLLATE NOCASE,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS player_info (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id),
    winner INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS player_info_tags (
    player_info_id INTEGER NOT NULL REFERENCES player_info(id) ON DELETE CASCADE,
    tag_id INTEGER NOT NULL REFERENCES tags(id),
    PRIMARY KEY (player_info_id, tag_id)
);

CREATE TABLE IF NOT EXISTS game_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    game_hash TEXT NOT NULL,
    file_name TEXT NOT NULL,
    number INTEGER NOT NULL,
    p1_info INTEGER NOT NULL UNIQUE REFERENCES player_info(id),
    p2_info INTEGER NOT NULL UNIQUE REFERENCES player_info(id),
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_player_info_user ON player_info(user_id);
CREATE INDEX IF NOT EXISTS idx_game_logs_hash ON game_logs(game_hash);
"#,
    },
    Migration {
        version: 2,
        name: "user_stats_v1",
        sql: r#"
CREATE TABLE IF NOT EXISTS user_stats (
    user_id INTEGER PRIMARY KEY REFERENCES users(id),
    games INTEGER NOT NULL DEFAULT 0,
    wins INTEGER NOT NULL DEFAULT 0,
    losses INTEGER NOT NULL DEFAULT 0
);
"#,
    },
];

pub fn open_connection(path: &str) -> Result<Connection> {
    let mut conn = Connection::open(path)?;
    configure(&conn)?;
    apply_migrations(&mut conn)?;
    Ok(conn)
}

fn configure(conn: &Connection) -> Result<()> {
    conn.pragma_update(None::<DatabaseName>, "journal_mode", "WAL")?;
    conn.pragma_update(None::<DatabaseName>, "synchronous", "NORMAL")?;
    conn.pragma_update(None::<DatabaseName>, "foreign_keys", "ON")?;
    conn.pragma_update(None::<DatabaseName>, "busy_timeout", 5000i64)?;
    conn.busy_timeout(Duration::from_millis(5000))?;
    Ok(())
}

fn apply_migrations(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
);
"#,
    )?;

    for migration in MIGRATIONS {
        let already_applied: Option<i64> = tx
            .query_row(
                "SELECT version FROM schema_migrations WHERE version = ?1",
                params![migration.version],
                |row| row.get(0),
            )
            .optional()?;

        if already_applied.is_some() {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![migration.version, migration.name, now_utc_rfc3339()],
        )?;
    }

    tx.execute(
        r#"
INSERT INTO meta (key, value)
VALUES ('schema_version', ?1)
ON CONFLICT(key) DO UPDATE SET value = excluded.value
"#,
        params![CURRENT_SCHEMA_VERSION.to_string()],
    )?;

    tx.commit()
}

pub fn now_utc_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .expect("RFC3339 formatting for UTC timestamp should never fail")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub created_at: String,
}

pub fn insert_user(conn: &Connection, username: &str, created_at: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO users (username, created_at) VALUES (?1, ?2)",
        params![username, created_at],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_user_iexact(conn: &Connection, username: &str) -> Result<Option<UserRecord>> {
    conn.query_row(
        "SELECT id, username, created_at FROM users WHERE username = ?1 COLLATE NOCASE",
        params![username],
        |row| {
            Ok(UserRecord {
                id: row.get(0)?,
                username: row.get(1)?,
                created_at: row.get(2)?,
            })
        },
    )
    .optional()
}

pub fn list_users(conn: &Connection) -> Result<Vec<UserRecord>> {
    let mut stmt =
        conn.prepare("SELECT id, username, created_at FROM users ORDER BY username, id")?;
    let mut rows = stmt.query([])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(UserRecord {
            id: row.get(0)?,
            username: row.get(1)?,
            created_at: row.get(2)?,
        });
    }
    Ok(result)
}

pub fn insert_player_info(conn: &Connection, user_id: i64, winner: bool) -> Result<i64> {
    conn.execute(
        "INSERT INTO player_info (user_id, winner) VALUES (?1, ?2)",
        params![user_id, winner],
    )?;
    Ok(conn.last_insert_rowid())
}

fn ensure_tag(conn: &Connection, name: &str) -> Result<i64> {
    conn.execute("INSERT OR IGNORE INTO tags (name) VALUES (?1)", params![name])?;
    conn.query_row("SELECT id FROM tags WHERE name = ?1", params![name], |row| row.get(0))
}

/// Replaces the tag set attached to one player's side of a game.
pub fn set_player_tags(conn: &Connection, player_info_id: i64, names: &[String]) -> Result<()> {
    conn.execute(
        "DELETE FROM player_info_tags WHERE player_info_id = ?1",
        params![player_info_id],
    )?;
    for name in names {
        let tag_id = ensure_tag(conn, name)?;
        conn.execute(
            "INSERT OR IGNORE INTO player_info_tags (player_info_id, tag_id) VALUES (?1, ?2)",
            params![player_info_id, tag_id],
        )?;
    }
    Ok(())
}

pub fn player_tags(conn: &Connection, player_info_id: i64) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        r#"
SELECT t.name
FROM tags t
JOIN player_info_tags pt ON pt.tag_id = t.id
WHERE pt.player_info_id = ?1
ORDER BY t.name
"#,
    )?;
    let mut rows = stmt.query(params![player_info_id])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(row.get(0)?);
    }
    Ok(result)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCountRecord {
    pub name: String,
    pub uses: i64,
}

pub fn list_tag_counts(conn: &Connection) -> Result<Vec<TagCountRecord>> {
    let mut stmt = conn.prepare(
        r#"
SELECT t.name, COUNT(pt.player_info_id)
FROM tags t
LEFT JOIN player_info_tags pt ON pt.tag_id = t.id
GROUP BY t.id
ORDER BY COUNT(pt.player_info_id) DESC, t.name ASC
"#,
    )?;
    let mut rows = stmt.query([])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(TagCountRecord {
            name: row.get(0)?,
            uses: row.get(1)?,
        });
    }
    Ok(result)
}

pub struct NewGameLog<'a> {
    pub game_hash: &'a str,
    pub file_name: &'a str,
    pub number: i64,
    pub p1_info: i64,
    pub p2_info: i64,
    pub created_at: &'a str,
}

pub fn insert_game_log(conn: &Connection, args: &NewGameLog<'_>) -> Result<i64> {
    conn.execute(
        r#"
INSERT INTO game_logs (game_hash, file_name, number, p1_info, p2_info, created_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
"#,
        params![
            args.game_hash,
            args.file_name,
            args.number,
            args.p1_info,
            args.p2_info,
            args.created_at
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn game_hash_exists(conn: &Connection, game_hash: &str) -> Result<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM game_logs WHERE game_hash = ?1)",
        params![game_hash],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerInfoRecord {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub winner: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameLogRecord {
    pub id: i64,
    pub game_hash: String,
    pub file_name: String,
    pub number: i64,
    pub created_at: String,
    pub p1: PlayerInfoRecord,
    pub p2: PlayerInfoRecord,
}

/// Which games a history query should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameScope {
    All,
    Involving(i64),
    Between(i64, i64),
}

const GAME_LOG_SELECT: &str = r#"
SELECT g.id, g.game_hash, g.file_name, g.number, g.created_at,
       a.id, a.user_id, ua.username, a.winner,
       b.id, b.user_id, ub.username, b.winner
FROM game_logs g
JOIN player_info a ON a.id = g.p1_info
JOIN users ua ON ua.id = a.user_id
JOIN player_info b ON b.id = g.p2_info
JOIN users ub ON ub.id = b.user_id
"#;

fn game_log_from_row(row: &Row<'_>) -> Result<GameLogRecord> {
    Ok(GameLogRecord {
        id: row.get(0)?,
        game_hash: row.get(1)?,
        file_name: row.get(2)?,
        number: row.get(3)?,
        created_at: row.get(4)?,
        p1: PlayerInfoRecord {
            id: row.get(5)?,
            user_id: row.get(6)?,
            username: row.get(7)?,
            winner: row.get(8)?,
        },
        p2: PlayerInfoRecord {
            id: row.get(9)?,
            user_id: row.get(10)?,
            username: row.get(11)?,
            winner: row.get(12)?,
        },
    })
}

pub fn list_game_logs(conn: &Connection, scope: GameScope) -> Result<Vec<GameLogRecord>> {
    let (clause, first, second) = match scope {
        GameScope::All => ("", 0, 0),
        GameScope::Involving(user) => ("WHERE a.user_id = ?1 OR b.user_id = ?1", user, 0),
        GameScope::Between(me, them) => (
            concat!(
                "WHERE (a.user_id = ?1 AND b.user_id = ?2) ",
                "OR (a.user_id = ?2 AND b.user_id = ?1)"
            ),
            me,
            them,
        ),
    };
    let sql = format!("{GAME_LOG_SELECT}{clause}\nORDER BY g.id DESC");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = match scope {
        GameScope::All => stmt.query([])?,
        GameScope::Involving(_) => stmt.query(params![first])?,
        GameScope::Between(_, _) => stmt.query(params![first, second])?,
    };
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(game_log_from_row(row)?);
    }
    Ok(result)
}

pub fn get_game_log(conn: &Connection, id: i64) -> Result<Option<GameLogRecord>> {
    let sql = format!("{GAME_LOG_SELECT}WHERE g.id = ?1");
    conn.query_row(&sql, params![id], game_log_from_row).optional()
}

pub fn get_game_log_by_hash(conn: &Connection, game_hash: &str) -> Result<Option<GameLogRecord>> {
    let sql = format!("{GAME_LOG_SELECT}WHERE g.game_hash = ?1 ORDER BY g.id DESC LIMIT 1");
    conn.query_row(&sql, params![game_hash], game_log_from_row).optional()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStatRecord {
    pub user_id: i64,
    pub username: String,
    pub games: i64,
    pub wins: i64,
    pub losses: i64,
}

pub fn upsert_user_stat(
    conn: &Connection,
    user_id: i64,
    games: i64,
    wins: i64,
    losses: i64,
) -> Result<()> {
    conn.execute(
        r#"
INSERT INTO user_stats (user_id, games, wins, losses)
VALUES (?1, ?2, ?3, ?4)
ON CONFLICT(user_id) DO UPDATE SET
    games = excluded.games,
    wins = excluded.wins,
    losses = excluded.losses
"#,
        params![user_id, games, wins, losses],
    )?;
    Ok(())
}

pub fn list_user_stats(conn: &Connection) -> Result<Vec<UserStatRecord>> {
    let mut stmt = conn.prepare(
        r#"
SELECT s.user_id, u.username, s.games, s.wins, s.losses
FROM user_stats s
JOIN users u ON u.id = s.user_id
ORDER BY s.wins DESC, s.games DESC, u.username ASC
"#,
    )?;
    let mut rows = stmt.query([])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(UserStatRecord {
            user_id: row.get(0)?,
            username: row.get(1)?,
            games: row.get(2)?,
            wins: row.get(3)?,
            losses: row.get(4)?,
        });
    }
    Ok(result)
}
