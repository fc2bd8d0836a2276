use std::error::Error;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum IngestError {
    Io(std::io::Error),
    Db(rusqlite::Error),
    MissingLog(PathBuf),
    MissingInbox(PathBuf),
    InvalidTagFile(String),
    UnknownUser(String),
    Duplicate(String),
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestError::Io(err) => write!(f, "I/O error: {}", err),
            IngestError::Db(err) => write!(f, "database error: {}", err),
            IngestError::MissingLog(path) => {
                write!(f, "game log '{}' does not exist or is unreadable", path.display())
            }
            IngestError::MissingInbox(path) => {
                write!(f, "inbox directory '{}' does not exist", path.display())
            }
            IngestError::InvalidTagFile(message) => write!(f, "invalid tag file: {}", message),
            IngestError::UnknownUser(name) => write!(f, "no user matches '{}'", name),
            IngestError::Duplicate(hash) => {
                write!(f, "game log {} has already been ingested", hash)
            }
        }
    }
}

impl Error for IngestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            IngestError::Io(err) => Some(err),
            IngestError::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for IngestError {
    fn from(value: std::io::Error) -> Self {
        IngestError::Io(value)
    }
}

impl From<rusqlite::Error> for IngestError {
    fn from(value: rusqlite::Error) -> Self {
        IngestError::Db(value)
    }
}
