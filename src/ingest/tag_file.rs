use std::path::Path;

use crate::domain::tags::parse_tag_input;

use super::errors::IngestError;

/// Companion metadata the game runner writes next to each log.
///
/// ```text
/// 17, alice, bob, 1
/// rush, early game
/// turtle
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFile {
    pub number: i64,
    pub p1_name: String,
    pub p2_name: String,
    pub winner_index: usize,
    pub p1_tags: Vec<String>,
    pub p2_tags: Vec<String>,
}

impl TagFile {
    pub fn p1_won(&self) -> bool {
        self.winner_index == 0
    }

    pub fn p2_won(&self) -> bool {
        self.winner_index == 1
    }
}

pub fn read_tag_file(path: &Path) -> Result<TagFile, IngestError> {
    let text = std::fs::read_to_string(path)?;
    parse_tag_file(&text)
}

pub fn parse_tag_file(text: &str) -> Result<TagFile, IngestError> {
    let mut lines = text.lines();
    let header = lines
        .next()
        .ok_or_else(|| IngestError::InvalidTagFile("file is empty".to_string()))?;
    let fields: Vec<&str> = header.trim_end_matches('\r').split(", ").collect();
    let [number, p1_name, p2_name, winner_index] = fields.as_slice() else {
        return Err(IngestError::InvalidTagFile(format!(
            "expected 'number, player1, player2, winner' but found '{}'",
            header
        )));
    };

    let number = number.trim().parse::<i64>().map_err(|_| {
        IngestError::InvalidTagFile(format!("game number '{}' is not an integer", number))
    })?;
    let winner_index = match winner_index.trim().parse::<i64>() {
        Ok(0) => 0,
        Ok(1) => 1,
        _ => {
            return Err(IngestError::InvalidTagFile(format!(
                "winner index '{}' must be 0 or 1",
                winner_index
            )))
        }
    };

    Ok(TagFile {
        number,
        p1_name: player_name(p1_name)?,
        p2_name: player_name(p2_name)?,
        winner_index,
        p1_tags: lines.next().map(parse_tag_input).unwrap_or_default(),
        p2_tags: lines.next().map(parse_tag_input).unwrap_or_default(),
    })
}

fn player_name(raw: &str) -> Result<String, IngestError> {
    let name: String = raw.chars().filter(|ch| *ch != ' ').collect();
    if name.is_empty() {
        return Err(IngestError::InvalidTagFile("player name is empty".to_string()));
    }
    Ok(name)
}
