use std::fmt;

use serde::Serialize;

/// Result of one game from a single user's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WinStatus {
    Win,
    Loss,
    Tie,
}

impl WinStatus {
    /// A user who occupies both seats ties with themselves.
    pub fn from_seats(is_p1: bool, is_p2: bool, p1_winner: bool) -> Self {
        if is_p1 && is_p2 {
            return WinStatus::Tie;
        }
        let user_side_won = if is_p1 { p1_winner } else { !p1_winner };
        if user_side_won {
            WinStatus::Win
        } else {
            WinStatus::Loss
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WinStatus::Win => "win",
            WinStatus::Loss => "loss",
            WinStatus::Tie => "tie",
        }
    }
}

impl fmt::Display for WinStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
