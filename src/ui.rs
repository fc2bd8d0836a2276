use std::collections::BTreeSet;
use std::io::{self, IsTerminal};

use crate::app::{GameListing, TagView, UserView};
use crate::domain::outcome::WinStatus;
use crate::games::{GameView, PlayerSide, TaggedGameView, UserGameView};
use crate::ingest::ScanSummary;
use crate::stats::UserStat;

pub fn print_users(users: &[UserView]) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Players"));
    if users.is_empty() {
        println!("{}", palette.dim("no players registered"));
        return;
    }
    for user in users {
        println!("{} {}", palette.id(&format!("#{}", user.id)), user.username);
    }
    println!("{}", palette.dim(&format!("{} player(s)", users.len())));
}

pub fn print_game_listing(listing: &GameListing) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Games"));
    if listing.is_empty() {
        println!("{}", palette.dim("no games matched"));
        return;
    }
    match listing {
        GameListing::ForUser(views) => {
            for view in views {
                println!("{}", format_user_row(view, &palette));
            }
        }
        GameListing::Everyone(views) => {
            for view in views {
                println!("{}", format_tagged_row(view, &palette));
            }
        }
    }
    println!("{}", palette.dim(&format!("{} game(s)", listing.len())));
}

fn format_user_row(view: &UserGameView, palette: &Palette) -> String {
    let mut line = format!(
        "{} {} {}",
        palette.id(&format!("#{}", view.game.id)),
        palette.status(view.win_status),
        view.game
    );
    if let Some(tags) = view.user_tags.as_ref() {
        push_tags(&mut line, tags, palette);
    }
    line
}

fn format_tagged_row(view: &TaggedGameView, palette: &Palette) -> String {
    let mut line = format!(
        "{} {} won by {}",
        palette.id(&format!("#{}", view.game.id)),
        view.game,
        palette.winner(&view.winner)
    );
    push_tags(&mut line, &view.all_tags, palette);
    line
}

fn push_tags(line: &mut String, tags: &BTreeSet<String>, palette: &Palette) {
    if tags.is_empty() {
        return;
    }
    let joined = tags.iter().cloned().collect::<Vec<_>>().join(" #");
    line.push(' ');
    line.push_str(&palette.tags(&format!("#{joined}")));
}

pub fn print_game(game: &GameView) {
    let palette = Palette::auto();
    println!("{} {}", palette.id(&format!("#{}", game.id)), palette.heading(&game.to_string()));
    println!("number:  {}", game.number);
    println!("hash:    {}", game.game_hash);
    println!("log:     {}", game.url);
    println!("played:  {}", game.created_at);
    for (seat, side) in [("p1", &game.p1), ("p2", &game.p2)] {
        println!("{}", format_side(seat, side, &palette));
    }
}

fn format_side(seat: &str, side: &PlayerSide, palette: &Palette) -> String {
    let mut line = format!("{seat}:      {}", side.username);
    if side.winner {
        line.push(' ');
        line.push_str(&palette.winner("(winner)"));
    }
    if !side.tags.is_empty() {
        line.push(' ');
        line.push_str(&palette.tags(&format!("#{}", side.tags.join(" #"))));
    }
    line
}

pub fn print_stats(stats: &[UserStat]) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Standings"));
    if stats.is_empty() {
        println!(
            "{}",
            palette.dim("no totals recorded; run `bloom stats --refresh`")
        );
        return;
    }
    for (rank, stat) in stats.iter().enumerate() {
        println!(
            "{:>3}. {} {}",
            rank + 1,
            stat,
            palette.dim(&format!("{}% won, {} lost", stat.ratio, stat.losses))
        );
    }
}

pub fn print_tags(tags: &[TagView]) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Tags"));
    if tags.is_empty() {
        println!("{}", palette.dim("no tags recorded"));
        return;
    }
    for tag in tags {
        println!("{} {}", palette.tags(&format!("#{}", tag.name)), tag.uses);
    }
}

pub fn format_scan_summary(summary: &ScanSummary) -> String {
    let mut line = format!(
        "scan {} processed={} imported={} skipped={} errors={}",
        summary.in_dir,
        summary.processed_count,
        summary.imported_count,
        summary.skipped_count,
        summary.error_count
    );
    if let Some(error) = summary.last_error.as_deref() {
        line.push_str(&format!(" last_error={error}"));
    }
    line
}

struct Palette {
    enabled: bool,
}

impl Palette {
    fn auto() -> Self {
        let enabled = std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();
        Self { enabled }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn heading(&self, text: &str) -> String {
        self.paint("1;36", text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint("2", text)
    }

    fn id(&self, text: &str) -> String {
        self.paint("1;94", text)
    }

    fn status(&self, status: WinStatus) -> String {
        let upper = status.as_str().to_ascii_uppercase();
        self.paint(status_color_code(status), &format!("[{upper}]"))
    }

    fn winner(&self, text: &str) -> String {
        self.paint("32", text)
    }

    fn tags(&self, text: &str) -> String {
        self.paint("90", text)
    }
}

fn status_color_code(status: WinStatus) -> &'static str {
    match status {
        WinStatus::Win => "32",
        WinStatus::Loss => "31",
        WinStatus::Tie => "33",
    }
}
