use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, Parser, Subcommand};

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightCyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightGreen.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::BrightMagenta.on_default())
}

#[derive(Debug, Parser)]
#[command(name = "bloom")]
#[command(bin_name = "bloom")]
#[command(version)]
#[command(about = "Record two-player match results and report win/loss history")]
#[command(styles = cli_styles())]
pub struct Cli {
    #[arg(
        short = 'd',
        long,
        env = "BLOOM_DB_PATH",
        default_value = ".bloom/bloom.sqlite",
        help = "Path to the SQLite database."
    )]
    pub db: String,

    #[arg(
        short = 'c',
        long,
        env = "BLOOM_CONFIG",
        default_value = ".bloom/config.toml",
        help = "Path to the TOML config file (optional)."
    )]
    pub config: PathBuf,

    #[arg(
        long,
        env = "BLOOM_IN_PATH",
        help = "Inbox directory the game runner writes results into."
    )]
    pub in_dir: Option<PathBuf>,

    #[arg(
        long,
        env = "BLOOM_OUT_PATH",
        help = "Directory ingested game logs are moved into."
    )]
    pub out_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Manage players.")]
    User(UserArgs),
    #[command(about = "Record one game from a log file and its tag file.")]
    Ingest(IngestArgs),
    #[command(about = "Record every complete log/tag pair in the inbox.")]
    Scan(JsonArgs),
    #[command(about = "List games, optionally for a player, a pairing, or a tag.")]
    Games(GamesArgs),
    #[command(about = "Show one game by id or hash.")]
    Show(ShowArgs),
    #[command(about = "Show per-player win/loss totals.")]
    Stats(StatsArgs),
    #[command(about = "List tags and how often they are used.")]
    Tags(JsonArgs),
    #[command(about = "Print shell completions.")]
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum UserSubcommands {
    #[command(about = "Register a player.")]
    Add(UserAddArgs),
    #[command(about = "List registered players.")]
    Ls(JsonArgs),
}

#[derive(Debug, Args)]
pub struct UserAddArgs {
    #[arg(help = "Username; matched case-insensitively when ingesting.")]
    pub username: String,
}

#[derive(Debug, Args)]
pub struct JsonArgs {
    #[arg(long, help = "Print JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    #[arg(help = "Game log produced by the runner.")]
    pub log_file: PathBuf,
    #[arg(help = "Companion tag file naming the players, winner, and tags.")]
    pub tag_file: PathBuf,
    #[arg(long, help = "Print JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct GamesArgs {
    #[arg(short = 'u', long, help = "Only games this player took part in.")]
    pub user: Option<String>,
    #[arg(long = "vs", help = "With --user: only games against this opponent.")]
    pub versus: Option<String>,
    #[arg(short = 't', long, help = "Only games carrying this tag.")]
    pub tag: Option<String>,
    #[arg(long, help = "Print JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    #[arg(help = "Game id or content hash.")]
    pub id: String,
    #[arg(long, help = "Print JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    #[arg(short = 'r', long, help = "Recompute totals from game history first.")]
    pub refresh: bool,
    #[arg(long, help = "Print JSON output.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    #[arg(help = "Shell name (bash, zsh, fish). Auto-detected if omitted.")]
    pub shell: Option<String>,
}
