mod app;
mod cli;
mod completions;
mod config;
mod db;
mod domain;
mod games;
mod ingest;
mod stats;
mod ui;

use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bloom=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json(value: &impl serde::Serialize) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).expect("json serialization should work")
    );
}

fn run() -> Result<(), app::AppError> {
    use clap::Parser;
    use cli::{Commands, UserSubcommands};

    let cli = cli::Cli::parse();
    if let Commands::Completions(args) = &cli.command {
        return completions::run_completions_command(args.shell.as_deref());
    }

    let overrides = config::ConfigOverrides {
        in_dir: cli.in_dir.clone(),
        out_dir: cli.out_dir.clone(),
    };
    let config = config::BloomConfig::load(&cli.config, &overrides)?;
    let app = app::App::open(&cli.db, config)?;

    match cli.command {
        Commands::User(args) => match args.command {
            UserSubcommands::Add(add) => {
                let user = app.add_user(&add.username)?;
                println!("added user #{} {}", user.id, user.username);
            }
            UserSubcommands::Ls(args) => {
                let users = app.list_users()?;
                if args.json {
                    print_json(&users);
                } else {
                    ui::print_users(&users);
                }
            }
        },
        Commands::Ingest(args) => {
            let game = app.ingest(&args.log_file, &args.tag_file)?;
            if args.json {
                print_json(&game);
            } else {
                println!("recorded #{} {} {}", game.id, game.game_hash, game);
            }
        }
        Commands::Scan(args) => {
            let summary = app.scan()?;
            if args.json {
                print_json(&summary);
            } else {
                println!("{}", ui::format_scan_summary(&summary));
            }
        }
        Commands::Games(args) => {
            let query = app::GameQuery {
                user: args.user,
                versus: args.versus,
                tag: args.tag,
            };
            let listing = app.list_games(&query)?;
            if args.json {
                print_json(&listing);
            } else {
                ui::print_game_listing(&listing);
            }
        }
        Commands::Show(args) => {
            let game = app.show_game(&args.id)?;
            if args.json {
                print_json(&game);
            } else {
                ui::print_game(&game);
            }
        }
        Commands::Stats(args) => {
            let stats = app.stats(args.refresh)?;
            if args.json {
                print_json(&stats);
            } else {
                ui::print_stats(&stats);
            }
        }
        Commands::Tags(args) => {
            let tags = app.list_tags()?;
            if args.json {
                print_json(&tags);
            } else {
                ui::print_tags(&tags);
            }
        }
        Commands::Completions(_) => {
            unreachable!("completions are handled before the database is opened")
        }
    }

    Ok(())
}
