use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use doubles_league::api::state::AppState;
use doubles_league::config::AppConfig;
use doubles_league::guard::FreezeOutcome;
use doubles_league::models::{MatchId, MatchResult, MatchScore};
use doubles_league::schedule::GenerationOutcome;
use doubles_league::storage::{JsonlStore, StorageConfig};
use doubles_league::tournament::TournamentService;

#[derive(Parser)]
#[command(name = "doubles-league")]
#[command(about = "Doubles round-robin league with rotating partners and a knockout finish")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },

    /// Manage the roster
    Player {
        #[command(subcommand)]
        action: PlayerAction,
    },

    /// Generate the next round-robin matchday
    Generate,

    /// Confirm a scheduled match
    Confirm {
        /// Match id
        id: String,
    },

    /// Record a match result
    Result {
        /// Match id
        id: String,

        /// Sets won by team A
        sets_a: u32,

        /// Sets won by team B
        sets_b: u32,

        /// Aggregate games won by team A
        #[arg(long, requires = "games_b")]
        games_a: Option<u32>,

        /// Aggregate games won by team B
        #[arg(long, requires = "games_a")]
        games_b: Option<u32>,
    },

    /// Freeze an incomplete matchday
    Freeze {
        /// Matchday number
        matchday: u32,
    },

    /// Resolve a frozen match, with a late score or by restoring its old one
    Recover {
        /// Match id
        id: String,

        /// Late score as SETS_A-SETS_B (e.g. 2-1); omit to restore
        #[arg(long)]
        score: Option<String>,
    },

    /// Print the standings table
    Standings,

    /// Close the round-robin and seed the knockout bracket
    Close,

    /// Print the knockout bracket
    Bracket,
}

#[derive(Subcommand)]
enum PlayerAction {
    /// Register a player
    Add {
        /// Display name
        name: String,
    },
    /// List registered players
    List,
}

fn parse_sets(s: &str) -> Result<MatchScore> {
    let (a, b) = s
        .split_once('-')
        .with_context(|| format!("Score {:?} must look like 2-1", s))?;
    let sets_a = a.trim().parse::<u32>().with_context(|| format!("Bad set count {:?}", a))?;
    let sets_b = b.trim().parse::<u32>().with_context(|| format!("Bad set count {:?}", b))?;
    Ok(MatchScore::new(sets_a, sets_b))
}

fn print_match(m: &MatchResult) {
    println!(
        "{}  day {:>2}  {:<10}  {}  vs  {}{}",
        m.id,
        m.matchday_number,
        m.status.to_string(),
        m.team_a,
        m.team_b,
        m.score
            .map(|s| format!("  {}-{}", s.sets_a, s.sets_b))
            .unwrap_or_default()
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config {:?}", cli.config))?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    config.validate()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting doubles-league v{}", env!("CARGO_PKG_VERSION"));

    let store = JsonlStore::new(StorageConfig::new(config.data_dir.clone()));
    let service = TournamentService::open(
        Arc::new(store),
        config.scheduler.clone(),
        config.bracket.clone(),
    )
    .await?;

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or(config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let state = AppState::new(service, &config.server.cors_origin);
            let app = doubles_league::api::build_router(state);
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Player { action } => match action {
            PlayerAction::Add { name } => {
                let player = service.register_player(&name).await?;
                println!("{}  {}", player.id, player.name);
            }
            PlayerAction::List => {
                let mut players = service.players().await;
                players.sort_by(|a, b| a.name.cmp(&b.name));
                for p in &players {
                    println!("{}  {}", p.id, p.name);
                }
                println!("{} players", players.len());
            }
        },
        Commands::Generate => match service.generate_next_matchday().await? {
            GenerationOutcome::Created {
                matchday_number,
                matches,
            } => {
                println!("Matchday {}:", matchday_number);
                for m in &matches {
                    print_match(m);
                }
            }
            GenerationOutcome::Rejected(reason) => bail!("No matchday generated: {}", reason),
        },
        Commands::Confirm { id } => {
            let m = service.confirm_match(&MatchId::from(id)).await?;
            print_match(&m);
        }
        Commands::Result {
            id,
            sets_a,
            sets_b,
            games_a,
            games_b,
        } => {
            let mut score = MatchScore::new(sets_a, sets_b);
            if let (Some(a), Some(b)) = (games_a, games_b) {
                score = score.with_games(a, b);
            }
            let m = service.record_result(&MatchId::from(id), score).await?;
            print_match(&m);
        }
        Commands::Freeze { matchday } => match service.freeze_matchday(matchday).await? {
            FreezeOutcome::Frozen(frozen) => {
                println!("Froze {} matches of matchday {}", frozen.len(), matchday);
                for m in &frozen {
                    print_match(m);
                }
            }
            FreezeOutcome::Rejected(reason) => {
                bail!("Matchday {} not frozen: {}", matchday, reason)
            }
        },
        Commands::Recover { id, score } => {
            let score = score.as_deref().map(parse_sets).transpose()?;
            let resolution = service
                .resolve_recovery_match(&MatchId::from(id), score)
                .await?;
            for m in &resolution.updated {
                print_match(m);
            }
            if resolution.matchday_unfrozen {
                println!("Matchday is back in the standings");
            }
        }
        Commands::Standings => {
            println!(
                "{:>3}  {:<24} {:>3} {:>4} {:>5} {:>6}",
                "#", "Player", "P", "Pts", "Sets", "Games"
            );
            for (i, row) in service.standings().await.iter().enumerate() {
                println!(
                    "{:>3}  {:<24} {:>3} {:>4} {:>+5} {:>+6}",
                    i + 1,
                    row.name,
                    row.played,
                    row.points,
                    row.set_diff,
                    row.game_diff
                );
            }
        }
        Commands::Close => {
            let bracket = service.close_round_robin_and_seed_bracket().await?;
            println!("Seeded {} bracket matches", bracket.len());
        }
        Commands::Bracket => {
            let bracket = service.bracket().await;
            if bracket.is_empty() {
                println!("No bracket yet (phase {})", service.phase().await.name());
            }
            for m in &bracket {
                let side = |slot: &doubles_league::models::BracketSlot| match slot.team() {
                    Some(team) => team.to_string(),
                    None => "TBD".to_string(),
                };
                println!(
                    "{:<10} {:?}  {}  vs  {}",
                    m.id,
                    m.status(),
                    side(&m.team_a),
                    side(&m.team_b)
                );
            }
        }
    }

    Ok(())
}
