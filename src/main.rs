use chess_ladder::{
    args::{Args, Command},
    database::{
        db::{DbClient, DbError},
        db_structs::DecayRunOptions
    },
    model::{decay::calculate_decay, match_recorder::MatchRequest, replay::RatingMismatch}
};
use chrono::Utc;
use clap::Parser;
use serde::Serialize;
use tracing::{error, info};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_tracing(&args.log_level);

    let constants = args.constants.to_constants();
    let client = match DbClient::open(&args.data_file, constants).await {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to open ladder data at {}: {}", args.data_file.display(), e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&client, args.command).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn init_tracing(level: &str) {
    let indicatif_layer = IndicatifLayer::new();

    tracing_subscriber::registry()
        .with(EnvFilter::new(level))
        .with(tracing_subscriber::fmt::layer().with_writer(indicatif_layer.get_stderr_writer()))
        .with(indicatif_layer)
        .init();
}

async fn run(client: &DbClient, command: Command) -> Result<(), DbError> {
    match command {
        Command::AddPlayer { name } => {
            let player = client.add_player(&name, Utc::now()).await?;
            client.flush().await?;
            print_json(&player)
        }
        Command::RecordMatch {
            player_a,
            player_b,
            winner
        } => {
            let request = MatchRequest::new(player_a, player_b, winner);
            let recorded = client.record_match(&request, Utc::now()).await?;
            client.flush().await?;
            print_json(&recorded)
        }
        Command::Decay { dry_run, force, now } => {
            let options = DecayRunOptions {
                simulate: dry_run,
                ignore_period_guard: force
            };
            let result = client.run_decay_cycle(now.unwrap_or_else(Utc::now), options).await;
            // Writes that did land in a partially failed run must still be persisted
            if !dry_run {
                client.flush().await?;
            }
            if let Some(partial) = result.as_ref().err().and_then(DbError::partial_decay_run) {
                print_json(&partial)?;
            }
            print_json(&result?)
        }
        Command::PreviewDecay {
            rating,
            last_active,
            floor,
            now
        } => {
            let constants = client.constants();
            let result = calculate_decay(
                rating,
                last_active,
                now.unwrap_or_else(Utc::now),
                floor.unwrap_or(constants.absolute_minimum_rating),
                constants
            );
            print_json(&result)
        }
        Command::Leaderboard => print_json(&client.leaderboard().await),
        Command::History { player_id } => print_json(&client.history(&player_id).await?),
        Command::Verify { rebuild } => {
            let mismatches: Vec<RatingMismatch> = if rebuild {
                let corrected = client.rebuild_ratings().await?;
                client.flush().await?;
                corrected
            } else {
                client.verify_ratings().await?
            };

            info!("{} player(s) differ from their replayed history", mismatches.len());
            print_json(&mismatches)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), DbError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
