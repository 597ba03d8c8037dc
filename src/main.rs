// src/main.rs
use actix_files::Files;
use actix_web::{App, HttpServer};
use clap::{Parser, Subcommand};
use double_pendulum_sim::{ui, PendulumModel, Playback, SimulationConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "double-pendulum-sim")]
#[command(about = "Double pendulum simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve and play the simulation back in the terminal
    Run {
        #[command(flatten)]
        config: SimulationConfig,
        /// Print frames as fast as possible instead of at the frame rate
        #[arg(long)]
        no_delay: bool,
        /// Print one JSON object per frame instead of the info lines
        #[arg(long)]
        json: bool,
    },
    /// Serve the simulation API and the browser player
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: String,
        /// Directory holding index.html and friends
        #[arg(long, default_value = "static")]
        static_dir: PathBuf,
    },
}

#[actix_web::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Run {
            config,
            no_delay,
            json,
        } => run(&config, no_delay, json).await,
        Commands::Serve { bind, static_dir } => serve(&bind, static_dir).await,
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(
    config: &SimulationConfig,
    no_delay: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let validated = config.validate()?;
    let model = PendulumModel::from_config(&validated)?;
    let mut playback = Playback::new(&model, &validated);
    info!(
        frames = playback.frame_count(),
        stride = playback.stride(),
        "starting playback"
    );

    // EndOfSimulation is the normal way out of this loop
    while let Ok(frame) = playback.next_frame() {
        if json {
            println!("{}", serde_json::to_string(&frame)?);
        } else {
            println!(
                "t={:8.2}s  {}  |  {}  |  trail {}",
                frame.time,
                frame.info[0],
                frame.info[1],
                playback.path().len()
            );
        }
        if !no_delay {
            tokio::time::sleep(playback.frame_delay()).await;
        }
    }
    Ok(())
}

async fn serve(bind: &str, static_dir: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    info!(%bind, static_dir = %static_dir.display(), "starting server");
    HttpServer::new(move || {
        App::new()
            .configure(ui::routes)
            .service(Files::new("/", static_dir.clone()).index_file("index.html"))
    })
    .bind(bind)?
    .run()
    .await?;
    Ok(())
}
