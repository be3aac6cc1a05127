/// Musify - playback engine driver
use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand, ValueEnum};
use musify_core::{AuthProvider, Track};
use musify_cli::{
    config::AppConfig,
    report,
    tracks,
    transport::LoggingTransport,
    wiring::{build_resolver, connect_catalog},
};
use musify_playback::{PlaybackEvent, PlaybackStatus, Player, RepeatMode};
use musify_source::Provider;
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "musify")]
#[command(about = "Resolve and play tracks with the Musify playback engine", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./musify.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Use the simulated flaky source even when a source URL is configured
    #[arg(long, global = true)]
    simulate: bool,

    /// Seed for the simulated source
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one track and print every attempt
    Resolve {
        /// Track id
        id: String,
        /// Track name
        #[arg(long, default_value = "Unknown Track")]
        name: String,
        /// Artist name
        #[arg(long, default_value = "Unknown Artist")]
        artist: String,
        /// Provider to ask
        #[arg(long, value_enum, default_value_t = ProviderArg::Primary)]
        provider: ProviderArg,
    },
    /// Play a queue until it runs out
    Play {
        /// Search the catalog for tracks
        #[arg(short, long, conflicts_with = "file")]
        query: Option<String>,
        /// Read tracks from a JSON file
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Number of generated demo tracks when neither --query nor --file is given
        #[arg(long, default_value_t = 3)]
        demo: usize,
        /// Length of each demo track in seconds
        #[arg(long, default_value_t = 5)]
        demo_seconds: u64,
        /// Start with shuffle on
        #[arg(long)]
        shuffle: bool,
        /// Initial repeat mode
        #[arg(long, value_enum)]
        repeat: Option<RepeatArg>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ProviderArg {
    Primary,
    Secondary,
}

impl From<ProviderArg> for Provider {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Primary => Provider::Primary,
            ProviderArg::Secondary => Provider::Secondary,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum RepeatArg {
    Off,
    All,
    One,
}

impl From<RepeatArg> for RepeatMode {
    fn from(arg: RepeatArg) -> Self {
        match arg {
            RepeatArg::Off => RepeatMode::Off,
            RepeatArg::All => RepeatMode::All,
            RepeatArg::One => RepeatMode::One,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if cli.seed.is_some() {
        config.source.seed = cli.seed;
    }
    config.validate()?;

    match cli.command {
        Commands::Resolve {
            id,
            name,
            artist,
            provider,
        } => {
            resolve(&config, cli.simulate, Track::new(id, name, artist), provider.into()).await?;
        }
        Commands::Play {
            query,
            file,
            demo,
            demo_seconds,
            shuffle,
            repeat,
        } => {
            if shuffle {
                config.playback.shuffle = true;
            }
            if let Some(repeat) = repeat {
                config.playback.repeat = repeat.into();
            }

            let source = TrackSource::pick(query, file, demo, Duration::from_secs(demo_seconds));
            play(&config, cli.simulate, source).await?;
        }
    }

    Ok(())
}

async fn resolve(
    config: &AppConfig,
    simulate: bool,
    track: Track,
    provider: Provider,
) -> anyhow::Result<()> {
    let catalog = connect_catalog(config).await?;
    let auth = catalog.as_ref().map(|c| c.token_store() as Arc<dyn AuthProvider>);
    let resolver = build_resolver(config, simulate, auth)?;

    tracing::info!(track_id = %track.id, provider = %provider, "Resolving");

    match resolver.resolve(&track, provider).await {
        Ok(resolution) => {
            for (i, attempt) in resolution.attempts.iter().enumerate() {
                println!("{}", report::attempt_line(i, attempt));
            }
            if resolution.direct {
                println!("direct source URL, no endpoint call");
            }
            println!(
                "resolved via {} in {} ms: {}",
                resolution.provider,
                resolution.elapsed.as_millis(),
                resolution.url
            );
            Ok(())
        }
        Err(e) => {
            for (i, attempt) in e.attempts().iter().enumerate() {
                println!("{}", report::attempt_line(i, attempt));
            }
            Err(e.into())
        }
    }
}

enum TrackSource {
    Catalog(String),
    File(PathBuf),
    Demo(usize, Duration),
}

impl TrackSource {
    fn pick(query: Option<String>, file: Option<PathBuf>, demo: usize, length: Duration) -> Self {
        match (query, file) {
            (Some(query), _) => Self::Catalog(query),
            (None, Some(file)) => Self::File(file),
            (None, None) => Self::Demo(demo, length),
        }
    }
}

async fn play(config: &AppConfig, simulate: bool, source: TrackSource) -> anyhow::Result<()> {
    let catalog = connect_catalog(config).await?;
    let auth = catalog.as_ref().map(|c| c.token_store() as Arc<dyn AuthProvider>);

    let queue = match source {
        TrackSource::Catalog(query) => {
            let client = catalog
                .as_ref()
                .ok_or_else(|| anyhow!("--query needs catalog.url (or MUSIFY_CATALOG__URL)"))?;
            tracks::search(client, &query, config.catalog.search_limit).await?
        }
        TrackSource::File(path) => tracks::load_json(&path)
            .await
            .with_context(|| format!("reading tracks from {}", path.display()))?,
        TrackSource::Demo(count, length) => tracks::demo_tracks(count, length),
    };

    tracing::info!(tracks = queue.len(), "Queue loaded");

    let resolver = build_resolver(config, simulate, auth)?;
    let player = Player::new(
        Arc::new(resolver),
        Arc::new(LoggingTransport),
        config.playback.clone(),
    );

    let mut events = player.subscribe_events();
    let driver = player.spawn_wall_clock();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    tokio::select! {
        started = player.play_queue(queue, 0) => {
            started?;
        }
        _ = &mut ctrl_c => {
            tracing::info!("Interrupted");
            player.teardown();
            driver.await?;
            return Ok(());
        }
    }

    let mut failed = None;
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    if report::is_notable(&event) {
                        println!("{}", serde_json::to_string(&event)?);
                    }
                    match event {
                        PlaybackEvent::StateChanged { status: PlaybackStatus::Stopped } => break,
                        // Follows the StateChanged into Error
                        PlaybackEvent::Error { message, .. } => {
                            failed = Some(message);
                            break;
                        }
                        _ => {}
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event stream lagged");
                }
                Err(RecvError::Closed) => break,
            },
            _ = &mut ctrl_c => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    let history = player.history();
    player.teardown();
    driver.await?;

    tracing::info!(played = history.len(), "Playback finished");

    match failed {
        Some(message) => Err(anyhow!("playback failed: {}", message)),
        None => Ok(()),
    }
}
