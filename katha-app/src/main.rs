//! Katha CLI - AI Indian Storyteller
//!
//! Serves the storyteller web form, or tells a single tale in the terminal.

#![allow(clippy::print_stdout)] // CLI program intentionally uses stdout

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use katha::prelude::*;
use katha_app::backend::Backends;
use katha_app::config::{self, IssueLevel, KathaConfig};
use katha_app::error::{AppError, Result};
use katha_app::server::{self, AppState};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Katha - weave Indian tales with hosted or local LLMs
#[derive(Parser)]
#[command(name = "katha")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "KATHA_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the storyteller web app
    Serve(ServeArgs),

    /// Tell one story in the terminal
    Tell(TellArgs),

    /// Show backends and configuration
    Status,

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for the serve command
#[derive(Args)]
struct ServeArgs {
    /// Listen address (overrides config)
    #[arg(short, long)]
    addr: Option<String>,
}

/// Arguments for the tell command
#[derive(Args)]
struct TellArgs {
    /// Main idea or topic of the story
    #[arg(short, long)]
    topic: String,

    /// Genre (folktale, fantasy, mystery, sci-fi, romance, horror)
    #[arg(short, long, default_value = "folktale")]
    genre: Genre,

    /// Tone (heartwarming, funny, dark-and-gritty, poetic, suspenseful)
    #[arg(short = 'T', long, default_value = "heartwarming")]
    tone: Tone,

    /// Length (short, medium, long)
    #[arg(short, long, default_value = "short")]
    length: Length,

    /// Character descriptions
    #[arg(long)]
    characters: Option<String>,

    /// Model (base, fine-tuned)
    #[arg(short, long, default_value = "base")]
    model: ModelChoice,

    /// Revision instructions, applied in order
    #[arg(short, long)]
    revise: Vec<String>,

    /// Narrate the final story into this audio file
    #[arg(short, long)]
    speak: Option<PathBuf>,
}

/// Arguments for the config command
#[derive(Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show configuration file path
    Path,
    /// Show the effective configuration (credentials redacted)
    Show,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Validate configuration
    Validate,
}

fn main() -> ExitCode {
    // Load .env file if present
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    init_logging(cli.verbose);
    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "ignoring unreadable .env"),
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging with the given verbosity level.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "katha_app={level},katha={level},tower_http={},{}",
            if verbosity >= 1 { "debug" } else { "warn" },
            if verbosity >= 2 { "debug" } else { "warn" }
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let path = config::resolve_path(cli.config);
    match cli.command {
        Commands::Serve(args) => cmd_serve(args, &path).await,
        Commands::Tell(args) => cmd_tell(args, &path).await,
        Commands::Status => cmd_status(&path).await,
        Commands::Config(args) => cmd_config(args, &path).await,
    }
}

/// Load the effective configuration and refuse to continue on errors.
async fn load_checked(path: &std::path::Path) -> Result<KathaConfig> {
    let config = config::load(path).await?;

    let issues = config.validate();
    for issue in &issues {
        match issue.level {
            IssueLevel::Error => tracing::error!("{issue}"),
            IssueLevel::Warning => tracing::warn!("{issue}"),
        }
    }
    if !config.is_valid() {
        return Err(AppError::config(format!(
            "{} has errors; run 'katha config validate'",
            path.display()
        )));
    }
    Ok(config)
}

/// Start the web app.
async fn cmd_serve(args: ServeArgs, path: &std::path::Path) -> Result<()> {
    let mut config = load_checked(path).await?;
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }

    let state = AppState::new(Backends::from_config(&config)?)?
        .with_idle_timeout(Duration::from_secs(config.server.session_idle_secs));
    let listener = tokio::net::TcpListener::bind(&config.server.addr)
        .await
        .map_err(|e| AppError::server(format!("cannot bind {}: {e}", config.server.addr)))?;

    println!("Storyteller ready at http://{}", listener.local_addr()?);
    server::serve(listener, state).await
}

/// Tell one story in the terminal.
async fn cmd_tell(args: TellArgs, path: &std::path::Path) -> Result<()> {
    let config = load_checked(path).await?;
    let backends = Backends::from_config(&config)?;

    let mut params = StoryParameters::new(args.topic)
        .genre(args.genre)
        .tone(args.tone)
        .length(args.length);
    if let Some(characters) = args.characters {
        params = params.characters(characters);
    }

    let mut session = backends.session();
    session.set_model(Some(backends.resolve_model(args.model)?.to_owned()));

    println!("The storyteller is gathering inspiration...\n");
    session.generate(&params).await?;

    for instruction in &args.revise {
        println!("The storyteller is reimagining the tale...\n");
        session.revise(instruction).await?;
    }

    let story = session.current().unwrap_or_default();
    println!("{story}");

    if let Some(out) = args.speak {
        let narrator = backends
            .narrator
            .as_ref()
            .ok_or_else(|| AppError::config("narration is turned off (speech.backend = \"none\")"))?;
        let audio = narrator.narrate(story).await?;
        audio.save(&out)?;
        println!("\nAudio saved to {}", out.display());
    }

    Ok(())
}

/// Show status.
async fn cmd_status(path: &std::path::Path) -> Result<()> {
    println!("Katha Status\n");

    println!("Configuration:");
    println!("  Path:   {}", path.display());
    println!("  Exists: {}", if path.exists() { "yes" } else { "no" });

    match config::load(path).await {
        Ok(config) => {
            println!(
                "  Valid:  {}",
                if config.is_valid() { "yes" } else { "no" }
            );
            println!();
            println!("Storyteller:");
            println!("  Backend:     {}", config.llm.backend);
            println!(
                "  Model:       {}",
                config.llm.model.as_deref().unwrap_or("(backend default)")
            );
            println!(
                "  Fine-tuned:  {}",
                config.llm.fine_tuned_model.as_deref().unwrap_or("(none)")
            );
            println!("  Max tokens:  {}", config.llm.max_output_tokens);
            println!(
                "  Credential:  {}",
                if config.llm.api_key.is_some() { "set" } else { "not set" }
            );
            println!();
            println!("Narration:");
            println!("  Backend:     {:?}", config.speech.backend);
            println!("  Language:    {}", config.speech.language);
            println!(
                "  Credential:  {}",
                if config.speech.api_key.is_some() { "set" } else { "not set" }
            );
            println!();
            println!("Server:");
            println!("  Address:     {}", config.server.addr);
            println!("  Idle expiry: {}s", config.server.session_idle_secs);
        }
        Err(e) => {
            println!("  Valid:  no ({e})");
        }
    }

    println!();
    println!("Environment:");
    for key in [
        "KATHA_API_KEY",
        "HF_TOKEN",
        "hugging_key",
        "OPENAI_API_KEY",
        "KATHA_SPEECH_API_KEY",
        "KATHA_BACKEND",
        "KATHA_MODEL",
        "KATHA_BASE_URL",
        "KATHA_ADDR",
    ] {
        print_env_status(key);
    }

    Ok(())
}

/// Configuration management.
async fn cmd_config(args: ConfigArgs, path: &std::path::Path) -> Result<()> {
    match args.command {
        ConfigCommands::Path => {
            println!("{}", path.display());
        }
        ConfigCommands::Show => {
            let mut config = config::load(path).await?;
            for key in [&mut config.llm.api_key, &mut config.speech.api_key] {
                if key.is_some() {
                    *key = Some("[REDACTED]".to_owned());
                }
            }
            let rendered = toml::to_string_pretty(&config)
                .map_err(|e| AppError::config(format!("failed to render config: {e}")))?;
            println!("{rendered}");
        }
        ConfigCommands::Init { force } => {
            config::init_config(path, force).await?;
            println!("Configuration created: {}", path.display());
            println!();
            println!("Next steps:");
            println!("  1. edit {}", path.display());
            println!("  2. export HF_TOKEN=<token>   (hosted backend only)");
            println!("  3. katha serve");
        }
        ConfigCommands::Validate => {
            let config = config::load(path).await?;
            let issues = config.validate();
            if issues.is_empty() {
                println!("Configuration is valid");
            }
            for issue in &issues {
                println!("{issue}");
            }
            if !config.is_valid() {
                return Err(AppError::config("configuration has errors"));
            }
        }
    }

    Ok(())
}

fn print_env_status(key: &str) {
    let state = if std::env::var_os(key).is_some() {
        "set"
    } else {
        "not set"
    };
    println!("  {key:<16} {state}");
}
