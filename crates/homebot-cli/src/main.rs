//! `homebot` – home robot control binary.
//!
//! 1. Loads `~/.homebot/config.toml` (or `--config <path>`); `--init` writes
//!    the defaults there and exits.
//! 2. Probes the Ollama server and reports whether the chat model is present.
//! 3. Wires the camera, the control board (Arduino serial link or the
//!    simulated board when `arduino.port = "sim"`), the console speech
//!    adapter and the chat client into a [`TurnLoop`].
//! 4. Runs turns until Ctrl-C, then releases the camera and the board.  A
//!    fatal collaborator failure releases them too and exits non-zero.

mod config;
mod console;
mod ollama;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::{ArgAction, Parser};
use colored::Colorize;
use homebot_hal::sim::{ScriptedClassifier, SimBoard, SimCamera};
use homebot_hal::{ArduinoLink, ControlBoard, LabelTable};
use homebot_perception::PerceptionPipeline;
use homebot_runtime::{LlmDriver, TurnLoop, init_tracing};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::console::{ConsoleEar, ConsoleVoice};

#[derive(Parser, Debug)]
#[command(
    name = "homebot",
    version,
    about = "Home robot: camera perception, spoken dialogue with a local LLM, Arduino actuation"
)]
struct Cli {
    /// Path to the TOML configuration file [default: ~/.homebot/config.toml]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the default configuration to the config path and exit
    #[arg(long, action = ArgAction::SetTrue)]
    init: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _telemetry = init_tracing("homebot");

    print_banner();

    let path = cli.config.unwrap_or_else(config::config_path);

    if cli.init {
        return match config::save_to(&Config::default(), &path) {
            Ok(()) => {
                println!(
                    "  {} Config written to {}",
                    "✓".green().bold(),
                    path.display().to_string().bold()
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}: {}", "Error saving config".red(), e);
                ExitCode::FAILURE
            }
        };
    }

    let cfg = match config::load_from(&path) {
        Ok(Some(cfg)) => {
            println!("  Config loaded from {}", path.display().to_string().bold());
            cfg
        }
        Ok(None) => {
            println!(
                "  No config at {}; using defaults (run with {} to write them).",
                path.display().to_string().bold(),
                "--init".bold()
            );
            let mut cfg = Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
        Err(e) => {
            eprintln!("{}: {}", "Config error".red(), e);
            return ExitCode::FAILURE;
        }
    };

    probe_ollama(&cfg);

    // ── Shutdown flag ─────────────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!(
            "{}",
            "⚠  Interrupt received – finishing the current turn …".yellow().bold()
        );
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; stop the robot from the prompt instead");
    }

    println!(
        "\n  Speak by typing.  Empty line = silence, {} to stop.\n",
        "Ctrl-D".bold().cyan()
    );

    match run(&cfg, shutdown) {
        Ok(turns) => {
            info!(turns, "homebot stopped");
            println!("{}", "  ✓ Hardware released. Bye.".green());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "homebot stopped on a fatal error");
            eprintln!("{}: {}", "Fatal".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// Build the loop, run it to completion and always close it.
fn run(cfg: &Config, shutdown: Arc<AtomicBool>) -> Result<u64, String> {
    let turn_config = cfg.turn_loop()?;
    let board = open_board(cfg)?;
    let perception = open_perception(cfg);
    if cfg.audio.has_device_settings() {
        warn!(
            input_device_index = ?cfg.audio.input_device_index,
            output_voice = ?cfg.audio.output_voice,
            "console speech adapter ignores audio device settings"
        );
    }
    let ear = ConsoleEar::new(shutdown.clone()).map_err(|e| e.to_string())?;
    let chat = LlmDriver::new(
        cfg.ollama.base_url.as_str(),
        cfg.ollama.model.as_str(),
        cfg.ollama.temperature,
    );

    let mut turn_loop = TurnLoop::new(
        turn_config,
        perception,
        board,
        Box::new(ear),
        Box::new(ConsoleVoice),
        Box::new(chat),
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start async runtime: {}", e))?;
    let outcome = runtime.block_on(turn_loop.run_until(&shutdown));
    let closed = turn_loop.close();

    let turns = outcome.map_err(|e| e.to_string())?;
    closed.map_err(|e| e.to_string())?;
    Ok(turns)
}

fn open_board(cfg: &Config) -> Result<Box<dyn ControlBoard>, String> {
    if cfg.arduino.is_simulated() {
        info!("using simulated control board");
        return Ok(Box::new(SimBoard::new()));
    }
    let link = ArduinoLink::open(&cfg.arduino.port, cfg.arduino.baudrate, cfg.arduino.timeout()?)
        .map_err(|e| e.to_string())?;
    info!(port = %cfg.arduino.port, baud = cfg.arduino.baudrate, "Arduino link open");
    Ok(Box::new(link))
}

// The detection model runs outside this workspace; until a driver for it is
// wired in the pipeline sees an empty room.
fn open_perception(cfg: &Config) -> PerceptionPipeline {
    warn!(
        model = %cfg.vision.model_path,
        camera = cfg.vision.camera_index,
        "no detection model driver available; using the simulated camera"
    );
    PerceptionPipeline::new(
        Box::new(SimCamera::new(format!("sim-camera-{}", cfg.vision.camera_index))),
        Box::new(ScriptedClassifier::new(LabelTable::new())),
        cfg.perception(),
    )
}

fn probe_ollama(cfg: &Config) {
    print!("\n  Probing Ollama at {} … ", cfg.ollama.base_url.dimmed());
    std::io::stdout().flush().ok();
    match ollama::fetch_models(&cfg.ollama.base_url) {
        Ok(models) if ollama::model_available(&models, &cfg.ollama.model) => {
            println!("{} (model {} ready)", "online".green(), cfg.ollama.model.bold());
        }
        Ok(models) => {
            println!("{} ({} model(s) available)", "online".green(), models.len());
            println!(
                "  {}  Run `{}` before talking to the robot.",
                format!("Model {} not found.", cfg.ollama.model).yellow(),
                format!("ollama pull {}", cfg.ollama.model).bold()
            );
        }
        Err(e) => {
            println!("{}", "offline".yellow());
            warn!(error = %e, "Ollama probe failed");
            println!(
                "  {}  Run `{}` to start a local AI.",
                "No Ollama instance detected.".dimmed(),
                "ollama serve".bold()
            );
        }
    }
}

fn print_banner() {
    println!();
    println!("{}", r#"  _                         _           _   "#.bold().cyan());
    println!("{}", r#" | |__   ___  _ __ ___   ___| |__   ___ | |_ "#.bold().cyan());
    println!("{}", r#" | '_ \ / _ \| '_ ` _ \ / _ \ '_ \ / _ \| __|"#.bold().cyan());
    println!("{}", r#" | | | | (_) | | | | | |  __/ |_) | (_) | |_ "#.bold().cyan());
    println!("{}", r#" |_| |_|\___/|_| |_| |_|\___|_.__/ \___/ \__|"#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "homebot".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!();
}
