//! Engine Console - interactive console over a database engine's stdio
//!
//! Plain input lines are sent to the engine; lines starting with `:` are
//! console commands (see `:help`).

use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Context};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};

use engine_console::config::loader::ConfigLoader;
use engine_console::{handle_startup_error, Config, ConsoleSession, OutputEvent};

/// Transcript shared between the output sink and the command loop
type Transcript = Arc<Mutex<Vec<OutputEvent>>>;

/// Command line options
#[derive(Debug, Default)]
struct AppArgs {
    /// Configuration file path
    config_path: Option<PathBuf>,
    /// Enable debug logging
    debug: bool,
    /// Explicit engine executable, bypassing the search
    engine: Option<PathBuf>,
    /// Override of `[console] auto_start`
    auto_start: Option<bool>,
}

impl AppArgs {
    /// Parse command line arguments
    fn parse() -> anyhow::Result<Self> {
        let args: Vec<String> = env::args().collect();
        let mut app_args = AppArgs::default();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--config" | "-c" => {
                    if i + 1 < args.len() {
                        app_args.config_path = Some(PathBuf::from(&args[i + 1]));
                        i += 1;
                    } else {
                        bail!("Missing config file path");
                    }
                }
                "--engine" | "-e" => {
                    if i + 1 < args.len() {
                        app_args.engine = Some(PathBuf::from(&args[i + 1]));
                        i += 1;
                    } else {
                        bail!("Missing engine executable path");
                    }
                }
                "--debug" | "-d" => {
                    app_args.debug = true;
                }
                "--auto-start" => {
                    app_args.auto_start = Some(true);
                }
                "--no-auto-start" => {
                    app_args.auto_start = Some(false);
                }
                "--help" | "-h" => {
                    print_help();
                    process::exit(0);
                }
                "--version" | "-v" => {
                    println!("{} v{}", engine_console::NAME, engine_console::VERSION);
                    process::exit(0);
                }
                arg if arg.starts_with('-') => {
                    bail!("Unknown option: {}", arg);
                }
                other => {
                    eprintln!("Ignoring positional argument: {}", other);
                }
            }
            i += 1;
        }

        Ok(app_args)
    }
}

/// Print help information
fn print_help() {
    println!("Engine Console - interactive console for the Db engine");
    println!();
    println!("USAGE:");
    println!("    engine-console [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <PATH>    Path to configuration file");
    println!("    -e, --engine <PATH>    Engine executable (skips the search)");
    println!("    -d, --debug            Enable debug logging");
    println!("        --auto-start       Start the engine immediately");
    println!("        --no-auto-start    Do not start the engine immediately");
    println!("    -h, --help             Print this help message");
    println!("    -v, --version          Print version information");
    println!();
    println!("CONFIGURATION:");
    println!("    Engine Console looks for configuration files in the following order:");
    println!("    1. Path specified with --config");
    println!("    2. $ENGINE_CONSOLE_CONFIG");
    println!("    3. $XDG_CONFIG_HOME/engine-console/config.toml");
    println!("    4. <platform config dir>/engine-console/config.toml");
    println!("    5. ~/.engine-console/config.toml");
    println!("    6. ./engine-console.toml");
    println!("    7. Built-in defaults");
    println!();
    println!("ENVIRONMENT:");
    println!("    ENGINE_CONSOLE_CONFIG  Path to configuration file");
    println!("    ENGINE_CONSOLE_DEBUG   Enable debug logging (1 or true)");
    println!("    RUST_LOG               Set logging filter (error, warn, info, debug, trace)");
}

fn print_commands() {
    println!("Console commands:");
    println!("    :start          Locate and start the engine");
    println!("    :stop           Stop the engine");
    println!("    :restart        Stop, then start the engine");
    println!("    :status         Show whether the engine is running");
    println!("    :history        List sent commands");
    println!("    :prev / :next   Recall older / newer commands");
    println!("    :run            Send the recalled command");
    println!("    :clear          Clear the output transcript");
    println!("    :save [FILE]    Save the transcript (.jsonl for JSON lines)");
    println!("    :quit           Stop the engine and exit");
    println!("Any other line is sent to the engine as-is.");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = AppArgs::parse().unwrap_or_else(|e| {
        eprintln!("Failed to parse arguments: {}", e);
        print_help();
        process::exit(1);
    });

    let mut config = match load_configuration(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", handle_startup_error(&e));
            process::exit(1);
        }
    };

    init_logging(&args, &config);
    info!("Starting {} v{}", engine_console::NAME, engine_console::VERSION);

    apply_overrides(&args, &mut config);

    let transcript: Transcript = Arc::new(Mutex::new(Vec::new()));
    let mut session = ConsoleSession::new(&config);
    let sink_transcript = Arc::clone(&transcript);
    let dispatcher = session
        .on_output(move |event: OutputEvent| {
            println!("{event}");
            if let Ok(mut lines) = sink_transcript.lock() {
                lines.push(event);
            }
        })
        .context("output queue already taken")?;

    println!("Type :help for console commands.");
    session.auto_start().await;

    if let Err(e) = run_repl(&mut session, &transcript).await {
        error!("Console input failed: {:#}", e);
    }

    session.close().await;
    drop(session);
    if tokio::time::timeout(Duration::from_secs(2), dispatcher)
        .await
        .is_err()
    {
        debug!("Output dispatcher still busy at exit");
    }

    info!("Engine console shutdown complete");
    Ok(())
}

/// Load configuration from `--config` or the default search paths
fn load_configuration(args: &AppArgs) -> engine_console::Result<Config> {
    match &args.config_path {
        Some(path) => engine_console::init_with_config(path),
        None => ConfigLoader::load(),
    }
}

/// Install the stderr log subscriber
///
/// `RUST_LOG` wins, then `--debug`/`ENGINE_CONSOLE_DEBUG`, then the
/// configured level.
fn init_logging(args: &AppArgs, config: &Config) {
    let debug_env = env::var("ENGINE_CONSOLE_DEBUG")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    let log_level = if args.debug || debug_env {
        "debug".to_string()
    } else {
        config.logging.level.to_ascii_lowercase()
    };

    let env_filter = env::var("RUST_LOG").unwrap_or(log_level);
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(env_filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

/// Fold command line overrides into the loaded configuration
fn apply_overrides(args: &AppArgs, config: &mut Config) {
    if let Some(auto_start) = args.auto_start {
        config.console.auto_start = auto_start;
    }

    if let Some(engine) = &args.engine {
        match (engine.parent(), engine.file_name()) {
            (Some(dir), Some(name)) => {
                debug!(path = %engine.display(), "Using engine from command line");
                let dir = if dir.as_os_str().is_empty() {
                    Path::new(".")
                } else {
                    dir
                };
                config.locator.base_dir = Some(dir.to_path_buf());
                config
                    .locator
                    .file_names
                    .insert(0, name.to_string_lossy().into_owned());
            }
            _ => warn!(path = %engine.display(), "Ignoring unusable --engine path"),
        }
    }
}

async fn run_repl(session: &mut ConsoleSession, transcript: &Transcript) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut recalled = String::new();

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        let Some(command) = input.strip_prefix(':') else {
            session.send(&line).await;
            recalled.clear();
            continue;
        };

        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, Some(arg.trim()).filter(|a| !a.is_empty())),
            None => (command, None),
        };

        match name {
            "start" => {
                session.start().await;
            }
            "stop" => {
                let _ = session.stop_in_background();
            }
            "restart" => {
                session.stop().await;
                session.start().await;
            }
            "status" => print_status(session),
            "history" => {
                for (i, entry) in session.history().entries().iter().enumerate() {
                    println!("{:>4}  {}", i + 1, entry);
                }
            }
            "prev" => {
                recalled = session.recall_previous(&recalled);
                println!("recalled: {recalled}");
            }
            "next" => {
                recalled = session.recall_next(&recalled);
                println!("recalled: {recalled}");
            }
            "run" => {
                if session.send(&recalled).await {
                    recalled.clear();
                }
            }
            "clear" => {
                if let Ok(mut lines) = transcript.lock() {
                    lines.clear();
                }
                session.notify("Console output cleared.");
            }
            "save" => {
                let path = arg.map(PathBuf::from).unwrap_or_else(default_transcript_path);
                match save_transcript(&path, transcript) {
                    Ok(count) => println!("Saved {count} lines to {}", path.display()),
                    Err(e) => println!("Failed to save transcript: {e:#}"),
                }
            }
            "quit" | "exit" | "q" => break,
            "help" => print_commands(),
            other => println!("Unknown console command ':{other}' (try :help)"),
        }
    }

    Ok(())
}

fn print_status(session: &ConsoleSession) {
    let state = if session.is_running() {
        "Engine Running"
    } else {
        "Engine Stopped"
    };
    match session.process() {
        Some(process) => println!("{state}: {process}"),
        None => println!("{state}"),
    }
}

fn default_transcript_path() -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    PathBuf::from(format!("engine-output-{stamp}.txt"))
}

/// Write the transcript as plain text, or JSON lines for `.jsonl` files
fn save_transcript(path: &Path, transcript: &Transcript) -> anyhow::Result<usize> {
    let events = match transcript.lock() {
        Ok(lines) => lines.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    };

    let json = path.extension().is_some_and(|ext| ext == "jsonl");
    let mut out = Vec::new();
    for event in &events {
        if json {
            serde_json::to_writer(&mut out, event)?;
            out.push(b'\n');
        } else {
            writeln!(out, "{event}")?;
        }
    }

    fs::write(path, out).with_context(|| format!("writing {}", path.display()))?;
    Ok(events.len())
}
