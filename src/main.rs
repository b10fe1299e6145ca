//! campus-bot: console entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Resolve effective log level (CLI `-v` flags > env > config)
//!   4. Init logger once
//!   5. Build the assistant (provider, retriever, guard, event log)
//!   6. Spawn Ctrl-C → shutdown signal watcher
//!   7. Run the console until `:salir`, EOF or shutdown

use tokio_util::sync::CancellationToken;
use tracing::info;

use campus_bot::assistant::Assistant;
use campus_bot::config::{self, AnswerMode, Config};
use campus_bot::error::AppError;
use campus_bot::logger;
use campus_bot::subsystems::comms::pty;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // .env is optional.
    let _ = dotenvy::dotenv();

    let args = parse_cli_args();
    let config = config::load(args.config_path.as_deref())?;

    let effective_log_level = args.log_level.unwrap_or(config.log_level.as_str());
    let force_cli_level = args.log_level.is_some();
    logger::init(effective_log_level, force_cli_level, config.observability.log_file.as_deref())?;

    info!(
        bot_name = %config.bot_name,
        configured_log_level = %config.log_level,
        effective_log_level = %effective_log_level,
        docs_dir = %config.retrieval.docs_dir.display(),
        event_log = %config.observability.event_log.display(),
        "config loaded"
    );

    print_startup_summary(&config);
    let mut assistant = Assistant::from_config(config)?;

    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, initiating shutdown");
            ctrlc_token.cancel();
        }
    });

    pty::run(&mut assistant, shutdown.clone()).await?;
    shutdown.cancel();

    let snap = assistant.metrics().snapshot();
    info!(
        requests_ok = snap.requests_success,
        requests_error = snap.requests_error,
        rejected = snap.rejected_total,
        tokens = snap.tokens_used_total,
        "session finished"
    );

    {
        use std::io::Write as _;
        println!("\n¡Hasta pronto!");
        let _ = std::io::stdout().flush();
    }
    Ok(())
}

fn print_startup_summary(config: &Config) {
    let fit = |text: String| -> String {
        const WIDTH: usize = 58;
        let char_count = text.chars().count();
        if char_count >= WIDTH {
            let mut out = text.chars().take(WIDTH - 1).collect::<String>();
            out.push('…');
            out
        } else {
            format!("{text:<WIDTH$}")
        }
    };

    let mode = match config.mode {
        AnswerMode::Simple => "simple (retrieval + one call)",
        AnswerMode::Orchestrated => "orchestrated (domain agents + fusion)",
    };
    let llm_line = format!(
        "provider={} model={} timeout={}s",
        config.llm.provider, config.llm.openai.model, config.llm.openai.timeout_seconds
    );
    let guard_line = format!(
        "max_input={} chars, rate={}/min",
        config.guard.max_input_length, config.guard.rate_limit_per_min
    );

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ 🎓 {}║", fit(config.bot_name.clone()));
    println!("╟──────────────────────────────────────────────────────────────╢");
    println!("║   {}║", fit(format!("mode: {mode}")));
    println!("║   {}║", fit(format!("docs: {}", config.retrieval.docs_dir.display())));
    println!("║   {}║", fit(format!("llm: {llm_line}")));
    println!("║   {}║", fit(format!("guard: {guard_line}")));
    println!("║   {}║", fit(format!("events: {}", config.observability.event_log.display())));
    println!("╚══════════════════════════════════════════════════════════════╝");
}

struct CliArgs {
    log_level: Option<&'static str>,
    config_path: Option<String>,
}

fn parse_cli_args() -> CliArgs {
    let mut verbosity = 0u8;
    let mut config_path = None;

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--" {
            break;
        }

        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: campus-bot [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help                 Print help");
                println!("  -f, --config <PATH>        Path to configuration file (default: config/default.toml)");
                println!("  -v, -vv, -vvv, -vvvv       Increase logging verbosity");
                std::process::exit(0);
            }
            "-f" | "--config" => {
                if let Some(path) = iter.next() {
                    config_path = Some(path);
                } else {
                    eprintln!("error: -f/--config requires a path argument");
                    std::process::exit(1);
                }
            }
            "--verbose" => verbosity = verbosity.saturating_add(1),
            a if a.starts_with('-') && a.len() > 1 && a.chars().skip(1).all(|c| c == 'v') => {
                verbosity = verbosity.saturating_add((a.len() - 1) as u8);
            }
            _ => {}
        }
    }

    CliArgs { log_level: logger::level_for_verbosity(verbosity), config_path }
}
