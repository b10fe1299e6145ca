//! PTY (console) channel: reads questions from stdin, prints replies to
//! stdout, and keeps the session memory for the conversation.
//!
//! Lines starting with `:` are console commands and never reach the
//! assistant. Runs until `:salir`, stdin closes, or the `shutdown` token is
//! cancelled (Ctrl-C). Cancellation is observed between turns, so a turn in
//! flight always finishes and memory is never left half-updated.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::assistant::Assistant;
use crate::error::AppError;
use crate::subsystems::memory::SessionMemory;

const HELP: &str = "Comandos:\n  \
:memoria               muestra el resumen y los datos recordados\n  \
:recordar clave=valor  guarda un dato de la sesión\n  \
:olvidar clave         borra un dato\n  \
:reiniciar             borra toda la memoria de la sesión\n  \
:stats                 métricas de la sesión\n  \
:ayuda                 esta ayuda\n  \
:salir                 termina";

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exit,
    Help,
    ShowMemory,
    Remember { key: String, value: String },
    Forget(String),
    Reset,
    Stats,
    /// A `:`-line that is not a known command, or has bad arguments.
    Invalid(String),
    Ask(String),
}

impl Command {
    pub fn parse(line: &str) -> Command {
        let line = line.trim();
        let Some(rest) = line.strip_prefix(':') else {
            return Command::Ask(line.to_string());
        };
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((n, a)) => (n, a.trim()),
            None => (rest, ""),
        };
        match name {
            "salir" | "exit" => Command::Exit,
            "ayuda" | "help" => Command::Help,
            "memoria" => Command::ShowMemory,
            "reiniciar" => Command::Reset,
            "stats" => Command::Stats,
            "recordar" => match arg.split_once('=') {
                Some((k, v)) if !k.trim().is_empty() => Command::Remember {
                    key: k.trim().to_string(),
                    value: v.trim().to_string(),
                },
                _ => Command::Invalid("uso: :recordar clave=valor".into()),
            },
            "olvidar" if !arg.is_empty() => Command::Forget(arg.to_string()),
            "olvidar" => Command::Invalid("uso: :olvidar clave".into()),
            other => Command::Invalid(format!("comando desconocido: :{other} (usa :ayuda)")),
        }
    }
}

/// Interactive console on stdin/stdout.
pub async fn run(assistant: &mut Assistant, shutdown: CancellationToken) -> Result<(), AppError> {
    info!("pty channel started; type a question and press Enter. Ctrl-C to quit.");
    let name = assistant.config().bot_name.clone();
    println!("─────────────────────────────────");
    println!(" {name}  (:ayuda para comandos, Ctrl-C para salir)");
    println!("─────────────────────────────────");

    let mut memory = SessionMemory::new();
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    run_session(assistant, &mut memory, stdin, &mut stdout, shutdown).await
}

/// The console loop over any line source and output sink.
pub async fn run_session<R, W>(
    assistant: &mut Assistant,
    memory: &mut SessionMemory,
    input: R,
    out: &mut W,
    shutdown: CancellationToken,
) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();

    loop {
        write!(out, "> ")?;
        out.flush()?;

        let line = tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                writeln!(out, "\n[pty] señal de cierre recibida")?;
                info!("pty channel shutting down");
                break;
            }

            line = lines.next_line() => line,
        };

        let input = match line {
            Err(e) => {
                warn!("pty read error: {e}");
                break;
            }
            Ok(None) => {
                info!("pty stdin closed");
                break;
            }
            Ok(Some(input)) if input.trim().is_empty() => continue,
            Ok(Some(input)) => input,
        };
        debug!(input = %input, "pty received line");

        match Command::parse(&input) {
            Command::Exit => break,
            Command::Help => writeln!(out, "{HELP}")?,
            Command::ShowMemory => {
                let summary = memory.summary(assistant.config().summary_chars);
                writeln!(out, "Resumen: {}", if summary.is_empty() { "(vacío)" } else { summary.as_str() })?;
                let facts: Vec<String> = memory.facts().map(|(k, v)| format!("{k}={v}")).collect();
                writeln!(out, "Datos: {}", if facts.is_empty() { "(ninguno)".to_string() } else { facts.join("; ") })?;
            }
            Command::Remember { key, value } => {
                writeln!(out, "Recordado: {key}={value}")?;
                memory.remember(key, value);
            }
            Command::Forget(key) => {
                if memory.forget(&key) {
                    writeln!(out, "Olvidado: {key}")?;
                } else {
                    writeln!(out, "No había un dato '{key}'")?;
                }
            }
            Command::Reset => {
                memory.clear();
                writeln!(out, "Memoria de la sesión reiniciada.")?;
            }
            Command::Stats => {
                let s = assistant.metrics().snapshot();
                let (used, limit) = assistant.rate_window();
                writeln!(
                    out,
                    "consultas: {} ok / {} error, rechazadas: {}, tokens: {}, latencia media: {:.3}s, ventana: {used}/{limit} por minuto",
                    s.requests_success,
                    s.requests_error,
                    s.rejected_total,
                    s.tokens_used_total,
                    s.mean_latency_seconds()
                )?;
            }
            Command::Invalid(msg) => writeln!(out, "{msg}")?,
            Command::Ask(question) => {
                let reply = assistant.reply(&question, memory).await;
                writeln!(out, "{}", reply.text)?;
                // Only completed turns enter the transcript.
                if reply.answered {
                    memory.add_turn("user", &question);
                    memory.add_turn("assistant", &reply.text);
                }
            }
        }
    }

    Ok(())
}
