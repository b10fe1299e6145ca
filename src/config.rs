//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` (or the path given with `-f`), then applies
//! env overrides: `CAMPUS_LOG_LEVEL`, `CAMPUS_DOCS_DIR`, `LOG_PATH`,
//! `OPENAI_BASE_URL`, `RATE_LIMIT_PER_MIN` and `MAX_INPUT_LENGTH`.
//! The API key is read from `LLM_API_KEY` (or `OPENAI_API_KEY`) only.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::AppError;

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// How a question is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerMode {
    /// Retrieval + one model call.
    Simple,
    /// Classify, fan out to domain agents, fuse.
    Orchestrated,
}

impl AnswerMode {
    fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "simple" => Ok(AnswerMode::Simple),
            "orchestrated" | "multi-agent" => Ok(AnswerMode::Orchestrated),
            other => Err(AppError::Config(format!("unknown assistant mode: '{other}'"))),
        }
    }
}

/// Local document retrieval settings (`[retrieval]`).
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Directory holding `.txt` / `.md` documents (already expanded, no `~`).
    pub docs_dir: PathBuf,
    pub top_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Score bonus for chunks whose file name contains the domain hint.
    pub hint_bonus: usize,
}

/// Input validation and throttling (`[guard]`).
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Maximum question length in characters.
    pub max_input_length: usize,
    /// Accepted requests per sliding 60-second window.
    pub rate_limit_per_min: usize,
}

/// Structured event log settings (`[observability]`).
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// JSONL file receiving one record per logged event.
    pub event_log: PathBuf,
    /// Optional file for diagnostic `tracing` output (stderr when `None`).
    pub log_file: Option<PathBuf>,
}

/// OpenAI / OpenAI-compatible provider configuration (`[llm.openai]`).
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Full chat completions endpoint URL.
    pub api_base_url: String,
    pub model: String,
    /// Used when a request does not carry its own temperature.
    pub temperature: f32,
    pub timeout_seconds: u64,
}

/// LLM configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Active provider (`"dummy"` or `"openai"`), `default` in `[llm]`.
    pub provider: String,
    pub openai: OpenAiConfig,
}

/// Fully-resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_name: String,
    pub log_level: String,
    pub mode: AnswerMode,
    /// Character budget of the memory summary sent to the model.
    pub summary_chars: usize,
    /// Directory of prompt templates (`config/prompts` by default).
    pub prompts_dir: PathBuf,
    pub retrieval: RetrievalConfig,
    pub guard: GuardConfig,
    pub observability: ObservabilityConfig,
    pub llm: LlmConfig,
    /// From `LLM_API_KEY` / `OPENAI_API_KEY`. Never sourced from TOML.
    pub llm_api_key: Option<String>,
}

/// Env-sourced overrides, collected once so tests can pass them explicitly.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub log_level: Option<String>,
    pub docs_dir: Option<String>,
    pub event_log: Option<String>,
    pub api_base_url: Option<String>,
    pub rate_limit_per_min: Option<String>,
    pub max_input_length: Option<String>,
    pub api_key: Option<String>,
}

impl Overrides {
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("CAMPUS_LOG_LEVEL").ok(),
            docs_dir: env::var("CAMPUS_DOCS_DIR").ok(),
            event_log: env::var("LOG_PATH").ok(),
            api_base_url: env::var("OPENAI_BASE_URL").ok(),
            rate_limit_per_min: env::var("RATE_LIMIT_PER_MIN").ok(),
            max_input_length: env::var("MAX_INPUT_LENGTH").ok(),
            api_key: env::var("LLM_API_KEY").or_else(|_| env::var("OPENAI_API_KEY")).ok(),
        }
    }
}

// ── Raw TOML shape ────────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    assistant: RawAssistant,
    #[serde(default)]
    retrieval: RawRetrieval,
    #[serde(default)]
    guard: RawGuard,
    #[serde(default)]
    observability: RawObservability,
    #[serde(default)]
    llm: RawLlm,
}

#[derive(Deserialize)]
struct RawAssistant {
    #[serde(default = "default_bot_name")]
    name: String,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default = "default_mode")]
    mode: String,
    #[serde(default = "default_summary_chars")]
    summary_chars: usize,
    #[serde(default = "default_prompts_dir")]
    prompts_dir: String,
}

impl Default for RawAssistant {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            log_level: default_log_level(),
            mode: default_mode(),
            summary_chars: default_summary_chars(),
            prompts_dir: default_prompts_dir(),
        }
    }
}

#[derive(Deserialize)]
struct RawRetrieval {
    #[serde(default = "default_docs_dir")]
    docs_dir: String,
    #[serde(default = "default_top_k")]
    top_k: usize,
    #[serde(default = "default_chunk_size")]
    chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    chunk_overlap: usize,
    #[serde(default = "default_hint_bonus")]
    hint_bonus: usize,
}

impl Default for RawRetrieval {
    fn default() -> Self {
        Self {
            docs_dir: default_docs_dir(),
            top_k: default_top_k(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            hint_bonus: default_hint_bonus(),
        }
    }
}

#[derive(Deserialize)]
struct RawGuard {
    #[serde(default = "default_max_input_length")]
    max_input_length: usize,
    #[serde(default = "default_rate_limit")]
    rate_limit_per_min: usize,
}

impl Default for RawGuard {
    fn default() -> Self {
        Self {
            max_input_length: default_max_input_length(),
            rate_limit_per_min: default_rate_limit(),
        }
    }
}

#[derive(Deserialize)]
struct RawObservability {
    #[serde(default = "default_event_log")]
    event_log: String,
    #[serde(default)]
    log_file: Option<String>,
}

impl Default for RawObservability {
    fn default() -> Self {
        Self { event_log: default_event_log(), log_file: None }
    }
}

#[derive(Deserialize)]
struct RawLlm {
    /// Maps to `default = "..."` in `[llm]`.
    #[serde(rename = "default", default = "default_llm_provider")]
    provider: String,
    #[serde(default)]
    openai: RawOpenAiConfig,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self { provider: default_llm_provider(), openai: RawOpenAiConfig::default() }
    }
}

#[derive(Deserialize)]
struct RawOpenAiConfig {
    #[serde(default = "default_openai_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_openai_model")]
    model: String,
    #[serde(default = "default_openai_temperature")]
    temperature: f32,
    #[serde(default = "default_openai_timeout_seconds")]
    timeout_seconds: u64,
}

impl Default for RawOpenAiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_openai_api_base_url(),
            model: default_openai_model(),
            temperature: default_openai_temperature(),
            timeout_seconds: default_openai_timeout_seconds(),
        }
    }
}

fn default_bot_name() -> String { "campus-bot".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_mode() -> String { "orchestrated".to_string() }
fn default_summary_chars() -> usize { 600 }
fn default_prompts_dir() -> String { "config/prompts".to_string() }
fn default_docs_dir() -> String { "docs".to_string() }
fn default_top_k() -> usize { 3 }
fn default_chunk_size() -> usize { 800 }
fn default_chunk_overlap() -> usize { 120 }
fn default_hint_bonus() -> usize { 4 }
fn default_max_input_length() -> usize { 1000 }
fn default_rate_limit() -> usize { 10 }
fn default_event_log() -> String { "logs/agent.log".to_string() }
fn default_llm_provider() -> String { "dummy".to_string() }
fn default_openai_api_base_url() -> String { "https://api.openai.com/v1/chat/completions".to_string() }
fn default_openai_model() -> String { "gpt-4o".to_string() }
fn default_openai_temperature() -> f32 { 0.5 }
fn default_openai_timeout_seconds() -> u64 { 60 }

/// Load config from `path` (default `config/default.toml`), then apply env overrides.
///
/// A missing default file is not an error: built-in defaults apply. An
/// explicitly requested file must exist.
pub fn load(path: Option<&str>) -> Result<Config, AppError> {
    let overrides = Overrides::from_env();
    match path {
        Some(p) => load_from(Path::new(p), &overrides),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                load_from(default_path, &overrides)
            } else {
                tracing::debug!("{DEFAULT_CONFIG_PATH} not found, using built-in defaults");
                resolve(RawConfig::default(), &overrides)
            }
        }
    }
}

/// Load from an explicit path with explicit overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(path: &Path, overrides: &Overrides) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
    parse_str(&raw, overrides)
        .map_err(|e| AppError::Config(format!("{} ({})", e, path.display())))
}

/// Parse TOML text and resolve it against `overrides`.
pub fn parse_str(raw: &str, overrides: &Overrides) -> Result<Config, AppError> {
    let parsed: RawConfig = toml::from_str(raw)
        .map_err(|e| AppError::Config(format!("parse error: {e}")))?;
    resolve(parsed, overrides)
}

fn resolve(parsed: RawConfig, overrides: &Overrides) -> Result<Config, AppError> {
    let a = parsed.assistant;
    let r = parsed.retrieval;
    let g = parsed.guard;
    let o = parsed.observability;

    let rate_limit_per_min = match &overrides.rate_limit_per_min {
        Some(v) => parse_count("RATE_LIMIT_PER_MIN", v)?,
        None => g.rate_limit_per_min,
    };
    let max_input_length = match &overrides.max_input_length {
        Some(v) => parse_count("MAX_INPUT_LENGTH", v)?,
        None => g.max_input_length,
    };
    if r.chunk_size == 0 {
        return Err(AppError::Config("retrieval.chunk_size must be > 0".into()));
    }

    Ok(Config {
        bot_name: a.name,
        log_level: overrides.log_level.clone().unwrap_or(a.log_level),
        mode: AnswerMode::parse(&a.mode)?,
        summary_chars: a.summary_chars,
        prompts_dir: expand_home(&a.prompts_dir),
        retrieval: RetrievalConfig {
            docs_dir: expand_home(overrides.docs_dir.as_deref().unwrap_or(&r.docs_dir)),
            top_k: r.top_k,
            chunk_size: r.chunk_size,
            chunk_overlap: r.chunk_overlap,
            hint_bonus: r.hint_bonus,
        },
        guard: GuardConfig { max_input_length, rate_limit_per_min },
        observability: ObservabilityConfig {
            event_log: expand_home(overrides.event_log.as_deref().unwrap_or(&o.event_log)),
            log_file: o.log_file.as_deref().map(expand_home),
        },
        llm: LlmConfig {
            provider: parsed.llm.provider,
            openai: OpenAiConfig {
                api_base_url: overrides
                    .api_base_url
                    .as_deref()
                    .map(chat_completions_url)
                    .unwrap_or(parsed.llm.openai.api_base_url),
                model: parsed.llm.openai.model,
                temperature: parsed.llm.openai.temperature,
                timeout_seconds: parsed.llm.openai.timeout_seconds,
            },
        },
        llm_api_key: overrides.api_key.clone(),
    })
}

fn parse_count(name: &str, value: &str) -> Result<usize, AppError> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|e| AppError::Config(format!("{name}='{value}': {e}")))
}

/// `OPENAI_BASE_URL` is conventionally the API root (`.../v1`); the provider
/// wants the full completions endpoint.
fn chat_completions_url(base: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.ends_with("/chat/completions") {
        base.to_string()
    } else {
        format!("{base}/chat/completions")
    }
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

// ── test helpers ──────────────────────────────────────────────────────────────

impl Config {
    /// Safe `Config` for tests: dummy LLM, no API keys, no external calls.
    pub fn test_default(work_dir: &Path) -> Self {
        Self {
            bot_name: "test".into(),
            log_level: "info".into(),
            mode: AnswerMode::Orchestrated,
            summary_chars: default_summary_chars(),
            prompts_dir: work_dir.join("prompts"),
            retrieval: RetrievalConfig {
                docs_dir: work_dir.join("docs"),
                top_k: default_top_k(),
                chunk_size: default_chunk_size(),
                chunk_overlap: default_chunk_overlap(),
                hint_bonus: default_hint_bonus(),
            },
            guard: GuardConfig {
                max_input_length: default_max_input_length(),
                rate_limit_per_min: default_rate_limit(),
            },
            observability: ObservabilityConfig {
                event_log: work_dir.join("logs/agent.log"),
                log_file: None,
            },
            llm: LlmConfig {
                provider: "dummy".into(),
                openai: OpenAiConfig {
                    api_base_url: "http://127.0.0.1:1/v1/chat/completions".into(),
                    model: "test-model".into(),
                    temperature: 0.0,
                    timeout_seconds: 1,
                },
            },
            llm_api_key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL_TOML: &str = r#"
[assistant]
name = "test-bot"
log_level = "warn"
"#;

    fn write_toml(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn parse_basic_config_fills_defaults() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), &Overrides::default()).unwrap();
        assert_eq!(cfg.bot_name, "test-bot");
        assert_eq!(cfg.log_level, "warn");
        assert_eq!(cfg.mode, AnswerMode::Orchestrated);
        assert_eq!(cfg.retrieval.top_k, 3);
        assert_eq!(cfg.retrieval.chunk_size, 800);
        assert_eq!(cfg.retrieval.chunk_overlap, 120);
        assert_eq!(cfg.retrieval.hint_bonus, 4);
        assert_eq!(cfg.guard.rate_limit_per_min, 10);
        assert_eq!(cfg.llm.provider, "dummy");
        assert_eq!(cfg.observability.event_log, PathBuf::from("logs/agent.log"));
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let cfg = parse_str("", &Overrides::default()).unwrap();
        assert_eq!(cfg.bot_name, "campus-bot");
        assert_eq!(cfg.summary_chars, 600);
        assert_eq!(cfg.llm.openai.model, "gpt-4o");
    }

    #[test]
    fn simple_mode_parses() {
        let cfg = parse_str("[assistant]\nmode = \"simple\"\n", &Overrides::default()).unwrap();
        assert_eq!(cfg.mode, AnswerMode::Simple);
    }

    #[test]
    fn unknown_mode_errors() {
        let err = parse_str("[assistant]\nmode = \"swarm\"\n", &Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("swarm"));
    }

    #[test]
    fn zero_chunk_size_rejected() {
        let err = parse_str("[retrieval]\nchunk_size = 0\n", &Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("chunk_size"));
    }

    #[test]
    fn overrides_win_over_toml() {
        let overrides = Overrides {
            log_level: Some("debug".into()),
            docs_dir: Some("/srv/docs".into()),
            event_log: Some("/tmp/events.jsonl".into()),
            api_base_url: Some("http://localhost:11434/v1/".into()),
            rate_limit_per_min: Some("3".into()),
            max_input_length: Some("50".into()),
            api_key: Some("sk-test".into()),
        };
        let cfg = parse_str(MINIMAL_TOML, &overrides).unwrap();
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.retrieval.docs_dir, PathBuf::from("/srv/docs"));
        assert_eq!(cfg.observability.event_log, PathBuf::from("/tmp/events.jsonl"));
        assert_eq!(cfg.llm.openai.api_base_url, "http://localhost:11434/v1/chat/completions");
        assert_eq!(cfg.guard.rate_limit_per_min, 3);
        assert_eq!(cfg.guard.max_input_length, 50);
        assert_eq!(cfg.llm_api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn bad_numeric_override_errors() {
        let overrides = Overrides { rate_limit_per_min: Some("ten".into()), ..Default::default() };
        let err = parse_str(MINIMAL_TOML, &overrides).unwrap_err();
        assert!(err.to_string().contains("RATE_LIMIT_PER_MIN"));
    }

    #[test]
    fn full_endpoint_url_kept() {
        assert_eq!(
            chat_completions_url("https://api.example.com/v1/chat/completions"),
            "https://api.example.com/v1/chat/completions"
        );
    }

    #[test]
    fn tilde_expands_to_home() {
        let home = dirs::home_dir().expect("home dir must exist in test env");
        let expanded = expand_home("~/campus/docs");
        assert!(expanded.starts_with(&home));
        assert!(expanded.ends_with("docs"));
    }

    #[test]
    fn relative_path_unchanged() {
        assert_eq!(expand_home("relative/path"), PathBuf::from("relative/path"));
    }

    #[test]
    fn missing_file_errors() {
        let result = load_from(Path::new("/nonexistent/config.toml"), &Overrides::default());
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("config error"));
    }
}
