//! LLM provider implementations.
//!
//! `build(config, api_key)` is the factory, called at startup.

pub mod dummy;
pub mod openai_compatible;

use crate::config::LlmConfig;
use crate::llm::{LlmProvider, ProviderError};

/// Construct a `LlmProvider` from config and an optional API key.
///
/// `api_key` comes from the environment (never TOML) and is `None` for
/// keyless local servers.
pub fn build(config: &LlmConfig, api_key: Option<String>) -> Result<LlmProvider, ProviderError> {
    match config.provider.as_str() {
        "dummy" => Ok(LlmProvider::Dummy(dummy::DummyProvider)),
        "openai" | "openai-compatible" => {
            let oai = &config.openai;
            let p = openai_compatible::OpenAiCompatibleProvider::new(
                oai.api_base_url.clone(),
                oai.model.clone(),
                oai.temperature,
                oai.timeout_seconds,
                api_key,
            )?;
            Ok(LlmProvider::OpenAiCompatible(p))
        }
        _ => Err(ProviderError::UnknownProvider(config.provider.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn builds_dummy() {
        let cfg = Config::test_default(std::path::Path::new("/tmp"));
        let p = build(&cfg.llm, None).unwrap();
        assert!(matches!(p, LlmProvider::Dummy(_)));
    }

    #[test]
    fn builds_openai() {
        let mut cfg = Config::test_default(std::path::Path::new("/tmp"));
        cfg.llm.provider = "openai".into();
        let p = build(&cfg.llm, Some("sk-test".into())).unwrap();
        assert_eq!(p.model(), "test-model");
    }

    #[test]
    fn unknown_provider_errors() {
        let mut cfg = Config::test_default(std::path::Path::new("/tmp"));
        cfg.llm.provider = "carrier-pigeon".into();
        let err = build(&cfg.llm, None).unwrap_err();
        assert!(matches!(err, ProviderError::UnknownProvider(ref p) if p == "carrier-pigeon"));
    }
}
