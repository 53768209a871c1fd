use crate::{ChatProvider, Error, LocalProvider, OpenAiProvider};
use std::env;
use std::fmt;
use std::str::FromStr;

/// The closed set of backing services a provider can be constructed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Local,
}

impl ProviderKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Local => "local",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "local" => Ok(ProviderKind::Local),
            other => Err(Error::config(format!(
                "unsupported chat provider: {other:?} (supported: \"openai\", \"local\")"
            ))),
        }
    }
}

/// Configuration for constructing a chat provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider: ProviderKind,

    // OpenAI-specific
    pub openai_api_key: Option<String>,
    pub openai_model: Option<String>,

    // Local (Ollama)-specific
    pub local_host: Option<String>,
    pub local_model: Option<String>,
}

impl ProviderConfig {
    /// Configuration for the OpenAI provider.
    pub fn openai(api_key: impl Into<String>, model: Option<String>) -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            openai_api_key: Some(api_key.into()),
            openai_model: model,
            local_host: None,
            local_model: None,
        }
    }

    /// Configuration for the local provider. Both settings are optional;
    /// the client applies the stock local-server defaults.
    pub fn local(host: Option<String>, model: Option<String>) -> Self {
        Self {
            provider: ProviderKind::Local,
            openai_api_key: None,
            openai_model: None,
            local_host: host,
            local_model: model,
        }
    }

    /// Load configuration from environment variables: `PROVIDER` selects
    /// the variant, `OPENAI_API_KEY` / `OPENAI_MODEL` / `LOCAL_HOST` /
    /// `LOCAL_MODEL` carry the variant-specific settings.
    pub fn from_env() -> Result<Self, Error> {
        let provider = env::var("PROVIDER")
            .map_err(|_| {
                Error::config(
                    "PROVIDER environment variable is required (supported: \"openai\", \"local\")",
                )
            })?
            .parse::<ProviderKind>()?;

        Ok(match provider {
            ProviderKind::OpenAi => {
                let api_key = env::var("OPENAI_API_KEY").map_err(|_| {
                    Error::config(
                        "OPENAI_API_KEY environment variable is required for the OpenAI provider",
                    )
                })?;
                Self::openai(api_key, env::var("OPENAI_MODEL").ok())
            }
            ProviderKind::Local => {
                Self::local(env::var("LOCAL_HOST").ok(), env::var("LOCAL_MODEL").ok())
            }
        })
    }
}

/// Factory for constructing chat providers.
///
/// Construction either succeeds fully or fails with a [`Error::Config`];
/// no partially usable provider is ever returned. The caller owns the
/// resulting instance and injects it wherever completions are needed —
/// there is no process-wide singleton.
pub struct ProviderFactory;

impl ProviderFactory {
    /// Construct the provider named by `config`, validating its
    /// variant-specific settings first.
    pub fn create(config: &ProviderConfig) -> Result<Box<dyn ChatProvider>, Error> {
        match config.provider {
            ProviderKind::OpenAi => {
                let api_key = config
                    .openai_api_key
                    .as_deref()
                    .filter(|k| !k.is_empty())
                    .ok_or_else(|| Error::config("OpenAI API key is required"))?;
                let provider = OpenAiProvider::new(api_key, config.openai_model.clone())?;
                Ok(Box::new(provider))
            }
            ProviderKind::Local => {
                let provider =
                    LocalProvider::new(config.local_host.clone(), config.local_model.clone())?;
                Ok(Box::new(provider))
            }
        }
    }

    /// Construct a provider from environment variables.
    pub fn from_env() -> Result<Box<dyn ChatProvider>, Error> {
        let config = ProviderConfig::from_env()?;
        Self::create(&config)
    }
}
