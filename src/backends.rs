//! Backend construction from configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use tracing::info;

use formpilot_backend_local::LocalBackend;
use formpilot_backend_ollama::OllamaBackend;
use formpilot_config::{Config, ConfigLoader};
use formpilot_protocols::{BackendKind, ModelBackend};

pub(crate) fn build_backend(config: &Config) -> anyhow::Result<Arc<dyn ModelBackend>> {
    match config.generation.backend {
        BackendKind::Ollama => {
            let backend = OllamaBackend::new(
                config.ollama.base_url.as_str(),
                Duration::from_secs(config.ollama.timeout_seconds),
            )?;
            info!("Using Ollama at {}", config.ollama.base_url);
            Ok(Arc::new(backend))
        }
        BackendKind::Local => {
            let model = expanded(config.local.model_path.as_deref(), "local.model_path")?;
            let tokenizer = expanded(config.local.tokenizer_path.as_deref(), "local.tokenizer_path")?;
            let backend = LocalBackend::from_files(&model, &tokenizer, &config.local.eos_token)
                .with_context(|| format!("loading local model {}", model.display()))?
                .with_seed(config.local.seed);
            Ok(Arc::new(backend))
        }
    }
}

/// Build a backend of `kind`. `config` only changes when that succeeds.
pub(crate) fn switch_backend(
    config: &mut Config,
    kind: BackendKind,
) -> anyhow::Result<Arc<dyn ModelBackend>> {
    let mut candidate = config.clone();
    candidate.generation.backend = kind;
    let backend = build_backend(&candidate)?;
    config.generation.backend = kind;
    Ok(backend)
}

fn expanded(path: Option<&str>, key: &str) -> anyhow::Result<PathBuf> {
    match path {
        Some(path) => Ok(PathBuf::from(ConfigLoader::expand_path(path))),
        None => bail!("{} must be set for the local backend", key),
    }
}
