use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use spendlens_finance::remote::{DEFAULT_API_KEY_ENV, DEFAULT_BASE_URL, DEFAULT_MODEL};
use spendlens_finance::{CompletionParams, LlmConfig, PipelineSettings, RemoteSettings};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::state::{default_upload_dir, ensure_spendlens_home};

/// Largest batch the remote model is asked to label in one request.
const MAX_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmSection,
    pub pipeline: PipelineSection,
    pub server: ServerSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    /// Environment variable holding the API key; the key itself never lives in this file
    pub api_key_env: String,
    pub batch_max_tokens: u32,
    pub single_max_tokens: u32,
    pub batch_timeout_secs: u64,
    pub single_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    pub batch_size: usize,
    pub max_transactions: usize,
    /// Batches in flight at once (1 = sequential)
    pub concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Include error chains in 500 responses
    pub debug: bool,
}

impl Default for LlmSection {
    fn default() -> Self {
        let batch = CompletionParams::batch();
        let single = CompletionParams::single();
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: batch.temperature,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            batch_max_tokens: batch.max_tokens,
            single_max_tokens: single.max_tokens,
            batch_timeout_secs: batch.timeout.as_secs(),
            single_timeout_secs: single.timeout.as_secs(),
        }
    }
}

impl Default for PipelineSection {
    fn default() -> Self {
        let defaults = PipelineSettings::default();
        Self {
            batch_size: defaults.remote.batch_size,
            max_transactions: defaults.max_transactions,
            concurrency: defaults.remote.concurrency,
        }
    }
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5019,
            upload_dir: default_upload_dir(),
            max_upload_bytes: 16 * 1024 * 1024,
            debug: false,
        }
    }
}

impl Config {
    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            base_url: self.llm.base_url.clone(),
            model: self.llm.model.clone(),
            api_key_env: self.llm.api_key_env.clone(),
        }
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        let llm = &self.llm;
        PipelineSettings {
            max_transactions: self.pipeline.max_transactions.max(1),
            remote: RemoteSettings {
                batch_size: self.pipeline.batch_size.clamp(1, MAX_BATCH_SIZE),
                concurrency: self.pipeline.concurrency.max(1),
                batch: CompletionParams {
                    max_tokens: llm.batch_max_tokens,
                    temperature: llm.temperature,
                    timeout: Duration::from_secs(llm.batch_timeout_secs),
                },
                single: CompletionParams {
                    max_tokens: llm.single_max_tokens,
                    temperature: llm.temperature,
                    timeout: Duration::from_secs(llm.single_timeout_secs),
                },
            },
        }
    }

    /// Whether the configured credential variable is present and non-blank.
    pub fn api_key_set(&self) -> bool {
        std::env::var(&self.llm.api_key_env)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false)
    }

    /// `PORT` (as set by most hosting platforms) wins over the file.
    fn apply_port_override(&mut self, port: Option<String>) -> Result<()> {
        if let Some(raw) = port {
            self.server.port = raw
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a port number, got {raw:?}"))?;
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_spendlens_home()?.join("config.toml"))
}

fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(p) => Ok(p.to_path_buf()),
        None => config_path(),
    }
}

fn read_config(p: &Path) -> Result<Config> {
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

/// Effective config: file (or defaults when the default file is absent) plus env overrides.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let mut cfg = match explicit {
        Some(p) => {
            if !p.exists() {
                bail!("Config not found: {}", p.display());
            }
            read_config(p)?
        }
        None => {
            let p = config_path()?;
            if p.exists() { read_config(&p)? } else { Config::default() }
        }
    };
    cfg.apply_port_override(std::env::var("PORT").ok())?;
    Ok(cfg)
}

pub fn save_config(cfg: &Config, p: &Path) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config(explicit: Option<&Path>) -> Result<()> {
    let p = resolve_path(explicit)?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default(), &p)?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn show_config(cfg: &Config) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    print!("{}", s);
    Ok(())
}
