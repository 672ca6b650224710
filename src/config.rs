use anyhow::Result;
use figment::{providers::{Env, Format, Toml}, Figment};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub forecast: ForecastConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_true")]
    pub enable_cors: bool,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}
impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastConfig {
    /// Pre-trained tree model in LightGBM text format
    pub model_path: PathBuf,
    /// Directory holding one `<YYYY-MM-DD>.csv` per forecastable day
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// OpenAI-compatible API root, e.g. `https://api.groq.com/openai/v1`
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub http_timeout_seconds: u64,
    /// Upper bound for one whole answer, including the fallback call
    #[serde(default = "default_answer_timeout")]
    pub answer_timeout_seconds: u64,
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Reference documents for grounded answers; optional
    #[serde(default)]
    pub docs_dir: Option<PathBuf>,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl ChatConfig {
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

fn default_true() -> bool { true }
fn default_request_timeout() -> u64 { 60 }
fn default_chunk_size() -> usize { 1000 }
fn default_chunk_overlap() -> usize { 100 }
fn default_top_k() -> usize { 3 }
fn default_answer_timeout() -> u64 { 50 }

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_figment(Figment::new().merge(Toml::file("config/default.toml")))
    }

    fn from_figment(base: Figment) -> Result<Self> {
        let figment = base.merge(Env::prefixed("GRIDCAST__").split("__"));
        Ok(figment.extract()?)
    }
}
