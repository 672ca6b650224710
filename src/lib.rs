//! Day-ahead electricity load forecasts and an LLM-backed assistant,
//! served over HTTP.

pub mod api;
pub mod chat;
pub mod config;
pub mod domain;
pub mod forecast;
pub mod ml;
pub mod state;
pub mod telemetry;
