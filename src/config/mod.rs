//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::str::FromStr;

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::cache::FlushConfig;

mod cli;

pub use cli::{CliArgs, Command, GroupArgs, Overrides, UrlArgs};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "pagepurge";
const ENV_PREFIX: &str = "PAGEPURGE";

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub flush: FlushConfig,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("flush.feed_types")
            .with_list_parse_key("flush.purge_pages")
            .with_list_parse_key("flush.flush_all_groups")
            .with_list_parse_key("flush.device_groups")
            .with_list_parse_key("flush.referrer_groups")
            .with_list_parse_key("flush.cookie_groups")
            .with_list_parse_key("flush.compressions"),
    );

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    flush: FlushConfig,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(home_url) = overrides.home_url.as_ref() {
            self.flush.home_url = home_url.clone();
        }
        if overrides.debug_purge {
            self.flush.debug_purge = true;
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings { logging, flush } = raw;

        let logging = build_logging_settings(logging)?;
        let flush = build_flush_settings(flush)?;

        Ok(Self { logging, flush })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_flush_settings(flush: FlushConfig) -> Result<FlushConfig, LoadError> {
    let home = Url::parse(&flush.home_url)
        .map_err(|err| LoadError::invalid("flush.home_url", format!("failed to parse: {err}")))?;
    if !matches!(home.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            "flush.home_url",
            format!("unsupported scheme `{}`", home.scheme()),
        ));
    }

    if flush.postpages_limit == 0 {
        return Err(LoadError::invalid(
            "flush.postpages_limit",
            "must be greater than zero",
        ));
    }

    if flush.feed_types.iter().any(|feed| feed.trim().is_empty()) {
        return Err(LoadError::invalid(
            "flush.feed_types",
            "feed types must not be blank",
        ));
    }

    if let Err(err) = flush.sitemap_pattern() {
        return Err(LoadError::invalid(
            "flush.sitemap_regex",
            format!("failed to compile: {err}"),
        ));
    }

    Ok(flush)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[cfg(test)]
mod tests;
