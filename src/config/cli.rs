use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the pagepurge binary.
#[derive(Debug, Parser)]
#[command(
    name = "pagepurge",
    version,
    about = "Preview page cache invalidations against a dry-run store"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "PAGEPURGE_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath,
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Flush every stored variant of the given URLs.
    Url(UrlArgs),
    /// Flush whole cache groups.
    Group(GroupArgs),
    /// Flush the entire page cache.
    All,
    /// Print the active variant cross-product.
    Variants,
}

#[derive(Debug, Args, Clone)]
pub struct UrlArgs {
    /// URLs to flush.
    #[arg(value_name = "URL", required = true, value_hint = ValueHint::Url)]
    pub urls: Vec<String>,

    /// Flush under this group instead of the classified one.
    #[arg(long, value_name = "GROUP")]
    pub group: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct GroupArgs {
    /// Groups to flush.
    #[arg(value_name = "GROUP", required = true)]
    pub groups: Vec<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct Overrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the site home URL.
    #[arg(long = "home-url", value_name = "URL", global = true)]
    pub home_url: Option<String>,

    /// Log every purge decision at info level.
    #[arg(long = "debug-purge", global = true)]
    pub debug_purge: bool,
}
