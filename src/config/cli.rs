use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the Lectern binary.
#[derive(Debug, Parser)]
#[command(name = "lectern", version, about = "Lectern content-delivery engine")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "LECTERN_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Warm the content cache of a site.
    Warm(WarmArgs),
    /// Run a content query document against the search backend.
    Query(QueryArgs),
    /// List the sites found under the content root.
    Sites(SitesArgs),
}

#[derive(Debug, Args, Clone)]
pub struct WarmArgs {
    #[command(flatten)]
    pub overrides: CommonOverrides,

    /// Site identifier.
    #[arg(value_name = "SITE")]
    pub site: String,

    /// Build a fresh cache and swap it in once fully populated.
    #[arg(long = "switch", action = clap::ArgAction::SetTrue)]
    pub switch_cache: bool,
}

#[derive(Debug, Args, Clone)]
pub struct QueryArgs {
    #[command(flatten)]
    pub overrides: CommonOverrides,

    /// Site identifier.
    #[arg(value_name = "SITE")]
    pub site: String,

    /// JSON document describing the query field, arguments and fragments.
    #[arg(value_name = "DOCUMENT", value_hint = ValueHint::FilePath)]
    pub document: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct SitesArgs {
    #[command(flatten)]
    pub overrides: CommonOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct CommonOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the search backend base URL.
    #[arg(long = "search-url", value_name = "URL")]
    pub search_url: Option<String>,

    /// Override the directory holding site content.
    #[arg(long = "sites-root", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub sites_root: Option<PathBuf>,
}

impl Command {
    pub fn overrides(&self) -> &CommonOverrides {
        match self {
            Command::Warm(args) => &args.overrides,
            Command::Query(args) => &args.overrides,
            Command::Sites(args) => &args.overrides,
        }
    }
}
