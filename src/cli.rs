use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::GlobalOptions;
use crate::query::SortField;
use crate::types::RowId;

#[derive(Parser)]
#[command(name = "chantag")]
#[command(about = "Bulk tag editing for channel records kept in a spreadsheet")]
#[command(version)]
pub struct Cli {
    /// Use a local JSON fixture instead of the spreadsheet API
    #[arg(long, global = true, value_name = "FIXTURE")]
    pub offline: Option<PathBuf>,

    /// Answer yes to every confirmation prompt
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options shared by every command.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub json: bool,
}

impl From<bool> for OutputOptions {
    fn from(json: bool) -> Self {
        Self { json }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List channels with their tags
    #[command(visible_alias = "l")]
    Ls {
        /// Case-insensitive search over names and tags
        search: Option<String>,

        /// Only channels carrying this tag (repeatable, any match)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        /// Only channels without tags
        #[arg(long, conflicts_with = "tags")]
        untagged: bool,

        /// Sort key: name, type
        #[arg(long, default_value = "name", value_parser = parse_sort_field)]
        sort: SortField,

        /// Sort descending
        #[arg(long)]
        desc: bool,

        /// Page to show, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Rows per page (default: config page_size)
        #[arg(long, value_parser = parse_page_size)]
        page_size: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List known tags with labels and usage counts
    Tags {
        /// Only tags containing this text
        #[arg(long, short)]
        query: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show tagging statistics
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Toggle tags on one channel row and save
    Tag {
        /// Sheet row of the channel (first data row is 2)
        row: RowId,

        /// Tags to toggle: added when absent, removed when present
        #[arg(required = true)]
        tags: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Suggest tags from channel name prefixes
    Suggest {
        /// Stage and save every suggestion not already applied
        #[arg(long)]
        apply: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Drop cached data and reload from the spreadsheet
    Refresh {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage the local cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Manage the access token
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// Show cache location and entries
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove every cached entry
    Clear {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Get a configuration value
    Get {
        /// Configuration key (e.g. spreadsheet_id, sheets.main)
        key: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,

        /// Value to set
        value: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum AuthAction {
    /// Store an access token in the config file
    Login {
        /// Bearer token
        #[arg(long, env = "CHANTAG_ACCESS_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Forget the stored token and clear the cache
    Logout {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show whether a token is available
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Execute the command, dispatching to the appropriate handler.
    pub async fn run(self) -> crate::error::Result<()> {
        use crate::commands::{
            LsOptions, cmd_auth_login, cmd_auth_logout, cmd_auth_status, cmd_cache_clear,
            cmd_cache_status, cmd_config_get, cmd_config_set, cmd_config_show, cmd_ls,
            cmd_refresh, cmd_stats, cmd_suggest, cmd_tag, cmd_tags,
        };

        let global = GlobalOptions {
            offline: self.offline,
            assume_yes: self.yes,
        };

        match self.command {
            Commands::Ls {
                search,
                tags,
                untagged,
                sort,
                desc,
                page,
                page_size,
                json,
            } => {
                cmd_ls(
                    &global,
                    LsOptions {
                        search,
                        tags,
                        untagged,
                        sort,
                        desc,
                        page,
                        page_size,
                    },
                    json.into(),
                )
                .await
            }
            Commands::Tags { query, json } => {
                cmd_tags(&global, query.as_deref(), json.into()).await
            }
            Commands::Stats { json } => cmd_stats(&global, json.into()).await,
            Commands::Tag { row, tags, json } => cmd_tag(&global, row, &tags, json.into()).await,
            Commands::Suggest { apply, json } => cmd_suggest(&global, apply, json.into()).await,
            Commands::Refresh { json } => cmd_refresh(&global, json.into()).await,
            Commands::Cache { action } => match action {
                CacheAction::Status { json } => cmd_cache_status(json.into()),
                CacheAction::Clear { json } => cmd_cache_clear(json.into()),
            },
            Commands::Config { action } => match action {
                ConfigAction::Show { json } => cmd_config_show(json.into()),
                ConfigAction::Get { key, json } => cmd_config_get(&key, json.into()),
                ConfigAction::Set { key, value, json } => {
                    cmd_config_set(&key, &value, json.into())
                }
            },
            Commands::Auth { action } => match action {
                AuthAction::Login { token, json } => cmd_auth_login(token, json.into()),
                AuthAction::Logout { json } => cmd_auth_logout(json.into()),
                AuthAction::Status { json } => cmd_auth_status(json.into()),
            },
        }
    }
}

/// Generic validation helper for parsing values with a standard error message format.
fn parse_with_validation<T, F>(
    s: &str,
    parser: F,
    field_name: &str,
    valid_values: &[&str],
) -> Result<T, String>
where
    F: FnOnce(&str) -> Result<T, String>,
{
    parser(s).map_err(|_| {
        format!(
            "Invalid {}. Must be one of: {}",
            field_name,
            valid_values.join(", ")
        )
    })
}

fn parse_sort_field(s: &str) -> Result<SortField, String> {
    parse_with_validation(
        s,
        |v| v.parse().map_err(|_| String::new()),
        "sort field",
        SortField::KEYWORDS,
    )
}

fn parse_page_size(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("page size must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("Invalid page size '{s}'")),
    }
}
