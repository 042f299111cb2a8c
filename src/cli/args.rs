use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::common::config::OutputFormat;

/// SiteWipe: clear every kind of storage a site keeps in your browser
#[derive(Parser, Debug)]
#[command(
    name = "sitewipe",
    version,
    about = "Per-site browser storage cleaner",
    long_about = "SiteWipe clears cookies, localStorage, sessionStorage, IndexedDB and\n\
                   Cache Storage for one site at a time, straight from a Firefox profile.",
    after_help = "EXAMPLES:\n  \
        sitewipe clear example.com                 Clear all enabled categories\n  \
        sitewipe clear https://example.com/a -y    Clear without confirmation\n  \
        sitewipe clear example.com --only cookies  Clear only cookies\n  \
        sitewipe sites add example.com             Manage a site for auto-clear\n  \
        sitewipe sites clear -y                    Clear every managed site\n  \
        sitewipe settings set autoClear true       Turn on auto-clear\n  \
        sitewipe visit https://example.com/        Run the auto-clear check\n  \
        sitewipe export --output backup.json       Export sites and settings\n  \
        sitewipe profiles                          List Firefox profiles"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Firefox profile directory to operate on
    #[arg(long, global = true, env = "SITEWIPE_PROFILE", value_name = "PATH")]
    pub profile_dir: Option<PathBuf>,

    /// Directory holding settings, managed sites and logs
    #[arg(long, global = true, env = "SITEWIPE_HOME", value_name = "PATH")]
    pub home: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,

    /// Operate on a profile even while the browser holds its lock
    #[arg(long, global = true)]
    pub force: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Clear storage for a site
    Clear {
        /// URL or domain of the site
        target: String,

        /// Only clear these categories (cookies, localStorage, sessionStorage, indexedDB, cacheStorage)
        #[arg(long, value_delimiter = ',')]
        only: Option<Vec<String>>,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,

        /// Reload the site's tab after a successful clear
        #[arg(long)]
        reload: bool,
    },

    /// Run the auto-clear check as if a page had just loaded
    Visit {
        /// URL of the page
        url: String,
    },

    /// Manage the sites eligible for auto-clear
    Sites {
        #[command(subcommand)]
        action: SitesAction,
    },

    /// Export managed sites and settings as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Import managed sites and settings from an export file
    Import {
        /// Export file to read
        file: PathBuf,
    },

    /// Show or change clear settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// List discovered Firefox profiles
    Profiles,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Subcommand, Debug)]
pub enum SitesAction {
    /// Add a site
    Add {
        /// Domain or URL of the site
        domain: String,

        /// Display title (defaults to the domain)
        #[arg(long)]
        title: Option<String>,
    },

    /// Remove a site
    Remove {
        /// Domain or URL of the site
        domain: String,
    },

    /// List managed sites
    List,

    /// Clear one managed site, or all of them
    Clear {
        /// Domain or URL of a managed site (all managed sites when omitted)
        domain: Option<String>,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Remove every managed site
    Reset,
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// Show current settings
    Show,

    /// Set one flag
    Set {
        /// Setting key, e.g. clearCookies or autoClear
        key: String,
        /// true or false
        #[arg(action = clap::ArgAction::Set)]
        value: bool,
    },

    /// Restore default settings
    Reset,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset to default configuration
    Reset,

    /// Set a configuration value (firefox_profile, output_format)
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
}

#[derive(Debug, Clone, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
