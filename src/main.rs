use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::io::{BufRead, Write};
use std::sync::Arc;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sitewipe::cli::args::{Cli, Commands, CompletionShell, ConfigAction, SettingsAction, SitesAction};
use sitewipe::cli::output;
use sitewipe::common::config::{Config, Home, OutputFormat};
use sitewipe::common::errors::{PlatformError, SiteWipeError};
use sitewipe::common::format::format_count;
use sitewipe::common::site::parse_target;
use sitewipe::extension::{confirmation_prompt, Background, BulkClear, TabStatus};
use sitewipe::firefox::{self, FirefoxHost, FirefoxProfile};
use sitewipe::storage::orchestrator::{Notice, Notifier};
use sitewipe::storage::privileged::{BrowserHost, Tab};
use sitewipe::storage::{Category, ClearRequest};
use sitewipe::store::{self, ManagedSites, Namespace, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let home = Home::resolve(cli.home.clone());
    let _guard = setup_logging(&home, cli.verbose);
    let config = Config::load(&home)?;
    let fmt = cli.format.unwrap_or(config.output_format);

    let sync = Namespace::open(home.sync_path());
    let local = Namespace::open(home.local_path());
    if !sync.path().exists() {
        Settings::install_defaults(&sync).context("Failed to install default settings")?;
    }

    match cli.command {
        Commands::Clear {
            ref target,
            ref only,
            yes,
            reload,
        } => cmd_clear(&cli, &config, fmt, sync, local, target, only.as_deref(), yes, reload).await,

        Commands::Visit { ref url } => cmd_visit(&cli, &config, fmt, sync, local, url).await,

        Commands::Sites { ref action } => cmd_sites(&cli, &config, fmt, sync, local, action).await,

        Commands::Export { ref output } => {
            let file = store::export(&ManagedSites::new(local), &sync)?;
            let json = serde_json::to_string_pretty(&file)?;
            match output {
                Some(path) => {
                    std::fs::write(path, json)
                        .with_context(|| format!("Failed to write export: {}", path.display()))?;
                    if fmt == OutputFormat::Human {
                        println!(
                            "  {} Exported {} to {}",
                            "✓".green().bold(),
                            format_count(file.managed_sites.len(), "site"),
                            path.display()
                        );
                    }
                }
                None => println!("{}", json),
            }
            Ok(())
        }

        Commands::Import { ref file } => {
            let contents = std::fs::read_to_string(file)
                .with_context(|| format!("Failed to read import file: {}", file.display()))?;
            let summary = store::import(&contents, &ManagedSites::new(local), &sync)?;
            output::print_import_summary(&summary, fmt);
            Ok(())
        }

        Commands::Settings { ref action } => cmd_settings(fmt, &sync, action),

        Commands::Profiles => {
            let profiles = firefox::discover_profiles();
            let configured = config
                .firefox_profile
                .as_ref()
                .and_then(|p| profiles.iter().find(|f| f.root() == p.as_path()));
            let default = configured.or_else(|| firefox::default_profile(&profiles));
            output::print_profiles(&profiles, default, fmt);
            Ok(())
        }

        Commands::Config { ref action } => cmd_config(&home, config, fmt, action),

        Commands::Completions { ref shell } => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            let shell = match shell {
                CompletionShell::Bash => clap_complete::Shell::Bash,
                CompletionShell::Zsh => clap_complete::Shell::Zsh,
                CompletionShell::Fish => clap_complete::Shell::Fish,
            };
            clap_complete::generate(shell, &mut cmd, "sitewipe", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Stderr logging filtered by `-v`/`RUST_LOG`, plus a daily log file under the home directory
fn setup_logging(home: &Home, verbose: bool) -> Option<WorkerGuard> {
    let filter = if verbose {
        EnvFilter::new("sitewipe=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let (file_layer, guard) = match home.init_dirs() {
        Ok(()) => {
            let appender = tracing_appender::rolling::daily(home.logs_dir(), "sitewipe.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();
    guard
}

/// Prints the completion notice on the terminal
struct TerminalNotifier;

#[async_trait]
impl Notifier for TerminalNotifier {
    async fn notify(&self, notice: &Notice) -> Result<(), PlatformError> {
        eprintln!("🔔 {}: {}", notice.title.bold(), notice.message);
        Ok(())
    }
}

/// Resolve the profile: --profile-dir, then config.toml, then discovery
fn open_host(cli: &Cli, config: &Config) -> Result<Arc<FirefoxHost>> {
    let profile = match cli.profile_dir.as_ref().or(config.firefox_profile.as_ref()) {
        Some(path) => FirefoxProfile::open(path)?,
        None => {
            let profiles = firefox::discover_profiles();
            firefox::default_profile(&profiles)
                .cloned()
                .ok_or(SiteWipeError::ProfileNotFound { path: None })?
        }
    };
    Ok(Arc::new(FirefoxHost::open(profile, cli.force)?))
}

fn confirm(prompt: &str) -> Result<bool> {
    println!("{}", prompt);
    print!("\n  Proceed? [y/N] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn parse_categories(names: &[String]) -> Result<Vec<Category>> {
    names
        .iter()
        .map(|name| {
            Category::parse(name).with_context(|| {
                format!(
                    "Unknown category '{}'. Use: cookies, localStorage, sessionStorage, indexedDB, cacheStorage",
                    name
                )
            })
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
async fn cmd_clear(
    cli: &Cli,
    config: &Config,
    fmt: OutputFormat,
    sync: Namespace,
    local: Namespace,
    target: &str,
    only: Option<&[String]>,
    yes: bool,
    reload: bool,
) -> Result<()> {
    let domain = parse_target(target)?;
    let mut settings = Settings::load(&sync)?;
    if let Some(names) = only {
        settings = settings.only(&parse_categories(names)?);
    }

    if settings.confirm_before_clear && !yes && !confirm(&confirmation_prompt(&settings))? {
        println!("  Cancelled.");
        return Ok(());
    }

    let host = open_host(cli, config)?;
    let before = host.profile().data_size();

    let tab = if reload {
        host.query_tabs(&format!("*://{}/*", domain))
            .await
            .ok()
            .and_then(|tabs| tabs.into_iter().next())
    } else {
        None
    };
    let source = target.contains("://").then(|| target.to_string());
    let request = ClearRequest::new(domain.clone(), settings)
        .with_source(source, tab.map(|t| t.id))
        .reloading(reload);

    let mut background = Background::new(host.clone(), sync, local);
    if fmt == OutputFormat::Human {
        background = background.with_notifier(Arc::new(TerminalNotifier));
    }

    let spinner = if fmt == OutputFormat::Human {
        let pb = indicatif::ProgressBar::new_spinner();
        pb.set_message(format!("Clearing storage for {}...", domain));
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let started = Instant::now();
    let result = background.clear_site(&request).await;
    let elapsed = started.elapsed().as_secs_f64();

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let freed = before.saturating_sub(host.profile().data_size());
    output::print_clear_result(&domain, &result, freed, elapsed, fmt);
    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}

async fn cmd_visit(
    cli: &Cli,
    config: &Config,
    fmt: OutputFormat,
    sync: Namespace,
    local: Namespace,
    url: &str,
) -> Result<()> {
    let host = open_host(cli, config)?;
    let background = Background::new(host, sync, local);
    let tab = Tab {
        id: 0,
        url: url.to_string(),
    };

    let started = Instant::now();
    match background.on_tab_updated(&tab, TabStatus::Complete).await {
        Some(result) => {
            let domain = parse_target(url)?;
            let elapsed = started.elapsed().as_secs_f64();
            output::print_clear_result(&domain, &result, 0, elapsed, fmt);
        }
        None => match fmt {
            OutputFormat::Json => println!("null"),
            OutputFormat::Quiet => {}
            OutputFormat::Human => println!(
                "  {} No auto-clear for {} (autoClear is off or the site is not managed)",
                "·".dimmed(),
                url
            ),
        },
    }
    Ok(())
}

async fn cmd_sites(
    cli: &Cli,
    config: &Config,
    fmt: OutputFormat,
    sync: Namespace,
    local: Namespace,
    action: &SitesAction,
) -> Result<()> {
    let sites = ManagedSites::new(local.clone());
    match action {
        SitesAction::Add { domain, title } => {
            let domain = parse_target(domain)?;
            let site = sites.add(&domain, title.as_deref())?;
            if fmt == OutputFormat::Human {
                println!("  {} Managing {}", "✓".green().bold(), site.domain.bold());
            }
        }
        SitesAction::Remove { domain } => {
            let domain = parse_target(domain)?;
            let site = sites.remove(&domain)?;
            if fmt == OutputFormat::Human {
                println!("  {} Removed {}", "✓".green().bold(), site.domain.bold());
            }
        }
        SitesAction::List => output::print_sites(&sites.list()?, fmt),
        SitesAction::Clear { domain, yes } => {
            return cmd_sites_clear(cli, config, fmt, sync, local, domain.as_deref(), *yes).await;
        }
        SitesAction::Reset => {
            let removed = sites.reset()?;
            if fmt == OutputFormat::Human {
                println!(
                    "  {} Removed {}",
                    "✓".green().bold(),
                    format_count(removed, "managed site")
                );
            }
        }
    }
    Ok(())
}

async fn cmd_sites_clear(
    cli: &Cli,
    config: &Config,
    fmt: OutputFormat,
    sync: Namespace,
    local: Namespace,
    domain: Option<&str>,
    yes: bool,
) -> Result<()> {
    let sites = ManagedSites::new(local.clone());
    let domain = domain.map(parse_target).transpose()?;
    let settings = Settings::load(&sync)?;
    let count = match &domain {
        Some(domain) if !sites.contains(domain)? => {
            return Err(SiteWipeError::SiteNotFound { domain: domain.clone() }.into());
        }
        Some(_) => 1,
        None => sites.list()?.len(),
    };

    if count == 0 {
        output::print_bulk_clear(&BulkClear::default(), 0.0, fmt);
        return Ok(());
    }

    if settings.confirm_before_clear && !yes {
        let scope = match &domain {
            Some(domain) => domain.clone(),
            None => format_count(count, "managed site"),
        };
        let prompt = format!("{}\n\nSites: {}", confirmation_prompt(&settings), scope);
        if !confirm(&prompt)? {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    let host = open_host(cli, config)?;
    let background = Background::new(host, sync, local);

    let spinner = if fmt == OutputFormat::Human {
        let pb = indicatif::ProgressBar::new_spinner();
        pb.set_message(format!("Clearing {}...", format_count(count, "managed site")));
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let started = Instant::now();
    let bulk = background.clear_managed(domain.as_deref()).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let bulk = bulk?;

    output::print_bulk_clear(&bulk, started.elapsed().as_secs_f64(), fmt);
    if bulk.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_settings(fmt: OutputFormat, sync: &Namespace, action: &SettingsAction) -> Result<()> {
    match action {
        SettingsAction::Show => {
            output::print_settings(&Settings::load(sync)?, fmt);
        }
        SettingsAction::Set { key, value } => {
            let mut settings = Settings::load(sync)?;
            if !settings.set(key, *value) {
                bail!("Unknown setting '{}'. Known settings: {}", key, Settings::KEYS.join(", "));
            }
            settings.save(sync)?;
            if fmt == OutputFormat::Human {
                println!("  {} {} = {}", "✓".green().bold(), key, value);
            }
        }
        SettingsAction::Reset => {
            Settings::default().save(sync)?;
            if fmt == OutputFormat::Human {
                println!("  {} Settings restored to defaults", "✓".green().bold());
            }
        }
    }
    Ok(())
}

fn cmd_config(home: &Home, mut config: Config, fmt: OutputFormat, action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => match fmt {
            OutputFormat::Json => output::print_json(&config),
            _ => println!("{}", toml::to_string_pretty(&config)?),
        },
        ConfigAction::Reset => {
            Config::default().save(home)?;
            if fmt == OutputFormat::Human {
                println!("  {} Configuration reset to defaults", "✓".green().bold());
            }
        }
        ConfigAction::Set { key, value } => {
            match key.as_str() {
                "firefox_profile" if value.is_empty() => config.firefox_profile = None,
                "firefox_profile" => {
                    let profile = FirefoxProfile::open(PathBuf::from(value))?;
                    config.firefox_profile = Some(profile.root().to_path_buf());
                }
                "output_format" => {
                    config.output_format = OutputFormat::from_str(value, true)
                        .map_err(|e| anyhow::anyhow!("Invalid output format '{}': {}", value, e))?;
                }
                _ => bail!("Unknown config key: {}. Known keys: firefox_profile, output_format", key),
            }
            config.save(home)?;
            if fmt == OutputFormat::Human {
                println!("  {} Set {} = {}", "✓".green().bold(), key, value);
            }
        }
    }
    Ok(())
}
