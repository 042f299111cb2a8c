use colored::*;
use serde::Serialize;

use crate::common::config::OutputFormat;
use crate::common::format::{self, format_count, format_duration, format_flag, format_path, format_size};
use crate::extension::BulkClear;
use crate::firefox::FirefoxProfile;
use crate::storage::category::{Category, CountOutcome, FlagOutcome};
use crate::storage::report::ClearResult;
use crate::store::managed::ManagedSite;
use crate::store::settings::Settings;
use crate::store::transfer::ImportSummary;

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("{} {}", "Error:".red().bold(), e),
    }
}

/// Print the outcome of a clear
pub fn print_clear_result(domain: &str, result: &ClearResult, freed: u64, duration_secs: f64, fmt: OutputFormat) {
    match fmt {
        OutputFormat::Json => print_json(result),
        OutputFormat::Quiet => {
            if result.success {
                println!("{}", result.per_category.total_cleared());
            } else {
                println!("error");
            }
        }
        OutputFormat::Human => print_clear_human(domain, result, freed, duration_secs),
    }
}

fn print_clear_human(domain: &str, result: &ClearResult, freed: u64, duration_secs: f64) {
    println!();
    if !result.success {
        println!(
            "  {} {}",
            "✗".red().bold(),
            result.error.as_deref().unwrap_or("clear failed").red()
        );
        println!();
        return;
    }

    println!("  {} Storage cleared for {}", "✓".green().bold(), domain.bold());
    println!("{}", "─".repeat(50).dimmed());

    let report = &result.per_category;
    if report.is_empty() {
        println!("  {}", "No categories enabled; nothing to do.".dimmed());
    }
    for category in report.attempted() {
        let line = match category {
            Category::Cookies => count_line(report.cookies.as_ref(), "cookie"),
            Category::LocalStorage => flag_line(report.local_storage.as_ref()),
            Category::SessionStorage => flag_line(report.session_storage.as_ref()),
            Category::IndexedDb => count_line(report.indexed_db.as_ref(), "database"),
            Category::CacheStorage => count_line(report.cache_storage.as_ref(), "cache"),
        };
        println!("  {:<16} {}", category.key().cyan(), line);
    }

    let errors = report.errors();
    if !errors.is_empty() {
        println!();
        println!(
            "  {} {}",
            "⚠".yellow(),
            format!("{}:", format_count(errors.len(), "error")).yellow()
        );
        for error in &errors {
            println!("    {} {}", "→".dimmed(), error.dimmed());
        }
    }

    println!("{}", "─".repeat(50).dimmed());
    if freed > 0 {
        println!("  Freed {} of profile data", format_size(freed).green().bold());
    }
    println!("  {}", format!("Done in {}", format_duration(duration_secs)).dimmed());
    println!();
}

/// Print the outcome of clearing managed sites
pub fn print_bulk_clear(bulk: &BulkClear, duration_secs: f64, fmt: OutputFormat) {
    match fmt {
        OutputFormat::Json => print_json(bulk),
        OutputFormat::Quiet => println!("cleared={} failed={}", bulk.cleared, bulk.failed),
        OutputFormat::Human => {
            println!();
            if bulk.results.is_empty() {
                println!("  {}", "No managed sites to clear.".dimmed());
                println!();
                return;
            }
            for site in &bulk.results {
                let result = &site.result;
                if result.success {
                    let errors = result.per_category.error_count();
                    let detail = if errors == 0 {
                        format!("{} items removed", result.per_category.total_cleared())
                    } else {
                        format!(
                            "{} items removed, {}",
                            result.per_category.total_cleared(),
                            format_count(errors, "error").yellow()
                        )
                    };
                    println!("  {} {:<30} {}", "✓".green().bold(), site.domain.bold(), detail.dimmed());
                } else {
                    println!(
                        "  {} {:<30} {}",
                        "✗".red().bold(),
                        site.domain.bold(),
                        result.error.as_deref().unwrap_or("clear failed").red()
                    );
                }
            }
            println!("{}", "─".repeat(50).dimmed());
            let summary = format!("Cleared {}, {} failed", format_count(bulk.cleared, "site"), bulk.failed);
            if bulk.failed == 0 {
                println!("  {}", summary.green().bold());
            } else {
                println!("  {}", summary.yellow().bold());
            }
            println!("  {}", format!("Done in {}", format_duration(duration_secs)).dimmed());
            println!();
        }
    }
}

fn count_line(outcome: Option<&CountOutcome>, noun: &str) -> String {
    match outcome {
        Some(o) if o.errors.is_empty() => format!("{} removed", format_count(o.cleared, noun)),
        Some(o) => format!(
            "{} removed, {}",
            format_count(o.cleared, noun),
            format_count(o.errors.len(), "error").yellow()
        ),
        None => String::new(),
    }
}

fn flag_line(outcome: Option<&FlagOutcome>) -> String {
    match outcome {
        Some(FlagOutcome { success: true, .. }) => "cleared".green().to_string(),
        Some(FlagOutcome { error: Some(e), .. }) => format!("{} {}", "failed:".red(), e),
        Some(_) => "not available".dimmed().to_string(),
        None => String::new(),
    }
}

/// Print the managed site list
pub fn print_sites(sites: &[ManagedSite], fmt: OutputFormat) {
    match fmt {
        OutputFormat::Json => print_json(&sites),
        OutputFormat::Quiet => {
            for site in sites {
                println!("{}", site.domain);
            }
        }
        OutputFormat::Human => {
            format::print_header("Managed Sites");
            if sites.is_empty() {
                println!("  {}", "No managed sites yet. Add one with `sitewipe sites add <domain>`.".dimmed());
                println!();
                return;
            }
            for site in sites {
                let title = if site.title == site.domain {
                    String::new()
                } else {
                    format!(" ({})", format::truncate(&site.title, 40))
                };
                println!(
                    "  {} {}{}  {}",
                    "●".green(),
                    site.domain.bold(),
                    title,
                    site.date_added.format("%Y-%m-%d").to_string().dimmed()
                );
            }
            println!();
            println!("  {}", format_count(sites.len(), "site").dimmed());
            println!();
        }
    }
}

/// Print the clear settings
pub fn print_settings(settings: &Settings, fmt: OutputFormat) {
    match fmt {
        OutputFormat::Json => print_json(settings),
        OutputFormat::Quiet => {
            for key in Settings::KEYS {
                if let Some(value) = settings.get(key) {
                    println!("{}={}", key, value);
                }
            }
        }
        OutputFormat::Human => {
            format::print_header("Settings");
            for key in Settings::KEYS {
                if let Some(value) = settings.get(key) {
                    println!("  {:<22} {}", key, format_flag(value));
                }
            }
            println!();
        }
    }
}

pub fn print_import_summary(summary: &ImportSummary, fmt: OutputFormat) {
    match fmt {
        OutputFormat::Json => print_json(summary),
        OutputFormat::Quiet => println!("{}", summary.added),
        OutputFormat::Human => {
            println!(
                "  {} Imported {} ({} already present)",
                "✓".green().bold(),
                format_count(summary.added, "site"),
                summary.skipped
            );
            if summary.settings_updated > 0 {
                println!(
                    "  {} Updated {}",
                    "✓".green().bold(),
                    format_count(summary.settings_updated, "setting")
                );
            }
        }
    }
}

#[derive(Serialize)]
struct ProfileRow {
    name: String,
    path: String,
    locked: bool,
    data_size: u64,
    default: bool,
}

/// Print discovered browser profiles; `default` is the one used when none is given
pub fn print_profiles(profiles: &[FirefoxProfile], default: Option<&FirefoxProfile>, fmt: OutputFormat) {
    let rows: Vec<ProfileRow> = profiles
        .iter()
        .map(|p| ProfileRow {
            name: p.name(),
            path: p.root().display().to_string(),
            locked: p.is_locked(),
            data_size: p.data_size(),
            default: default == Some(p),
        })
        .collect();

    match fmt {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Quiet => {
            for row in &rows {
                println!("{}", row.path);
            }
        }
        OutputFormat::Human => {
            format::print_header("Firefox Profiles");
            if profiles.is_empty() {
                println!("  {}", "No profiles found. Pass --profile-dir to point at one.".dimmed());
                println!();
                return;
            }
            for (row, profile) in rows.iter().zip(profiles) {
                let marker = if row.default { "★".yellow() } else { "●".dimmed() };
                let lock = if row.locked { " [in use]".red().to_string() } else { String::new() };
                println!(
                    "  {} {}{}  {}",
                    marker,
                    row.name.bold(),
                    lock,
                    format_size(row.data_size).cyan()
                );
                println!("    {}", format_path(profile.root()).dimmed());
            }
            println!();
        }
    }
}
