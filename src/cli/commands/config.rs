//! `comply config` command - Configuration management

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::helpers::{print_structured, resolve_format, success};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::project::Project;
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show(ShowArgs),

    /// Set a configuration value
    Set(SetArgs),

    /// Remove a configuration value
    Unset(UnsetArgs),

    /// Show paths to configuration files
    Path,

    /// List all configuration keys
    Keys,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key (dotted for nested values, e.g. severity.alto)
    pub key: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Configuration key (e.g. author, page_size, severity.medio)
    pub key: String,

    pub value: String,

    /// Write to the global (user) config instead of the project's
    #[arg(long, short = 'g')]
    pub global: bool,
}

#[derive(clap::Args, Debug)]
pub struct UnsetArgs {
    pub key: String,

    /// Remove from the global (user) config instead of the project's
    #[arg(long, short = 'g')]
    pub global: bool,
}

const VALID_KEYS: &[(&str, &str)] = &[
    ("author", "Acting user recorded on entities and audit entries"),
    ("default_format", "Default output format (tsv, json, yaml, csv, md)"),
    ("page_size", "Audit list page size"),
    ("max_upload_bytes", "Largest accepted evidence file"),
    ("severity.baixo", "Highest level still rated baixo"),
    ("severity.medio", "Highest level still rated medio"),
    ("severity.alto", "Highest level still rated alto; above is critico"),
    ("recommendations.high_risk_items", "Recommend when high-risk items exceed this"),
    ("recommendations.overall_conformity", "Recommend when overall conformity is below this %"),
    ("recommendations.category_conformity", "Recommend when a category is below this %"),
    ("recommendations.pending_items", "Recommend when pending items exceed this"),
];

pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args, global),
        ConfigCommands::Set(args) => run_set(args, global),
        ConfigCommands::Unset(args) => run_unset(args, global),
        ConfigCommands::Path => run_path(global),
        ConfigCommands::Keys => run_keys(),
    }
}

fn discover(global: &GlobalOpts) -> Result<Project> {
    let project = match global.project.as_deref() {
        Some(path) => Project::discover_from(path)?,
        None => Project::discover()?,
    };
    Ok(project)
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    // Outside a project the global layer still applies
    let project = discover(global).ok();
    let config = Config::load(project.as_ref());
    let effective = config.effective();

    if let Some(key) = &args.key {
        let value = key
            .split('.')
            .try_fold(&effective, |v, part| v.get(part))
            .ok_or_else(|| {
                miette::miette!(help = "run `comply config keys`", "unknown key '{}'", key)
            })?;
        match value {
            serde_json::Value::String(s) => println!("{}", s),
            other => println!("{}", other),
        }
        return Ok(());
    }

    let format = resolve_format(global, &config, OutputFormat::Auto);
    if print_structured(format, &effective)? {
        return Ok(());
    }

    println!("{}", style("Effective configuration").bold().underlined());
    println!();
    print!("{}", serde_yml::to_string(&effective).into_diagnostic()?);
    println!();
    println!("{}", style("Sources (highest priority first):").dim());
    println!("  1. Environment (COMPLY_AUTHOR, COMPLY_PAGE_SIZE)");
    println!("  2. Project config (.comply/config.yaml)");
    println!("  3. Global config (~/.config/comply/config.yaml)");
    Ok(())
}

fn config_path(global_scope: bool, global: &GlobalOpts) -> Result<PathBuf> {
    if global_scope {
        Config::global_config_path()
            .ok_or_else(|| miette::miette!("could not determine the global config directory"))
    } else {
        Ok(discover(global)?.comply_dir().join("config.yaml"))
    }
}

fn read_mapping(path: &Path) -> Result<serde_yml::Value> {
    if !path.exists() {
        return Ok(serde_yml::Value::Mapping(Default::default()));
    }
    let content = fs::read_to_string(path).into_diagnostic()?;
    let parsed: serde_yml::Value = serde_yml::from_str(&content).into_diagnostic()?;
    Ok(if parsed.is_null() {
        serde_yml::Value::Mapping(Default::default())
    } else {
        parsed
    })
}

/// Numbers and booleans are written as such so they load back into typed fields
fn scalar(value: &str) -> serde_yml::Value {
    if let Ok(n) = value.parse::<u64>() {
        return serde_yml::Value::Number(n.into());
    }
    if let Ok(b) = value.parse::<bool>() {
        return serde_yml::Value::Bool(b);
    }
    serde_yml::Value::String(value.to_string())
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    if !VALID_KEYS.iter().any(|(k, _)| *k == args.key) {
        return Err(miette::miette!(
            help = "run `comply config keys`",
            "unknown key '{}'",
            args.key
        ));
    }
    let path = config_path(args.global, global)?;
    let mut root = read_mapping(&path)?;
    set_nested_value(&mut root, &args.key, scalar(&args.value))?;
    if args.key.starts_with("severity.") {
        check_severity_order(&root)?;
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    fs::write(&path, serde_yml::to_string(&root).into_diagnostic()?).into_diagnostic()?;
    tracing::debug!(path = %path.display(), key = %args.key, "config updated");

    success(
        global,
        format!(
            "Set {} = {} in {} config",
            style(&args.key).cyan(),
            style(&args.value).yellow(),
            if args.global { "global" } else { "project" }
        ),
    );
    Ok(())
}

fn run_unset(args: UnsetArgs, global: &GlobalOpts) -> Result<()> {
    let path = config_path(args.global, global)?;
    let mut root = read_mapping(&path)?;
    if !unset_nested_value(&mut root, &args.key) {
        return Err(miette::miette!("key '{}' is not set in {}", args.key, path.display()));
    }
    fs::write(&path, serde_yml::to_string(&root).into_diagnostic()?).into_diagnostic()?;
    success(global, format!("Removed {}", style(&args.key).cyan()));
    Ok(())
}

fn run_path(global: &GlobalOpts) -> Result<()> {
    let describe = |path: &Path| {
        if path.exists() {
            style("(exists)").green()
        } else {
            style("(not created)").dim()
        }
    };

    match Config::global_config_path() {
        Some(path) => println!("{} {} {}", style("Global:").cyan(), path.display(), describe(&path)),
        None => println!("{} {}", style("Global:").cyan(), style("(unavailable)").dim()),
    }
    match discover(global) {
        Ok(project) => {
            let path = project.comply_dir().join("config.yaml");
            println!("{} {} {}", style("Project:").cyan(), path.display(), describe(&path));
        }
        Err(_) => println!(
            "{} {}",
            style("Project:").cyan(),
            style("(not in a comply project)").dim()
        ),
    }
    Ok(())
}

fn run_keys() -> Result<()> {
    println!("{}", style("Available configuration keys:").bold());
    println!();
    for (key, description) in VALID_KEYS {
        println!("  {:<38} {}", style(key).cyan(), style(description).dim());
    }
    Ok(())
}

fn set_nested_value(root: &mut serde_yml::Value, key: &str, value: serde_yml::Value) -> Result<()> {
    let mut parts: Vec<&str> = key.split('.').collect();
    let Some(last) = parts.pop() else {
        return Ok(());
    };

    let mut current = root;
    for part in parts {
        let serde_yml::Value::Mapping(map) = current else {
            return Err(miette::miette!("'{}' is not a section", part));
        };
        current = map
            .entry(serde_yml::Value::String(part.to_string()))
            .or_insert_with(|| serde_yml::Value::Mapping(Default::default()));
    }
    match current {
        serde_yml::Value::Mapping(map) => {
            map.insert(serde_yml::Value::String(last.to_string()), value);
            Ok(())
        }
        _ => Err(miette::miette!("cannot set '{}' inside a scalar value", key)),
    }
}

/// Refuse a severity section whose bands would not rise with the level
fn check_severity_order(root: &serde_yml::Value) -> Result<()> {
    let config: Config = serde_yml::from_value(root.clone()).into_diagnostic()?;
    let t = config.severity();
    if t.is_ascending() {
        return Ok(());
    }
    Err(miette::miette!(
        help = "set the thresholds so that baixo <= medio <= alto",
        "severity thresholds out of order: baixo {}, medio {}, alto {}",
        t.baixo,
        t.medio,
        t.alto
    ))
}

fn unset_nested_value(root: &mut serde_yml::Value, key: &str) -> bool {
    let mut parts: Vec<&str> = key.split('.').collect();
    let Some(last) = parts.pop() else {
        return false;
    };

    let mut current = root;
    for part in parts {
        match current.get_mut(part) {
            Some(next) => current = next,
            None => return false,
        }
    }
    match current {
        serde_yml::Value::Mapping(map) => map
            .remove(&serde_yml::Value::String(last.to_string()))
            .is_some(),
        _ => false,
    }
}
