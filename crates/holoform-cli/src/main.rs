use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use holoform_core::schema::{holoform_id, HOLOFORM_ID_SUFFIX};
use holoform_core::{render_text, ConfigManager, Holoform, HoloformConfig, LoggingConfig};
use holoform_graph::{ProjectIndex, ProjectParser, Query, QueryEngine};
use holoform_parser::HoloformDriver;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "holoform")]
#[command(about = "Holoform - structured semantic records for Python code", long_about = None)]
#[command(version)]
struct Cli {
    /// Output format (json, pretty, text)
    #[arg(short, long, global = true, default_value = "pretty")]
    output: OutputFormat,

    /// Config file (defaults to ./.holoform.toml, then ~/.holoform/config.toml)
    #[arg(long, global = true, env = "HOLOFORM_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate Holoforms for one Python file
    Generate {
        /// Source file
        file: PathBuf,

        /// Only the top-level function or class with this name
        #[arg(short, long)]
        target: Option<String>,
    },

    /// Incrementally parse a project and build its call graph
    Project {
        /// Project root
        dir: PathBuf,
    },

    /// Run a callers-of query over a project
    Query {
        /// Project root
        dir: PathBuf,

        /// MATCH (a)-[:CALLS]->(b) WHERE b.id == "<id>" RETURN a.id
        query: String,
    },

    /// Show the direct callees of an entry function
    ZeroIn {
        /// Project root
        dir: PathBuf,

        /// Entry function name or Holoform id
        entry: String,
    },
}

/// A command result in both machine and human form.
struct CommandOutput {
    value: serde_json::Value,
    text: String,
}

#[derive(Serialize)]
struct QueryResult {
    query: String,
    target: String,
    callers: Vec<String>,
}

#[derive(Serialize)]
struct CalleeEntry {
    id: String,
    holoform: Option<Holoform>,
}

#[derive(Serialize)]
struct ZeroInResult {
    entry: String,
    entry_holoform: Option<Holoform>,
    callees: Vec<CalleeEntry>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let manager = match &cli.config {
        Some(path) => ConfigManager::from_file(path),
        None => ConfigManager::load(),
    };
    let config = match manager {
        Ok(manager) => manager.config().clone(),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };
    init_tracing(&config.logging, cli.verbose);

    match execute_command(&cli, &config) {
        Ok(output) => {
            print_output(&cli.output, &output)?;
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let registry = tracing_subscriber::registry().with(filter);

    match logging.format.as_str() {
        "json" => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        "compact" => registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init(),
        _ => registry
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .init(),
    }
}

fn execute_command(cli: &Cli, config: &HoloformConfig) -> Result<CommandOutput> {
    match &cli.command {
        Commands::Generate { file, target } => execute_generate(file, target.as_deref()),
        Commands::Project { dir } => execute_project(dir, config),
        Commands::Query { dir, query } => execute_query(dir, query, config),
        Commands::ZeroIn { dir, entry } => execute_zero_in(dir, entry, config),
    }
}

fn execute_generate(file: &Path, target: Option<&str>) -> Result<CommandOutput> {
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let driver = HoloformDriver::new();

    let holoforms = match target {
        Some(name) => vec![driver
            .try_generate(&source, Some(name))
            .with_context(|| format!("Failed to generate Holoform for {}", file.display()))?],
        None => driver
            .generate_all(&source)
            .with_context(|| format!("Failed to generate Holoforms for {}", file.display()))?,
    };
    debug!("Generated {} Holoforms from {}", holoforms.len(), file.display());

    let text = holoforms
        .iter()
        .map(render_text)
        .collect::<Vec<_>>()
        .join("\n");
    let value = match holoforms.as_slice() {
        [single] if target.is_some() => serde_json::to_value(single)?,
        _ => serde_json::to_value(&holoforms)?,
    };
    Ok(CommandOutput { value, text })
}

fn run_project(dir: &Path, config: &HoloformConfig) -> Result<ProjectIndex> {
    let parser = ProjectParser::new(HoloformDriver::new(), config.project.clone());
    parser
        .parse_project(dir)
        .with_context(|| format!("Failed to parse project {}", dir.display()))
}

fn execute_project(dir: &Path, config: &HoloformConfig) -> Result<CommandOutput> {
    let index = run_project(dir, config)?;

    let mut text = String::new();
    for holoform in &index.holoforms {
        text.push_str(&render_text(holoform));
        text.push('\n');
    }
    text.push_str("Call graph:\n");
    for (caller, callees) in index.call_graph.iter() {
        text.push_str(&format!("  {} -> [{}]\n", caller, callees.join(", ")));
    }
    let stats = &index.stats;
    text.push_str(&format!(
        "Files: {} seen, {} parsed, {} skipped, {} failed, {} removed",
        stats.files_seen,
        stats.files_parsed,
        stats.files_skipped,
        stats.files_failed,
        stats.files_removed
    ));

    Ok(CommandOutput {
        value: serde_json::to_value(&index)?,
        text,
    })
}

fn execute_query(dir: &Path, text: &str, config: &HoloformConfig) -> Result<CommandOutput> {
    let query = Query::parse(text)
        .ok_or_else(|| holoform_core::HoloformError::InvalidQuery(text.to_string()))?;
    let index = run_project(dir, config)?;
    let callers = QueryEngine::new(&index.call_graph).execute(&query);

    let Query::CallersOf(target) = query;
    let rendered = if callers.is_empty() {
        format!("No callers of {}", target)
    } else {
        callers.join("\n")
    };
    let result = QueryResult {
        query: text.to_string(),
        target,
        callers,
    };
    Ok(CommandOutput {
        value: serde_json::to_value(result)?,
        text: rendered,
    })
}

fn execute_zero_in(dir: &Path, entry: &str, config: &HoloformConfig) -> Result<CommandOutput> {
    let entry_id = if entry.ends_with(HOLOFORM_ID_SUFFIX) {
        entry.to_string()
    } else {
        holoform_id(entry)
    };
    let index = run_project(dir, config)?;

    let callees = index
        .call_graph
        .callees_of(&entry_id)
        .ok_or_else(|| anyhow!("No function Holoform with id {}", entry_id))?;

    let mut unique: Vec<&String> = Vec::new();
    for callee in callees {
        if !unique.contains(&callee) {
            unique.push(callee);
        }
    }

    let mut text = format!("Entry: {}\n", entry_id);
    if let Some(holoform) = index.find(&entry_id) {
        text.push_str(&render_text(holoform));
    }
    text.push_str("\nDirect callees:\n");
    let callees: Vec<CalleeEntry> = unique
        .into_iter()
        .map(|id| {
            let holoform = index.find(id).cloned();
            let marker = if holoform.is_some() { "" } else { " (unresolved)" };
            text.push_str(&format!("  - {}{}\n", id, marker));
            CalleeEntry {
                id: id.clone(),
                holoform,
            }
        })
        .collect();

    let result = ZeroInResult {
        entry_holoform: index.find(&entry_id).cloned(),
        entry: entry_id,
        callees,
    };
    Ok(CommandOutput {
        value: serde_json::to_value(result)?,
        text,
    })
}

fn print_output(format: &OutputFormat, output: &CommandOutput) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&output.value)?);
        }
        OutputFormat::Pretty => {
            print_pretty(&output.value, 0)?;
        }
        OutputFormat::Text => {
            println!("{}", output.text);
        }
    }
    Ok(())
}

fn print_pretty(value: &serde_json::Value, indent: usize) -> Result<()> {
    let pad = "  ".repeat(indent);
    match value {
        serde_json::Value::Object(map) => {
            for (key, val) in map {
                let key_colored = key.cyan().bold();
                match val {
                    serde_json::Value::String(s) => {
                        println!("{}{}: {}", pad, key_colored, s.green());
                    }
                    serde_json::Value::Number(n) => {
                        println!("{}{}: {}", pad, key_colored, n.to_string().yellow());
                    }
                    serde_json::Value::Bool(b) => {
                        let val_colored = if *b {
                            "true".green()
                        } else {
                            "false".red()
                        };
                        println!("{}{}: {}", pad, key_colored, val_colored);
                    }
                    serde_json::Value::Null => {
                        println!("{}{}: {}", pad, key_colored, "null".dimmed());
                    }
                    _ => {
                        println!("{}{}:", pad, key_colored);
                        print_pretty(val, indent + 1)?;
                    }
                }
            }
        }
        serde_json::Value::Array(arr) => {
            for (i, item) in arr.iter().enumerate() {
                match item {
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        println!("{}{}{}:", pad, "Item ".cyan(), (i + 1).to_string().yellow());
                        print_pretty(item, indent + 1)?;
                    }
                    serde_json::Value::String(s) => println!("{}- {}", pad, s.green()),
                    other => println!("{}- {}", pad, other),
                }
            }
        }
        _ => {
            println!("{}{}", pad, serde_json::to_string_pretty(value)?);
        }
    }
    Ok(())
}
