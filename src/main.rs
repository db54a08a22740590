//! Stache CLI - render bound templates from an HTML document

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

use stache_bind::config::StacheConfig;
use stache_bind::path::assign;
use stache_bind::{install_as, FixSuggestion, Record, Registry, StacheError, TemplateSet, Value};

#[derive(Parser)]
#[command(name = "stache")]
#[command(about = "Stache - live {{ mustache }} data binding for HTML templates")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./stache.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Attribute naming template elements
    #[arg(long, global = true)]
    attribute: Option<String>,

    /// Log binding activity (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the templates of a document
    List {
        /// Path to an HTML document with <template> elements
        document: PathBuf,

        /// Namespace the registry is installed under
        #[arg(short, long)]
        namespace: Option<String>,
    },

    /// Render a template, then apply writes and render again after each
    Render {
        /// Path to an HTML document with <template> elements
        document: PathBuf,

        /// Template name
        #[arg(short, long)]
        template: String,

        /// Context file (.json, .yaml or .yml)
        #[arg(short, long)]
        context: Option<PathBuf>,

        /// Write applied after the first render: path=value (value parsed as JSON,
        /// or taken as a plain string)
        #[arg(short, long = "set", value_name = "PATH=VALUE")]
        set: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = load_config(&cli).and_then(|config| match cli.command {
        Commands::List {
            ref document,
            ref namespace,
        } => list_templates(document, namespace.as_deref(), &config),
        Commands::Render {
            ref document,
            ref template,
            ref context,
            ref set,
        } => render_template(document, template, context.as_deref(), set, &config),
    });

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<StacheConfig, StacheError> {
    let path = cli.config.clone().unwrap_or_else(StacheConfig::default_path);
    if cli.config.is_some() && !path.exists() {
        return Err(StacheError::Config {
            reason: format!("{} does not exist", path.display()),
        });
    }

    let mut config = StacheConfig::load(&path)?.with_env();
    if let Some(attribute) = &cli.attribute {
        config.template_attribute = attribute.clone();
    }
    Ok(config)
}

fn load_registry(
    document: &Path,
    namespace: &str,
    config: &StacheConfig,
) -> Result<Registry, StacheError> {
    let html = fs::read_to_string(document)?;
    let set = TemplateSet::from_document_with(&html, &config.template_attribute)?;
    install_as(&set, namespace)
}

fn list_templates(
    document: &Path,
    namespace: Option<&str>,
    config: &StacheConfig,
) -> Result<(), StacheError> {
    let namespace = namespace.unwrap_or(&config.namespace);
    let registry = load_registry(document, namespace, config)?;

    println!(
        "{} {} ({} templates)",
        "✓".green(),
        registry.namespace().cyan().bold(),
        registry.len()
    );
    for name in registry.names() {
        println!("  {}", name);
    }
    Ok(())
}

fn render_template(
    document: &Path,
    name: &str,
    context: Option<&Path>,
    assignments: &[String],
    config: &StacheConfig,
) -> Result<(), StacheError> {
    let registry = load_registry(document, &config.namespace, config)?;
    let context = match context {
        Some(path) => load_context(path)?,
        None => Record::new(),
    };

    let fragment = registry.evaluate(name, &context)?;
    println!("{}", fragment.to_html());

    for assignment in assignments {
        let (path, raw) = assignment
            .split_once('=')
            .ok_or_else(|| StacheError::InvalidAssignment {
                assignment: assignment.clone(),
                reason: "expected path=value".to_string(),
            })?;
        let value = serde_json::from_str::<serde_json::Value>(raw)
            .map(Value::from)
            .unwrap_or_else(|_| Value::from(raw));

        assign(&context, path.trim(), value)?;
        println!("{} {}", "→".cyan(), assignment);
        println!("{}", fragment.to_html());
    }

    Ok(())
}

fn load_context(path: &Path) -> Result<Record, StacheError> {
    let content = fs::read_to_string(path)?;
    let json: serde_json::Value = match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml" | "yml") => serde_yaml::from_str(&content)?,
        _ => serde_json::from_str(&content)?,
    };
    Record::from_json(json)
}
