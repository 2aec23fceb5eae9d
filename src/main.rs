use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use html_template::{BuildOutputConfig, BundleManifest, HtmlTemplatePlugin, InjectionOptions};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Inject emitted bundle assets into an HTML template.
///
/// Run this after the bundler has written its output. The manifest is a
/// JSON object mapping emitted file names to `{ "isEntry": bool }`.
#[derive(Debug, Parser)]
#[command(name = "html-template", version)]
struct Cli {
    /// Bundle output directory.
    #[arg(long, conflicts_with = "file")]
    dir: Option<PathBuf>,

    /// Single bundle output file; its directory is the output directory.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Manifest JSON file. Read from stdin when omitted.
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Options JSON file. Flags below override its values.
    #[arg(long)]
    options: Option<PathBuf>,

    /// Source HTML template.
    #[arg(long)]
    template: Option<PathBuf>,

    /// Destination HTML path.
    #[arg(long)]
    target: Option<PathBuf>,

    /// Literal prefix for every asset URL.
    #[arg(long)]
    prefix: Option<String>,

    /// Attribute token added to every script tag. Repeatable.
    #[arg(long = "attr")]
    attrs: Vec<String>,

    /// Inline script contents instead of referencing them.
    #[arg(long)]
    embed_content: bool,

    /// PATTERN=VALUE literal substitution. Repeatable, applied in order.
    #[arg(long = "replace-var", value_parser = parse_replace_var)]
    replace_vars: Vec<(String, String)>,
}

fn parse_replace_var(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(p, v)| (p.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected PATTERN=VALUE, got '{raw}'"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("html_template=info,warn")),
        )
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("[html-template] {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let output = match (&cli.dir, &cli.file) {
        (Some(dir), _) => BuildOutputConfig::from_dir(dir),
        (None, Some(file)) => BuildOutputConfig::from_file(file),
        (None, None) => bail!("required flag missing: --dir <path> or --file <path>"),
    };

    let manifest = load_manifest(cli.manifest.as_ref())?;
    let options = load_options(&cli)?;

    let mut plugin = HtmlTemplatePlugin::new(options);
    for (pattern, value) in &cli.replace_vars {
        plugin = plugin.with_replace_var(pattern, value);
    }

    plugin
        .write_bundle(&output, &manifest)
        .await
        .context("injection failed")
}

fn load_manifest(path: Option<&PathBuf>) -> Result<BundleManifest> {
    let raw = match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest '{}'", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read manifest from stdin")?;
            buf
        }
    };
    if raw.trim().is_empty() {
        bail!("manifest payload is empty");
    }
    serde_json::from_str(&raw).context("invalid manifest JSON")
}

fn load_options(cli: &Cli) -> Result<InjectionOptions> {
    let mut options = match &cli.options {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read options '{}'", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("invalid options JSON in '{}'", path.display()))?
        }
        None => InjectionOptions::default(),
    };

    if cli.template.is_some() {
        options.template = cli.template.clone();
    }
    if cli.target.is_some() {
        options.target = cli.target.clone();
    }
    if cli.prefix.is_some() {
        options.prefix = cli.prefix.clone();
    }
    if !cli.attrs.is_empty() {
        options.attrs = cli.attrs.clone();
    }
    options.embed_content |= cli.embed_content;
    Ok(options)
}
