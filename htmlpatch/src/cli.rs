///
/// This module implements the CLI for htmlpatch: command parsing, flag
/// overrides on top of the loaded config, and report printing.
///
/// All rewrite logic (rules, presets, the pipeline and persistence) lives in
/// the [`htmlpatch-core`] crate. This module is strictly CLI glue.
///
/// ## How To Use
/// - From the shell: `htmlpatch <command> <FILE>`, see `--help`.
/// - Programmatically and from integration tests: call [`run`] with a
///   constructed [`Cli`].
///
/// [`htmlpatch-core`]: ../../htmlpatch-core/
use crate::load_config::resolve_config;
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use htmlpatch_core::config::{PatchConfig, RunParams};
use htmlpatch_core::document::FsStore;
use htmlpatch_core::executor::{RuleOutcome, RuleReport};
use htmlpatch_core::patch::{patch_file, PatchOutcome, PatchRequest};
use htmlpatch_core::presets::{self, remaining_mentions, Preset};
use serde::Serialize;
use std::path::PathBuf;

/// CLI for htmlpatch: rule-based rewrites of a single static HTML file.
#[derive(Parser, Debug)]
#[clap(
    name = "htmlpatch",
    version,
    about = "Clean, de-domain and optimise a scraped static HTML page in place"
)]
pub struct Cli {
    /// Path to a YAML config file
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// Report format
    #[clap(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Arguments shared by every command.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// HTML file to patch
    pub file: PathBuf,

    /// Write the result here instead of overwriting FILE
    #[clap(long)]
    pub output: Option<PathBuf>,

    /// Copy FILE to FILE.bak before overwriting it
    #[clap(long)]
    pub backup: bool,

    /// Run every rule and report, but write nothing
    #[clap(long)]
    pub dry_run: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Strip tracking scripts, web fonts, feeds and chat widgets
    Clean {
        #[clap(flatten)]
        target: TargetArgs,
    },
    /// Rewrite absolute URLs of the site domain to relative paths
    Domain {
        #[clap(flatten)]
        target: TargetArgs,
        /// Site domain, e.g. example.com
        #[clap(long)]
        domain: Option<String>,
    },
    /// Point every WhatsApp link at one number and message
    Whatsapp {
        #[clap(flatten)]
        target: TargetArgs,
        /// Phone number in international format
        #[clap(long)]
        number: Option<String>,
        /// Pre-filled message
        #[clap(long)]
        message: Option<String>,
    },
    /// Drop or repair image references missing from disk
    Images {
        #[clap(flatten)]
        target: TargetArgs,
        /// Site root holding the uploads directory (default: FILE's directory)
        #[clap(long)]
        root: Option<PathBuf>,
    },
    /// Tag resources with a fresh cache-busting token
    CacheBust {
        #[clap(flatten)]
        target: TargetArgs,
        /// Token to use instead of the current Unix time
        #[clap(long)]
        token: Option<String>,
    },
    /// Inline critical CSS and defer non-critical resources
    Optimize {
        #[clap(flatten)]
        target: TargetArgs,
    },
    /// Advanced critical CSS, lazy images and preconnect hints
    Advanced {
        #[clap(flatten)]
        target: TargetArgs,
    },
    /// Defer the heaviest render-blocking resources
    Heavy {
        #[clap(flatten)]
        target: TargetArgs,
    },
    /// Settle script order and resource hints
    Finalize {
        #[clap(flatten)]
        target: TargetArgs,
    },
    /// Chain several presets in one load and save
    Run {
        #[clap(flatten)]
        target: TargetArgs,
        /// Comma-separated presets (default: `pipeline` from the config)
        #[clap(long, value_delimiter = ',')]
        preset: Vec<Preset>,
        #[clap(long)]
        domain: Option<String>,
        #[clap(long)]
        number: Option<String>,
        #[clap(long)]
        message: Option<String>,
        #[clap(long)]
        root: Option<PathBuf>,
        #[clap(long)]
        token: Option<String>,
    },
}

/// Flag values that override the loaded config.
#[derive(Debug, Default)]
struct Overrides {
    domain: Option<String>,
    number: Option<String>,
    message: Option<String>,
    root: Option<PathBuf>,
    token: Option<String>,
}

impl Overrides {
    fn apply(self, config: &mut PatchConfig) {
        if let Some(domain) = self.domain {
            config.domain = Some(domain);
        }
        if let Some(number) = self.number {
            config.whatsapp.number = Some(number);
        }
        if let Some(message) = self.message {
            config.whatsapp.message = Some(message);
        }
        if let Some(root) = self.root {
            config.inventory.root = Some(root);
        }
        if let Some(token) = self.token {
            config.cache.token = Some(token);
        }
    }
}

impl Commands {
    /// Split into the presets to run, the target, and the flag overrides.
    fn into_parts(self) -> (Vec<Preset>, TargetArgs, Overrides) {
        let single = |preset, target| (vec![preset], target, Overrides::default());
        match self {
            Commands::Clean { target } => single(Preset::Clean, target),
            Commands::Domain { target, domain } => (
                vec![Preset::Domain],
                target,
                Overrides {
                    domain,
                    ..Default::default()
                },
            ),
            Commands::Whatsapp {
                target,
                number,
                message,
            } => (
                vec![Preset::Whatsapp],
                target,
                Overrides {
                    number,
                    message,
                    ..Default::default()
                },
            ),
            Commands::Images { target, root } => (
                vec![Preset::Images],
                target,
                Overrides {
                    root,
                    ..Default::default()
                },
            ),
            Commands::CacheBust { target, token } => (
                vec![Preset::CacheBust],
                target,
                Overrides {
                    token,
                    ..Default::default()
                },
            ),
            Commands::Optimize { target } => single(Preset::Optimize, target),
            Commands::Advanced { target } => single(Preset::Advanced, target),
            Commands::Heavy { target } => single(Preset::Heavy, target),
            Commands::Finalize { target } => single(Preset::Finalize, target),
            Commands::Run {
                target,
                preset,
                domain,
                number,
                message,
                root,
                token,
            } => (
                preset,
                target,
                Overrides {
                    domain,
                    number,
                    message,
                    root,
                    token,
                },
            ),
        }
    }
}

/// CLI logic entrypoint for integration tests and main()
pub fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    let mut config = resolve_config(cli.config.as_deref())?;
    let (mut presets, target, overrides) = cli.command.into_parts();
    overrides.apply(&mut config);
    config.trace_loaded();

    if presets.is_empty() {
        presets = config.pipeline.clone();
    }
    if presets.is_empty() {
        bail!("no presets to run: pass --preset or set `pipeline` in the config file");
    }

    let params = RunParams::resolve(&config, &target.file);
    let pipeline = presets::chain(&presets, &config, &params)
        .context("Failed to build the rewrite pipeline")?;
    tracing::info!(
        presets = ?presets,
        rules = pipeline.len(),
        file = %target.file.display(),
        "Starting patch"
    );

    let request = PatchRequest {
        target: target.file.clone(),
        output: target.output.clone(),
        backup: target.backup || config.output.backup,
        dry_run: target.dry_run,
    };
    let outcome = patch_file(&FsStore::new(), &request, &pipeline)
        .with_context(|| format!("Failed to patch {}", target.file.display()))?;

    let mentions = if presets.contains(&Preset::Domain) {
        config
            .domain
            .as_deref()
            .map(|domain| (domain, remaining_mentions(outcome.document.as_str(), domain)))
    } else {
        None
    };

    match cli.format {
        OutputFormat::Text => print_text(&request, &outcome, mentions),
        OutputFormat::Json => print_json(&request, &outcome, mentions)?,
    }
    tracing::info!(
        written = outcome.written,
        substitutions = outcome.report.total_substitutions(),
        "Patch complete"
    );
    Ok(())
}

fn print_text(request: &PatchRequest, outcome: &PatchOutcome, mentions: Option<(&str, usize)>) {
    for report in &outcome.report.rules {
        println!("{}", describe(report));
        for warning in &report.warnings {
            println!("    warning: {warning}");
        }
    }

    let total = outcome.report.total_substitutions();
    if outcome.written {
        println!(
            "{total} substitutions, written to {}",
            outcome.destination.display()
        );
    } else if request.dry_run {
        println!("{total} substitutions (dry run, nothing written)");
    } else {
        println!("No references found, nothing written");
    }
    if let Some(backup) = &outcome.backup {
        println!("Backup: {}", backup.display());
    }
    if let Some((domain, count)) = mentions {
        println!("Remaining mentions of {domain}: {count}");
    }
}

fn describe(report: &RuleReport) -> String {
    match &report.outcome {
        RuleOutcome::Applied { substitutions } => {
            format!("  applied   {} ({substitutions})", report.rule)
        }
        RuleOutcome::NoMatch => format!("  no match  {}", report.rule),
        RuleOutcome::Failed { error } => format!("  FAILED    {}: {error}", report.rule),
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    file: &'a std::path::Path,
    destination: &'a std::path::Path,
    written: bool,
    dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    backup: Option<&'a std::path::Path>,
    substitutions: usize,
    rules: &'a [RuleReport],
    #[serde(skip_serializing_if = "Option::is_none")]
    remaining_mentions: Option<usize>,
}

fn print_json(
    request: &PatchRequest,
    outcome: &PatchOutcome,
    mentions: Option<(&str, usize)>,
) -> Result<()> {
    let report = JsonReport {
        file: &request.target,
        destination: &outcome.destination,
        written: outcome.written,
        dry_run: request.dry_run,
        backup: outcome.backup.as_deref(),
        substitutions: outcome.report.total_substitutions(),
        rules: &outcome.report.rules,
        remaining_mentions: mentions.map(|(_, count)| count),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
