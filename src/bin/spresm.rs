//! spresm - Keep locally-edited generated configuration up to date.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use spresm::eval::DEFAULT_FUNCTION_CONFIG;
use spresm::merge::Diagnostic;
use spresm::spec::{read_spec, HelmArgs, ImageArgs, Kind, Release, Spec};
use spresm::update::{UpdateOptions, UpdateReport, Updater, DEFAULT_BASE_REV};
use spresm::value::{from_yaml, from_yaml_stream, to_json, to_yaml, to_yaml_stream, Value};
use spresm::{reconcile_with, ConflictPolicy, MergeOptions};

#[derive(Parser)]
#[command(
    name = "spresm",
    about = "Generate configuration packages and keep local edits across updates",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log more; repeat for debug output. RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Print the documents generated from the spec file in <dir>
    Eval { dir: PathBuf },
    /// Print the kind-specific configuration of the spec file in <dir>
    Config { dir: PathBuf },
    /// Update the package in <dir> according to its spec file
    Update(UpdateArgs),
    /// Import a package from a chart or image
    #[command(subcommand)]
    Import(ImportCommand),
    /// Three-way merge three streams of documents and print the result
    Merge(MergeArgs),
}

#[derive(Args)]
struct UpdateArgs {
    dir: PathBuf,
    /// Change the package version to this value
    #[arg(long)]
    version: Option<String>,
    /// Replace the package configuration with the document in this file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overwrite files rather than attempting a three-way merge
    #[arg(long)]
    overwrite: bool,
    /// Git revision holding the spec the package was last generated from
    #[arg(long, default_value = DEFAULT_BASE_REV)]
    base: String,
    /// Let resources removed on one side go when the other side left them unchanged
    #[arg(long)]
    content_aware: bool,
}

#[derive(Subcommand)]
enum ImportCommand {
    /// Import a Helm chart as a package
    Helm(ImportHelmArgs),
    /// Import a container image as a package
    Image(ImportImageArgs),
}

#[derive(Args)]
struct ImportHelmArgs {
    dir: PathBuf,
    /// Chart URL; the last path element is the chart name
    #[arg(long)]
    chart: String,
    /// Chart version
    #[arg(long)]
    version: String,
    /// Release name; defaults to the chart name
    #[arg(long)]
    release: Option<String>,
    /// Namespace to render the release into
    #[arg(long)]
    namespace: Option<String>,
    /// YAML file of chart values
    #[arg(long)]
    values: Option<PathBuf>,
}

#[derive(Args)]
struct ImportImageArgs {
    dir: PathBuf,
    /// Image repository, not including the tag
    #[arg(long)]
    image: String,
    /// Image tag
    #[arg(long, default_value = "")]
    tag: String,
    /// YAML file holding the function config handed to the image
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct MergeArgs {
    /// Locally edited documents
    #[arg(long)]
    local: PathBuf,
    /// Documents as originally generated
    #[arg(long)]
    base: PathBuf,
    /// Documents as generated now
    #[arg(long)]
    updated: PathBuf,
    #[arg(long)]
    content_aware: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    output: OutputFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            if let Some(spresm::Error::History(_)) = err.downcast_ref::<spresm::Error>() {
                eprintln!("If there is no spec committed, use --overwrite to overwrite files rather than merging.");
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(command: Command) -> Result<()> {
    let updater = Updater::default();
    match command {
        Command::Eval { dir } => {
            let docs = updater
                .eval(&dir)
                .with_context(|| format!("could not evaluate spec in {}", dir.display()))?;
            print(&to_yaml_stream(&docs)?)
        }
        Command::Config { dir } => {
            let spec = read_spec(&dir)?;
            match spec.config()? {
                Some(config) => print(&to_yaml(&config)?),
                None => bail!("{:?} specs have no configuration", spec.kind),
            }
        }
        Command::Update(args) => update(&updater, args),
        Command::Import(ImportCommand::Helm(args)) => import_helm(&updater, args),
        Command::Import(ImportCommand::Image(args)) => import_image(&updater, args),
        Command::Merge(args) => merge(args),
    }
}

fn update(updater: &Updater, args: UpdateArgs) -> Result<()> {
    let opts = UpdateOptions {
        version: args.version,
        config: args.config.as_deref().map(read_document).transpose()?,
        overwrite: args.overwrite,
        base_rev: args.base,
        merge: merge_options(args.content_aware),
    };
    let report = updater
        .update(&args.dir, &opts)
        .with_context(|| format!("could not update package in {}", args.dir.display()))?;
    summarize(&args.dir, &report);
    Ok(())
}

fn import_helm(updater: &Updater, args: ImportHelmArgs) -> Result<()> {
    let values = match &args.values {
        Some(path) => match read_document(path)? {
            Value::Map(values) => values,
            Value::Null => Default::default(),
            other => bail!("values in {} must be a map, not {}", path.display(), other.type_name()),
        },
        None => Default::default(),
    };
    let mut spec = Spec::new(Kind::HelmChart, args.chart, args.version);
    spec.helm = Some(HelmArgs {
        release: Release {
            name: args.release.unwrap_or_default(),
            namespace: args.namespace.unwrap_or_default(),
        },
        values,
    });
    import(updater, &args.dir, &spec)
}

fn import_image(updater: &Updater, args: ImportImageArgs) -> Result<()> {
    let function_config = match &args.config {
        Some(path) => read_document(path)?,
        None => DEFAULT_FUNCTION_CONFIG.clone(),
    };
    let mut spec = Spec::new(Kind::Image, args.image, args.tag);
    spec.image = Some(ImageArgs { function_config });
    import(updater, &args.dir, &spec)
}

fn import(updater: &Updater, dir: &Path, spec: &Spec) -> Result<()> {
    let report = updater
        .import(dir, spec)
        .with_context(|| format!("could not import package into {}", dir.display()))?;
    summarize(dir, &report);
    Ok(())
}

fn merge(args: MergeArgs) -> Result<()> {
    let local = read_stream(&args.local)?;
    let base = read_stream(&args.base)?;
    let updated = read_stream(&args.updated)?;

    let merged = reconcile_with(&local, &base, &updated, &merge_options(args.content_aware))?;
    report_diagnostics(&merged.diagnostics);

    match args.output {
        OutputFormat::Yaml => print(&to_yaml_stream(&merged.documents)?),
        OutputFormat::Json => print(&(to_json(&Value::List(merged.documents))? + "\n")),
    }
}

fn merge_options(content_aware: bool) -> MergeOptions {
    if content_aware {
        MergeOptions::with_policy(ConflictPolicy::ContentAware)
    } else {
        MergeOptions::default()
    }
}

fn read_document(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).with_context(|| format!("could not read {}", path.display()))?;
    from_yaml(&content).with_context(|| format!("could not parse {}", path.display()))
}

fn read_stream(path: &Path) -> Result<Vec<Value>> {
    let content = fs::read_to_string(path).with_context(|| format!("could not read {}", path.display()))?;
    from_yaml_stream(&content).with_context(|| format!("could not parse {}", path.display()))
}

fn summarize(dir: &Path, report: &UpdateReport) {
    report_diagnostics(&report.diagnostics);
    eprintln!("{} {} documents in {}", capitalize(&report.mode.to_string()), report.documents, dir.display());
    if let Some(path) = &report.spec_written {
        eprintln!("Spec file written to {}", path.display());
    }
}

fn report_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        match diagnostic {
            Diagnostic::Dropped { id } => info!(resource = %id, "removed"),
            Diagnostic::Duplicate { input, id } => {
                eprintln!("Warning: {} has more than one {}; the last one was used", input, id)
            }
            Diagnostic::Unidentified { input, position } => {
                eprintln!("Warning: document {} of {} has no kind or name and was ignored", position, input)
            }
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn print(out: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(out.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
