use anyhow::{Context, Result};
use clap::Parser;
use lqt::catalog::FieldCatalog;
use lqt::config::RunConfiguration;
use lqt::dispatch::QueryTool;
use lqt::filter::RegexFilter;
use lqt::index::IndexReader;
use lqt::output::OutputFormat;
use lqt::settings::Settings;
use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
const LOG_ENV: &str = "LQT_LOG";

#[derive(Parser)]
#[command(name = "lqt")]
#[command(about = "Query, filter and format documents from a read-only search index")]
#[command(version)]
struct Cli {
    /// Index directory (repeat to search several indexes as one)
    #[arg(short, long = "index", required = true)]
    index: Vec<PathBuf>,

    /// Query string, or one of: %all | %enumerate-fields | %count-fields |
    /// %enumerate-terms FIELD | %script FILE | %ids ID [ID ...] | %id-file FILE
    #[arg(short, long, required = true, num_args = 1..)]
    query: Vec<String>,

    /// Fields to include in output (defaults to all stored fields)
    #[arg(long, num_args = 1..)]
    fields: Vec<String>,

    /// Maximum number of query hits to process
    #[arg(long)]
    query_limit: Option<usize>,

    /// Maximum number of documents to print
    #[arg(long)]
    output_limit: Option<usize>,

    /// Query analyzer: KeywordAnalyzer (default) or StandardAnalyzer
    #[arg(long)]
    analyzer: Option<String>,

    /// Default field for unqualified query terms
    #[arg(long)]
    query_field: Option<String>,

    /// Keep only documents whose field matches, written field:/regex/
    #[arg(long)]
    regex: Option<String>,

    /// Show the document id in results
    #[arg(long)]
    show_id: bool,

    /// Show the score in results
    #[arg(long)]
    show_score: bool,

    /// Show the total hit count
    #[arg(long)]
    show_hits: bool,

    /// Sort fields within each document
    #[arg(long)]
    sort_fields: bool,

    /// Do not print field names
    #[arg(long)]
    suppress_names: bool,

    /// Tab-separated output (requires --fields, no multi-valued fields)
    #[arg(long)]
    tabular: bool,

    /// Output format: multiline, tabular, json or json-pretty
    #[arg(long)]
    format: Option<String>,

    /// Write results to a file instead of standard output
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Defaults file (falls back to $LQT_CONFIG, then the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log debug information to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let reader = IndexReader::open_all(&cli.index).with_context(|| {
        let paths: Vec<String> = cli.index.iter().map(|p| p.display().to_string()).collect();
        format!("Failed to open index {}", paths.join(", "))
    })?;
    let catalog = FieldCatalog::from_reader(&reader);

    let mut config = RunConfiguration::default();
    Settings::load(cli.config.as_deref())?.apply(&mut config, &catalog)?;
    apply_flags(&cli, &mut config, &catalog)?;

    let tool = QueryTool::new(&reader, &catalog, &config);
    match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?;
            let mut out = BufWriter::new(file);
            tool.run(&cli.query, &mut out)?;
            out.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            tool.run(&cli.query, &mut out)?;
            out.flush()?;
        }
    }

    Ok(())
}

/// Command-line flags override values from the defaults file
fn apply_flags(cli: &Cli, config: &mut RunConfiguration, catalog: &FieldCatalog) -> Result<()> {
    if let Some(limit) = cli.query_limit {
        config.set_query_limit(limit)?;
    }
    if let Some(limit) = cli.output_limit {
        config.set_output_limit(limit)?;
    }
    if let Some(analyzer) = &cli.analyzer {
        config.set_analyzer(analyzer)?;
    }
    if let Some(field) = &cli.query_field {
        config.set_default_field(catalog, field)?;
    }
    if let Some(format) = &cli.format {
        config.set_format(format.parse::<OutputFormat>()?);
    }
    if cli.tabular {
        config.set_tabular(true);
    }
    if cli.show_id {
        config.set_show_id(true);
    }
    if cli.show_score {
        config.set_show_score(true);
    }
    if cli.show_hits {
        config.set_show_hits(true);
    }
    if cli.sort_fields {
        config.set_sort_fields(true);
    }
    if cli.suppress_names {
        config.set_suppress_names(true);
    }
    if !cli.fields.is_empty() {
        config.set_field_names(catalog, cli.fields.clone())?;
    }
    if let Some(regex) = &cli.regex {
        config.set_regex(catalog, RegexFilter::parse(regex)?)?;
    }
    Ok(())
}

fn print_error(error: &anyhow::Error) {
    let choice = if io::stderr().is_terminal() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stderr = StandardStream::stderr(choice);

    let _ = stderr.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true));
    let _ = write!(stderr, "error");
    let _ = stderr.reset();
    let mut last = error.to_string();
    let _ = writeln!(stderr, ": {}", last);
    for cause in error.chain().skip(1) {
        let message = cause.to_string();
        // I/O errors already carry their source in the message
        if !last.ends_with(&message) {
            let _ = writeln!(stderr, "  caused by: {}", message);
        }
        last = message;
    }
}
