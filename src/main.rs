use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use is_terminal::IsTerminal;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use logview::colors::ColorChoice;
use logview::input_format::InputFormat;
use logview::output_format::OutputFormat;
use logview::{ErrorStrategy, PipelineConfig, ProcessingStats, Query, QueryError, StreamPipeline};

#[derive(Parser)]
#[command(name = "logview")]
#[command(about = "Filter, annotate and color log records with declarative queries")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Debug mode - log processing details to stderr
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run a query over a log
    Process(ProcessArgs),
    /// Validate a query and print its normalized JSON
    Check(QueryArgs),
}

#[derive(Args)]
struct QueryArgs {
    /// Query file (JSON, or YAML with a .yaml/.yml extension)
    #[arg(short = 'q', long = "query", value_name = "FILE")]
    query_file: Option<PathBuf>,

    /// Query given inline as JSON
    #[arg(long = "query-json", value_name = "JSON")]
    query_json: Option<String>,
}

impl QueryArgs {
    fn validate(&self) -> Result<(), String> {
        match (&self.query_file, &self.query_json) {
            (Some(_), Some(_)) => Err("Cannot use both --query and --query-json".to_string()),
            (None, None) => Err("Must provide either --query or --query-json".to_string()),
            _ => Ok(()),
        }
    }

    fn load(&self) -> Result<Query> {
        if let Some(json) = &self.query_json {
            return Ok(Query::from_json_str(json)?);
        }
        let Some(path) = &self.query_file else {
            bail!("no query given");
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read query file '{}'", path.display()))?;
        let query = if is_yaml(path) {
            Query::from_yaml_str(&text)?
        } else {
            Query::from_json_str(&text)?
        };
        Ok(query)
    }
}

#[derive(Args)]
struct ProcessArgs {
    #[command(flatten)]
    query: QueryArgs,

    /// Log file (default: stdin)
    #[arg(value_name = "LOG")]
    input_file: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short = 'o', long = "output")]
    output_file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = InputFormat::Line)]
    input_format: InputFormat,

    #[arg(long, value_enum, default_value_t = OutputFormat::Jsonl)]
    output_format: OutputFormat,

    /// When to color `line` output
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
    color: ColorChoice,

    /// Fail on first unreadable line instead of skipping it
    #[arg(long)]
    fail_fast: bool,

    /// Log progress every N records
    #[arg(long, value_name = "N")]
    progress: Option<usize>,

    /// Maximum line length
    #[arg(long, default_value = "1048576")] // 1MB
    max_line_length: usize,

    /// Buffer size for I/O
    #[arg(long, default_value = "65536")] // 64KB
    buffer_size: usize,
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn is_stdio(path: &Option<PathBuf>) -> bool {
    path.as_deref().map_or(true, |p| p == Path::new("-"))
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.debug { "logview=debug" } else { "logview=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("logview: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Check(args) => check(args),
        Command::Process(args) => process(args),
    }
}

fn check(args: QueryArgs) -> Result<i32> {
    if let Err(e) = args.validate() {
        bail!(e);
    }

    let outcome = args.load().and_then(|query| {
        query.compile()?;
        Ok(query)
    });
    let query = match outcome {
        Ok(query) => query,
        Err(e) => match e.downcast_ref::<QueryError>() {
            Some(query_error) => {
                println!("{}", serde_json::to_string(&query_error.report())?);
                return Ok(1);
            }
            None => return Err(e),
        },
    };

    println!("{}", serde_json::to_string_pretty(&query.to_json())?);
    Ok(0)
}

fn process(args: ProcessArgs) -> Result<i32> {
    if let Err(e) = args.query.validate() {
        bail!(e);
    }
    let query = args.query.load()?;

    let writes_to_stdout = is_stdio(&args.output_file);
    let config = PipelineConfig {
        error_strategy: if args.fail_fast {
            ErrorStrategy::FailFast
        } else {
            ErrorStrategy::Skip
        },
        buffer_size: args.buffer_size,
        max_line_length: args.max_line_length,
        progress_interval: args.progress.unwrap_or(0),
        input_format: args.input_format,
        output_format: args.output_format,
        use_colors: args
            .color
            .resolve(writes_to_stdout && io::stdout().is_terminal()),
    };

    let mut pipeline = StreamPipeline::from_query(&query, config)?;
    let buffer_size = pipeline.config().buffer_size;

    // Set up input
    let input_filename = args
        .input_file
        .as_ref()
        .filter(|_| !is_stdio(&args.input_file))
        .map(|p| p.to_string_lossy().to_string());
    let input: Box<dyn BufRead> = match &args.input_file {
        Some(path) if !is_stdio(&args.input_file) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open input file '{}'", path.display()))?;
            Box::new(BufReader::with_capacity(buffer_size, file))
        }
        _ => Box::new(BufReader::with_capacity(buffer_size, io::stdin())),
    };

    // Set up output
    let mut output: Box<dyn Write> = match &args.output_file {
        Some(path) if !writes_to_stdout => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file '{}'", path.display()))?;
            Box::new(io::BufWriter::with_capacity(buffer_size, file))
        }
        _ => Box::new(io::BufWriter::with_capacity(buffer_size, io::stdout())),
    };

    let stats = pipeline
        .process_stream(input, &mut output, input_filename.as_deref())
        .context("Processing failed")?;

    if let Err(e) = output.flush() {
        if e.kind() != io::ErrorKind::BrokenPipe {
            return Err(e).context("Failed to flush output");
        }
    }

    if let Some(rate) = stats.rate() {
        tracing::debug!(rate = rate as u64, "records/second");
    }

    Ok(exit_code(&stats))
}

/// 1 when input was dropped as unreadable, 2 when nothing survived the query
fn exit_code(stats: &ProcessingStats) -> i32 {
    if stats.errors > 0 {
        1
    } else if stats.records_processed > 0 && stats.records_output == 0 {
        2
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_args_need_exactly_one_source() {
        let both = QueryArgs {
            query_file: Some(PathBuf::from("q.json")),
            query_json: Some("{}".to_string()),
        };
        assert!(both.validate().is_err());

        let neither = QueryArgs {
            query_file: None,
            query_json: None,
        };
        assert!(neither.validate().is_err());
    }

    #[test]
    fn test_yaml_detection() {
        assert!(is_yaml(Path::new("rules.yaml")));
        assert!(is_yaml(Path::new("rules.yml")));
        assert!(!is_yaml(Path::new("rules.json")));
    }

    #[test]
    fn test_exit_codes() {
        let mut stats = ProcessingStats {
            records_processed: 3,
            records_output: 3,
            ..ProcessingStats::default()
        };
        assert_eq!(exit_code(&stats), 0);

        stats.records_output = 0;
        assert_eq!(exit_code(&stats), 2);

        stats.errors = 1;
        assert_eq!(exit_code(&stats), 1);

        assert_eq!(exit_code(&ProcessingStats::default()), 0);
    }
}
