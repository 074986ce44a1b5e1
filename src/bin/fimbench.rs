use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use env_logger::Env;
use fimbench::config::{GenerationConfig, SplitConfig, TokenizeConfig};
use fimbench::dataset::{load_examples, load_tokenized, save_examples, save_tokenized};
use fimbench::harness::{save_results, InferenceRunner};
use fimbench::tokenize::tokenize_dataset;
use fimbench::{DatasetBuilder, HfTokenizer, HttpModel};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

const DEFAULT_DATASET: &str = "code_completion_dataset.json";
const DEFAULT_TOKENIZED: &str = "tokenized_dataset.json";
const DEFAULT_RESULTS: &str = "inference_results.json";

#[derive(Parser, Debug)]
#[command(author, version, about = "Fill-in-the-middle dataset and evaluation toolkit", long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (-q, -qq)
    #[arg(short = 'q', long, global = true, action = ArgAction::Count)]
    quiet: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Carve completion examples out of a directory of source files
    Build(BuildArgs),
    /// Tokenize a completion dataset field by field
    Tokenize(TokenizeArgs),
    /// Run greedy inference and score generations against true middles
    Infer(InferArgs),
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Root directory containing .py/.java/.c source files
    root: PathBuf,

    /// Output path for the dataset JSON
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_DATASET)]
    output: PathBuf,

    /// Split attempts per source file
    #[arg(long, value_name = "COUNT")]
    examples_per_file: Option<usize>,

    /// Minimum accepted prefix length in characters
    #[arg(long, value_name = "LEN")]
    min_prefix: Option<usize>,

    /// Minimum accepted suffix length in characters
    #[arg(long, value_name = "LEN")]
    min_suffix: Option<usize>,

    /// Upper bound on additional lines pulled into the middle
    #[arg(long, value_name = "COUNT")]
    max_middle_lines: Option<usize>,

    /// RNG seed for reproducible sampling
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct TokenizeArgs {
    /// Tokenizer JSON to load
    #[arg(short = 'm', long, value_name = "PATH")]
    tokenizer: PathBuf,

    /// Completion dataset JSON to tokenize
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_DATASET)]
    input: PathBuf,

    /// Output path for the tokenized JSON
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_TOKENIZED)]
    output: PathBuf,

    /// Maximum token ids kept per field
    #[arg(long, value_name = "COUNT")]
    max_tokens: Option<usize>,
}

#[derive(Args, Debug)]
struct InferArgs {
    /// Tokenizer JSON to load (used for decoding and embeddings)
    #[arg(short = 'm', long, value_name = "PATH")]
    tokenizer: PathBuf,

    /// Tokenized dataset JSON to evaluate
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_TOKENIZED)]
    input: PathBuf,

    /// Output path for the results JSON
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_RESULTS)]
    output: PathBuf,

    /// Base URL of the inference sidecar
    #[arg(long, value_name = "URL", default_value = "http://127.0.0.1:8800")]
    endpoint: String,

    /// Maximum total sequence length (prompt + continuation)
    #[arg(long, value_name = "COUNT")]
    max_length: Option<usize>,

    /// Disable the progress spinner
    #[arg(long)]
    no_progress: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Build(args) => run_build(args),
        Commands::Tokenize(args) => run_tokenize(args),
        Commands::Infer(args) => run_infer(args),
    }
}

fn init_logging(verbose: u8, quiet: u8) {
    use log::LevelFilter;

    let level = if quiet > 0 {
        match quiet {
            0 => LevelFilter::Info,
            1 => LevelFilter::Warn,
            _ => LevelFilter::Error,
        }
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_millis();
    builder.filter_level(level);
    let _ = builder.try_init();
}

fn run_build(args: BuildArgs) -> Result<()> {
    let defaults = SplitConfig::default();
    let cfg = SplitConfig::builder()
        .min_prefix_length(args.min_prefix.unwrap_or(defaults.min_prefix_length))
        .min_suffix_length(args.min_suffix.unwrap_or(defaults.min_suffix_length))
        .max_middle_lines(args.max_middle_lines.unwrap_or(defaults.max_middle_lines))
        .examples_per_file(args.examples_per_file.unwrap_or(defaults.examples_per_file))
        .seed(args.seed)
        .build()?;

    let builder = DatasetBuilder::new(cfg)?;
    let examples = builder
        .build(&args.root)
        .with_context(|| format!("failed to build dataset from {}", args.root.display()))?;
    save_examples(&examples, &args.output)
        .with_context(|| format!("failed to save dataset to {}", args.output.display()))?;

    println!(
        "generated {} completion examples and saved to {}",
        examples.len(),
        args.output.display()
    );
    Ok(())
}

fn run_tokenize(args: TokenizeArgs) -> Result<()> {
    let cfg = TokenizeConfig {
        max_tokens: args.max_tokens.unwrap_or(TokenizeConfig::default().max_tokens),
    };
    let codec = HfTokenizer::from_file(&args.tokenizer)
        .with_context(|| format!("failed to load tokenizer {}", args.tokenizer.display()))?;
    let examples = load_examples(&args.input)
        .with_context(|| format!("failed to load dataset {}", args.input.display()))?;
    info!("tokenizing {} examples", examples.len());

    let tokenized = tokenize_dataset(&codec, &examples, &cfg)?;
    save_tokenized(&tokenized, &args.output)
        .with_context(|| format!("failed to save tokenized dataset to {}", args.output.display()))?;

    println!("tokenized dataset saved to {}", args.output.display());
    Ok(())
}

fn run_infer(args: InferArgs) -> Result<()> {
    let generation = GenerationConfig {
        max_length: args
            .max_length
            .unwrap_or(GenerationConfig::default().max_length),
    };
    let codec = HfTokenizer::from_file(&args.tokenizer)
        .with_context(|| format!("failed to load tokenizer {}", args.tokenizer.display()))?;
    let examples = load_tokenized(&args.input)
        .with_context(|| format!("failed to load tokenized dataset {}", args.input.display()))?;
    let model = HttpModel::new(&args.endpoint);
    let runner = InferenceRunner::new(&codec, &model, generation)?;

    let spinner = if args.no_progress {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner} running inference... {elapsed}")
            .unwrap()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(80));
        Some(pb)
    };

    let results = runner.run(&examples)?;
    if let Some(pb) = spinner {
        pb.finish_with_message("inference complete");
    }

    for (idx, result) in results.iter().enumerate() {
        println!(
            "[{}/{}] {} | exact={} chrf={:.2} levenshtein={} cosine={:.3} ngram={:.2}",
            idx + 1,
            results.len(),
            result.language,
            result.metrics.exact_match,
            result.metrics.chrf,
            result.metrics.levenshtein_distance,
            result.metrics.cosine_similarity,
            result.metrics.codebleu,
        );
        println!("  expected:  {}", preview(&result.true_middle));
        println!("  generated: {}", preview(&result.generated));
    }

    save_results(&results, &args.output)
        .with_context(|| format!("failed to save results to {}", args.output.display()))?;
    println!("wrote {} results to {}", results.len(), args.output.display());
    Ok(())
}

/// Flattens and truncates a snippet for one-line console display.
fn preview(text: &str) -> String {
    const MAX_CHARS: usize = 60;
    let flat: String = text
        .chars()
        .map(|ch| if ch == '\n' { '⏎' } else { ch })
        .collect();
    if flat.chars().count() <= MAX_CHARS {
        flat
    } else {
        let cut: String = flat.chars().take(MAX_CHARS).collect();
        format!("{cut}…")
    }
}
