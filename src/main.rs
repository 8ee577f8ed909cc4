use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{Context, IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use basket_core::{BasketConfig, OutputFormat, RawTable};
use basket_mining::report::{render_markdown, render_text, ReportOptions};
use basket_mining::samples::{sample_dataset, SAMPLES};
use basket_mining::{
    analyze, encode, profile_dataset, suggest_thresholds, Analysis, AnalysisOptions,
    ThresholdTier,
};

#[derive(Parser)]
#[command(
    name = "basket",
    version,
    about = "Market basket analysis from the command line",
    long_about = "Basket finds frequent itemsets, association rules, and item co-occurrence\n\
                   in transaction data.\n\n\
                   Input is a CSV in one of three layouts: one basket per row as a\n\
                   comma-separated list, an (id, item) pair per row, or a one-hot table.\n\n\
                   Examples:\n  \
                     basket analyze orders.csv               Mine rules with default thresholds\n  \
                     cat orders.csv | basket analyze         Read the dataset from stdin\n  \
                     basket analyze orders.csv --support-tier low\n  \
                     basket profile orders.csv               Suggest thresholds for a dataset\n  \
                     basket sample groceries                 Analyze a built-in sample\n  \
                     basket mcp --path ./data                Serve the tools over MCP"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .basket.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text      Human-readable tables and summaries (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Subcommand)]
enum Command {
    /// Mine frequent itemsets and association rules
    #[command(long_about = "Mine frequent itemsets and association rules.\n\n\
        Encodes the dataset, runs Apriori at the requested support, derives rules\n\
        above the requested confidence, and counts pairwise co-occurrence.\n\
        Reads from a file or stdin.\n\n\
        Examples:\n  basket analyze orders.csv --min-support 0.05 --min-confidence 0.4\n  \
        basket analyze orders.csv --support-tier conservative --format json\n  \
        basket analyze orders.csv --support-fallback --confidence-fallback 0.1")]
    Analyze {
        /// CSV file to analyze (default: stdin)
        file: Option<PathBuf>,

        /// Minimum itemset support in (0, 1]
        #[arg(long, conflicts_with = "support_tier")]
        min_support: Option<f64>,

        /// Use a suggested support tier instead of a fixed value
        #[arg(
            long,
            long_help = "Use one of the suggested support tiers computed from the dataset.\n\n\
                Tiers: very_low, low, conservative, moderate, strict.\n\
                Run `basket profile` to see their values."
        )]
        support_tier: Option<ThresholdTier>,

        /// Minimum rule confidence in (0, 1]
        #[arg(long)]
        min_confidence: Option<f64>,

        /// Re-mine at the very_low tier when nothing is frequent
        #[arg(long)]
        support_fallback: bool,

        /// Confidence to retry with when no rule passes
        #[arg(long)]
        confidence_fallback: Option<f64>,

        /// Largest itemset size to mine
        #[arg(long)]
        max_len: Option<usize>,

        /// Maximum rows per section (default: from config, 20)
        #[arg(long)]
        limit: Option<usize>,

        /// Sections to print (default: all)
        #[arg(long, value_delimiter = ',')]
        sections: Vec<Section>,
    },
    /// Describe a dataset and suggest thresholds
    #[command(long_about = "Describe a dataset and suggest thresholds.\n\n\
        Reports the detected layout, transaction and item counts, sparsity, the most\n\
        and least frequent items, and five suggested support tiers.\n\n\
        Examples:\n  basket profile orders.csv\n  cat orders.csv | basket profile --format json")]
    Profile {
        /// CSV file to profile (default: stdin)
        file: Option<PathBuf>,
    },
    /// Analyze a built-in sample dataset
    #[command(long_about = "Analyze a built-in sample dataset.\n\n\
        Without an id, lists the available samples.\n\n\
        Examples:\n  basket sample\n  basket sample electronics --format markdown")]
    Sample {
        /// Sample id (groceries, electronics, office)
        id: Option<String>,

        /// Maximum rows per section (default: from config, 20)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Start the MCP server
    #[command(
        long_about = "Start the MCP (Model Context Protocol) server.\n\n\
        Exposes basket tools over stdio transport for AI agents. Dataset paths\n\
        passed to the tools must resolve inside --path.\n\n\
        Example:\n  basket mcp --path ./data"
    )]
    Mcp {
        /// Directory datasets are read from (default: current directory)
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },
    /// Create a default .basket.toml configuration file
    #[command(long_about = "Create a default .basket.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .basket.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Section {
    /// Frequent itemsets
    Itemsets,
    /// Association rules
    Rules,
    /// Top co-occurring pairs
    Cooccurrence,
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");
    let commands = [
        ("analyze", "Frequent itemsets, association rules, co-occurrence"),
        ("profile", "Dataset summary and suggested thresholds"),
        ("sample", "Analyze a built-in sample dataset"),
        ("mcp", "Start MCP server for AI agents"),
        ("init", "Create default configuration"),
    ];

    if use_color {
        println!("\x1b[1mbasket\x1b[0m v{version}: market basket analysis\n");
        println!("Quick start:");
        println!("  \x1b[36mbasket sample groceries\x1b[0m       Try it on a built-in dataset");
        println!("  \x1b[36mbasket profile orders.csv\x1b[0m     Pick thresholds for your data\n");
        println!("All commands:");
        for (name, about) in commands {
            println!("  \x1b[32m{name:<9}\x1b[0m {about}");
        }
    } else {
        println!("basket v{version}: market basket analysis\n");
        println!("Quick start:");
        println!("  basket sample groceries       Try it on a built-in dataset");
        println!("  basket profile orders.csv     Pick thresholds for your data\n");
        println!("All commands:");
        for (name, about) in commands {
            println!("  {name:<9} {about}");
        }
    }
    println!();
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("BASKET_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<BasketConfig> {
    let config = match path {
        Some(path) => BasketConfig::from_file(path)
            .wrap_err(format!("loading config {}", path.display()))?,
        None => {
            let default_path = Path::new(".basket.toml");
            if default_path.exists() {
                BasketConfig::from_file(default_path).wrap_err("loading .basket.toml")?
            } else {
                BasketConfig::default()
            }
        }
    };
    Ok(config)
}

/// Read a table from `file`, or stdin when absent. Returns the table and a
/// source name for report headers.
fn read_input(file: Option<&Path>, config: &BasketConfig) -> Result<(RawTable, String)> {
    match file {
        Some(path) => {
            if !path.exists() {
                miette::bail!(miette::miette!(
                    help = "check the path, or pipe the CSV on stdin",
                    "file not found: {}",
                    path.display()
                ));
            }
            let table = basket_ingest::reader::read_table_from_path(path, &config.ingest)
                .wrap_err(format!("reading {}", path.display()))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            Ok((table, name))
        }
        None => {
            if std::io::stdin().is_terminal() {
                miette::bail!(miette::miette!(
                    help = "pass a CSV file, e.g.: basket analyze orders.csv\n       or pipe one: cat orders.csv | basket analyze",
                    "no input"
                ));
            }
            let mut bytes = Vec::new();
            std::io::stdin()
                .read_to_end(&mut bytes)
                .into_diagnostic()
                .wrap_err("reading stdin")?;
            let table = basket_ingest::reader::read_table(&bytes, &config.ingest)?;
            Ok((table, "stdin".to_string()))
        }
    }
}

fn report_options(limit: usize, sections: &[Section]) -> ReportOptions {
    let wants = |section| sections.is_empty() || sections.contains(&section);
    ReportOptions {
        limit,
        itemsets: wants(Section::Itemsets),
        rules: wants(Section::Rules),
        cooccurrence: wants(Section::Cooccurrence),
    }
}

fn print_analysis(analysis: &Analysis, format: OutputFormat, options: &ReportOptions) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(analysis).into_diagnostic()?
            );
        }
        OutputFormat::Markdown => print!("{}", render_markdown(analysis, options)),
        OutputFormat::Text => print!("{}", render_text(analysis, options)),
    }
    Ok(())
}

fn print_samples(format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(SAMPLES).into_diagnostic()?
            );
        }
        OutputFormat::Markdown => {
            println!("| Id | Name | Description |");
            println!("|----|------|-------------|");
            for sample in SAMPLES {
                println!(
                    "| {} | {} | {} |",
                    sample.id, sample.name, sample.description
                );
            }
        }
        OutputFormat::Text => {
            println!("Sample datasets:");
            for sample in SAMPLES {
                println!("  {:<12} {} ({})", sample.id, sample.name, sample.description);
            }
            println!("\nRun `basket sample <id>` to analyze one.");
        }
    }
    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# Basket Configuration

[analysis]
# min_support = 0.1
# min_confidence = 0.3
# Re-mine at the very_low suggested tier when nothing is frequent
# support_fallback = false
# Confidence to retry with when no rule passes min_confidence
# confidence_fallback = 0.1
# max_len = 4
# parallel = true

[ingest]
# delimiters = [",", ";", "\t"]

[output]
# limit = 20
# Analyses `basket mcp` keeps before evicting the oldest
# max_stored_analyses = 32
"#;

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };

    tracing::debug!(format = %cli.format, "configuration loaded");

    match cli.command {
        None => {
            print_welcome(use_color);
            return Ok(());
        }
        Some(Command::Analyze {
            ref file,
            min_support,
            support_tier,
            min_confidence,
            support_fallback,
            confidence_fallback,
            max_len,
            limit,
            ref sections,
        }) => {
            let (table, source) = read_input(file.as_deref(), &config)?;
            let dataset = encode(&table)?;

            let mut analysis_config = config.analysis.clone();
            if let Some(tier) = support_tier {
                let suggested = suggest_thresholds(&dataset.matrix).get(tier);
                tracing::debug!(%tier, suggested, "using suggested support");
                analysis_config.min_support = suggested;
            }
            if let Some(value) = min_support {
                analysis_config.min_support = value;
            }
            if let Some(value) = min_confidence {
                analysis_config.min_confidence = value;
            }
            if support_fallback {
                analysis_config.support_fallback = true;
            }
            if confidence_fallback.is_some() {
                analysis_config.confidence_fallback = confidence_fallback;
            }
            if max_len.is_some() {
                analysis_config.max_len = max_len;
            }
            analysis_config.validate()?;

            let options = AnalysisOptions::from(&analysis_config);
            let analysis = match analyze(&source, &dataset, &options) {
                Ok(analysis) => analysis,
                Err(basket_core::BasketError::NoFrequentItemsets { min_support }) => {
                    let low = suggest_thresholds(&dataset.matrix).low;
                    miette::bail!(miette::miette!(
                        help = format!(
                            "try --min-support {low:.3}, --support-tier low, or --support-fallback"
                        ),
                        "no frequent itemsets at min_support={min_support}"
                    ));
                }
                Err(e) => return Err(e.into()),
            };

            let options = report_options(limit.unwrap_or(config.output.limit), sections);
            print_analysis(&analysis, cli.format, &options)?;
        }
        Some(Command::Profile { ref file }) => {
            let (table, _) = read_input(file.as_deref(), &config)?;
            let dataset = encode(&table)?;
            let profile = profile_dataset(&dataset);

            match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&profile).into_diagnostic()?
                    );
                }
                OutputFormat::Markdown => print!("{}", profile.to_markdown()),
                OutputFormat::Text => print!("{profile}"),
            }
        }
        Some(Command::Sample { ref id, limit }) => {
            let Some(id) = id else {
                return print_samples(cli.format);
            };
            let Some(sample) = sample_dataset(id) else {
                let available: Vec<&str> = SAMPLES.iter().map(|s| s.id).collect();
                miette::bail!(miette::miette!(
                    help = format!("available samples: {}", available.join(", ")),
                    "unknown sample dataset '{id}'"
                ));
            };
            let analysis = sample.analyze()?;
            let options = report_options(limit.unwrap_or(config.output.limit), &[]);
            print_analysis(&analysis, cli.format, &options)?;
        }
        Some(Command::Mcp { ref path }) => {
            let root = path
                .canonicalize()
                .into_diagnostic()
                .wrap_err(format!("resolving {}", path.display()))?;
            basket_mcp::server::run_server(root, config).await?;
        }
        Some(Command::Init) => {
            let path = Path::new(".basket.toml");
            if path.exists() {
                miette::bail!(".basket.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .basket.toml");
        }
        Some(Command::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "basket", &mut std::io::stdout());
        }
    }

    Ok(())
}
