mod commands;
mod output;

use clap::{Args, Parser, Subcommand};
use linecook_core::config::{self, LineCookConfig, PageFailurePolicy, ScanPolicy};
use linecook_core::error::{ErrorCategory, LineCookError};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "linecook",
    version,
    about = "Find, crop and print 4x6 shipping labels from PDFs and photos"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// JSON configuration file; flags and environment variables override it
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Roboflow API key
    #[arg(long, global = true, env = "ROBOFLOW_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Detection model identifier, e.g. shipping-label-k3hzg/4
    #[arg(long, global = true, env = "MODEL_ID")]
    model_id: Option<String>,

    /// Minimum detection confidence (0.0 - 1.0)
    #[arg(long, global = true, env = "CONFIDENCE_THRESH")]
    confidence: Option<f64>,

    /// Inference request timeout in seconds
    #[arg(long, global = true, env = "API_TIMEOUT", value_name = "SECS")]
    api_timeout: Option<u64>,

    /// Print command: "auto" or a full command line such as "lpr -P Zebra"
    #[arg(long, global = true, env = "PRINT_COMMAND")]
    print_command: Option<String>,

    /// Enable or disable printing (true/false)
    #[arg(long, global = true, env = "PRINT_ENABLED")]
    print_enabled: Option<bool>,

    /// Include print command output in messages (true/false)
    #[arg(long, global = true, env = "PRINT_DEBUG")]
    print_debug: Option<bool>,

    /// Infer every page and keep the best-shaped label instead of stopping at the first hit
    #[arg(long, global = true)]
    best_across_pages: bool,

    /// Keep scanning when inference fails on a single page
    #[arg(long, global = true)]
    skip_failed_pages: bool,

    /// Log filter used when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the shipping label from a PDF or image
    Extract {
        /// Path to PDF, PNG or JPEG file
        input_file: PathBuf,

        /// Write the extracted label as PNG
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,

        /// Send the extracted label to the printer
        #[arg(long)]
        print: bool,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Embed the label as base64 PNG in JSON output
        #[arg(long)]
        embed_image: bool,
    },
    /// Extract labels from every supported file in a directory
    Batch {
        /// Directory with input files
        #[arg(default_value = "test_inputs")]
        input_dir: PathBuf,

        /// Directory for extracted labels
        #[arg(long, default_value = "test_outputs")]
        out_dir: PathBuf,
    },
    /// Check whether a file would be accepted, without running detection
    Validate {
        /// Path to the file to check
        input_file: PathBuf,
    },
    /// Print an existing image file with the configured print command
    Print {
        /// Path to the file to print
        file: PathBuf,
    },
    /// Show the local print setup
    PrintStatus {
        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Print a 4x6 alignment test label
    PrintTest,
}

fn init_tracing(log_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Build the effective configuration: file (or defaults), then flags and env.
fn build_config(args: &GlobalArgs) -> Result<LineCookConfig, LineCookError> {
    let mut config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => LineCookConfig::default(),
    };

    if let Some(key) = &args.api_key {
        config.inference.api_key = Some(key.clone());
    }
    if let Some(model_id) = &args.model_id {
        config.inference.model_id = model_id.clone();
    }
    if let Some(confidence) = args.confidence {
        config.inference.confidence_threshold = confidence;
    }
    if let Some(timeout) = args.api_timeout {
        config.inference.timeout_secs = timeout;
    }
    if let Some(command) = &args.print_command {
        config.printing.command = command.clone();
    }
    if let Some(enabled) = args.print_enabled {
        config.printing.enabled = enabled;
    }
    if let Some(debug) = args.print_debug {
        config.printing.debug = debug;
    }
    if args.best_across_pages {
        config.pipeline.scan_policy = ScanPolicy::BestAcrossAllPages;
    }
    if args.skip_failed_pages {
        config.pipeline.page_failure_policy = PageFailurePolicy::SkipPage;
    }

    config::validate_config(&config)?;
    Ok(config)
}

fn exit_code(err: &LineCookError) -> i32 {
    match err.category() {
        ErrorCategory::BadInput => 2,
        ErrorCategory::UpstreamFailure => 3,
        ErrorCategory::Internal => 1,
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.global.log_level);

    let result = build_config(&cli.global).and_then(|config| match cli.command {
        Commands::Extract {
            input_file,
            out,
            print,
            output,
            embed_image,
        } => commands::extract::run(&input_file, &config, out, print, &output, embed_image),
        Commands::Batch { input_dir, out_dir } => {
            commands::batch::run(&input_dir, &out_dir, &config)
        }
        Commands::Validate { input_file } => commands::validate::run(&input_file, &config),
        Commands::Print { file } => commands::print::print(&file, &config.printing),
        Commands::PrintStatus { output } => commands::print::status(&config.printing, &output),
        Commands::PrintTest => commands::print::test_label(&config.printing),
    });

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(exit_code(&e));
    }
}
