mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    analyze::AnalyzeArgs, config::ConfigSubcommand, interview::InterviewArgs,
    session::SessionSubcommand, tree::TreeSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pine-intake",
    about = "Scope Pine Script projects through a guided interview or transcript analysis",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .pine-intake/ or .git/)
    #[arg(long, global = true, env = "PINE_INTAKE_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .pine-intake/ with a default config
    Init,

    /// Run the question tree interactively on stdin/stdout
    Interview(InterviewArgs),

    /// Drive a persisted interview one answer at a time
    Session {
        #[command(subcommand)]
        subcommand: SessionSubcommand,
    },

    /// Extract a specification from a transcript or description
    Analyze(AnalyzeArgs),

    /// Inspect the question tree
    Tree {
        #[command(subcommand)]
        subcommand: TreeSubcommand,
    },

    /// Show or validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Interview(args) => cmd::interview::run(&root, args, cli.json),
        Commands::Session { subcommand } => cmd::session::run(&root, subcommand, cli.json),
        Commands::Analyze(args) => cmd::analyze::run(&root, args, cli.json),
        Commands::Tree { subcommand } => cmd::tree::run(subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
