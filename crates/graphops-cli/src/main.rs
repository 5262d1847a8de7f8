#![forbid(unsafe_code)]
//! `graphops` — dependency graph analysis toolkit.

mod cmd;
mod output;
mod paths;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use output::OutputMode;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "graphops: analyze assembly dependency graphs",
    long_about = None
)]
struct Cli {
    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "List the tags used in a graph",
        after_help = "EXAMPLES:\n    graphops tags -i deps.graph.json"
    )]
    Tags(cmd::tags::TagsArgs),

    #[command(
        about = "Compute strongly connected components",
        long_about = "Compute strongly connected components in forward topological \
                      order and write the component quotient graph.",
        after_help = "EXAMPLES:\n    graphops scc -i deps.graph.json\n    graphops scc -i deps.graph.json --name-by-node"
    )]
    Scc(cmd::scc::SccArgs),

    #[command(
        about = "Report dependency cycles",
        after_help = "EXAMPLES:\n    graphops cycles -i deps.graph.json --json"
    )]
    Cycles(cmd::cycles::CyclesArgs),

    #[command(
        about = "Drop redundant edges (transitive reduction)",
        after_help = "EXAMPLES:\n    graphops purify -i deps.graph.json\n    graphops purify -i deps.graph.json --scc\n    graphops purify -i deps.graph.json --mark-cycles"
    )]
    Purify(cmd::purify::PurifyArgs),

    #[command(
        about = "Keep or drop nodes by tag",
        after_help = "EXAMPLES:\n    graphops filter -i deps.graph.json frontend\n    graphops filter -i deps.graph.json vendored --exclude"
    )]
    Filter(cmd::filter::FilterArgs),

    #[command(
        about = "Remove specific edges or a node",
        after_help = "EXAMPLES:\n    graphops prune -i deps.graph.json --source App --target Legacy\n    graphops prune -i deps.graph.json --node Legacy"
    )]
    Prune(cmd::prune::PruneArgs),

    #[command(
        about = "Emit GraphViz DOT",
        after_help = "EXAMPLES:\n    graphops dot -i deps.graph.json --horizontal\n    graphops dot -i deps.graph.json --cluster-by layer"
    )]
    Dot(cmd::dot::DotArgs),

    #[command(
        about = "Fold the graph along a property classification",
        after_help = "EXAMPLES:\n    graphops supergraph -i deps.graph.json --by module --add-nodes"
    )]
    Supergraph(cmd::supergraph::SupergraphArgs),

    #[command(
        about = "Export a node listing as CSV",
        after_help = "EXAMPLES:\n    graphops csv -i deps.graph.json"
    )]
    Csv(cmd::csv::CsvArgs),

    #[command(
        about = "Print graph statistics",
        after_help = "EXAMPLES:\n    graphops stats -i deps.graph.json --json"
    )]
    Stats(cmd::stats::StatsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("GRAPHOPS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let mode = cli.output_mode();
    tracing::debug!(?cli, "dispatching");

    let result = match &cli.command {
        Commands::Tags(args) => cmd::tags::run(args, mode),
        Commands::Scc(args) => cmd::scc::run(args, mode),
        Commands::Cycles(args) => cmd::cycles::run(args, mode),
        Commands::Purify(args) => cmd::purify::run(args, mode),
        Commands::Filter(args) => cmd::filter::run(args, mode),
        Commands::Prune(args) => cmd::prune::run(args, mode),
        Commands::Dot(args) => cmd::dot::run(args, mode),
        Commands::Supergraph(args) => cmd::supergraph::run(args, mode),
        Commands::Csv(args) => cmd::csv::run(args, mode),
        Commands::Stats(args) => cmd::stats::run(args, mode),
    };

    if let Err(error) = result {
        output::render_failure(mode, &error);
        std::process::exit(1);
    }
}
