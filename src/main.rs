use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use forcegraph3d::io::FormatRegistry;
use forcegraph3d::layout::{ForceDirected, LayoutOptions};
use forcegraph3d::payload::GraphPayload;
use forcegraph3d::placement::Placement;
use forcegraph3d::report::LayoutReport;

/// Lay out graph widget payloads in 3D with a force-directed simulation.
#[derive(Parser)]
#[command(name = "forcegraph3d")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the layout to completion and write node positions
    Layout {
        /// Input payload (.json, .yaml, .yml)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file; the report goes to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Stop after this many frames even if the layout has not settled
        #[arg(long)]
        max_frames: Option<usize>,

        #[command(flatten)]
        setup: LayoutArgs,
    },
    /// Print graph statistics and the layout constants that would be used
    Inspect {
        /// Input payload (.json, .yaml, .yml)
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        setup: LayoutArgs,
    },
}

/// Overrides for the payload's layout knobs
#[derive(Args, Debug, Default)]
struct LayoutArgs {
    /// Spring stiffness multiplier
    #[arg(long)]
    attraction: Option<f64>,

    /// Repulsion strength multiplier
    #[arg(long)]
    repulsion: Option<f64>,

    /// Maximum number of iterations
    #[arg(long)]
    iterations: Option<usize>,

    /// Viewport width
    #[arg(long)]
    width: Option<f64>,

    /// Viewport height
    #[arg(long)]
    height: Option<f64>,

    /// Seed for the initial scatter; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Start from an even spread over a sphere instead of a random scatter
    #[arg(long, conflicts_with = "seed")]
    sphere: bool,
}

impl LayoutArgs {
    fn options(&self, payload: &GraphPayload) -> LayoutOptions {
        let mut options = payload.layout_options();
        if let Some(attraction) = self.attraction {
            options.attraction = attraction;
        }
        if let Some(repulsion) = self.repulsion {
            options.repulsion = repulsion;
        }
        if let Some(iterations) = self.iterations {
            options.iterations = iterations;
        }
        if let Some(width) = self.width {
            options.width = width;
        }
        if let Some(height) = self.height {
            options.height = height;
        }
        options
    }

    fn placement(&self) -> Placement {
        if self.sphere {
            return Placement::fibonacci_sphere();
        }
        let seed = self.seed.unwrap_or_else(rand::random);
        tracing::info!(seed, "initial placement");
        Placement::random_cube(seed)
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_payload(registry: &FormatRegistry, input: &Path) -> anyhow::Result<GraphPayload> {
    registry
        .read_payload(input)
        .with_context(|| format!("failed to read payload {}", input.display()))
}

fn layout(
    input: &Path,
    output: Option<&Path>,
    format: &str,
    max_frames: Option<usize>,
    setup: &LayoutArgs,
) -> anyhow::Result<()> {
    let registry = FormatRegistry::with_defaults();
    let writer = registry.require_writer(format)?;
    let payload = read_payload(&registry, input)?;

    let options = setup.options(&payload);
    let mut graph = payload
        .build_graph(&setup.placement())
        .with_context(|| format!("invalid graph in {}", input.display()))?;
    let mut session = ForceDirected::start(&graph, options)?;

    // one extra frame lets the session observe its own termination
    let frames = max_frames.unwrap_or(session.options().iterations.saturating_add(1));
    let performed = session.run(&mut graph, frames)?;
    tracing::info!(performed, finished = session.is_finished(), "layout run complete");

    let report = LayoutReport::new(&graph, &session, payload.main.clone());
    match output {
        Some(path) => {
            writer
                .write(&report, path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!(
                "Laid out {} nodes in {} iterations, wrote {}",
                graph.len(),
                performed,
                path.display()
            );
        }
        None => println!("{}", writer.render(&report)?),
    }
    Ok(())
}

fn inspect(input: &Path, setup: &LayoutArgs) -> anyhow::Result<()> {
    let registry = FormatRegistry::with_defaults();
    let payload = read_payload(&registry, input)?;
    let options = setup.options(&payload);
    options.validate()?;
    let graph = payload
        .build_graph(&Placement::fibonacci_sphere())
        .with_context(|| format!("invalid graph in {}", input.display()))?;

    if let Some(title) = &payload.main {
        println!("title: {title}");
    }
    println!("nodes: {}", graph.len());
    println!("edges: {}", graph.edge_count());
    println!("singletons: {}", graph.singleton_count());
    println!("attraction: {}", options.attraction);
    println!("repulsion: {}", options.repulsion);
    println!("iterations: {}", options.iterations);
    println!("viewport: {}x{}", options.width, options.height);
    if !graph.is_empty() {
        println!(
            "force constant: {:.3}",
            options.force_constant(graph.len())
        );
    }
    println!("initial temperature: {}", options.initial_temperature());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Layout {
            input,
            output,
            format,
            max_frames,
            setup,
        } => layout(&input, output.as_deref(), &format, max_frames, &setup),
        Commands::Inspect { input, setup } => inspect(&input, &setup),
    }
}
