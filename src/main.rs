//! route-hypergraph CLI: synthesis routes to a per-route hypergraph.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::Result;

use route_hypergraph::config::ConvertConfig;
use route_hypergraph::export::{self, BundleFormat};
use route_hypergraph::loader::InputFormat;
use route_hypergraph::pipeline;

#[derive(Parser)]
#[command(
    name = "route-hypergraph",
    version,
    about = "Convert synthesis route trees into a per-route hypergraph"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a route document into a bundle plus nodes/edges/incidence CSV files.
    Convert {
        /// Route document (JSON object, JSON list, or JSON Lines).
        input: Option<PathBuf>,

        /// TOML config file; command-line flags override its values.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Input format: auto, json or jsonl.
        #[arg(long)]
        format: Option<InputFormat>,

        /// Bundle encoding: bincode or json.
        #[arg(long)]
        bundle_format: Option<BundleFormat>,

        /// Directory for artifacts without an explicit path.
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Bundle output path.
        #[arg(long)]
        bundle: Option<PathBuf>,

        /// Nodes CSV output path.
        #[arg(long)]
        nodes_csv: Option<PathBuf>,

        /// Edges CSV output path.
        #[arg(long)]
        edges_csv: Option<PathBuf>,

        /// Incidence CSV output path.
        #[arg(long)]
        incidence_csv: Option<PathBuf>,

        /// Reduce routes on a single thread.
        #[arg(long)]
        sequential: bool,

        /// Write the effective configuration to this TOML file.
        #[arg(long)]
        save_config: Option<PathBuf>,
    },

    /// Decode a bundle, validate it and print its routes.
    Inspect {
        /// Bundle file written by `convert`.
        bundle: PathBuf,

        /// Bundle encoding; guessed from the extension when omitted.
        #[arg(long)]
        bundle_format: Option<BundleFormat>,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            input,
            config,
            format,
            bundle_format,
            out_dir,
            bundle,
            nodes_csv,
            edges_csv,
            incidence_csv,
            sequential,
            save_config,
        } => {
            let mut cfg = match (config, input) {
                (Some(path), input) => {
                    let mut cfg = ConvertConfig::load(&path)?;
                    if let Some(input) = input {
                        cfg.input = input;
                    }
                    cfg
                }
                (None, Some(input)) => ConvertConfig::new(input),
                (None, None) => miette::bail!("no input given: pass a route file or --config"),
            };

            if let Some(format) = format {
                cfg.input_format = format;
            }
            if let Some(bundle_format) = bundle_format {
                cfg.bundle_format = bundle_format;
            }
            cfg.out_dir = out_dir.or(cfg.out_dir);
            cfg.bundle = bundle.or(cfg.bundle);
            cfg.nodes_csv = nodes_csv.or(cfg.nodes_csv);
            cfg.edges_csv = edges_csv.or(cfg.edges_csv);
            cfg.incidence_csv = incidence_csv.or(cfg.incidence_csv);
            if sequential {
                cfg.parallel = false;
            }

            if let Some(path) = save_config {
                cfg.save(&path)?;
            }

            let summary = pipeline::run(&cfg)?;
            println!("Done.");
            println!("{summary}");
        }

        Commands::Inspect {
            bundle,
            bundle_format,
        } => {
            let hg = export::read_bundle(&bundle, bundle_format)?;
            println!(
                "nodes: {} edges(routes): {} incidence pairs: {}",
                hg.node_count(),
                hg.edge_count(),
                hg.incidence.len()
            );
            println!("Routes:");
            let sizes = hg.edge_sizes();
            for (meta, size) in hg.routes.iter().zip(sizes) {
                println!(
                    "  {} \"{}\" target=\"{}\" reactions={} molecules={}",
                    meta.edge_id, meta.edge_name, meta.target, meta.reaction_count, size
                );
            }
        }
    }

    Ok(())
}
