//! U-Pallet command-line runner

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use u_pallet_cli::{decode_requests, solver_placements, ImportReport, PackReport, SolverResult};
use u_pallet_core::{BatchSummary, Config, OrientationMode, DEFAULT_SUPPORT_THRESHOLD};
use u_pallet_pack::{PalletBounds, PalletPacker};

#[derive(Parser)]
#[command(name = "pallet")]
#[command(about = "Online 3D pallet packing")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack a JSON list of requests onto an empty pallet
    Pack {
        /// Path to a JSON array of {width, depth, height}
        input: PathBuf,

        #[command(flatten)]
        pallet: PalletArgs,

        /// Feed requests one at a time through the queue instead of as a batch
        #[arg(long)]
        step: bool,

        /// Remove the item at this index after packing and replay the rest
        #[arg(long)]
        remove: Option<usize>,

        /// Output file for the report (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Predict a batch without committing it
    Simulate {
        /// Path to a JSON array of {width, depth, height}
        input: PathBuf,

        #[command(flatten)]
        pallet: PalletArgs,

        /// Output file for the trace (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load a grid-cell solver result and audit it
    ImportSolver {
        /// Solver result file with a `placed` array
        #[arg(short, long)]
        result: PathBuf,

        /// Request list the solver was given
        #[arg(short, long)]
        input: PathBuf,

        /// Length of one solver grid cell
        #[arg(short, long, default_value = "5.0")]
        grid: f64,

        #[command(flatten)]
        pallet: PalletArgs,

        /// Output file for the report (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct PalletArgs {
    /// Pallet width (x)
    #[arg(long, default_value = "80")]
    width: f64,

    /// Pallet depth (z)
    #[arg(long, default_value = "120")]
    depth: f64,

    /// Maximum stack elevation
    #[arg(long, default_value = "180")]
    height: f64,

    /// Pallet deck thickness
    #[arg(long, default_value = "5")]
    deck: f64,

    /// Minimum supported footprint fraction
    #[arg(long, default_value_t = DEFAULT_SUPPORT_THRESHOLD)]
    threshold: f64,

    /// Allowed item orientations
    #[arg(long, value_enum, default_value = "upright")]
    orientation: OrientationArg,

    /// Only try corner positions, no grid scan
    #[arg(long)]
    no_grid_scan: bool,
}

impl PalletArgs {
    fn packer(&self) -> anyhow::Result<PalletPacker> {
        let bounds = PalletBounds::new(self.width, self.depth, self.height)
            .with_deck_height(self.deck);
        let config = Config::new()
            .with_support_threshold(self.threshold)
            .with_orientation(self.orientation.into())
            .with_grid_scan(!self.no_grid_scan);
        Ok(PalletPacker::new(bounds, config)?)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OrientationArg {
    /// As requested
    Fixed,
    /// Footprint may turn 90 degrees
    Upright,
    /// Any axis may point up
    Any,
}

impl From<OrientationArg> for OrientationMode {
    fn from(arg: OrientationArg) -> Self {
        match arg {
            OrientationArg::Fixed => OrientationMode::Fixed,
            OrientationArg::Upright => OrientationMode::Upright,
            OrientationArg::Any => OrientationMode::Any,
        }
    }
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn emit<T: serde::Serialize>(value: &T, output: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Report saved to: {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Pack {
            input,
            pallet,
            step,
            remove,
            output,
        } => {
            let requests = decode_requests(&read(&input)?)?;
            let mut packer = pallet.packer()?;

            let mut report = if step {
                let mut results = packer.enqueue(&requests);
                while let Some(result) = packer.place_next() {
                    results.push(result);
                }
                results.sort_by_key(|r| r.index);

                let mut summary = BatchSummary::default();
                for r in &results {
                    summary.record(&r.result);
                }
                PackReport::new(&packer, summary, results)
            } else {
                let batch = packer.place_batch(&requests);
                PackReport::from_batch(&packer, batch)
            };

            if let Some(index) = remove {
                let replay = packer.remove(index)?;
                report = PackReport::from_batch(&packer, replay);
            }

            eprintln!(
                "Placed {}/{} items in {} layers ({:.1}% utilization)",
                report.summary.placed,
                report.summary.requested,
                report.layers,
                report.utilization * 100.0
            );
            emit(&report, output.as_deref())?;
        }

        Commands::Simulate {
            input,
            pallet,
            output,
        } => {
            let requests = decode_requests(&read(&input)?)?;
            let packer = pallet.packer()?;
            let trace = packer.simulate(&requests);

            eprintln!(
                "Would place {}/{} items",
                trace.summary.placed, trace.summary.requested
            );
            emit(&trace, output.as_deref())?;
        }

        Commands::ImportSolver {
            result,
            input,
            grid,
            pallet,
            output,
        } => {
            if !grid.is_finite() || grid <= 0.0 {
                anyhow::bail!("grid must be positive, got {}", grid);
            }
            let requests = decode_requests(&read(&input)?)?;
            let solved = SolverResult::from_json(&read(&result)?)?;

            let mut packer = pallet.packer()?;
            let items = solver_placements(&solved, &requests, packer.bounds(), grid);
            packer.adopt_placements(items)?;

            let report = ImportReport::new(&packer);
            eprintln!(
                "Adopted {} items in {} layers, {} unstable",
                report.adopted,
                report.layers,
                report.support.unstable_count
            );
            emit(&report, output.as_deref())?;
        }
    }

    Ok(())
}
