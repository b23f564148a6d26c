//! Command-line interface for generating images from samples and catalogs

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use crate::io::catalog::TileCatalog;
use crate::io::configuration::{
    DEFAULT_ATTEMPTS, DEFAULT_OVERLAPPING_SIZE, DEFAULT_PATTERN_SIZE, DEFAULT_SYMMETRY,
    DEFAULT_TILED_SIZE, OUTPUT_SUFFIX,
};
use crate::io::error::{GenerationError, Result};
use crate::io::image::{SampleImage, save_png};
use crate::io::progress::AttemptReporter;
use crate::model::{
    GridModel, OverlappingModel, OverlappingOptions, TiledModel, TiledOptions,
};
use crate::solver::{Heuristic, RunOutcome};

#[derive(Parser)]
#[command(name = "wavegrid")]
#[command(
    author,
    version,
    about = "Generate images by constraint solving over sample patterns or tile catalogs"
)]
/// Top-level command-line arguments
pub struct Cli {
    /// Which model drives the generation
    #[command(subcommand)]
    pub command: Command,
}

/// The two model kinds exposed on the command line
#[derive(Subcommand)]
pub enum Command {
    /// Learn N×N patterns from a sample PNG and generate a similar image
    Overlapping(OverlappingArgs),
    /// Generate from a JSON tile catalog with adjacency rules
    Tiled(TiledArgs),
}

/// Arguments of the overlapping subcommand
#[derive(Args)]
pub struct OverlappingArgs {
    /// Sample PNG to learn patterns from
    #[arg(value_name = "SAMPLE")]
    pub sample: PathBuf,

    /// Pattern size N
    #[arg(short = 'n', long, default_value_t = DEFAULT_PATTERN_SIZE)]
    pub pattern_size: usize,

    /// How many of the eight symmetry transforms to admit
    #[arg(long, default_value_t = DEFAULT_SYMMETRY)]
    pub symmetry: usize,

    /// Do not wrap pattern extraction around the sample edges
    #[arg(long)]
    pub no_periodic_input: bool,

    /// Pin the last extracted pattern along the bottom row
    #[arg(short, long)]
    pub ground: bool,

    /// Shared solving and output arguments
    #[command(flatten)]
    pub run: RunArgs,
}

/// Arguments of the tiled subcommand
#[derive(Args)]
pub struct TiledArgs {
    /// JSON tile catalog
    #[arg(value_name = "CATALOG")]
    pub catalog: PathBuf,

    /// Directory holding the tile art; defaults to the catalog's directory
    #[arg(long)]
    pub art: Option<PathBuf>,

    /// Restrict the build to a named catalog subset
    #[arg(long)]
    pub subset: Option<String>,

    /// Write the grid as comma-separated tile names instead of rendering
    #[arg(short, long)]
    pub text: bool,

    /// Shared solving and output arguments
    #[command(flatten)]
    pub run: RunArgs,
}

/// Solving and output arguments shared by both subcommands
#[derive(Args)]
pub struct RunArgs {
    /// Output width in cells
    #[arg(short, long)]
    pub width: Option<usize>,

    /// Output height in cells
    #[arg(short = 'H', long)]
    pub height: Option<usize>,

    /// Wrap the output at its edges
    #[arg(short, long)]
    pub periodic: bool,

    /// Cell selection heuristic
    #[arg(long, value_enum, default_value_t = HeuristicChoice::Entropy)]
    pub heuristic: HeuristicChoice,

    /// Base random seed; omit for a fresh one per invocation
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Seeded attempts before giving up on contradictions
    #[arg(short, long, default_value_t = DEFAULT_ATTEMPTS)]
    pub attempts: usize,

    /// Cap on observation rounds per attempt; a capped attempt still renders
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Output path; defaults to the input path with a result suffix
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

impl RunArgs {
    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }

    fn base_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }
}

/// Command-line spelling of the observation heuristics
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum HeuristicChoice {
    /// Lowest Shannon entropy first
    Entropy,
    /// Fewest remaining values first
    Mrv,
    /// Fixed raster order
    Scanline,
}

impl From<HeuristicChoice> for Heuristic {
    fn from(choice: HeuristicChoice) -> Self {
        match choice {
            HeuristicChoice::Entropy => Self::Entropy,
            HeuristicChoice::Mrv => Self::MinimumRemainingValues,
            HeuristicChoice::Scanline => Self::Scanline,
        }
    }
}

/// Orchestrates one generation run: build the model, retry seeds, export
pub struct ModelRunner {
    cli: Cli,
}

impl ModelRunner {
    /// Create a runner for the parsed arguments
    pub const fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the requested generation end to end
    ///
    /// # Errors
    ///
    /// Returns an error when inputs cannot be loaded, the model is
    /// malformed, every attempt ends in contradiction, or output cannot be
    /// written.
    pub fn process(self) -> Result<()> {
        match self.cli.command {
            Command::Overlapping(args) => Self::process_overlapping(&args),
            Command::Tiled(args) => Self::process_tiled(&args),
        }
    }

    fn process_overlapping(args: &OverlappingArgs) -> Result<()> {
        let sample = SampleImage::from_png_path(&args.sample)?;
        let mut model = OverlappingModel::from_sample(
            &sample,
            &OverlappingOptions {
                pattern_size: args.pattern_size,
                width: args.run.width.unwrap_or(DEFAULT_OVERLAPPING_SIZE),
                height: args.run.height.unwrap_or(DEFAULT_OVERLAPPING_SIZE),
                periodic_input: !args.no_periodic_input,
                periodic: args.run.periodic,
                symmetry: args.symmetry,
                ground: args.ground,
                heuristic: args.run.heuristic.into(),
            },
        )?;

        run_attempts(&mut model, &args.run, &args.sample)?;

        let rendered = model.render()?;
        let output = output_path(&args.run, &args.sample, "png");
        save_png(&rendered, output)
    }

    fn process_tiled(args: &TiledArgs) -> Result<()> {
        let catalog = TileCatalog::from_path(&args.catalog)?;
        let art_directory = if args.text {
            None
        } else {
            Some(
                args.art
                    .clone()
                    .or_else(|| args.catalog.parent().map(Path::to_path_buf))
                    .unwrap_or_else(|| PathBuf::from(".")),
            )
        };

        let mut model = TiledModel::from_catalog(
            &catalog,
            &TiledOptions {
                width: args.run.width.unwrap_or(DEFAULT_TILED_SIZE),
                height: args.run.height.unwrap_or(DEFAULT_TILED_SIZE),
                periodic: args.run.periodic,
                heuristic: args.run.heuristic.into(),
                subset: args.subset.clone(),
            },
            art_directory.as_deref(),
        )?;

        run_attempts(&mut model, &args.run, &args.catalog)?;

        if args.text {
            let text = model
                .text_output()
                .ok_or_else(|| GenerationError::Configuration {
                    reason: "no solved grid to write as text".to_string(),
                })?;
            let output = output_path(&args.run, &args.catalog, "txt");
            std::fs::write(&output, text).map_err(|e| GenerationError::FileSystem {
                path: output,
                operation: "write text output",
                source: e,
            })
        } else {
            let rendered = model.render()?;
            let output = output_path(&args.run, &args.catalog, "png");
            save_png(&rendered, output)
        }
    }
}

/// Retry seeded attempts until one solves or the budget runs out
///
/// A budget-capped [`RunOutcome::Incomplete`] attempt counts as success so
/// the partially collapsed wave can still be rendered.
fn run_attempts<M: GridModel>(model: &mut M, args: &RunArgs, input: &Path) -> Result<RunOutcome> {
    let reporter = args.should_show_progress().then(|| {
        let label = input
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        AttemptReporter::new(&label, args.attempts)
    });

    let base_seed = args.base_seed();
    for attempt in 0..args.attempts {
        let seed = base_seed.wrapping_add(attempt as u64);
        if let Some(ref reporter) = reporter {
            reporter.attempt_started(attempt, seed);
        }

        match model.run(seed, args.limit) {
            RunOutcome::Contradiction => {
                if let Some(ref reporter) = reporter {
                    reporter.contradiction();
                }
            }
            outcome => {
                if let Some(ref reporter) = reporter {
                    reporter.finish(match outcome {
                        RunOutcome::Solved => "solved",
                        RunOutcome::Incomplete => "budget reached",
                        RunOutcome::Contradiction => "contradiction",
                    });
                }
                return Ok(outcome);
            }
        }
    }

    if let Some(ref reporter) = reporter {
        reporter.finish("all attempts contradicted");
    }
    Err(GenerationError::RetriesExhausted {
        attempts: args.attempts,
    })
}

fn output_path(args: &RunArgs, input: &Path, extension: &str) -> PathBuf {
    if let Some(output) = &args.output {
        return output.clone();
    }

    let stem = input.file_stem().unwrap_or_default();
    let output_name = format!("{}{OUTPUT_SUFFIX}.{extension}", stem.to_string_lossy());
    input.parent().map_or_else(
        || PathBuf::from(&output_name),
        |parent| parent.join(&output_name),
    )
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command, HeuristicChoice, output_path};
    use clap::Parser;
    use std::path::{Path, PathBuf};

    #[test]
    fn test_overlapping_argument_defaults() {
        let cli = Cli::parse_from(["wavegrid", "overlapping", "sample.png"]);
        let Command::Overlapping(args) = cli.command else {
            panic!("expected the overlapping subcommand");
        };

        assert_eq!(args.pattern_size, 3);
        assert_eq!(args.symmetry, 8);
        assert!(!args.no_periodic_input);
        assert_eq!(args.run.attempts, 10);
        assert_eq!(args.run.heuristic, HeuristicChoice::Entropy);
        assert_eq!(args.run.seed, None);
    }

    #[test]
    fn test_tiled_argument_parsing() {
        let cli = Cli::parse_from([
            "wavegrid", "tiled", "knots.json", "--subset", "dense", "--text", "-s", "42",
        ]);
        let Command::Tiled(args) = cli.command else {
            panic!("expected the tiled subcommand");
        };

        assert_eq!(args.catalog, PathBuf::from("knots.json"));
        assert_eq!(args.subset.as_deref(), Some("dense"));
        assert!(args.text);
        assert_eq!(args.run.seed, Some(42));
    }

    #[test]
    fn test_output_path_derivation() {
        let cli = Cli::parse_from(["wavegrid", "overlapping", "dir/flowers.png"]);
        let Command::Overlapping(args) = cli.command else {
            panic!("expected the overlapping subcommand");
        };

        assert_eq!(
            output_path(&args.run, Path::new("dir/flowers.png"), "png"),
            PathBuf::from("dir/flowers_result.png")
        );
    }
}
