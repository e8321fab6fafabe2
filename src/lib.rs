//! Pairmark: manual point-correspondence annotation for SfM pipelines.
//!
//! Pairmark records operator-asserted feature correspondences between
//! adjacent images of an ordered sequence and moves them into and out of
//! the COLMAP images.txt text format, so hand-curated matches can feed a
//! structure-from-motion reconstruction.
//!
//! # Modules
//!
//! - [`store`]: The in-memory correspondence model (observations, feature
//!   and 3D point identity)
//! - [`colmap`]: images.txt parsing and serialization
//! - [`viewport`]: Zoom/letterbox mapping between image pixels and the
//!   render surface
//! - [`pair`]: Traversal over adjacent image pairs
//! - [`session`]: The composed annotation session a presentation layer
//!   drives
//! - [`error`]: Error types for pairmark operations

pub mod colmap;
pub mod error;
pub mod pair;
pub mod session;
pub mod store;
pub mod viewport;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

pub use error::PairmarkError;

/// The pairmark CLI application.
#[derive(Parser)]
#[command(name = "pairmark")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Summarize an images.txt file against an image directory.
    Inspect(InspectArgs),

    /// Write a skeleton images.txt for an image directory.
    Init(InitArgs),
}

/// Arguments for the inspect subcommand.
#[derive(clap::Args)]
struct InspectArgs {
    /// images.txt file to inspect.
    input: PathBuf,

    /// Directory holding the sequence's images.
    #[arg(long)]
    image_dir: PathBuf,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Arguments for the init subcommand.
#[derive(clap::Args)]
struct InitArgs {
    /// Directory holding the sequence's images.
    #[arg(long)]
    image_dir: PathBuf,

    /// Path of the images.txt to write.
    output: PathBuf,
}

/// Run the pairmark CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), PairmarkError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Inspect(args)) => run_inspect(args),
        Some(Commands::Init(args)) => run_init(args),
        None => {
            println!("pairmark {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Manual point-correspondence annotation for SfM pipelines.");
            println!();
            println!("Run 'pairmark --help' for usage information.");
            Ok(())
        }
    }
}

/// Per-image slice of an inspect report.
#[derive(Serialize)]
struct ImageReport {
    name: String,
    observations: usize,
    linked: usize,
    has_pose: bool,
}

/// Summary of an images.txt file against a discovered image set.
#[derive(Serialize)]
struct InspectReport {
    images: Vec<ImageReport>,
    total_observations: usize,
    linked_observations: usize,
    point3d_watermark: i64,
}

/// Execute the inspect subcommand.
fn run_inspect(args: InspectArgs) -> Result<(), PairmarkError> {
    let known = session::discover_images(&args.image_dir)?;
    let store = colmap::read_images_txt(&args.input, &known)?;

    let images: Vec<ImageReport> = store
        .image_names()
        .map(|name| {
            let observations = store.observation_count(name);
            let linked = store
                .observations(name)
                .filter(|(_, obs)| obs.point3d_id.is_linked())
                .count();
            ImageReport {
                name: name.to_string(),
                observations,
                linked,
                has_pose: store.pose(name).is_some(),
            }
        })
        .collect();

    let report = InspectReport {
        total_observations: images.iter().map(|img| img.observations).sum(),
        linked_observations: images.iter().map(|img| img.linked).sum(),
        point3d_watermark: store.point3d_watermark(),
        images,
    };

    match args.output.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|source| PairmarkError::Io(source.into()))?;
            println!("{}", json);
        }
        _ => {
            println!(
                "{}: {} image(s), {} observation(s) ({} linked), 3D point watermark {}",
                args.input.display(),
                report.images.len(),
                report.total_observations,
                report.linked_observations,
                report.point3d_watermark
            );
            for img in &report.images {
                println!(
                    "  {}: {} observation(s), {} linked, pose {}",
                    img.name,
                    img.observations,
                    img.linked,
                    if img.has_pose { "imported" } else { "default" }
                );
            }
        }
    }

    Ok(())
}

/// Execute the init subcommand.
fn run_init(args: InitArgs) -> Result<(), PairmarkError> {
    let images = session::discover_images(&args.image_dir)?;
    if images.len() < 2 {
        return Err(PairmarkError::TooFewImages {
            count: images.len(),
        });
    }

    let store = store::AnnotationStore::new(images);
    colmap::write_images_txt(&args.output, &store)?;

    println!(
        "Wrote {} with {} image(s) and default poses",
        args.output.display(),
        store.image_names().count()
    );
    Ok(())
}
