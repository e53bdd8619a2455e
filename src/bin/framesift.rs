use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use framesift::{
    ExtractOptions, SortPlan, VideoOutcome, classify, clear_tree, discover_images, equalize,
    extract_folder, materialize, renumber,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  framesift extract videos --out frames --duration 90 --progress\n  framesift sort frames --out frames_sorted --mode box cam hour\n  framesift equalize frames_sorted --out batches --per-folder 4\n  framesift run videos --dest review --duration 90 --mode box day --clear\n  framesift completions zsh > _framesift";

#[derive(Debug, Parser)]
#[command(
    name = "framesift",
    version,
    about = "Extract, sort, and batch keyframes from surveillance video",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional logging output.
    #[arg(long)]
    verbose: bool,

    /// Show a progress bar where supported.
    #[arg(long)]
    progress: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract keyframes from every video in a folder.
    #[command(
        about = "Extract keyframes from videos",
        after_help = "Examples:\n  framesift extract videos --out frames\n  framesift extract videos --out frames --threshold 12.5 --duration 90 --json"
    )]
    Extract {
        /// Folder containing the input videos.
        source: PathBuf,
        /// Output directory for extracted frame images.
        #[arg(long)]
        out: PathBuf,
        /// Change-score cutoff; omitted means per-video mean.
        #[arg(long)]
        threshold: Option<f64>,
        /// Real-world duration of each video in seconds; enables
        /// timestamp-based frame naming.
        #[arg(long)]
        duration: Option<f64>,
        /// Output a machine-readable JSON report.
        #[arg(long)]
        json: bool,
    },

    /// Sort extracted frames into a folder tree by metadata fields.
    #[command(
        about = "Sort frames into a metadata folder tree",
        after_help = "Examples:\n  framesift sort frames --out frames_sorted --mode box cam\n  framesift sort frames --out frames_sorted --mode box 3 hour --clear"
    )]
    Sort {
        /// Root of the frame images to sort.
        source: PathBuf,
        /// Destination root for the sorted tree.
        #[arg(long)]
        out: PathBuf,
        /// Sort keys in nesting order (box, cam, year, month, day, hour,
        /// minute, second); a key followed by an integer filters on it.
        #[arg(long, num_args = 1.., required = true)]
        mode: Vec<String>,
        /// Remove the source tree after a successful sort.
        #[arg(long)]
        clear: bool,
    },

    /// Repack a sorted tree into fixed-size batch folders.
    #[command(
        about = "Equalize a sorted tree into batch folders",
        after_help = "Examples:\n  framesift equalize frames_sorted --out batches\n  framesift equalize frames_sorted --out batches --per-folder 6 --folders 10"
    )]
    Equalize {
        /// Root of the sorted tree to repack.
        source: PathBuf,
        /// Destination directory for the batch folders.
        #[arg(long)]
        out: PathBuf,
        /// Images each source directory contributes per batch.
        #[arg(long, default_value_t = 4)]
        per_folder: usize,
        /// Number of batch folders; 0 derives it from the fullest directory.
        #[arg(long, default_value_t = 0)]
        folders: usize,
    },

    /// Run the full pipeline: extract, sort, then equalize.
    #[command(
        about = "Run extract, sort, and equalize in sequence",
        after_help = "Examples:\n  framesift run videos --mode box cam hour\n  framesift run videos --dest review --duration 90 --mode box day --clear --progress"
    )]
    Run {
        /// Folder containing the input videos.
        source: PathBuf,
        /// Pipeline output root; defaults to `<source>_sifted` next to the
        /// source folder.
        #[arg(long)]
        dest: Option<PathBuf>,
        /// Change-score cutoff; omitted means per-video mean.
        #[arg(long)]
        threshold: Option<f64>,
        /// Real-world duration of each video in seconds.
        #[arg(long)]
        duration: Option<f64>,
        /// Sort keys in nesting order; a key followed by an integer filters.
        #[arg(long, num_args = 1.., required = true)]
        mode: Vec<String>,
        /// Images each source directory contributes per batch.
        #[arg(long, default_value_t = 4)]
        per_folder: usize,
        /// Number of batch folders; 0 derives it from the fullest directory.
        #[arg(long, default_value_t = 0)]
        folders: usize,
        /// Remove each stage's input once the next stage succeeds.
        #[arg(long)]
        clear: bool,
    },

    /// Renumber the files of a directory as 1_, 2_, 3_, ...
    #[command(
        about = "Renumber files in name order",
        after_help = "Examples:\n  framesift renumber batches/batches_1_full"
    )]
    Renumber {
        /// Directory whose files get renumbered.
        directory: PathBuf,
    },

    /// Generate shell completions.
    #[command(about = "Generate shell completion scripts")]
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

fn progress_bar(enabled: bool, total: u64) -> Result<Option<ProgressBar>, Box<dyn std::error::Error>> {
    if !enabled {
        return Ok(None);
    }
    let pb = ProgressBar::new(total);
    let style =
        ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
    pb.set_style(style.progress_chars("##-"));
    Ok(Some(pb))
}

fn report_success(message: String) {
    println!("{} {}", "success:".green().bold(), message.green());
}

fn run_extract(
    global: &GlobalOptions,
    source: &Path,
    out: &Path,
    options: &ExtractOptions,
    json: bool,
) -> Result<Vec<VideoOutcome>, Box<dyn std::error::Error>> {
    let pb = progress_bar(global.progress, 0)?;
    let verbose = global.verbose;

    let outcomes = extract_folder(source, out, options, |processed, total, outcome| {
        if let Some(pb) = &pb {
            pb.set_length(total as u64);
            pb.set_position(processed as u64);
        }
        if verbose {
            match &outcome.result {
                Ok(summary) => eprintln!(
                    "{}: {} frame(s) scanned, {} emitted (threshold {:.3})",
                    outcome.video.display(),
                    summary.frames_scanned,
                    summary.emitted,
                    summary.threshold
                ),
                Err(error) => eprintln!("{}: skipped ({error})", outcome.video.display()),
            }
        }
    })?;

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }

    let emitted: u64 = outcomes
        .iter()
        .filter_map(|outcome| outcome.result.as_ref().ok())
        .map(|summary| summary.emitted)
        .sum();
    let skipped = outcomes
        .iter()
        .filter(|outcome| outcome.result.is_err())
        .count();

    if json {
        let videos: Vec<_> = outcomes
            .iter()
            .map(|outcome| match &outcome.result {
                Ok(summary) => json!({
                    "video": outcome.video.display().to_string(),
                    "frames_scanned": summary.frames_scanned,
                    "threshold": summary.threshold,
                    "emitted": summary.emitted,
                }),
                Err(error) => json!({
                    "video": outcome.video.display().to_string(),
                    "error": error.to_string(),
                }),
            })
            .collect();
        let payload = json!({
            "videos": videos,
            "emitted": emitted,
            "skipped": skipped,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        report_success(format!(
            "Extracted {emitted} frame(s) from {} video(s) to {} ({skipped} skipped)",
            outcomes.len(),
            out.display()
        ));
    }

    Ok(outcomes)
}

fn run_sort(
    source: &Path,
    out: &Path,
    mode: &[String],
    clear: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let plan = SortPlan::parse(mode)?;
    let images = discover_images(source, &plan.filters)?;
    let tree = classify(images, &plan.keys)?;
    let copied = materialize(&tree, out)?;

    if clear {
        clear_tree(source)?;
    }

    report_success(format!(
        "Sorted {copied} image(s) into {}{}",
        out.display(),
        if clear { " (source cleared)" } else { "" }
    ));
    Ok(())
}

fn run_equalize(
    source: &Path,
    out: &Path,
    per_folder: usize,
    folders: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let summary = equalize(source, out, per_folder, folders)?;
    report_success(format!(
        "Placed {} image(s) into {} batch folder(s) under {} ({} full)",
        summary.images_placed,
        summary.folders_created,
        out.display(),
        summary.full_folders
    ));
    Ok(())
}

fn default_pipeline_dest(source: &Path) -> PathBuf {
    let name = source
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("framesift");
    source.with_file_name(format!("{name}_sifted"))
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            source,
            out,
            threshold,
            duration,
            json,
        } => {
            let options = ExtractOptions {
                threshold,
                duration,
            };
            run_extract(&cli.global, &source, &out, &options, json)?;
        }
        Commands::Sort {
            source,
            out,
            mode,
            clear,
        } => {
            run_sort(&source, &out, &mode, clear)?;
        }
        Commands::Equalize {
            source,
            out,
            per_folder,
            folders,
        } => {
            run_equalize(&source, &out, per_folder, folders)?;
        }
        Commands::Run {
            source,
            dest,
            threshold,
            duration,
            mode,
            per_folder,
            folders,
            clear,
        } => {
            // Validate the sort mode before any frame is extracted.
            SortPlan::parse(&mode)?;

            let dest = dest.unwrap_or_else(|| default_pipeline_dest(&source));
            let frames = dest.join("frames");
            let sorted = dest.join("sorted");
            let batches = dest.join("batches");

            let options = ExtractOptions {
                threshold,
                duration,
            };
            run_extract(&cli.global, &source, &frames, &options, false)?;
            run_sort(&frames, &sorted, &mode, clear)?;
            run_equalize(&sorted, &batches, per_folder, folders)?;
            if clear {
                clear_tree(&sorted)?;
            }

            report_success(format!("Pipeline complete under {}", dest.display()));
        }
        Commands::Renumber { directory } => {
            let renamed = renumber(&directory)?;
            report_success(format!(
                "Renumbered {renamed} file(s) in {}",
                directory.display()
            ));
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "framesift", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
