use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use posecut::{BBoxStrategy, BatchOutcome, ExtractOpts, OverlapPredicate, PoseLibrary};

#[derive(Parser, Debug)]
#[command(name = "posecut", version, about = "Split vector sprite sheets into pose SVGs")]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the poses of one sheet (or the first sheet in a directory).
    Extract(ExtractArgs),
    /// Extract every sheet in a directory into per-sheet subdirectories.
    Batch(BatchArgs),
    /// List the pose numbers available for a sprite.
    List(ListArgs),
}

#[derive(Parser, Debug)]
struct ExtractArgs {
    /// Input sprite sheet SVG, or a directory holding one.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory for `pose_NN.svg` files.
    #[arg(long)]
    out: PathBuf,

    /// Print the extraction report as JSON on stdout.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    opts: OptArgs,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// Directory of sprite sheet SVGs.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output root; each sheet gets `<out>/<stem>/`.
    #[arg(long)]
    out: PathBuf,

    /// Print the batch report as JSON on stdout.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    opts: OptArgs,
}

#[derive(Parser, Debug)]
struct ListArgs {
    /// Directory holding one folder of poses per sprite.
    #[arg(long)]
    root: PathBuf,

    /// Sprite name; `<name>_vector` is tried when `<name>` is missing.
    #[arg(long)]
    sprite: String,

    /// File name prefix of the poses.
    #[arg(long, default_value = "pose")]
    prefix: String,
}

/// Extraction options. Flags override values loaded with `--config`.
#[derive(Args, Debug)]
struct OptArgs {
    /// JSON file with extraction options.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum)]
    strategy: Option<StrategyChoice>,

    /// Overlap test used for clustering.
    #[arg(long, value_enum)]
    predicate: Option<PredicateChoice>,

    /// Padding for the `padded` predicate.
    #[arg(long)]
    pad: Option<f64>,

    /// Minimum intersection area for the `area-share` predicate.
    #[arg(long)]
    min_area: Option<f64>,

    /// Minimum intersection share of the smaller box for the `area-share` predicate.
    #[arg(long)]
    min_share: Option<f64>,

    /// Fewest groups a component needs to count as a pose.
    #[arg(long)]
    min_groups: Option<usize>,

    /// Crop margin around each pose, in canvas units.
    #[arg(long)]
    margin: Option<f64>,

    /// Raster pixels per canvas unit.
    #[arg(long)]
    scale: Option<f64>,

    /// Output file name prefix.
    #[arg(long)]
    prefix: Option<String>,

    /// Use a rayon pool.
    #[arg(long)]
    parallel: bool,

    /// Worker threads for `--parallel`.
    #[arg(long)]
    threads: Option<usize>,

    /// Also write a PNG preview of every pose.
    #[arg(long)]
    preview: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyChoice {
    Raster,
    Analytic,
    Auto,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PredicateChoice {
    Padded,
    AreaShare,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Extract(args) => cmd_extract(args),
        Command::Batch(args) => cmd_batch(args),
        Command::List(args) => cmd_list(args),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

impl OptArgs {
    fn resolve(&self) -> anyhow::Result<ExtractOpts> {
        let mut opts = match &self.config {
            Some(path) => ExtractOpts::from_path(path)?,
            None => ExtractOpts::default(),
        };

        if let Some(s) = self.strategy {
            opts.strategy = match s {
                StrategyChoice::Raster => BBoxStrategy::Raster,
                StrategyChoice::Analytic => BBoxStrategy::Analytic,
                StrategyChoice::Auto => BBoxStrategy::Auto,
            };
        }
        if let Some(p) = self.predicate {
            let switching = !matches!(
                (p, &opts.predicate),
                (PredicateChoice::Padded, OverlapPredicate::Padded { .. })
                    | (PredicateChoice::AreaShare, OverlapPredicate::AreaShare { .. })
            );
            if switching {
                opts.predicate = match p {
                    PredicateChoice::Padded => OverlapPredicate::padded(),
                    PredicateChoice::AreaShare => OverlapPredicate::area_share(),
                };
            }
        }
        match &mut opts.predicate {
            OverlapPredicate::Padded { pad } => {
                if let Some(v) = self.pad {
                    *pad = v;
                }
                if self.min_area.is_some() || self.min_share.is_some() {
                    anyhow::bail!("--min-area/--min-share need --predicate area-share");
                }
            }
            OverlapPredicate::AreaShare {
                min_area,
                min_share,
            } => {
                if let Some(v) = self.min_area {
                    *min_area = v;
                }
                if let Some(v) = self.min_share {
                    *min_share = v;
                }
                if self.pad.is_some() {
                    anyhow::bail!("--pad needs --predicate padded");
                }
            }
        }
        if let Some(v) = self.min_groups {
            opts.min_groups = v;
        }
        if let Some(v) = self.margin {
            opts.export_margin = v;
        }
        if let Some(v) = self.scale {
            opts.raster_scale = v;
        }
        if let Some(v) = &self.prefix {
            opts.prefix = v.clone();
        }
        if self.parallel {
            opts.parallel = true;
        }
        if self.threads.is_some() {
            opts.threads = self.threads;
        }
        if self.preview {
            opts.preview_png = true;
        }

        opts.validate()?;
        Ok(opts)
    }
}

fn cmd_extract(args: ExtractArgs) -> anyhow::Result<()> {
    let opts = args.opts.resolve()?;
    let report = posecut::extract_poses(&args.in_path, &args.out, &opts)?;
    for path in &report.written {
        eprintln!("wrote {}", path.display());
    }
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("serialize report")?
        );
    }
    Ok(())
}

fn cmd_batch(args: BatchArgs) -> anyhow::Result<()> {
    let opts = args.opts.resolve()?;
    let report = posecut::extract_all(&args.in_path, &args.out, &opts)?;
    for outcome in &report.outcomes {
        match outcome {
            BatchOutcome::Extracted(r) => {
                eprintln!("ok     {} ({} poses)", r.sheet.display(), r.written.len());
            }
            BatchOutcome::Failed { sheet, error } => {
                eprintln!("failed {}: {error}", sheet.display());
            }
        }
    }
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("serialize report")?
        );
    }
    if report.failed() > 0 {
        anyhow::bail!(
            "{} of {} sheet(s) failed",
            report.failed(),
            report.outcomes.len()
        );
    }
    Ok(())
}

fn cmd_list(args: ListArgs) -> anyhow::Result<()> {
    let lib = PoseLibrary::open_with_prefix(&args.root, &args.sprite, &args.prefix)?;
    for number in lib.poses()? {
        println!("{number}");
    }
    Ok(())
}
