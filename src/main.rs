mod color;
mod data;
mod dataset;
mod error;
mod export;
mod questions;
mod visualize;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use image::DynamicImage;

use data::filter::filter_unique;
use data::index::AnnotationIndex;
use data::loader::{load_raw, load_snapshot, save_snapshot};
use data::model::{CategoryMap, ImageId, ImageRecord};
use data::pairs::{attach_good_pairs, good_pairs, sort_by_x, PairOptions};
use dataset::SpatialDataset;
use export::{collect_questions, write_questions, QuestionKind};
use visualize::{save_image, visualize, VisConfig};

/// Build spatial VQA evaluation sets from COCO detection annotations.
#[derive(Parser)]
#[command(name = "coco-spatial", version, about)]
struct Cli {
    /// Directory that contains `val2014/`.
    #[arg(long, global = true, env = "COCO_ROOT", default_value = ".")]
    dataset_root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Keep images with at least two categories that occur exactly once.
    Filter {
        /// COCO instances file, e.g. `annotations/instances_val2014.json`.
        #[arg(long)]
        annotations: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Sort objects left to right and attach horizontally separated pairs.
    Pairs {
        /// Filtered snapshot (local path or https URL).
        #[arg(long)]
        input: String,
        #[arg(long)]
        output: PathBuf,
        /// Drop images without any good pair instead of keeping an empty list.
        #[arg(long)]
        drop_empty: bool,
    },
    /// Export presence and left/right questions as `.json` or `.csv`.
    Questions {
        #[arg(long)]
        input: String,
        #[arg(long)]
        output: PathBuf,
    },
    /// Draw boxes and labels for one image of a snapshot or a raw COCO file.
    Visualize {
        #[arg(long, required_unless_present = "annotations", conflicts_with = "annotations")]
        input: Option<String>,
        /// Position in the snapshot's image order.
        #[arg(long, default_value_t = 0)]
        index: usize,
        /// COCO instances file to read instead of a snapshot.
        #[arg(long, requires = "image_id")]
        annotations: Option<PathBuf>,
        /// COCO image id, used with `--annotations`.
        #[arg(long, requires = "annotations")]
        image_id: Option<ImageId>,
        #[arg(long)]
        output: PathBuf,
        /// Also write the mirrored image used for contrastive evaluation.
        #[arg(long)]
        flipped_output: Option<PathBuf>,
        #[arg(long)]
        font: Option<PathBuf>,
        #[arg(long, default_value_t = 25.0)]
        font_size: f32,
    },
    /// Print image, object, pair and question counts of a snapshot.
    Stats {
        #[arg(long)]
        input: String,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Filter {
            annotations,
            output,
        } => run_filter(&annotations, &output),
        Command::Pairs {
            input,
            output,
            drop_empty,
        } => run_pairs(&input, &output, PairOptions { drop_empty }),
        Command::Questions { input, output } => run_questions(&input, &output),
        Command::Visualize {
            input,
            index,
            annotations,
            image_id,
            output,
            flipped_output,
            font,
            font_size,
        } => {
            let source = match (input, annotations, image_id) {
                (Some(input), _, _) => VisSource::Snapshot { input, index },
                (None, Some(annotations), Some(image_id)) => VisSource::Raw {
                    annotations,
                    image_id,
                },
                _ => anyhow::bail!("either --input or --annotations with --image-id is required"),
            };
            let config = VisConfig {
                font_path: font,
                font_size,
                ..VisConfig::default()
            };
            run_visualize(
                &cli.dataset_root,
                &source,
                &output,
                flipped_output.as_deref(),
                &config,
            )
        }
        Command::Stats { input } => run_stats(&input),
    }
}

fn run_filter(annotations: &Path, output: &Path) -> Result<()> {
    let raw = load_raw(annotations)
        .with_context(|| format!("loading annotations from {}", annotations.display()))?;
    let index = AnnotationIndex::build(raw);
    let (snapshot, _report) = filter_unique(&index).context("filtering unique categories")?;
    save_snapshot(&snapshot, output).context("saving filtered snapshot")?;
    Ok(())
}

fn run_pairs(input: &str, output: &Path, options: PairOptions) -> Result<()> {
    let snapshot = load_snapshot(input).with_context(|| format!("loading {input}"))?;
    let (snapshot, _report) = attach_good_pairs(snapshot, options);
    save_snapshot(&snapshot, output).context("saving spatial snapshot")?;
    Ok(())
}

fn run_questions(input: &str, output: &Path) -> Result<()> {
    let snapshot = load_snapshot(input).with_context(|| format!("loading {input}"))?;
    let rows = collect_questions(&snapshot).context("generating questions")?;
    write_questions(&rows, output).context("writing questions")?;
    Ok(())
}

/// Where `visualize` takes its image from.
enum VisSource {
    /// Position `index` of a filtered or spatial snapshot.
    Snapshot { input: String, index: usize },
    /// One image of a raw COCO instances file, looked up by id.
    Raw {
        annotations: PathBuf,
        image_id: ImageId,
    },
}

struct VisTarget {
    image_id: ImageId,
    image: DynamicImage,
    record: ImageRecord,
    categories: CategoryMap,
}

fn load_vis_target(dataset_root: &Path, source: &VisSource) -> Result<VisTarget> {
    match source {
        VisSource::Snapshot { input, index } => {
            let dataset = SpatialDataset::open(dataset_root, input)
                .with_context(|| format!("loading {input}"))?;
            let (image_id, image, record) = dataset
                .get(*index)
                .with_context(|| format!("reading image #{index}"))?;
            Ok(VisTarget {
                image_id,
                image,
                record: record.clone(),
                categories: dataset.categories,
            })
        }
        VisSource::Raw {
            annotations,
            image_id,
        } => {
            let raw = load_raw(annotations)
                .with_context(|| format!("loading annotations from {}", annotations.display()))?;
            let index = AnnotationIndex::build(raw);
            let (image, anns) = index
                .load_image(dataset_root, *image_id)
                .with_context(|| format!("reading image {image_id}"))?;

            // Raw annotations carry no pairs yet; compute them for the question log.
            let mut record = ImageRecord::from_info(index.image_info(*image_id)?, anns.to_vec());
            sort_by_x(&mut record.annotations);
            record.good_pairs = Some(good_pairs(&record.annotations));
            Ok(VisTarget {
                image_id: *image_id,
                image,
                record,
                categories: CategoryMap::new(index.categories()),
            })
        }
    }
}

fn run_visualize(
    dataset_root: &Path,
    source: &VisSource,
    output: &Path,
    flipped_output: Option<&Path>,
    config: &VisConfig,
) -> Result<()> {
    let VisTarget {
        image_id,
        image,
        record,
        categories,
    } = load_vis_target(dataset_root, source)?;

    let vis = visualize(&image, &record.annotations, &categories, config)?;
    save_image(&DynamicImage::ImageRgba8(vis), output)?;
    log::info!("Image {image_id}: wrote {}", output.display());

    if let Some(flipped_path) = flipped_output {
        let eval = questions::spatial_eval(image, &record, &categories)?;
        for q in &eval.questions {
            log::info!("{} -> {}", q.question, q.correct());
        }
        save_image(&eval.image_flipped, flipped_path)?;
        log::info!("Image {image_id}: wrote mirrored copy {}", flipped_path.display());
    }
    Ok(())
}

fn run_stats(input: &str) -> Result<()> {
    let snapshot = load_snapshot(input).with_context(|| format!("loading {input}"))?;
    let rows = collect_questions(&snapshot).context("generating questions")?;
    let objects: usize = snapshot.iter().map(|(_, rec)| rec.annotations.len()).sum();
    let spatial = rows
        .iter()
        .filter(|r| r.kind == QuestionKind::Spatial)
        .count();

    println!("categories:          {}", snapshot.category_map().len());
    println!("images:              {}", snapshot.len());
    println!("objects:             {objects}");
    println!("good pairs:          {}", snapshot.pair_count());
    println!("presence questions:  {}", rows.len() - spatial);
    println!("spatial questions:   {spatial}");
    Ok(())
}
