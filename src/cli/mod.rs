//! # CLI Module
//!
//! Command-line interface for the derivative image detector.
//!
//! ## Usage
//! ```bash
//! # Is any upload a copy of the original?
//! pixel-peep compare original.png uploads/
//!
//! # Group a batch and pick originals
//! pixel-peep cluster uploads/ --original-policy quality-score
//!
//! # Stricter thresholds, JSON output
//! pixel-peep compare original.png copy.jpg --max-divergence 20 --output json
//!
//! # Thresholds from a file
//! pixel-peep cluster uploads/ --thresholds thresholds.json
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use pixel_peep::core::comparator::{CombinedRule, OriginalPolicy, Thresholds, Verdict};
use pixel_peep::core::hasher::{DcTerm, HashAlgorithmKind};
use pixel_peep::core::intake::{load_all, ImageCollector, IntakeConfig, IntakeFile, WalkDirIntake};
use pixel_peep::core::pipeline::Detector;
use pixel_peep::core::reporter::{BatchReport, ComparisonReport, DetailedReporter, HashVisualizer};
use pixel_peep::error::{DetectorError, Result};
use pixel_peep::events::{
    CompareEvent, Event, EventChannel, EventReceiver, PipelineEvent, ProfileEvent,
};
use serde::Serialize;
use std::path::PathBuf;
use std::thread;

/// pixel-peep - Find copies of an image, even recompressed ones
#[derive(Parser, Debug)]
#[command(name = "pixel-peep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check whether candidates are derivatives of a reference image
    Compare {
        /// The reference (original) image
        reference: PathBuf,

        /// Candidate images or directories
        #[arg(required = true)]
        candidates: Vec<PathBuf>,

        #[command(flatten)]
        detection: DetectionArgs,
    },
    /// Group a batch into near-duplicates and pick an original per group
    Cluster {
        /// Images or directories to cluster
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// How the original of each group is chosen
        #[arg(long, default_value = "first-index")]
        original_policy: Policy,

        #[command(flatten)]
        detection: DetectionArgs,
    },
}

/// Options shared by every command
#[derive(Args, Debug)]
struct DetectionArgs {
    /// JSON file with thresholds (flags below override it)
    #[arg(long)]
    thresholds: Option<PathBuf>,

    /// Pixel divergence below this is derivative (0-255)
    #[arg(long)]
    max_divergence: Option<f64>,

    /// Similarity score above this is derivative (0-1)
    #[arg(long)]
    min_similarity: Option<f64>,

    /// pHash distance below this is derivative (0-64)
    #[arg(long)]
    max_phash: Option<u32>,

    /// Enable the combined rule with this margin (fraction of each threshold)
    #[arg(long)]
    combined_margin: Option<f64>,

    /// Skip the perceptual hash
    #[arg(long)]
    no_phash: bool,

    /// How the DC coefficient enters the pHash threshold
    #[arg(long, default_value = "include")]
    dc: DcMode,

    /// Largest accepted file in bytes
    #[arg(long, default_value_t = pixel_peep::core::intake::DEFAULT_MAX_FILE_SIZE)]
    max_file_size: u64,

    /// Include hidden files
    #[arg(long)]
    include_hidden: bool,

    /// Output format
    #[arg(short, long, default_value = "pretty")]
    output: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl DetectionArgs {
    fn thresholds(&self) -> Result<Thresholds> {
        let mut thresholds = match &self.thresholds {
            Some(path) => Thresholds::from_json_file(path)?,
            None => Thresholds::default(),
        };

        if let Some(value) = self.max_divergence {
            thresholds.pixel_divergence_max = value;
        }
        if let Some(value) = self.min_similarity {
            thresholds.similarity_min = value;
        }
        if let Some(value) = self.max_phash {
            thresholds.perceptual_hash_max = value;
        }
        if let Some(margin) = self.combined_margin {
            thresholds.combined = Some(CombinedRule { margin });
        }

        Ok(thresholds)
    }

    fn intake(&self) -> WalkDirIntake {
        WalkDirIntake::new(IntakeConfig {
            include_hidden: self.include_hidden,
            max_file_size: self.max_file_size,
            ..IntakeConfig::default()
        })
    }

    fn detector(&self, policy: OriginalPolicy) -> Result<Detector> {
        Ok(Detector::builder()
            .thresholds(self.thresholds()?)
            .perceptual_hash(!self.no_phash)
            .dc_term(self.dc.into())
            .original_policy(policy)
            .build()?)
    }

    fn pretty(&self) -> bool {
        matches!(self.output, OutputFormat::Pretty)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DcMode {
    /// Mean over all 64 coefficients (default)
    Include,
    /// Mean over the 63 AC coefficients
    Exclude,
}

impl From<DcMode> for DcTerm {
    fn from(mode: DcMode) -> Self {
        match mode {
            DcMode::Include => DcTerm::Include,
            DcMode::Exclude => DcTerm::Exclude,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Policy {
    /// Lowest batch index (default)
    FirstIndex,
    /// Sharpest, largest, most representative member
    QualityScore,
}

impl From<Policy> for OriginalPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::FirstIndex => OriginalPolicy::FirstIndex,
            Policy::QualityScore => OriginalPolicy::QualityScore,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// JSON document printed by `compare`
#[derive(Serialize)]
struct CompareOutput<'a> {
    reference: String,
    results: &'a [ComparisonReport],
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compare {
            reference,
            candidates,
            detection,
        } => {
            init_logging(detection.verbose);
            run_compare(reference, candidates, &detection)
        }
        Commands::Cluster {
            paths,
            original_policy,
            detection,
        } => {
            init_logging(detection.verbose);
            run_cluster(paths, original_policy.into(), &detection)
        }
    }
}

fn init_logging(verbose: bool) {
    pixel_peep::init_tracing_with_default(if verbose {
        "pixel_peep=debug"
    } else {
        "warn"
    });
}

fn print_header(term: &Term) {
    term.write_line(&format!(
        "{} {}",
        style("pixel-peep").bold().cyan(),
        style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
    ))
    .ok();
    term.write_line("").ok();
}

fn collect(paths: &[PathBuf], detection: &DetectionArgs) -> Result<Vec<IntakeFile>> {
    let files = detection.intake().collect(paths)?;
    if files.is_empty() {
        return Err(DetectorError::EmptyBatch(format!(
            "no accepted images under {}",
            paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }
    Ok(files)
}

/// Drive a progress bar from detector events on a separate thread
fn spawn_progress(receiver: EventReceiver, enabled: bool) -> thread::JoinHandle<()> {
    let progress = enabled.then(|| {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .map(|style| style.progress_chars("█▓░"))
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb
    });

    thread::spawn(move || {
        for event in receiver.iter() {
            let Some(ref pb) = progress else {
                continue;
            };
            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    pb.set_message(format!("{}", phase));
                }
                Event::Profile(ProfileEvent::Started { total_images }) => {
                    pb.set_length(total_images as u64);
                    pb.set_position(0);
                }
                Event::Profile(ProfileEvent::Progress(p)) => {
                    pb.set_position(p.completed as u64);
                }
                Event::Compare(CompareEvent::Started {
                    total_comparisons, ..
                }) => {
                    pb.set_length(total_comparisons as u64);
                    pb.set_position(0);
                }
                Event::Compare(CompareEvent::Progress(p)) => {
                    pb.set_position(p.comparisons_completed as u64);
                }
                Event::Pipeline(PipelineEvent::Completed { .. }) => {
                    pb.finish_and_clear();
                }
                Event::Pipeline(PipelineEvent::Error { message }) => {
                    pb.abandon_with_message(format!("failed: {}", message));
                }
                _ => {}
            }
        }
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    println!("{}", json);
    Ok(())
}

fn run_compare(
    reference: PathBuf,
    candidates: Vec<PathBuf>,
    detection: &DetectionArgs,
) -> Result<()> {
    let term = Term::stderr();
    if detection.pretty() {
        print_header(&term);
    }

    let detector = detection.detector(OriginalPolicy::FirstIndex)?;

    let reference_file = detection
        .intake()
        .collect(std::slice::from_ref(&reference))?
        .into_iter()
        .next()
        .ok_or_else(|| DetectorError::EmptyBatch("reference is not an image".to_string()))?;
    let candidate_files = collect(&candidates, detection)?;

    let reference_image = reference_file.load()?;
    let candidate_images = load_all(&candidate_files)?;

    let (sender, receiver) = EventChannel::new();
    let event_thread = spawn_progress(receiver, detection.pretty());

    let result = detector.compare_many_with_events(&reference_image, &candidate_images, &sender);

    drop(sender);
    event_thread.join().ok();
    let verdicts = result?;

    let reports: Vec<ComparisonReport> = candidate_files
        .iter()
        .zip(verdicts.iter())
        .map(|(file, verdict)| ComparisonReport::new(file.display_name(), verdict))
        .collect();

    match detection.output {
        OutputFormat::Pretty => {
            let reference_profile = if detection.verbose {
                Some(detector.profile(&reference_image)?)
            } else {
                None
            };

            term.write_line(&format!(
                "{} {}",
                style("Reference:").bold(),
                reference_file.display_name()
            ))
            .ok();
            term.write_line("").ok();

            let reporter = DetailedReporter::new(*detector.strategy().thresholds());
            for ((report, verdict), image) in
                reports.iter().zip(verdicts.iter()).zip(candidate_images.iter())
            {
                print_verdict(&term, report, verdict);
                if let Some(ref reference_profile) = reference_profile {
                    let explanation = reporter.explain(verdict);
                    term.write_line(&format!("    {}", style(&explanation.summary).dim()))
                        .ok();
                    term.write_line(&format!("    {}", explanation.human_readable))
                        .ok();

                    let candidate_profile = detector.profile(image)?;
                    let reference_phash =
                        reference_profile.fingerprints.get(HashAlgorithmKind::Perceptual);
                    let candidate_phash =
                        candidate_profile.fingerprints.get(HashAlgorithmKind::Perceptual);
                    if let (Some(a), Some(b)) = (reference_phash, candidate_phash) {
                        let visualizer = HashVisualizer::new();
                        term.write_line("").ok();
                        for line in visualizer.visualize_difference(a, b)?.lines() {
                            term.write_line(&format!("    {}", line)).ok();
                        }
                        term.write_line(&format!(
                            "    {}",
                            style(visualizer.summarize_difference(a, b)?).dim()
                        ))
                        .ok();
                    }
                    term.write_line("").ok();
                }
            }

            let flagged = verdicts.iter().filter(|v| v.is_derivative).count();
            term.write_line("").ok();
            term.write_line(&format!(
                "{} {} of {} candidates flagged as derivative",
                style("✓").green().bold(),
                style(flagged).cyan(),
                verdicts.len()
            ))
            .ok();
        }
        OutputFormat::Json => print_json(&CompareOutput {
            reference: reference_file.display_name(),
            results: &reports,
        })?,
    }

    Ok(())
}

fn print_verdict(term: &Term, report: &ComparisonReport, verdict: &Verdict) {
    let marker = if verdict.is_derivative {
        style("✗ DERIVATIVE").red().bold()
    } else {
        style("✓ distinct").green()
    };

    let phash = report
        .perceptual_hash_distance
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".to_string());

    term.write_line(&format!(
        "  {} {} {}",
        marker,
        report.candidate,
        style(format!("[{}]", report.detection_method)).yellow()
    ))
    .ok();
    term.write_line(&format!(
        "    divergence {:.1}  similarity {:.3}  pHash {}  ssim {:.3}  hue {:.3}",
        report.pixel_divergence,
        report.similarity_score,
        phash,
        report.structural_similarity,
        report.hue_similarity
    ))
    .ok();
}

fn run_cluster(
    paths: Vec<PathBuf>,
    policy: OriginalPolicy,
    detection: &DetectionArgs,
) -> Result<()> {
    let term = Term::stderr();
    if detection.pretty() {
        print_header(&term);
    }

    let detector = detection.detector(policy)?;
    let files = collect(&paths, detection)?;
    let images = load_all(&files)?;

    let (sender, receiver) = EventChannel::new();
    let event_thread = spawn_progress(receiver, detection.pretty());

    let result = detector.cluster_with_events(&images, &sender);

    drop(sender);
    event_thread.join().ok();
    let result = result?;

    let report = BatchReport::new(files.iter().map(IntakeFile::display_name).collect(), &result);

    match detection.output {
        OutputFormat::Pretty => print_pretty_batch(&term, &report, policy, detection.verbose),
        OutputFormat::Json => print_json(&report)?,
    }

    Ok(())
}

fn print_pretty_batch(term: &Term, report: &BatchReport, policy: OriginalPolicy, verbose: bool) {
    term.write_line(&format!("{} Clustering Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} images compared in {:.1}s",
        style(report.images.len()).cyan(),
        report.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line(&format!(
        "  {} groups with derivatives",
        style(report.duplicate_groups().count()).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} derivative pairs",
        style(report.matches.len()).cyan()
    ))
    .ok();
    term.write_line("").ok();

    if report.duplicate_groups().next().is_none() {
        term.write_line("  No derivatives found.").ok();
        return;
    }

    term.write_line(&format!("{}", style("Groups:").bold().underlined()))
        .ok();
    term.write_line("").ok();

    for (i, (members, original)) in report.duplicate_groups().enumerate() {
        term.write_line(&format!(
            "  {} ({} images)",
            style(format!("Group {}:", i + 1)).bold(),
            members.len()
        ))
        .ok();

        for &index in members {
            let marker = if index == original {
                style("★").green().to_string()
            } else {
                style("○").dim().to_string()
            };
            term.write_line(&format!("    {} {}", marker, report.name(index)))
                .ok();
        }

        if verbose {
            for pair in report
                .matches
                .iter()
                .filter(|p| members.contains(&p.first))
            {
                term.write_line(&format!(
                    "    {} {} ~ {} via {}",
                    style("match").dim(),
                    report.name(pair.first),
                    report.name(pair.second),
                    pair.detection_method
                ))
                .ok();
            }
        }

        term.write_line("").ok();
    }

    term.write_line(&format!(
        "{}",
        style(format!("★ marks the original ({} policy)", policy)).dim()
    ))
    .ok();
}
