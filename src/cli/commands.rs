// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the subcommands and their flags:
//
//   generate [BATCHES]   grow the generated partition
//   tasks                re-stamp trainingTasks corpus-wide
//   validate <FILE>      check forms without touching the corpus
//   stats                distribution report
//   evaluate             score a submission against groundTruth
//
// Every args struct converts into its application-layer config
// with `From`, so Layer 2 never sees clap types.

use chrono::NaiveDate;
use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::{generate_use_case::GenerateConfig, tasks_use_case::TasksConfig};
use crate::corpus::{distribution::DEFAULT_BATCH_WIDTH, masking::DEFAULT_MASK_SEED};
use crate::infra::store::{CorpusPaths, GENERATED_FILE, MANUAL_FILE};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate, validate and commit new forms in batches
    Generate(GenerateArgs),

    /// Draw the masking plan and rewrite every form's trainingTasks
    Tasks(TasksArgs),

    /// Validate a file of forms (one form, an array, or a partition)
    Validate(ValidateArgs),

    /// Print the distribution of types, layouts, kinds and styles
    Stats(StatsArgs),

    /// Score a filled-in submission against a form's groundTruth
    Evaluate(EvaluateArgs),
}

/// Where the corpus files live. Shared by every command that
/// reads or writes the corpus.
#[derive(Args, Debug, Clone)]
pub struct PathArgs {
    /// Directory holding the corpus files
    #[arg(long, default_value = "public")]
    pub corpus_dir: PathBuf,

    /// Hand-authored partition file name
    #[arg(long, default_value = MANUAL_FILE)]
    pub manual_file: String,

    /// Generated partition file name
    #[arg(long, default_value = GENERATED_FILE)]
    pub generated_file: String,
}

impl From<PathArgs> for CorpusPaths {
    fn from(a: PathArgs) -> Self {
        CorpusPaths {
            corpus_dir:     a.corpus_dir,
            manual_file:    a.manual_file,
            generated_file: a.generated_file,
        }
    }
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Number of batches to generate
    #[arg(default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub batches: u64,

    /// Forms requested per batch
    #[arg(long, default_value_t = DEFAULT_BATCH_WIDTH as u64, value_parser = clap::value_parser!(u64).range(1..))]
    pub batch_size: u64,

    /// Directory the generator drains JSON form files from
    #[arg(long, default_value = "inbox")]
    pub inbox_dir: PathBuf,

    /// Date handed to the generator (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub today: Option<NaiveDate>,

    #[command(flatten)]
    pub paths: PathArgs,
}

impl From<GenerateArgs> for GenerateConfig {
    fn from(a: GenerateArgs) -> Self {
        GenerateConfig {
            paths:      a.paths.into(),
            batches:    a.batches as usize,
            batch_size: a.batch_size as usize,
            inbox_dir:  a.inbox_dir,
            today:      a.today,
        }
    }
}

#[derive(Args, Debug)]
pub struct TasksArgs {
    /// Seed for the masking plan
    #[arg(long, default_value_t = DEFAULT_MASK_SEED)]
    pub seed: u64,

    /// Share of all tasks that omit fields, in [0, 1]
    #[arg(long, default_value_t = 0.10, value_parser = parse_fraction)]
    pub mask_fraction: f64,

    #[command(flatten)]
    pub paths: PathArgs,
}

impl From<TasksArgs> for TasksConfig {
    fn from(a: TasksArgs) -> Self {
        TasksConfig {
            paths:         a.paths.into(),
            seed:          a.seed,
            mask_fraction: a.mask_fraction,
        }
    }
}

fn parse_fraction(s: &str) -> Result<f64, String> {
    let x: f64 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    if (0.0..=1.0).contains(&x) {
        Ok(x)
    } else {
        Err(format!("{} is outside [0, 1]", x))
    }
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// JSON file to check
    pub file: PathBuf,

    /// Also require exactly 5 trainingTasks per form
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Print the report as JSON instead of text
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub paths: PathArgs,
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Id of the form the submission belongs to
    #[arg(long)]
    pub form_id: String,

    /// JSON object of field id → submitted value
    #[arg(long)]
    pub submission: PathBuf,

    /// Print the full result as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub paths: PathArgs,
}
