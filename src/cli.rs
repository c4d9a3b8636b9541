use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "svag-eval",
    version,
    about = "Temporal grounding and identity reconciliation scoring for spatio-temporal video grounding"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Evaluate(EvaluateArgs),
    ConvertGroundTruth(ConvertGroundTruthArgs),
    ConvertSubmission(ConvertSubmissionArgs),
    Combine(CombineArgs),
    Average(AverageArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    Strict,
    Lenient,
}

impl MatchPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Lenient => "lenient",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    #[arg(long)]
    pub submission_path: PathBuf,

    #[arg(long)]
    pub gt_path: PathBuf,

    #[arg(long, default_value = "results/id_mapping.jsonl")]
    pub id_mapping_path: PathBuf,

    #[arg(long)]
    pub save_path: PathBuf,

    #[arg(long)]
    pub run_manifest_path: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = MatchPolicy::Lenient)]
    pub match_policy: MatchPolicy,

    #[arg(long, default_value_t = 8)]
    pub num_workers: usize,

    #[arg(long, default_value_t = 50)]
    pub chunk_size: usize,

    #[arg(long, default_value_t = 10)]
    pub max_pred_windows: usize,

    #[arg(long)]
    pub max_gt_windows: Option<usize>,

    #[arg(long, default_value_t = 2.0)]
    pub clip_length: f64,

    #[arg(long, default_value_t = false)]
    pub stratify_by_length: bool,

    #[arg(long, default_value_t = false)]
    pub not_verbose: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ConvertGroundTruthArgs {
    #[arg(long)]
    pub input_path: PathBuf,

    #[arg(long)]
    pub output_path: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ConvertSubmissionArgs {
    #[arg(long)]
    pub input_path: PathBuf,

    #[arg(long)]
    pub output_path: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct CombineArgs {
    #[arg(long)]
    pub spatial_summary_path: PathBuf,

    #[arg(long)]
    pub temporal_metrics_path: PathBuf,

    #[arg(long)]
    pub output_path: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct AverageArgs {
    #[arg(long = "result", required = true)]
    pub result_paths: Vec<PathBuf>,

    #[arg(long)]
    pub output_path: PathBuf,
}
