use serde::Serialize;

use crate::cli::{EvaluateArgs, MatchPolicy};
use crate::error::EvalError;
use crate::util::round_to;

pub const DEFAULT_NUM_WORKERS: usize = 8;
pub const DEFAULT_CHUNK_SIZE: usize = 50;
pub const DEFAULT_MAX_PRED_WINDOWS: usize = 10;
pub const DEFAULT_CLIP_LENGTH: f64 = 2.0;

/// Minimum saliency rating that makes a clip relevant, with its report label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaliencyLevel {
    pub min_score: f64,
    pub name: String,
}

/// Window-length stratum `(min, max]` reported next to `full`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LengthRange {
    pub name: String,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvalConfig {
    pub match_policy: MatchPolicy,
    pub num_workers: usize,
    pub chunk_size: usize,
    pub iou_thresholds: Vec<f64>,
    pub max_pred_windows: Option<usize>,
    pub max_gt_windows: Option<usize>,
    pub recall_ks: Vec<usize>,
    pub length_ranges: Vec<LengthRange>,
    pub clip_length: f64,
    pub saliency_levels: Vec<SaliencyLevel>,
    pub verbose: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            match_policy: MatchPolicy::Lenient,
            num_workers: DEFAULT_NUM_WORKERS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            iou_thresholds: linspace(0.1, 0.95, 18),
            max_pred_windows: Some(DEFAULT_MAX_PRED_WINDOWS),
            max_gt_windows: None,
            recall_ks: vec![1, 5, 10],
            length_ranges: Vec::new(),
            clip_length: DEFAULT_CLIP_LENGTH,
            saliency_levels: vec![
                SaliencyLevel {
                    min_score: 2.0,
                    name: "Fair".to_string(),
                },
                SaliencyLevel {
                    min_score: 3.0,
                    name: "Good".to_string(),
                },
                SaliencyLevel {
                    min_score: 4.0,
                    name: "VeryGood".to_string(),
                },
            ],
            verbose: true,
        }
    }
}

impl From<&EvaluateArgs> for EvalConfig {
    fn from(args: &EvaluateArgs) -> Self {
        Self {
            match_policy: args.match_policy,
            num_workers: args.num_workers,
            chunk_size: args.chunk_size,
            max_pred_windows: Some(args.max_pred_windows),
            max_gt_windows: args.max_gt_windows,
            length_ranges: if args.stratify_by_length {
                default_length_ranges()
            } else {
                Vec::new()
            },
            clip_length: args.clip_length,
            verbose: !args.not_verbose,
            ..Self::default()
        }
    }
}

impl EvalConfig {
    pub fn validate(&self) -> Result<(), EvalError> {
        if self.num_workers == 0 {
            return Err(EvalError::InvalidConfig(
                "num_workers must be at least 1".to_string(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(EvalError::InvalidConfig(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        if !(self.clip_length.is_finite() && self.clip_length > 0.0) {
            return Err(EvalError::InvalidConfig(format!(
                "clip_length must be positive, got {}",
                self.clip_length
            )));
        }
        if self.iou_thresholds.is_empty() {
            return Err(EvalError::InvalidConfig(
                "iou_thresholds must not be empty".to_string(),
            ));
        }
        if self
            .iou_thresholds
            .iter()
            .any(|value| !(*value > 0.0 && *value <= 1.0))
        {
            return Err(EvalError::InvalidConfig(format!(
                "iou_thresholds must lie in (0, 1]: {:?}",
                self.iou_thresholds
            )));
        }
        if self.iou_thresholds.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(EvalError::InvalidConfig(format!(
                "iou_thresholds must be strictly increasing: {:?}",
                self.iou_thresholds
            )));
        }
        if self.recall_ks.iter().any(|k| *k == 0) {
            return Err(EvalError::InvalidConfig(
                "recall cut-offs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// `count` evenly spaced values from `start` to `end` inclusive, rounded to
/// two decimals so they double as stable report keys.
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![round_to(start, 2)],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count)
                .map(|index| round_to(start + step * index as f64, 2))
                .collect()
        }
    }
}

pub fn threshold_key(threshold: f64) -> String {
    format!("{}", round_to(threshold, 2))
}

pub fn default_length_ranges() -> Vec<LengthRange> {
    [("short", 0.0, 10.0), ("middle", 10.0, 30.0), ("long", 30.0, 150.0)]
        .into_iter()
        .map(|(name, min, max)| LengthRange {
            name: name.to_string(),
            min,
            max,
        })
        .collect()
}
