use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EvalError;

/// Number of independent saliency ratings per clip.
pub const ANNOTATOR_COUNT: usize = 3;

/// Query and track identifiers arrive as either JSON integers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

pub type Qid = RecordId;
pub type TrackId = RecordId;

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// A `[start, end]` interval in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Window {
    pub start: f64,
    pub end: f64,
}

impl Window {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    fn check(&self, qid: &Qid) -> Result<(), EvalError> {
        let reason = if !self.start.is_finite() || !self.end.is_finite() {
            Some("bounds must be finite")
        } else if self.start > self.end {
            Some("start is after end")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(EvalError::InvalidWindow {
                qid: qid.to_string(),
                start: self.start,
                end: self.end,
                reason,
            }),
            None => Ok(()),
        }
    }
}

impl From<[f64; 2]> for Window {
    fn from([start, end]: [f64; 2]) -> Self {
        Self { start, end }
    }
}

impl From<Window> for [f64; 2] {
    fn from(window: Window) -> Self {
        [window.start, window.end]
    }
}

/// A predicted `[start, end, score]` interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct PredWindow {
    pub window: Window,
    pub score: f64,
}

impl PredWindow {
    pub fn new(start: f64, end: f64, score: f64) -> Self {
        Self {
            window: Window::new(start, end),
            score,
        }
    }
}

impl From<[f64; 3]> for PredWindow {
    fn from([start, end, score]: [f64; 3]) -> Self {
        Self::new(start, end, score)
    }
}

impl From<PredWindow> for [f64; 3] {
    fn from(pred: PredWindow) -> Self {
        [pred.window.start, pred.window.end, pred.score]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub qid: Qid,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub vid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_id: Option<TrackId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pred_relevant_windows: Option<Vec<PredWindow>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pred_saliency_scores: Option<Vec<f64>>,
}

impl SubmissionRecord {
    pub fn validate(&self) -> Result<(), EvalError> {
        for pred in self.pred_relevant_windows.iter().flatten() {
            pred.window.check(&self.qid)?;
            if !pred.score.is_finite() {
                return Err(EvalError::InvalidWindow {
                    qid: self.qid.to_string(),
                    start: pred.window.start,
                    end: pred.window.end,
                    reason: "score must be finite",
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTruthRecord {
    pub qid: Qid,
    #[serde(default)]
    pub query: String,
    pub duration: f64,
    #[serde(default)]
    pub vid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_id: Option<TrackId>,
    pub relevant_windows: Vec<Window>,
    #[serde(default)]
    pub relevant_clip_ids: Vec<usize>,
    #[serde(default)]
    pub saliency_scores: Vec<[f64; ANNOTATOR_COUNT]>,
}

impl GroundTruthRecord {
    pub fn validate(&self) -> Result<(), EvalError> {
        for window in &self.relevant_windows {
            window.check(&self.qid)?;
        }
        if self.relevant_clip_ids.len() != self.saliency_scores.len() {
            return Err(EvalError::SaliencyLengthMismatch {
                qid: self.qid.to_string(),
                clip_ids: self.relevant_clip_ids.len(),
                scores: self.saliency_scores.len(),
            });
        }
        Ok(())
    }
}

/// Per-frame-time slot table: `(frame_time, [slot -> global index])`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSlots(pub i64, pub Vec<usize>);

/// Identity evidence emitted by the spatial tracking evaluator for one sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityAssignmentRecord {
    pub seq: String,
    pub unique_gt_ids: Vec<TrackId>,
    pub unique_tracker_ids: Vec<TrackId>,
    pub gt_ids_t_list: Vec<FrameSlots>,
    pub tracker_ids_t_list: Vec<FrameSlots>,
    pub alpha_match_rows_list: Vec<FrameSlots>,
    pub alpha_match_cols_list: Vec<FrameSlots>,
}
