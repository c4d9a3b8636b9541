use thiserror::Error;

/// Data-validation failures raised while loading or scoring records.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("qid {qid}: invalid window [{start}, {end}]: {reason}")]
    InvalidWindow {
        qid: String,
        start: f64,
        end: f64,
        reason: &'static str,
    },

    #[error("duplicate ground-truth qid: {0}")]
    DuplicateQid(String),

    #[error(
        "qid {qid}: relevant_clip_ids has {clip_ids} entries but saliency_scores has {scores}"
    )]
    SaliencyLengthMismatch {
        qid: String,
        clip_ids: usize,
        scores: usize,
    },

    #[error(
        "qids in ground truth and submission must match ({stage}): {missing_in_submission} missing from submission (e.g. {missing_sample:?}), {missing_in_ground_truth} missing from ground truth (e.g. {extra_sample:?}); use the lenient policy to disable this check"
    )]
    QidSetMismatch {
        stage: &'static str,
        missing_in_submission: usize,
        missing_in_ground_truth: usize,
        missing_sample: Vec<String>,
        extra_sample: Vec<String>,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
