use std::collections::BTreeSet;

use serde::Serialize;
use tracing::info;

use crate::cli::MatchPolicy;
use crate::error::EvalError;
use crate::model::{GroundTruthRecord, Qid, SubmissionRecord};

const MISMATCH_SAMPLE_LEN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchCounts {
    pub ground_truth: usize,
    pub submission: usize,
}

/// Aligns both collections on their qid sets.
///
/// `Strict` fails unless the sets are equal; `Lenient` keeps only the
/// shared qids. Record order within each collection is preserved.
pub fn match_qids(
    submission: Vec<SubmissionRecord>,
    ground_truth: Vec<GroundTruthRecord>,
    policy: MatchPolicy,
    stage: &'static str,
) -> Result<(Vec<SubmissionRecord>, Vec<GroundTruthRecord>, MatchCounts), EvalError> {
    let pred_qids = submission
        .iter()
        .map(|record| &record.qid)
        .collect::<BTreeSet<&Qid>>();
    let gt_qids = ground_truth
        .iter()
        .map(|record| &record.qid)
        .collect::<BTreeSet<&Qid>>();

    let (submission, ground_truth) = match policy {
        MatchPolicy::Strict => {
            if pred_qids != gt_qids {
                let missing = gt_qids.difference(&pred_qids).collect::<Vec<_>>();
                let extra = pred_qids.difference(&gt_qids).collect::<Vec<_>>();
                return Err(EvalError::QidSetMismatch {
                    stage,
                    missing_in_submission: missing.len(),
                    missing_in_ground_truth: extra.len(),
                    missing_sample: missing
                        .iter()
                        .take(MISMATCH_SAMPLE_LEN)
                        .map(|qid| qid.to_string())
                        .collect(),
                    extra_sample: extra
                        .iter()
                        .take(MISMATCH_SAMPLE_LEN)
                        .map(|qid| qid.to_string())
                        .collect(),
                });
            }
            (submission, ground_truth)
        }
        MatchPolicy::Lenient => {
            let shared = pred_qids
                .intersection(&gt_qids)
                .map(|qid| (*qid).clone())
                .collect::<BTreeSet<Qid>>();
            (
                submission
                    .into_iter()
                    .filter(|record| shared.contains(&record.qid))
                    .collect::<Vec<_>>(),
                ground_truth
                    .into_iter()
                    .filter(|record| shared.contains(&record.qid))
                    .collect::<Vec<_>>(),
            )
        }
    };

    let counts = MatchCounts {
        ground_truth: ground_truth.len(),
        submission: submission.len(),
    };
    info!(
        stage,
        policy = policy.as_str(),
        ground_truth = counts.ground_truth,
        submission = counts.submission,
        "qid matching done"
    );
    Ok((submission, ground_truth, counts))
}
