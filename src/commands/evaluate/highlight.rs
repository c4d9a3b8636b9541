use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::average_precision::binary_average_precision;
use super::config::{EvalConfig, SaliencyLevel};
use super::moment_retrieval::percent;
use super::pool::WorkerPool;
use crate::model::{ANNOTATOR_COUNT, GroundTruthRecord, Qid, SubmissionRecord, Window};

pub type ClipScores = Vec<[f64; ANNOTATOR_COUNT]>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighlightScores {
    pub hit_at_one: f64,
    pub mean_ap: f64,
}

struct HighlightUnit<'a> {
    qid: &'a Qid,
    annotator: usize,
    labels: Vec<f64>,
    scores: &'a [f64],
}

pub fn clip_count(duration: f64, clip_length: f64) -> usize {
    (duration / clip_length).floor().max(0.0) as usize
}

/// Dense `[clip_count, annotators]` ratings, zero outside the relevant clips.
pub fn dense_saliency(record: &GroundTruthRecord, clip_length: f64) -> ClipScores {
    let mut dense = vec![[0.0; ANNOTATOR_COUNT]; clip_count(record.duration, clip_length)];
    for (clip_id, scores) in record.relevant_clip_ids.iter().zip(&record.saliency_scores) {
        match dense.get_mut(*clip_id) {
            Some(row) => *row = *scores,
            None => warn!(
                qid = %record.qid,
                clip_id = *clip_id,
                clip_count = dense.len(),
                "relevant clip id outside video duration; dropped"
            ),
        }
    }
    dense
}

pub fn binarize(dense: &[[f64; ANNOTATOR_COUNT]], min_score: f64) -> ClipScores {
    dense
        .iter()
        .map(|row| row.map(|value| if value >= min_score { 1.0 } else { 0.0 }))
        .collect()
}

/// Indices of clips overlapping any window, sorted and deduplicated.
pub fn relevant_clip_ids_from_windows(windows: &[Window], clip_length: f64) -> Vec<usize> {
    let mut clip_ids = windows
        .iter()
        .flat_map(|window| {
            let first = (window.start / clip_length).floor().max(0.0) as usize;
            let end = (window.end / clip_length).ceil().max(0.0) as usize;
            first..end
        })
        .collect::<Vec<usize>>();
    clip_ids.sort_unstable();
    clip_ids.dedup();
    clip_ids
}

/// Clips with any non-zero rating.
pub fn relevant_clip_ids_from_dense(dense: &[[f64; ANNOTATOR_COUNT]]) -> Vec<usize> {
    dense
        .iter()
        .enumerate()
        .filter(|(_, row)| row.iter().sum::<f64>() > 0.0)
        .map(|(clip_id, _)| clip_id)
        .collect()
}

/// Truncates or zero-pads predicted clip scores to the label length.
///
/// Prediction and ground truth disagree on clip count whenever a producer
/// rounds the video duration differently. The longer side is cut and the
/// shorter side gets zeros, so a missing tail never counts as a hit.
pub fn align_scores(scores: &[f64], len: usize) -> Vec<f64> {
    let mut aligned = scores.iter().take(len).copied().collect::<Vec<f64>>();
    aligned.resize(len, 0.0);
    aligned
}

/// First index of the maximum score.
fn arg_max(scores: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, score) in scores.iter().enumerate() {
        if best.is_none_or(|(_, value)| *score > value) {
            best = Some((index, *score));
        }
    }
    best.map(|(index, _)| index)
}

pub fn compute_hit_at_one(
    ground_truth: &[GroundTruthRecord],
    predicted: &HashMap<&Qid, &[f64]>,
    binary: &HashMap<&Qid, ClipScores>,
) -> f64 {
    if ground_truth.is_empty() {
        return 0.0;
    }

    let hits = ground_truth
        .iter()
        .filter(|record| {
            let (Some(scores), Some(labels)) = (predicted.get(&record.qid), binary.get(&record.qid))
            else {
                return false;
            };
            // Scores past the last labelled clip are cut before ranking.
            let scored = &scores[..scores.len().min(labels.len())];
            arg_max(scored)
                .and_then(|clip| labels.get(clip))
                .is_some_and(|row| row.iter().any(|label| *label > 0.0))
        })
        .count();
    hits as f64 / ground_truth.len() as f64
}

pub fn compute_highlight_ap(
    ground_truth: &[GroundTruthRecord],
    predicted: &HashMap<&Qid, &[f64]>,
    binary: &HashMap<&Qid, ClipScores>,
    pool: &WorkerPool,
) -> Result<f64> {
    let mut units = Vec::with_capacity(ground_truth.len() * ANNOTATOR_COUNT);
    for record in ground_truth {
        let scores = predicted.get(&record.qid).copied().unwrap_or(&[]);
        let labels = binary.get(&record.qid).map(Vec::as_slice).unwrap_or(&[]);
        for annotator in 0..ANNOTATOR_COUNT {
            units.push(HighlightUnit {
                qid: &record.qid,
                annotator,
                labels: labels.iter().map(|row| row[annotator]).collect(),
                scores,
            });
        }
    }

    let unit_to_ap = pool.map_keyed(&units, |unit| {
        let scores = align_scores(unit.scores, unit.labels.len());
        (
            (unit.qid, unit.annotator),
            binary_average_precision(&unit.labels, &scores),
        )
    })?;

    if units.is_empty() {
        return Ok(0.0);
    }
    let mut total = 0.0;
    for record in ground_truth {
        for annotator in 0..ANNOTATOR_COUNT {
            total += unit_to_ap
                .get(&(&record.qid, annotator))
                .copied()
                .unwrap_or(0.0);
        }
    }
    Ok(total / units.len() as f64)
}

pub fn compute_highlight_scores(
    submission: &[SubmissionRecord],
    ground_truth: &[GroundTruthRecord],
    level: &SaliencyLevel,
    clip_length: f64,
    pool: &WorkerPool,
) -> Result<HighlightScores> {
    let mut predicted = HashMap::<&Qid, &[f64]>::with_capacity(submission.len());
    for record in submission {
        if let Some(scores) = record.pred_saliency_scores.as_deref() {
            predicted.entry(&record.qid).or_insert(scores);
        }
    }
    let binary = ground_truth
        .iter()
        .map(|record| {
            (
                &record.qid,
                binarize(&dense_saliency(record, clip_length), level.min_score),
            )
        })
        .collect::<HashMap<&Qid, ClipScores>>();

    let unlabeled = binary
        .values()
        .filter(|labels| relevant_clip_ids_from_dense(labels).is_empty())
        .count();
    if unlabeled > 0 {
        debug!(
            level = %level.name,
            queries = unlabeled,
            "queries without relevant clips at this saliency level"
        );
    }

    Ok(HighlightScores {
        hit_at_one: compute_hit_at_one(ground_truth, &predicted, &binary),
        mean_ap: compute_highlight_ap(ground_truth, &predicted, &binary, pool)?,
    })
}

/// One `HL-min-{level}` family per saliency level.
pub fn evaluate_highlight(
    submission: &[SubmissionRecord],
    ground_truth: &[GroundTruthRecord],
    config: &EvalConfig,
    pool: &WorkerPool,
) -> Result<BTreeMap<String, Value>> {
    let mut families = BTreeMap::new();
    for level in &config.saliency_levels {
        let scores =
            compute_highlight_scores(submission, ground_truth, level, config.clip_length, pool)?;
        families.insert(
            format!("HL-min-{}", level.name),
            json!({
                "HL-mAP": percent(scores.mean_ap),
                "HL-Hit1": percent(scores.hit_at_one),
            }),
        );
    }
    Ok(families)
}
