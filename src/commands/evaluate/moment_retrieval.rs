use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use serde_json::{Value, json};

use super::average_precision::detection_average_precision;
use super::config::{EvalConfig, threshold_key};
use super::interval::{temporal_iou_cross, temporal_iou_paired};
use super::pool::WorkerPool;
use crate::model::{GroundTruthRecord, PredWindow, Qid, SubmissionRecord, Window};
use crate::util::round_to;

/// Mean AP per IoU threshold plus the mean across thresholds, in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApSummary {
    pub thresholds: Vec<f64>,
    pub per_threshold: Vec<f64>,
    pub average: f64,
}

impl ApSummary {
    pub fn to_percent_map(&self) -> BTreeMap<String, f64> {
        let mut out = self
            .thresholds
            .iter()
            .zip(&self.per_threshold)
            .map(|(threshold, value)| (threshold_key(*threshold), percent(*value)))
            .collect::<BTreeMap<String, f64>>();
        out.insert("average".to_string(), percent(self.average));
        out
    }
}

/// Recall@k per IoU threshold and the mean IoU of the selected pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct RecallAtK {
    pub k: usize,
    pub thresholds: Vec<f64>,
    pub recall: Vec<f64>,
    pub mean_iou: f64,
}

impl RecallAtK {
    pub fn to_percent_map(&self) -> BTreeMap<String, f64> {
        self.thresholds
            .iter()
            .zip(&self.recall)
            .map(|(threshold, value)| (threshold_key(*threshold), percent(*value)))
            .collect()
    }
}

struct ApUnit<'a> {
    qid: &'a Qid,
    ground_truth: Vec<Window>,
    predictions: Vec<PredWindow>,
}

pub fn percent(value: f64) -> f64 {
    round_to(100.0 * value, 2)
}

fn submission_by_qid(submission: &[SubmissionRecord]) -> HashMap<&Qid, &SubmissionRecord> {
    let mut out = HashMap::with_capacity(submission.len());
    for record in submission {
        out.entry(&record.qid).or_insert(record);
    }
    out
}

fn truncated<T: Clone>(values: &[T], limit: Option<usize>) -> Vec<T> {
    match limit {
        Some(limit) => values.iter().take(limit).cloned().collect(),
        None => values.to_vec(),
    }
}

/// Highest-scoring `k` predictions, ties kept in producer order.
fn top_k_by_score(predictions: &[PredWindow], k: usize) -> Vec<Window> {
    let mut ranked = predictions.to_vec();
    ranked.sort_by(|left, right| right.score.total_cmp(&left.score));
    ranked.into_iter().take(k).map(|pred| pred.window).collect()
}

pub fn compute_ap(
    submission: &[SubmissionRecord],
    ground_truth: &[GroundTruthRecord],
    thresholds: &[f64],
    max_gt_windows: Option<usize>,
    max_pred_windows: Option<usize>,
    pool: &WorkerPool,
) -> Result<ApSummary> {
    let predictions = submission_by_qid(submission);
    let units = ground_truth
        .iter()
        .map(|record| ApUnit {
            qid: &record.qid,
            ground_truth: truncated(&record.relevant_windows, max_gt_windows),
            predictions: predictions
                .get(&record.qid)
                .and_then(|sub| sub.pred_relevant_windows.as_deref())
                .map(|windows| truncated(windows, max_pred_windows))
                .unwrap_or_default(),
        })
        .collect::<Vec<ApUnit>>();

    let qid_to_ap = pool.map_keyed(&units, |unit| {
        (
            unit.qid,
            detection_average_precision(&unit.ground_truth, &unit.predictions, thresholds),
        )
    })?;

    let mut per_threshold = vec![0.0; thresholds.len()];
    if !ground_truth.is_empty() {
        for record in ground_truth {
            if let Some(scores) = qid_to_ap.get(&record.qid) {
                for (total, score) in per_threshold.iter_mut().zip(scores) {
                    *total += score;
                }
            }
        }
        for total in &mut per_threshold {
            *total /= ground_truth.len() as f64;
        }
    }
    let average = if per_threshold.is_empty() {
        0.0
    } else {
        per_threshold.iter().sum::<f64>() / per_threshold.len() as f64
    };

    Ok(ApSummary {
        thresholds: thresholds.to_vec(),
        per_threshold,
        average,
    })
}

pub fn compute_recall_at_k(
    k: usize,
    submission: &[SubmissionRecord],
    ground_truth: &[GroundTruthRecord],
    thresholds: &[f64],
) -> RecallAtK {
    let predictions = submission_by_qid(submission);
    let mut selected_pred = Vec::<Window>::new();
    let mut selected_gt = Vec::<Window>::new();
    let mut missing = 0usize;

    for record in ground_truth {
        let candidates = predictions
            .get(&record.qid)
            .and_then(|sub| sub.pred_relevant_windows.as_deref())
            .map(|windows| top_k_by_score(windows, k))
            .unwrap_or_default();
        if candidates.is_empty() || record.relevant_windows.is_empty() {
            missing += 1;
            continue;
        }

        // First maximum in row-major order.
        let ious = temporal_iou_cross(&candidates, &record.relevant_windows);
        let mut best = (0usize, 0usize);
        let mut best_iou = f64::NEG_INFINITY;
        for (pred_idx, row) in ious.iter().enumerate() {
            for (gt_idx, iou) in row.iter().enumerate() {
                if *iou > best_iou {
                    best_iou = *iou;
                    best = (pred_idx, gt_idx);
                }
            }
        }
        selected_pred.push(candidates[best.0]);
        selected_gt.push(record.relevant_windows[best.1]);
    }

    let mut ious = temporal_iou_paired(&selected_pred, &selected_gt);
    ious.extend(std::iter::repeat_n(0.0, missing));

    let query_count = ious.len();
    let mean_iou = if query_count == 0 {
        0.0
    } else {
        ious.iter().sum::<f64>() / query_count as f64
    };
    let recall = thresholds
        .iter()
        .map(|threshold| {
            if query_count == 0 {
                0.0
            } else {
                ious.iter().filter(|iou| **iou >= *threshold).count() as f64 / query_count as f64
            }
        })
        .collect();

    RecallAtK {
        k,
        thresholds: thresholds.to_vec(),
        recall,
        mean_iou,
    }
}

/// Keeps ground-truth windows whose length lies in `(min, max]`, drops
/// queries left without windows and the predictions of dropped queries.
pub fn restrict_by_duration_range(
    submission: &[SubmissionRecord],
    ground_truth: &[GroundTruthRecord],
    min: f64,
    max: f64,
) -> (Vec<SubmissionRecord>, Vec<GroundTruthRecord>) {
    let ground_truth_in_range = ground_truth
        .iter()
        .filter_map(|record| {
            let windows = record
                .relevant_windows
                .iter()
                .filter(|window| min < window.length() && window.length() <= max)
                .copied()
                .collect::<Vec<Window>>();
            if windows.is_empty() {
                return None;
            }
            let mut record = record.clone();
            record.relevant_windows = windows;
            Some(record)
        })
        .collect::<Vec<GroundTruthRecord>>();

    let kept = ground_truth_in_range
        .iter()
        .map(|record| &record.qid)
        .collect::<std::collections::HashSet<&Qid>>();
    let submission_in_range = submission
        .iter()
        .filter(|record| kept.contains(&record.qid))
        .cloned()
        .collect();

    (submission_in_range, ground_truth_in_range)
}

/// All moment-retrieval numbers for one query set, as a report family.
pub fn evaluate_moment_retrieval(
    submission: &[SubmissionRecord],
    ground_truth: &[GroundTruthRecord],
    config: &EvalConfig,
    pool: &WorkerPool,
) -> Result<Value> {
    let thresholds = &config.iou_thresholds;
    let ap = compute_ap(
        submission,
        ground_truth,
        thresholds,
        config.max_gt_windows,
        config.max_pred_windows,
        pool,
    )?;

    let mut family = serde_json::Map::new();
    family.insert("MR-mAP".to_string(), json!(ap.to_percent_map()));
    for k in &config.recall_ks {
        let recall = compute_recall_at_k(*k, submission, ground_truth, thresholds);
        family.insert(format!("MR-R{}", recall.k), json!(recall.to_percent_map()));
        let miou_key = if recall.k == 1 {
            "MR-mIoU".to_string()
        } else {
            format!("MR-mIoU@{}", recall.k)
        };
        family.insert(miou_key, json!(percent(recall.mean_iou)));
    }

    Ok(Value::Object(family))
}
