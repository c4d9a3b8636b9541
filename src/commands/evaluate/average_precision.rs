use super::interval::temporal_iou;
use crate::model::{PredWindow, Window};

/// Detection-style AP for one query, one value per IoU threshold.
///
/// Predictions are ranked by descending score (stable for ties). At each
/// threshold every prediction claims the highest-IoU ground-truth window
/// that is still unclaimed and clears the threshold; anything else is a
/// false positive. A query without predictions or without ground truth
/// scores zero everywhere.
pub fn detection_average_precision(
    ground_truth: &[Window],
    predictions: &[PredWindow],
    thresholds: &[f64],
) -> Vec<f64> {
    let mut ap = vec![0.0; thresholds.len()];
    if predictions.is_empty() || ground_truth.is_empty() {
        return ap;
    }

    let mut ranked = predictions.to_vec();
    ranked.sort_by(|left, right| right.score.total_cmp(&left.score));

    let num_preds = ranked.len();
    let mut locked = vec![vec![false; ground_truth.len()]; thresholds.len()];
    let mut tp = vec![vec![0.0_f64; num_preds]; thresholds.len()];
    let mut fp = vec![vec![0.0_f64; num_preds]; thresholds.len()];

    for (pred_idx, pred) in ranked.iter().enumerate() {
        let ious = ground_truth
            .iter()
            .map(|gt| temporal_iou(&pred.window, gt))
            .collect::<Vec<f64>>();
        let mut order = (0..ground_truth.len()).collect::<Vec<usize>>();
        order.sort_by(|left, right| ious[*right].total_cmp(&ious[*left]));

        for (t_idx, threshold) in thresholds.iter().enumerate() {
            let mut matched = false;
            for gt_idx in &order {
                if ious[*gt_idx] < *threshold {
                    break;
                }
                if locked[t_idx][*gt_idx] {
                    continue;
                }
                locked[t_idx][*gt_idx] = true;
                matched = true;
                break;
            }
            if matched {
                tp[t_idx][pred_idx] = 1.0;
            } else {
                fp[t_idx][pred_idx] = 1.0;
            }
        }
    }

    let num_positive = ground_truth.len() as f64;
    for t_idx in 0..thresholds.len() {
        let mut tp_cumsum = 0.0;
        let mut fp_cumsum = 0.0;
        let mut precision = Vec::with_capacity(num_preds);
        let mut recall = Vec::with_capacity(num_preds);
        for pred_idx in 0..num_preds {
            tp_cumsum += tp[t_idx][pred_idx];
            fp_cumsum += fp[t_idx][pred_idx];
            precision.push(tp_cumsum / (tp_cumsum + fp_cumsum));
            recall.push(tp_cumsum / num_positive);
        }
        ap[t_idx] = interpolated_precision_recall(&precision, &recall);
    }

    ap
}

/// Area under the monotone precision envelope, sampled where recall changes.
fn interpolated_precision_recall(precision: &[f64], recall: &[f64]) -> f64 {
    let mut mprecision = Vec::with_capacity(precision.len() + 2);
    mprecision.push(0.0);
    mprecision.extend_from_slice(precision);
    mprecision.push(0.0);

    let mut mrecall = Vec::with_capacity(recall.len() + 2);
    mrecall.push(0.0);
    mrecall.extend_from_slice(recall);
    mrecall.push(1.0);

    for index in (0..mprecision.len() - 1).rev() {
        mprecision[index] = mprecision[index].max(mprecision[index + 1]);
    }

    (1..mrecall.len())
        .filter(|index| mrecall[*index] != mrecall[index - 1])
        .map(|index| (mrecall[index] - mrecall[index - 1]) * mprecision[index])
        .sum()
}

/// AP of a score ranking against binary labels.
///
/// All-negative labels score 0 and all-positive labels score 1. Otherwise
/// the precision/recall curve is built from distinct score thresholds,
/// precision is made monotone towards lower recall, and the mean precision
/// at the points where recall changes is returned.
pub fn binary_average_precision(labels: &[f64], scores: &[f64]) -> f64 {
    debug_assert_eq!(labels.len(), scores.len(), "labels and scores must align");
    let total_positive = labels.iter().filter(|label| **label > 0.0).count();
    if labels.is_empty() || total_positive == 0 {
        return 0.0;
    }
    if total_positive == labels.len() {
        return 1.0;
    }

    let mut order = (0..scores.len()).collect::<Vec<usize>>();
    order.sort_by(|left, right| scores[*right].total_cmp(&scores[*left]));

    // Curve points from the highest threshold down.
    let mut points = Vec::<(f64, f64)>::new();
    let mut true_positive = 0usize;
    for (rank, index) in order.iter().enumerate() {
        if labels[*index] > 0.0 {
            true_positive += 1;
        }
        let is_last_of_tie = order
            .get(rank + 1)
            .is_none_or(|next| scores[*next] != scores[*index]);
        if is_last_of_tie {
            let predicted_positive = rank + 1;
            points.push((
                true_positive as f64 / predicted_positive as f64,
                true_positive as f64 / total_positive as f64,
            ));
        }
    }

    // Reorder by decreasing recall and close the curve at (precision 1, recall 0).
    let mut precision = points.iter().rev().map(|(p, _)| *p).collect::<Vec<f64>>();
    let mut recall = points.iter().rev().map(|(_, r)| *r).collect::<Vec<f64>>();
    precision.push(1.0);
    recall.push(0.0);

    for index in 1..precision.len() {
        precision[index] = precision[index].max(precision[index - 1]);
    }

    let sampled = (0..recall.len() - 1)
        .filter(|index| recall[*index + 1] != recall[*index])
        .map(|index| precision[index])
        .collect::<Vec<f64>>();
    if sampled.is_empty() {
        0.0
    } else {
        sampled.iter().sum::<f64>() / sampled.len() as f64
    }
}
