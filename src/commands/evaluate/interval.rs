use crate::model::Window;

/// Overlap length over union length; zero when the union is empty.
pub fn temporal_iou(lhs: &Window, rhs: &Window) -> f64 {
    let intersection = (lhs.end.min(rhs.end) - lhs.start.max(rhs.start)).max(0.0);
    let union = lhs.length() + rhs.length() - intersection;
    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

/// `lhs.len() x rhs.len()` matrix of pairwise IoU.
pub fn temporal_iou_cross(lhs: &[Window], rhs: &[Window]) -> Vec<Vec<f64>> {
    lhs.iter()
        .map(|left| rhs.iter().map(|right| temporal_iou(left, right)).collect())
        .collect()
}

/// Element-wise IoU of two equally long window sequences.
pub fn temporal_iou_paired(lhs: &[Window], rhs: &[Window]) -> Vec<f64> {
    debug_assert_eq!(lhs.len(), rhs.len(), "paired IoU needs equal lengths");
    lhs.iter()
        .zip(rhs)
        .map(|(left, right)| temporal_iou(left, right))
        .collect()
}
