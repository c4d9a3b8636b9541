use std::collections::{BTreeMap, HashMap};
use std::fmt;

use tracing::{debug, warn};

use crate::model::{
    FrameSlots, GroundTruthRecord, IdentityAssignmentRecord, SubmissionRecord, TrackId,
};

/// Lower-cases the query text and joins its words with hyphens.
pub fn normalize_query(query: &str) -> String {
    query.to_lowercase().replace(' ', "-")
}

/// Video name without the `_{start}_{end}` suffix.
pub fn video_base_name(vid: &str) -> &str {
    vid.split('_').next().unwrap_or(vid)
}

pub fn sequence_key(vid: &str, query: &str) -> String {
    format!("{}+{}", video_base_name(vid), normalize_query(query))
}

/// Why a ground-truth query could not be paired with a predicted track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileMiss {
    UnknownSequence { seq: String },
    MissingTrackId { seq: String },
    TrackNotInSequence { seq: String, track_id: TrackId },
    NoAssignmentEvidence { seq: String, track_id: TrackId },
    TrackerIndexOutOfRange { seq: String, index: usize, len: usize },
    NoSubmissionEntry { seq: String, tracker_id: TrackId },
}

impl ReconcileMiss {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownSequence { .. } => "unknown_sequence",
            Self::MissingTrackId { .. } => "missing_track_id",
            Self::TrackNotInSequence { .. } => "track_not_in_sequence",
            Self::NoAssignmentEvidence { .. } => "no_assignment_evidence",
            Self::TrackerIndexOutOfRange { .. } => "tracker_index_out_of_range",
            Self::NoSubmissionEntry { .. } => "no_submission_entry",
        }
    }
}

impl fmt::Display for ReconcileMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSequence { seq } => {
                write!(f, "{seq} not found in identity assignments")
            }
            Self::MissingTrackId { seq } => {
                write!(f, "ground truth for {seq} carries no track_id")
            }
            Self::TrackNotInSequence { seq, track_id } => {
                write!(f, "track_id {track_id} not found in ground truth ids of {seq}")
            }
            Self::NoAssignmentEvidence { seq, track_id } => {
                write!(f, "no matched frames for track_id {track_id} in {seq}")
            }
            Self::TrackerIndexOutOfRange { seq, index, len } => write!(
                f,
                "tracker index {index} out of bounds for {len} tracker ids in {seq}"
            ),
            Self::NoSubmissionEntry { seq, tracker_id } => {
                write!(f, "no submission entry for {seq} with track_id {tracker_id}")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    pub submission: Vec<SubmissionRecord>,
    pub resolved: usize,
    pub misses: BTreeMap<&'static str, usize>,
}

/// Maps ground-truth tracks to predicted tracks through per-frame
/// assignment evidence from the spatial evaluator.
#[derive(Debug, Default)]
pub struct IdentityReconciler {
    by_sequence: HashMap<String, IdentityAssignmentRecord>,
}

fn first_by_time(entries: &[FrameSlots]) -> HashMap<i64, &[usize]> {
    let mut out = HashMap::with_capacity(entries.len());
    for FrameSlots(time, slots) in entries {
        out.entry(*time).or_insert(slots.as_slice());
    }
    out
}

/// Most frequent value; ties go to the value seen first.
fn majority_vote(votes: impl IntoIterator<Item = usize>) -> Option<usize> {
    let mut tally = Vec::<(usize, usize)>::new();
    let mut position = HashMap::<usize, usize>::new();
    for vote in votes {
        match position.get(&vote) {
            Some(index) => tally[*index].1 += 1,
            None => {
                position.insert(vote, tally.len());
                tally.push((vote, 1));
            }
        }
    }

    let mut best: Option<(usize, usize)> = None;
    for (value, count) in tally {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}

impl IdentityReconciler {
    /// Later records replace earlier ones with the same `seq`.
    pub fn new(records: Vec<IdentityAssignmentRecord>) -> Self {
        let by_sequence = records
            .into_iter()
            .map(|record| (record.seq.clone(), record))
            .collect();
        Self { by_sequence }
    }

    pub fn sequence_count(&self) -> usize {
        self.by_sequence.len()
    }

    pub fn resolve_tracker_id(&self, record: &GroundTruthRecord) -> Result<TrackId, ReconcileMiss> {
        let seq = sequence_key(&record.vid, &record.query);
        let Some(assignment) = self.by_sequence.get(&seq) else {
            return Err(ReconcileMiss::UnknownSequence { seq });
        };
        let Some(track_id) = record.track_id.as_ref() else {
            return Err(ReconcileMiss::MissingTrackId { seq });
        };
        let Some(gt_index) = assignment
            .unique_gt_ids
            .iter()
            .position(|candidate| candidate == track_id)
        else {
            return Err(ReconcileMiss::TrackNotInSequence {
                seq,
                track_id: track_id.clone(),
            });
        };

        // Row slots holding this track, per frame time.
        let mut gt_slots = HashMap::<i64, Vec<usize>>::new();
        for FrameSlots(time, ids) in &assignment.gt_ids_t_list {
            if gt_slots.contains_key(time) {
                continue;
            }
            let slots = ids
                .iter()
                .enumerate()
                .filter(|(_, id)| **id == gt_index)
                .map(|(slot, _)| slot)
                .collect::<Vec<usize>>();
            if !slots.is_empty() {
                gt_slots.insert(*time, slots);
            }
        }

        let matched_cols = first_by_time(&assignment.alpha_match_cols_list);
        let tracker_slots = first_by_time(&assignment.tracker_ids_t_list);

        let mut votes = Vec::new();
        for FrameSlots(time, rows) in &assignment.alpha_match_rows_list {
            let Some(slots) = gt_slots.get(time) else {
                continue;
            };
            let (Some(cols), Some(tracker_ids)) = (matched_cols.get(time), tracker_slots.get(time))
            else {
                continue;
            };
            for (pair, row) in rows.iter().enumerate() {
                if !slots.contains(row) {
                    continue;
                }
                if let Some(tracker_index) = cols.get(pair).and_then(|col| tracker_ids.get(*col)) {
                    votes.push(*tracker_index);
                }
            }
        }

        let Some(best) = majority_vote(votes) else {
            return Err(ReconcileMiss::NoAssignmentEvidence {
                seq,
                track_id: track_id.clone(),
            });
        };
        assignment
            .unique_tracker_ids
            .get(best)
            .cloned()
            .ok_or(ReconcileMiss::TrackerIndexOutOfRange {
                seq,
                index: best,
                len: assignment.unique_tracker_ids.len(),
            })
    }

    /// Replaces the submission with one entry per resolvable ground-truth query.
    pub fn resolve(
        &self,
        submission: &[SubmissionRecord],
        ground_truth: &[GroundTruthRecord],
        verbose: bool,
    ) -> ReconcileOutcome {
        let mut by_track = HashMap::<(String, TrackId), &SubmissionRecord>::new();
        for record in submission {
            if let Some(track_id) = record.track_id.as_ref() {
                by_track
                    .entry((sequence_key(&record.vid, &record.query), track_id.clone()))
                    .or_insert(record);
            }
        }

        let mut kept = Vec::with_capacity(ground_truth.len());
        let mut misses = BTreeMap::<&'static str, usize>::new();
        for record in ground_truth {
            let outcome = self.resolve_tracker_id(record).and_then(|tracker_id| {
                let key = (sequence_key(&record.vid, &record.query), tracker_id);
                match by_track.get(&key) {
                    Some(entry) => Ok(*entry),
                    None => Err(ReconcileMiss::NoSubmissionEntry {
                        seq: key.0,
                        tracker_id: key.1,
                    }),
                }
            });

            match outcome {
                Ok(entry) => kept.push(entry.clone()),
                Err(miss) => {
                    if verbose {
                        warn!(qid = %record.qid, reason = miss.kind(), "{miss}");
                    } else {
                        debug!(qid = %record.qid, reason = miss.kind(), "{miss}");
                    }
                    *misses.entry(miss.kind()).or_default() += 1;
                }
            }
        }

        ReconcileOutcome {
            resolved: kept.len(),
            submission: kept,
            misses,
        }
    }
}
