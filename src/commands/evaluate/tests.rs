use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::{Value, json};

use super::config::{EvalConfig, default_length_ranges, linspace};
use super::highlight::{
    dense_saliency, relevant_clip_ids_from_dense, relevant_clip_ids_from_windows,
};
use super::identity::{IdentityReconciler, ReconcileMiss, sequence_key};
use super::moment_retrieval::{compute_ap, compute_recall_at_k};
use super::pool::WorkerPool;
use super::run::{evaluate_submission, load_ground_truth, load_submission, validate_ground_truth};
use crate::cli::{EvaluateArgs, MatchPolicy};
use crate::error::EvalError;
use crate::model::{
    FrameSlots, GroundTruthRecord, IdentityAssignmentRecord, SubmissionRecord, TrackId, Window,
};

const VID: &str = "abc123_1.0_30.0";
const QUERY: &str = "A man walking";

fn submission(value: Value) -> SubmissionRecord {
    serde_json::from_value(value).expect("submission fixture should deserialize")
}

fn ground_truth(value: Value) -> GroundTruthRecord {
    serde_json::from_value(value).expect("ground truth fixture should deserialize")
}

fn slot(time: i64, ids: &[usize]) -> FrameSlots {
    FrameSlots(time, ids.to_vec())
}

fn saliency_peak_at(first: usize, clips: usize) -> Vec<f64> {
    (0..clips)
        .map(|clip| {
            if (first..first + 3).contains(&clip) {
                0.9 - 0.1 * (clip - first) as f64
            } else {
                0.0
            }
        })
        .collect()
}

fn scenario_ground_truth() -> GroundTruthRecord {
    ground_truth(json!({
        "qid": 1,
        "query": QUERY,
        "vid": VID,
        "duration": 30,
        "track_id": 0,
        "relevant_windows": [[12, 18]],
        "relevant_clip_ids": [6, 7, 8],
        "saliency_scores": [[4, 4, 4], [4, 4, 4], [4, 4, 4]]
    }))
}

/// Track 5 is the good candidate, track 9 points elsewhere.
fn scenario_submission() -> Vec<SubmissionRecord> {
    vec![
        submission(json!({
            "qid": 1,
            "query": QUERY,
            "vid": VID,
            "track_id": 9,
            "pred_relevant_windows": [[0, 2, 0.9]],
            "pred_saliency_scores": saliency_peak_at(0, 15)
        })),
        submission(json!({
            "qid": 1,
            "query": QUERY,
            "vid": VID,
            "track_id": 5,
            "pred_relevant_windows": [[10, 20, 0.9], [0, 5, 0.1]],
            "pred_saliency_scores": saliency_peak_at(6, 15)
        })),
    ]
}

/// Ground-truth track 0 is paired with tracker 5 on two frames and
/// tracker 9 on one.
fn scenario_assignment() -> IdentityAssignmentRecord {
    IdentityAssignmentRecord {
        seq: sequence_key(VID, QUERY),
        unique_gt_ids: vec![TrackId::from(0)],
        unique_tracker_ids: vec![TrackId::from(5), TrackId::from(9)],
        gt_ids_t_list: vec![slot(1, &[0]), slot(2, &[0]), slot(3, &[0])],
        tracker_ids_t_list: vec![slot(1, &[0, 1]), slot(2, &[0, 1]), slot(3, &[1])],
        alpha_match_rows_list: vec![slot(1, &[0]), slot(2, &[0]), slot(3, &[0])],
        alpha_match_cols_list: vec![slot(1, &[0]), slot(2, &[0]), slot(3, &[0])],
    }
}

fn pool(workers: usize, chunk_size: usize) -> WorkerPool {
    WorkerPool::new(workers, chunk_size).expect("pool should start")
}

fn sequential_config() -> EvalConfig {
    EvalConfig {
        num_workers: 1,
        ..EvalConfig::default()
    }
}

#[test]
fn sequence_key_uses_video_base_name_and_hyphenated_query() {
    assert_eq!(sequence_key(VID, QUERY), "abc123+a-man-walking");
    assert_eq!(sequence_key("plain", "Two Dogs"), "plain+two-dogs");
}

#[test]
fn end_to_end_single_query_reports_one_ranked_true_positive() {
    let reconciler = IdentityReconciler::new(vec![scenario_assignment()]);
    let outcome = evaluate_submission(
        scenario_submission(),
        vec![scenario_ground_truth()],
        &reconciler,
        &sequential_config(),
    )
    .expect("evaluation should succeed");

    let brief = &outcome.report.brief;
    assert_eq!(brief["MR-full-mAP@0.5"], 100.0);
    assert_eq!(brief["MR-full-mAP@0.7"], 0.0);
    assert_eq!(brief["MR-full-R1@0.5"], 100.0);
    assert_eq!(brief["MR-full-R1@0.7"], 0.0);
    assert_eq!(brief["MR-full-mIoU"], 60.0);
    assert_eq!(brief["HL-min-Fair-Hit1"], 100.0);
    assert_eq!(brief["HL-min-VeryGood-mAP"], 100.0);

    let full = &outcome.report.detail["full"];
    assert_eq!(full["MR-mAP"]["0.5"], json!(100.0));
    assert_eq!(full["MR-mAP"]["0.6"], json!(100.0));
    assert_eq!(full["MR-mAP"]["0.65"], json!(0.0));
    assert!(full.get("MR-mIoU@5").is_some());

    assert_eq!(outcome.matching.reconciled, 1);
    assert_eq!(outcome.matching.first_matching.submission, 2);
    assert_eq!(outcome.matching.second_matching.submission, 1);
    assert_eq!(outcome.matching.second_matching.ground_truth, 1);
}

#[test]
fn report_serializes_brief_first_with_sorted_keys() {
    let reconciler = IdentityReconciler::new(vec![scenario_assignment()]);
    let outcome = evaluate_submission(
        scenario_submission(),
        vec![scenario_ground_truth()],
        &reconciler,
        &sequential_config(),
    )
    .expect("evaluation should succeed");

    let text = serde_json::to_string_pretty(&outcome.report).expect("report should serialize");
    assert!(text.starts_with("{\n  \"brief\""), "unexpected head: {text}");

    let keys = outcome.report.brief.keys().cloned().collect::<Vec<String>>();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);

    let value: Value = serde_json::from_str(&text).expect("report should parse");
    assert!(value.get("full").is_some());
    assert!(value.get("HL-min-Good").is_some());
    assert_eq!(value["matching"]["first_matching"]["ground_truth"], json!(1));
}

#[test]
fn majority_vote_picks_tracker_with_most_matched_frames() {
    let record = IdentityAssignmentRecord {
        seq: sequence_key(VID, QUERY),
        unique_gt_ids: vec![TrackId::from("person-1")],
        unique_tracker_ids: vec![TrackId::from("T3"), TrackId::from("T7")],
        gt_ids_t_list: vec![
            slot(1, &[0]),
            slot(2, &[0]),
            slot(3, &[0]),
            slot(4, &[0]),
            slot(5, &[0]),
        ],
        tracker_ids_t_list: vec![
            slot(1, &[0, 1]),
            slot(2, &[0, 1]),
            slot(3, &[0, 1]),
            slot(4, &[0, 1]),
            slot(5, &[0, 1]),
        ],
        alpha_match_rows_list: vec![
            slot(1, &[0]),
            slot(2, &[0]),
            slot(3, &[0]),
            slot(4, &[0]),
            slot(5, &[0]),
        ],
        alpha_match_cols_list: vec![
            slot(1, &[0]),
            slot(2, &[1]),
            slot(3, &[1]),
            slot(4, &[1]),
            slot(5, &[1]),
        ],
    };
    let reconciler = IdentityReconciler::new(vec![record]);
    let mut gt = scenario_ground_truth();
    gt.track_id = Some(TrackId::from("person-1"));

    let resolved = reconciler
        .resolve_tracker_id(&gt)
        .expect("tracker should resolve");
    assert_eq!(resolved, TrackId::from("T7"));
}

#[test]
fn majority_vote_tie_goes_to_first_seen_tracker() {
    let mut record = scenario_assignment();
    record.tracker_ids_t_list = vec![slot(1, &[1, 0]), slot(2, &[0, 1]), slot(3, &[1])];
    record.alpha_match_rows_list = vec![slot(1, &[0]), slot(2, &[0])];
    record.alpha_match_cols_list = vec![slot(1, &[0]), slot(2, &[0])];
    let reconciler = IdentityReconciler::new(vec![record]);

    let resolved = reconciler
        .resolve_tracker_id(&scenario_ground_truth())
        .expect("tracker should resolve");
    assert_eq!(resolved, TrackId::from(9));
}

#[test]
fn unresolvable_queries_are_counted_and_dropped() {
    let mut unknown_sequence = scenario_ground_truth();
    unknown_sequence.qid = 2.into();
    unknown_sequence.vid = "zzz_1.0_30.0".to_string();

    let mut unknown_track = scenario_ground_truth();
    unknown_track.qid = 3.into();
    unknown_track.track_id = Some(TrackId::from(42));

    let mut submission_records = scenario_submission();
    for qid in [2, 3] {
        let mut extra = submission_records[1].clone();
        extra.qid = qid.into();
        submission_records.push(extra);
    }

    let reconciler = IdentityReconciler::new(vec![scenario_assignment()]);
    let outcome = evaluate_submission(
        submission_records,
        vec![scenario_ground_truth(), unknown_sequence, unknown_track],
        &reconciler,
        &sequential_config(),
    )
    .expect("lenient evaluation should succeed");

    let misses = &outcome.matching.reconcile_misses;
    assert_eq!(misses.get("unknown_sequence"), Some(&1));
    assert_eq!(misses.get("track_not_in_sequence"), Some(&1));
    assert_eq!(outcome.matching.first_matching.ground_truth, 3);
    assert_eq!(outcome.matching.second_matching.ground_truth, 1);
    assert_eq!(outcome.report.brief["MR-full-mAP@0.5"], 100.0);
}

#[test]
fn missing_submission_entry_for_resolved_tracker_is_a_miss() {
    let mut records = scenario_submission();
    records.retain(|record| record.track_id != Some(TrackId::from(5)));
    let reconciler = IdentityReconciler::new(vec![scenario_assignment()]);

    let outcome = reconciler.resolve(&records, &[scenario_ground_truth()], false);
    assert!(outcome.submission.is_empty());
    assert_eq!(outcome.misses.get("no_submission_entry"), Some(&1));
}

#[test]
fn frames_without_matched_pairs_leave_no_assignment_evidence() {
    let mut record = scenario_assignment();
    record.alpha_match_rows_list = Vec::new();
    record.alpha_match_cols_list = Vec::new();
    let reconciler = IdentityReconciler::new(vec![record]);

    let resolved = reconciler.resolve_tracker_id(&scenario_ground_truth());
    assert!(
        matches!(resolved, Err(ReconcileMiss::NoAssignmentEvidence { .. })),
        "unexpected resolution: {resolved:?}"
    );

    let outcome = reconciler.resolve(&scenario_submission(), &[scenario_ground_truth()], false);
    assert!(outcome.submission.is_empty());
    assert_eq!(outcome.misses.get("no_assignment_evidence"), Some(&1));
}

#[test]
fn voted_tracker_index_past_unique_ids_is_a_miss() {
    let mut record = scenario_assignment();
    record.unique_tracker_ids = Vec::new();
    let reconciler = IdentityReconciler::new(vec![record]);

    let resolved = reconciler.resolve_tracker_id(&scenario_ground_truth());
    match resolved {
        Err(ReconcileMiss::TrackerIndexOutOfRange { index, len, .. }) => {
            assert_eq!(index, 0);
            assert_eq!(len, 0);
        }
        other => panic!("unexpected resolution: {other:?}"),
    }

    let outcome = reconciler.resolve(&scenario_submission(), &[scenario_ground_truth()], true);
    assert_eq!(outcome.misses.get("tracker_index_out_of_range"), Some(&1));
}

#[test]
fn matched_rows_vote_only_for_their_paired_column() {
    let mut record = scenario_assignment();
    record.unique_gt_ids = (0..4_i64).map(TrackId::from).collect();
    // Ground-truth track 0 sits in slot 1; slot 0 holds another track.
    record.gt_ids_t_list = vec![slot(1, &[3, 0])];
    record.tracker_ids_t_list = vec![slot(1, &[0, 1])];
    record.alpha_match_rows_list = vec![slot(1, &[0, 1])];
    record.alpha_match_cols_list = vec![slot(1, &[0, 1])];
    let reconciler = IdentityReconciler::new(vec![record]);

    let resolved = reconciler
        .resolve_tracker_id(&scenario_ground_truth())
        .expect("tracker should resolve");
    assert_eq!(resolved, TrackId::from(9));
}

#[test]
fn strict_policy_rejects_mismatched_qid_sets() {
    let mut records = scenario_submission();
    let mut extra = records[0].clone();
    extra.qid = 77.into();
    records.push(extra);

    let config = EvalConfig {
        match_policy: MatchPolicy::Strict,
        ..sequential_config()
    };
    let reconciler = IdentityReconciler::new(vec![scenario_assignment()]);
    let err = evaluate_submission(records, vec![scenario_ground_truth()], &reconciler, &config)
        .expect_err("strict matching should fail");

    match err.downcast_ref::<EvalError>() {
        Some(EvalError::QidSetMismatch {
            stage,
            missing_in_submission,
            missing_in_ground_truth,
            extra_sample,
            ..
        }) => {
            assert_eq!(*stage, "first matching");
            assert_eq!(*missing_in_submission, 0);
            assert_eq!(*missing_in_ground_truth, 1);
            assert_eq!(extra_sample, &vec!["77".to_string()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn lenient_policy_scores_the_shared_qids_only() {
    let mut records = scenario_submission();
    let mut extra = records[0].clone();
    extra.qid = 77.into();
    records.push(extra);

    let reconciler = IdentityReconciler::new(vec![scenario_assignment()]);
    let outcome = evaluate_submission(
        records,
        vec![scenario_ground_truth()],
        &reconciler,
        &sequential_config(),
    )
    .expect("lenient matching should succeed");
    assert_eq!(outcome.matching.first_matching.submission, 2);
    assert_eq!(outcome.report.brief["MR-full-R1@0.5"], 100.0);
}

#[test]
fn highlight_only_submission_skips_moment_retrieval() {
    let mut records = scenario_submission();
    for record in &mut records {
        record.pred_relevant_windows = None;
    }
    let reconciler = IdentityReconciler::new(vec![scenario_assignment()]);
    let outcome = evaluate_submission(
        records,
        vec![scenario_ground_truth()],
        &reconciler,
        &sequential_config(),
    )
    .expect("evaluation should succeed");

    assert!(!outcome.report.detail.contains_key("full"));
    assert_eq!(outcome.report.brief["HL-min-Fair-Hit1"], 100.0);
    assert!(!outcome.report.brief.contains_key("MR-full-mIoU"));
}

#[test]
fn length_strata_add_families_next_to_full() {
    let config = EvalConfig {
        length_ranges: default_length_ranges(),
        ..sequential_config()
    };
    let reconciler = IdentityReconciler::new(vec![scenario_assignment()]);
    let outcome = evaluate_submission(
        scenario_submission(),
        vec![scenario_ground_truth()],
        &reconciler,
        &config,
    )
    .expect("evaluation should succeed");

    assert_eq!(outcome.report.detail["short"]["MR-mAP"]["0.5"], json!(100.0));
    assert_eq!(outcome.report.detail["middle"]["MR-mAP"]["0.5"], json!(0.0));
    assert!(outcome.report.detail.contains_key("long"));
}

/// Deterministic pseudo-random stream for fixture generation.
struct Lcg(u64);

impl Lcg {
    fn next_unit(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.0 >> 11) as f64 / (1_u64 << 53) as f64
    }
}

fn synthetic_queries(count: i64) -> (Vec<SubmissionRecord>, Vec<GroundTruthRecord>) {
    let mut rng = Lcg(7);
    let mut sub = Vec::new();
    let mut gt = Vec::new();
    for qid in 0..count {
        let start = (rng.next_unit() * 100.0).floor();
        let length = 2.0 + (rng.next_unit() * 30.0).floor();
        let windows = if qid % 13 == 0 {
            Vec::new()
        } else {
            vec![[start, start + length]]
        };
        gt.push(ground_truth(json!({
            "qid": qid,
            "duration": 150,
            "relevant_windows": windows,
        })));

        let preds = (0..12)
            .map(|_| {
                let shift = (rng.next_unit() - 0.5) * 20.0;
                let scale = 0.5 + rng.next_unit();
                let pred_start = (start + shift).max(0.0);
                [pred_start, pred_start + length * scale, rng.next_unit()]
            })
            .collect::<Vec<[f64; 3]>>();
        sub.push(submission(json!({
            "qid": qid,
            "pred_relevant_windows": preds,
        })));
    }
    (sub, gt)
}

#[test]
fn compute_ap_is_identical_across_worker_counts() {
    let (sub, gt) = synthetic_queries(120);
    let thresholds = linspace(0.1, 0.95, 18);

    let baseline = compute_ap(&sub, &gt, &thresholds, None, Some(10), &pool(1, 50))
        .expect("sequential ap should succeed");
    for workers in [2, 8] {
        let parallel = compute_ap(&sub, &gt, &thresholds, None, Some(10), &pool(workers, 7))
            .expect("parallel ap should succeed");
        assert_eq!(parallel.to_percent_map(), baseline.to_percent_map());
        assert_eq!(parallel.per_threshold, baseline.per_threshold);
    }
}

#[test]
fn ap_never_increases_with_stricter_thresholds() {
    let (sub, gt) = synthetic_queries(60);
    let thresholds = linspace(0.1, 0.95, 18);
    let summary = compute_ap(&sub, &gt, &thresholds, None, Some(10), &pool(1, 50))
        .expect("ap should succeed");
    for pair in summary.per_threshold.windows(2) {
        assert!(pair[1] <= pair[0] + 1e-12, "ap increased: {pair:?}");
    }
}

#[test]
fn recall_grows_with_k_at_every_threshold() {
    let (sub, gt) = synthetic_queries(80);
    let thresholds = linspace(0.1, 0.95, 18);
    let r1 = compute_recall_at_k(1, &sub, &gt, &thresholds);
    let r5 = compute_recall_at_k(5, &sub, &gt, &thresholds);
    let r10 = compute_recall_at_k(10, &sub, &gt, &thresholds);

    for index in 0..thresholds.len() {
        assert!(r1.recall[index] <= r5.recall[index]);
        assert!(r5.recall[index] <= r10.recall[index]);
    }
    assert!(r1.mean_iou <= r5.mean_iou && r5.mean_iou <= r10.mean_iou);
}

#[test]
fn hit_at_one_is_full_when_arg_max_lands_on_relevant_clip() {
    let gt = (0..4)
        .map(|qid| {
            ground_truth(json!({
                "qid": qid,
                "duration": 20,
                "relevant_windows": [[2 * qid, 2 * qid + 2]],
                "relevant_clip_ids": [qid],
                "saliency_scores": [[1, 4, 2]]
            }))
        })
        .collect::<Vec<GroundTruthRecord>>();
    let sub = (0..4_usize)
        .map(|qid| {
            let mut scores = vec![0.1; 10];
            scores[qid] = 0.8;
            submission(json!({ "qid": qid, "pred_saliency_scores": scores }))
        })
        .collect::<Vec<SubmissionRecord>>();

    let config = sequential_config();
    let scorer = pool(1, 50);
    for level in &config.saliency_levels {
        let scores =
            super::highlight::compute_highlight_scores(&sub, &gt, level, 2.0, &scorer)
                .expect("highlight should succeed");
        assert_eq!(scores.hit_at_one, 1.0, "level {}", level.name);
    }
}

#[test]
fn windows_to_dense_saliency_and_back_keeps_clip_ids() {
    let windows = [Window::new(12.0, 18.0), Window::new(24.0, 30.0)];
    let clip_ids = relevant_clip_ids_from_windows(&windows, 2.0);
    assert_eq!(clip_ids, vec![6, 7, 8, 12, 13, 14]);

    let record = ground_truth(json!({
        "qid": 1,
        "duration": 30,
        "relevant_windows": [[12, 18], [24, 30]],
        "relevant_clip_ids": clip_ids,
        "saliency_scores": vec![[4, 4, 4]; 6],
    }));
    let dense = dense_saliency(&record, 2.0);
    assert_eq!(dense.len(), 15);
    assert_eq!(relevant_clip_ids_from_dense(&dense), record.relevant_clip_ids);
}

#[test]
fn duplicate_ground_truth_qids_are_rejected() {
    let records = vec![scenario_ground_truth(), scenario_ground_truth()];
    assert_eq!(
        validate_ground_truth(&records),
        Err(EvalError::DuplicateQid("1".to_string()))
    );
}

#[test]
fn inverted_windows_are_rejected() {
    let record = ground_truth(json!({
        "qid": "q-9",
        "duration": 30,
        "relevant_windows": [[18, 12]],
    }));
    match record.validate() {
        Err(EvalError::InvalidWindow { qid, reason, .. }) => {
            assert_eq!(qid, "q-9");
            assert_eq!(reason, "start is after end");
        }
        other => panic!("unexpected validation result: {other:?}"),
    }
}

#[test]
fn config_validation_rejects_bad_settings() {
    assert!(EvalConfig::default().validate().is_ok());

    let zero_workers = EvalConfig {
        num_workers: 0,
        ..EvalConfig::default()
    };
    assert!(matches!(
        zero_workers.validate(),
        Err(EvalError::InvalidConfig(_))
    ));

    let unsorted = EvalConfig {
        iou_thresholds: vec![0.5, 0.3],
        ..EvalConfig::default()
    };
    assert!(unsorted.validate().is_err());

    let bad_clip = EvalConfig {
        clip_length: 0.0,
        ..EvalConfig::default()
    };
    assert!(bad_clip.validate().is_err());
}

fn write_lines(path: &Path, rows: &[Value]) {
    let text = rows
        .iter()
        .map(|row| row.to_string())
        .collect::<Vec<String>>()
        .join("\n");
    fs::write(path, text).expect("fixture should be written");
}

#[test]
fn loaders_reject_duplicate_ground_truth_with_file_context() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let gt_path = dir.path().join("gt.jsonl");
    let row = json!({"qid": 1, "duration": 30, "relevant_windows": [[12, 18]]});
    write_lines(&gt_path, &[row.clone(), row]);

    let err = load_ground_truth(&gt_path).expect_err("duplicate qid should fail");
    assert!(err.to_string().contains("gt.jsonl"));
    assert_eq!(
        err.downcast_ref::<EvalError>(),
        Some(&EvalError::DuplicateQid("1".to_string()))
    );
}

#[test]
fn evaluate_command_writes_report_and_manifest() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let submission_path = dir.path().join("submission.jsonl");
    let gt_path = dir.path().join("gt.jsonl");
    let id_mapping_path = dir.path().join("id_mapping.jsonl");
    let save_path = dir.path().join("out").join("metrics.json");
    let manifest_path = dir.path().join("out").join("manifest.json");

    let sub_rows = scenario_submission()
        .iter()
        .map(|record| serde_json::to_value(record).expect("record should serialize"))
        .collect::<Vec<Value>>();
    write_lines(&submission_path, &sub_rows);
    write_lines(
        &gt_path,
        &[serde_json::to_value(scenario_ground_truth()).expect("record should serialize")],
    );
    write_lines(
        &id_mapping_path,
        &[serde_json::to_value(scenario_assignment()).expect("record should serialize")],
    );

    let loaded = load_submission(&submission_path).expect("submission should load");
    assert_eq!(loaded.len(), 2);

    super::run(EvaluateArgs {
        submission_path: submission_path.clone(),
        gt_path: gt_path.clone(),
        id_mapping_path: id_mapping_path.clone(),
        save_path: save_path.clone(),
        run_manifest_path: Some(manifest_path.clone()),
        match_policy: MatchPolicy::Lenient,
        num_workers: 2,
        chunk_size: 1,
        max_pred_windows: 10,
        max_gt_windows: None,
        clip_length: 2.0,
        stratify_by_length: false,
        not_verbose: true,
    })
    .expect("evaluate should succeed");

    let report: Value =
        serde_json::from_str(&fs::read_to_string(&save_path).expect("report should exist"))
            .expect("report should parse");
    assert_eq!(report["brief"]["MR-full-mAP@0.5"], json!(100.0));
    assert_eq!(report["brief"]["MR-full-mIoU"], json!(60.0));

    let manifest: Value =
        serde_json::from_str(&fs::read_to_string(&manifest_path).expect("manifest should exist"))
            .expect("manifest should parse");
    let inputs = manifest["inputs"].as_array().expect("inputs should be a list");
    assert_eq!(inputs.len(), 3);
    let hashes = inputs
        .iter()
        .map(|input| {
            (
                input["role"].as_str().unwrap_or_default().to_string(),
                input["sha256"].as_str().unwrap_or_default().len(),
            )
        })
        .collect::<HashMap<String, usize>>();
    assert_eq!(hashes["submission"], 64);
    assert_eq!(manifest["config"]["match_policy"], json!("lenient"));
    assert_eq!(manifest["matching"]["reconciled"], json!(1));
}
