use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::config::EvalConfig;
use super::highlight::evaluate_highlight;
use super::identity::IdentityReconciler;
use super::matching::match_qids;
use super::moment_retrieval::{evaluate_moment_retrieval, restrict_by_duration_range};
use super::pool::WorkerPool;
use super::report::{EvaluationReport, MatchingSummary};
use crate::cli::EvaluateArgs;
use crate::error::EvalError;
use crate::model::{GroundTruthRecord, IdentityAssignmentRecord, SubmissionRecord};
use crate::util::{now_utc_string, read_jsonl, sha256_file, utc_compact_string, write_json_pretty};

#[derive(Debug, Serialize)]
struct InputFile {
    role: &'static str,
    path: String,
    sha256: String,
}

#[derive(Debug, Serialize)]
struct EvaluationRunManifest {
    manifest_version: u32,
    run_id: String,
    started_at: String,
    updated_at: String,
    report_path: String,
    inputs: Vec<InputFile>,
    config: EvalConfig,
    matching: MatchingSummary,
}

#[derive(Debug)]
pub struct EvaluationOutcome {
    pub report: EvaluationReport,
    pub matching: MatchingSummary,
}

pub fn run(args: EvaluateArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("eval-{}", utc_compact_string(started_ts));

    let config = EvalConfig::from(&args);
    config.validate()?;

    info!(
        run_id = %run_id,
        submission = %args.submission_path.display(),
        ground_truth = %args.gt_path.display(),
        id_mapping = %args.id_mapping_path.display(),
        policy = config.match_policy.as_str(),
        workers = config.num_workers,
        "starting evaluation"
    );

    let submission = load_submission(&args.submission_path)?;
    let ground_truth = load_ground_truth(&args.gt_path)?;
    let assignments = read_jsonl::<IdentityAssignmentRecord>(&args.id_mapping_path)?;
    let reconciler = IdentityReconciler::new(assignments);
    info!(
        submission = submission.len(),
        ground_truth = ground_truth.len(),
        sequences = reconciler.sequence_count(),
        "loaded inputs"
    );

    let outcome = evaluate_submission(submission, ground_truth, &reconciler, &config)?;
    write_json_pretty(&args.save_path, &outcome.report)?;

    if config.verbose {
        for (metric, value) in &outcome.report.brief {
            info!(metric = %metric, value = *value, "brief");
        }
    }
    info!(path = %args.save_path.display(), "wrote evaluation report");

    if let Some(manifest_path) = args.run_manifest_path.as_ref() {
        let manifest = EvaluationRunManifest {
            manifest_version: 1,
            run_id,
            started_at,
            updated_at: now_utc_string(),
            report_path: args.save_path.display().to_string(),
            inputs: vec![
                input_file("submission", &args.submission_path)?,
                input_file("ground_truth", &args.gt_path)?,
                input_file("id_mapping", &args.id_mapping_path)?,
            ],
            config,
            matching: outcome.matching,
        };
        write_json_pretty(manifest_path, &manifest)?;
        info!(path = %manifest_path.display(), "wrote run manifest");
    }

    Ok(())
}

fn input_file(role: &'static str, path: &Path) -> Result<InputFile> {
    Ok(InputFile {
        role,
        path: path.display().to_string(),
        sha256: sha256_file(path)?,
    })
}

/// Reads submission records; one qid may appear once per candidate track.
pub fn load_submission(path: &Path) -> Result<Vec<SubmissionRecord>> {
    let records = read_jsonl::<SubmissionRecord>(path)?;
    for record in &records {
        record
            .validate()
            .with_context(|| format!("invalid submission record in {}", path.display()))?;
    }
    Ok(records)
}

pub fn load_ground_truth(path: &Path) -> Result<Vec<GroundTruthRecord>> {
    let records = read_jsonl::<GroundTruthRecord>(path)?;
    validate_ground_truth(&records)
        .with_context(|| format!("invalid ground truth in {}", path.display()))?;
    Ok(records)
}

pub fn validate_ground_truth(records: &[GroundTruthRecord]) -> Result<(), EvalError> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        record.validate()?;
        if !seen.insert(&record.qid) {
            return Err(EvalError::DuplicateQid(record.qid.to_string()));
        }
    }
    Ok(())
}

/// Match, reconcile identities, match again, then score.
pub fn evaluate_submission(
    submission: Vec<SubmissionRecord>,
    ground_truth: Vec<GroundTruthRecord>,
    reconciler: &IdentityReconciler,
    config: &EvalConfig,
) -> Result<EvaluationOutcome> {
    let (submission, ground_truth, first_matching) =
        match_qids(submission, ground_truth, config.match_policy, "first matching")?;

    let reconciled = reconciler.resolve(&submission, &ground_truth, config.verbose);
    info!(
        resolved = reconciled.resolved,
        ground_truth = ground_truth.len(),
        "identity reconciliation done"
    );
    for (reason, count) in &reconciled.misses {
        info!(reason = *reason, count = *count, "queries dropped by identity reconciliation");
    }

    let (submission, ground_truth, second_matching) = match_qids(
        reconciled.submission,
        ground_truth,
        config.match_policy,
        "second matching",
    )?;

    let matching = MatchingSummary {
        first_matching,
        second_matching,
        reconciled: reconciled.resolved,
        reconcile_misses: reconciled.misses,
    };
    info!(
        ground_truth_kept = matching.second_matching.ground_truth,
        ground_truth_total = matching.first_matching.ground_truth,
        ground_truth_ratio = matching.ground_truth_retention().unwrap_or(0.0),
        submission_kept = matching.second_matching.submission,
        submission_total = matching.first_matching.submission,
        submission_ratio = matching.submission_retention().unwrap_or(0.0),
        "retention after identity reconciliation"
    );

    let pool = WorkerPool::new(config.num_workers, config.chunk_size)?;
    debug!(workers = pool.workers(), chunk_size = config.chunk_size, "scoring pool ready");
    let mut detail = BTreeMap::<String, Value>::new();

    if submission.is_empty() {
        warn!("no queries left to score after matching");
    }

    if submission
        .iter()
        .any(|record| record.pred_relevant_windows.is_some())
    {
        detail.insert(
            "full".to_string(),
            evaluate_moment_retrieval(&submission, &ground_truth, config, &pool)?,
        );
        for range in &config.length_ranges {
            let (range_submission, range_ground_truth) =
                restrict_by_duration_range(&submission, &ground_truth, range.min, range.max);
            info!(
                range = %range.name,
                queries = range_ground_truth.len(),
                "scoring window-length stratum"
            );
            detail.insert(
                range.name.clone(),
                evaluate_moment_retrieval(&range_submission, &range_ground_truth, config, &pool)?,
            );
        }
    }

    if submission
        .iter()
        .any(|record| record.pred_saliency_scores.is_some())
    {
        detail.extend(evaluate_highlight(&submission, &ground_truth, config, &pool)?);
    }

    let report = EvaluationReport::new(detail, &matching)?;
    Ok(EvaluationOutcome { report, matching })
}
