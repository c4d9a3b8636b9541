use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use super::matching::MatchCounts;

const BRIEF_THRESHOLD_KEYS: [&str; 4] = ["0.1", "0.3", "0.5", "0.7"];

/// Query counts before and after identity reconciliation.
#[derive(Debug, Clone, Serialize)]
pub struct MatchingSummary {
    pub first_matching: MatchCounts,
    pub second_matching: MatchCounts,
    pub reconciled: usize,
    pub reconcile_misses: BTreeMap<&'static str, usize>,
}

impl MatchingSummary {
    pub fn ground_truth_retention(&self) -> Option<f64> {
        crate::util::ratio(
            self.second_matching.ground_truth,
            self.first_matching.ground_truth,
        )
    }

    pub fn submission_retention(&self) -> Option<f64> {
        crate::util::ratio(
            self.second_matching.submission,
            self.first_matching.submission,
        )
    }
}

/// `brief` serializes first, then the metric families in key order.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub brief: BTreeMap<String, f64>,
    #[serde(flatten)]
    pub detail: BTreeMap<String, Value>,
}

fn lookup(family: &Value, metric: &str, key: Option<&str>) -> Option<f64> {
    let value = family.get(metric)?;
    match key {
        Some(key) => value.get(key)?.as_f64(),
        None => value.as_f64(),
    }
}

impl EvaluationReport {
    pub fn new(detail: BTreeMap<String, Value>, matching: &MatchingSummary) -> Result<Self> {
        let mut brief = BTreeMap::new();

        if let Some(full) = detail.get("full") {
            let mut put = |name: String, value: Option<f64>| {
                if let Some(value) = value {
                    brief.insert(name, value);
                }
            };
            put("MR-full-mAP".to_string(), lookup(full, "MR-mAP", Some("average")));
            for threshold in BRIEF_THRESHOLD_KEYS {
                put(
                    format!("MR-full-mAP@{threshold}"),
                    lookup(full, "MR-mAP", Some(threshold)),
                );
            }
            put("MR-full-mIoU".to_string(), lookup(full, "MR-mIoU", None));
            for recall_key in ["R1", "R5", "R10"] {
                for threshold in BRIEF_THRESHOLD_KEYS {
                    put(
                        format!("MR-full-{recall_key}@{threshold}"),
                        lookup(full, &format!("MR-{recall_key}"), Some(threshold)),
                    );
                }
            }
        }

        for (family_name, family) in detail.iter().filter(|(name, _)| name.starts_with("HL-")) {
            let Some(metrics) = family.as_object() else {
                continue;
            };
            for (metric, value) in metrics {
                let suffix = metric.split('-').nth(1).unwrap_or(metric);
                if let Some(value) = value.as_f64() {
                    brief.insert(format!("{family_name}-{suffix}"), value);
                }
            }
        }

        let mut detail = detail;
        detail.insert(
            "matching".to_string(),
            serde_json::to_value(matching).context("failed to serialize matching summary")?,
        );

        Ok(Self { brief, detail })
    }
}
