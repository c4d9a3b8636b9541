use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::cli::{AverageArgs, CombineArgs};
use crate::util::{read_json, round_to, write_json_pretty};

/// Tracking scores copied from the spatial summary table.
const SPATIAL_KEYS: [&str; 8] = [
    "HOTA", "DetA", "AssA", "DetRe", "DetPr", "AssRe", "AssPr", "LocA",
];
const RECALL_KEYS: [&str; 3] = ["R1", "R5", "R10"];
const RECALL_THRESHOLDS: [&str; 3] = ["0.1", "0.3", "0.5"];

#[derive(Debug, Serialize, Deserialize)]
pub struct CombinedResult {
    pub result: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct TemporalBrief {
    brief: BTreeMap<String, f64>,
}

/// Parses a whitespace table with one header row and one value row.
pub fn parse_spatial_summary(text: &str) -> Result<BTreeMap<String, f64>> {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());
    let (Some(header), Some(values)) = (lines.next(), lines.next()) else {
        bail!("spatial summary needs a header row and a value row");
    };

    let headers = header.split_whitespace().collect::<Vec<&str>>();
    let values = values
        .split_whitespace()
        .map(|value| {
            value
                .parse::<f64>()
                .with_context(|| format!("invalid summary value: {value}"))
        })
        .collect::<Result<Vec<f64>>>()?;
    if headers.len() != values.len() {
        bail!(
            "spatial summary has {} headers but {} values",
            headers.len(),
            values.len()
        );
    }

    let table = headers.into_iter().zip(values).collect::<BTreeMap<&str, f64>>();
    Ok(SPATIAL_KEYS
        .iter()
        .filter_map(|key| table.get(key).map(|value| (key.to_string(), *value)))
        .collect())
}

/// `MR-full-*` brief entries under their short names.
pub fn short_temporal_keys(brief: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    let mut renames = vec![("MR-full-mIoU".to_string(), "mIoU".to_string())];
    for recall in RECALL_KEYS {
        for threshold in RECALL_THRESHOLDS {
            renames.push((
                format!("MR-full-{recall}@{threshold}"),
                format!("{recall}@{threshold}"),
            ));
        }
    }

    renames
        .into_iter()
        .filter_map(|(long, short)| brief.get(&long).map(|value| (short, *value)))
        .collect()
}

pub fn run_combine(args: CombineArgs) -> Result<()> {
    let summary = fs::read_to_string(&args.spatial_summary_path).with_context(|| {
        format!(
            "failed to read spatial summary: {}",
            args.spatial_summary_path.display()
        )
    })?;
    let spatial = parse_spatial_summary(&summary).with_context(|| {
        format!(
            "failed to parse spatial summary: {}",
            args.spatial_summary_path.display()
        )
    })?;
    let temporal = read_json::<TemporalBrief>(&args.temporal_metrics_path)?;
    let temporal = short_temporal_keys(&temporal.brief);

    let mut result = Map::new();
    for (key, value) in spatial.into_iter().chain(temporal) {
        result.insert(key, Value::from(value));
    }
    info!(
        spatial = %args.spatial_summary_path.display(),
        temporal = %args.temporal_metrics_path.display(),
        metrics = result.len(),
        "combined spatial and temporal results"
    );

    write_json_pretty(&args.output_path, &CombinedResult { result })
}

/// Key-wise mean over the first object's keys, recursing into nested
/// objects and rounding leaves to three decimals.
pub fn average_results(results: &[Map<String, Value>]) -> Result<Map<String, Value>> {
    let Some(first) = results.first() else {
        bail!("nothing to average");
    };

    let mut out = Map::new();
    for (key, value) in first {
        let column = results
            .iter()
            .map(|result| {
                result
                    .get(key)
                    .with_context(|| format!("result is missing key {key}"))
            })
            .collect::<Result<Vec<&Value>>>()?;

        let averaged = if value.is_object() {
            let nested = column
                .iter()
                .map(|value| {
                    value
                        .as_object()
                        .cloned()
                        .with_context(|| format!("{key} is not an object in every result"))
                })
                .collect::<Result<Vec<Map<String, Value>>>>()?;
            Value::Object(average_results(&nested)?)
        } else {
            let numbers = column
                .iter()
                .map(|value| {
                    value
                        .as_f64()
                        .with_context(|| format!("{key} is not a number in every result"))
                })
                .collect::<Result<Vec<f64>>>()?;
            let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
            Value::from(round_to(mean, 3))
        };
        out.insert(key.clone(), averaged);
    }
    Ok(out)
}

fn load_result(path: &Path) -> Result<Map<String, Value>> {
    Ok(read_json::<CombinedResult>(path)?.result)
}

pub fn run_average(args: AverageArgs) -> Result<()> {
    let missing = args
        .result_paths
        .iter()
        .filter(|path| !path.exists())
        .map(|path| path.display().to_string())
        .collect::<Vec<String>>();
    if !missing.is_empty() {
        bail!("result files not found: {}", missing.join(", "));
    }

    let results = args
        .result_paths
        .iter()
        .map(|path| load_result(path))
        .collect::<Result<Vec<Map<String, Value>>>>()?;
    let result = average_results(&results)?;
    info!(
        inputs = results.len(),
        output = %args.output_path.display(),
        "averaged combined results"
    );

    write_json_pretty(&args.output_path, &CombinedResult { result })
}
