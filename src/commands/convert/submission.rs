use anyhow::{Result, bail};
use serde::Deserialize;

use super::ground_truth::video_id;
use crate::model::{PredWindow, Qid, SubmissionRecord, TrackId};

#[derive(Debug, Deserialize)]
pub struct SubmissionDocument {
    pub queries: Vec<SubmittedQuery>,
}

#[derive(Debug, Deserialize)]
pub struct SubmittedQuery {
    #[serde(alias = "qid")]
    pub query_id: Qid,
    pub query: String,
    pub video_name: String,
    #[serde(default)]
    pub video_length: Option<i64>,
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub tracks: Vec<SubmittedTrack>,
}

/// Windows are `[start, end, score]`, or `[start, end]` with scores in a
/// parallel `score` list.
#[derive(Debug, Deserialize)]
pub struct SubmittedTrack {
    pub track_id: TrackId,
    #[serde(default)]
    pub temporal: Vec<Vec<f64>>,
    #[serde(default)]
    pub score: Vec<f64>,
    #[serde(default)]
    pub saliency: Option<Vec<f64>>,
}

fn pred_windows(query: &SubmittedQuery, track: &SubmittedTrack) -> Result<Vec<PredWindow>> {
    let mut windows = Vec::with_capacity(track.temporal.len());
    for (index, entry) in track.temporal.iter().enumerate() {
        let pred = match entry.as_slice() {
            [start, end, score] => PredWindow::new(*start, *end, *score),
            [start, end] => match track.score.get(index) {
                Some(score) => PredWindow::new(*start, *end, *score),
                None => bail!(
                    "qid {} track {}: window {index} has no score",
                    query.query_id,
                    track.track_id
                ),
            },
            other => bail!(
                "qid {} track {}: window {index} has {} values, expected 2 or 3",
                query.query_id,
                track.track_id,
                other.len()
            ),
        };
        windows.push(pred);
    }
    Ok(windows)
}

/// One record per submitted track; the qid repeats across a query's tracks.
pub fn convert_submission(document: &SubmissionDocument) -> Result<Vec<SubmissionRecord>> {
    let mut records = Vec::new();
    for query in &document.queries {
        let vid = match (&query.video_id, query.video_length) {
            (Some(vid), _) => vid.clone(),
            (None, Some(length)) => video_id(&query.video_name, length),
            (None, None) => bail!(
                "qid {}: needs either video_id or video_length",
                query.query_id
            ),
        };
        for track in &query.tracks {
            let record = SubmissionRecord {
                qid: query.query_id.clone(),
                query: query.query.clone(),
                vid: vid.clone(),
                video_name: Some(query.video_name.clone()),
                track_id: Some(track.track_id.clone()),
                pred_relevant_windows: Some(pred_windows(query, track)?),
                pred_saliency_scores: track.saliency.clone(),
            };
            record.validate()?;
            records.push(record);
        }
    }
    Ok(records)
}
