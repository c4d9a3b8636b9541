use serde::Deserialize;
use tracing::warn;

use crate::commands::evaluate::relevant_clip_ids_from_windows;
use crate::model::{ANNOTATOR_COUNT, GroundTruthRecord, Qid, TrackId, Window};

/// Rating given to every clip of an annotated window.
const CONVERTED_SALIENCY: [f64; ANNOTATOR_COUNT] = [4.0; ANNOTATOR_COUNT];
const CLIP_LENGTH: f64 = 2.0;

#[derive(Debug, Deserialize)]
pub struct AnnotationDocument {
    pub queries: Vec<AnnotatedQuery>,
}

#[derive(Debug, Deserialize)]
pub struct AnnotatedQuery {
    #[serde(alias = "qid")]
    pub query_id: Qid,
    pub query: String,
    pub video_name: String,
    pub video_length: i64,
    #[serde(default)]
    pub tracks: Vec<AnnotatedTrack>,
}

#[derive(Debug, Deserialize)]
pub struct AnnotatedTrack {
    pub track_id: TrackId,
    #[serde(default)]
    pub temporal: Vec<Option<[i64; 2]>>,
}

/// Frame-index corrections for videos whose annotation frames were
/// exported with an offset. Windows arrive as 1-based inclusive frame
/// indices and leave as 0-based `[start, end)` positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameShift {
    /// Drop the 1-based offset.
    Default,
    /// Annotation frames start `offset` frames into the source video.
    Offset(i64),
    /// Frame 8 maps to 6 and frames from 12 on lose five positions.
    GappedExport,
}

/// Videos with a known annotation offset.
pub const FRAME_SHIFT_EXCEPTIONS: [(&str, FrameShift); 2] = [
    ("cfff47c3", FrameShift::Offset(170)),
    ("af48b2f9", FrameShift::GappedExport),
];

pub fn frame_shift_for(video_name: &str) -> FrameShift {
    FRAME_SHIFT_EXCEPTIONS
        .iter()
        .find(|(name, _)| *name == video_name)
        .map(|(_, shift)| *shift)
        .unwrap_or(FrameShift::Default)
}

impl FrameShift {
    pub fn apply(self, [start, end]: [i64; 2]) -> [i64; 2] {
        match self {
            Self::Default => [start - 1, end],
            Self::Offset(offset) => [start - offset - 1, end - offset],
            Self::GappedExport => {
                let mut start = start;
                let mut end = end;
                if start <= 5 {
                    start -= 1;
                }
                if start == 8 {
                    start = 5;
                }
                if end == 8 {
                    end = 6;
                }
                if start >= 12 {
                    start -= 6;
                }
                if end >= 12 {
                    end -= 5;
                }
                [start, end]
            }
        }
    }
}

pub fn video_id(video_name: &str, video_length: i64) -> String {
    format!("{video_name}_1.0_{video_length}.0")
}

/// One record per query, built from its first annotated track.
pub fn convert_ground_truth(document: &AnnotationDocument) -> Vec<GroundTruthRecord> {
    let mut records = Vec::with_capacity(document.queries.len());
    for query in &document.queries {
        let Some(track) = query.tracks.first() else {
            warn!(qid = %query.query_id, "query has no annotated tracks; skipped");
            continue;
        };
        if query.tracks.len() > 1 {
            warn!(
                qid = %query.query_id,
                tracks = query.tracks.len(),
                track_id = %track.track_id,
                "multi-track query; keeping the first track only"
            );
        }

        let shift = frame_shift_for(&query.video_name);
        let mut relevant_windows = Vec::with_capacity(track.temporal.len());
        for frames in track.temporal.iter().flatten() {
            let [start, end] = shift.apply(*frames);
            if start > end {
                warn!(
                    qid = %query.query_id,
                    video = %query.video_name,
                    frames = ?frames,
                    start,
                    end,
                    "frame shift produced an inverted window; skipped"
                );
                continue;
            }
            relevant_windows.push(Window::new(start as f64, end as f64));
        }
        let relevant_clip_ids = relevant_clip_ids_from_windows(&relevant_windows, CLIP_LENGTH);

        records.push(GroundTruthRecord {
            qid: query.query_id.clone(),
            query: query.query.clone(),
            duration: query.video_length as f64,
            vid: video_id(&query.video_name, query.video_length),
            track_id: Some(track.track_id.clone()),
            saliency_scores: vec![CONVERTED_SALIENCY; relevant_clip_ids.len()],
            relevant_windows,
            relevant_clip_ids,
        });
    }
    records
}
