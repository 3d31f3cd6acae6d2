use serde::{Deserialize, Serialize};

use crate::timeline::TimelineClip;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscribeResponse {
    pub clips: Vec<TimelineClip>,
    pub segment_count: usize,
}

impl From<Vec<TimelineClip>> for TranscribeResponse {
    fn from(clips: Vec<TimelineClip>) -> Self {
        Self {
            segment_count: clips.len(),
            clips,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
