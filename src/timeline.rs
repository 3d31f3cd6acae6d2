use log::debug;
use serde::{Deserialize, Serialize};

/// A unit of recognized speech as reported by the transcriber.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Subtitle clip expressed as an offset plus a duration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineClip {
    pub start: f64,
    pub duration: f64,
    pub subtitle_text: String,
}

/// Rounds seconds to millisecond precision.
///
/// Rounds the exact binary value, with exact ties going to the even digit,
/// so `1.2345` (stored just below the tie) becomes `1.234`.
pub fn round3(value: f64) -> f64 {
    format!("{value:.3}").parse().unwrap_or(value)
}

/// Converts transcript segments into timeline clips.
///
/// Segments whose rounded duration is not positive, or whose text is blank
/// after trimming, are skipped. Input order is kept.
pub fn segments_to_timeline_clips(segments: &[TranscriptSegment]) -> Vec<TimelineClip> {
    let clips: Vec<TimelineClip> = segments
        .iter()
        .filter_map(|seg| {
            let duration = round3(seg.end - seg.start);
            if !duration.is_finite() || duration <= 0.0 {
                return None;
            }

            let text = seg.text.trim();
            if text.is_empty() {
                return None;
            }

            Some(TimelineClip {
                start: round3(seg.start),
                duration,
                subtitle_text: text.to_string(),
            })
        })
        .collect();

    let dropped = segments.len() - clips.len();
    if dropped > 0 {
        debug!("Dropped {dropped} segment(s) with empty text or non-positive duration");
    }

    clips
}
