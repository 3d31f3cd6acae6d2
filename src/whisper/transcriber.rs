use std::path::Path;

use anyhow::{Context, Result, anyhow};
use log::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::audio::decode_media_file;
use crate::timeline::{TranscriptSegment, round3};
use crate::whisper::config::{
    CONDITION_ON_PREVIOUS_TEXT, ENTROPY_THRESHOLD, LOGPROB_THRESHOLD, NO_SPEECH_THRESHOLD,
    TOKEN_TIMESTAMPS, WhisperConfig,
};
use crate::whisper::model_slot::ModelSlot;

/// Speech-to-text over a media file on disk.
///
/// Implementations are called from a blocking thread and may take as long
/// as inference takes.
pub trait Transcriber: Send + Sync {
    fn transcribe(&self, media: &Path, language: Option<&str>) -> Result<Vec<TranscriptSegment>>;
}

/// whisper.cpp backed transcriber. The model is loaded on the first call.
pub struct WhisperTranscriber {
    config: WhisperConfig,
    context: ModelSlot<WhisperContext>,
}

impl WhisperTranscriber {
    pub fn new(config: WhisperConfig) -> Self {
        Self {
            config,
            context: ModelSlot::new(),
        }
    }

    /// Loads the model now instead of on the first request.
    pub fn preload(&self) -> Result<()> {
        self.context().map(|_| ())
    }

    fn context(&self) -> Result<std::sync::Arc<WhisperContext>> {
        self.context.get_or_try_load(|| {
            let path = &self.config.model_path;
            info!("Loading Whisper model from {}", path.display());

            if !path.exists() {
                return Err(anyhow!(
                    "Whisper model not found at {}; run `clipscribe download <model>` first",
                    path.display()
                ));
            }

            let mut ctx_params = WhisperContextParameters::default();
            ctx_params.use_gpu(self.config.use_gpu);

            let model_path = path
                .to_str()
                .ok_or_else(|| anyhow!("Model path is not valid UTF-8: {}", path.display()))?;
            let ctx = WhisperContext::new_with_params(model_path, ctx_params)
                .map_err(|e| anyhow!("Failed to load model: {}", e))?;

            info!("Whisper model loaded");
            Ok(ctx)
        })
    }

    fn build_params<'a>(&self, language: Option<&'a str>) -> FullParams<'a, 'a> {
        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(Some(language.unwrap_or("auto")));
        params.set_translate(false);
        params.set_no_context(!CONDITION_ON_PREVIOUS_TEXT);
        params.set_no_speech_thold(NO_SPEECH_THRESHOLD);
        params.set_entropy_thold(ENTROPY_THRESHOLD);
        params.set_logprob_thold(LOGPROB_THRESHOLD);
        params.set_token_timestamps(TOKEN_TIMESTAMPS);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_n_threads(self.config.num_threads);
        params
    }
}

impl Transcriber for WhisperTranscriber {
    fn transcribe(&self, media: &Path, language: Option<&str>) -> Result<Vec<TranscriptSegment>> {
        let samples = decode_media_file(&self.config.ffmpeg, media)
            .context("Failed to decode media")?;

        let ctx = self.context()?;
        let mut state = ctx
            .create_state()
            .map_err(|e| anyhow!("Failed to create whisper state: {}", e))?;

        info!(
            "Running Whisper on {} samples, language={}",
            samples.len(),
            language.unwrap_or("auto")
        );

        state
            .full(self.build_params(language), &samples)
            .map_err(|e| anyhow!("Failed to run transcription: {}", e))?;

        let num_segments = state
            .full_n_segments()
            .map_err(|e| anyhow!("Failed to get segment count: {}", e))?;

        let mut segments = Vec::with_capacity(num_segments.max(0) as usize);
        for i in 0..num_segments {
            let text = state
                .full_get_segment_text(i)
                .map_err(|e| anyhow!("Failed to get segment text: {}", e))?;
            let t0 = state
                .full_get_segment_t0(i)
                .map_err(|e| anyhow!("Failed to get segment start: {}", e))?;
            let t1 = state
                .full_get_segment_t1(i)
                .map_err(|e| anyhow!("Failed to get segment end: {}", e))?;

            if let Some(segment) = segment_from_raw(t0, t1, &text) {
                segments.push(segment);
            }
        }

        debug!("Whisper produced {num_segments} raw segment(s), kept {}", segments.len());
        Ok(segments)
    }
}

/// whisper.cpp reports timestamps in centiseconds.
fn segment_from_raw(t0: i64, t1: i64, text: &str) -> Option<TranscriptSegment> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(TranscriptSegment {
        start: round3(t0 as f64 / 100.0),
        end: round3(t1 as f64 / 100.0),
        text: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn raw_segment_converts_centiseconds() {
        let seg = segment_from_raw(120, 370, " Hello world ").unwrap();
        assert_eq!(seg.start, 1.2);
        assert_eq!(seg.end, 3.7);
        assert_eq!(seg.text, "Hello world");
    }

    #[test]
    fn raw_segment_skips_blank_text() {
        assert!(segment_from_raw(0, 100, "  \n").is_none());
    }

    #[test]
    fn missing_model_reports_path() {
        let transcriber = WhisperTranscriber::new(WhisperConfig {
            model_path: PathBuf::from("/nonexistent/ggml-medium.bin"),
            ..WhisperConfig::default()
        });
        let err = transcriber.preload().unwrap_err();
        assert!(err.to_string().contains("/nonexistent/ggml-medium.bin"));
        assert!(!transcriber.context.is_loaded());
    }
}
