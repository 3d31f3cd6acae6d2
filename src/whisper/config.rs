use std::path::{Path, PathBuf};

pub const DEFAULT_MODEL: &str = "medium";
pub const DEFAULT_MODELS_DIR: &str = "./models";

// Decoding options. Fixed for every request; only the language varies.
pub const CONDITION_ON_PREVIOUS_TEXT: bool = true;
pub const NO_SPEECH_THRESHOLD: f32 = 0.4;
pub const ENTROPY_THRESHOLD: f32 = 3.0;
pub const LOGPROB_THRESHOLD: f32 = -1.5;
pub const TOKEN_TIMESTAMPS: bool = true;

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct WhisperConfig {
    pub model_path: PathBuf,
    pub use_gpu: bool,
    pub num_threads: i32,
    pub ffmpeg: String,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            model_path: model_file(Path::new(DEFAULT_MODELS_DIR), DEFAULT_MODEL),
            use_gpu: true,
            num_threads: default_threads(),
            ffmpeg: "ffmpeg".to_string(),
        }
    }
}

/// `ggml-<name>.bin` inside `dir`, the layout `download` produces.
pub fn model_file(dir: &Path, model: &str) -> PathBuf {
    dir.join(format!("ggml-{model}.bin"))
}

/// An explicit path wins over the named model.
pub fn resolve_model_path(explicit: Option<PathBuf>, dir: &Path, model: &str) -> PathBuf {
    explicit.unwrap_or_else(|| model_file(dir, model))
}

pub fn default_threads() -> i32 {
    std::thread::available_parallelism()
        .map(|n| n.get().min(8) as i32)
        .unwrap_or(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_model_resolves_inside_models_dir() {
        let path = resolve_model_path(None, Path::new("/srv/models"), "small.en");
        assert_eq!(path, PathBuf::from("/srv/models/ggml-small.en.bin"));
    }

    #[test]
    fn explicit_path_overrides_name() {
        let path = resolve_model_path(
            Some(PathBuf::from("/opt/custom.bin")),
            Path::new("/srv/models"),
            "medium",
        );
        assert_eq!(path, PathBuf::from("/opt/custom.bin"));
    }

    #[test]
    fn default_threads_is_bounded() {
        let n = default_threads();
        assert!((1..=8).contains(&n));
    }
}
