use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::whisper::config::{DEFAULT_MODEL, DEFAULT_MODELS_DIR};

#[derive(Parser)]
#[command(
    name = "clipscribe",
    about = "Clipscribe - media to subtitle timeline transcription",
    long_about = "Runs an HTTP service that transcribes uploaded audio or video with Whisper and returns subtitle clips, plus a client and a model downloader.",
    args_conflicts_with_subcommands = true,
    after_help = "EXAMPLES:\n    # Fetch a model, then start the service on port 5001\n    clipscribe download medium\n    clipscribe serve\n\n    # Without a subcommand the service starts as well\n    clipscribe --port 8080\n\n    # Serve a smaller model on another port\n    clipscribe serve --model small --port 8080\n\n    # Send a video to a running service\n    clipscribe file talk.mp4 --language en\n\n    # Use a different server when in client mode\n    clipscribe file talk.mp4 --server-url http://my-server:5001"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub serve: ServeArgs,
}

impl Cli {
    /// The chosen subcommand; `serve` when none was given.
    pub fn into_command(self) -> Commands {
        self.command.unwrap_or(Commands::Serve(self.serve))
    }
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(name = "serve")]
    Serve(ServeArgs),
    #[command(name = "file")]
    TranscribeFile {
        media_file: PathBuf,

        /// ISO language code; omit to auto-detect
        #[arg(long, short = 'l')]
        language: Option<String>,

        #[arg(long, default_value = "http://localhost:5001")]
        server_url: String,
    },
    #[command(name = "download")]
    Download {
        #[arg(default_value = DEFAULT_MODEL)]
        model: String,

        #[arg(long, env = "WHISPER_MODELS_DIR", default_value = DEFAULT_MODELS_DIR)]
        models_dir: PathBuf,
    },
    #[command(name = "models")]
    ListModels,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long, env = "SERVICE_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind; falls back to PYTHON_SERVICE_PORT, then 5001
    #[arg(long, env = "SERVICE_PORT")]
    pub port: Option<u16>,

    /// ggml model name, resolved inside --models-dir
    #[arg(long, env = "WHISPER_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    #[arg(long, env = "WHISPER_MODELS_DIR", default_value = DEFAULT_MODELS_DIR)]
    pub models_dir: PathBuf,

    /// Explicit model file; overrides --model and --models-dir
    #[arg(long, env = "WHISPER_MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    #[arg(long, env = "WHISPER_USE_GPU", default_value = "true", action = clap::ArgAction::Set)]
    pub use_gpu: bool,

    #[arg(long, env = "WHISPER_THREADS")]
    pub threads: Option<i32>,

    #[arg(long, env = "MAX_UPLOAD_MB", default_value = "1024")]
    pub max_upload_mb: u64,

    #[arg(long, env = "FFMPEG_BIN", default_value = "ffmpeg")]
    pub ffmpeg: String,

    /// Load the model at startup instead of on the first request
    #[arg(long)]
    pub preload: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_defaults() {
        let cli = Cli::try_parse_from(["clipscribe", "serve"]).unwrap();
        let Commands::Serve(args) = cli.into_command() else {
            panic!("expected serve");
        };
        assert_eq!(args.model, DEFAULT_MODEL);
        assert_eq!(args.max_upload_mb, 1024);
        assert!(!args.preload);
    }

    #[test]
    fn file_accepts_language() {
        let cli =
            Cli::try_parse_from(["clipscribe", "file", "talk.mp4", "--language", "de"]).unwrap();
        match cli.into_command() {
            Commands::TranscribeFile {
                media_file,
                language,
                ..
            } => {
                assert_eq!(media_file, PathBuf::from("talk.mp4"));
                assert_eq!(language.as_deref(), Some("de"));
            }
            _ => panic!("expected file"),
        }
    }

    #[test]
    fn gpu_can_be_disabled() {
        let cli = Cli::try_parse_from(["clipscribe", "serve", "--use-gpu", "false"]).unwrap();
        let Commands::Serve(args) = cli.into_command() else {
            panic!("expected serve");
        };
        assert!(!args.use_gpu);
    }

    #[test]
    fn no_subcommand_starts_the_server() {
        let cli = Cli::try_parse_from(["clipscribe"]).unwrap();
        assert!(matches!(cli.into_command(), Commands::Serve(_)));
    }

    #[test]
    fn serve_flags_work_without_subcommand() {
        let cli = Cli::try_parse_from(["clipscribe", "--port", "8080", "--preload"]).unwrap();
        let Commands::Serve(args) = cli.into_command() else {
            panic!("expected serve");
        };
        assert_eq!(args.port, Some(8080));
        assert!(args.preload);
    }

    #[test]
    fn subcommand_still_wins_over_default() {
        let cli = Cli::try_parse_from(["clipscribe", "models"]).unwrap();
        assert!(matches!(cli.into_command(), Commands::ListModels));
    }
}
