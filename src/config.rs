use std::path::PathBuf;

use log::warn;

use crate::cli::ServeArgs;
use crate::whisper::config::{WhisperConfig, default_threads, resolve_model_path};

const MIB: u64 = 1024 * 1024;

pub const DEFAULT_PORT: u16 = 5001;

/// Port variable read by earlier deployments of the service.
pub const LEGACY_PORT_ENV: &str = "PYTHON_SERVICE_PORT";

/// `--port`/`SERVICE_PORT` first, then the legacy variable, then [`DEFAULT_PORT`].
pub fn resolve_port(explicit: Option<u16>, legacy: Option<&str>) -> u16 {
    if let Some(port) = explicit {
        return port;
    }
    match legacy.map(str::trim) {
        Some(value) => value.parse().unwrap_or_else(|_| {
            warn!("Ignoring {LEGACY_PORT_ENV}={value:?}, not a valid port");
            DEFAULT_PORT
        }),
        None => DEFAULT_PORT,
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: u64,
    pub preload: bool,
    pub whisper: WhisperConfig,
}

impl From<ServeArgs> for ServiceConfig {
    fn from(args: ServeArgs) -> Self {
        let model_path = resolve_model_path(args.model_path, &args.models_dir, &args.model);
        Self {
            host: args.host,
            port: resolve_port(args.port, std::env::var(LEGACY_PORT_ENV).ok().as_deref()),
            max_upload_bytes: args.max_upload_mb.saturating_mul(MIB),
            preload: args.preload,
            whisper: WhisperConfig {
                model_path,
                use_gpu: args.use_gpu,
                num_threads: args.threads.unwrap_or_else(default_threads),
                ffmpeg: args.ffmpeg,
            },
        }
    }
}

#[derive(Debug)]
pub struct ClientConfig {
    pub server_url: String,
    pub media_file: PathBuf,
    pub language: Option<String>,
}

impl ClientConfig {
    pub fn new(server_url: String, media_file: PathBuf, language: Option<String>) -> Self {
        Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            media_file,
            language: language.filter(|l| !l.trim().is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::cli::{Cli, Commands};

    fn serve_args(extra: &[&str]) -> ServeArgs {
        let mut argv = vec!["clipscribe", "serve"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().into_command() {
            Commands::Serve(args) => args,
            _ => unreachable!(),
        }
    }

    #[test]
    fn builds_model_path_from_name_and_dir() {
        let config = ServiceConfig::from(serve_args(&[
            "--model",
            "base.en",
            "--models-dir",
            "/srv/models",
            "--max-upload-mb",
            "2",
        ]));
        assert_eq!(
            config.whisper.model_path,
            PathBuf::from("/srv/models/ggml-base.en.bin")
        );
        assert_eq!(config.max_upload_bytes, 2 * MIB);
    }

    #[test]
    fn explicit_thread_count_is_kept() {
        let config = ServiceConfig::from(serve_args(&["--threads", "3", "--port", "9000"]));
        assert_eq!(config.whisper.num_threads, 3);
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn port_flag_beats_legacy_variable() {
        assert_eq!(resolve_port(Some(9000), Some("7000")), 9000);
    }

    #[test]
    fn legacy_port_variable_is_honoured() {
        assert_eq!(resolve_port(None, Some("7000")), 7000);
        assert_eq!(resolve_port(None, Some(" 7001 ")), 7001);
    }

    #[test]
    fn port_defaults_when_nothing_is_set() {
        assert_eq!(resolve_port(None, None), DEFAULT_PORT);
        assert_eq!(resolve_port(None, Some("not-a-port")), DEFAULT_PORT);
    }

    #[test]
    fn client_config_normalizes_inputs() {
        let config = ClientConfig::new(
            "http://localhost:5001/".to_string(),
            PathBuf::from("a.wav"),
            Some("  ".to_string()),
        );
        assert_eq!(config.server_url, "http://localhost:5001");
        assert!(config.language.is_none());
    }
}
