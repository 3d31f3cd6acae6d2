use std::sync::Arc;

use actix_cors::Cors;
use actix_multipart::{Field, Multipart};
use actix_web::{
    App, HttpMessage, HttpRequest, HttpResponse, HttpServer, Responder, get, middleware::Logger,
    post, web,
};
use anyhow::{Context, anyhow};
use futures_util::TryStreamExt;
use log::{debug, error, info, warn};

use crate::config::ServiceConfig;
use crate::dto::{HealthResponse, TranscribeResponse};
use crate::error::{ApiError, ValidationError};
use crate::timeline::segments_to_timeline_clips;
use crate::upload::StagedUpload;
use crate::whisper::{Transcriber, WhisperTranscriber};

const FILE_FIELD: &str = "file";
const LANGUAGE_FIELD: &str = "language";
const MAX_TEXT_FIELD_BYTES: usize = 1024;

pub struct AppState {
    pub transcriber: Arc<dyn Transcriber>,
    pub max_upload_bytes: u64,
}

impl AppState {
    pub fn new(transcriber: Arc<dyn Transcriber>, max_upload_bytes: u64) -> Self {
        Self {
            transcriber,
            max_upload_bytes,
        }
    }
}

#[get("/health")]
pub async fn health_check() -> impl Responder {
    debug!("Health check endpoint called");
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// What the `file` part turned out to be once the form is read.
enum FilePart {
    Missing,
    EmptyName,
    Staged(StagedUpload),
}

struct TranscribeForm {
    file: FilePart,
    language: Option<String>,
}

#[post("/transcribe")]
pub async fn transcribe_upload(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    debug!("Transcription request received");

    if !req.content_type().starts_with("multipart/") {
        warn!("Transcription request is not multipart: {:?}", req.content_type());
        return Err(ValidationError::MissingFile.into());
    }

    let form = read_form(payload, data.max_upload_bytes).await?;

    let upload = match form.file {
        FilePart::Staged(upload) => upload,
        FilePart::EmptyName => {
            warn!("Upload has an empty filename");
            return Err(ValidationError::EmptyFilename.into());
        }
        FilePart::Missing => {
            warn!("No file provided in transcription request");
            return Err(ValidationError::MissingFile.into());
        }
    };

    info!(
        "Processing: {} ({} bytes, saved as {})",
        upload.original_name(),
        upload.bytes_written(),
        upload.path().display()
    );

    let transcriber = Arc::clone(&data.transcriber);
    let media = upload.to_path_buf();
    let language = form.language;
    let segments = web::block(move || transcriber.transcribe(&media, language.as_deref()))
        .await
        .map_err(|e| anyhow!("Transcription worker failed: {e}"))??;

    let clips = segments_to_timeline_clips(&segments);
    info!("Done, {} subtitle clip(s) generated", clips.len());

    // `upload` drops here, removing the temp file
    Ok(HttpResponse::Ok().json(TranscribeResponse::from(clips)))
}

async fn read_form(
    mut payload: Multipart,
    max_upload_bytes: u64,
) -> anyhow::Result<TranscribeForm> {
    let mut file = FilePart::Missing;
    let mut language = None;

    while let Some(field) = payload
        .try_next()
        .await
        .map_err(|e| anyhow!("Failed to read multipart body: {e}"))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(FILE_FIELD) if matches!(file, FilePart::Missing) => {
                let filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .map(str::to_owned);
                file = match filename {
                    // plain form value, not a file
                    None => {
                        drain_field(field).await?;
                        FilePart::Missing
                    }
                    Some(filename) if filename.is_empty() => {
                        drain_field(field).await?;
                        FilePart::EmptyName
                    }
                    Some(filename) => {
                        FilePart::Staged(stage_field(field, &filename, max_upload_bytes).await?)
                    }
                };
            }
            Some(LANGUAGE_FIELD) => {
                let value = read_text_field(field).await?;
                debug!("Language hint: {value:?}");
                language = Some(value.trim().to_string()).filter(|l| !l.is_empty());
            }
            _ => drain_field(field).await?,
        }
    }

    Ok(TranscribeForm { file, language })
}

async fn stage_field(
    mut field: Field,
    filename: &str,
    max_upload_bytes: u64,
) -> anyhow::Result<StagedUpload> {
    let mut upload = StagedUpload::create(filename, max_upload_bytes)?;
    while let Some(chunk) = field
        .try_next()
        .await
        .map_err(|e| anyhow!("Failed to read uploaded file: {e}"))?
    {
        upload.write_chunk(&chunk).await?;
    }
    upload.finish().await?;
    debug!("Read field data: {} bytes", upload.bytes_written());
    Ok(upload)
}

async fn read_text_field(mut field: Field) -> anyhow::Result<String> {
    let mut data = Vec::new();
    while let Some(chunk) = field
        .try_next()
        .await
        .map_err(|e| anyhow!("Failed to read form field: {e}"))?
    {
        if data.len() + chunk.len() > MAX_TEXT_FIELD_BYTES {
            return Err(anyhow!("Form field exceeds {MAX_TEXT_FIELD_BYTES} bytes"));
        }
        data.extend_from_slice(&chunk);
    }
    String::from_utf8(data).context("Form field is not valid UTF-8")
}

async fn drain_field(mut field: Field) -> anyhow::Result<()> {
    while field
        .try_next()
        .await
        .map_err(|e| anyhow!("Failed to read form field: {e}"))?
        .is_some()
    {}
    Ok(())
}

pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allow_any_method()
        .allow_any_header()
        .max_age(3600)
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check).service(transcribe_upload);
}

pub async fn run_server(config: ServiceConfig) -> std::io::Result<()> {
    info!("Starting clipscribe transcription service");
    info!(
        "Using configuration: model_path={:?}, use_gpu={}, num_threads={}, ffmpeg={}",
        config.whisper.model_path,
        config.whisper.use_gpu,
        config.whisper.num_threads,
        config.whisper.ffmpeg
    );

    whisper_rs::install_logging_hooks();
    let transcriber = WhisperTranscriber::new(config.whisper.clone());
    if config.preload {
        info!("Preloading Whisper model...");
        if let Err(e) = transcriber.preload() {
            error!("Failed to preload model: {e:#}");
            std::process::exit(1);
        }
    } else if !config.whisper.model_path.exists() {
        warn!(
            "Model file {} does not exist yet; transcription requests will fail until it does",
            config.whisper.model_path.display()
        );
    }

    let app_state = web::Data::new(AppState::new(Arc::new(transcriber), config.max_upload_bytes));

    let host = config.host;
    let port = config.port;
    info!("Starting HTTP server on {host}:{port}");

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(cors())
            .wrap(Logger::default())
            .configure(routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
