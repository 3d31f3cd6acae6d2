//! Media upload to subtitle timeline transcription service.
//!
//! `POST /transcribe` takes a multipart `file` (any container ffmpeg can
//! read) plus an optional `language`, runs it through Whisper and answers
//! with `{clips: [{start, duration, subtitleText}], segmentCount}`.

pub mod audio;
pub mod cli;
pub mod client;
pub mod config;
pub mod download;
pub mod dto;
pub mod error;
pub mod server;
pub mod timeline;
pub mod upload;
pub mod whisper;
