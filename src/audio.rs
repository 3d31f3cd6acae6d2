use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, anyhow, bail};
use log::debug;

/// Sample rate whisper.cpp expects.
pub const WHISPER_SAMPLE_RATE: u32 = 16000;

/// Arguments that make ffmpeg write 16 kHz mono s16le PCM to stdout.
pub fn ffmpeg_args(input: &Path) -> Vec<String> {
    let rate = WHISPER_SAMPLE_RATE.to_string();
    vec![
        "-nostdin".into(),
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-i".into(),
        input.display().to_string(),
        "-vn".into(), // drop video streams
        "-ac".into(),
        "1".into(),
        "-ar".into(),
        rate,
        "-f".into(),
        "s16le".into(),
        "-".into(),
    ]
}

/// Decodes any container ffmpeg understands into whisper-ready samples.
pub fn decode_media_file(ffmpeg: &str, input: &Path) -> Result<Vec<f32>> {
    debug!("Decoding {} with {ffmpeg}", input.display());

    let output = Command::new(ffmpeg)
        .args(ffmpeg_args(input))
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("Failed to run {ffmpeg}; is it installed?"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "ffmpeg could not decode the file ({}): {}",
            output.status,
            stderr.trim()
        );
    }

    let samples = pcm16_to_samples(&output.stdout).map_err(|e| anyhow!(e))?;
    if samples.is_empty() {
        bail!("No audio stream found in uploaded file");
    }

    debug!(
        "Decoded {} samples ({:.2}s of audio)",
        samples.len(),
        samples.len() as f64 / WHISPER_SAMPLE_RATE as f64
    );
    Ok(samples)
}

/// Little-endian signed 16-bit PCM to normalized `f32`.
pub fn pcm16_to_samples(audio_bytes: &[u8]) -> Result<Vec<f32>, String> {
    if audio_bytes.len() % 2 != 0 {
        return Err(format!(
            "Invalid 16-bit audio data: odd number of bytes ({})",
            audio_bytes.len()
        ));
    }
    Ok(audio_bytes
        .chunks_exact(2)
        .map(|chunk| {
            let sample = i16::from_le_bytes([chunk[0], chunk[1]]);
            sample as f32 / i16::MAX as f32
        })
        .collect())
}
