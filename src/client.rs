use anyhow::{Result, anyhow};
use serde_json::Value;

use crate::config::ClientConfig;

pub async fn check_server_health(server_url: &str) -> Result<()> {
    let client = reqwest::Client::new();

    println!("🔍 Checking server health at: {server_url}/health");

    let response = client
        .get(format!("{server_url}/health"))
        .send()
        .await
        .map_err(|e| anyhow!("Failed to connect to server: {}", e))?;

    if response.status().is_success() {
        println!("✅ Server is healthy");
        Ok(())
    } else {
        Err(anyhow!("Server health check failed: {}", response.status()))
    }
}

pub async fn send_transcription_request(config: &ClientConfig) -> Result<Value> {
    let media = tokio::fs::read(&config.media_file).await.map_err(|e| {
        anyhow!(
            "Failed to read media file {}: {}",
            config.media_file.display(),
            e
        )
    })?;

    let filename = config
        .media_file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();

    println!("📁 Media file: {} ({} bytes)", filename, media.len());

    let mut form = reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::bytes(media).file_name(filename),
    );
    if let Some(language) = &config.language {
        form = form.text("language", language.clone());
    }

    println!(
        "🚀 Sending transcription request to: {}/transcribe (language: {})",
        config.server_url,
        config.language.as_deref().unwrap_or("auto")
    );

    let response = reqwest::Client::new()
        .post(format!("{}/transcribe", config.server_url))
        .multipart(form)
        .send()
        .await
        .map_err(|e| anyhow!("Failed to send request: {}", e))?;

    let status = response.status();
    let response_text = response
        .text()
        .await
        .map_err(|e| anyhow!("Failed to read response: {}", e))?;

    if !status.is_success() {
        return Err(anyhow!(
            "Server returned error {}: {}",
            status,
            response_text
        ));
    }

    serde_json::from_str(&response_text)
        .map_err(|e| anyhow!("Failed to parse JSON response: {}", e))
}

pub async fn run_client(config: ClientConfig) -> Result<()> {
    println!("🎬 Clipscribe Client");
    println!("===================");

    if let Err(e) = check_server_health(&config.server_url).await {
        eprintln!("❌ {e}");
        eprintln!("💡 Make sure the server is running: clipscribe serve");
        return Err(e);
    }

    match send_transcription_request(&config).await {
        Ok(result) => {
            let clips = result
                .get("segmentCount")
                .and_then(Value::as_u64)
                .unwrap_or(0);
            println!("\n✅ Transcription completed: {clips} clip(s)");
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Err(e) => {
            eprintln!("❌ Transcription failed: {e}");
            return Err(e);
        }
    }

    Ok(())
}
