use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, anyhow, bail};
use log::{debug, info};

use crate::whisper::config::model_file;

/// ggml model names published for whisper.cpp.
pub const AVAILABLE_MODELS: &[&str] = &[
    "tiny",
    "tiny.en",
    "tiny-q5_1",
    "tiny.en-q5_1",
    "tiny-q8_0",
    "base",
    "base.en",
    "base-q5_1",
    "base.en-q5_1",
    "base-q8_0",
    "small",
    "small.en",
    "small.en-tdrz",
    "small-q5_1",
    "small.en-q5_1",
    "small-q8_0",
    "medium",
    "medium.en",
    "medium-q5_0",
    "medium.en-q5_0",
    "medium-q8_0",
    "large-v1",
    "large-v2",
    "large-v2-q5_0",
    "large-v2-q8_0",
    "large-v3",
    "large-v3-q5_0",
    "large-v3-turbo",
    "large-v3-turbo-q5_0",
    "large-v3-turbo-q8_0",
];

const DOWNLOAD_TOOLS: &[&str] = &["wget2", "wget", "curl"];

/// Models grouped by family, one family per line.
pub fn model_listing() -> String {
    let mut families: Vec<(&str, Vec<&str>)> = Vec::new();
    for &model in AVAILABLE_MODELS {
        let family = model.split(['.', '-']).next().unwrap_or(model);
        if let Some((current, members)) = families.last_mut() {
            if *current == family {
                members.push(model);
                continue;
            }
        }
        families.push((family, vec![model]));
    }

    let mut out = String::from("Available models:\n");
    for (family, members) in families {
        out.push_str(&format!("  {family:<6} {}\n", members.join(" ")));
    }
    out.push_str("\n.en = english-only  -q5_[01]/-q8_0 = quantized  -tdrz = tinydiarize\n");
    out
}

pub fn validate_model(model: &str) -> Result<()> {
    if AVAILABLE_MODELS.contains(&model) {
        Ok(())
    } else {
        Err(anyhow!("Invalid model: {model}\n\n{}", model_listing()))
    }
}

pub fn download_url(model: &str) -> String {
    let repo = if model.contains("tdrz") {
        "https://huggingface.co/akashmjn/tinydiarize-whisper.cpp"
    } else {
        "https://huggingface.co/ggerganov/whisper.cpp"
    };
    format!("{repo}/resolve/main/ggml-{model}.bin")
}

fn find_download_tool() -> Result<&'static str> {
    DOWNLOAD_TOOLS
        .iter()
        .copied()
        .find(|tool| {
            Command::new(tool)
                .arg("--version")
                .output()
                .map(|out| out.status.success())
                .unwrap_or(false)
        })
        .ok_or_else(|| {
            anyhow!("Either wget, wget2, or curl is required to download models. Please install one of them.")
        })
}

fn tool_args(tool: &str, url: &str, output: &Path) -> Vec<String> {
    let flags: &[&str] = match tool {
        "wget2" => &["--no-config", "--progress", "bar", "-O"],
        "wget" => &["--no-config", "--quiet", "--show-progress", "-O"],
        _ => &["-L", "--fail", "--output"],
    };
    let mut args: Vec<String> = flags.iter().map(|s| s.to_string()).collect();
    args.push(output.display().to_string());
    args.push(url.to_string());
    args
}

/// Fetches `ggml-<model>.bin` into `models_dir`, skipping when present.
pub fn download_model(model: &str, models_dir: &Path) -> Result<PathBuf> {
    validate_model(model)?;

    let file_path = model_file(models_dir, model);
    if file_path.exists() {
        info!("Model '{model}' already exists at {}", file_path.display());
        return Ok(file_path);
    }

    std::fs::create_dir_all(models_dir)
        .with_context(|| format!("Failed to create {}", models_dir.display()))?;

    let url = download_url(model);
    let tool = find_download_tool()?;
    info!("Downloading ggml model '{model}' from {url} with {tool}");

    // download next to the target so an interrupted transfer never looks complete
    let partial = file_path.with_extension("bin.part");
    let args = tool_args(tool, &url, &partial);
    debug!("{tool} {}", args.join(" "));

    let status = Command::new(tool)
        .args(&args)
        .status()
        .with_context(|| format!("Failed to execute {tool}"))?;
    if !status.success() {
        let _ = std::fs::remove_file(&partial);
        bail!("Download failed with {tool} ({status})");
    }

    std::fs::rename(&partial, &file_path)
        .with_context(|| format!("Failed to move model into {}", file_path.display()))?;

    info!("Model '{model}' saved in {}", file_path.display());
    Ok(file_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_models() {
        assert!(validate_model("medium").is_ok());
        assert!(validate_model("large-v3-turbo-q5_0").is_ok());
    }

    #[test]
    fn rejects_unknown_model_with_listing() {
        let err = validate_model("gigantic").unwrap_err().to_string();
        assert!(err.contains("Invalid model: gigantic"));
        assert!(err.contains("medium.en"));
    }

    #[test]
    fn listing_groups_by_family() {
        let listing = model_listing();
        let tiny_line = listing
            .lines()
            .find(|l| l.trim_start().starts_with("tiny"))
            .unwrap();
        assert!(tiny_line.contains("tiny.en-q5_1"));
        assert!(!tiny_line.contains("base"));
    }

    #[test]
    fn tinydiarize_models_come_from_their_own_repo() {
        assert_eq!(
            download_url("small.en-tdrz"),
            "https://huggingface.co/akashmjn/tinydiarize-whisper.cpp/resolve/main/ggml-small.en-tdrz.bin"
        );
        assert!(download_url("base").starts_with("https://huggingface.co/ggerganov/whisper.cpp/"));
    }

    #[test]
    fn curl_fails_on_http_errors() {
        let args = tool_args("curl", "https://example.com/m.bin", Path::new("/tmp/m.bin.part"));
        assert_eq!(
            args,
            vec!["-L", "--fail", "--output", "/tmp/m.bin.part", "https://example.com/m.bin"]
        );
    }

    #[test]
    fn existing_model_is_not_downloaded_again() {
        let dir = tempfile::tempdir().unwrap();
        let existing = model_file(dir.path(), "tiny");
        std::fs::write(&existing, b"weights").unwrap();

        let path = download_model("tiny", dir.path()).unwrap();
        assert_eq!(path, existing);
        assert_eq!(std::fs::read(&path).unwrap(), b"weights");
    }
}
