//! Argument lists for the extraction tool

use super::traits::RunMode;
use crate::types::{Quality, RetrievalRequest};
use std::ffi::OsString;
use std::path::Path;

/// Format selector used when downloading
fn download_selector(request: &RetrievalRequest) -> String {
    if request.audio_only() {
        return "bestaudio".to_string();
    }

    match request.quality() {
        Quality::Height(height) => format!(
            "bestvideo[height<={h}][ext=mp4]+bestaudio[ext=m4a]/best[height<={h}]",
            h = height
        ),
        Quality::Best => "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best".to_string(),
    }
}

/// Format selector used when only resolving URLs
fn resolve_selector(request: &RetrievalRequest) -> String {
    if request.audio_only() {
        return "bestaudio".to_string();
    }

    match request.quality() {
        Quality::Height(height) => format!(
            "bestvideo[height<={h}]+bestaudio/best[height<={h}]",
            h = height
        ),
        Quality::Best => "bestvideo+bestaudio/best".to_string(),
    }
}

/// Mode-specific arguments of a download job, URL last
pub fn download_args(
    request: &RetrievalRequest,
    output_template: &Path,
    mode: RunMode,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-f".into(), download_selector(request).into()];

    if request.audio_only() {
        args.extend(
            ["--extract-audio", "--audio-format", "mp3", "--audio-quality", "0"]
                .map(OsString::from),
        );
    } else {
        args.extend(["--merge-output-format", "mp4"].map(OsString::from));
    }

    if mode == RunMode::Progressive {
        args.extend(["--progress", "--newline"].map(OsString::from));
    }

    args.push("-o".into());
    args.push(output_template.as_os_str().to_owned());
    args.push(request.url().into());
    args
}

/// Arguments that print the upstream URLs instead of downloading
pub fn resolve_args(request: &RetrievalRequest) -> Vec<OsString> {
    vec![
        "--get-url".into(),
        "-f".into(),
        resolve_selector(request).into(),
        request.url().into(),
    ]
}
