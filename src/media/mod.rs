use std::{
    path::{Path, PathBuf},
    process::Stdio,
};

use anyhow::{anyhow, Context};
use log::{error, info};
use serde::Deserialize;
use strum_macros::{AsRefStr, Display};
use tokio::{fs, process::Command};

pub mod aspect;

pub use aspect::AspectRatio;

#[derive(Clone, Copy, Debug, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum MediaTool {
    FFmpeg,
    FFprobe,
}

/// Locations of the ffmpeg/ffprobe executables. Defaults to looking them up
/// on the path.
#[derive(Clone, Debug)]
pub struct MediaTools {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl Default for MediaTools {
    fn default() -> Self {
        Self::new(MediaTool::FFmpeg.as_ref(), MediaTool::FFprobe.as_ref())
    }
}

// "ffmpeg version 7.1 Copyright ..." -> "7.1"
fn parse_version(output: &str) -> Option<&str> {
    output.split_whitespace().nth(2)
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    #[serde(default)]
    codec_type: String,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
}

impl MediaTools {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    pub fn program(&self, tool: MediaTool) -> &Path {
        match tool {
            MediaTool::FFmpeg => &self.ffmpeg,
            MediaTool::FFprobe => &self.ffprobe,
        }
    }

    pub async fn version(&self, tool: MediaTool) -> anyhow::Result<String> {
        let output = Command::new(self.program(tool))
            .arg("-version")
            .output()
            .await?;
        let version = String::from_utf8(output.stdout)?;
        parse_version(&version)
            .map(str::to_string)
            .ok_or_else(|| anyhow!("failed to get version from {} output", tool))
    }

    pub async fn get_video_aspect_ratio(&self, path: &Path) -> anyhow::Result<AspectRatio> {
        let args = ["-v", "error", "-print_format", "json", "-show_streams"];
        info!("running 'ffprobe {} {}'", args.join(" "), path.display());

        let output = Command::new(&self.ffprobe)
            .args(args)
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| anyhow!("failed to spawn ffprobe: {}", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("{}", stderr.trim());
            anyhow::bail!("ffprobe exited with {}: {}", output.status, stderr.trim());
        }

        aspect_ratio_from_probe(&output.stdout)
    }

    /// Remuxes `input` so the moov atom sits at the front of the file. The
    /// result is written next to the input with a `.processing` suffix.
    pub async fn process_video_for_fast_start(&self, input: &Path) -> anyhow::Result<PathBuf> {
        let output_path = processing_path(input);

        let mut command = Command::new(&self.ffmpeg);
        command
            .arg("-i")
            .arg(input)
            .args(["-c", "copy", "-movflags", "faststart", "-f", "mp4"])
            .arg(&output_path)
            .stdin(Stdio::null());

        info!(
            "running 'ffmpeg -i {} -c copy -movflags faststart -f mp4 {}'",
            input.display(),
            output_path.display()
        );

        let output = command
            .output()
            .await
            .map_err(|e| anyhow!("failed to spawn ffmpeg: {}", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("{}", stderr.trim());
            // ffmpeg may leave a partial file behind
            let _ = fs::remove_file(&output_path).await;
            anyhow::bail!("error processing video: {}, {}", stderr.trim(), output.status);
        }

        let metadata = fs::metadata(&output_path)
            .await
            .context("could not stat processed file")?;
        if metadata.len() == 0 {
            let _ = fs::remove_file(&output_path).await;
            anyhow::bail!("processed file is empty");
        }

        Ok(output_path)
    }
}

pub fn processing_path(input: &Path) -> PathBuf {
    let mut path = input.as_os_str().to_owned();
    path.push(".processing");
    PathBuf::from(path)
}

fn aspect_ratio_from_probe(stdout: &[u8]) -> anyhow::Result<AspectRatio> {
    let probe: ProbeOutput =
        serde_json::from_slice(stdout).context("could not parse ffprobe output")?;

    if probe.streams.is_empty() {
        anyhow::bail!("ffprobe did not output any streams");
    }

    let stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .ok_or_else(|| anyhow!("ffprobe did not find a video stream"))?;

    if stream.width == 0 || stream.height == 0 {
        anyhow::bail!("video stream has no dimensions");
    }

    Ok(AspectRatio::classify(stream.width, stream.height))
}
