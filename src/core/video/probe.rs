//! Stream inspection through ffprobe.

use super::VideoConfig;
use crate::core::tool::ToolRunner;
use crate::error::ToolError;
use serde::Deserialize;
use std::ffi::OsStr;
use std::path::Path;
use tracing::{debug, info};

const TOOL: &str = "ffprobe";

const PROBE_ARGS: [&str; 8] = [
    "-v",
    "error",
    "-select_streams",
    "v:0",
    "-show_entries",
    "stream=width,height,codec_name,duration:format=duration",
    "-of",
    "json",
];

/// First video stream of a file
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    pub codec: String,
    pub duration_secs: f64,
}

/// Trait for stream inspectors
pub trait MediaProbe: Send + Sync {
    fn probe(&self, path: &Path) -> Result<StreamInfo, ToolError>;
}

/// [`MediaProbe`] backed by the ffprobe executable
pub struct Ffprobe {
    runner: ToolRunner,
}

impl Ffprobe {
    /// Locate ffprobe; `None` disables near-duplicate analysis
    pub fn detect(config: &VideoConfig) -> Option<Self> {
        let runner = ToolRunner::new(TOOL, &config.ffprobe_path);
        match runner.version("-version") {
            Ok(version) => {
                info!("Using {}", version);
                Some(Self { runner })
            }
            Err(e) => {
                info!("Near-duplicate video analysis disabled: {}", e);
                None
            }
        }
    }
}

impl MediaProbe for Ffprobe {
    fn probe(&self, path: &Path) -> Result<StreamInfo, ToolError> {
        let mut args: Vec<&OsStr> = PROBE_ARGS.iter().map(OsStr::new).collect();
        args.push(path.as_os_str());
        let output = self.runner.run(&args)?;
        debug!("ffprobe {}: {}", path.display(), output.stdout.trim());
        parse_probe_output(&output.stdout).map_err(|reason| ToolError::MalformedOutput {
            tool: TOOL.to_string(),
            reason: format!("{}: {}", path.display(), reason),
        })
    }
}

#[derive(Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    codec_name: Option<String>,
    duration: Option<String>,
}

#[derive(Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Parse ffprobe's JSON; the stream duration wins over the container's
pub fn parse_probe_output(json: &str) -> Result<StreamInfo, String> {
    let output: ProbeOutput = serde_json::from_str(json).map_err(|e| e.to_string())?;
    let stream = output
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| "no video stream".to_string())?;

    let duration = stream
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .or_else(|| {
            output
                .format
                .and_then(|f| f.duration)
                .and_then(|d| d.parse::<f64>().ok())
        })
        .ok_or_else(|| "missing duration".to_string())?;

    Ok(StreamInfo {
        width: stream.width.ok_or("missing width")?,
        height: stream.height.ok_or("missing height")?,
        codec: stream.codec_name.ok_or("missing codec")?,
        duration_secs: duration,
    })
}
