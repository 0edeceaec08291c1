use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::foundation::core::{Fps, ensure_parent_dir};
use crate::foundation::error::{ReelError, ReelResult};

/// Input to a silent-video encode: a directory of pattern-named frames.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequenceJob {
    pub frames_dir: PathBuf,
    /// printf-style file pattern inside `frames_dir`, e.g. `frame_%04d.png`.
    pub pattern: String,
    pub fps: Fps,
    pub out_path: PathBuf,
}

/// Input to a mux: silent video plus narration audio.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MuxJob {
    pub video_path: PathBuf,
    pub audio_path: PathBuf,
    pub out_path: PathBuf,
}

/// The external encoding capability.
pub trait VideoEncoder {
    /// Encode the frames selected by `job.pattern`, starting at index 0, into a silent video.
    fn encode_sequence(&self, job: &SequenceJob) -> ReelResult<()>;

    /// Copy the video stream of `job.video_path` unchanged and add re-encoded audio.
    fn mux(&self, job: &MuxJob) -> ReelResult<()>;
}

pub fn is_ffmpeg_on_path() -> bool {
    tool_on_path("ffmpeg")
}

pub fn is_ffprobe_on_path() -> bool {
    tool_on_path("ffprobe")
}

fn tool_on_path(tool: &str) -> bool {
    Command::new(tool)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Encoder that runs the system `ffmpeg` binary.
#[derive(Clone, Debug)]
pub struct FfmpegEncoder {
    program: PathBuf,
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
        }
    }
}

impl FfmpegEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific `ffmpeg` executable instead of the one on `PATH`.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn sequence_command(&self, job: &SequenceJob) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-y", "-loglevel", "error", "-framerate"])
            .arg(job.fps.get().to_string())
            .args(["-start_number", "0", "-i"])
            .arg(job.frames_dir.join(&job.pattern))
            .args([
                "-an",
                "-c:v",
                "libx264",
                "-pix_fmt",
                "yuv420p",
                "-r",
            ])
            .arg(job.fps.get().to_string())
            .args(["-movflags", "+faststart"])
            .arg(&job.out_path);
        cmd
    }

    pub fn mux_command(&self, job: &MuxJob) -> Command {
        // No `-shortest`: a shorter narration must not trim the video.
        let mut cmd = Command::new(&self.program);
        cmd.args(["-y", "-loglevel", "error", "-i"])
            .arg(&job.video_path)
            .arg("-i")
            .arg(&job.audio_path)
            .args([
                "-map", "0:v:0", "-map", "1:a:0", "-c:v", "copy", "-c:a", "aac",
            ])
            .arg(&job.out_path);
        cmd
    }

    fn run(&self, mut cmd: Command, what: &str) -> ReelResult<()> {
        debug!(?cmd, "running ffmpeg");
        let output = cmd.stdin(Stdio::null()).output().map_err(|e| {
            ReelError::encode(format!(
                "failed to spawn '{}' for {what} (is it installed and on PATH?): {e}",
                self.program.display()
            ))
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReelError::encode(format!(
                "ffmpeg {what} exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

impl VideoEncoder for FfmpegEncoder {
    fn encode_sequence(&self, job: &SequenceJob) -> ReelResult<()> {
        ensure_parent_dir(&job.out_path)?;
        self.run(self.sequence_command(job), "sequence encode")
    }

    fn mux(&self, job: &MuxJob) -> ReelResult<()> {
        for input in [&job.video_path, &job.audio_path] {
            if !input.is_file() {
                return Err(ReelError::encode(format!(
                    "mux input '{}' does not exist",
                    input.display()
                )));
            }
        }
        ensure_parent_dir(&job.out_path)?;
        self.run(self.mux_command(job), "mux")
    }
}

/// Stream facts reported by `ffprobe`.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub fps_num: u32,
    pub fps_den: u32,
    /// Duration of the video stream in seconds.
    pub video_duration_sec: f64,
    pub video_frames: Option<u64>,
    pub has_audio: bool,
}

#[derive(Debug, serde::Deserialize)]
struct ProbeOut {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, serde::Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
    nb_frames: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

pub fn probe_video(path: &Path) -> ReelResult<VideoInfo> {
    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(path)
        .output()
        .map_err(|e| ReelError::encode(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(ReelError::encode(format!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    parse_probe_json(&out.stdout)
}

pub(crate) fn parse_probe_json(bytes: &[u8]) -> ReelResult<VideoInfo> {
    let parsed: ProbeOut = serde_json::from_slice(bytes)
        .map_err(|e| ReelError::encode(format!("ffprobe json parse failed: {e}")))?;
    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| ReelError::encode("no video stream found"))?;
    let width = video
        .width
        .ok_or_else(|| ReelError::encode("missing video width from ffprobe"))?;
    let height = video
        .height
        .ok_or_else(|| ReelError::encode("missing video height from ffprobe"))?;
    let (fps_num, fps_den) = parse_ff_ratio(video.r_frame_rate.as_deref().unwrap_or("0/1"))
        .ok_or_else(|| ReelError::encode("invalid video r_frame_rate"))?;
    let video_duration_sec = video
        .duration
        .as_deref()
        .or_else(|| parsed.format.as_ref().and_then(|f| f.duration.as_deref()))
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);
    let video_frames = video.nb_frames.as_deref().and_then(|s| s.parse().ok());
    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(VideoInfo {
        width,
        height,
        fps_num,
        fps_den,
        video_duration_sec,
        video_frames,
        has_audio,
    })
}

fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let (num, den) = s.split_once('/')?;
    let num = num.trim().parse().ok()?;
    let den: u32 = den.trim().parse().ok()?;
    if den == 0 {
        return None;
    }
    Some((num, den))
}

#[cfg(test)]
#[path = "../../tests/unit/assemble/ffmpeg.rs"]
mod tests;
