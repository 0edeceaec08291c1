use std::path::{Path, PathBuf};

use anyhow::Context as _;
use tracing::info;

use crate::assemble::ffmpeg::{FfmpegEncoder, MuxJob, SequenceJob, VideoEncoder};
use crate::assemble::naming::FrameNaming;
use crate::foundation::core::Fps;
use crate::foundation::error::{ReelError, ReelResult};
use crate::synth::frame::Frame;

const FRAMES_SUBDIR: &str = "frames";

/// Turns an ordered frame sequence into a silent video and muxes narration into it.
///
/// The assembler owns `<work_dir>/frames`: it is cleared before every write so frames of an
/// earlier run never end up in the encoder's pattern.
pub struct MediaAssembler {
    work_dir: PathBuf,
    naming: FrameNaming,
    encoder: Box<dyn VideoEncoder>,
}

impl MediaAssembler {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            naming: FrameNaming::default(),
            encoder: Box::new(FfmpegEncoder::new()),
        }
    }

    pub fn with_naming(mut self, naming: FrameNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_encoder(mut self, encoder: Box<dyn VideoEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn frames_dir(&self) -> PathBuf {
        self.work_dir.join(FRAMES_SUBDIR)
    }

    pub fn naming(&self) -> &FrameNaming {
        &self.naming
    }

    /// Write `frames` in order as `frames/<pattern>` files, replacing anything there before.
    pub fn write_frames(&self, frames: &[Frame]) -> ReelResult<Vec<PathBuf>> {
        self.naming.check_capacity(frames.len() as u64)?;
        check_dimensions(frames)?;

        let dir = self.frames_dir();
        if dir.exists() {
            std::fs::remove_dir_all(&dir)
                .with_context(|| format!("clear frame directory '{}'", dir.display()))?;
        }
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create frame directory '{}'", dir.display()))?;

        let mut paths = Vec::with_capacity(frames.len());
        for (i, frame) in frames.iter().enumerate() {
            let path = self.naming.path(&dir, i as u64)?;
            frame.pixels.save_png(&path)?;
            paths.push(path);
        }
        info!(count = paths.len(), dir = %dir.display(), "frames written");
        Ok(paths)
    }

    /// Write `frames` and encode them at `fps` into a silent video at `out_path`.
    #[tracing::instrument(skip(self, frames), fields(frames = frames.len()))]
    pub fn assemble(&self, frames: &[Frame], fps: Fps, out_path: &Path) -> ReelResult<PathBuf> {
        if frames.is_empty() {
            return Err(ReelError::encode("no frames to assemble"));
        }
        self.write_frames(frames)?;
        self.encode_frames(frames.len(), fps, out_path)
    }

    /// Encode `frame_count` frames previously written by [`MediaAssembler::write_frames`].
    pub fn encode_frames(
        &self,
        frame_count: usize,
        fps: Fps,
        out_path: &Path,
    ) -> ReelResult<PathBuf> {
        if frame_count == 0 {
            return Err(ReelError::encode("no frames to assemble"));
        }
        let dir = self.frames_dir();
        let found = self.count_frame_files(&dir)?;
        if found != frame_count {
            return Err(ReelError::encode(format!(
                "frame directory '{}' holds {found} frames, expected {frame_count}",
                dir.display()
            )));
        }
        let job = SequenceJob {
            frames_dir: dir,
            pattern: self.naming.pattern(),
            fps,
            out_path: out_path.to_path_buf(),
        };
        self.encoder.encode_sequence(&job)?;
        info!(out = %out_path.display(), frames = frame_count, "silent video encoded");
        Ok(out_path.to_path_buf())
    }

    /// Files in `dir` that belong to this assembler's naming scheme.
    fn count_frame_files(&self, dir: &Path) -> ReelResult<usize> {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("read frame directory '{}'", dir.display()))?;
        let mut count = 0;
        for entry in entries {
            let entry =
                entry.with_context(|| format!("read frame directory '{}'", dir.display()))?;
            if entry
                .file_name()
                .to_str()
                .is_some_and(|name| self.naming.matches(name))
            {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Combine a silent video with a narration track; the video stream is copied unchanged.
    #[tracing::instrument(skip(self))]
    pub fn mux_audio(
        &self,
        video_path: &Path,
        audio_path: &Path,
        out_path: &Path,
    ) -> ReelResult<PathBuf> {
        if video_path == out_path {
            return Err(ReelError::validation(
                "mux output must differ from the silent video path",
            ));
        }
        let job = MuxJob {
            video_path: video_path.to_path_buf(),
            audio_path: audio_path.to_path_buf(),
            out_path: out_path.to_path_buf(),
        };
        self.encoder.mux(&job)?;
        info!(out = %out_path.display(), "narration muxed");
        Ok(out_path.to_path_buf())
    }
}

fn check_dimensions(frames: &[Frame]) -> ReelResult<()> {
    let Some(first) = frames.first() else {
        return Ok(());
    };
    let (w, h) = (first.pixels.width, first.pixels.height);
    if w == 0 || h == 0 || !w.is_multiple_of(2) || !h.is_multiple_of(2) {
        return Err(ReelError::validation(format!(
            "frame size {w}x{h} must be non-zero and even (required for yuv420p output)"
        )));
    }
    if let Some(bad) = frames
        .iter()
        .find(|f| f.pixels.width != w || f.pixels.height != h)
    {
        return Err(ReelError::validation(format!(
            "frame size mismatch at scene {} frame {}: got {}x{}, expected {w}x{h}",
            bad.tag.scene, bad.tag.position, bad.pixels.width, bad.pixels.height
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/assemble/assembler.rs"]
mod tests;
