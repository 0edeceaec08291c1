//! Frame serialization, silent-video encoding and narration muxing.

pub(crate) mod assembler;
pub(crate) mod ffmpeg;
pub(crate) mod naming;
