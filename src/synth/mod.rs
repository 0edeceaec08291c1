//! Image-synthesis capability and the frame synthesizer built on it.

pub(crate) mod capability;
pub(crate) mod frame;
pub(crate) mod http;
pub(crate) mod procedural;
