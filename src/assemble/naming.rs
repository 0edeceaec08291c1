use std::path::{Path, PathBuf};

use crate::foundation::error::{ReelError, ReelResult};

/// Smallest digit width a naming scheme may use.
pub const MIN_NAMING_WIDTH: usize = 4;
/// Largest supported width; `10^19` already exceeds `u64`.
pub const MAX_NAMING_WIDTH: usize = 18;

/// Zero-padded, fixed-width, 0-based frame file names (`frame_0000.png`, `frame_0001.png`, ...).
///
/// The encoder selects frames by pattern, so lexicographic and numeric order must agree. That
/// holds only while every index fits in `width` digits, which [`FrameNaming::check_capacity`]
/// enforces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameNaming {
    prefix: String,
    width: usize,
    extension: String,
}

impl Default for FrameNaming {
    fn default() -> Self {
        Self {
            prefix: "frame_".to_string(),
            width: MIN_NAMING_WIDTH,
            extension: "png".to_string(),
        }
    }
}

impl FrameNaming {
    pub fn with_width(width: usize) -> ReelResult<Self> {
        if !(MIN_NAMING_WIDTH..=MAX_NAMING_WIDTH).contains(&width) {
            return Err(ReelError::validation(format!(
                "frame naming width must be in {MIN_NAMING_WIDTH}..={MAX_NAMING_WIDTH}, got {width}"
            )));
        }
        Ok(Self {
            width,
            ..Self::default()
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of distinct indices the width can hold (`10^width`).
    pub fn capacity(&self) -> u64 {
        10u64.pow(self.width as u32)
    }

    pub fn check_capacity(&self, frame_count: u64) -> ReelResult<()> {
        if frame_count > self.capacity() {
            return Err(ReelError::validation(format!(
                "{frame_count} frames do not fit a {}-digit naming scheme (max {}); \
                 raise the naming width",
                self.width,
                self.capacity()
            )));
        }
        Ok(())
    }

    pub fn file_name(&self, index: u64) -> ReelResult<String> {
        if index >= self.capacity() {
            return Err(ReelError::validation(format!(
                "frame index {index} overflows the {}-digit naming scheme",
                self.width
            )));
        }
        Ok(format!(
            "{}{:0width$}.{}",
            self.prefix,
            index,
            self.extension,
            width = self.width
        ))
    }

    pub fn path(&self, dir: &Path, index: u64) -> ReelResult<PathBuf> {
        Ok(dir.join(self.file_name(index)?))
    }

    /// printf-style pattern understood by the encoder (`frame_%04d.png`).
    pub fn pattern(&self) -> String {
        format!("{}%0{}d.{}", self.prefix, self.width, self.extension)
    }

    /// Whether `name` belongs to this scheme (prefix, all-digit index of the exact width, ext).
    pub fn matches(&self, name: &str) -> bool {
        let Some(rest) = name.strip_prefix(&self.prefix) else {
            return false;
        };
        let Some(digits) = rest
            .strip_suffix(&self.extension)
            .and_then(|r| r.strip_suffix('.'))
        else {
            return false;
        };
        digits.len() == self.width && digits.bytes().all(|b| b.is_ascii_digit())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assemble/naming.rs"]
mod tests;
