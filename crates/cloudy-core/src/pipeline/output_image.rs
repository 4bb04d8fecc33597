//! Copies (or downsizes) each corpus image into the output directory so the
//! report can reference it next to the cached results.

use image::imageops::FilterType;
use std::path::{Path, PathBuf};

use crate::config::OutputConfig;

/// Places output copies of corpus images.
pub struct OutputImages {
    enabled: bool,
    resize_height: Option<u32>,
    dir: PathBuf,
}

impl OutputImages {
    pub fn new(config: &OutputConfig, dir: impl Into<PathBuf>) -> Self {
        Self {
            enabled: config.copy_images,
            resize_height: config.resize.then_some(config.image_height),
            dir: dir.into(),
        }
    }

    /// Place `source` in the output directory under `file_name` unless a copy
    /// already exists. Failures are logged and otherwise ignored.
    ///
    /// Returns the destination path when a new file was written.
    pub fn place(&self, source: &Path, file_name: &str) -> Option<PathBuf> {
        if !self.enabled {
            return None;
        }
        let dest = self.dir.join(file_name);
        if dest.exists() {
            return None;
        }

        let result = match self.resize_height {
            Some(height) => resize_to_height(source, &dest, height),
            None => std::fs::copy(source, &dest).map(|_| ()).map_err(|e| e.to_string()),
        };
        match result {
            Ok(()) => {
                tracing::debug!("Placed output image {:?}", dest);
                Some(dest)
            }
            Err(e) => {
                tracing::warn!(image = file_name, "Could not place output image: {e}");
                None
            }
        }
    }
}

fn resize_to_height(source: &Path, dest: &Path, height: u32) -> Result<(), String> {
    let img = image::open(source).map_err(|e| e.to_string())?;
    // Never upscale
    let img = if img.height() > height {
        img.resize(u32::MAX, height, FilterType::Triangle)
    } else {
        img
    };
    img.save(dest).map_err(|e| e.to_string())
}
