//! Page image upscaling through waifu2x

use crate::error::ProcessError;
use crate::process::ProcessRunner;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Upscaler binary
pub const ENHANCER_PROGRAM: &str = "waifu2x-ncnn-vulkan";

/// Denoise level passed with `-n`
pub const DENOISE_LEVEL: u8 = 3;

/// Upscale factor passed with `-s`
pub const SCALE_FACTOR: u8 = 4;

/// Appended to the file stem of the upscaled image
pub const OUTPUT_SUFFIX: &str = "_upscaled";

/// Upscales staged page images with an external program
#[derive(Clone)]
pub struct Enhancer {
    runner: Arc<dyn ProcessRunner>,
}

impl Enhancer {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    /// Where the upscaled version of `input` is written: next to the input,
    /// `<stem>_upscaled.<ext>`, keeping whatever extension the input has
    pub fn output_path(input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_name = match input.extension() {
            Some(ext) => format!("{}{}.{}", stem, OUTPUT_SUFFIX, ext.to_string_lossy()),
            None => format!("{}{}", stem, OUTPUT_SUFFIX),
        };
        input.with_file_name(file_name)
    }

    /// Upscale `input` and return the path of the result
    pub async fn enhance(&self, input: &Path) -> Result<PathBuf, ProcessError> {
        let output = Self::output_path(input);
        let args: Vec<OsString> = vec![
            "-i".into(),
            input.into(),
            "-o".into(),
            output.clone().into(),
            "-n".into(),
            DENOISE_LEVEL.to_string().into(),
            "-s".into(),
            SCALE_FACTOR.to_string().into(),
        ];

        self.runner.run(ENHANCER_PROGRAM, &args).await?;
        tracing::debug!("upscaled {} -> {}", input.display(), output.display());
        Ok(output)
    }
}
