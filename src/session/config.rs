//! Session configuration and the per-stage settings derived from it.

use crate::search::{MatchConfig, DEFAULT_PRECISION};
use crate::template::TemplateSettings;
use crate::util::{XqError, XqResult};
use crate::window::WindowQualifier;
use std::path::PathBuf;
use std::time::Duration;

/// Options of a board session.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureConfig {
    /// Score a template instance must exceed.
    pub precision: f32,
    /// Capture through the registered frame source instead of the window system.
    pub use_external_capture: bool,
    /// Delay before every capture, letting the target window redraw.
    pub sleep_ms: u64,
    pub scale_x: f32,
    pub scale_y: f32,
    /// Fraction trimmed from each template edge.
    pub border_clip: f32,
    /// Root holding `image/` and `image/findchess/`.
    pub app_dir: PathBuf,
    /// Template catalog id.
    pub catalog: String,
    pub min_window_width: u32,
    pub min_window_height: u32,
    pub exclude_minimized: bool,
    /// Class of the host's own windows; never probed.
    pub host_window_class: Option<String>,
    /// Crop captures to the calibrated board region before matching.
    pub crop_to_board: bool,
    /// Write every capture to `<app_dir>/image/`.
    pub dump_frames: bool,
    /// Use the row-parallel kernel when compiled with `rayon`.
    pub parallel: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            use_external_capture: false,
            sleep_ms: 200,
            scale_x: 1.0,
            scale_y: 1.0,
            border_clip: 0.2,
            app_dir: PathBuf::from("."),
            catalog: "0".to_owned(),
            min_window_width: 200,
            min_window_height: 200,
            exclude_minimized: true,
            host_window_class: None,
            crop_to_board: true,
            dump_frames: false,
            parallel: false,
        }
    }
}

impl CaptureConfig {
    /// Rejects values the pipeline cannot work with.
    pub fn validate(&self) -> XqResult<()> {
        if !self.precision.is_finite() || self.precision >= 1.0 {
            return Err(XqError::InvalidInput("precision must be finite and below 1"));
        }
        if !(self.scale_x.is_finite() && self.scale_x > 0.0)
            || !(self.scale_y.is_finite() && self.scale_y > 0.0)
        {
            return Err(XqError::InvalidInput("template scale factors must be positive"));
        }
        if !(0.0..0.5).contains(&self.border_clip) {
            return Err(XqError::InvalidInput("border clip must be in [0, 0.5)"));
        }
        if self.catalog.is_empty() {
            return Err(XqError::InvalidInput("catalog id must not be empty"));
        }
        Ok(())
    }

    pub fn sleep(&self) -> Duration {
        Duration::from_millis(self.sleep_ms)
    }

    /// Directory receiving capture dumps.
    pub fn image_dir(&self) -> PathBuf {
        self.app_dir.join("image")
    }

    /// Directory holding one sub-directory of templates per catalog.
    pub fn find_path(&self) -> PathBuf {
        self.image_dir().join("findchess")
    }

    pub fn match_config(&self) -> MatchConfig {
        MatchConfig {
            precision: self.precision,
            parallel: self.parallel,
            ..MatchConfig::default()
        }
    }

    pub fn template_settings(&self) -> TemplateSettings {
        TemplateSettings {
            scale_x: self.scale_x,
            scale_y: self.scale_y,
            border_clip: self.border_clip,
        }
    }

    pub fn qualifier(&self) -> WindowQualifier {
        WindowQualifier {
            min_width: self.min_window_width,
            min_height: self.min_window_height,
            exclude_minimized: self.exclude_minimized,
        }
    }
}
