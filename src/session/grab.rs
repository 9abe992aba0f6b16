//! Window capture with the pre-capture delay, optional dumps and board crop.

use crate::board::GridCalibration;
use crate::image::io::{rgb_from_rgba, save_rgb_png};
use crate::trace::trace_warn;
use crate::util::{XqError, XqResult};
use crate::window::{FrameSource, WindowHandle, WindowSystem};
use image::RgbImage;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Produces RGB frames of a window from the configured backend.
pub struct ScreenGrabber {
    windows: Arc<dyn WindowSystem>,
    external: Option<Arc<dyn FrameSource>>,
    use_external: bool,
    sleep: Duration,
    dump_dir: Option<PathBuf>,
    seq: AtomicU64,
}

impl ScreenGrabber {
    pub fn new(windows: Arc<dyn WindowSystem>, sleep: Duration) -> Self {
        Self {
            windows,
            external: None,
            use_external: false,
            sleep,
            dump_dir: None,
            seq: AtomicU64::new(0),
        }
    }

    /// Routes captures through `source` when `enabled`.
    pub fn set_external(&mut self, source: Option<Arc<dyn FrameSource>>, enabled: bool) {
        self.external = source;
        self.use_external = enabled;
    }

    /// Writes every frame into `dir` when set.
    pub fn set_dump_dir(&mut self, dir: Option<PathBuf>) {
        self.dump_dir = dir;
    }

    /// Sleeps, then captures `handle`. A failed dump is logged and ignored.
    pub fn grab(&self, handle: WindowHandle) -> XqResult<RgbImage> {
        if !self.sleep.is_zero() {
            thread::sleep(self.sleep);
        }
        let rgba = if self.use_external {
            match &self.external {
                Some(source) => source.grab(handle)?,
                None => {
                    return Err(XqError::CaptureFailure {
                        reason: "external capture enabled without a frame source".to_owned(),
                    })
                }
            }
        } else {
            self.windows.capture(handle)?
        };
        let frame = rgb_from_rgba(&rgba);

        if let Some(dir) = &self.dump_dir {
            let seq = self.seq.fetch_add(1, Ordering::Relaxed);
            let path = dir.join(format!("capture-{}-{seq:05}.png", handle.0));
            if let Err(err) = save_rgb_png(&frame, &path) {
                let reason = err.to_string();
                trace_warn!("capture_dump_failed", reason = reason.as_str());
            }
        }
        Ok(frame)
    }
}

/// Crops `frame` to the calibrated board region, anchored at the frame
/// origin and clamped to the frame.
pub fn crop_to_board(frame: &RgbImage, grid: &GridCalibration) -> RgbImage {
    let (width, height) = grid.board_extent();
    let width = width.min(frame.width());
    let height = height.min(frame.height());
    if width == 0 || height == 0 {
        return frame.clone();
    }
    image::imageops::crop_imm(frame, 0, 0, width, height).to_image()
}
