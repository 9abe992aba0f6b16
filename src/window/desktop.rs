//! Live desktop backend built on `xcap`.
//!
//! `xcap` only lists top-level windows and exposes no tool-window or child
//! flags, so those style bits are always clear. The application name stands
//! in for the window class.

use crate::util::{XqError, XqResult};
use crate::window::{WindowDescriptor, WindowHandle, WindowStyle, WindowSystem};
use image::RgbaImage;
use xcap::Window;

fn capture_err(err: impl std::fmt::Display) -> XqError {
    XqError::CaptureFailure {
        reason: err.to_string(),
    }
}

/// Window system of the running desktop session.
#[derive(Clone, Copy, Debug, Default)]
pub struct DesktopWindowSystem;

impl DesktopWindowSystem {
    pub fn new() -> Self {
        Self
    }

    fn find(&self, handle: WindowHandle) -> XqResult<Window> {
        Window::all()
            .map_err(capture_err)?
            .into_iter()
            .find(|w| w.id().map(u64::from).ok() == Some(handle.0))
            .ok_or_else(|| XqError::CaptureFailure {
                reason: format!("window {} no longer exists", handle.0),
            })
    }
}

impl WindowSystem for DesktopWindowSystem {
    fn enumerate(&self) -> XqResult<Vec<WindowHandle>> {
        let windows = Window::all().map_err(capture_err)?;
        Ok(windows
            .iter()
            .filter_map(|w| w.id().ok())
            .map(|id| WindowHandle(u64::from(id)))
            .collect())
    }

    fn class_of(&self, handle: WindowHandle) -> XqResult<String> {
        self.find(handle)?.app_name().map_err(capture_err)
    }

    fn title_of(&self, handle: WindowHandle) -> XqResult<String> {
        self.find(handle)?.title().map_err(capture_err)
    }

    fn describe(&self, handle: WindowHandle) -> XqResult<WindowDescriptor> {
        let window = self.find(handle)?;
        Ok(WindowDescriptor {
            client_width: window.width().map_err(capture_err)?,
            client_height: window.height().map_err(capture_err)?,
            style: WindowStyle {
                minimized: window.is_minimized().map_err(capture_err)?,
                ..WindowStyle::default()
            },
        })
    }

    fn capture(&self, handle: WindowHandle) -> XqResult<RgbaImage> {
        let shot = self.find(handle)?.capture_image().map_err(capture_err)?;
        let (width, height) = (shot.width(), shot.height());
        if width == 0 || height == 0 {
            return Err(XqError::CaptureFailure {
                reason: "captured an empty bitmap".to_owned(),
            });
        }
        RgbaImage::from_raw(width, height, shot.into_raw()).ok_or_else(|| {
            XqError::CaptureFailure {
                reason: "captured bitmap has an unexpected layout".to_owned(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::DesktopWindowSystem;
    use crate::window::WindowSystem;

    #[test]
    #[ignore = "requires a graphical session with capture permission"]
    fn enumerates_live_windows() {
        let ws = DesktopWindowSystem::new();
        let handles = ws.enumerate().unwrap();
        for handle in handles.into_iter().take(3) {
            let _ = ws.describe(handle);
        }
    }
}
