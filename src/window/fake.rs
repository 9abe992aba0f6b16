//! Deterministic in-memory window system.

use crate::util::{XqError, XqResult};
use crate::window::{WindowDescriptor, WindowHandle, WindowSystem};
use image::RgbaImage;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// One scripted window.
#[derive(Clone, Debug)]
pub struct FakeWindow {
    pub handle: WindowHandle,
    pub class: String,
    pub title: String,
    pub descriptor: WindowDescriptor,
    /// Frame returned by capture; `None` makes capture fail.
    pub frame: Option<RgbaImage>,
}

impl FakeWindow {
    /// Plain, qualifying window sized to its frame.
    pub fn new(handle: u64, class: &str, frame: RgbaImage) -> Self {
        Self {
            handle: WindowHandle(handle),
            class: class.to_owned(),
            title: format!("{class} #{handle}"),
            descriptor: WindowDescriptor {
                client_width: frame.width(),
                client_height: frame.height(),
                style: Default::default(),
            },
            frame: Some(frame),
        }
    }
}

/// Window system whose windows are fixed in enumeration order.
///
/// Frames may be replaced between cycles with [`FakeWindowSystem::set_frame`]
/// to simulate moves.
#[derive(Debug, Default)]
pub struct FakeWindowSystem {
    windows: RwLock<Vec<FakeWindow>>,
    captures: AtomicUsize,
}

impl FakeWindowSystem {
    pub fn new(windows: Vec<FakeWindow>) -> Self {
        Self {
            windows: RwLock::new(windows),
            captures: AtomicUsize::new(0),
        }
    }

    pub fn push(&self, window: FakeWindow) {
        self.windows
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .push(window);
    }

    /// Replaces the frame of `handle`; `None` makes its capture fail.
    pub fn set_frame(&self, handle: WindowHandle, frame: Option<RgbaImage>) {
        let mut windows = self.windows.write().unwrap_or_else(|p| p.into_inner());
        if let Some(w) = windows.iter_mut().find(|w| w.handle == handle) {
            w.frame = frame;
        }
    }

    /// Number of successful captures so far.
    pub fn capture_count(&self) -> usize {
        self.captures.load(Ordering::Relaxed)
    }

    fn with_window<T>(
        &self,
        handle: WindowHandle,
        f: impl FnOnce(&FakeWindow) -> XqResult<T>,
    ) -> XqResult<T> {
        let windows = self.windows.read().unwrap_or_else(|p| p.into_inner());
        let window = windows
            .iter()
            .find(|w| w.handle == handle)
            .ok_or_else(|| XqError::CaptureFailure {
                reason: format!("window {} no longer exists", handle.0),
            })?;
        f(window)
    }
}

impl WindowSystem for FakeWindowSystem {
    fn enumerate(&self) -> XqResult<Vec<WindowHandle>> {
        let windows = self.windows.read().unwrap_or_else(|p| p.into_inner());
        Ok(windows.iter().map(|w| w.handle).collect())
    }

    fn class_of(&self, handle: WindowHandle) -> XqResult<String> {
        self.with_window(handle, |w| Ok(w.class.clone()))
    }

    fn title_of(&self, handle: WindowHandle) -> XqResult<String> {
        self.with_window(handle, |w| Ok(w.title.clone()))
    }

    fn describe(&self, handle: WindowHandle) -> XqResult<WindowDescriptor> {
        self.with_window(handle, |w| Ok(w.descriptor))
    }

    fn capture(&self, handle: WindowHandle) -> XqResult<RgbaImage> {
        let frame = self.with_window(handle, |w| {
            w.frame.clone().ok_or_else(|| XqError::CaptureFailure {
                reason: format!("window {} cannot be captured", handle.0),
            })
        })?;
        self.captures.fetch_add(1, Ordering::Relaxed);
        Ok(frame)
    }
}
