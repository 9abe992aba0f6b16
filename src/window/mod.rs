//! Capability boundary to the OS window system.
//!
//! Board location only ever talks to a [`WindowSystem`]; the desktop backend
//! (feature `desktop`) and [`FakeWindowSystem`] are its two implementations.

use crate::util::XqResult;
use image::RgbaImage;

#[cfg(feature = "desktop")]
pub mod desktop;
pub mod fake;
pub mod qualify;

#[cfg(feature = "desktop")]
pub use desktop::DesktopWindowSystem;
pub use fake::{FakeWindow, FakeWindowSystem};
pub use qualify::{Rejection, WindowQualifier};

/// Opaque identifier of a top-level window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowHandle(pub u64);

/// Style flags relevant to qualification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WindowStyle {
    /// Tool window without a taskbar presence.
    pub tool_window: bool,
    /// Child window embedded in another window.
    pub child: bool,
    /// Iconified window.
    pub minimized: bool,
}

/// Client size and style of a window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WindowDescriptor {
    pub client_width: u32,
    pub client_height: u32,
    pub style: WindowStyle,
}

/// Window enumeration and capture primitives.
pub trait WindowSystem: Send + Sync {
    /// Top-level windows in OS enumeration order.
    fn enumerate(&self) -> XqResult<Vec<WindowHandle>>;

    fn class_of(&self, handle: WindowHandle) -> XqResult<String>;

    fn title_of(&self, handle: WindowHandle) -> XqResult<String>;

    fn describe(&self, handle: WindowHandle) -> XqResult<WindowDescriptor>;

    /// Captures the current client area as RGBA.
    fn capture(&self, handle: WindowHandle) -> XqResult<RgbaImage>;
}

/// Alternative capture backend used when external capture is enabled.
pub trait FrameSource: Send + Sync {
    fn grab(&self, handle: WindowHandle) -> XqResult<RgbaImage>;
}
