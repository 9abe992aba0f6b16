//! Geometric and style filter applied before a window is probed.

use crate::window::WindowDescriptor;
use std::fmt;

/// Why a window was not probed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    ToolWindow,
    ChildWindow,
    TooSmall,
    Minimized,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Rejection::ToolWindow => "tool window",
            Rejection::ChildWindow => "child window",
            Rejection::TooSmall => "client area too small",
            Rejection::Minimized => "minimized",
        })
    }
}

/// Accept/reject rules for enumerated windows. Pure; no side effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowQualifier {
    /// Client width at or below this is rejected.
    pub min_width: u32,
    /// Client height at or below this is rejected.
    pub min_height: u32,
    pub exclude_minimized: bool,
}

impl Default for WindowQualifier {
    fn default() -> Self {
        Self {
            min_width: 200,
            min_height: 200,
            exclude_minimized: true,
        }
    }
}

impl WindowQualifier {
    pub fn check(&self, desc: &WindowDescriptor) -> Result<(), Rejection> {
        if desc.style.tool_window {
            return Err(Rejection::ToolWindow);
        }
        if desc.style.child {
            return Err(Rejection::ChildWindow);
        }
        if desc.client_width <= self.min_width || desc.client_height <= self.min_height {
            return Err(Rejection::TooSmall);
        }
        if self.exclude_minimized && desc.style.minimized {
            return Err(Rejection::Minimized);
        }
        Ok(())
    }

    pub fn accepts(&self, desc: &WindowDescriptor) -> bool {
        self.check(desc).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::{Rejection, WindowQualifier};
    use crate::window::{WindowDescriptor, WindowStyle};

    fn desc(width: u32, height: u32, style: WindowStyle) -> WindowDescriptor {
        WindowDescriptor {
            client_width: width,
            client_height: height,
            style,
        }
    }

    #[test]
    fn style_flags_reject_independently() {
        let q = WindowQualifier::default();
        for minimized in [false, true] {
            for (w, h) in [(800, 600), (100, 100), (2000, 50)] {
                let tool = WindowStyle {
                    tool_window: true,
                    minimized,
                    ..WindowStyle::default()
                };
                let child = WindowStyle {
                    child: true,
                    minimized,
                    ..WindowStyle::default()
                };
                assert!(!q.accepts(&desc(w, h, tool)));
                assert!(!q.accepts(&desc(w, h, child)));
            }
        }
    }

    #[test]
    fn small_client_rects_are_rejected() {
        let q = WindowQualifier::default();
        let plain = WindowStyle::default();
        assert_eq!(q.check(&desc(199, 800, plain)), Err(Rejection::TooSmall));
        assert_eq!(q.check(&desc(800, 200, plain)), Err(Rejection::TooSmall));
        assert!(q.accepts(&desc(201, 201, plain)));
    }

    #[test]
    fn minimized_only_matters_when_excluded() {
        let style = WindowStyle {
            minimized: true,
            ..WindowStyle::default()
        };
        let strict = WindowQualifier::default();
        let lax = WindowQualifier {
            exclude_minimized: false,
            ..strict
        };
        assert_eq!(strict.check(&desc(640, 480, style)), Err(Rejection::Minimized));
        assert!(lax.accepts(&desc(640, 480, style)));
    }
}
