//! Finding the window that hosts a board.

use crate::board::{PieceKind, PieceObservation, Point};
use crate::image::io::view_from_rgb_image;
use crate::search::{TemplateMatcher, Threshold};
use crate::session::grab::ScreenGrabber;
use crate::session::CancelToken;
use crate::template::{Template, TemplateCache};
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{XqError, XqResult};
use crate::window::{WindowHandle, WindowQualifier, WindowSystem};
use image::RgbImage;
use std::sync::Arc;

/// Qualification rule applied to each probed window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbeMode {
    /// Exactly two black rooks; yields the calibration anchors.
    Quick,
    /// At least one black king and one red king.
    Full,
}

/// The first window that qualified, with the frame it was probed on.
#[derive(Clone, Debug)]
pub struct LocatedBoard {
    pub handle: WindowHandle,
    pub class: String,
    pub title: String,
    /// Anchor points found on `frame` (black rooks, or both kings).
    pub anchors: PieceObservation,
    pub frame: RgbImage,
}

impl LocatedBoard {
    /// The two black-rook points of a quick probe.
    pub fn rooks(&self) -> &[Point] {
        self.anchors.points(PieceKind::BlackRook)
    }
}

/// Walks enumerated windows and probes each qualifying one.
pub struct BoardLocator<'a> {
    pub windows: &'a dyn WindowSystem,
    pub grabber: &'a ScreenGrabber,
    pub cache: &'a TemplateCache,
    pub matcher: &'a TemplateMatcher,
    pub qualifier: WindowQualifier,
    pub host_class: Option<&'a str>,
    pub catalog: &'a str,
}

impl BoardLocator<'_> {
    /// Returns the first window in enumeration order that passes `mode`.
    ///
    /// Anchor templates are loaded up front, so a missing template fails the
    /// whole call. Capture or match failures only reject the window at hand.
    pub fn locate(&self, mode: ProbeMode, cancel: &CancelToken) -> XqResult<LocatedBoard> {
        let _span = trace_span!("locate", catalog = self.catalog).entered();
        let anchors = self.anchor_templates(mode)?;
        let handles = self.windows.enumerate()?;
        trace_event!("windows_enumerated", count = handles.len());

        for handle in handles {
            if cancel.is_cancelled() {
                return Err(XqError::Cancelled);
            }
            let Some(class) = self.candidate_class(handle) else {
                continue;
            };
            match self.probe_window(handle, mode, &anchors) {
                Ok(Some((frame, observation))) => {
                    let title = self.windows.title_of(handle).unwrap_or_default();
                    trace_event!("board_window_found", handle = handle.0);
                    return Ok(LocatedBoard {
                        handle,
                        class,
                        title,
                        anchors: observation,
                        frame,
                    });
                }
                Ok(None) => {}
                Err(err) => {
                    let reason = err.to_string();
                    trace_warn!("probe_failed", handle = handle.0, reason = reason.as_str());
                }
            }
        }
        Err(XqError::BoardNotFound)
    }

    fn anchor_templates(&self, mode: ProbeMode) -> XqResult<Vec<(PieceKind, Arc<Template>)>> {
        let kinds: &[PieceKind] = match mode {
            ProbeMode::Quick => &[PieceKind::BlackRook],
            ProbeMode::Full => &[PieceKind::BlackKing, PieceKind::RedKing],
        };
        kinds
            .iter()
            .map(|&kind| Ok((kind, self.cache.get(self.catalog, &kind.file_name())?)))
            .collect()
    }

    /// Class of `handle` when it is worth probing.
    fn candidate_class(&self, handle: WindowHandle) -> Option<String> {
        let desc = self.windows.describe(handle).ok()?;
        if let Err(rejection) = self.qualifier.check(&desc) {
            let reason = rejection.to_string();
            trace_event!("window_rejected", handle = handle.0, reason = reason.as_str());
            return None;
        }
        let class = self.windows.class_of(handle).ok()?;
        if self.host_class == Some(class.as_str()) {
            return None;
        }
        Some(class)
    }

    fn probe_window(
        &self,
        handle: WindowHandle,
        mode: ProbeMode,
        anchors: &[(PieceKind, Arc<Template>)],
    ) -> XqResult<Option<(RgbImage, PieceObservation)>> {
        let _span = trace_span!("probe_window", handle = handle.0).entered();
        let frame = self.grabber.grab(handle)?;
        let view = view_from_rgb_image(&frame)?;
        let mut observation = PieceObservation::new();

        for (kind, template) in anchors {
            let found = self
                .matcher
                .find_all(view, template, Threshold::SessionDefault)?;
            if found.is_empty() {
                return Ok(None);
            }
            observation.set(*kind, found.into_iter().map(Point::from).collect());
        }

        let qualifies = match mode {
            ProbeMode::Quick => observation.points(PieceKind::BlackRook).len() == 2,
            ProbeMode::Full => true,
        };
        Ok(qualifies.then_some((frame, observation)))
    }
}
