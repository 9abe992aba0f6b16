//! Per-class piece scan over a calibrated board frame.

use crate::board::{PieceKind, PieceObservation, Point};
use crate::search::{TemplateMatcher, Threshold};
use crate::session::CancelToken;
use crate::template::TemplateCache;
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{XqError, XqResult};
use crate::ImageView;

/// Searches one frame for all 14 piece classes.
pub struct PieceLocator<'a> {
    pub cache: &'a TemplateCache,
    pub matcher: &'a TemplateMatcher,
    pub catalog: &'a str,
}

impl PieceLocator<'_> {
    /// Runs every class over `frame` in [`PieceKind::SCAN_ORDER`].
    ///
    /// The black king is mandatory: failing to load, match or find it fails
    /// the scan. Any other class may fail or come up empty and is simply
    /// left without points.
    pub fn scan(&self, frame: ImageView<'_>, cancel: &CancelToken) -> XqResult<PieceObservation> {
        let _span = trace_span!("scan", width = frame.width(), height = frame.height()).entered();
        let mut observation = PieceObservation::new();

        for kind in PieceKind::SCAN_ORDER {
            if cancel.is_cancelled() {
                return Err(XqError::Cancelled);
            }
            match self.find(frame, kind) {
                Ok(points) => {
                    if kind == PieceKind::BlackKing && points.is_empty() {
                        return Err(XqError::AnchorNotFound {
                            piece: kind.file_stem(),
                        });
                    }
                    observation.set(kind, points);
                }
                Err(err) if kind == PieceKind::BlackKing => return Err(err),
                Err(err) => {
                    let reason = err.to_string();
                    trace_warn!("piece_skipped", piece = kind.file_stem(), reason = reason.as_str());
                }
            }
        }
        trace_event!("scan_points", count = observation.len());
        Ok(observation)
    }

    fn find(&self, frame: ImageView<'_>, kind: PieceKind) -> XqResult<Vec<Point>> {
        let template = self.cache.get(self.catalog, &kind.file_name())?;
        let found = self
            .matcher
            .find_all(frame, &template, Threshold::SessionDefault)?;
        Ok(found.into_iter().map(Point::from).collect())
    }
}
