//! Correlation kernel implementations.

use crate::search::ResponseMap;
use crate::util::{XqError, XqResult};
use crate::ImageView;

/// Scan configuration for kernel evaluations.
#[derive(Clone, Copy, Debug)]
pub struct ScanParams {
    /// Minimum variance of an image window; flatter windows score zero.
    pub min_var_i: f64,
}

impl Default for ScanParams {
    fn default() -> Self {
        Self { min_var_i: 1e-6 }
    }
}

/// Kernel trait for scoring and dense response computation.
pub trait Kernel {
    type Plan;

    /// Computes the score at a single placement (top-left coordinates).
    fn score_at(image: ImageView<'_>, plan: &Self::Plan, x: usize, y: usize, params: ScanParams)
        -> f32;

    /// Scores every valid placement and returns the response surface.
    fn response(
        image: ImageView<'_>,
        plan: &Self::Plan,
        params: ScanParams,
    ) -> XqResult<ResponseMap>;
}

/// Checks that a template of the given size and channel count fits in
/// `image` and returns the response surface size.
pub(crate) fn response_dims(
    image: ImageView<'_>,
    tpl_width: usize,
    tpl_height: usize,
    tpl_channels: usize,
) -> XqResult<(usize, usize)> {
    if image.channels() != tpl_channels {
        return Err(XqError::Match {
            reason: format!(
                "channel mismatch: image has {}, template has {}",
                image.channels(),
                tpl_channels
            ),
        });
    }
    if image.width() < tpl_width || image.height() < tpl_height {
        return Err(XqError::Match {
            reason: format!(
                "template {}x{} larger than source {}x{}",
                tpl_width,
                tpl_height,
                image.width(),
                image.height()
            ),
        });
    }
    Ok((image.width() - tpl_width + 1, image.height() - tpl_height + 1))
}

pub mod scalar;

#[cfg(feature = "rayon")]
pub mod rayon;
