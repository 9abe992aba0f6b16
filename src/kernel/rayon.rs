//! Rayon-parallel kernels (feature-gated).
//!
//! Parallelizes the dense response computation over response rows; each row
//! is scored with the scalar kernel so results are bit-identical.

use crate::kernel::scalar::ZnccScalar;
use crate::kernel::{response_dims, Kernel, ScanParams};
use crate::search::ResponseMap;
use crate::template::TemplatePlan;
use crate::util::XqResult;
use crate::ImageView;
use rayon::prelude::*;

/// Row-parallel variant of [`ZnccScalar`].
pub struct ZnccRayon;

impl Kernel for ZnccRayon {
    type Plan = TemplatePlan;

    fn score_at(
        image: ImageView<'_>,
        tpl: &Self::Plan,
        x: usize,
        y: usize,
        params: ScanParams,
    ) -> f32 {
        ZnccScalar::score_at(image, tpl, x, y, params)
    }

    fn response(
        image: ImageView<'_>,
        tpl: &Self::Plan,
        params: ScanParams,
    ) -> XqResult<ResponseMap> {
        let (width, height) = response_dims(image, tpl.width(), tpl.height(), tpl.channels())?;
        let mut scores = vec![0.0f32; width * height];
        scores
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| ZnccScalar::fill_row(image, tpl, y, params, row));
        ResponseMap::new(scores, width, height)
    }
}
