//! Scalar reference kernel for the correlation-coefficient score.

use crate::image::MAX_CHANNELS;
use crate::kernel::{response_dims, Kernel, ScanParams};
use crate::search::ResponseMap;
use crate::template::TemplatePlan;
use crate::util::XqResult;
use crate::ImageView;

/// Scalar normalized cross-correlation kernel over interleaved channels.
///
/// Matches the correlation-coefficient definition: template and window are
/// centred per channel, the cross term and both energies are summed over all
/// channels, and the score is `dot / sqrt(var_t * var_i)` in `[-1, 1]`.
pub struct ZnccScalar;

impl ZnccScalar {
    /// Scores one response row; shared with the row-parallel kernel.
    pub(crate) fn fill_row(
        image: ImageView<'_>,
        tpl: &TemplatePlan,
        y: usize,
        params: ScanParams,
        out: &mut [f32],
    ) {
        for (x, slot) in out.iter_mut().enumerate() {
            *slot = Self::score_unchecked(image, tpl, x, y, params);
        }
    }

    fn score_unchecked(
        image: ImageView<'_>,
        tpl: &TemplatePlan,
        x: usize,
        y: usize,
        params: ScanParams,
    ) -> f32 {
        let channels = tpl.channels();
        let row_len = tpl.width() * channels;
        let t_prime = tpl.zero_mean();
        let n = (tpl.width() * tpl.height()) as f64;

        let mut dot = 0.0f64;
        let mut sum_i = [0.0f64; MAX_CHANNELS];
        let mut sum_i2 = 0.0f64;

        for ty in 0..tpl.height() {
            let img_row = image.row(y + ty).expect("row within bounds for scan");
            let window = &img_row[x * channels..x * channels + row_len];
            let tpl_row = &t_prime[ty * row_len..(ty + 1) * row_len];
            for (idx, (&value, &t)) in window.iter().zip(tpl_row).enumerate() {
                let v = value as f64;
                dot += t as f64 * v;
                sum_i[idx % channels] += v;
                sum_i2 += v * v;
            }
        }

        let mut var_i = sum_i2;
        for (c, sum) in sum_i.iter().take(channels).enumerate() {
            var_i -= sum * sum / n;
            dot -= tpl.zero_mean_sum(c) * sum / n;
        }
        if var_i <= params.min_var_i * n {
            return 0.0;
        }

        let score = dot / (tpl.var_t() * var_i).sqrt();
        if score.is_finite() {
            score.clamp(-1.0, 1.0) as f32
        } else {
            0.0
        }
    }
}

impl Kernel for ZnccScalar {
    type Plan = TemplatePlan;

    fn score_at(
        image: ImageView<'_>,
        tpl: &Self::Plan,
        x: usize,
        y: usize,
        params: ScanParams,
    ) -> f32 {
        match response_dims(image, tpl.width(), tpl.height(), tpl.channels()) {
            Ok((w, h)) if x < w && y < h => Self::score_unchecked(image, tpl, x, y, params),
            _ => f32::NEG_INFINITY,
        }
    }

    fn response(
        image: ImageView<'_>,
        tpl: &Self::Plan,
        params: ScanParams,
    ) -> XqResult<ResponseMap> {
        let (width, height) = response_dims(image, tpl.width(), tpl.height(), tpl.channels())?;
        let mut scores = vec![0.0f32; width * height];
        for (y, row) in scores.chunks_mut(width).enumerate() {
            Self::fill_row(image, tpl, y, params, row);
        }
        ResponseMap::new(scores, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::ZnccScalar;
    use crate::kernel::{Kernel, ScanParams};
    use crate::template::TemplatePlan;
    use crate::{ImageView, XqError};

    fn textured(width: usize, height: usize, channels: usize, seed: usize) -> Vec<u8> {
        let mut data = Vec::with_capacity(width * height * channels);
        for y in 0..height {
            for x in 0..width {
                for c in 0..channels {
                    data.push((((x + seed) * 17 + y * 9 + x * y + c * 41) & 0xFF) as u8);
                }
            }
        }
        data
    }

    #[test]
    fn response_matches_bruteforce() {
        let (img_w, img_h, ch) = (7, 6, 3);
        let image = textured(img_w, img_h, ch, 0);
        let tpl = textured(3, 2, ch, 5);
        let image_view = ImageView::from_slice(&image, img_w, img_h, ch).unwrap();
        let plan = TemplatePlan::from_view(ImageView::from_slice(&tpl, 3, 2, ch).unwrap()).unwrap();

        let response = ZnccScalar::response(image_view, &plan, ScanParams::default()).unwrap();
        assert_eq!((response.width(), response.height()), (5, 5));

        for y in 0..5 {
            for x in 0..5 {
                let mut tm = [0.0f64; 3];
                let mut im = [0.0f64; 3];
                for ty in 0..2 {
                    for tx in 0..3 {
                        for c in 0..ch {
                            tm[c] += tpl[(ty * 3 + tx) * ch + c] as f64 / 6.0;
                            im[c] += image[((y + ty) * img_w + x + tx) * ch + c] as f64 / 6.0;
                        }
                    }
                }
                let (mut dot, mut vt, mut vi) = (0.0f64, 0.0f64, 0.0f64);
                for ty in 0..2 {
                    for tx in 0..3 {
                        for c in 0..ch {
                            let t = tpl[(ty * 3 + tx) * ch + c] as f64 - tm[c];
                            let i = image[((y + ty) * img_w + x + tx) * ch + c] as f64 - im[c];
                            dot += t * i;
                            vt += t * t;
                            vi += i * i;
                        }
                    }
                }
                let expected = if vi <= 1e-6 * 6.0 { 0.0 } else { dot / (vt * vi).sqrt() };
                let got = response.get(x, y).unwrap();
                assert!(
                    (got as f64 - expected).abs() < 1e-4,
                    "({x},{y}): got {got}, expected {expected}"
                );
            }
        }
    }

    #[test]
    fn exact_copy_scores_one() {
        let image = textured(10, 8, 3, 0);
        let view = ImageView::from_slice(&image, 10, 8, 3).unwrap();
        let patch = view.roi(4, 3, 4, 4).unwrap();
        let plan = TemplatePlan::from_view(patch).unwrap();
        let score = ZnccScalar::score_at(view, &plan, 4, 3, ScanParams::default());
        assert!((score - 1.0).abs() < 1e-5);
        assert_eq!(
            ZnccScalar::score_at(view, &plan, 9, 0, ScanParams::default()),
            f32::NEG_INFINITY
        );
    }

    #[test]
    fn oversized_template_is_a_match_error() {
        let image = textured(4, 4, 1, 0);
        let tpl = textured(5, 2, 1, 3);
        let plan = TemplatePlan::from_view(ImageView::from_slice(&tpl, 5, 2, 1).unwrap()).unwrap();
        let err = ZnccScalar::response(
            ImageView::from_slice(&image, 4, 4, 1).unwrap(),
            &plan,
            ScanParams::default(),
        )
        .unwrap_err();
        assert!(matches!(err, XqError::Match { .. }));
    }
}
