//! Template plan precomputation for the correlation-coefficient metric.

use crate::image::{ImageView, MAX_CHANNELS};
use crate::util::{XqError, XqResult};

/// Precomputed per-channel statistics and zero-mean buffer for matching.
///
/// Each channel is centred on its own mean, so the kernel only needs the raw
/// window values for the cross term.
#[derive(Clone, Debug)]
pub struct TemplatePlan {
    width: usize,
    height: usize,
    channels: usize,
    means: [f32; MAX_CHANNELS],
    zero_mean: Vec<f32>,
    zero_mean_sums: [f64; MAX_CHANNELS],
    var_t: f64,
}

impl TemplatePlan {
    /// Builds a plan from a template view.
    pub fn from_view(tpl: ImageView<'_>) -> XqResult<Self> {
        let width = tpl.width();
        let height = tpl.height();
        let channels = tpl.channels();
        let count = width
            .checked_mul(height)
            .ok_or(XqError::InvalidDimensions { width, height })?;

        let mut sums = [0.0f64; MAX_CHANNELS];
        for y in 0..height {
            let row = template_row(tpl, y)?;
            for (idx, &value) in row.iter().enumerate() {
                sums[idx % channels] += value as f64;
            }
        }

        let mut means = [0.0f32; MAX_CHANNELS];
        for c in 0..channels {
            means[c] = (sums[c] / count as f64) as f32;
        }

        let mut zero_mean = Vec::with_capacity(count * channels);
        let mut zero_mean_sums = [0.0f64; MAX_CHANNELS];
        let mut var_t = 0.0f64;
        for y in 0..height {
            let row = template_row(tpl, y)?;
            for (idx, &value) in row.iter().enumerate() {
                let centred = value as f32 - means[idx % channels];
                zero_mean_sums[idx % channels] += centred as f64;
                var_t += (centred as f64) * (centred as f64);
                zero_mean.push(centred);
            }
        }

        if var_t / (count as f64) <= 1e-8 {
            return Err(XqError::DegenerateTemplate {
                reason: "zero variance",
            });
        }

        Ok(Self {
            width,
            height,
            channels,
            means,
            zero_mean,
            zero_mean_sums,
            var_t,
        })
    }

    /// Returns the template width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the template height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the number of interleaved channels.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the mean intensity of channel `c`.
    pub fn mean(&self, c: usize) -> f32 {
        self.means.get(c).copied().unwrap_or(0.0)
    }

    /// Returns the zero-mean template buffer in interleaved row-major order.
    pub fn zero_mean(&self) -> &[f32] {
        &self.zero_mean
    }

    /// Residual sum of the zero-mean values of channel `c`; nonzero only by
    /// the rounding of the stored mean.
    pub fn zero_mean_sum(&self, c: usize) -> f64 {
        self.zero_mean_sums.get(c).copied().unwrap_or(0.0)
    }

    /// Returns the sum of squared zero-mean values over all channels.
    pub fn var_t(&self) -> f64 {
        self.var_t
    }
}

fn template_row<'a>(tpl: ImageView<'a>, y: usize) -> XqResult<&'a [u8]> {
    tpl.row(y).ok_or(XqError::BufferTooSmall {
        needed: (y + 1).saturating_mul(tpl.stride()),
        got: tpl.as_slice().len(),
    })
}
