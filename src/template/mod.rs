//! Piece templates: storage, preprocessing and the per-session cache.

use crate::image::io::view_from_rgb_image;
use crate::image::ImageView;
use crate::util::math::clip_margin;
use crate::util::{XqError, XqResult};
use image::imageops::{self, FilterType};
use image::RgbImage;

mod cache;
mod plan;

pub use cache::{TemplateCache, TemplateSettings};
pub use plan::TemplatePlan;

/// Owned template image in contiguous interleaved format with its plan.
#[derive(Clone, Debug)]
pub struct Template {
    data: Vec<u8>,
    width: usize,
    height: usize,
    channels: usize,
    plan: TemplatePlan,
}

impl Template {
    /// Creates a template from a contiguous interleaved buffer.
    pub fn new(data: Vec<u8>, width: usize, height: usize, channels: usize) -> XqResult<Self> {
        let view = ImageView::from_slice(&data, width, height, channels)?;
        if data.len() != width * height * channels {
            return Err(XqError::InvalidDimensions { width, height });
        }
        let plan = TemplatePlan::from_view(view)?;
        Ok(Self {
            data,
            width,
            height,
            channels,
            plan,
        })
    }

    /// Creates a 3-channel template from an RGB image.
    pub fn from_rgb(img: &RgbImage) -> XqResult<Self> {
        let view = view_from_rgb_image(img)?;
        Self::new(
            img.as_raw().clone(),
            view.width(),
            view.height(),
            view.channels(),
        )
    }

    /// Returns a borrowed view of the template data.
    pub fn view(&self) -> ImageView<'_> {
        ImageView::from_slice(&self.data, self.width, self.height, self.channels)
            .expect("template buffer validated at construction")
    }

    /// Returns the precomputed correlation plan.
    pub fn plan(&self) -> &TemplatePlan {
        &self.plan
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }
}

/// Scales a raw piece icon and removes a border of `clip` of each dimension
/// from every edge, leaving the glyph without its rim and background.
pub fn preprocess(img: &RgbImage, scale_x: f32, scale_y: f32, clip: f32) -> XqResult<RgbImage> {
    if !(scale_x > 0.0 && scale_y > 0.0) {
        return Err(XqError::InvalidInput("template scale factors must be positive"));
    }
    if !(0.0..0.5).contains(&clip) {
        return Err(XqError::InvalidInput("border clip must lie in [0, 0.5)"));
    }

    let scaled = if scale_x == 1.0 && scale_y == 1.0 {
        img.clone()
    } else {
        let width = (img.width() as f32 * scale_x).round().max(1.0) as u32;
        let height = (img.height() as f32 * scale_y).round().max(1.0) as u32;
        imageops::resize(img, width, height, FilterType::Triangle)
    };

    let margin_x = clip_margin(scaled.width(), clip);
    let margin_y = clip_margin(scaled.height(), clip);
    let width = scaled.width().saturating_sub(2 * margin_x);
    let height = scaled.height().saturating_sub(2 * margin_y);
    if width == 0 || height == 0 {
        return Err(XqError::InvalidDimensions {
            width: width as usize,
            height: height as usize,
        });
    }
    Ok(imageops::crop_imm(&scaled, margin_x, margin_y, width, height).to_image())
}
