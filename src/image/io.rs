//! Conversions between `image` crate buffers and `ImageView`, plus disk I/O.

use crate::image::ImageView;
use crate::util::{XqError, XqResult};
use image::{RgbImage, RgbaImage};
use std::fs;
use std::path::Path;

/// Creates a borrowed 3-channel view of an RGB buffer.
pub fn view_from_rgb_image(img: &RgbImage) -> XqResult<ImageView<'_>> {
    ImageView::from_slice(img.as_raw(), img.width() as usize, img.height() as usize, 3)
}

/// Drops the alpha channel of a captured bitmap.
pub fn rgb_from_rgba(img: &RgbaImage) -> RgbImage {
    image::DynamicImage::ImageRgba8(img.clone()).to_rgb8()
}

/// Loads an image from disk as RGB.
///
/// Any failure (missing file, unsupported or corrupt data) is reported as
/// [`XqError::ImageLoad`].
pub fn load_rgb_image<P: AsRef<Path>>(path: P) -> XqResult<RgbImage> {
    let path = path.as_ref();
    let img = image::open(path).map_err(|err| XqError::ImageLoad {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    Ok(img.to_rgb8())
}

/// Writes an RGB image as PNG, creating parent directories as needed.
pub fn save_rgb_png<P: AsRef<Path>>(img: &RgbImage, path: P) -> XqResult<()> {
    let path = path.as_ref();
    let save_err = |reason: String| XqError::ImageSave {
        path: path.to_path_buf(),
        reason,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| save_err(err.to_string()))?;
    }
    img.save_with_format(path, image::ImageFormat::Png)
        .map_err(|err| save_err(err.to_string()))
}
