//! Template bootstrap: crops starting-position cells out of a calibrated frame.

use crate::board::calibrate::GridCalibration;
use crate::board::piece::PieceKind;
use crate::image::io::save_rgb_png;
use crate::template::TemplateCache;
use crate::trace::{trace_event, trace_span};
use crate::util::{XqError, XqResult};
use image::RgbImage;
use std::path::PathBuf;

/// Crop side as a fraction of the cell pitch.
pub const SNAPSHOT_FRACTION: f32 = 0.65;

/// Starting-position cell `(file, rank)` sampled for each class.
pub const SNAPSHOT_SLOTS: [(PieceKind, usize, usize); 14] = [
    (PieceKind::BlackRook, 0, 0),
    (PieceKind::BlackHorse, 1, 0),
    (PieceKind::BlackElephant, 2, 0),
    (PieceKind::BlackAdvisor, 3, 0),
    (PieceKind::BlackKing, 4, 0),
    (PieceKind::BlackCannon, 1, 2),
    (PieceKind::BlackPawn, 0, 3),
    (PieceKind::RedRook, 0, 9),
    (PieceKind::RedHorse, 1, 9),
    (PieceKind::RedElephant, 2, 9),
    (PieceKind::RedAdvisor, 3, 9),
    (PieceKind::RedKing, 4, 9),
    (PieceKind::RedCannon, 1, 7),
    (PieceKind::RedPawn, 0, 6),
];

/// Square crop of side `side` centred on a grid intersection. The returned
/// left/top may be negative near the frame edge.
pub fn snapshot_rect(grid: &GridCalibration, file: usize, rank: usize) -> (i64, i64, u32) {
    let side = (grid.cell_pitch * SNAPSHOT_FRACTION) as i64;
    let left = grid.origin.x as i64 - side / 2 + (file as f32 * grid.cell_pitch) as i64;
    let top = grid.origin.y as i64 - side / 2 + (rank as f32 * grid.cell_pitch) as i64;
    (left, top, side as u32)
}

/// Copies a square out of `frame`; parts outside the frame stay black.
pub fn crop_square(frame: &RgbImage, left: i64, top: i64, side: u32) -> XqResult<RgbImage> {
    if side == 0 {
        return Err(XqError::InvalidDimensions {
            width: 0,
            height: 0,
        });
    }
    let (fw, fh) = (frame.width() as i64, frame.height() as i64);
    if left >= fw || top >= fh || left + side as i64 <= 0 || top + side as i64 <= 0 {
        return Err(XqError::RoiOutOfBounds {
            x: left.max(0) as usize,
            y: top.max(0) as usize,
            width: side as usize,
            height: side as usize,
            img_width: fw as usize,
            img_height: fh as usize,
        });
    }
    Ok(RgbImage::from_fn(side, side, |x, y| {
        let sx = left + x as i64;
        let sy = top + y as i64;
        if sx >= 0 && sy >= 0 && sx < fw && sy < fh {
            *frame.get_pixel(sx as u32, sy as u32)
        } else {
            image::Rgb([0, 0, 0])
        }
    }))
}

/// Writes the 14 starting-position crops into `<find_path>/<catalog>/` and
/// drops the cached templates they replace.
///
/// Returns the written paths in slot order. Assumes the board shows (or is
/// close to) the starting position.
pub fn export_templates(
    cache: &TemplateCache,
    catalog: &str,
    grid: &GridCalibration,
    frame: &RgbImage,
) -> XqResult<Vec<PathBuf>> {
    let _span = trace_span!("export_templates", catalog = catalog).entered();
    let mut written = Vec::with_capacity(SNAPSHOT_SLOTS.len());
    for (kind, file, rank) in SNAPSHOT_SLOTS {
        let (left, top, side) = snapshot_rect(grid, file, rank);
        let crop = crop_square(frame, left, top, side)?;
        let file_name = kind.file_name();
        let path = cache.template_path(catalog, &file_name);
        save_rgb_png(&crop, &path)?;
        cache.invalidate(&file_name);
        written.push(path);
    }
    trace_event!("templates_exported", count = written.len());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::{crop_square, export_templates, snapshot_rect, SNAPSHOT_SLOTS};
    use crate::board::calibrate::{GridCalibration, Point};
    use crate::template::{TemplateCache, TemplateSettings};
    use image::{Rgb, RgbImage};
    use std::collections::HashSet;
    use std::fs;

    fn grid() -> GridCalibration {
        GridCalibration::from_rook_pair(Point::new(100, 200), Point::new(420, 200)).unwrap()
    }

    #[test]
    fn slots_cover_every_class_once() {
        let kinds: HashSet<_> = SNAPSHOT_SLOTS.iter().map(|(k, _, _)| *k).collect();
        assert_eq!(kinds.len(), 14);
    }

    #[test]
    fn rect_is_centred_on_intersection() {
        let (left, top, side) = snapshot_rect(&grid(), 4, 9);
        assert_eq!(side, 26);
        assert_eq!((left, top), (100 - 13 + 160, 200 - 13 + 360));
    }

    #[test]
    fn crop_pads_outside_frame() {
        let frame = RgbImage::from_pixel(10, 10, Rgb([200, 100, 50]));
        let crop = crop_square(&frame, -2, 8, 4).unwrap();
        assert_eq!(crop.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(crop.get_pixel(2, 0), &Rgb([200, 100, 50]));
        assert_eq!(crop.get_pixel(3, 3), &Rgb([0, 0, 0]));
        assert!(crop_square(&frame, 20, 0, 4).is_err());
    }

    #[test]
    fn export_writes_all_files() {
        let root = std::env::temp_dir().join(format!("xqmatch-snap-{}", std::process::id()));
        let _ = fs::remove_dir_all(&root);
        let frame = RgbImage::from_fn(480, 620, |x, y| Rgb([x as u8, y as u8, (x ^ y) as u8]));
        let cache = TemplateCache::new(&root, TemplateSettings::default());

        let written = export_templates(&cache, "skin", &grid(), &frame).unwrap();
        assert_eq!(written.len(), 14);
        assert!(written.iter().all(|p| p.exists()));
        assert!(root.join("skin").join("bk.png").exists());
        assert_eq!(cache.get("skin", "rp.png").unwrap().width(), 26 - 2 * 5);

        let _ = fs::remove_dir_all(&root);
    }
}
