//! Pixel-grid calibration from the two black rooks of the starting rank.

use crate::search::Match;
use crate::trace::{trace_event, trace_span};
use crate::util::math::round_half_even;
use crate::util::{XqError, XqResult};
use crate::window::WindowHandle;

/// Number of files on a board.
pub const FILES: usize = 9;
/// Number of ranks on a board.
pub const RANKS: usize = 10;
/// Smallest accepted distance between adjacent grid points, in pixels.
pub const MIN_CELL_PITCH: f32 = 10.0;

/// Pixel coordinate in a captured frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<Match> for Point {
    fn from(m: Match) -> Self {
        Self {
            x: m.x as i32,
            y: m.y as i32,
        }
    }
}

/// Pixel origin and pitch of the 9x10 grid of intersections.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridCalibration {
    /// Pixel position of file 0, rank 0.
    pub origin: Point,
    /// Pixel distance between adjacent files (and ranks).
    pub cell_pitch: f32,
}

impl GridCalibration {
    /// Derives the grid from the two rooks of one back rank, eight files
    /// apart. The leftmost point becomes the origin; y-coordinates play no
    /// part in the pitch.
    pub fn from_rook_pair(a: Point, b: Point) -> XqResult<Self> {
        let (left, right) = if a.x <= b.x { (a, b) } else { (b, a) };
        let cell_pitch = (right.x - left.x) as f32 / (FILES - 1) as f32;
        if cell_pitch < MIN_CELL_PITCH {
            return Err(XqError::CalibrationInvalid {
                pitch: cell_pitch,
                min: MIN_CELL_PITCH,
            });
        }
        Ok(Self {
            origin: left,
            cell_pitch,
        })
    }

    /// Board file and rank nearest to `p`, clamped onto the board.
    pub fn cell_of(&self, p: Point) -> (usize, usize) {
        let file = round_half_even((p.x - self.origin.x) as f32 / self.cell_pitch);
        let rank = round_half_even((p.y - self.origin.y) as f32 / self.cell_pitch);
        (
            file.clamp(0, FILES as i32 - 1) as usize,
            rank.clamp(0, RANKS as i32 - 1) as usize,
        )
    }

    /// Index of the cell nearest to `p` in the 90-cell board, `file + 9 * rank`.
    pub fn cell_index(&self, p: Point) -> usize {
        let (file, rank) = self.cell_of(p);
        file + FILES * rank
    }

    /// Nominal pixel centre of a grid intersection.
    pub fn cell_center(&self, file: usize, rank: usize) -> (f32, f32) {
        (
            self.origin.x as f32 + file as f32 * self.cell_pitch,
            self.origin.y as f32 + rank as f32 * self.cell_pitch,
        )
    }

    /// Width and height of the region from the frame origin that covers the
    /// whole board including the outer pieces.
    pub fn board_extent(&self) -> (u32, u32) {
        let width = self.origin.x as f32 + self.cell_pitch * 8.8;
        let height = self.origin.y as f32 + self.cell_pitch * 9.8;
        (width.max(0.0) as u32, height.max(0.0) as u32)
    }
}

/// Sticky calibration of one board session.
#[derive(Clone, Debug, PartialEq)]
pub struct BoardCalibration {
    pub grid: GridCalibration,
    /// Template catalog the board was calibrated with.
    pub catalog: String,
    pub window_class: String,
    pub window_title: String,
    pub window: WindowHandle,
}

/// Calibrates from the matches of a quick probe.
///
/// Exactly two rook points are required; anything else is reported as a
/// missing anchor.
pub fn calibrate(rooks: &[Point]) -> XqResult<GridCalibration> {
    let _span = trace_span!("calibrate", points = rooks.len()).entered();
    let [a, b] = rooks else {
        return Err(XqError::AnchorNotFound { piece: "br" });
    };
    let grid = GridCalibration::from_rook_pair(*a, *b)?;
    trace_event!(
        "calibrated",
        origin_x = grid.origin.x,
        origin_y = grid.origin.y,
        pitch = grid.cell_pitch
    );
    Ok(grid)
}
