//! Quantization of observed piece points into a logical board and its FEN form.

use crate::board::calibrate::{GridCalibration, Point, FILES, RANKS};
use crate::board::piece::PieceKind;
use crate::util::{XqError, XqResult};
use std::fmt;

/// Placeholder tail: this variant has no castling or en-passant state.
const FEN_TAIL: &str = "- - 0 1";

/// Pixel points found for each piece class, in discovery order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PieceObservation {
    points: [Vec<Point>; 14],
}

impl PieceObservation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Points observed for `kind`.
    pub fn points(&self, kind: PieceKind) -> &[Point] {
        &self.points[kind.index()]
    }

    /// Replaces the points of `kind`.
    pub fn set(&mut self, kind: PieceKind, points: Vec<Point>) {
        self.points[kind.index()] = points;
    }

    pub fn push(&mut self, kind: PieceKind, point: Point) {
        self.points[kind.index()].push(point);
    }

    /// Total number of observed points.
    pub fn len(&self) -> usize {
        self.points.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// How the board appears on screen, inferred from the two kings.
///
/// This is screen orientation, not side to move: the turn marker of the
/// encoded FEN simply follows it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    /// Black king above the red king (or kings missing).
    Normal,
    /// Black king below the red king.
    Flipped,
}

impl Orientation {
    /// Infers orientation from the first observed point of each king.
    pub fn infer(obs: &PieceObservation) -> Self {
        match (
            obs.points(PieceKind::BlackKing).first(),
            obs.points(PieceKind::RedKing).first(),
        ) {
            (Some(black), Some(red)) if black.y > red.y => Orientation::Flipped,
            _ => Orientation::Normal,
        }
    }

    /// Turn marker emitted for this orientation.
    pub fn turn_marker(self) -> char {
        match self {
            Orientation::Normal => 'w',
            Orientation::Flipped => 'b',
        }
    }
}

/// 10x9 board of optional pieces, rank 0 at the top of the screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogicalBoard {
    cells: [Option<PieceKind>; FILES * RANKS],
}

impl Default for LogicalBoard {
    fn default() -> Self {
        Self {
            cells: [None; FILES * RANKS],
        }
    }
}

impl LogicalBoard {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Quantizes every observed point onto the grid. Classes are written in
    /// [`PieceKind::ALL`] order, so a later class wins a shared cell.
    pub fn from_observation(obs: &PieceObservation, grid: &GridCalibration) -> Self {
        let mut board = Self::empty();
        for kind in PieceKind::ALL {
            for &p in obs.points(kind) {
                board.cells[grid.cell_index(p)] = Some(kind);
            }
        }
        board
    }

    pub fn get(&self, file: usize, rank: usize) -> Option<PieceKind> {
        if file >= FILES || rank >= RANKS {
            return None;
        }
        self.cells[file + FILES * rank]
    }

    pub fn set(&mut self, file: usize, rank: usize, piece: Option<PieceKind>) {
        if file < FILES && rank < RANKS {
            self.cells[file + FILES * rank] = piece;
        }
    }

    /// Number of occupied cells.
    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Piece placement field: ranks top to bottom joined by `/`, empty runs
    /// collapsed into a digit.
    pub fn placement(&self) -> String {
        let mut out = String::with_capacity(FILES * RANKS + RANKS);
        for rank in 0..RANKS {
            if rank > 0 {
                out.push('/');
            }
            let mut empty = 0u32;
            for file in 0..FILES {
                match self.cells[file + FILES * rank] {
                    Some(kind) => {
                        if empty > 0 {
                            out.push(char::from_digit(empty, 10).unwrap_or('9'));
                            empty = 0;
                        }
                        out.push(kind.fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                out.push(char::from_digit(empty, 10).unwrap_or('9'));
            }
        }
        out
    }

    /// Parses a placement field produced by [`LogicalBoard::placement`].
    pub fn from_placement(placement: &str) -> XqResult<Self> {
        let mut board = Self::empty();
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != RANKS {
            return Err(XqError::InvalidInput("placement must have 10 ranks"));
        }
        for (rank, field) in ranks.iter().enumerate() {
            let mut file = 0usize;
            for c in field.chars() {
                if let Some(run) = c.to_digit(10) {
                    file += run as usize;
                } else {
                    let kind = PieceKind::from_fen_char(c)
                        .ok_or(XqError::InvalidInput("unknown piece symbol"))?;
                    board.set(file, rank, Some(kind));
                    file += 1;
                }
                if file > FILES {
                    return Err(XqError::InvalidInput("rank overflows 9 files"));
                }
            }
            if file != FILES {
                return Err(XqError::InvalidInput("rank does not cover 9 files"));
            }
        }
        Ok(board)
    }
}

/// FEN-style position text handed to the host's board model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FenRecord {
    text: String,
    orientation: Orientation,
}

impl FenRecord {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Piece placement field.
    pub fn placement(&self) -> &str {
        self.text.split(' ').next().unwrap_or_default()
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for FenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Encodes an observation as `<placement> <w|b> - - 0 1`.
pub fn encode(obs: &PieceObservation, grid: &GridCalibration) -> FenRecord {
    let board = LogicalBoard::from_observation(obs, grid);
    let orientation = Orientation::infer(obs);
    FenRecord {
        text: format!(
            "{} {} {}",
            board.placement(),
            orientation.turn_marker(),
            FEN_TAIL
        ),
        orientation,
    }
}

#[cfg(test)]
mod tests {
    use super::{encode, LogicalBoard, Orientation, PieceObservation};
    use crate::board::calibrate::{GridCalibration, Point};
    use crate::board::piece::PieceKind;

    const START: &str = "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR";

    fn grid() -> GridCalibration {
        GridCalibration::from_rook_pair(Point::new(100, 200), Point::new(420, 200)).unwrap()
    }

    fn start_observation(grid: &GridCalibration) -> PieceObservation {
        let board = LogicalBoard::from_placement(START).unwrap();
        let mut obs = PieceObservation::new();
        for rank in 0..10 {
            for file in 0..9 {
                if let Some(kind) = board.get(file, rank) {
                    let (x, y) = grid.cell_center(file, rank);
                    obs.push(kind, Point::new(x as i32 + 3, y as i32 - 2));
                }
            }
        }
        obs
    }

    #[test]
    fn start_position_round_trips() {
        let grid = grid();
        let fen = encode(&start_observation(&grid), &grid);
        assert_eq!(fen.as_str(), format!("{START} w - - 0 1"));
        assert_eq!(fen.orientation(), Orientation::Normal);
    }

    #[test]
    fn swapping_king_heights_flips_marker() {
        let grid = grid();
        let mut obs = start_observation(&grid);
        let black = obs.points(PieceKind::BlackKing).to_vec();
        let red = obs.points(PieceKind::RedKing).to_vec();
        obs.set(PieceKind::BlackKing, vec![Point::new(black[0].x, red[0].y)]);
        obs.set(PieceKind::RedKing, vec![Point::new(red[0].x, black[0].y)]);
        let fen = encode(&obs, &grid);
        assert!(fen.as_str().ends_with(" b - - 0 1"));
        assert_eq!(fen.orientation(), Orientation::Flipped);
    }

    #[test]
    fn missing_red_king_is_not_flipped() {
        let mut obs = PieceObservation::new();
        obs.push(PieceKind::BlackKing, Point::new(260, 560));
        assert_eq!(Orientation::infer(&obs), Orientation::Normal);
    }

    #[test]
    fn every_rank_sums_to_nine_files() {
        let grid = grid();
        let mut obs = PieceObservation::new();
        obs.push(PieceKind::RedPawn, Point::new(140, 240));
        obs.push(PieceKind::BlackCannon, Point::new(420, 560));
        obs.push(PieceKind::RedKing, Point::new(260, 360));
        let fen = encode(&obs, &grid);
        let fields: Vec<&str> = fen.placement().split('/').collect();
        assert_eq!(fields.len(), 10);
        for field in fields {
            let files: u32 = field.chars().map(|c| c.to_digit(10).unwrap_or(1)).sum();
            assert_eq!(files, 9, "field {field}");
        }
    }

    #[test]
    fn later_class_wins_collision() {
        let grid = grid();
        let mut obs = PieceObservation::new();
        obs.push(PieceKind::BlackPawn, Point::new(101, 199));
        obs.push(PieceKind::RedRook, Point::new(99, 201));
        let board = LogicalBoard::from_observation(&obs, &grid);
        assert_eq!(board.get(0, 0), Some(PieceKind::BlackPawn));
        assert_eq!(board.occupied(), 1);
    }

    #[test]
    fn king_above_origin_lands_on_top_rank() {
        let grid = grid();
        let mut obs = PieceObservation::new();
        obs.push(PieceKind::BlackKing, Point::new(280, 160));
        let board = LogicalBoard::from_observation(&obs, &grid);
        assert_eq!(board.get(4, 0), Some(PieceKind::BlackKing));
        assert!(encode(&obs, &grid).as_str().starts_with("4k4/9/"));
    }

    #[test]
    fn rejects_malformed_placement() {
        assert!(LogicalBoard::from_placement("9/9").is_err());
        assert!(LogicalBoard::from_placement(&START.replace("1c5c1", "1c5c2")).is_err());
        assert!(LogicalBoard::from_placement(&START.replace("rnbakabnr", "rnbaxabnr")).is_err());
    }
}
