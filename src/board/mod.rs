//! Board geometry: piece classes, grid calibration, FEN encoding and
//! template bootstrap.

pub mod calibrate;
pub mod fen;
pub mod piece;
pub mod snapshot;

pub use calibrate::{calibrate, BoardCalibration, GridCalibration, Point, FILES, MIN_CELL_PITCH, RANKS};
pub use fen::{encode, FenRecord, LogicalBoard, Orientation, PieceObservation};
pub use piece::{PieceKind, Side};
pub use snapshot::{export_templates, SNAPSHOT_SLOTS};
