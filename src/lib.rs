//! xqmatch recognizes a Xiangqi board drawn inside a foreign application
//! window and turns it into a FEN-style position string.
//!
//! The pipeline is: enumerate and qualify windows, capture a frame, find the
//! piece icons with colour ZNCC template matching, calibrate the 9x10 grid
//! from the two black rooks, quantize the matches onto the board and
//! serialize the result. Row-parallel scoring is available via the `rayon`
//! feature; a live desktop backend via `desktop`.

pub mod board;
pub mod image;
pub mod kernel;
pub mod search;
pub mod session;
pub mod template;
mod trace;
pub mod util;
pub mod window;

pub use board::{
    BoardCalibration, FenRecord, GridCalibration, LogicalBoard, Orientation, PieceKind,
    PieceObservation, Point,
};
pub use self::image::ImageView;
pub use kernel::{Kernel, ScanParams};
pub use search::{Match, MatchConfig, TemplateMatcher, Threshold};
pub use session::{
    spawn_recognition, BoardSession, CancelToken, CaptureConfig, CaptureEvent, ProbeMode,
};
pub use template::{Template, TemplateCache, TemplatePlan, TemplateSettings};
pub use util::{XqError, XqResult};
pub use window::{FakeWindow, FakeWindowSystem, WindowHandle, WindowQualifier, WindowSystem};
