//! Board sessions: locate, calibrate, scan and encode against one window.
//!
//! A [`BoardSession`] owns every piece of sticky state (linked window,
//! calibration, probe frame) together with its template cache. At most one
//! cycle runs per session; a second caller gets [`XqError::Busy`] instead of
//! waiting.

mod config;
mod grab;
mod locator;
mod pieces;

pub use config::CaptureConfig;
pub use grab::{crop_to_board, ScreenGrabber};
pub use locator::{BoardLocator, LocatedBoard, ProbeMode};
pub use pieces::PieceLocator;

use crate::board::{self, BoardCalibration, FenRecord, PieceObservation};
use crate::image::io::view_from_rgb_image;
use crate::search::TemplateMatcher;
use crate::template::TemplateCache;
use crate::trace::{trace_event, trace_span};
use crate::util::{XqError, XqResult};
use crate::window::{FrameSource, WindowHandle, WindowSystem};
use image::RgbImage;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::thread::{self, JoinHandle};

/// Shared flag that stops a running cycle at its next check.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Message for the host application.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureEvent {
    /// Load this position into the board model.
    SetFen(String),
    /// Human-readable status line.
    Text(String),
}

#[derive(Default)]
struct SessionState {
    window: Option<WindowHandle>,
    calibration: Option<BoardCalibration>,
    last_frame: Option<RgbImage>,
}

/// Recognition session bound to one window system.
pub struct BoardSession {
    config: CaptureConfig,
    windows: Arc<dyn WindowSystem>,
    grabber: ScreenGrabber,
    cache: TemplateCache,
    matcher: TemplateMatcher,
    state: Mutex<SessionState>,
}

impl BoardSession {
    /// Validates `config` and builds an unlinked session.
    pub fn new(config: CaptureConfig, windows: Arc<dyn WindowSystem>) -> XqResult<Self> {
        config.validate()?;
        let mut grabber = ScreenGrabber::new(Arc::clone(&windows), config.sleep());
        grabber.set_external(None, config.use_external_capture);
        if config.dump_frames {
            grabber.set_dump_dir(Some(config.image_dir()));
        }
        Ok(Self {
            cache: TemplateCache::new(config.find_path(), config.template_settings()),
            matcher: TemplateMatcher::new(config.match_config()),
            windows,
            grabber,
            config,
            state: Mutex::new(SessionState::default()),
        })
    }

    /// Registers the backend used when `use_external_capture` is set.
    pub fn with_frame_source(mut self, source: Arc<dyn FrameSource>) -> Self {
        self.grabber
            .set_external(Some(source), self.config.use_external_capture);
        self
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    pub fn cache(&self) -> &TemplateCache {
        &self.cache
    }

    pub fn matcher(&self) -> &TemplateMatcher {
        &self.matcher
    }

    /// Current calibration, if linked.
    pub fn calibration(&self) -> XqResult<Option<BoardCalibration>> {
        Ok(self.gate()?.calibration.clone())
    }

    /// Currently linked window.
    pub fn window(&self) -> XqResult<Option<WindowHandle>> {
        Ok(self.gate()?.window)
    }

    /// Finds the first window qualifying under `mode` without touching
    /// session state.
    pub fn locate(&self, mode: ProbeMode, cancel: &CancelToken) -> XqResult<LocatedBoard> {
        let _state = self.gate()?;
        self.locator().locate(mode, cancel)
    }

    /// Quick-probes, calibrates from the two black rooks and commits the
    /// result. With `bootstrap`, template seeds are then exported from the
    /// probe frame.
    ///
    /// Nothing is committed unless both locate and calibrate succeed.
    pub fn link(&self, cancel: &CancelToken, bootstrap: bool) -> XqResult<BoardCalibration> {
        let mut state = self.gate()?;
        let calibration = self.link_locked(&mut state, cancel)?;
        if bootstrap {
            self.export_locked(&state)?;
        }
        Ok(calibration)
    }

    /// Captures the linked window once and locates every piece class,
    /// linking first when the session is not calibrated.
    pub fn scan(&self, cancel: &CancelToken) -> XqResult<PieceObservation> {
        let mut state = self.gate()?;
        self.scan_locked(&mut state, cancel).map(|(_, obs)| obs)
    }

    /// One full cycle: scan, then encode the observation as FEN.
    pub fn recognize(&self, cancel: &CancelToken) -> XqResult<FenRecord> {
        let mut state = self.gate()?;
        let (calibration, observation) = self.scan_locked(&mut state, cancel)?;
        let fen = board::encode(&observation, &calibration.grid);
        trace_event!("recognized", fen = fen.as_str());
        Ok(fen)
    }

    /// Writes template seeds from the frame of the last successful link.
    pub fn export_templates(&self) -> XqResult<Vec<PathBuf>> {
        let state = self.gate()?;
        self.export_locked(&state)
    }

    /// Forgets the linked window and calibration and drops cached templates.
    pub fn reset(&self) -> XqResult<()> {
        let mut state = self.gate()?;
        *state = SessionState::default();
        self.cache.clear();
        Ok(())
    }

    fn gate(&self) -> XqResult<MutexGuard<'_, SessionState>> {
        match self.state.try_lock() {
            Ok(guard) => Ok(guard),
            Err(TryLockError::Poisoned(poisoned)) => Ok(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => Err(XqError::Busy),
        }
    }

    fn locator(&self) -> BoardLocator<'_> {
        BoardLocator {
            windows: self.windows.as_ref(),
            grabber: &self.grabber,
            cache: &self.cache,
            matcher: &self.matcher,
            qualifier: self.config.qualifier(),
            host_class: self.config.host_window_class.as_deref(),
            catalog: &self.config.catalog,
        }
    }

    fn link_locked(
        &self,
        state: &mut SessionState,
        cancel: &CancelToken,
    ) -> XqResult<BoardCalibration> {
        let located = self.locator().locate(ProbeMode::Quick, cancel)?;
        let grid = board::calibrate(located.rooks())?;
        let calibration = BoardCalibration {
            grid,
            catalog: self.config.catalog.clone(),
            window_class: located.class,
            window_title: located.title,
            window: located.handle,
        };
        state.window = Some(located.handle);
        state.calibration = Some(calibration.clone());
        state.last_frame = Some(located.frame);
        Ok(calibration)
    }

    fn scan_locked(
        &self,
        state: &mut SessionState,
        cancel: &CancelToken,
    ) -> XqResult<(BoardCalibration, PieceObservation)> {
        let calibration = match &state.calibration {
            Some(calibration) => calibration.clone(),
            None => self.link_locked(state, cancel)?,
        };
        if cancel.is_cancelled() {
            return Err(XqError::Cancelled);
        }

        let mut frame = self.grabber.grab(calibration.window)?;
        if self.config.crop_to_board {
            frame = crop_to_board(&frame, &calibration.grid);
        }
        let pieces = PieceLocator {
            cache: &self.cache,
            matcher: &self.matcher,
            catalog: &calibration.catalog,
        };
        let observation = pieces.scan(view_from_rgb_image(&frame)?, cancel)?;
        Ok((calibration, observation))
    }

    fn export_locked(&self, state: &SessionState) -> XqResult<Vec<PathBuf>> {
        let (Some(calibration), Some(frame)) = (&state.calibration, &state.last_frame) else {
            return Err(XqError::NotCalibrated);
        };
        board::export_templates(&self.cache, &calibration.catalog, &calibration.grid, frame)
    }
}

/// Runs one [`BoardSession::recognize`] cycle on a worker thread and reports
/// the outcome on `events`: the FEN on success, the error text otherwise.
pub fn spawn_recognition(
    session: Arc<BoardSession>,
    cancel: CancelToken,
    events: Sender<CaptureEvent>,
) -> JoinHandle<XqResult<FenRecord>> {
    thread::spawn(move || {
        let _span = trace_span!("recognition_cycle").entered();
        let result = session.recognize(&cancel);
        let event = match &result {
            Ok(fen) => CaptureEvent::SetFen(fen.to_string()),
            Err(err) => CaptureEvent::Text(err.to_string()),
        };
        let _ = events.send(event);
        result
    })
}
