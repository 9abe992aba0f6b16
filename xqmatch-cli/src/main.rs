use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use xqmatch::image::io::{load_rgb_image, view_from_rgb_image};
use xqmatch::template::preprocess;
use xqmatch::window::DesktopWindowSystem;
use xqmatch::{
    spawn_recognition, BoardCalibration, BoardSession, CancelToken, CaptureConfig, CaptureEvent,
    Match, Orientation, PieceKind, ProbeMode, Template, TemplateMatcher, Threshold,
};

const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Xiangqi board recognition from window captures")]
struct Cli {
    /// Path to the JSON configuration file; defaults apply when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output.
    #[arg(long)]
    trace: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find the first window hosting a board.
    Locate {
        /// Require both kings instead of the two black rooks.
        #[arg(long)]
        full: bool,
    },
    /// Link to the board window and print its position as FEN.
    Recognize {
        /// Keep polling and print every position change.
        #[arg(long)]
        watch: bool,
        /// Delay between polling cycles.
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },
    /// Link and write a fresh template catalog from the starting position.
    Bootstrap,
    /// Find every template instance in an image file.
    Match {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        template: PathBuf,
        /// Acceptance score; the configured precision when omitted.
        #[arg(long)]
        threshold: Option<f32>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ConfigJson {
    precision: f32,
    use_external_capture: bool,
    sleep_ms: u64,
    scale_x: f32,
    scale_y: f32,
    border_clip: f32,
    app_dir: PathBuf,
    catalog: String,
    min_window_width: u32,
    min_window_height: u32,
    exclude_minimized: bool,
    host_window_class: Option<String>,
    crop_to_board: bool,
    dump_frames: bool,
    parallel: bool,
}

impl Default for ConfigJson {
    fn default() -> Self {
        let cfg = CaptureConfig::default();
        Self {
            precision: cfg.precision,
            use_external_capture: cfg.use_external_capture,
            sleep_ms: cfg.sleep_ms,
            scale_x: cfg.scale_x,
            scale_y: cfg.scale_y,
            border_clip: cfg.border_clip,
            app_dir: cfg.app_dir,
            catalog: cfg.catalog,
            min_window_width: cfg.min_window_width,
            min_window_height: cfg.min_window_height,
            exclude_minimized: cfg.exclude_minimized,
            host_window_class: cfg.host_window_class,
            crop_to_board: cfg.crop_to_board,
            dump_frames: cfg.dump_frames,
            parallel: cfg.parallel,
        }
    }
}

impl From<ConfigJson> for CaptureConfig {
    fn from(value: ConfigJson) -> Self {
        Self {
            precision: value.precision,
            use_external_capture: value.use_external_capture,
            sleep_ms: value.sleep_ms,
            scale_x: value.scale_x,
            scale_y: value.scale_y,
            border_clip: value.border_clip,
            app_dir: value.app_dir,
            catalog: value.catalog,
            min_window_width: value.min_window_width,
            min_window_height: value.min_window_height,
            exclude_minimized: value.exclude_minimized,
            host_window_class: value.host_window_class,
            crop_to_board: value.crop_to_board,
            dump_frames: value.dump_frames,
            parallel: value.parallel,
        }
    }
}

#[derive(Debug, Serialize)]
struct PointRecord {
    piece: &'static str,
    x: i32,
    y: i32,
}

#[derive(Debug, Serialize)]
struct LocateOutput {
    handle: u64,
    class: String,
    title: String,
    anchors: Vec<PointRecord>,
}

#[derive(Debug, Serialize)]
struct CalibrationRecord {
    handle: u64,
    class: String,
    title: String,
    catalog: String,
    origin_x: i32,
    origin_y: i32,
    cell_pitch: f32,
}

impl From<BoardCalibration> for CalibrationRecord {
    fn from(value: BoardCalibration) -> Self {
        Self {
            handle: value.window.0,
            class: value.window_class,
            title: value.window_title,
            catalog: value.catalog,
            origin_x: value.grid.origin.x,
            origin_y: value.grid.origin.y,
            cell_pitch: value.grid.cell_pitch,
        }
    }
}

#[derive(Debug, Serialize)]
struct BootstrapOutput {
    calibration: CalibrationRecord,
    written: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
struct FenOutput {
    fen: String,
    flipped: bool,
}

#[derive(Debug, Serialize)]
struct MatchRecord {
    x: usize,
    y: usize,
    score: f32,
}

impl From<Match> for MatchRecord {
    fn from(value: Match) -> Self {
        Self {
            x: value.x,
            y: value.y,
            score: value.score,
        }
    }
}

#[derive(Debug, Serialize)]
struct MatchOutput {
    found: bool,
    matches: Vec<MatchRecord>,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_match(
    config: &CaptureConfig,
    image: &Path,
    template: &Path,
    threshold: Option<f32>,
) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;
    let source = load_rgb_image(image)?;
    let raw = load_rgb_image(template)?;
    let processed = preprocess(&raw, config.scale_x, config.scale_y, config.border_clip)?;
    let template = Template::from_rgb(&processed)?;
    let matcher = TemplateMatcher::new(config.match_config());
    let threshold = threshold.map_or(Threshold::SessionDefault, Threshold::Fixed);
    let matches = matcher.find_all(view_from_rgb_image(&source)?, &template, threshold)?;
    print_json(&MatchOutput {
        found: !matches.is_empty(),
        matches: matches.into_iter().map(MatchRecord::from).collect(),
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("xqmatch=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config: CaptureConfig = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            serde_json::from_str::<ConfigJson>(&text)?.into()
        }
        None => ConfigJson::default().into(),
    };
    if config.parallel && !cfg!(feature = "rayon") {
        tracing::warn!("parallel matching requested but this build lacks the rayon feature");
    }
    let Some(command) = cli.command else {
        return Err("a subcommand is required (see --help)".into());
    };

    let new_session = || -> Result<Arc<BoardSession>, xqmatch::XqError> {
        let windows = Arc::new(DesktopWindowSystem::new());
        Ok(Arc::new(BoardSession::new(config.clone(), windows)?))
    };
    let cancel = CancelToken::new();

    match command {
        Command::Match {
            image,
            template,
            threshold,
        } => run_match(&config, &image, &template, threshold),
        Command::Locate { full } => {
            let session = new_session()?;
            let mode = if full { ProbeMode::Full } else { ProbeMode::Quick };
            let located = session.locate(mode, &cancel)?;
            let anchors = PieceKind::ALL
                .into_iter()
                .flat_map(|kind| {
                    located
                        .anchors
                        .points(kind)
                        .iter()
                        .map(move |p| PointRecord {
                            piece: kind.file_stem(),
                            x: p.x,
                            y: p.y,
                        })
                })
                .collect();
            print_json(&LocateOutput {
                handle: located.handle.0,
                class: located.class,
                title: located.title,
                anchors,
            })
        }
        Command::Bootstrap => {
            let session = new_session()?;
            let calibration = session.link(&cancel, false)?;
            let written = session.export_templates()?;
            print_json(&BootstrapOutput {
                calibration: calibration.into(),
                written,
            })
        }
        Command::Recognize { watch, interval_ms } => {
            let session = new_session()?;
            if !watch {
                let fen = session.recognize(&cancel)?;
                return print_json(&FenOutput {
                    flipped: fen.orientation() == Orientation::Flipped,
                    fen: fen.into_string(),
                });
            }
            let mut last = String::new();
            loop {
                let (tx, rx) = mpsc::channel();
                let worker = spawn_recognition(Arc::clone(&session), cancel.clone(), tx);
                match rx.recv()? {
                    CaptureEvent::SetFen(fen) if fen != last => {
                        println!("{fen}");
                        last = fen;
                    }
                    CaptureEvent::SetFen(_) => {}
                    CaptureEvent::Text(text) => eprintln!("{text}"),
                }
                if let Ok(Err(err)) = worker.join() {
                    if !err.is_recoverable() {
                        return Err(err.into());
                    }
                }
                thread::sleep(Duration::from_millis(interval_ms));
            }
        }
    }
}
