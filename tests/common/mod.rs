//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;
use std::sync::Once;

use cv_imgsource::{Backend, Capture, Error, Result};
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use log::{Level, LevelFilter, Log, Metadata, Record};

pub const FRAME_WIDTH: u32 = 8;
pub const FRAME_HEIGHT: u32 = 6;

/// Counters shared between a test and the captures its backend opened.
#[derive(Default)]
pub struct Stats {
    pub opens: Cell<u32>,
    pub releases: Cell<u32>,
    pub reads: Cell<u64>,
    pub seeks: RefCell<Vec<u64>>
}

impl Stats {
    pub fn open_handles(&self) -> u32 {
        self.opens.get() - self.releases.get()
    }
}

/// Backend producing synthetic frames whose pixels encode their position in the stream.
#[derive(Clone)]
pub struct MockBackend {
    /// Number of decodable frames
    pub length: u64,

    /// Frame count reported to the source
    pub reported_count: Option<u64>,

    pub fps: Option<f64>,

    /// Every read whose 1-based number is a multiple of this fails
    pub fail_every: Option<u64>,

    pub seekable: bool,

    pub stats: Rc<Stats>
}

struct MockCapture {
    backend: MockBackend,
    position: u64
}

impl MockBackend {
    pub fn video(length: u64) -> Self {
        Self {
            length,
            reported_count: Some(length),
            fps: Some(25.0),
            fail_every: None,
            seekable: true,
            stats: Rc::new(Stats::default())
        }
    }

    pub fn camera() -> Self {
        Self {
            length: u64::MAX,
            reported_count: None,
            fps: Some(30.0),
            fail_every: None,
            seekable: false,
            stats: Rc::new(Stats::default())
        }
    }

    fn open(&self) -> Box<dyn Capture> {
        self.stats.opens.set(self.stats.opens.get() + 1);

        Box::new(MockCapture { backend: self.clone(), position: 0 })
    }
}

impl Backend for MockBackend {
    fn open_camera(&self, _index: u32) -> Result<Box<dyn Capture>> {
        Ok(self.open())
    }

    fn open_video(&self, _path: &Path) -> Result<Box<dyn Capture>> {
        Ok(self.open())
    }
}

impl Capture for MockCapture {
    fn read(&mut self) -> Result<Option<DynamicImage>> {
        let stats = &self.backend.stats;
        stats.reads.set(stats.reads.get() + 1);

        let position = self.position;
        self.position += 1;

        if let Some(n) = self.backend.fail_every {
            if stats.reads.get() % n == 0 {
                return Ok(None);
            }
        }

        if position >= self.backend.length {
            return Ok(None);
        }

        Ok(Some(encode_position(position)))
    }

    fn seek(&mut self, position: u64) -> Result<()> {
        if !self.backend.seekable {
            return Err(Error::SeekUnsupported);
        }

        self.backend.stats.seeks.borrow_mut().push(position);
        self.position = position;

        Ok(())
    }

    fn fps(&self) -> Option<f64> {
        self.backend.fps
    }

    fn frame_count(&self) -> Option<u64> {
        self.backend.reported_count
    }

    fn frame_size(&self) -> Option<(u32, u32)> {
        Some((FRAME_WIDTH, FRAME_HEIGHT))
    }

    fn release(&mut self) {
        let stats = &self.backend.stats;
        stats.releases.set(stats.releases.get() + 1);
    }
}

/// A frame whose first pixel holds `position`, never all black.
pub fn encode_position(position: u64) -> DynamicImage {
    let low = (position & 0xff) as u8;
    let high = ((position >> 8) & 0xff) as u8;

    DynamicImage::ImageRgb8(RgbImage::from_pixel(FRAME_WIDTH, FRAME_HEIGHT, Rgb([low, high, 255])))
}

pub fn decode_position(img: &DynamicImage) -> u64 {
    let px = img.get_pixel(0, 0);

    px[0] as u64 | (px[1] as u64) << 8
}

/// Write a solid colour PNG of the given size.
pub fn write_image(path: &Path, width: u32, height: u32, value: u8) {
    RgbImage::from_pixel(width, height, Rgb([value, value, value]))
        .save(path)
        .expect("Cannot write test image");
}

// -----------------------------------------------------------------------------------------------
// LOG CAPTURE
// -----------------------------------------------------------------------------------------------

/// Logger keeping every record on the thread that emitted it, so parallel tests don't mix.
struct CaptureLogger;

static LOGGER: CaptureLogger = CaptureLogger;
static INIT_LOGGER: Once = Once::new();

thread_local! {
    static RECORDS: RefCell<Vec<(Level, String)>> = RefCell::new(Vec::new());
}

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        RECORDS.with(|r| r.borrow_mut().push((record.level(), record.args().to_string())));
    }

    fn flush(&self) {}
}

/// Run `f` and return its result along with the warnings it logged on this thread.
pub fn capture_warnings<R, F: FnOnce() -> R>(f: F) -> (R, Vec<String>) {
    INIT_LOGGER.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
    });

    RECORDS.with(|r| r.borrow_mut().clear());
    let result = f();

    let warnings = RECORDS.with(|r| {
        r.borrow_mut()
            .drain(..)
            .filter(|(level, _)| *level == Level::Warn)
            .map(|(_, msg)| msg)
            .collect()
    });

    (result, warnings)
}

pub fn assert_warned(warnings: &[String], needle: &str) {
    assert!(
        warnings.iter().any(|w| w.contains(needle)),
        "Expected a warning containing {:?}, got {:?}",
        needle,
        warnings
    );
}
