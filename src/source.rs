//! # Image Source Module
//!
//! This module provides `ImageSource`, a pull-based iterator of images which gives a uniform API
//! over cameras, video files and directories of still images.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use image::DynamicImage;
use log::{debug, info, warn};

use crate::capture::{Backend, Capture};
use crate::config::Settings;
use crate::directory::list_images;
use crate::error::Result;
use crate::origin::{Origin, Resolved, SourceKind};

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Frame delay suggested when the source reports no usable frame rate, about 30 FPS.
pub const DEFAULT_FRAME_DELAY_MS: u64 = 33;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTS
// -----------------------------------------------------------------------------------------------

/// An item produced by an `ImageSource`.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Index of the frame in the source. For cameras this counts device reads.
    pub position: u64,

    /// The image, or `None` if this pull produced nothing (camera hiccup, undecodable file).
    pub image: Option<DynamicImage>
}

/// A sequence of images read from a camera, a video file or a directory of images.
///
/// Frames are produced through the `Iterator` implementation. Each pull blocks until the
/// underlying device or file returns. Construct with `ImageSourceBuilder` or `ImageSource::new`.
pub struct ImageSource {
    origin: Origin,

    settings: Settings,

    backend: Box<dyn Backend>,

    mode: Mode,

    released: bool,

    produced: u64
}

struct CameraState {
    index: u32,
    capture: Option<Box<dyn Capture>>,
    reads: u64
}

struct VideoState {
    path: PathBuf,
    capture: Option<Box<dyn Capture>>,
    cursor: u64,
    total: FrameCount,
    ended: bool
}

struct DirectoryState {
    files: Vec<PathBuf>,
    cursor: u64
}

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

/// Length of the sequence a source can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameCount {
    /// Exactly this many frames
    Known(u64),

    /// Never ends (cameras)
    Unbounded,

    /// The decoder could not tell
    Unknown
}

enum Mode {
    Camera(CameraState),
    VideoFile(VideoState),
    ImageDirectory(DirectoryState)
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl ImageSource {
    /// Open `origin` with the default configuration and the default backend.
    pub fn new<O: Into<Origin>>(origin: O) -> Result<Self> {
        crate::builder::ImageSourceBuilder::new(origin).build()
    }

    pub(crate) fn open(origin: Origin, settings: Settings, backend: Box<dyn Backend>) -> Result<Self> {
        let mode = Mode::open(origin.resolve()?, &settings, backend.as_ref());

        Ok(Self {
            origin,
            settings,
            backend,
            mode,
            released: false,
            produced: 0
        })
    }

    /// Whether another frame can be pulled from the source.
    pub fn is_available(&self) -> bool {
        !self.released && !self.mode.is_exhausted(self.settings.frame_skip)
    }

    /// Release the underlying device or decoder.
    ///
    /// Calling this more than once has no further effect. After release the source produces no
    /// more frames until `reset` is called.
    pub fn release(&mut self) {
        if self.released {
            return;
        }

        self.mode.release();
        self.released = true;

        debug!("Released image source {}", self.origin);
    }

    /// Release the source and open the same origin again from the start.
    pub fn reset(&mut self) -> Result<()> {
        self.release();

        self.mode = Mode::open(self.origin.resolve()?, &self.settings, self.backend.as_ref());
        self.released = false;
        self.produced = 0;

        Ok(())
    }

    /// Suggested wait between two frames, derived from the effective frame rate.
    ///
    /// Falls back to `DEFAULT_FRAME_DELAY_MS` when the source has no frame rate.
    pub fn frame_delay(&self) -> Duration {
        let ms = match self.effective_fps() {
            Some(fps) if fps > 0.0 => (1000.0 / fps) as u64,
            _ => DEFAULT_FRAME_DELAY_MS
        };

        Duration::from_millis(ms)
    }

    /// Frame rate reported by the camera or video, `None` for image directories.
    pub fn source_fps(&self) -> Option<f64> {
        self.mode.capture().and_then(|c| c.fps())
    }

    /// Frame rate of the produced sequence once skipped frames are accounted for.
    pub fn effective_fps(&self) -> Option<f64> {
        self.source_fps().map(|fps| fps / (self.settings.frame_skip + 1) as f64)
    }

    /// Number of frames in the source.
    pub fn total_count(&self) -> FrameCount {
        self.mode.total_count()
    }

    /// Number of frames the source will produce once skipped frames are accounted for.
    pub fn effective_frame_count(&self) -> FrameCount {
        match self.total_count() {
            FrameCount::Known(n) => FrameCount::Known(n / (self.settings.frame_skip + 1)),
            other => other
        }
    }

    /// Current read position in the source.
    pub fn position(&self) -> u64 {
        match &self.mode {
            Mode::Camera(s) => s.reads,
            Mode::VideoFile(s) => s.cursor,
            Mode::ImageDirectory(s) => s.cursor
        }
    }

    /// Number of frames produced since construction or the last reset.
    pub fn frames_produced(&self) -> u64 {
        self.produced
    }

    /// Size of the frames reported by the device, before rescaling.
    pub fn frame_size(&self) -> Option<(u32, u32)> {
        self.mode.capture().and_then(|c| c.frame_size())
    }

    /// Size of the produced images, if the device reports its frame size.
    pub fn output_size(&self) -> Option<(u32, u32)> {
        self.frame_size().and_then(|size| self.settings.rescale.output_size(size))
    }

    /// Mode the origin resolved to.
    pub fn kind(&self) -> SourceKind {
        match self.mode {
            Mode::Camera(_) => SourceKind::Camera,
            Mode::VideoFile(_) => SourceKind::VideoFile,
            Mode::ImageDirectory(_) => SourceKind::ImageDirectory
        }
    }

    /// The origin this source was built from.
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Number of frames discarded between two produced frames.
    pub fn frame_skip(&self) -> u64 {
        self.settings.frame_skip
    }

    /// Scale factor applied to produced images.
    pub fn scale(&self) -> f64 {
        self.settings.rescale.factor()
    }

    fn finish(&mut self) {
        if self.settings.auto_release {
            self.release();
        }
    }
}

impl Iterator for ImageSource {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        if !self.is_available() {
            self.finish();
            return None;
        }

        let frame = match self.mode.advance(self.settings.frame_skip) {
            Some(f) => f,
            None => {
                self.finish();
                return None;
            }
        };

        let rescale = self.settings.rescale;
        self.produced += 1;

        if self.mode.is_exhausted(self.settings.frame_skip) {
            self.finish();
        }

        let position = frame.position;
        let image = frame.image.and_then(|img| {
            let scaled = rescale.apply(img);
            if scaled.is_none() {
                warn!("Cannot scale frame {} by {}, output too large", position, rescale.factor());
            }
            scaled
        });

        Some(Frame { position, image })
    }
}

impl Drop for ImageSource {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageSource")
            .field("origin", &self.origin)
            .field("kind", &self.kind())
            .field("position", &self.position())
            .field("total_count", &self.total_count())
            .field("released", &self.released)
            .finish()
    }
}

impl FrameCount {
    /// The count if it is known.
    pub fn known(&self) -> Option<u64> {
        match *self {
            FrameCount::Known(n) => Some(n),
            _ => None
        }
    }

    /// Whether `position` lies past the end of a sequence of this length.
    fn is_reached(&self, position: u64) -> bool {
        match *self {
            FrameCount::Known(n) => position >= n,
            FrameCount::Unbounded | FrameCount::Unknown => false
        }
    }
}

impl Mode {
    /// Open the resource behind an origin. Failures are logged and leave the mode exhausted.
    fn open(resolved: Resolved, settings: &Settings, backend: &dyn Backend) -> Self {
        debug!("Origin resolved to {:?}", resolved.kind());

        match resolved {
            Resolved::Camera(index) => {
                let mut state = CameraState { index, capture: None, reads: 0 };

                match backend.open_camera(index) {
                    Ok(mut capture) => {
                        info!("Opened camera {}", index);
                        state.reads = warm_up(
                            capture.as_mut(),
                            settings.warmup_attempts,
                            settings.warmup_stable
                        );
                        state.capture = Some(capture);
                    },
                    Err(e) => warn!("Can't open camera device {}: {}", index, e)
                }

                Mode::Camera(state)
            },
            Resolved::VideoFile(path) => {
                let mut state = VideoState {
                    path,
                    capture: None,
                    cursor: 0,
                    total: FrameCount::Unknown,
                    ended: false
                };

                match backend.open_video(&state.path) {
                    Ok(capture) => {
                        state.total = match capture.frame_count() {
                            Some(n) => FrameCount::Known(n),
                            None => FrameCount::Unknown
                        };
                        info!("Opened video {:?}, {:?} frames", state.path, state.total);
                        state.capture = Some(capture);
                    },
                    Err(e) => warn!("Can't open video file {:?}: {}", state.path, e)
                }

                Mode::VideoFile(state)
            },
            Resolved::ImageDirectory(dir) => {
                let files = match list_images(&dir, settings.extensions.as_slice()) {
                    Ok(files) => files,
                    Err(e) => {
                        warn!("{}", e);
                        Vec::new()
                    }
                };

                if files.is_empty() {
                    warn!("Can't find any images matching {:?} in {:?}", settings.extensions, dir);
                }
                else {
                    info!("Found {} images in {:?}", files.len(), dir);
                }

                Mode::ImageDirectory(DirectoryState { files, cursor: 0 })
            }
        }
    }

    /// Produce the next frame, skipping `skip` frames first. `None` ends the stream.
    fn advance(&mut self, skip: u64) -> Option<Frame> {
        match self {
            Mode::Camera(s) => s.advance(skip),
            Mode::VideoFile(s) => s.advance(skip),
            Mode::ImageDirectory(s) => s.advance(skip)
        }
    }

    /// Whether the next `advance` with the same `skip` would end the stream.
    fn is_exhausted(&self, skip: u64) -> bool {
        match self {
            Mode::Camera(s) => s.capture.is_none(),
            Mode::VideoFile(s) => {
                s.capture.is_none() || s.ended || s.total.is_reached(s.cursor + skip)
            },
            Mode::ImageDirectory(s) => s.cursor + skip >= s.files.len() as u64
        }
    }

    fn total_count(&self) -> FrameCount {
        match self {
            Mode::Camera(_) => FrameCount::Unbounded,
            Mode::VideoFile(s) => s.total,
            Mode::ImageDirectory(s) => FrameCount::Known(s.files.len() as u64)
        }
    }

    fn capture(&self) -> Option<&dyn Capture> {
        match self {
            Mode::Camera(CameraState { capture, .. }) | Mode::VideoFile(VideoState { capture, .. }) => {
                capture.as_deref()
            },
            Mode::ImageDirectory(_) => None
        }
    }

    fn release(&mut self) {
        match self {
            Mode::Camera(CameraState { capture, .. }) | Mode::VideoFile(VideoState { capture, .. }) => {
                if let Some(mut c) = capture.take() {
                    c.release();
                }
            },
            Mode::ImageDirectory(_) => ()
        }
    }
}

impl CameraState {
    fn advance(&mut self, skip: u64) -> Option<Frame> {
        let capture = self.capture.as_mut()?;

        let mut image = read_camera(capture.as_mut(), self.index);
        for _ in 0..skip {
            image = read_camera(capture.as_mut(), self.index);
        }
        self.reads += skip + 1;

        if image.is_none() {
            warn!("Camera {} returned no frame", self.index);
        }

        Some(Frame { position: self.reads - 1, image })
    }
}

impl VideoState {
    fn advance(&mut self, skip: u64) -> Option<Frame> {
        let capture = self.capture.as_mut()?;

        if skip > 0 {
            let target = self.cursor + skip;

            if self.total.is_reached(target) {
                self.cursor = target;
                return None;
            }

            if let Err(e) = capture.seek(target) {
                debug!("Seek to frame {} failed ({}), decoding through instead", target, e);
                for _ in 0..skip {
                    if let Ok(None) | Err(_) = capture.read() {
                        break;
                    }
                }
            }

            self.cursor = target;
        }

        let position = self.cursor;
        let image = match capture.read() {
            Ok(image) => image,
            Err(e) => {
                warn!("Error decoding frame {} of {:?}: {}", position, self.path, e);
                None
            }
        };
        self.cursor += 1;

        if image.is_none() {
            if self.total == FrameCount::Unknown {
                self.ended = true;
                return None;
            }

            warn!("Frame {} of {:?} could not be decoded", position, self.path);
        }

        Some(Frame { position, image })
    }
}

impl DirectoryState {
    fn advance(&mut self, skip: u64) -> Option<Frame> {
        self.cursor += skip;

        let path = self.files.get(self.cursor as usize)?;
        let position = self.cursor;
        self.cursor += 1;

        Some(Frame { position, image: load_image(path) })
    }
}

// -----------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Read one camera frame, logging errors.
fn read_camera(capture: &mut dyn Capture, index: u32) -> Option<DynamicImage> {
    match capture.read() {
        Ok(image) => image,
        Err(e) => {
            warn!("Error reading camera {}: {}", index, e);
            None
        }
    }
}

fn load_image(path: &Path) -> Option<DynamicImage> {
    match image::open(path) {
        Ok(img) => Some(img),
        Err(e) => {
            warn!("Can't load image {:?}: {}", path, e);
            None
        }
    }
}

/// Discard camera frames until `stable` consecutive non-blank frames have been read or
/// `attempts` reads have been made. Returns the number of reads made.
fn warm_up(capture: &mut dyn Capture, attempts: u32, stable: u32) -> u64 {
    if attempts == 0 {
        return 0;
    }

    let mut run = 0;
    let mut reads = 0;

    while reads < attempts as u64 {
        reads += 1;

        match capture.read() {
            Ok(Some(img)) => {
                if is_blank(&img) {
                    run = 0;
                }
                else {
                    run += 1;
                }
            },
            Ok(None) | Err(_) => continue
        }

        if run >= stable {
            debug!("Camera stable after {} warm-up reads", reads);
            return reads;
        }
    }

    warn!("Camera did not stabilise within {} warm-up reads", attempts);

    reads
}

fn is_blank(img: &DynamicImage) -> bool {
    img.as_bytes().iter().all(|&b| b == 0)
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {

    use super::*;
    use image::{Rgb, RgbImage};

    /// Camera which yields `blank` black frames then grey frames, failing every `fail_every`th
    /// read.
    struct ScriptedCamera {
        reads: u32,
        blank: u32,
        fail_every: Option<u32>
    }

    impl Capture for ScriptedCamera {
        fn read(&mut self) -> Result<Option<DynamicImage>> {
            self.reads += 1;

            if let Some(n) = self.fail_every {
                if self.reads % n == 0 {
                    return Ok(None);
                }
            }

            let value = if self.reads <= self.blank { 0 } else { 128 };
            Ok(Some(DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([value; 3])))))
        }

        fn seek(&mut self, _position: u64) -> Result<()> {
            Err(crate::error::Error::SeekUnsupported)
        }

        fn fps(&self) -> Option<f64> {
            None
        }

        fn frame_count(&self) -> Option<u64> {
            None
        }

        fn frame_size(&self) -> Option<(u32, u32)> {
            Some((4, 4))
        }

        fn release(&mut self) {}
    }

    #[test]
    fn test_warm_up_stops_when_stable() {
        let mut cam = ScriptedCamera { reads: 0, blank: 10, fail_every: None };
        assert_eq!(warm_up(&mut cam, 1000, 5), 15);
    }

    #[test]
    fn test_warm_up_ignores_failed_reads() {
        // Reads 3, 6, 9 fail, the five good frames are reads 1, 2, 4, 5 and 7
        let mut cam = ScriptedCamera { reads: 0, blank: 0, fail_every: Some(3) };
        assert_eq!(warm_up(&mut cam, 1000, 5), 7);
    }

    #[test]
    fn test_warm_up_gives_up() {
        let mut cam = ScriptedCamera { reads: 0, blank: u32::MAX, fail_every: None };
        assert_eq!(warm_up(&mut cam, 20, 5), 20);
    }

    #[test]
    fn test_warm_up_disabled() {
        let mut cam = ScriptedCamera { reads: 0, blank: 0, fail_every: None };
        assert_eq!(warm_up(&mut cam, 0, 5), 0);
        assert_eq!(cam.reads, 0);
    }

    #[test]
    fn test_frame_count_reached() {
        assert!(FrameCount::Known(3).is_reached(3));
        assert!(!FrameCount::Known(3).is_reached(2));
        assert!(!FrameCount::Unbounded.is_reached(u64::MAX));
        assert!(!FrameCount::Unknown.is_reached(u64::MAX));
        assert_eq!(FrameCount::Known(3).known(), Some(3));
        assert_eq!(FrameCount::Unknown.known(), None);
    }

    #[test]
    fn test_directory_skip() {
        let mut state = DirectoryState {
            files: (0..7).map(|i| PathBuf::from(format!("{}.jpg", i))).collect(),
            cursor: 0
        };

        let positions: Vec<u64> = std::iter::from_fn(|| state.advance(2))
            .map(|f| f.position)
            .collect();

        assert_eq!(positions, vec![2, 5]);
    }
}
