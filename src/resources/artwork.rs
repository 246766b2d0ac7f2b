//! Decoded artwork and its playback state.
//!
//! [`Artwork`] is the immutable pixel data of a still image or an animation,
//! shared cheaply between the original and its scaled copies. [`Playback`]
//! is the mutable cursor over an artwork (frame index, elapsed time, loops
//! played) and is kept apart from the pixels so that rescaling swaps the
//! pixels without restarting the animation.
//!
//! # Supported files
//!
//! - `.gif` – animated, decoded frame by frame with per-frame delays
//! - `.apng`, `.png` – animated when the PNG carries an animation control chunk
//! - anything else `image` understands – still

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use image::codecs::gif::GifDecoder;
use image::codecs::png::PngDecoder;
use image::error::{ImageError, ImageResult, ParameterError, ParameterErrorKind};
use image::imageops::{self, FilterType};
use image::{AnimationDecoder, DynamicImage, RgbaImage};

use crate::error::{PetError, PetResult};

/// Frames shorter than this are treated as "no delay given".
const MIN_FRAME_DELAY: f32 = 0.02;
/// Delay used in place of a missing or too-short frame delay.
const DEFAULT_FRAME_DELAY: f32 = 0.1;

static NEXT_FRAME_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a frame's pixels. Used to cache GPU textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(u64);

/// One displayable picture plus how long it stays on screen.
#[derive(Debug, Clone)]
pub struct Frame {
    id: FrameId,
    pixels: Arc<RgbaImage>,
    /// Seconds this frame is shown. A still image holds for one default
    /// delay per loop.
    delay: f32,
}

impl Frame {
    fn new(pixels: RgbaImage, delay: f32) -> Self {
        Self {
            id: FrameId(NEXT_FRAME_ID.fetch_add(1, Ordering::Relaxed)),
            pixels: Arc::new(pixels),
            delay,
        }
    }

    pub fn id(&self) -> FrameId {
        self.id
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn delay(&self) -> f32 {
        self.delay
    }
}

/// Pixel data of a still image or an animation.
#[derive(Debug, Clone)]
pub enum Artwork {
    Still(Frame),
    Animated(Arc<[Frame]>),
}

impl Artwork {
    pub fn still(pixels: RgbaImage) -> Self {
        Artwork::Still(Frame::new(pixels, DEFAULT_FRAME_DELAY))
    }

    /// Build an animation from frames and their delays.
    ///
    /// Delays under 20 ms become 100 ms. Fails when `frames` is empty.
    pub fn animated(
        frames: impl IntoIterator<Item = (RgbaImage, Duration)>,
    ) -> ImageResult<Self> {
        let frames: Vec<Frame> = frames
            .into_iter()
            .map(|(pixels, delay)| Frame::new(pixels, normalize_delay(delay)))
            .collect();
        if frames.is_empty() {
            return Err(ImageError::Parameter(ParameterError::from_kind(
                ParameterErrorKind::NoMoreData,
            )));
        }
        Ok(Artwork::Animated(frames.into()))
    }

    /// Decode `path` into artwork. Fails with [`PetError::ResourceLoad`].
    pub fn load(path: impl AsRef<Path>) -> PetResult<Self> {
        let path = path.as_ref();
        decode(path).map_err(|source| PetError::ResourceLoad {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn is_animated(&self) -> bool {
        matches!(self, Artwork::Animated(_))
    }

    pub fn frame_count(&self) -> usize {
        match self {
            Artwork::Still(_) => 1,
            Artwork::Animated(frames) => frames.len(),
        }
    }

    /// Frame at `index`, clamped to the last frame.
    pub fn frame(&self, index: usize) -> &Frame {
        match self {
            Artwork::Still(frame) => frame,
            Artwork::Animated(frames) => &frames[index.min(frames.len() - 1)],
        }
    }

    /// Pixel size of the first frame.
    pub fn size(&self) -> (u32, u32) {
        let frame = self.frame(0);
        (frame.width(), frame.height())
    }

    /// Copy of this artwork uniformly scaled to fit inside `width` x `height`.
    pub fn scaled(&self, width: u32, height: u32) -> Artwork {
        let (w, h) = fit_size(self.size(), (width, height));
        let resize = |frame: &Frame| {
            Frame::new(
                imageops::resize(frame.pixels(), w, h, FilterType::Triangle),
                frame.delay,
            )
        };
        match self {
            Artwork::Still(frame) => Artwork::Still(resize(frame)),
            Artwork::Animated(frames) => Artwork::Animated(frames.iter().map(resize).collect()),
        }
    }
}

/// Largest size with the aspect ratio of `original` that fits in `viewport`.
///
/// Never returns a zero dimension.
pub fn fit_size(original: (u32, u32), viewport: (u32, u32)) -> (u32, u32) {
    let (ow, oh) = (original.0.max(1) as f32, original.1.max(1) as f32);
    let ratio = (viewport.0 as f32 / ow).min(viewport.1 as f32 / oh);
    let w = (ow * ratio) as u32;
    let h = (oh * ratio) as u32;
    (w.max(1), h.max(1))
}

fn normalize_delay(delay: Duration) -> f32 {
    let secs = delay.as_secs_f32();
    if secs < MIN_FRAME_DELAY {
        DEFAULT_FRAME_DELAY
    } else {
        secs
    }
}

fn decode(path: &Path) -> ImageResult<Artwork> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("gif") => {
            let decoder = GifDecoder::new(BufReader::new(File::open(path)?))?;
            from_frames(decoder.into_frames().collect_frames()?)
        }
        Some("png") | Some("apng") => {
            let decoder = PngDecoder::new(BufReader::new(File::open(path)?))?;
            if decoder.is_apng()? {
                from_frames(decoder.apng()?.into_frames().collect_frames()?)
            } else {
                Ok(Artwork::still(
                    DynamicImage::from_decoder(decoder)?.into_rgba8(),
                ))
            }
        }
        _ => Ok(Artwork::still(image::open(path)?.into_rgba8())),
    }
}

fn from_frames(frames: Vec<image::Frame>) -> ImageResult<Artwork> {
    Artwork::animated(frames.into_iter().map(|frame| {
        let delay = Duration::from(frame.delay());
        (frame.into_buffer(), delay)
    }))
}

/// How many times an animation plays before it ends by itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopCount {
    Finite(u32),
    Infinite,
}

impl LoopCount {
    /// Loop count used for idle animations when the config does not say.
    pub const IDLE_DEFAULT: LoopCount = LoopCount::Finite(40);
    pub const ONCE: LoopCount = LoopCount::Finite(1);
}

/// Playback cursor over an [`Artwork`].
#[derive(Debug, Clone)]
pub struct Playback {
    loops: LoopCount,
    index: usize,
    elapsed: f32,
    loops_done: u32,
    ended: bool,
}

impl Playback {
    pub fn new(loops: LoopCount) -> Self {
        Self {
            loops,
            index: 0,
            elapsed: 0.0,
            loops_done: 0,
            ended: false,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// True once the last loop played out, or after [`Playback::force_end`].
    pub fn ended(&self) -> bool {
        self.ended
    }

    /// Back to the first frame; clears `ended`.
    pub fn reset(&mut self) {
        self.index = 0;
        self.elapsed = 0.0;
        self.loops_done = 0;
        self.ended = false;
    }

    /// Jump to the final frame and report ended right away.
    pub fn force_end(&mut self, artwork: &Artwork) {
        self.index = artwork.frame_count() - 1;
        self.elapsed = 0.0;
        self.ended = true;
    }

    /// Advance by `delta` seconds and return the index of the frame to show.
    ///
    /// A still image plays as a single frame, so its loop count still
    /// decides how long it stays up.
    pub fn advance(&mut self, artwork: &Artwork, delta: f32) -> usize {
        let frames = match artwork {
            Artwork::Still(frame) => std::slice::from_ref(frame),
            Artwork::Animated(frames) => &frames[..],
        };
        if self.ended {
            return self.index;
        }

        self.elapsed += delta.max(0.0);
        loop {
            let delay = frames[self.index].delay;
            if self.elapsed < delay {
                break;
            }
            if self.index + 1 < frames.len() {
                self.elapsed -= delay;
                self.index += 1;
                continue;
            }
            // Last frame finished displaying: one loop done.
            self.loops_done += 1;
            if let LoopCount::Finite(n) = self.loops
                && self.loops_done >= n.max(1)
            {
                self.elapsed = 0.0;
                self.ended = true;
                break;
            }
            self.elapsed -= delay;
            self.index = 0;
        }
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(w: u32, h: u32, shade: u8) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([shade, shade, shade, 255]))
    }

    fn three_frames() -> Artwork {
        Artwork::animated((0..3).map(|i| (solid(4, 2, i * 10), Duration::from_millis(100))))
            .unwrap()
    }

    #[test]
    fn fit_size_keeps_aspect_ratio() {
        assert_eq!(fit_size((400, 300), (800, 600)), (800, 600));
        assert_eq!(fit_size((100, 200), (800, 600)), (300, 600));
        assert_eq!(fit_size((200, 100), (800, 600)), (800, 400));
    }

    #[test]
    fn fit_size_never_returns_zero() {
        assert_eq!(fit_size((100, 100), (0, 0)), (1, 1));
    }

    #[test]
    fn short_delays_are_normalized() {
        let art = Artwork::animated([(solid(1, 1, 0), Duration::ZERO)]).unwrap();
        assert!((art.frame(0).delay() - DEFAULT_FRAME_DELAY).abs() < f32::EPSILON);
    }

    #[test]
    fn scaled_copy_has_new_pixels_and_same_timing() {
        let art = three_frames();
        let scaled = art.scaled(80, 80);
        assert_eq!(scaled.size(), (80, 40));
        assert_eq!(scaled.frame_count(), 3);
        assert_ne!(scaled.frame(1).id(), art.frame(1).id());
        assert!((scaled.frame(2).delay() - 0.1).abs() < 1e-6);
        // original untouched
        assert_eq!(art.size(), (4, 2));
    }

    #[test]
    fn animation_plays_requested_loops_then_ends() {
        let art = three_frames();
        let mut playback = Playback::new(LoopCount::Finite(2));
        assert_eq!(playback.advance(&art, 0.05), 0);
        assert_eq!(playback.advance(&art, 0.06), 1);
        assert_eq!(playback.advance(&art, 0.1), 2);
        assert!(!playback.ended());
        // wraps into the second loop
        assert_eq!(playback.advance(&art, 0.1), 0);
        playback.advance(&art, 0.25);
        assert!(!playback.ended());
        assert_eq!(playback.advance(&art, 0.1), 2);
        assert!(playback.ended());
        // stays on the final frame
        assert_eq!(playback.advance(&art, 1.0), 2);
    }

    #[test]
    fn infinite_loop_never_ends_naturally() {
        let art = three_frames();
        let mut playback = Playback::new(LoopCount::Infinite);
        for _ in 0..1000 {
            playback.advance(&art, 0.1);
        }
        assert!(!playback.ended());
    }

    #[test]
    fn force_end_jumps_to_final_frame() {
        let art = three_frames();
        let mut playback = Playback::new(LoopCount::Infinite);
        playback.advance(&art, 0.1);
        playback.force_end(&art);
        assert!(playback.ended());
        assert_eq!(playback.index(), 2);

        playback.reset();
        assert!(!playback.ended());
        assert_eq!(playback.index(), 0);
    }

    #[test]
    fn empty_animation_is_rejected() {
        let err = Artwork::animated(std::iter::empty()).unwrap_err();
        assert!(matches!(err, ImageError::Parameter(_)));
    }

    #[test]
    fn still_image_holds_for_its_loop_count() {
        let art = Artwork::still(solid(2, 2, 0));
        let mut once = Playback::new(LoopCount::ONCE);
        assert_eq!(once.advance(&art, 0.0), 0);
        assert!(!once.ended());
        once.advance(&art, 0.1);
        assert!(once.ended());

        let mut thrice = Playback::new(LoopCount::Finite(3));
        for _ in 0..2 {
            thrice.advance(&art, 0.1);
            assert!(!thrice.ended());
        }
        assert_eq!(thrice.advance(&art, 0.1), 0);
        assert!(thrice.ended());
    }

    #[test]
    fn still_image_with_infinite_loops_never_ends() {
        let art = Artwork::still(solid(2, 2, 0));
        let mut playback = Playback::new(LoopCount::Infinite);
        for _ in 0..100 {
            playback.advance(&art, 0.1);
        }
        assert!(!playback.ended());
    }

    #[test]
    fn loading_a_missing_file_is_a_resource_error() {
        let err = Artwork::load("does/not/exist.gif").unwrap_err();
        assert!(matches!(err, PetError::ResourceLoad { .. }));
    }

    #[test]
    fn loads_png_from_disk() {
        let dir = std::env::temp_dir().join(format!("pngpet-artwork-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("still.png");
        solid(6, 3, 128).save(&path).unwrap();

        let art = Artwork::load(&path).unwrap();
        assert!(!art.is_animated());
        assert_eq!(art.size(), (6, 3));
        std::fs::remove_dir_all(&dir).ok();
    }
}
