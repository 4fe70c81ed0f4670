// Camera capture: device probing, the capture thread, and the shared
// latest-detection slot it hands results through.
//
// The camera lives entirely on the capture thread; the display loop only
// ever sees finished (frame, mask, tip) triples behind the slot mutex.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{
        CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
    },
};
use parking_lot::Mutex;

use crate::error::Error;
use crate::palette::PALETTE;
use crate::types::{Frame, Mask, Point};
use crate::vision;

/// How many device indices to probe when none is given.
const PROBE_INDICES: u32 = 4;

/// Backoff after a transient frame-read failure.
const READ_RETRY: Duration = Duration::from_millis(50);

/// Everything the capture thread produced for one frame.
pub struct Detection {
    pub frame: Frame,
    pub mask: Mask,
    pub tip: Option<Point>,
}

/// State shared between the capture thread and the display loop.
/// The slot is last-write-wins; the lock is held only for the swap.
pub struct Shared {
    pub latest: Mutex<Option<Arc<Detection>>>,
    pub running: AtomicBool,
    /// Palette index the capture thread thresholds against.
    pub color_index: AtomicUsize,
}

impl Shared {
    pub fn new() -> Self {
        Self {
            latest: Mutex::new(None),
            running: AtomicBool::new(true),
            color_index: AtomicUsize::new(0),
        }
    }

    /// Take a consistent snapshot of the latest detection, if any.
    pub fn snapshot(&self) -> Option<Arc<Detection>> {
        self.latest.lock().clone()
    }
}

/// A small wrapper around nokhwa::Camera so the capture loop stays clean.
struct CameraCapture {
    cam: Camera,
}

impl CameraCapture {
    /// Open a specific device index at a target resolution.
    fn open_index(index: u32, width: u32, height: u32) -> Result<Self, Error> {
        let idx = CameraIndex::Index(index);
        let fmt = CameraFormat::new(
            Resolution::new(width, height),
            FrameFormat::YUYV, // uncompressed; cheap to convert to RGB
            30,
        );
        let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(fmt));

        let mut cam = Camera::new(idx, req)
            .map_err(|e| Error::CameraInit(format!("create camera {index}: {e}")))?;
        cam.open_stream()
            .map_err(|e| Error::CameraInit(format!("open stream {index}: {e}")))?;
        Ok(Self { cam })
    }

    /// Open the given index, or probe indices in order until one succeeds.
    fn open(index: Option<u32>, width: u32, height: u32) -> Result<Self, Error> {
        if let Some(idx) = index {
            return Self::open_index(idx, width, height);
        }
        let mut last = None;
        for idx in 0..PROBE_INDICES {
            match Self::open_index(idx, width, height) {
                Ok(cam) => {
                    log::info!(
                        "camera {idx} opened at {}x{}",
                        cam.cam.resolution().width(),
                        cam.cam.resolution().height()
                    );
                    return Ok(cam);
                }
                Err(e) => {
                    log::debug!("camera {idx} unavailable: {e}");
                    last = Some(e);
                }
            }
        }
        Err(last.unwrap_or_else(|| Error::CameraInit("no camera device found".into())))
    }

    /// Grab one frame and convert it to 0x00RRGGBB pixels.
    fn next_frame(&mut self) -> Result<Frame, Error> {
        let frame = self
            .cam
            .frame()
            .map_err(|e| Error::CameraFrame(format!("fetch frame: {e}")))?;
        let rgb = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::CameraFrame(format!("decode RGB: {e}")))?;

        let (w, h) = rgb.dimensions();
        let mut pixels = Vec::with_capacity((w as usize) * (h as usize));
        for px in rgb.pixels() {
            let r = px[0] as u32;
            let g = px[1] as u32;
            let b = px[2] as u32;
            pixels.push((r << 16) | (g << 8) | b);
        }
        Ok(Frame { width: w as usize, height: h as usize, pixels })
    }
}

/// Running capture thread. Stops and joins on drop.
pub struct CaptureHandle {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl CaptureHandle {
    pub fn stop(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Spawn the capture thread. The camera is opened on the thread itself;
/// startup failure (no device) is reported back synchronously and is fatal.
pub fn start(
    index: Option<u32>,
    width: usize,
    height: usize,
    shared: Arc<Shared>,
) -> Result<CaptureHandle, Error> {
    let (tx, rx) = mpsc::channel();
    let shared_thread = shared.clone();

    let thread = std::thread::Builder::new()
        .name("camera-capture".to_string())
        .spawn(move || {
            let cam = match CameraCapture::open(index, width as u32, height as u32) {
                Ok(cam) => {
                    let _ = tx.send(Ok(()));
                    cam
                }
                Err(e) => {
                    let _ = tx.send(Err(e));
                    return;
                }
            };
            capture_loop(cam, shared_thread, width, height);
        })
        .map_err(|e| Error::CameraInit(format!("spawn capture thread: {e}")))?;

    rx.recv()
        .map_err(|_| Error::CameraInit("capture thread exited before opening".into()))??;
    Ok(CaptureHandle { shared, thread: Some(thread) })
}

/// Capture loop body: read, fit, segment, detect, publish. Frame-read
/// failures are transient and retried after a short backoff.
fn capture_loop(mut cam: CameraCapture, shared: Arc<Shared>, width: usize, height: usize) {
    let mut scratch = Mask::new(width, height);

    while shared.running.load(Ordering::Acquire) {
        let raw = match cam.next_frame() {
            Ok(f) => f,
            Err(e) => {
                log::warn!("frame read failed, retrying: {e}");
                std::thread::sleep(READ_RETRY);
                continue;
            }
        };

        let frame = fit(raw, width, height);

        let idx = shared.color_index.load(Ordering::Relaxed).min(PALETTE.len() - 1);
        let profile = &PALETTE[idx];

        let mut mask = Mask::new(width, height);
        vision::threshold(&frame, profile, &mut mask);
        vision::smooth(&mut mask, &mut scratch);
        let tip = vision::detect_tip(&mask);

        *shared.latest.lock() = Some(Arc::new(Detection { frame, mask, tip }));
    }

    log::info!("capture thread stopped");
}

/// Mirror the frame horizontally (so motion reads like a mirror) and
/// nearest-neighbor resize it to the canvas resolution when needed.
pub fn fit(mut frame: Frame, width: usize, height: usize) -> Frame {
    for row in frame.pixels.chunks_exact_mut(frame.width) {
        row.reverse();
    }
    if frame.width == width && frame.height == height {
        return frame;
    }

    let mut out = Frame::new(width, height);
    let x_ratio = frame.width as f32 / width as f32;
    let y_ratio = frame.height as f32 / height as f32;
    for y in 0..height {
        let src_y = ((y as f32 * y_ratio) as usize).min(frame.height - 1);
        let src_row = src_y * frame.width;
        for x in 0..width {
            let src_x = ((x as f32 * x_ratio) as usize).min(frame.width - 1);
            out.pixels[y * width + x] = frame.pixels[src_row + src_x];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_mirrors_rows() {
        let frame = Frame { width: 3, height: 1, pixels: vec![1, 2, 3] };
        let out = fit(frame, 3, 1);
        assert_eq!(out.pixels, vec![3, 2, 1]);
    }

    #[test]
    fn fit_resizes_to_target() {
        let mut frame = Frame::new(4, 4);
        frame.pixels.fill(0x00AABBCC);
        let out = fit(frame, 2, 2);
        assert_eq!(out.width, 2);
        assert_eq!(out.height, 2);
        assert!(out.pixels.iter().all(|&p| p == 0x00AABBCC));
    }

    #[test]
    fn shared_slot_is_last_write_wins() {
        let shared = Shared::new();
        assert!(shared.snapshot().is_none());
        for tip_x in [1, 2, 3] {
            *shared.latest.lock() = Some(Arc::new(Detection {
                frame: Frame::new(2, 2),
                mask: Mask::new(2, 2),
                tip: Some((tip_x, 0)),
            }));
        }
        assert_eq!(shared.snapshot().unwrap().tip, Some((3, 0)));
    }
}
