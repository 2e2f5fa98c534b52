//! Output surfaces the visualizers draw into.
//!
//! A surface is the host-owned drawable region. The core queries its size,
//! attaches its output on construction, presents one frame per draw and
//! detaches on disposal.

use image::codecs::png::PngEncoder;
use image::ImageEncoder;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Errors reported by an output surface.
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("Output surface lost")]
    Lost,
    #[error("No frame has been presented")]
    NoFrame,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// One rendered frame of tightly packed RGBA8 pixels.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub width: u32,
    pub height: u32,
    pub pixels: &'a [u8],
}

/// Host-provided drawable region.
pub trait Surface: Send {
    /// Current size in pixels. Re-queried on every resize signal.
    fn size(&self) -> (u32, u32);

    /// Called once when a visualizer starts drawing into this surface.
    fn attach(&mut self);

    /// Called once on disposal; no frame is presented afterwards.
    fn detach(&mut self);

    /// Hand a finished frame to the host.
    fn present(&mut self, frame: &Frame<'_>) -> Result<(), SurfaceError>;
}

#[derive(Debug, Default)]
struct HeadlessState {
    width: u32,
    height: u32,
    attached: bool,
    lost: bool,
    presents: u64,
    last_frame: Option<(u32, u32, Vec<u8>)>,
}

/// In-memory surface for headless hosts and tests.
///
/// Clones share state, so a host can keep a handle to resize the surface or
/// inspect presented frames while a visualizer owns another clone.
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    state: Arc<Mutex<HeadlessState>>,
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(HeadlessState {
                width,
                height,
                ..Default::default()
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HeadlessState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Change the drawable size, as a host layout pass would.
    pub fn set_size(&self, width: u32, height: u32) {
        let mut state = self.lock();
        state.width = width;
        state.height = height;
    }

    /// Make every later present fail with [`SurfaceError::Lost`].
    pub fn lose(&self) {
        self.lock().lost = true;
    }

    pub fn is_attached(&self) -> bool {
        self.lock().attached
    }

    /// Number of frames presented so far.
    pub fn present_count(&self) -> u64 {
        self.lock().presents
    }

    /// Copy of the last presented frame as (width, height, pixels).
    pub fn last_frame(&self) -> Option<(u32, u32, Vec<u8>)> {
        self.lock().last_frame.clone()
    }

    /// Write the last presented frame to a PNG file.
    ///
    /// Failing to create or flush the file is [`SurfaceError::Io`]; failing to
    /// encode is [`SurfaceError::Image`].
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<(), SurfaceError> {
        let state = self.lock();
        let (width, height, pixels) = state.last_frame.as_ref().ok_or(SurfaceError::NoFrame)?;
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        PngEncoder::new(&mut writer).write_image(
            pixels,
            *width,
            *height,
            image::ExtendedColorType::Rgba8,
        )?;
        writer.flush()?;
        Ok(())
    }
}

impl Surface for HeadlessSurface {
    fn size(&self) -> (u32, u32) {
        let state = self.lock();
        (state.width, state.height)
    }

    fn attach(&mut self) {
        self.lock().attached = true;
    }

    fn detach(&mut self) {
        self.lock().attached = false;
    }

    fn present(&mut self, frame: &Frame<'_>) -> Result<(), SurfaceError> {
        let mut state = self.lock();
        if state.lost {
            return Err(SurfaceError::Lost);
        }
        state.presents += 1;
        match &mut state.last_frame {
            // Reuse the previous allocation when the size is unchanged
            Some((w, h, pixels)) if *w == frame.width && *h == frame.height => {
                pixels.clear();
                pixels.extend_from_slice(frame.pixels);
            }
            slot => *slot = Some((frame.width, frame.height, frame.pixels.to_vec())),
        }
        Ok(())
    }
}
