//! GPU textures for displayed frames.
//!
//! Frames are uploaded on first use and keyed by [`FrameId`]. The cache only
//! holds textures for one (state, viewport) pair at a time and is flushed
//! when either changes, so stale scaled copies do not pile up in VRAM.
//!
//! Non-send: textures belong to the raylib thread.

use log::error;
use raylib::ffi;
use raylib::prelude::*;
use rustc_hash::FxHashMap;

use crate::resources::artwork::{Frame, FrameId};

#[derive(Default)]
pub struct TextureCache {
    textures: FxHashMap<FrameId, Texture2D>,
    generation: Option<(usize, (u32, u32))>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every texture unless the active state and viewport are unchanged.
    pub fn retain_generation(&mut self, state_index: usize, viewport: (u32, u32)) {
        let generation = Some((state_index, viewport));
        if self.generation != generation {
            self.textures.clear();
            self.generation = generation;
        }
    }

    /// Texture for `frame`, uploading it first if needed.
    pub fn get_or_upload(
        &mut self,
        rl: &mut RaylibHandle,
        thread: &RaylibThread,
        frame: &Frame,
    ) -> Option<&Texture2D> {
        if !self.textures.contains_key(&frame.id()) {
            let texture = upload(rl, thread, frame)?;
            self.textures.insert(frame.id(), texture);
        }
        self.textures.get(&frame.id())
    }
}

fn upload(rl: &mut RaylibHandle, thread: &RaylibThread, frame: &Frame) -> Option<Texture2D> {
    let pixels = frame.pixels().as_raw();
    let image = unsafe {
        // GenImageColor allocates an R8G8B8A8 buffer of exactly width*height*4 bytes.
        let raw = ffi::GenImageColor(
            frame.width() as i32,
            frame.height() as i32,
            Color::BLANK.into(),
        );
        std::ptr::copy_nonoverlapping(pixels.as_ptr(), raw.data as *mut u8, pixels.len());
        Image::from_raw(raw)
    };
    match rl.load_texture_from_image(thread, &image) {
        Ok(texture) => Some(texture),
        Err(e) => {
            error!("failed to upload frame texture: {}", e);
            None
        }
    }
}
