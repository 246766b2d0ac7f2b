//! A single pet state: looping idle artwork followed by a one-shot change.
//!
//! One activation of a state is a *cycle*: the idle animation loops until it
//! runs out of loops (or is force-ended by a jump request), then the change
//! animation plays exactly once. When the change finishes, [`PetState::ended`]
//! turns true and the playlist moves on.

use std::path::Path;

use log::debug;

use crate::error::{PetError, PetResult};
use crate::resources::artwork::{Artwork, Frame, LoopCount, Playback};

/// Which of the two animations is currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveTrack {
    Idle,
    Change,
}

#[derive(Debug)]
struct Track {
    /// Decoded pixels at their native size. Every rescale starts from here.
    original: Artwork,
    /// Copy sized for the last applied viewport.
    scaled: Artwork,
    playback: Playback,
}

impl Track {
    fn new(original: Artwork, loops: LoopCount) -> Self {
        Self {
            scaled: original.clone(),
            original,
            playback: Playback::new(loops),
        }
    }

    fn ended(&self) -> bool {
        self.playback.ended()
    }
}

#[derive(Debug)]
pub struct PetState {
    name: String,
    idle: Track,
    change: Track,
    active: ActiveTrack,
    ended: bool,
    last_viewport: Option<(u32, u32)>,
    scale_passes: u32,
}

impl PetState {
    pub fn new(
        name: impl Into<String>,
        idle: Artwork,
        idle_loops: LoopCount,
        change: Artwork,
    ) -> Self {
        Self {
            name: name.into(),
            idle: Track::new(idle, idle_loops),
            change: Track::new(change, LoopCount::ONCE),
            active: ActiveTrack::Idle,
            ended: false,
            last_viewport: None,
            scale_passes: 0,
        }
    }

    /// Decode both animations from disk.
    ///
    /// The idle animation loops `idle_loops` times before it may end on its
    /// own; the change animation always plays once.
    pub fn load(
        name: impl Into<String>,
        idle_path: impl AsRef<Path>,
        idle_loops: LoopCount,
        change_path: impl AsRef<Path>,
    ) -> PetResult<Self> {
        let idle = Artwork::load(idle_path)?;
        let change = Artwork::load(change_path)?;
        Ok(Self::new(name, idle, idle_loops, change))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn active_track(&self) -> ActiveTrack {
        self.active
    }

    /// True right after the change animation finished, until [`PetState::reset`].
    pub fn ended(&self) -> bool {
        self.ended
    }

    /// Viewport the scaled copies were last built for.
    pub fn viewport(&self) -> Option<(u32, u32)> {
        self.last_viewport
    }

    /// How many times the scaled copies were rebuilt.
    pub fn scale_passes(&self) -> u32 {
        self.scale_passes
    }

    /// Rebuild the scaled copies to fit `width` x `height`.
    ///
    /// Scaling always starts from the original artwork. Returns `false`
    /// without doing any work when the size matches the last one applied.
    pub fn rescale(&mut self, width: u32, height: u32) -> bool {
        if self.last_viewport == Some((width, height)) {
            debug!("{}: ignoring resize, size did not change", self.name);
            return false;
        }
        self.last_viewport = Some((width, height));
        self.idle.scaled = self.idle.original.scaled(width, height);
        self.change.scaled = self.change.original.scaled(width, height);
        self.scale_passes += 1;
        true
    }

    /// Cut the idle animation short so the change plays on the next update.
    pub fn end_loop_now(&mut self) {
        self.idle.playback.force_end(&self.idle.scaled);
    }

    /// Step the idle -> change -> ended cycle.
    ///
    /// Must not be called again once [`PetState::ended`] is true until the
    /// state has been reset.
    pub fn update(&mut self) -> PetResult<()> {
        if self.ended {
            return Err(PetError::AlreadyEnded);
        }
        match self.active {
            ActiveTrack::Idle if self.idle.ended() => {
                debug!("{}: idle finished, playing change", self.name);
                self.active = ActiveTrack::Change;
            }
            ActiveTrack::Change if self.change.ended() => {
                debug!("{}: change finished, cycle complete", self.name);
                self.active = ActiveTrack::Idle;
                self.ended = true;
            }
            _ => {}
        }
        Ok(())
    }

    /// Rewind both animations and clear `ended`.
    pub fn reset(&mut self) {
        self.idle.playback.reset();
        self.change.playback.reset();
        self.active = ActiveTrack::Idle;
        self.ended = false;
    }

    /// Advance the active animation by `delta` seconds and return its frame.
    pub fn current_frame(&mut self, delta: f32) -> &Frame {
        let track = match self.active {
            ActiveTrack::Idle => &mut self.idle,
            ActiveTrack::Change => &mut self.change,
        };
        let index = track.playback.advance(&track.scaled, delta);
        track.scaled.frame(index)
    }
}
