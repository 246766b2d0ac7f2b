//! Ordered playlist of pet states.
//!
//! Exactly one state is active at a time. The playlist only ever switches at
//! a cycle boundary: when the active state reports [`PetState::ended`]. A
//! jump request does not switch immediately; it records the target and cuts
//! the active idle loop short so the boundary comes sooner.

use bevy_ecs::prelude::Resource;
use log::{debug, info};

use crate::error::{PetError, PetResult};
use crate::resources::petstate::PetState;

#[derive(Resource, Debug)]
pub struct Playlist {
    states: Vec<PetState>,
    active: usize,
    pending_jump: Option<usize>,
    viewport: (u32, u32),
}

impl Playlist {
    /// Build a playlist starting at the first state, pre-scaled to `viewport`.
    ///
    /// Fails with [`PetError::Configuration`] when `states` is empty.
    pub fn new(states: Vec<PetState>, viewport: (u32, u32)) -> PetResult<Self> {
        if states.is_empty() {
            return Err(PetError::configuration("the playlist needs at least one state"));
        }
        let mut playlist = Self {
            states,
            active: 0,
            pending_jump: None,
            viewport,
        };
        playlist.resize_all(viewport.0, viewport.1);
        Ok(playlist)
    }

    /// Number of states; never zero.
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn pending_jump(&self) -> Option<usize> {
        self.pending_jump
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn state(&self, index: usize) -> Option<&PetState> {
        self.states.get(index)
    }

    pub fn active(&self) -> &PetState {
        &self.states[self.active]
    }

    pub fn active_mut(&mut self) -> &mut PetState {
        &mut self.states[self.active]
    }

    /// Ask for `index` to become active at the next cycle boundary.
    ///
    /// Rejects indices past the end and the already-active index. A newer
    /// request replaces an older pending one.
    pub fn request_jump(&mut self, index: usize) -> PetResult<()> {
        if index >= self.states.len() || index == self.active {
            return Err(PetError::IndexOutOfRange {
                index,
                len: self.states.len(),
                active: self.active,
            });
        }
        info!(
            "jump to state {} requested while {} is active",
            index, self.active
        );
        self.pending_jump = Some(index);
        self.active_mut().end_loop_now();
        Ok(())
    }

    /// Switch states if the active one finished its cycle.
    ///
    /// Goes to the pending jump target when there is one, otherwise to the
    /// next state, wrapping around. Returns the new active index on a switch.
    pub fn advance_if_cycle_complete(&mut self) -> Option<usize> {
        if !self.active().ended() {
            return None;
        }
        let next = self
            .pending_jump
            .take()
            .unwrap_or((self.active + 1) % self.states.len());
        debug!("state {} finished, activating {}", self.active, next);
        self.active = next;

        let (w, h) = self.viewport;
        let state = self.active_mut();
        state.reset();
        state.rescale(w, h);
        Some(next)
    }

    /// Rescale every state, not only the active one.
    pub fn resize_all(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
        for state in &mut self.states {
            state.rescale(width, height);
        }
    }
}
