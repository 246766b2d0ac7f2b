//! The frame chosen for display this tick.
//!
//! Written by [`advance_active_frame`](crate::systems::playlist::advance_active_frame)
//! and read by the render system, which keeps raylib out of the playback path.

use bevy_ecs::prelude::Resource;

use crate::resources::artwork::Frame;

#[derive(Resource, Debug, Default)]
pub struct ActiveFrame {
    state_index: usize,
    frame: Option<Frame>,
}

impl ActiveFrame {
    pub fn set(&mut self, state_index: usize, frame: Frame) {
        self.state_index = state_index;
        self.frame = Some(frame);
    }

    /// Playlist index of the state the frame belongs to.
    pub fn state_index(&self) -> usize {
        self.state_index
    }

    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }
}
