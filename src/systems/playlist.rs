//! Playlist systems, run once per frame in this order:
//!
//! 1. [`apply_pet_commands`] – turn client commands into jump requests
//! 2. [`update_active_state`] – step the active state's idle/change cycle
//! 3. [`advance_playlist`] – switch states at a cycle boundary
//! 4. [`resize_playlist`] – rescale every state when the window size changed
//! 5. [`advance_active_frame`] – advance playback and pick the frame to draw

use bevy_ecs::prelude::*;
use log::{debug, error, info};

use crate::events::petcommand::PetCommand;
use crate::resources::activeframe::ActiveFrame;
use crate::resources::playlist::Playlist;
use crate::resources::windowsize::WindowSize;
use crate::resources::worldtime::WorldTime;

/// Request a jump for every `SetState` command. Rejected jumps are logged.
pub fn apply_pet_commands(mut reader: MessageReader<PetCommand>, mut playlist: ResMut<Playlist>) {
    for command in reader.read() {
        match *command {
            PetCommand::SetState(index) => {
                if let Err(e) = playlist.request_jump(index) {
                    error!("{}", e);
                }
            }
        }
    }
}

pub fn update_active_state(mut playlist: ResMut<Playlist>) {
    if let Err(e) = playlist.active_mut().update() {
        // advance_playlist resets a finished state in the same frame, so
        // reaching this means the systems ran out of order.
        error!("state {}: {}", playlist.active_index(), e);
    }
}

pub fn advance_playlist(mut playlist: ResMut<Playlist>) {
    if let Some(index) = playlist.advance_if_cycle_complete() {
        info!(
            "now playing state {}/{} ({})",
            index + 1,
            playlist.state_count(),
            playlist.active().name()
        );
    }
}

pub fn resize_playlist(window: Res<WindowSize>, mut playlist: ResMut<Playlist>) {
    let (w, h) = window.viewport();
    if playlist.viewport() != (w, h) {
        debug!("window resized to {}x{}", w, h);
        playlist.resize_all(w, h);
    }
}

pub fn advance_active_frame(
    time: Res<WorldTime>,
    mut playlist: ResMut<Playlist>,
    mut active: ResMut<ActiveFrame>,
) {
    let index = playlist.active_index();
    let frame = playlist.active_mut().current_frame(time.delta).clone();
    active.set(index, frame);
}
