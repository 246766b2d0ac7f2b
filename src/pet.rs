//! Frame loop wiring.
//!
//! [`insert_pet_resources`] fills a fresh [`World`] with everything the
//! playback systems need, and [`playback_schedule`] runs them once per frame
//! in a fixed order:
//!
//! 1. advance the command message queue
//! 2. poll the command channel
//! 3. apply commands as jump requests
//! 4. step the active state
//! 5. switch states at a cycle boundary
//! 6. rescale after a window resize
//! 7. advance playback and pick the frame to draw
//!
//! The binary adds the render system after step 7. Everything here runs
//! without a window, which is how the integration tests drive it.

use bevy_ecs::prelude::*;

use crate::events::petcommand::PetCommand;
use crate::resources::activeframe::ActiveFrame;
use crate::resources::commandchannel::CommandChannel;
use crate::resources::petconfig::PetConfig;
use crate::resources::playlist::Playlist;
use crate::resources::windowsize::WindowSize;
use crate::resources::worldtime::WorldTime;
use crate::systems::commandchannel::{poll_command_channel, update_pet_command_messages};
use crate::systems::playlist::{
    advance_active_frame, advance_playlist, apply_pet_commands, resize_playlist,
    update_active_state,
};

pub fn insert_pet_resources(
    world: &mut World,
    config: PetConfig,
    playlist: Playlist,
    channel: CommandChannel,
    window: WindowSize,
) {
    world.insert_resource(config);
    world.insert_resource(playlist);
    world.insert_resource(channel);
    world.insert_resource(window);
    world.insert_resource(WorldTime::default());
    world.insert_resource(ActiveFrame::default());
    world.insert_resource(Messages::<PetCommand>::default());
}

pub fn playback_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            update_pet_command_messages,
            poll_command_channel,
            apply_pet_commands,
            update_active_state,
            advance_playlist,
            resize_playlist,
            advance_active_frame,
        )
            .chain(),
    );
    schedule
}
