//! Command channel systems.
//!
//! - [`poll_command_channel`] waits briefly for network activity and turns
//!   inbound messages into [`PetCommand`] messages.
//! - [`update_pet_command_messages`] advances the message queue once per frame.

use bevy_ecs::prelude::*;

use crate::events::petcommand::PetCommand;
use crate::resources::commandchannel::CommandChannel;
use crate::resources::petconfig::PetConfig;

/// Accept clients and read commands, blocking at most `poll_timeout_ms`.
pub fn poll_command_channel(
    mut channel: ResMut<CommandChannel>,
    config: Res<PetConfig>,
    mut writer: MessageWriter<PetCommand>,
) {
    let commands = channel.poll(config.poll_timeout());
    writer.write_batch(commands);
}

/// Advance the ECS message queue for [`PetCommand`].
pub fn update_pet_command_messages(mut msgs: ResMut<Messages<PetCommand>>) {
    msgs.update();
}
