//! Pet systems.
//!
//! Submodules overview
//! - [`commandchannel`] – poll the TCP channel and queue [`PetCommand`](crate::events::petcommand::PetCommand) messages
//! - [`playlist`] – apply commands, step the active state, switch and rescale states
//! - [`render`] – draw the active frame using raylib
//! - [`time`] – update frame delta and elapsed time

pub mod commandchannel;
pub mod playlist;
pub mod render;
pub mod time;
