//! PNGPet library.
//!
//! An animated companion that cycles through a playlist of states, each a
//! looping idle animation followed by a one-shot change animation. Clients
//! can redirect the playlist over TCP. The modules are exposed for the
//! binary and the integration tests.

pub mod error;
pub mod events;
pub mod pet;
pub mod resources;
pub mod systems;
