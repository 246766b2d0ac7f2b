//! ECS resources made available to systems.
//!
//! This module groups the long-lived data injected into the ECS world and
//! accessed by systems during execution.
//!
//! Overview
//! - `activeframe` – frame picked for display this tick
//! - `artwork` – decoded still/animated images and their playback cursor
//! - `commandchannel` – non-blocking TCP listener and client connections
//! - `petconfig` – settings loaded from `config.ini`
//! - `petstate` – one idle/change pair and its cycle state
//! - `playlist` – ordered pet states, active index and pending jump
//! - `texturecache` – GPU textures for displayed frames (non-send)
//! - `windowsize` – current window dimensions in pixels
//! - `worldtime` – frame delta and elapsed time
pub mod activeframe;
pub mod artwork;
pub mod commandchannel;
pub mod petconfig;
pub mod petstate;
pub mod playlist;
pub mod texturecache;
pub mod windowsize;
pub mod worldtime;
