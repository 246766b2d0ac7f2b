//! Pet configuration resource.
//!
//! Settings come from an INI file. The `[app]` section is optional and every
//! key in it has a default; at least one `[stateN]` section is required.
//!
//! # Configuration File Format
//!
//! ```ini
//! [app]
//! background_color = magenta
//! caption = PNGPet
//! host = localhost
//! port = 8090
//! framerate = 60
//! poll_timeout_ms = 10
//! window_width = 800
//! window_height = 600
//!
//! [state1]
//! base_dir = assets/cat
//! idle_image = idle.gif
//! change_image = stretch.gif
//! idle_loops = 40
//!
//! [state2]
//! base_dir = assets/cat
//! idle_image = sleep.apng
//! change_image = wake.apng
//! ```
//!
//! State sections play in numeric order (`state2` before `state10`).
//! `idle_loops = 0` or `idle_loops = infinite` keeps the idle animation
//! looping until a client asks for another state.

use std::path::{Path, PathBuf};
use std::time::Duration;

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::{info, warn};
use raylib::prelude::Color;

use crate::error::{PetError, PetResult};
use crate::resources::artwork::LoopCount;

/// Default safe values for startup
const DEFAULT_BACKGROUND_COLOR: Color = Color::MAGENTA;
const DEFAULT_CAPTION: &str = "PNGPet";
const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 8090;
const DEFAULT_FRAMERATE: u32 = 60;
const DEFAULT_POLL_TIMEOUT_MS: u64 = 10;
const DEFAULT_WINDOW_WIDTH: u32 = 800;
const DEFAULT_WINDOW_HEIGHT: u32 = 600;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

const APP_SECTION: &str = "app";
const STATE_SECTION_PREFIX: &str = "state";

/// One playlist entry as described in a `[stateN]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct StateConfig {
    /// Section name, e.g. `state1`.
    pub name: String,
    pub idle_image: PathBuf,
    pub change_image: PathBuf,
    pub idle_loops: LoopCount,
}

/// Pet configuration resource.
#[derive(Resource, Debug, Clone)]
pub struct PetConfig {
    /// Fill color behind the pet.
    pub background_color: Color,
    /// Window title.
    pub caption: String,
    /// Host the command channel binds to.
    pub host: String,
    /// Port the command channel binds to.
    pub port: u16,
    /// Target frames per second.
    pub framerate: u32,
    /// Longest wait for network activity per frame, in milliseconds.
    pub poll_timeout_ms: u64,
    /// Initial window width in pixels.
    pub window_width: u32,
    /// Initial window height in pixels.
    pub window_height: u32,
    /// Playlist entries in play order.
    pub states: Vec<StateConfig>,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for PetConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PetConfig {
    /// Create a new configuration with default values and no states.
    pub fn new() -> Self {
        Self {
            background_color: DEFAULT_BACKGROUND_COLOR,
            caption: DEFAULT_CAPTION.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            framerate: DEFAULT_FRAMERATE,
            poll_timeout_ms: DEFAULT_POLL_TIMEOUT_MS,
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            states: Vec::new(),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file at `config_path`.
    ///
    /// Missing `[app]` values keep their defaults. A missing file, a bad
    /// value or a file without state sections is a configuration error.
    pub fn load_from_file(&mut self) -> PetResult<()> {
        let mut config = Ini::new();
        config.load(&self.config_path).map_err(|e| {
            PetError::configuration(format!(
                "failed to load {}: {}",
                self.config_path.display(),
                e
            ))
        })?;
        self.apply(&config)
    }

    /// Load configuration from INI text.
    pub fn load_from_str(&mut self, text: &str) -> PetResult<()> {
        let mut config = Ini::new();
        config
            .read(text.to_string())
            .map_err(|e| PetError::configuration(format!("failed to parse config: {}", e)))?;
        self.apply(&config)
    }

    fn apply(&mut self, config: &Ini) -> PetResult<()> {
        // [app] section
        if let Some(color) = config.get(APP_SECTION, "background_color") {
            self.background_color = parse_color(&color)?;
        }
        if let Some(caption) = config.get(APP_SECTION, "caption") {
            self.caption = caption;
        }
        if let Some(host) = config.get(APP_SECTION, "host") {
            self.host = host;
        }
        if let Some(port) = get_uint(config, APP_SECTION, "port")? {
            self.port = u16::try_from(port)
                .map_err(|_| PetError::configuration(format!("port {} out of range", port)))?;
        }
        if let Some(fps) = get_uint(config, APP_SECTION, "framerate")? {
            self.framerate = positive_within(fps, u32::MAX as u64, "framerate")?;
        }
        if let Some(ms) = get_uint(config, APP_SECTION, "poll_timeout_ms")? {
            self.poll_timeout_ms = ms;
        }
        // raylib takes window sizes as i32
        if let Some(width) = get_uint(config, APP_SECTION, "window_width")? {
            self.window_width = positive_within(width, i32::MAX as u64, "window_width")?;
        }
        if let Some(height) = get_uint(config, APP_SECTION, "window_height")? {
            self.window_height = positive_within(height, i32::MAX as u64, "window_height")?;
        }

        // [stateN] sections
        let mut numbered = Vec::new();
        for section in config.sections() {
            match state_number(&section) {
                Some(n) => numbered.push((n, section)),
                None if section == APP_SECTION || section == "default" => {}
                None => warn!("ignoring unknown config section [{}]", section),
            }
        }
        numbered.sort();
        self.states = numbered
            .into_iter()
            .map(|(_, section)| read_state(config, section))
            .collect::<PetResult<_>>()?;
        if self.states.is_empty() {
            return Err(PetError::configuration(
                "no [stateN] sections found, at least one state is required",
            ));
        }

        info!(
            "Loaded config: {} states, {}x{} window, fps={}, listening on {}",
            self.states.len(),
            self.window_width,
            self.window_height,
            self.framerate,
            self.bind_addr()
        );

        Ok(())
    }

    /// `host:port` the command channel listens on.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    /// Get the window size.
    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }
}

fn get_uint(config: &Ini, section: &str, key: &str) -> PetResult<Option<u64>> {
    config
        .getuint(section, key)
        .map_err(|e| PetError::configuration(format!("[{}] {}: {}", section, key, e)))
}

/// Accept `1..=max`, anything else is a configuration error.
fn positive_within(value: u64, max: u64, key: &str) -> PetResult<u32> {
    if value == 0 || value > max {
        return Err(PetError::configuration(format!(
            "[{}] {}: {} is out of range (1..={})",
            APP_SECTION, key, value, max
        )));
    }
    u32::try_from(value).map_err(|_| {
        PetError::configuration(format!("[{}] {}: {} is too large", APP_SECTION, key, value))
    })
}

/// `state7` -> `Some(7)`.
fn state_number(section: &str) -> Option<u32> {
    section
        .strip_prefix(STATE_SECTION_PREFIX)
        .and_then(|n| n.parse().ok())
}

fn read_state(config: &Ini, section: String) -> PetResult<StateConfig> {
    let base_dir = config.get(&section, "base_dir").unwrap_or_default();
    let image = |key: &str| {
        config
            .get(&section, key)
            .map(|name| Path::new(&base_dir).join(name))
            .ok_or_else(|| PetError::configuration(format!("[{}] is missing {}", section, key)))
    };
    let idle_image = image("idle_image")?;
    let change_image = image("change_image")?;
    let idle_loops = match config.get(&section, "idle_loops") {
        None => LoopCount::IDLE_DEFAULT,
        Some(value) => parse_loops(&value).ok_or_else(|| {
            PetError::configuration(format!("[{}] idle_loops: invalid value {:?}", section, value))
        })?,
    };
    Ok(StateConfig {
        name: section,
        idle_image,
        change_image,
        idle_loops,
    })
}

fn parse_loops(value: &str) -> Option<LoopCount> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("infinite") {
        return Some(LoopCount::Infinite);
    }
    match value.parse::<u32>().ok()? {
        0 => Some(LoopCount::Infinite),
        n => Some(LoopCount::Finite(n)),
    }
}

/// Parse a raylib color name (`magenta`, `raywhite`) or `#rrggbb[aa]`.
pub fn parse_color(value: &str) -> PetResult<Color> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex_color(hex)
            .ok_or_else(|| PetError::configuration(format!("invalid color {:?}", value)));
    }
    let color = match value.to_ascii_lowercase().as_str() {
        "lightgray" => Color::LIGHTGRAY,
        "gray" => Color::GRAY,
        "darkgray" => Color::DARKGRAY,
        "yellow" => Color::YELLOW,
        "gold" => Color::GOLD,
        "orange" => Color::ORANGE,
        "pink" => Color::PINK,
        "red" => Color::RED,
        "maroon" => Color::MAROON,
        "green" => Color::GREEN,
        "lime" => Color::LIME,
        "darkgreen" => Color::DARKGREEN,
        "skyblue" => Color::SKYBLUE,
        "blue" => Color::BLUE,
        "darkblue" => Color::DARKBLUE,
        "purple" => Color::PURPLE,
        "violet" => Color::VIOLET,
        "darkpurple" => Color::DARKPURPLE,
        "beige" => Color::BEIGE,
        "brown" => Color::BROWN,
        "darkbrown" => Color::DARKBROWN,
        "white" => Color::WHITE,
        "black" => Color::BLACK,
        "blank" => Color::BLANK,
        "magenta" => Color::MAGENTA,
        "raywhite" => Color::RAYWHITE,
        _ => {
            return Err(PetError::configuration(format!(
                "unknown color name {:?}",
                value
            )));
        }
    };
    Ok(color)
}

fn parse_hex_color(hex: &str) -> Option<Color> {
    if !matches!(hex.len(), 6 | 8) || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let a = if hex.len() == 8 { channel(6)? } else { 255 };
    Some(Color::new(channel(0)?, channel(2)?, channel(4)?, a))
}
