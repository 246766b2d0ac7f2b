//! PNGPet main entry point.
//!
//! An on-screen pet written in Rust using:
//! - **raylib** for windowing and drawing
//! - **bevy_ecs** for resources and the per-frame system schedule
//! - **image** for decoding GIF, APNG and still images
//!
//! # Main Loop
//!
//! 1. Load `config.ini`, bind the command channel, decode every state
//! 2. Open the raylib window and build the ECS world
//! 3. Each frame: update time and window size, then run the schedule
//!    (poll commands, step the playlist, render)
//! 4. On window close, drop client connections and the listener
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --config config.ini
//! printf 'state:1\n' | nc localhost 8090
//! ```

// Do not create console on Windows
#![cfg_attr(target_os = "windows", windows_subsystem = "windows")]

use std::path::PathBuf;

use bevy_ecs::prelude::*;
use clap::Parser;
use pngpet::error::PetResult;
use pngpet::pet::{insert_pet_resources, playback_schedule};
use pngpet::resources::commandchannel::CommandChannel;
use pngpet::resources::petconfig::PetConfig;
use pngpet::resources::petstate::PetState;
use pngpet::resources::playlist::Playlist;
use pngpet::resources::texturecache::TextureCache;
use pngpet::resources::windowsize::WindowSize;
use pngpet::systems::playlist::advance_active_frame;
use pngpet::systems::render::render_system;
use pngpet::systems::time::update_world_time;

/// PNGPet, an animated desktop companion
#[derive(Parser)]
#[command(version, about = "An animated pet whose state can be switched over TCP.")]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> PetResult<()> {
    let mut config = PetConfig::with_path(cli.config);
    config.load_from_file()?;

    let channel = CommandChannel::bind(&config.host, config.port)?;

    let states = config
        .states
        .iter()
        .map(|state| {
            PetState::load(
                state.name.as_str(),
                &state.idle_image,
                state.idle_loops,
                &state.change_image,
            )
        })
        .collect::<PetResult<Vec<_>>>()?;
    log::info!("loaded {} states", states.len());

    // --------------- Raylib window ---------------
    let (window_width, window_height) = config.window_size();
    let (mut rl, thread) = raylib::init()
        .size(window_width as i32, window_height as i32)
        .resizable()
        .title(&config.caption)
        .build();
    rl.set_target_fps(config.framerate);
    // Only closing the window quits
    rl.set_exit_key(None);

    let window = WindowSize {
        w: rl.get_screen_width(),
        h: rl.get_screen_height(),
    };
    let playlist = Playlist::new(states, window.viewport())?;

    // --------------- ECS world + resources ---------------
    let mut world = World::new();
    insert_pet_resources(&mut world, config, playlist, channel, window);
    world.insert_non_send_resource(TextureCache::new());
    world.insert_non_send_resource(rl);
    world.insert_non_send_resource(thread);

    let mut update = playback_schedule();
    update.add_systems(render_system.after(advance_active_frame));

    // --------------- Main loop ---------------
    while !world
        .non_send_resource::<raylib::RaylibHandle>()
        .window_should_close()
    {
        let (dt, new_w, new_h) = {
            let rl = world.non_send_resource::<raylib::RaylibHandle>();
            (rl.get_frame_time(), rl.get_screen_width(), rl.get_screen_height())
        };
        update_world_time(&mut world, dt);
        {
            let mut window_size = world.resource_mut::<WindowSize>();
            if window_size.w != new_w || window_size.h != new_h {
                window_size.w = new_w;
                window_size.h = new_h;
            }
        }

        update.run(&mut world);
    }

    if let Some(mut channel) = world.remove_resource::<CommandChannel>() {
        channel.shutdown();
    }
    log::info!("bye");
    Ok(())
}
