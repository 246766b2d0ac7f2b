use bevy_ecs::prelude::*;
use raylib::prelude::*;

use crate::resources::activeframe::ActiveFrame;
use crate::resources::petconfig::PetConfig;
use crate::resources::texturecache::TextureCache;
use crate::resources::windowsize::WindowSize;

/// Clear to the background color and draw the active frame centered.
///
/// Ending the draw handle presents the frame and waits out the target FPS.
pub fn render_system(
    mut rl: NonSendMut<RaylibHandle>,
    th: NonSend<RaylibThread>,
    mut textures: NonSendMut<TextureCache>,
    active: Res<ActiveFrame>,
    window: Res<WindowSize>,
    config: Res<PetConfig>,
) {
    textures.retain_generation(active.state_index(), window.viewport());
    let mut sprite = None;
    if let Some(frame) = active.frame() {
        let (x, y) = window.centered(frame.width(), frame.height());
        if let Some(texture) = textures.get_or_upload(&mut rl, &th, frame) {
            sprite = Some((texture, x, y));
        }
    }

    let mut d = rl.begin_drawing(&th);
    d.clear_background(config.background_color);
    if let Some((texture, x, y)) = sprite {
        d.draw_texture(texture, x, y, Color::WHITE);
    }
}
