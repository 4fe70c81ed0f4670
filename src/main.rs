// Air Canvas: track a colored marker in the webcam feed and draw with it.
//
// Two activities: a capture thread (frame -> mask -> tip) publishing into a
// single latest-value slot, and this display loop (~60 fps) which advances
// the stroke engine once per tick, composites, and presents.
//
// Keys: 1-6 color, [ ] brush size, D draw on/off, M mask view,
//       U undo, C clear, S save, ESC quit.

mod camera;
mod cli;
mod compositor;
mod draw;
mod error;
mod palette;
mod stroke;
mod types;
mod vision;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use clap::Parser;

use camera::Shared;
use cli::Cli;
use draw::{Control, Drawer};
use error::Error;
use palette::PALETTE;
use stroke::{BRUSH_DEFAULT, BRUSH_MAX, BRUSH_MIN, StrokeEngine};
use types::Frame;

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    log::info!("air-canvas starting ({}x{})", cli.width, cli.height);

    // Camera first: no device means nothing to do.
    let shared = Arc::new(Shared::new());
    let mut capture = match camera::start(cli.camera, cli.width, cli.height, shared.clone()) {
        Ok(handle) => handle,
        Err(e) => {
            log::error!("could not open any webcam: {e}");
            return Err(e);
        }
    };

    let mut drawer = Drawer::new("Air Canvas", cli.width, cli.height)?;
    let mut screen = Frame::new(cli.width, cli.height);
    let mut engine = StrokeEngine::new(cli.width, cli.height);

    // Session controls, consumed as plain state reads each tick.
    let mut color_idx = 0usize;
    let mut brush = BRUSH_DEFAULT;
    let mut drawing = true;
    let mut show_mask = false;

    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;
    let mut hud_fps = String::from("FPS 0.0");

    while drawer.is_open() && !drawer.esc_pressed() {
        for control in drawer.controls() {
            match control {
                Control::SelectColor(i) => {
                    if i != color_idx {
                        color_idx = i;
                        shared.color_index.store(i, Ordering::Relaxed);
                        // A color switch ends any stroke in progress.
                        engine.lift_pen();
                        log::info!("color: {}", PALETTE[i].name);
                    }
                }
                Control::BrushUp => brush = (brush + 1).min(BRUSH_MAX),
                Control::BrushDown => brush = brush.saturating_sub(1).max(BRUSH_MIN),
                Control::ToggleDrawing => {
                    drawing = !drawing;
                    if !drawing {
                        engine.lift_pen();
                    }
                }
                Control::ToggleMask => show_mask = !show_mask,
                Control::Undo => engine.undo(),
                Control::Clear => engine.clear(),
                Control::Save => match engine.save(&cli.output) {
                    Ok(()) => log::info!("saved drawing to {}", cli.output.display()),
                    Err(e) => log::warn!("save failed: {e}"),
                },
            }
        }

        // Latest capture result, if the camera has produced one yet.
        if let Some(det) = shared.snapshot() {
            let profile = &PALETTE[color_idx];
            engine.tick(drawing, det.tip, profile.argb(), brush);
            compositor::compose(
                &mut screen,
                &det.frame,
                &det.mask,
                engine.canvas(),
                det.tip,
                show_mask,
                profile,
                brush,
            );
        }

        let state = if drawing { "DRAWING" } else { "PAUSED" };
        let hud = format!("{state} | {} | BRUSH {brush} | {hud_fps}", PALETTE[color_idx].name);
        draw::draw_text(&mut screen, 8, 8, &hud, 0x00FF_FFFF);

        drawer.present(&screen)?;

        frames_this_second += 1;
        let now = Instant::now();
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let secs = now.duration_since(last_fps_time).as_secs_f32();
            let fps = frames_this_second as f32 / secs;
            log::debug!("display fps: {fps:.1}");
            hud_fps = format!("FPS {fps:.1}");
            frames_this_second = 0;
            last_fps_time = now;
        }
    }

    // Stop the capture thread (and release the camera) before exit.
    capture.stop();
    Ok(())
}
