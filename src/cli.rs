// Command-line options.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "air-canvas", about = "Draw in the air with a colored marker and a webcam")]
pub struct Cli {
    /// Camera device index. When omitted, indices 0-3 are probed in order.
    #[arg(long)]
    pub camera: Option<u32>,

    /// Canvas and capture width in pixels.
    #[arg(long, default_value_t = 960)]
    pub width: usize,

    /// Canvas and capture height in pixels.
    #[arg(long, default_value_t = 540)]
    pub height: usize,

    /// Where the drawing is written on save (S key).
    #[arg(long, default_value = "air_canvas.png")]
    pub output: PathBuf,
}
