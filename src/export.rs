use crate::color::ColorScheme;
use crate::simulation::SandSimulation;
use gif::{Encoder, Frame, Repeat};
use std::borrow::Cow;
use std::fs::File;
use std::path::Path;

/// Save a PNG snapshot of the occupancy grid, `cell_size` image pixels per
/// sand cell.
pub fn save_png(
    simulation: &SandSimulation,
    scheme: ColorScheme,
    path: &Path,
    cell_size: u32,
) -> Result<(), String> {
    let cell_size = cell_size.max(1);
    let width = simulation.width() as u32 * cell_size;
    let height = simulation.height() as u32 * cell_size;
    let (r, g, b) = scheme.export_rgb();

    let mut img = image::RgbImage::new(width, height);
    for py in 0..simulation.height() {
        for px in 0..simulation.width() {
            if !simulation.occupied(px, py) {
                continue;
            }
            for dy in 0..cell_size {
                for dx in 0..cell_size {
                    img.put_pixel(
                        px as u32 * cell_size + dx,
                        py as u32 * cell_size + dy,
                        image::Rgb([r, g, b]),
                    );
                }
            }
        }
    }

    img.save(path)
        .map_err(|e| format!("Failed to write snapshot: {}", e))
}

/// Accumulates occupancy frames while recording, then writes them out as an
/// animated GIF. One GIF pixel per sand cell, two-color palette.
pub struct GifRecorder {
    width: u16,
    height: u16,
    frames: Vec<Vec<u8>>,
}

impl GifRecorder {
    pub fn new(simulation: &SandSimulation) -> Self {
        Self {
            width: simulation.width() as u16,
            height: simulation.height() as u16,
            frames: Vec::new(),
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Capture the current occupancy state as one frame. Ignored if the
    /// grid was resized since recording started.
    pub fn push_frame(&mut self, simulation: &SandSimulation) {
        if simulation.width() != self.width as usize || simulation.height() != self.height as usize
        {
            return;
        }
        let mut indices = Vec::with_capacity(self.width as usize * self.height as usize);
        for py in 0..simulation.height() {
            for px in 0..simulation.width() {
                indices.push(simulation.occupied(px, py) as u8);
            }
        }
        self.frames.push(indices);
    }

    /// Write the recorded frames to `path` and consume the recorder.
    pub fn write(self, scheme: ColorScheme, path: &Path) -> Result<usize, String> {
        if self.frames.is_empty() {
            return Err("No frames recorded".to_string());
        }

        let (r, g, b) = scheme.export_rgb();
        let palette = [0, 0, 0, r, g, b];

        let file = File::create(path).map_err(|e| format!("Failed to create GIF: {}", e))?;
        let mut encoder = Encoder::new(file, self.width, self.height, &palette)
            .map_err(|e| format!("Failed to start GIF encoder: {}", e))?;
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| format!("Failed to set GIF repeat: {}", e))?;

        let frame_count = self.frames.len();
        for indices in &self.frames {
            let mut frame = Frame::default();
            frame.width = self.width;
            frame.height = self.height;
            frame.buffer = Cow::Borrowed(indices.as_slice());
            frame.delay = 3; // ~30fps, in hundredths of a second
            encoder
                .write_frame(&frame)
                .map_err(|e| format!("Failed to write GIF frame: {}", e))?;
        }

        Ok(frame_count)
    }
}
