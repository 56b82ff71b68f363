use crate::color::{map_from_lut, ColorLut};
use crate::settings::ColorMode;
use crate::simulation::SandSimulation;
use ratatui::style::Color;

/// Braille character rendering for high-resolution terminal graphics.
/// Each Braille character represents a 2x4 grid of dots (8 dots total).
///
/// Unicode Braille patterns: U+2800 to U+28FF (256 patterns)
const BRAILLE_BASE: u32 = 0x2800;

/// Dot position to bit mapping for Braille characters
const BRAILLE_DOTS: [[u8; 4]; 2] = [
    [0x01, 0x02, 0x04, 0x40], // Left column (x=0): rows 0,1,2,3
    [0x08, 0x10, 0x20, 0x80], // Right column (x=1): rows 0,1,2,3
];

/// A single rendered Braille cell with position and color
#[derive(Clone, Copy)]
pub struct BrailleCell {
    pub x: u16,
    pub y: u16,
    pub char: char,
    pub color: Color,
}

/// Render the occupancy grid to Braille characters.
///
/// The bitmap alone says which cells hold sand; per-grain values (speed,
/// depth) come from a value map rebuilt from the grain list each frame.
pub fn render_to_braille(
    simulation: &SandSimulation,
    canvas_width: u16,
    canvas_height: u16,
    color_lut: &ColorLut,
    color_mode: ColorMode,
) -> Vec<BrailleCell> {
    let sim_width = simulation.width();
    let sim_height = simulation.height();

    // Braille effective resolution
    let braille_width = canvas_width as usize * 2;
    let braille_height = canvas_height as usize * 4;

    let scale_x = sim_width as f32 / braille_width as f32;
    let scale_y = sim_height as f32 / braille_height as f32;

    let values = build_value_map(simulation, color_mode);

    let mut cells = Vec::with_capacity((canvas_width * canvas_height) as usize);

    for cy in 0..canvas_height {
        for cx in 0..canvas_width {
            let mut pattern: u8 = 0;
            let mut total_value: f32 = 0.0;
            let mut dot_count: usize = 0;

            // Sample the 2x4 dots for this Braille character
            let base_bx = cx as usize * 2;
            let base_by = cy as usize * 4;

            for dx in 0..2 {
                for dy in 0..4 {
                    let sim_x = ((base_bx + dx) as f32 * scale_x) as usize;
                    let sim_y = ((base_by + dy) as f32 * scale_y) as usize;
                    if sim_x >= sim_width || sim_y >= sim_height {
                        continue;
                    }

                    if simulation.occupied(sim_x, sim_y) {
                        pattern |= BRAILLE_DOTS[dx][dy];
                        dot_count += 1;
                        total_value += values[sim_y * sim_width + sim_x];
                    }
                }
            }

            // Only emit cells that have at least one dot
            if pattern != 0 {
                let braille_char = char::from_u32(BRAILLE_BASE + pattern as u32).unwrap_or(' ');
                let avg_value = total_value / dot_count as f32;
                cells.push(BrailleCell {
                    x: cx,
                    y: cy,
                    char: braille_char,
                    color: map_from_lut(color_lut, avg_value),
                });
            }
        }
    }

    cells
}

/// Per-cell color value in [0, 1], indexed like the bitmap.
fn build_value_map(simulation: &SandSimulation, color_mode: ColorMode) -> Vec<f32> {
    let mut values = vec![0.0; simulation.width() * simulation.height()];
    let height = simulation.height().max(2) as f32;
    for grain in simulation.grains() {
        let (px, py) = grain.cell();
        values[py * simulation.width() + px] = match color_mode {
            ColorMode::Solid => 0.5,
            ColorMode::Speed => grain.speed(),
            ColorMode::Depth => py as f32 / (height - 1.0),
        };
    }
    values
}

/// Calculate the simulation grid size for a given canvas size.
/// Braille gives 2x4 resolution per character; the sand grid matches it
/// dot-for-dot so every grain is exactly one dot.
pub fn calculate_simulation_size(canvas_width: u16, canvas_height: u16) -> (usize, usize) {
    let width = (canvas_width as usize * 2).max(16);
    let height = (canvas_height as usize * 4).max(16);
    (width, height)
}
