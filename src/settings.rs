use serde::{Deserialize, Serialize};

/// Motion mode - where the per-frame acceleration vector comes from
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum MotionMode {
    /// Tilt the tray by hand with the arrow keys
    #[default]
    Tilt,
    /// Constant tilt whose direction rotates steadily
    Spin,
    /// Roll oscillates about level, rocking the sand side to side
    Shake,
}

impl MotionMode {
    pub fn name(&self) -> &str {
        match self {
            MotionMode::Tilt => "Tilt",
            MotionMode::Spin => "Spin",
            MotionMode::Shake => "Shake",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            MotionMode::Tilt => MotionMode::Spin,
            MotionMode::Spin => MotionMode::Shake,
            MotionMode::Shake => MotionMode::Tilt,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            MotionMode::Tilt => MotionMode::Shake,
            MotionMode::Spin => MotionMode::Tilt,
            MotionMode::Shake => MotionMode::Spin,
        }
    }
}

/// Color mode - what property determines a grain's color
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ColorMode {
    /// Single mid-gradient color for every grain
    #[default]
    Solid,
    /// Color by velocity magnitude (fast grains glow)
    Speed,
    /// Color by vertical position in the tray
    Depth,
}

impl ColorMode {
    pub fn name(&self) -> &str {
        match self {
            ColorMode::Solid => "Solid",
            ColorMode::Speed => "Speed",
            ColorMode::Depth => "Depth",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            ColorMode::Solid => ColorMode::Speed,
            ColorMode::Speed => ColorMode::Depth,
            ColorMode::Depth => ColorMode::Solid,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            ColorMode::Solid => ColorMode::Depth,
            ColorMode::Speed => ColorMode::Solid,
            ColorMode::Depth => ColorMode::Speed,
        }
    }
}

/// All driver settings consolidated into one struct
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSettings {
    // === Simulation Parameters ===
    /// Number of sand grains (capped to grid area at runtime)
    pub num_grains: usize,
    /// Acceleration scale factor fed to the engine (1-64)
    pub accel_scale: i32,

    // === Motion Parameters ===
    /// How the acceleration vector is produced
    pub motion_mode: MotionMode,
    /// Degrees added per arrow-key press in Tilt mode (1-30)
    pub tilt_step_deg: f32,
    /// Fixed tilt magnitude in Spin mode, degrees (10-90)
    pub spin_tilt_deg: f32,
    /// Spin rate, degrees of azimuth per frame (0.5-30)
    pub spin_rate_deg: f32,
    /// Peak roll in Shake mode, degrees (5-90)
    pub shake_amplitude_deg: f32,
    /// Shake period in frames (10-600)
    pub shake_period_frames: u32,

    // === Visual Parameters ===
    /// What property determines grain color
    pub color_mode: ColorMode,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            num_grains: 600,
            accel_scale: 4,

            motion_mode: MotionMode::default(),
            tilt_step_deg: 5.0,
            spin_tilt_deg: 60.0,
            spin_rate_deg: 3.0,
            shake_amplitude_deg: 45.0,
            shake_period_frames: 120,

            color_mode: ColorMode::default(),
        }
    }
}

impl SimulationSettings {
    /// Adjust tilt step within bounds
    pub fn adjust_tilt_step(&mut self, delta: f32) {
        self.tilt_step_deg = (self.tilt_step_deg + delta).clamp(1.0, 30.0);
    }

    /// Adjust spin tilt within bounds
    pub fn adjust_spin_tilt(&mut self, delta: f32) {
        self.spin_tilt_deg = (self.spin_tilt_deg + delta).clamp(10.0, 90.0);
    }

    /// Adjust spin rate within bounds
    pub fn adjust_spin_rate(&mut self, delta: f32) {
        self.spin_rate_deg = (self.spin_rate_deg + delta).clamp(0.5, 30.0);
    }

    /// Adjust shake amplitude within bounds
    pub fn adjust_shake_amplitude(&mut self, delta: f32) {
        self.shake_amplitude_deg = (self.shake_amplitude_deg + delta).clamp(5.0, 90.0);
    }

    /// Adjust shake period within bounds
    pub fn adjust_shake_period(&mut self, delta: i32) {
        self.shake_period_frames = (self.shake_period_frames as i32 + delta).clamp(10, 600) as u32;
    }
}
