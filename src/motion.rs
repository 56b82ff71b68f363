use crate::settings::{MotionMode, SimulationSettings};

/// Full-scale accelerometer reading, in raw counts (1 g).
pub const FULL_SCALE: i32 = 4096;

const MAX_TILT_DEG: f32 = 90.0;

/// Synthetic accelerometer: turns the selected motion mode plus the manual
/// tilt angles into the raw (ax, ay, az) counts the engine expects.
///
/// Convention matches a tray lying face-up: roll tips the tray about the
/// screen's vertical axis (positive = sand slides right), pitch about the
/// horizontal axis (positive = sand slides down). Z is the out-of-plane
/// component, full scale when level.
pub struct MotionSource {
    /// Frame counter driving the Spin and Shake programs
    frame: u64,
    /// Manual roll angle, degrees (Tilt mode)
    roll_deg: f32,
    /// Manual pitch angle, degrees (Tilt mode)
    pitch_deg: f32,
}

impl MotionSource {
    pub fn new() -> Self {
        Self {
            frame: 0,
            roll_deg: 0.0,
            pitch_deg: 15.0,
        }
    }

    pub fn roll_deg(&self) -> f32 {
        self.roll_deg
    }

    pub fn pitch_deg(&self) -> f32 {
        self.pitch_deg
    }

    /// Nudge the manual roll angle (arrow keys, Tilt mode).
    pub fn tilt_roll(&mut self, delta_deg: f32) {
        self.roll_deg = (self.roll_deg + delta_deg).clamp(-MAX_TILT_DEG, MAX_TILT_DEG);
    }

    /// Nudge the manual pitch angle.
    pub fn tilt_pitch(&mut self, delta_deg: f32) {
        self.pitch_deg = (self.pitch_deg + delta_deg).clamp(-MAX_TILT_DEG, MAX_TILT_DEG);
    }

    /// Return the tray to level.
    pub fn level(&mut self) {
        self.roll_deg = 0.0;
        self.pitch_deg = 0.0;
    }

    /// Produce this frame's raw acceleration triple and advance the
    /// internal clock.
    pub fn sample(&mut self, settings: &SimulationSettings) -> (i32, i32, i32) {
        let accel = match settings.motion_mode {
            MotionMode::Tilt => from_angles(self.roll_deg, self.pitch_deg),
            MotionMode::Spin => {
                let azimuth = (self.frame as f32 * settings.spin_rate_deg).to_radians();
                let tilt = settings.spin_tilt_deg.to_radians();
                let g = FULL_SCALE as f32;
                (
                    (g * tilt.sin() * azimuth.cos()) as i32,
                    (g * tilt.sin() * azimuth.sin()) as i32,
                    (g * tilt.cos()) as i32,
                )
            }
            MotionMode::Shake => {
                let phase = self.frame as f32 / settings.shake_period_frames as f32;
                let roll = settings.shake_amplitude_deg * (phase * std::f32::consts::TAU).sin();
                from_angles(roll, 0.0)
            }
        };
        self.frame += 1;
        accel
    }
}

impl Default for MotionSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Gravity components for a tray tipped by (roll, pitch) degrees.
fn from_angles(roll_deg: f32, pitch_deg: f32) -> (i32, i32, i32) {
    let roll = roll_deg.to_radians();
    let pitch = pitch_deg.to_radians();
    let g = FULL_SCALE as f32;
    (
        (g * roll.sin()) as i32,
        (g * pitch.sin()) as i32,
        (g * roll.cos() * pitch.cos()) as i32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MotionMode;

    #[test]
    fn test_level_tray_reads_full_scale_z() {
        let mut source = MotionSource::new();
        source.level();
        let settings = SimulationSettings::default();
        let (ax, ay, az) = source.sample(&settings);
        assert_eq!((ax, ay), (0, 0));
        assert_eq!(az, FULL_SCALE);
    }

    #[test]
    fn test_tilt_clamps_at_vertical() {
        let mut source = MotionSource::new();
        source.level();
        for _ in 0..50 {
            source.tilt_roll(10.0);
        }
        assert_eq!(source.roll_deg(), 90.0);

        let settings = SimulationSettings::default();
        let (ax, _, az) = source.sample(&settings);
        assert_eq!(ax, FULL_SCALE);
        assert_eq!(az, 0);
    }

    #[test]
    fn test_spin_rotates_the_vector() {
        let mut source = MotionSource::new();
        let settings = SimulationSettings {
            motion_mode: MotionMode::Spin,
            spin_tilt_deg: 90.0,
            spin_rate_deg: 90.0,
            ..Default::default()
        };
        // 90 degrees per frame at full tilt walks the in-plane axes.
        let (ax0, ay0, _) = source.sample(&settings);
        let (ax1, ay1, _) = source.sample(&settings);
        assert_eq!((ax0, ay0), (FULL_SCALE, 0));
        assert!(ax1.abs() < 2 && (ay1 - FULL_SCALE).abs() < 2);
    }

    #[test]
    fn test_shake_oscillates_and_returns_to_level() {
        let settings = SimulationSettings {
            motion_mode: MotionMode::Shake,
            shake_amplitude_deg: 45.0,
            shake_period_frames: 4,
            ..Default::default()
        };
        let mut source = MotionSource::new();
        let samples: Vec<i32> = (0..5).map(|_| source.sample(&settings).0).collect();
        assert_eq!(samples[0], 0);
        assert!(samples[1] > 0);
        assert!(samples[3] < 0);
        // One full period later the roll is back where it started.
        assert!(samples[4].abs() < 2);
    }
}
