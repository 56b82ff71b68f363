use crate::braille;
use crate::color::{ColorLut, ColorScheme};
use crate::config::AppConfig;
use crate::export::{self, GifRecorder};
use crate::motion::MotionSource;
use crate::settings::SimulationSettings;
use crate::simulation::SandSimulation;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Focus state for parameter editing in the sidebar
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Focus {
    #[default]
    None,
    // Alphabetical order, matching the parameters box
    ColorScheme,
    Grains,
    Mode,
    Motion,
    Scale,
    ShakeAmp,
    ShakePeriod,
    Speed,
    SpinRate,
    SpinTilt,
    TiltStep,
    // Controls box (not a param)
    Controls,
}

impl Focus {
    /// Tab cycles through parameters in alphabetical order
    pub fn next(&self) -> Focus {
        match self {
            Focus::None | Focus::Controls => Focus::ColorScheme,
            Focus::ColorScheme => Focus::Grains,
            Focus::Grains => Focus::Mode,
            Focus::Mode => Focus::Motion,
            Focus::Motion => Focus::Scale,
            Focus::Scale => Focus::ShakeAmp,
            Focus::ShakeAmp => Focus::ShakePeriod,
            Focus::ShakePeriod => Focus::Speed,
            Focus::Speed => Focus::SpinRate,
            Focus::SpinRate => Focus::SpinTilt,
            Focus::SpinTilt => Focus::TiltStep,
            Focus::TiltStep => Focus::ColorScheme, // Loop back
        }
    }

    /// Shift+Tab cycles in reverse
    pub fn prev(&self) -> Focus {
        match self {
            Focus::None | Focus::Controls => Focus::TiltStep,
            Focus::ColorScheme => Focus::TiltStep, // Loop back
            Focus::Grains => Focus::ColorScheme,
            Focus::Mode => Focus::Grains,
            Focus::Motion => Focus::Mode,
            Focus::Scale => Focus::Motion,
            Focus::ShakeAmp => Focus::Scale,
            Focus::ShakePeriod => Focus::ShakeAmp,
            Focus::Speed => Focus::ShakePeriod,
            Focus::SpinRate => Focus::Speed,
            Focus::SpinTilt => Focus::SpinRate,
            Focus::TiltStep => Focus::SpinTilt,
        }
    }

    /// Line index in the parameters box for this focus
    pub fn line_index(&self) -> u16 {
        match self {
            Focus::None | Focus::Controls => 0,
            Focus::ColorScheme => 0,
            Focus::Grains => 1,
            Focus::Mode => 2,
            Focus::Motion => 3,
            Focus::Scale => 4,
            Focus::ShakeAmp => 5,
            Focus::ShakePeriod => 6,
            Focus::Speed => 7,
            Focus::SpinRate => 8,
            Focus::SpinTilt => 9,
            Focus::TiltStep => 10,
        }
    }

    /// Check if focus is on a parameter (not Controls or None)
    pub fn is_param(&self) -> bool {
        !matches!(self, Focus::None | Focus::Controls)
    }
}

/// Main application state
pub struct App {
    pub simulation: SandSimulation,
    pub settings: SimulationSettings,
    pub motion: MotionSource,
    pub color_scheme: ColorScheme,
    pub color_lut: ColorLut,
    pub focus: Focus,
    pub fullscreen_mode: bool,
    pub paused: bool,
    pub steps_per_frame: usize,
    pub show_help: bool,
    pub help_scroll: u16,
    pub recorder: Option<GifRecorder>,
    pub status_message: Option<String>,
    /// Raw acceleration fed to the engine last frame, for the status box
    pub last_accel: (i32, i32, i32),
    /// CLI-pinned grid size; terminal resizes are ignored when set
    fixed_grid: Option<(usize, usize)>,
}

impl App {
    pub fn new(
        canvas_width: u16,
        canvas_height: u16,
        config: AppConfig,
        fixed_grid: Option<(usize, usize)>,
        seed: Option<u64>,
    ) -> Self {
        let (sim_width, sim_height) = fixed_grid
            .unwrap_or_else(|| braille::calculate_simulation_size(canvas_width, canvas_height));
        let mut settings = config.settings;
        let simulation = match seed {
            Some(seed) => SandSimulation::with_seed(
                sim_width,
                sim_height,
                settings.num_grains,
                settings.accel_scale,
                seed,
            ),
            None => SandSimulation::new(
                sim_width,
                sim_height,
                settings.num_grains,
                settings.accel_scale,
            ),
        };
        // The constructor caps the count to the grid area; mirror that here
        settings.num_grains = simulation.num_grains();
        Self {
            simulation,
            settings,
            motion: MotionSource::new(),
            color_lut: config.color_scheme.build_lut(),
            color_scheme: config.color_scheme,
            focus: Focus::Controls,
            fullscreen_mode: false,
            paused: false,
            steps_per_frame: config.steps_per_frame.clamp(1, 10),
            show_help: false,
            help_scroll: 0,
            recorder: None,
            status_message: None,
            last_accel: (0, 0, 0),
            fixed_grid,
        }
    }

    /// Advance the simulation for one rendered frame
    pub fn tick(&mut self) {
        if self.paused {
            return;
        }
        for _ in 0..self.steps_per_frame {
            let (ax, ay, az) = self.motion.sample(&self.settings);
            self.last_accel = (ax, ay, az);
            self.simulation.update(ax, ay, az);
        }
        if let Some(recorder) = &mut self.recorder {
            recorder.push_frame(&self.simulation);
        }
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Re-scatter all grains over fresh random cells
    pub fn reset(&mut self) {
        self.simulation.randomize();
        self.status_message = None;
    }

    pub fn next_focus(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn prev_focus(&mut self) {
        self.focus = self.focus.prev();
    }

    /// Adjust the currently focused parameter upward
    pub fn adjust_focused_up(&mut self) {
        match self.focus {
            Focus::None | Focus::Controls => {}
            Focus::ColorScheme => self.cycle_color_scheme(),
            Focus::Grains => self.adjust_grains(50),
            Focus::Mode => self.cycle_color_mode(),
            Focus::Motion => self.cycle_motion_mode(),
            Focus::Scale => self.adjust_scale(1),
            Focus::ShakeAmp => self.settings.adjust_shake_amplitude(5.0),
            Focus::ShakePeriod => self.settings.adjust_shake_period(10),
            Focus::Speed => self.increase_speed(),
            Focus::SpinRate => self.settings.adjust_spin_rate(0.5),
            Focus::SpinTilt => self.settings.adjust_spin_tilt(5.0),
            Focus::TiltStep => self.settings.adjust_tilt_step(1.0),
        }
    }

    /// Adjust the currently focused parameter downward
    pub fn adjust_focused_down(&mut self) {
        match self.focus {
            Focus::None | Focus::Controls => {}
            Focus::ColorScheme => {
                self.color_scheme = self.color_scheme.prev();
                self.color_lut = self.color_scheme.build_lut();
            }
            Focus::Grains => self.adjust_grains(-50),
            Focus::Mode => self.settings.color_mode = self.settings.color_mode.prev(),
            Focus::Motion => self.settings.motion_mode = self.settings.motion_mode.prev(),
            Focus::Scale => self.adjust_scale(-1),
            Focus::ShakeAmp => self.settings.adjust_shake_amplitude(-5.0),
            Focus::ShakePeriod => self.settings.adjust_shake_period(-10),
            Focus::Speed => self.decrease_speed(),
            Focus::SpinRate => self.settings.adjust_spin_rate(-0.5),
            Focus::SpinTilt => self.settings.adjust_spin_tilt(-5.0),
            Focus::TiltStep => self.settings.adjust_tilt_step(-1.0),
        }
    }

    /// Change the grain count and re-scatter
    pub fn adjust_grains(&mut self, delta: i32) {
        self.simulation.adjust_grains(delta);
        self.settings.num_grains = self.simulation.num_grains();
    }

    /// Change the acceleration scale
    pub fn adjust_scale(&mut self, delta: i32) {
        self.simulation.adjust_scale(delta);
        self.settings.accel_scale = self.simulation.scale();
    }

    pub fn cycle_color_scheme(&mut self) {
        self.color_scheme = self.color_scheme.next();
        self.color_lut = self.color_scheme.build_lut();
    }

    pub fn cycle_color_mode(&mut self) {
        self.settings.color_mode = self.settings.color_mode.next();
    }

    pub fn cycle_motion_mode(&mut self) {
        self.settings.motion_mode = self.settings.motion_mode.next();
    }

    /// Tilt the tray with the arrow keys (Tilt mode input)
    pub fn tilt(&mut self, d_roll: f32, d_pitch: f32) {
        let step = self.settings.tilt_step_deg;
        if d_roll != 0.0 {
            self.motion.tilt_roll(d_roll * step);
        }
        if d_pitch != 0.0 {
            self.motion.tilt_pitch(d_pitch * step);
        }
    }

    /// Return the tray to level
    pub fn level(&mut self) {
        self.motion.level();
    }

    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen_mode = !self.fullscreen_mode;
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        if self.show_help {
            self.help_scroll = 0;
        }
    }

    pub fn scroll_help_up(&mut self) {
        self.help_scroll = self.help_scroll.saturating_sub(1);
    }

    pub fn scroll_help_down(&mut self, max_scroll: u16) {
        self.help_scroll = (self.help_scroll + 1).min(max_scroll);
    }

    pub fn increase_speed(&mut self) {
        self.steps_per_frame = (self.steps_per_frame + 1).min(10);
    }

    pub fn decrease_speed(&mut self) {
        self.steps_per_frame = self.steps_per_frame.saturating_sub(1).max(1);
    }

    /// Resize the simulation to match a new canvas, unless the grid size
    /// was pinned on the command line
    pub fn resize(&mut self, canvas_width: u16, canvas_height: u16) {
        if self.fixed_grid.is_some() {
            return;
        }
        let (sim_width, sim_height) =
            braille::calculate_simulation_size(canvas_width, canvas_height);
        self.simulation.resize(sim_width, sim_height);
    }

    /// Save a PNG snapshot of the current grid to the working directory
    pub fn snapshot(&mut self) {
        let path = timestamped("pixeldust", "png");
        self.status_message = Some(match export::save_png(
            &self.simulation,
            self.color_scheme,
            &path,
            4,
        ) {
            Ok(()) => format!("Saved {}", path.display()),
            Err(e) => e,
        });
    }

    /// Start recording, or stop and write the GIF
    pub fn toggle_recording(&mut self) {
        match self.recorder.take() {
            None => {
                self.recorder = Some(GifRecorder::new(&self.simulation));
                self.status_message = Some("Recording...".to_string());
            }
            Some(recorder) => {
                let path = timestamped("pixeldust", "gif");
                self.status_message = Some(match recorder.write(self.color_scheme, &path) {
                    Ok(frames) => format!("Wrote {} frames to {}", frames, path.display()),
                    Err(e) => e,
                });
            }
        }
    }

    /// Write the current settings to the default config path
    pub fn save_config(&mut self) {
        let config = AppConfig {
            version: 1,
            settings: self.settings.clone(),
            color_scheme: self.color_scheme,
            steps_per_frame: self.steps_per_frame,
        };
        self.status_message = Some(match AppConfig::default_path() {
            Some(path) => match config.save_to_file(&path) {
                Ok(()) => format!("Config saved to {}", path.display()),
                Err(e) => e,
            },
            None => "No config directory on this platform".to_string(),
        });
    }
}

fn timestamped(stem: &str, ext: &str) -> PathBuf {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    PathBuf::from(format!("{}-{}.{}", stem, secs, ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_app() -> App {
        App::new(10, 5, AppConfig::default(), Some((16, 16)), Some(42))
    }

    #[test]
    fn test_fixed_grid_ignores_resize() {
        let mut app = test_app();
        app.resize(80, 40);
        assert_eq!(app.simulation.width(), 16);
        assert_eq!(app.simulation.height(), 16);
    }

    #[test]
    fn test_tick_advances_only_when_running() {
        let mut app = test_app();
        app.paused = true;
        app.tick();
        assert_eq!(app.last_accel, (0, 0, 0));

        app.paused = false;
        app.tick();
        assert_ne!(app.last_accel, (0, 0, 0));
    }

    #[test]
    fn test_focus_cycle_is_closed() {
        let mut focus = Focus::ColorScheme;
        for _ in 0..11 {
            focus = focus.next();
        }
        assert_eq!(focus, Focus::ColorScheme);
        assert_eq!(Focus::Speed.next().prev(), Focus::Speed);
    }

    #[test]
    fn test_adjust_grains_keeps_settings_in_sync() {
        let mut app = test_app();
        let before = app.simulation.num_grains();
        app.adjust_grains(-100);
        assert_eq!(app.settings.num_grains, app.simulation.num_grains());
        assert!(app.simulation.num_grains() < before);
    }

    #[test]
    fn test_recording_toggle_roundtrip() {
        let mut app = test_app();
        app.toggle_recording();
        assert!(app.recorder.is_some());
        app.tick();
        app.tick();
        assert_eq!(app.recorder.as_ref().unwrap().frame_count(), 2);
        // Stopping with zero frames reports the error instead of writing a
        // file; the file-writing path is covered in export.rs.
        app.recorder = Some(GifRecorder::new(&app.simulation));
        app.toggle_recording();
        assert!(app.recorder.is_none());
        assert_eq!(app.status_message.as_deref(), Some("No frames recorded"));
    }
}
