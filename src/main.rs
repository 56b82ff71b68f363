mod app;
mod braille;
mod color;
mod config;
mod export;
mod grid;
mod motion;
mod settings;
mod simulation;
mod ui;

use app::{App, Focus};
use clap::Parser;
use color::ColorScheme;
use config::AppConfig;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use settings::{ColorMode, MotionMode};
use std::io;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "pixeldust")]
#[command(about = "Tilt-driven falling-sand simulation in the terminal")]
struct Args {
    /// Number of sand grains (capped to the grid area)
    #[arg(short = 'g', long)]
    grains: Option<usize>,

    /// Acceleration scale factor (1-64)
    #[arg(long)]
    scale: Option<i32>,

    /// RNG seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Fixed grid width in cells (with --height; default follows the terminal)
    #[arg(long)]
    width: Option<usize>,

    /// Fixed grid height in cells (with --width)
    #[arg(long)]
    height: Option<usize>,

    /// Motion mode (tilt, spin, shake)
    #[arg(long)]
    motion: Option<String>,

    /// Color scheme (sand, ember, ocean, mono)
    #[arg(long)]
    color: Option<String>,

    /// Display mode (solid, speed, depth)
    #[arg(long)]
    mode: Option<String>,

    /// Simulation steps per rendered frame (1-10)
    #[arg(long)]
    speed: Option<usize>,

    /// Degrees of tilt per arrow-key press (1-30)
    #[arg(long = "tilt-step")]
    tilt_step: Option<f32>,

    /// Load settings from a specific config file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn parse_motion(s: &str) -> MotionMode {
    match s.to_lowercase().as_str() {
        "spin" | "rotate" => MotionMode::Spin,
        "shake" | "rock" => MotionMode::Shake,
        _ => MotionMode::Tilt,
    }
}

fn parse_color_scheme(s: &str) -> ColorScheme {
    match s.to_lowercase().as_str() {
        "ember" | "fire" => ColorScheme::Ember,
        "ocean" | "blue" => ColorScheme::Ocean,
        "mono" | "white" => ColorScheme::Mono,
        _ => ColorScheme::Sand,
    }
}

fn parse_color_mode(s: &str) -> ColorMode {
    match s.to_lowercase().as_str() {
        "speed" | "velocity" => ColorMode::Speed,
        "depth" | "height" => ColorMode::Depth,
        _ => ColorMode::Solid,
    }
}

/// Start from the saved config (explicit --config path, or the default
/// location when present), then let CLI flags override it.
fn build_config(args: &Args) -> Result<AppConfig, String> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::default_path()
            .filter(|path| path.exists())
            .and_then(|path| AppConfig::load_from_file(&path).ok())
            .unwrap_or_default(),
    };

    if let Some(grains) = args.grains {
        config.settings.num_grains = grains.max(1);
    }
    if let Some(scale) = args.scale {
        config.settings.accel_scale = scale.clamp(1, 64);
    }
    if let Some(motion) = &args.motion {
        config.settings.motion_mode = parse_motion(motion);
    }
    if let Some(color) = &args.color {
        config.color_scheme = parse_color_scheme(color);
    }
    if let Some(mode) = &args.mode {
        config.settings.color_mode = parse_color_mode(mode);
    }
    if let Some(speed) = args.speed {
        config.steps_per_frame = speed.clamp(1, 10);
    }
    if let Some(step) = args.tilt_step {
        config.settings.tilt_step_deg = step.clamp(1.0, 30.0);
    }

    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = build_config(&args)?;
    let fixed_grid = match (args.width, args.height) {
        (Some(w), Some(h)) => Some((w.max(4), h.max(4))),
        (None, None) => None,
        _ => return Err("--width and --height must be given together".into()),
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Size the grid from the terminal unless pinned on the command line
    let size = terminal.size()?;
    let frame_rect = ratatui::layout::Rect {
        x: 0,
        y: 0,
        width: size.width,
        height: size.height,
    };
    let (canvas_width, canvas_height) = ui::get_canvas_size(frame_rect, false);
    let mut app = App::new(canvas_width, canvas_height, config, fixed_grid, args.seed);

    let res = run_app(&mut terminal, &mut app);

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    // Target ~60fps for smooth animation
    const FRAME_DURATION: Duration = Duration::from_millis(16);

    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(FRAME_DURATION)? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }

                    if key.code == KeyCode::Char('c')
                        && key.modifiers.contains(KeyModifiers::CONTROL)
                    {
                        return Ok(());
                    }

                    match key.code {
                        // System controls
                        KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                        KeyCode::Char(' ') => app.toggle_pause(),
                        KeyCode::Char('r') | KeyCode::Char('R') => app.reset(),
                        KeyCode::Char('v') | KeyCode::Char('V') => app.toggle_fullscreen(),
                        KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => {
                            app.toggle_help()
                        }
                        KeyCode::Char('l') | KeyCode::Char('L') => app.level(),
                        KeyCode::Char('m') | KeyCode::Char('M') => app.cycle_motion_mode(),
                        KeyCode::Char('c') | KeyCode::Char('C') => app.cycle_color_scheme(),
                        KeyCode::Char('d') | KeyCode::Char('D') => app.cycle_color_mode(),
                        KeyCode::Char('s') | KeyCode::Char('S') => app.snapshot(),
                        KeyCode::Char('g') | KeyCode::Char('G') => app.toggle_recording(),
                        KeyCode::Char('w') | KeyCode::Char('W') => app.save_config(),
                        KeyCode::Char('+') | KeyCode::Char('=') => app.increase_speed(),
                        KeyCode::Char('-') | KeyCode::Char('_') => app.decrease_speed(),

                        // Navigation
                        KeyCode::Tab => app.next_focus(),
                        KeyCode::BackTab => app.prev_focus(),
                        KeyCode::Esc => {
                            if app.show_help {
                                app.toggle_help();
                            } else if app.focus.is_param() {
                                app.focus = Focus::Controls;
                            }
                        }

                        // Arrows: help scroll > parameter adjust > tilting
                        KeyCode::Up => {
                            if app.show_help {
                                app.scroll_help_up();
                            } else if app.focus.is_param() {
                                app.adjust_focused_up();
                            } else {
                                app.tilt(0.0, -1.0);
                            }
                        }
                        KeyCode::Down => {
                            if app.show_help {
                                app.scroll_help_down(ui::HELP_CONTENT_LINES);
                            } else if app.focus.is_param() {
                                app.adjust_focused_down();
                            } else {
                                app.tilt(0.0, 1.0);
                            }
                        }
                        KeyCode::Left => {
                            if !app.show_help {
                                app.tilt(-1.0, 0.0);
                            }
                        }
                        KeyCode::Right => {
                            if !app.show_help {
                                app.tilt(1.0, 0.0);
                            }
                        }
                        _ => {}
                    }
                }
                Event::Resize(width, height) => {
                    let (canvas_width, canvas_height) = ui::get_canvas_size(
                        ratatui::layout::Rect {
                            x: 0,
                            y: 0,
                            width,
                            height,
                        },
                        app.fullscreen_mode,
                    );
                    app.resize(canvas_width, canvas_height);
                }
                _ => {}
            }
        }

        // Run simulation tick
        app.tick();
    }
}
