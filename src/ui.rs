use crate::app::{App, Focus};
use crate::braille;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

const SIDEBAR_WIDTH: u16 = 24;

/// Max scroll for help content (generous to account for text wrapping on small screens)
pub const HELP_CONTENT_LINES: u16 = 40;

// UI color scheme
const BORDER_COLOR: Color = Color::Cyan;
const HIGHLIGHT_COLOR: Color = Color::Yellow;
const TEXT_COLOR: Color = Color::White;
const DIM_TEXT_COLOR: Color = Color::Gray;

/// Creates a standard styled block with rounded borders
fn styled_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_COLOR))
        .title(title)
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if app.fullscreen_mode {
        render_canvas(frame, area, app);
    } else {
        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(area);

        render_sidebar(frame, layout[0], app);
        render_canvas(frame, layout[1], app);
    }

    if app.show_help {
        render_help_overlay(frame, area, app);
    }
}

/// Calculate the canvas size (excluding borders)
pub fn get_canvas_size(frame_area: Rect, fullscreen: bool) -> (u16, u16) {
    if fullscreen {
        (
            frame_area.width.saturating_sub(2),
            frame_area.height.saturating_sub(2),
        )
    } else {
        let canvas_width = frame_area.width.saturating_sub(SIDEBAR_WIDTH + 2);
        let canvas_height = frame_area.height.saturating_sub(2);
        (canvas_width, canvas_height)
    }
}

fn render_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),  // Status
            Constraint::Length(9),  // Parameters
            Constraint::Min(10),    // Controls
        ])
        .split(area);

    render_status_box(frame, sections[0], app);
    render_params_box(frame, sections[1], app);
    render_controls_box(frame, sections[2], app);
}

fn render_status_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" PixelDust ");

    let (status_text, status_color) = if app.paused {
        ("PAUSED".to_string(), HIGHLIGHT_COLOR)
    } else if let Some(recorder) = &app.recorder {
        (format!("RECORDING {}f", recorder.frame_count()), Color::Red)
    } else {
        ("RUNNING".to_string(), BORDER_COLOR)
    };

    let (ax, ay, az) = app.last_accel;
    let mut content = vec![
        Line::from(Span::styled(
            format!(
                "{} grains on {}x{}",
                app.simulation.num_grains(),
                app.simulation.width(),
                app.simulation.height()
            ),
            Style::default().fg(TEXT_COLOR),
        )),
        Line::from(Span::styled(
            format!(
                "roll {:+.0}° pitch {:+.0}°",
                app.motion.roll_deg(),
                app.motion.pitch_deg()
            ),
            Style::default().fg(TEXT_COLOR),
        )),
        Line::from(Span::styled(
            format!("a ({}, {}, {})", ax, ay, az),
            Style::default().fg(DIM_TEXT_COLOR),
        )),
        Line::from(Span::styled(status_text, Style::default().fg(status_color))),
    ];

    if let Some(message) = &app.status_message {
        content.push(Line::from(Span::styled(
            message.clone(),
            Style::default().fg(HIGHLIGHT_COLOR),
        )));
    }

    let paragraph = Paragraph::new(content).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_params_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Parameters ");

    let make_line = |label: &str, value: String, focused: bool| {
        let prefix = if focused { "> " } else { "  " };
        let style = if focused {
            Style::default().fg(HIGHLIGHT_COLOR)
        } else {
            Style::default().fg(TEXT_COLOR)
        };
        Line::from(Span::styled(
            format!("{}{}: {}", prefix, label, value),
            style,
        ))
    };

    let settings = &app.settings;

    let content = vec![
        make_line(
            "Color",
            app.color_scheme.name().to_string(),
            app.focus == Focus::ColorScheme,
        ),
        make_line(
            "Grains",
            format!("{}", app.simulation.num_grains()),
            app.focus == Focus::Grains,
        ),
        make_line(
            "Mode",
            settings.color_mode.name().to_string(),
            app.focus == Focus::Mode,
        ),
        make_line(
            "Motion",
            settings.motion_mode.name().to_string(),
            app.focus == Focus::Motion,
        ),
        make_line(
            "Scale",
            format!("{}", app.simulation.scale()),
            app.focus == Focus::Scale,
        ),
        make_line(
            "Shake amp",
            format!("{:.0}°", settings.shake_amplitude_deg),
            app.focus == Focus::ShakeAmp,
        ),
        make_line(
            "Shake period",
            format!("{}", settings.shake_period_frames),
            app.focus == Focus::ShakePeriod,
        ),
        make_line(
            "Speed",
            format!("{}", app.steps_per_frame),
            app.focus == Focus::Speed,
        ),
        make_line(
            "Spin rate",
            format!("{:.1}°", settings.spin_rate_deg),
            app.focus == Focus::SpinRate,
        ),
        make_line(
            "Spin tilt",
            format!("{:.0}°", settings.spin_tilt_deg),
            app.focus == Focus::SpinTilt,
        ),
        make_line(
            "Tilt step",
            format!("{:.0}°", settings.tilt_step_deg),
            app.focus == Focus::TiltStep,
        ),
    ];

    // Keep the focused item visible on short terminals
    let focus_line = app.focus.line_index();
    let visible_height = area.height.saturating_sub(2); // minus borders
    let content_height = content.len() as u16;

    let scroll = if visible_height == 0 || visible_height >= content_height {
        0
    } else if focus_line >= visible_height {
        focus_line.saturating_sub(visible_height - 1)
    } else {
        0
    };

    let paragraph = Paragraph::new(content).block(block).scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_controls_box(frame: &mut Frame, area: Rect, app: &App) {
    let key_style = Style::default().fg(HIGHLIGHT_COLOR);
    let desc_style = Style::default().fg(DIM_TEXT_COLOR);

    let make_control = |key: &str, desc: String| -> Line<'_> {
        Line::from(vec![
            Span::styled(format!("{:>5}", key), key_style),
            Span::styled(format!(" {}", desc), desc_style),
        ])
    };

    let content = vec![
        make_control("←→↑↓", "tilt the tray".to_string()),
        make_control("L", "level the tray".to_string()),
        make_control("Space", "pause/resume".to_string()),
        make_control("R", "re-scatter sand".to_string()),
        make_control("M", format!("motion: {}", app.settings.motion_mode.name())),
        make_control("C", "color scheme".to_string()),
        make_control("D", format!("display: {}", app.settings.color_mode.name())),
        make_control("S", "PNG snapshot".to_string()),
        make_control("G", "record GIF".to_string()),
        make_control("W", "write config".to_string()),
        make_control("V", "fullscreen".to_string()),
        make_control("Tab", "select parameter".to_string()),
        make_control("+/-", "speed".to_string()),
        make_control("H/?", "help".to_string()),
        make_control("Q", "quit".to_string()),
    ];

    let block = styled_block(" Controls ");
    let paragraph = Paragraph::new(content).block(block);
    frame.render_widget(paragraph, area);
}

fn render_canvas(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block("");

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let cells = braille::render_to_braille(
        &app.simulation,
        inner.width,
        inner.height,
        &app.color_lut,
        app.settings.color_mode,
    );

    for cell in cells {
        let x = inner.x + cell.x;
        let y = inner.y + cell.y;

        if x < inner.x + inner.width && y < inner.y + inner.height {
            let cell_rect = Rect {
                x,
                y,
                width: 1,
                height: 1,
            };
            let span = Span::styled(cell.char.to_string(), Style::default().fg(cell.color));
            let paragraph = Paragraph::new(Line::from(span));
            frame.render_widget(paragraph, cell_rect);
        }
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect, app: &App) {
    // Calculate the canvas area (exclude sidebar unless fullscreen)
    let canvas_x = if app.fullscreen_mode { 0 } else { SIDEBAR_WIDTH };
    let canvas_width = if app.fullscreen_mode {
        area.width
    } else {
        area.width.saturating_sub(SIDEBAR_WIDTH)
    };

    // Center the help dialog within the canvas
    let help_width = 56.min(canvas_width.saturating_sub(4));
    let help_height = area.height.saturating_sub(4).min(32);
    let x = canvas_x + (canvas_width.saturating_sub(help_width)) / 2;
    let y = (area.height.saturating_sub(help_height)) / 2;

    let help_area = Rect {
        x: area.x + x,
        y: area.y + y,
        width: help_width,
        height: help_height,
    };

    frame.render_widget(Clear, help_area);

    let content = vec![
        Line::from(""),
        Line::from(Span::styled("PIXEL DUST", Style::default().fg(BORDER_COLOR))),
        Line::from(""),
        Line::from("Grains of sand pile, slide and topple in response to tilt, the way an LED sand toy follows its accelerometer. Tip the tray and watch the sand follow."),
        Line::from(""),
        Line::from(Span::styled("M - Motion Mode", Style::default().fg(TEXT_COLOR))),
        Line::from("Tilt: steer with the arrow keys"),
        Line::from("Spin: gravity rotates around the tray"),
        Line::from("Shake: the tray rocks side to side"),
        Line::from(""),
        Line::from(Span::styled("D - Display Mode", Style::default().fg(TEXT_COLOR))),
        Line::from("Solid (one color), Speed (fast grains glow), Depth (color by height)"),
        Line::from(""),
        Line::from(Span::styled("CAPTURE:", Style::default().fg(HIGHLIGHT_COLOR))),
        Line::from("S saves a PNG snapshot; G starts/stops a GIF recording. Files land in the working directory."),
        Line::from(""),
        Line::from(Span::styled("PARAMETERS:", Style::default().fg(HIGHLIGHT_COLOR))),
        Line::from("Tab selects a parameter in the sidebar; Up/Down adjust it; Esc returns arrow keys to tilting."),
        Line::from(""),
        Line::from(Span::styled("BASIC CONTROLS:", Style::default().fg(HIGHLIGHT_COLOR))),
        Line::from("Space=Pause, R=Re-scatter, L=Level, C=Colors, V=Fullscreen, W=Write config, +/-=Speed, Q=Quit"),
        Line::from(""),
    ];

    let content_height = content.len() as u16;
    let visible_height = help_height.saturating_sub(2); // minus borders
    let max_scroll = content_height.saturating_sub(visible_height);
    let is_scrollable = max_scroll > 0;

    let title = if is_scrollable {
        " Help (↑↓ scroll, H to close) "
    } else {
        " Help (H to close) "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(HIGHLIGHT_COLOR))
        .title(title);

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.help_scroll, 0));

    frame.render_widget(paragraph, help_area);
}
