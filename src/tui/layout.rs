//! TUI layout and widget rendering.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, Gauge, GraphType, Paragraph};

use crate::sim::switch::PowerSource;

use super::runtime::App;
use super::style;

/// Renders the full TUI frame.
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Min(8),    // SOC chart
            Constraint::Min(8),    // solar / load chart
            Constraint::Length(6), // source step chart
            Constraint::Length(3), // SOC gauge
            Constraint::Length(5), // status panel
            Constraint::Length(1), // footer
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_soc_chart(frame, app, chunks[1]);
    render_power_chart(frame, app, chunks[2]);
    render_source_chart(frame, app, chunks[3]);
    render_soc_gauge(frame, app, chunks[4]);
    render_status(frame, app, chunks[5]);
    render_footer(frame, chunks[6]);
}

fn time_bounds(app: &App) -> [f64; 2] {
    let h = &app.snapshot.history;
    let lo = h.first().map_or(0.0, |s| s.time_s);
    let hi = h.last().map_or(1.0, |s| s.time_s).max(lo + 1.0);
    [lo, hi]
}

fn time_axis(bounds: [f64; 2]) -> Axis<'static> {
    Axis::default()
        .title("s")
        .bounds(bounds)
        .labels(vec![format!("{:.0}", bounds[0]), format!("{:.0}", bounds[1])])
}

/// Header bar: simulated time, speed, run state.
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let (icon, label) = if app.snapshot.running {
        ("▶", "RUNNING")
    } else {
        ("‖", "STOPPED")
    };

    let header = Line::from(vec![
        Span::styled(
            " RELAY-SIM ",
            Style::default()
                .fg(style::HEADER_FG)
                .bg(style::HEADER_BG)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            " t={:.1}s │ x{} │ {icon} {label} ",
            app.snapshot.time_s,
            app.speed(),
        )),
    ]);
    frame.render_widget(Paragraph::new(header), area);
}

/// Battery SOC with the two switching thresholds.
fn render_soc_chart(frame: &mut Frame, app: &App, area: Rect) {
    let snap = &app.snapshot;
    let soc: Vec<(f64, f64)> = snap.history.iter().map(|s| (s.time_s, s.soc_pct)).collect();
    let x = time_bounds(app);
    let low = [(x[0], snap.low_threshold_pct), (x[1], snap.low_threshold_pct)];
    let high = [(x[0], snap.high_threshold_pct), (x[1], snap.high_threshold_pct)];

    let datasets = vec![
        Dataset::default()
            .name("SOC")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(style::SOC_COLOR))
            .data(&soc),
        Dataset::default()
            .name("low")
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(style::THRESHOLD_COLOR))
            .data(&low),
        Dataset::default()
            .name("high")
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(style::THRESHOLD_COLOR))
            .data(&high),
    ];

    let chart = Chart::new(datasets)
        .block(Block::default().title(" Battery SOC ").borders(Borders::ALL))
        .x_axis(time_axis(x))
        .y_axis(
            Axis::default()
                .title("%")
                .bounds([0.0, 100.0])
                .labels(vec!["0", "50", "100"]),
        );
    frame.render_widget(chart, area);
}

/// Solar input and AC load.
fn render_power_chart(frame: &mut Frame, app: &App, area: Rect) {
    let h = &app.snapshot.history;
    let solar: Vec<(f64, f64)> = h.iter().map(|s| (s.time_s, s.solar_w)).collect();
    let load: Vec<(f64, f64)> = h.iter().map(|s| (s.time_s, s.load_w)).collect();
    let y = style::auto_bounds_y(&[solar.as_slice(), load.as_slice()], 0.0);

    let datasets = vec![
        Dataset::default()
            .name("Solar")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(style::SOLAR_COLOR))
            .data(&solar),
        Dataset::default()
            .name("Load")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(style::LOAD_COLOR))
            .data(&load),
    ];

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(format!(" Solar / AC Load (max {:.0} W) ", app.max_solar_w))
                .borders(Borders::ALL),
        )
        .x_axis(time_axis(time_bounds(app)))
        .y_axis(
            Axis::default()
                .title("W")
                .bounds(y)
                .labels(vec![format!("{:.0}", y[0]), format!("{:.0}", y[1])]),
        );
    frame.render_widget(chart, area);
}

/// Power source as a 0/1 step trace.
fn render_source_chart(frame: &mut Frame, app: &App, area: Rect) {
    let source: Vec<(f64, f64)> = app
        .snapshot
        .history
        .iter()
        .map(|s| (s.time_s, if s.source.is_inverter() { 1.0 } else { 0.0 }))
        .collect();

    let datasets = vec![
        Dataset::default()
            .name("Source")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(style::source_color(app.snapshot.source)))
            .data(&source),
    ];

    let chart = Chart::new(datasets)
        .block(Block::default().title(" Power Source ").borders(Borders::ALL))
        .x_axis(time_axis(time_bounds(app)))
        .y_axis(
            Axis::default()
                .bounds([-0.1, 1.1])
                .labels(vec!["Mains", "Inverter"]),
        );
    frame.render_widget(chart, area);
}

fn render_soc_gauge(frame: &mut Frame, app: &App, area: Rect) {
    let snap = &app.snapshot;
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(14)])
        .split(area);

    let gauge = Gauge::default()
        .block(Block::default().title(" SOC ").borders(Borders::ALL))
        .gauge_style(Style::default().fg(style::soc_color(snap.soc_pct)))
        .ratio((snap.soc_pct / 100.0).clamp(0.0, 1.0))
        .label(format!("{:.1}%  {:.2} V", snap.soc_pct, snap.voltage));
    frame.render_widget(gauge, chunks[0]);

    let source = Paragraph::new(Line::from(Span::styled(
        format!("{:^12}", snap.source),
        Style::default()
            .fg(style::source_color(snap.source))
            .add_modifier(Modifier::BOLD),
    )))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(source, chunks[1]);
}

/// Status panel with the adjustable settings.
fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let snap = &app.snapshot;
    let switches = snap
        .history
        .windows(2)
        .filter(|w| w[0].source != w[1].source)
        .count();
    let mut lines = vec![
        Line::from(format!(
            "  low={:>5.1}%  high={:>5.1}%  pwm timer={:>5.1}s  switches={}",
            snap.low_threshold_pct, snap.high_threshold_pct, snap.pwm_timer_s, switches,
        )),
        Line::from(format!(
            "  sunlight={:>5.1}% (±{:.0}%)  solar={:>7.1} W  load={:>6.1} W",
            snap.sunlight_intensity_pct, snap.sunlight_variability_pct, snap.solar_w, snap.load_w,
        )),
    ];
    if let Some(ref e) = app.last_error {
        lines.push(Line::from(Span::styled(
            format!("  error: {e}"),
            Style::default().fg(style::SOC_LOW),
        )));
    } else if snap.source == PowerSource::Mains && snap.soc_pct >= snap.high_threshold_pct {
        lines.push(Line::from("  waiting for pwm timer"));
    }

    let block = Block::default().title(" Status ").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Footer with keybinding hints.
fn render_footer(frame: &mut Frame, area: Rect) {
    let footer = Paragraph::new(Line::from(Span::styled(
        " q:Quit  Space:Start/Stop  r:Reset  +/-:Speed  [/]:Low  {/}:High  t/T:Timer  s/S:Sun  l/L:Load",
        Style::default().fg(style::FOOTER_FG),
    )));
    frame.render_widget(footer, area);
}
