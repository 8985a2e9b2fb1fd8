//! Snapshot presentation: TUI gauges or plain stdout lines.

use crate::aggregator::Snapshot;
use anyhow::{Context, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    prelude::CrosstermBackend,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame, Terminal,
};
use std::io;

/// Renders snapshots. A render failure is fatal to the loop; presentation
/// errors are not part of the sampling error taxonomy.
pub trait Presenter {
    fn render(&mut self, snapshot: &Snapshot) -> Result<()>;

    /// Called when the terminal geometry changes so layout can be recomputed
    /// before the next render.
    fn on_resize(&mut self, width: u16, height: u16);
}

/// Full-screen dashboard: three gauges on the top half, a system information
/// panel on the bottom half.
pub struct TuiPresenter {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TuiPresenter {
    /// Puts the terminal into raw mode on the alternate screen. Failure here
    /// is an initialization error and prevents the loop from starting.
    pub fn new() -> Result<Self> {
        enable_raw_mode().context("failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))
            .context("failed to initialize terminal")?;
        Ok(Self { terminal })
    }
}

impl Presenter for TuiPresenter {
    fn render(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.terminal
            .draw(|f| draw_dashboard(f, snapshot))
            .context("failed to draw dashboard")?;
        Ok(())
    }

    fn on_resize(&mut self, _width: u16, _height: u16) {
        // The backend tracks the new geometry; the next draw lays out against it.
        let _ = self.terminal.autoresize();
    }
}

impl Drop for TuiPresenter {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

fn draw_dashboard(f: &mut Frame, snapshot: &Snapshot) {
    let halves = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(f.area());

    let thirds = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(halves[0]);

    render_gauge(f, thirds[0], " CPU Usage ", snapshot.cpu_percent, Color::Yellow);
    render_gauge(
        f,
        thirds[1],
        " Memory Usage ",
        snapshot.memory_percent,
        Color::Green,
    );
    render_gauge(f, thirds[2], " Disk Usage ", snapshot.disk_percent, Color::Red);

    render_info_panel(f, halves[1], snapshot);
}

fn render_gauge(f: &mut Frame, area: Rect, title: &str, percent: f64, color: Color) {
    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White)),
        )
        .gauge_style(Style::default().fg(color))
        .percent(percent.clamp(0.0, 100.0) as u16)
        .label(format!("{:.1}%", percent));
    f.render_widget(gauge, area);
}

fn render_info_panel(f: &mut Frame, area: Rect, snapshot: &Snapshot) {
    let lines = vec![
        Line::from(format!(
            "Time: {}",
            chrono::Local::now().format("%H:%M:%S")
        )),
        Line::from(""),
        Line::from(format!("CPU: {:.1}%", snapshot.cpu_percent)),
        Line::from(""),
        Line::from(format!(
            "Memory: {:.1}% ({:.1} GB / {:.1} GB)",
            snapshot.memory_percent, snapshot.memory_used_gb, snapshot.memory_total_gb
        )),
        Line::from(""),
        Line::from(format!(
            "Disk ({}): {:.1}% ({:.1} GB / {:.1} GB)",
            snapshot.disk_path, snapshot.disk_percent, snapshot.disk_used_gb, snapshot.disk_total_gb
        )),
        Line::from(""),
        Line::from("Press 'q' or Ctrl+C to quit"),
    ];

    let panel = Paragraph::new(lines).block(
        Block::default()
            .title(" System Information ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );
    f.render_widget(panel, area);
}

/// Plain-text presenter for `--no-tui` operation.
#[derive(Debug, Default)]
pub struct StdoutPresenter;

impl Presenter for StdoutPresenter {
    fn render(&mut self, snapshot: &Snapshot) -> Result<()> {
        println!(
            "[{}] CPU: {:.1}% | Memory: {:.1}% ({:.1}/{:.1} GB) | Disk ({}): {:.1}% ({:.1}/{:.1} GB)",
            chrono::Local::now().format("%H:%M:%S"),
            snapshot.cpu_percent,
            snapshot.memory_percent,
            snapshot.memory_used_gb,
            snapshot.memory_total_gb,
            snapshot.disk_path,
            snapshot.disk_percent,
            snapshot.disk_used_gb,
            snapshot.disk_total_gb,
        );
        Ok(())
    }

    fn on_resize(&mut self, _width: u16, _height: u16) {}
}
