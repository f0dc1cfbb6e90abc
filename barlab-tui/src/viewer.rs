//! Full-screen interactive view of the comparison chart.

use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::cursor::Show;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Layout};
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::{Frame, Terminal};

use barlab_runner::FormatResult;

use crate::chart::{ChartPoint, ComparisonChart};
use crate::theme::Theme;

const HINT: &str = " q / Esc / Enter to close ";

/// Keys that dismiss the chart.
pub fn is_close_key(key: &KeyEvent) -> bool {
    key.kind == KeyEventKind::Press
        && matches!(key.code, KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter)
}

/// Draw the chart and the key hint into one frame.
pub fn draw(frame: &mut Frame, points: &[ChartPoint], theme: &Theme) {
    let [chart_area, hint_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(frame.area());
    frame.render_widget(ComparisonChart::new(points, theme), chart_area);
    frame.render_widget(
        Line::styled(HINT, Style::default().fg(theme.muted)),
        hint_area,
    );
}

fn event_loop<B: Backend>(terminal: &mut Terminal<B>, points: &[ChartPoint]) -> Result<()> {
    let theme = Theme::default();
    loop {
        terminal.draw(|f| draw(f, points, &theme))?;

        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if is_close_key(&key) {
                    return Ok(());
                }
            }
        }
    }
}

/// Raw mode and alternate screen, undone on drop for whichever step succeeded.
#[derive(Default)]
struct TerminalGuard {
    raw_mode: bool,
    alternate_screen: bool,
}

impl TerminalGuard {
    fn enter() -> Result<Self> {
        let mut guard = Self::default();
        enable_raw_mode()?;
        guard.raw_mode = true;
        execute!(stdout(), EnterAlternateScreen)?;
        guard.alternate_screen = true;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.alternate_screen {
            let _ = execute!(stdout(), LeaveAlternateScreen, Show);
        }
        if self.raw_mode {
            let _ = disable_raw_mode();
        }
    }
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(stdout(), LeaveAlternateScreen, Show);
}

/// Run `f` with a panic hook that restores the terminal before delegating to
/// the previous hook, then put the previous hook back.
fn with_restore_hook<T>(f: impl FnOnce() -> T) -> T {
    let previous = Arc::new(std::panic::take_hook());
    let chained = Arc::clone(&previous);
    std::panic::set_hook(Box::new(move |info| {
        restore_terminal();
        (**chained)(info);
    }));

    let out = f();

    drop(std::panic::take_hook());
    if let Ok(hook) = Arc::try_unwrap(previous) {
        std::panic::set_hook(hook);
    }
    out
}

fn run_session(points: &[ChartPoint]) -> Result<()> {
    let _guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;
    event_loop(&mut terminal, points)
}

/// Show the chart in the alternate screen until a close key is pressed.
///
/// The terminal is restored on every exit path, including a panic.
pub fn show_chart(results: &[FormatResult]) -> Result<()> {
    let points = ChartPoint::from_results(results);
    with_restore_hook(|| run_session(&points))
}
