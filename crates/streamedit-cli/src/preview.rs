use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::channel::{mpsc, oneshot};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use std::io::{Stdout, stdout};
use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use streamedit_engine::{DriverError, EditOutcome, StreamDriver, Workspace, run_stream};

type Term = Terminal<CrosstermBackend<Stdout>>;

/// Drive the stream while rendering the live document
///
/// `q` or `Esc` cancels the edit, which restores the document.
pub fn run(
    driver: StreamDriver<'_, Workspace>,
    chunks: mpsc::UnboundedReceiver<String>,
) -> Result<Result<EditOutcome, DriverError>> {
    enable_raw_mode()?;
    let mut terminal = enter_or_restore(open_terminal, restore_terminal)?;

    let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
    let stop = Arc::new(AtomicBool::new(false));
    let keys = thread::spawn({
        let stop = stop.clone();
        move || watch_keys(cancel_tx, &stop)
    });
    // A dropped sender means nobody can cancel any more, not that we should
    let cancel = async move {
        if cancel_rx.await.is_err() {
            futures::future::pending::<()>().await;
        }
    };

    let result = futures::executor::block_on(run_stream(driver, chunks, cancel, |driver| {
        if let Err(e) = draw(&mut terminal, driver) {
            log::warn!("preview render failed: {e}");
        }
    }));

    stop.store(true, Ordering::Relaxed);
    if keys.join().is_err() {
        log::warn!("key watcher panicked");
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(result)
}

fn open_terminal() -> Result<Term> {
    let mut out = stdout();
    execute!(out, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(out))?)
}

/// Best effort: the terminal may be only partly set up
fn restore_terminal() {
    if let Err(e) = disable_raw_mode() {
        log::warn!("leaving raw mode failed: {e}");
    }
    if let Err(e) = execute!(stdout(), LeaveAlternateScreen) {
        log::warn!("leaving alternate screen failed: {e}");
    }
}

/// Run `enter`, calling `restore` if it fails part way
fn enter_or_restore<T>(enter: impl FnOnce() -> Result<T>, restore: impl FnOnce()) -> Result<T> {
    enter().inspect_err(|_| restore())
}

fn watch_keys(cancel: oneshot::Sender<()>, stop: &AtomicBool) {
    while !stop.load(Ordering::Relaxed) {
        match event::poll(Duration::from_millis(50)) {
            Ok(true) => {
                if let Ok(Event::Key(key)) = event::read()
                    && matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
                {
                    // Err only means the stream already ended
                    let _ = cancel.send(());
                    return;
                }
            }
            Ok(false) => {}
            Err(e) => {
                log::warn!("reading terminal input failed: {e}");
                return;
            }
        }
    }
}

fn draw(terminal: &mut Term, driver: &StreamDriver<'_, Workspace>) -> std::io::Result<()> {
    let text = driver
        .buffer()
        .document(driver.path())
        .map(|doc| doc.text())
        .unwrap_or_default();
    let ranges = driver.streaming_ranges();
    let status = format!(
        "{} chunk(s) | {} block(s) open | q/Esc: cancel",
        driver.chunks_received(),
        driver.sessions_opened()
    );
    let title = driver.path().to_string();

    terminal.draw(|f| ui(f, &title, &text, &ranges, &status))?;
    Ok(())
}

fn ui(f: &mut Frame, title: &str, text: &str, ranges: &[Range<usize>], status: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(0), Constraint::Length(1)].as_ref())
        .split(f.area());

    let visible = chunks[0].height.saturating_sub(2);
    let scroll = first_highlighted_line(text, ranges).saturating_sub(visible / 3);

    let content = Paragraph::new(highlight_lines(text, ranges))
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .scroll((scroll, 0));
    f.render_widget(content, chunks[0]);

    let help = Paragraph::new(Line::from(vec![Span::raw(status.to_string())]));
    f.render_widget(help, chunks[1]);
}

fn first_highlighted_line(text: &str, ranges: &[Range<usize>]) -> u16 {
    let Some(start) = ranges.iter().map(|r| r.start).min() else {
        return 0;
    };
    let line = text
        .get(..start)
        .map(|before| before.matches('\n').count())
        .unwrap_or(0);
    u16::try_from(line).unwrap_or(u16::MAX)
}

/// Split `text` into display lines, styling the bytes inside `ranges`
fn highlight_lines(text: &str, ranges: &[Range<usize>]) -> Vec<Line<'static>> {
    let highlight = Style::default().bg(Color::Yellow).fg(Color::Black);
    let mut lines = Vec::new();
    let mut offset = 0;

    for raw in text.split_inclusive('\n') {
        let line = raw.strip_suffix('\n').unwrap_or(raw);
        let line = line.strip_suffix('\r').unwrap_or(line);
        let line_range = offset..offset + line.len();
        offset += raw.len();

        // Cut points where highlighting starts or stops inside this line
        let mut cuts = vec![line_range.start, line_range.end];
        for r in ranges {
            for point in [r.start, r.end] {
                if line_range.contains(&point) {
                    cuts.push(point);
                }
            }
        }
        cuts.sort_unstable();
        cuts.dedup();

        let spans: Vec<Span<'static>> = cuts
            .windows(2)
            .filter_map(|w| {
                let piece = text.get(w[0]..w[1])?.to_string();
                let lit = ranges.iter().any(|r| r.start <= w[0] && w[1] <= r.end);
                Some(if lit {
                    Span::styled(piece, highlight)
                } else {
                    Span::raw(piece)
                })
            })
            .collect();
        lines.push(Line::from(spans));
    }
    lines
}
