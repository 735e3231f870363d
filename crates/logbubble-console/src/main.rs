use logbubble_core::{LogCollector, LogStore};
use logbubble_tui::LogConsole;
use ratatui::{
    backend::CrosstermBackend,
    crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        execute,
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    },
    layout::Rect,
    style::Style,
    text::Line,
    widgets::Paragraph,
    Terminal,
};
use std::cell::RefCell;
use std::io;
use std::rc::Rc;

mod logger;
mod traffic;

use traffic::TrafficSource;

fn main() -> anyhow::Result<()> {
    let log_file = logger::init()?;
    log::info!("Starting logbubble-console (log file: {})", log_file.display());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // One store, one collector, one panel.
    let store = Rc::new(RefCell::new(LogStore::new()));
    let collector = LogCollector::new(store.clone());
    let mut console = LogConsole::attach(store);
    let mut traffic = TrafficSource::new(collector);

    let result = run_app(&mut terminal, &mut console, &mut traffic);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &result {
        eprintln!("Error: {}", err);
    }

    log::info!("Exiting logbubble-console");
    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    console: &mut LogConsole,
    traffic: &mut TrafficSource,
) -> anyhow::Result<()> {
    loop {
        traffic.tick();
        console.poll();

        terminal.draw(|frame| {
            let area = frame.area();
            render_host(frame, area);
            if console.is_visible() {
                let panel_area = panel_area(area);
                console.render(frame, panel_area);
            } else {
                console.render(frame, area);
            }
        })?;

        // Handle events
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                // Only process key press events (ignore key release)
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if console.handle_key(key) {
                    continue;
                }
                match key.code {
                    KeyCode::Char('q') => return Ok(()),
                    KeyCode::Char('y') => {
                        let text = console.export_text();
                        std::fs::write("logbubble-export.txt", text)?;
                        log::info!("exported visible logs to logbubble-export.txt");
                    }
                    _ => {}
                }
            }
        }
    }
}

/// The pretend host application behind the panel.
fn render_host(frame: &mut ratatui::Frame, area: Rect) {
    let lines = vec![
        Line::from("logbubble demo host"),
        Line::from(""),
        Line::from("space  open/close the log panel"),
        Line::from("c / n  filter console / network logs"),
        Line::from("j / k  move · enter: detail · x: clear · y: export"),
        Line::from("q      quit"),
    ];
    frame.render_widget(Paragraph::new(lines).style(Style::default()), area);
}

/// Panel floats over the lower-right portion of the host.
fn panel_area(area: Rect) -> Rect {
    let width = (area.width * 3 / 4).max(40).min(area.width);
    let height = (area.height * 2 / 3).max(10).min(area.height);
    Rect {
        x: area.right().saturating_sub(width),
        y: area.bottom().saturating_sub(height),
        width,
        height,
    }
}
