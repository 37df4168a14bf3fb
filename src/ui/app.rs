use crate::config::Config;
use crate::ui::conversation::{ConversationAction, ConversationManager};
use anyhow::Result;
use crossterm::{
    cursor::Show as ShowCursor,
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::{Backend, CrosstermBackend}, Terminal};
use std::io::{self, stdout};
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// RAII guard for terminal state restoration.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), LeaveAlternateScreen, ShowCursor);
    }
}

/// Run the chatbot widget until the user quits
pub async fn run_chat(config: &Config) -> Result<()> {
    let mut manager = ConversationManager::from_config(config);

    enable_raw_mode()?;
    let _guard = TerminalGuard;

    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    tracing::info!(initialized = manager.is_initialized(), "chat started");
    let result = run_loop(&mut terminal, &mut manager).await;

    terminal.show_cursor()?;
    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    manager: &mut ConversationManager,
) -> Result<()> {
    loop {
        manager.process_replies();
        draw(terminal, manager)?;

        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if manager.handle_key(key) == ConversationAction::Exit {
                    break;
                }
            }
        } else {
            // give spawned turns a chance to run on a current-thread runtime
            tokio::task::yield_now().await;
        }
    }

    tracing::info!(
        messages = manager.transcript().len(),
        pending = manager.pending_replies(),
        attributes = manager.session_attributes().len(),
        "chat closed"
    );
    Ok(())
}

fn draw<B: Backend>(terminal: &mut Terminal<B>, manager: &ConversationManager) -> io::Result<()> {
    terminal.draw(|frame| {
        let area = frame.size();
        manager.render(area, frame.buffer_mut());
    })?;
    Ok(())
}
