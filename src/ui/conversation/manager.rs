use crate::config::{Config, LexConfig, LOCALE_ID};
use crate::events::Message;
use crate::lex::{
    ConversationClient, LexError, LexRuntimeClient, RecognizeTextRequest, RecognizeTextResponse,
    SessionAttributes, SessionState,
};
use crate::ui::conversation::{ComposerResult, ConversationComposer, ConversationHistory};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    widgets::Widget,
};
use std::sync::Arc;
use tokio::sync::mpsc;

pub const GREETING: &str = "Hello! How can I help you today?";
pub const NOT_INITIALIZED: &str = "Chatbot is not initialized. Please try again later.";
pub const CONNECTION_TROUBLE: &str = "Sorry, I am having trouble connecting. Please try again.";

/// Actions that can be requested by the conversation manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationAction {
    None,
    Exit,
}

type TurnResult = Result<RecognizeTextResponse, LexError>;

/// Chat widget state: transcript, input buffer and the session attributes
/// round-tripped with the conversational runtime.
///
/// Turns run as spawned tasks and report back over a channel, so several may
/// be in flight at once. Replies are applied in completion order.
pub struct ConversationManager {
    history: ConversationHistory,
    composer: ConversationComposer,
    client: Option<Arc<dyn ConversationClient>>,
    lex: LexConfig,
    session_attributes: SessionAttributes,
    reply_tx: mpsc::UnboundedSender<TurnResult>,
    reply_rx: mpsc::UnboundedReceiver<TurnResult>,
    pending: usize,
}

impl ConversationManager {
    pub fn new(client: Option<Arc<dyn ConversationClient>>, lex: LexConfig, placeholder: &str) -> Self {
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();
        let mut history = ConversationHistory::new();
        history.push(Message::bot(GREETING));

        Self {
            history,
            composer: ConversationComposer::new(placeholder),
            client,
            lex,
            session_attributes: SessionAttributes::new(),
            reply_tx,
            reply_rx,
            pending: 0,
        }
    }

    /// Build the widget with a runtime client for the configured endpoint. A
    /// client that cannot be built leaves the widget uninitialized.
    pub fn from_config(config: &Config) -> Self {
        let client = match LexRuntimeClient::new(&config.lex) {
            Ok(client) => {
                tracing::info!(
                    endpoint = client.endpoint(),
                    region = client.region(),
                    "conversational runtime configured"
                );
                Some(Arc::new(client) as Arc<dyn ConversationClient>)
            }
            Err(e) => {
                tracing::error!(error = %e, "conversational runtime unavailable");
                None
            }
        };

        Self::new(client, config.lex.clone(), &config.ui.placeholder)
    }

    /// Submit an utterance. Whitespace-only text is ignored outright.
    pub fn submit(&mut self, text: String) {
        if text.trim().is_empty() {
            return;
        }

        self.history.push(Message::user(text.clone()));
        self.composer.clear();

        let Some(client) = self.client.clone() else {
            tracing::warn!("message submitted before the conversational runtime was initialized");
            self.history.push(Message::bot(NOT_INITIALIZED));
            return;
        };

        let request = RecognizeTextRequest {
            bot_id: self.lex.bot_id.clone(),
            bot_alias_id: self.lex.bot_alias_id.clone(),
            locale_id: LOCALE_ID.to_string(),
            session_id: self.lex.session_id.clone(),
            text,
            session_state: SessionState::with_attributes(self.session_attributes.clone()),
        };

        let tx = self.reply_tx.clone();
        self.pending += 1;
        tokio::spawn(async move {
            let result = client.recognize_text(&request).await;
            let _ = tx.send(result);
        });
    }

    /// Apply every reply that has already arrived (called from the main loop)
    pub fn process_replies(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(result) = self.reply_rx.try_recv() {
            self.apply_reply(result);
            applied += 1;
        }
        applied
    }

    /// Wait for the next reply and apply it. Returns false when nothing is in flight.
    #[cfg(test)]
    pub async fn next_reply(&mut self) -> bool {
        if self.pending == 0 {
            return false;
        }
        match self.reply_rx.recv().await {
            Some(result) => {
                self.apply_reply(result);
                true
            }
            None => false,
        }
    }

    fn apply_reply(&mut self, result: TurnResult) {
        self.pending = self.pending.saturating_sub(1);

        match result.and_then(RecognizeTextResponse::into_turn) {
            Ok((reply, attributes)) => {
                tracing::debug!(attributes = attributes.len(), "bot replied");
                self.history.push(Message::bot(reply));
                self.session_attributes = attributes;
            }
            Err(e) => {
                tracing::error!(error = %e, kind = ?e.kind, "Error communicating with the conversational runtime");
                self.history.push(Message::bot(CONNECTION_TROUBLE));
            }
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: crossterm::event::KeyEvent) -> ConversationAction {
        match self.composer.handle_key(key) {
            ComposerResult::Submitted(input) => {
                self.submit(input);
                ConversationAction::None
            }
            ComposerResult::Exit => ConversationAction::Exit,
            ComposerResult::None => ConversationAction::None,
        }
    }

    pub fn transcript(&self) -> &[Message] {
        self.history.messages()
    }

    pub fn session_attributes(&self) -> &SessionAttributes {
        &self.session_attributes
    }

    #[cfg(test)]
    pub fn input(&self) -> &str {
        self.composer.content()
    }

    pub fn pending_replies(&self) -> usize {
        self.pending
    }

    pub fn is_initialized(&self) -> bool {
        self.client.is_some()
    }

    /// Render the conversation UI components
    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),    // Transcript
                Constraint::Length(3), // Composer
            ])
            .split(area);

        self.history.render(chunks[0], buf);
        self.composer.render(chunks[1], buf);
    }
}
