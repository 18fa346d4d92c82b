use futures::stream::StreamExt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::BroadcastStream;

use crate::{
    auth::AuthFlow,
    chat::chat_dto::SendMessageRequest,
    console::types::{ClientCommand, ConsoleMessage},
    error::{AppError, Result},
    state::AppState,
};

/// One interactive session: the login state machine plus access to the store.
pub struct ConsoleSession {
    state: AppState,
    auth: AuthFlow,
}

impl ConsoleSession {
    pub fn new(state: AppState) -> Self {
        let auth = AuthFlow::new(state.auth_service.clone());
        Self { state, auth }
    }

    /// Parse and execute one command line.
    pub async fn handle_line(&mut self, text: &str) -> Result<ConsoleMessage> {
        let command: ClientCommand = serde_json::from_str(text)
            .map_err(|e| AppError::BadRequest(format!("Invalid command format: {}", e)))?;
        self.dispatch(command).await
    }

    pub async fn dispatch(&mut self, command: ClientCommand) -> Result<ConsoleMessage> {
        match command {
            ClientCommand::SubmitPhone { phone } => {
                let outcome = self.auth.submit_phone(&phone).await.map(|_| ());
                self.auth_reply(outcome)
            }
            ClientCommand::SubmitPassword { password } => {
                let outcome = self.auth.submit_password(&password).await.map(|_| ());
                self.auth_reply(outcome)
            }
            ClientCommand::GoToRegister => {
                let outcome = self.auth.go_to_register();
                self.auth_reply(outcome)
            }
            ClientCommand::Back => {
                let outcome = self.auth.back();
                self.auth_reply(outcome)
            }
            ClientCommand::SubmitRegister(request) => {
                let outcome = self.auth.submit_register(request).await.map(|_| ());
                self.auth_reply(outcome)
            }
            ClientCommand::Logout => {
                let outcome = self.auth.logout().await;
                self.auth_reply(outcome)
            }
            ClientCommand::Search { query } => {
                self.auth.require_user()?;
                let users = self.state.user_service.search_contacts(&query).await;
                Ok(ConsoleMessage::SearchResults { users })
            }
            ClientCommand::OpenChat { user_id } => {
                let me = self.auth.require_user()?.id;
                let chat = self.state.chat_service.open_chat(me, user_id).await?;
                Ok(ConsoleMessage::ChatOpened { chat })
            }
            ClientCommand::SendMessage {
                chat_id,
                text,
                attachment,
            } => {
                let me = self.auth.require_user()?.id;
                let message = self
                    .state
                    .chat_service
                    .send_message(me, chat_id, SendMessageRequest { text, attachment })
                    .await?;
                Ok(ConsoleMessage::MessageSent { chat_id, message })
            }
            ClientCommand::MarkRead { chat_id } => {
                let me = self.auth.require_user()?.id;
                self.state.chat_service.mark_read(me, chat_id).await?;
                let chats = self.state.chat_service.get_conversations(me).await;
                Ok(ConsoleMessage::Chats { chats })
            }
            ClientCommand::ListChats => {
                let me = self.auth.require_user()?.id;
                let chats = self.state.chat_service.get_conversations(me).await;
                Ok(ConsoleMessage::Chats { chats })
            }
            ClientCommand::Snapshot => Ok(ConsoleMessage::Snapshot(self.state.store.snapshot().await)),
        }
    }

    /// Failures the flow already shows in its error field come back as auth state.
    fn auth_reply(&self, outcome: Result<()>) -> Result<ConsoleMessage> {
        let state = self.auth.state();
        match outcome {
            Ok(()) => Ok(ConsoleMessage::AuthState(state)),
            Err(_) if state.error.is_some() => Ok(ConsoleMessage::AuthState(state)),
            Err(e) => Err(e),
        }
    }
}

/// Runs a session over line-delimited JSON until the reader hits EOF.
/// Store events are forwarded to the writer as they happen.
pub async fn run_console<R, W>(state: AppState, reader: R, mut writer: W)
where
    R: AsyncBufRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<ConsoleMessage>();

    // Spawn task to write outgoing messages
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let Ok(mut line) = serde_json::to_string(&msg) else {
                continue;
            };
            line.push('\n');
            if writer.write_all(line.as_bytes()).await.is_err() || writer.flush().await.is_err() {
                break;
            }
        }
    });

    // Spawn task to forward store changes
    let events_tx = tx.clone();
    let mut events = BroadcastStream::new(state.store.subscribe());
    let event_task = tokio::spawn(async move {
        while let Some(item) = events.next().await {
            match item {
                Ok(event) => {
                    if events_tx.send(ConsoleMessage::StoreEvent { event }).is_err() {
                        break;
                    }
                }
                Err(e) => tracing::warn!("Console fell behind on store events: {}", e),
            }
        }
    });

    // Spawn task to read commands
    let mut recv_task = tokio::spawn(async move {
        let mut session = ConsoleSession::new(state);
        let mut lines = reader.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            let reply = match session.handle_line(&line).await {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::error!("Error processing command: {}", e);
                    ConsoleMessage::error(e.user_message())
                }
            };
            if tx.send(reply).is_err() {
                break;
            }
        }
    });

    let writer_closed = tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
            true
        }
        _ = &mut recv_task => false,
    };

    // Dropping the last senders lets the writer drain what is queued.
    event_task.abort();
    let _ = event_task.await;
    if !writer_closed {
        let _ = send_task.await;
    }

    tracing::info!("Console session closed");
}
