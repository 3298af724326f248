use log::{ error, info, warn };
use std::error::Error;
use std::io::{ self, Write };
use std::path::{ Path, PathBuf };
use std::sync::Arc;
use tokio::sync::mpsc;
use super::Context;
use crate::api::{ ApiError, ChatApi, HttpChatApi };
use crate::cli::HistoryCommand;
use crate::conversation::scroll::ScrollPolicy;
use crate::conversation::suggestions::load_suggestions;
use crate::conversation::{ Collaborators, ConversationEvent, ConversationManager, ExchangeOutcome };
use crate::history::format_transcript;
use crate::models::chat::ConversationMessage;
use crate::platform::{ copy_to_clipboard, read_line, toggle_speech, Confirm, NotificationKind, Notifier };
use crate::render::html::transcript_document;
use crate::render::TerminalRenderer;
use crate::session::{ get_or_create_session_id, session_stats };
use crate::text::{ format_message_date, format_timestamp };

type AppResult = Result<(), Box<dyn Error + Send + Sync>>;

/// One line typed at the chat prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Empty,
    Message(String),
    /// Zero-based index into the numbered list on screen.
    Suggestion(usize),
    Clear,
    Copy,
    Speak,
    Suggest,
    Export(Option<PathBuf>),
    Help,
    Quit,
    Unknown(String),
}

/// `choice_count` is the length of the numbered list currently on screen; with no list
/// shown a bare number is sent as a question.
pub fn parse_input(line: &str, choice_count: usize) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    if let Some(command) = line.strip_prefix('/') {
        let mut parts = command.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or_default().to_lowercase();
        let rest = parts.next().map(str::trim).filter(|s| !s.is_empty());
        return match name.as_str() {
            "clear" => Input::Clear,
            "copy" => Input::Copy,
            "speak" => Input::Speak,
            "suggest" | "suggestions" => Input::Suggest,
            "export" => Input::Export(rest.map(PathBuf::from)),
            "help" => Input::Help,
            "quit" | "exit" => Input::Quit,
            _ => Input::Unknown(name),
        };
    }
    match line.parse::<usize>() {
        Ok(n) if n >= 1 && n <= choice_count => Input::Suggestion(n - 1),
        _ => Input::Message(line.to_string()),
    }
}

const HELP: &str =
    "Type a question and press Enter. Commands: /clear /copy /speak /suggest /export [file] /help /quit";

/// Probes the backend and reports the result as a notification.
pub async fn check_health(api: &dyn ChatApi, notifier: &dyn Notifier) -> bool {
    match api.health().await {
        Ok(()) => {
            info!("Backend connection successful");
            notifier.notify(NotificationKind::Success, "Connected to server");
            true
        }
        Err(ApiError::Status { status, .. }) => {
            warn!("Backend returned status {}", status);
            notifier.notify(NotificationKind::Error, "Server connection issue");
            false
        }
        Err(e) => {
            error!("Cannot connect to backend: {}", e);
            notifier.notify(
                NotificationKind::Error,
                &format!("Cannot connect to server. Make sure the backend is reachable at {}", api.base_url())
            );
            false
        }
    }
}

fn chat_api(ctx: &Context) -> Result<Arc<dyn ChatApi>, ApiError> {
    Ok(Arc::new(HttpChatApi::from_config(&ctx.api_config)?))
}

async fn open_conversation(
    ctx: &Context,
    api: Arc<dyn ChatApi>,
    confirm: Arc<dyn Confirm>
) -> Result<ConversationManager, Box<dyn Error + Send + Sync>> {
    let session_id = get_or_create_session_id(ctx.store.as_ref(), ctx.clock.as_ref()).await?;
    let deps = Collaborators {
        api,
        history: ctx.history(),
        notifier: ctx.notifier.clone(),
        confirm,
        clock: ctx.clock.clone(),
    };
    Ok(ConversationManager::new(deps, session_id, ScrollPolicy::new(ctx.args.scroll_threshold)))
}

async fn exchange<W: Write>(
    manager: &mut ConversationManager,
    renderer: &mut TerminalRenderer<W>,
    rx: &mut mpsc::UnboundedReceiver<ConversationEvent>,
    text: &str
) -> io::Result<Option<ExchangeOutcome>> {
    let pending = match manager.begin_exchange(text) {
        Ok(Some(pending)) => pending,
        Ok(None) => {
            return Ok(None);
        }
        Err(e) => {
            warn!("Not sending: {}", e);
            return Ok(None);
        }
    };
    // Show the question and the thinking line before waiting on the network.
    renderer.drain(rx)?;
    let result = manager.request_answer(pending.question()).await;
    let outcome = manager.complete_exchange(pending, result).await;
    renderer.drain(rx)?;
    Ok(Some(outcome))
}

async fn export_html(messages: &[ConversationMessage], output: Option<&Path>, ctx: &Context) -> AppResult {
    let title = format!("Chat history - {}", ctx.clock.now().format("%B %-d, %Y"));
    let document = transcript_document(&title, messages);
    match output {
        Some(path) => {
            tokio::fs::write(path, document).await?;
            ctx.notifier.notify(NotificationKind::Success, &format!("Transcript written to {}", path.display()));
        }
        None => {
            print!("{}", document);
        }
    }
    Ok(())
}

/// Interactive session: restores history, then reads questions until `/quit` or EOF.
pub async fn run_chat(ctx: &Context) -> AppResult {
    let api = chat_api(ctx)?;
    let (_, suggestions) = futures::join!(
        check_health(api.as_ref(), ctx.notifier.as_ref()),
        load_suggestions(api.as_ref())
    );
    let mut manager = open_conversation(ctx, api, ctx.confirm(false)).await?;
    let mut rx = manager.subscribe();
    let mut renderer = TerminalRenderer::new(io::stdout(), suggestions);
    info!("Chat session {}", manager.session_id());

    if manager.restore().await == 0 {
        renderer.show_welcome()?;
    }
    renderer.drain(&mut rx)?;
    let clipboard = ctx.clipboard();
    let speech = ctx.speech();

    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = read_line().await? else {
            break;
        };
        match parse_input(&line, renderer.choices().len()) {
            Input::Empty => {}
            Input::Quit => {
                break;
            }
            Input::Message(text) => {
                exchange(&mut manager, &mut renderer, &mut rx, &text).await?;
            }
            Input::Suggestion(index) => {
                let text = renderer.choices()[index].clone();
                exchange(&mut manager, &mut renderer, &mut rx, &text).await?;
            }
            Input::Clear => {
                manager.clear().await;
            }
            Input::Copy => match manager.last_answer() {
                Some(message) => {
                    copy_to_clipboard(clipboard.as_ref(), ctx.notifier.as_ref(), &message.text).await;
                }
                None => ctx.notifier.notify(NotificationKind::Info, "Nothing to copy yet"),
            }
            Input::Speak => match manager.last_answer() {
                Some(message) => {
                    toggle_speech(speech.as_ref(), ctx.notifier.as_ref(), &message.text).await;
                }
                None => ctx.notifier.notify(NotificationKind::Info, "Nothing to read yet"),
            }
            Input::Suggest => renderer.show_welcome()?,
            Input::Export(path) => {
                if let Err(e) = export_html(manager.messages(), path.as_deref(), ctx).await {
                    error!("Export failed: {}", e);
                    ctx.notifier.notify(NotificationKind::Error, "Export failed");
                }
            }
            Input::Help => println!("{}", HELP),
            Input::Unknown(name) => {
                ctx.notifier.notify(NotificationKind::Warning, &format!("Unknown command: /{}", name));
            }
        }
        renderer.drain(&mut rx)?;
    }
    speech.stop().await;
    Ok(())
}

/// Single exchange from the command line; it becomes part of the persisted history.
pub async fn run_ask(ctx: &Context, question: &str) -> AppResult {
    let api = chat_api(ctx)?;
    let mut manager = open_conversation(ctx, api, ctx.confirm(false)).await?;
    manager.restore().await;
    let mut rx = manager.subscribe();
    let mut renderer = TerminalRenderer::new(io::stdout(), Vec::new());
    match exchange(&mut manager, &mut renderer, &mut rx, question).await? {
        Some(ExchangeOutcome::Failed) => Err("no answer from backend".into()),
        Some(_) => Ok(()),
        None => Err("question is empty".into()),
    }
}

pub async fn run_suggestions(ctx: &Context) -> AppResult {
    let api = chat_api(ctx)?;
    for (i, suggestion) in load_suggestions(api.as_ref()).await.iter().enumerate() {
        println!("{}. {}", i + 1, suggestion);
    }
    Ok(())
}

pub async fn run_health(ctx: &Context) -> AppResult {
    let api = chat_api(ctx)?;
    if check_health(api.as_ref(), ctx.notifier.as_ref()).await {
        Ok(())
    } else {
        Err(format!("backend at {} is not healthy", api.base_url()).into())
    }
}

pub async fn run_history(ctx: &Context, action: &HistoryCommand) -> AppResult {
    let history = ctx.history();
    match action {
        HistoryCommand::Show => {
            let messages = history.load().await;
            if messages.is_empty() {
                println!("No chat history.");
            } else {
                print!("{}", format_transcript(&messages));
            }
        }
        HistoryCommand::Stats => {
            let stats = history.stats().await?;
            println!("Messages:           {}", stats.total_messages);
            println!("  from you:         {}", stats.user_messages);
            println!("  from assistant:   {}", stats.assistant_messages);
            let today = ctx.clock.now().date_naive();
            match stats.last_save {
                Some(t) =>
                    println!(
                        "Last saved:         {}, {}",
                        format_message_date(t.date_naive(), today),
                        format_timestamp(&t)
                    ),
                None => println!("Last saved:         never"),
            }
        }
        HistoryCommand::Export { output } => {
            let messages = history.load().await;
            export_html(&messages, output.as_deref(), ctx).await?;
        }
        HistoryCommand::Clear { yes } => {
            let api = chat_api(ctx)?;
            let mut manager = open_conversation(ctx, api, ctx.confirm(*yes)).await?;
            manager.restore().await;
            if !manager.clear().await {
                println!("Chat history kept.");
            }
        }
    }
    Ok(())
}

pub async fn run_session(ctx: &Context) -> AppResult {
    let stats = session_stats(ctx.store.as_ref(), ctx.clock.as_ref()).await?;
    println!("Session id:  {}", stats.session_id);
    println!("Started:     {}", stats.started_at.to_rfc2822());
    println!("Messages:    {}", stats.messages_count);
    Ok(())
}
