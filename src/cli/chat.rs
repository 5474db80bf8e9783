//! Command handlers: interactive chat, share, history, show.

use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::config::ChatConfig;
use crate::credential::SessionMode;
use crate::error::{ChatError, Result};
use crate::history::HistoryStore;
use crate::session::{ChatSession, SendOutcome, SessionParts};
use crate::share;
use crate::storage::{FileKeyValueStore, KeyValueStore};
use crate::types::{BotConfig, ConversationId, Sender};

use super::terminal::{format_entry, format_message, PresetKey, StdinPrompt, TerminalView};
use super::{ChatArgs, ShareArgs};

const HELP: &str = "\
/new                 start a new conversation
/history             list conversations
/switch <id>         reopen a conversation
/share               print the share link for the current bot
/image <path>        post an image into the conversation
/config [field val]  show settings, or set name|persona|model|user-color|ai-color
/key <api key>       use a different API key
/quit                exit";

/// One line of REPL input.
#[derive(Debug, PartialEq, Eq)]
pub enum ReplCommand {
    Send(String),
    New,
    History,
    Switch(String),
    Share,
    Image(String),
    ShowConfig,
    SetConfig { field: String, value: String },
    Key(String),
    Help,
    Quit,
    Unknown(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(command) = line.strip_prefix('/') else {
            return Self::Send(line.to_string());
        };
        let (name, rest) = command
            .split_once(char::is_whitespace)
            .map(|(n, r)| (n, r.trim()))
            .unwrap_or((command, ""));

        match (name, rest) {
            ("new", _) => Self::New,
            ("history", _) => Self::History,
            ("switch", id) if !id.is_empty() => Self::Switch(id.to_string()),
            ("share", _) => Self::Share,
            ("image", path) if !path.is_empty() => Self::Image(path.to_string()),
            ("config", "") => Self::ShowConfig,
            ("config", args) => match args.split_once(char::is_whitespace) {
                Some((field, value)) => Self::SetConfig {
                    field: field.to_string(),
                    value: value.trim().to_string(),
                },
                None => Self::SetConfig {
                    field: args.to_string(),
                    value: String::new(),
                },
            },
            ("key", key) => Self::Key(key.to_string()),
            ("help", _) => Self::Help,
            ("quit" | "exit", _) => Self::Quit,
            _ => Self::Unknown(line.to_string()),
        }
    }
}

/// Set one named field on a copy of `bot`.
pub fn update_bot(bot: &BotConfig, field: &str, value: &str) -> Option<BotConfig> {
    let mut bot = bot.clone();
    let slot = match field {
        "name" => &mut bot.name,
        "persona" => &mut bot.persona,
        "model" => &mut bot.model,
        "user-color" => &mut bot.color_user,
        "ai-color" => &mut bot.color_ai,
        _ => return None,
    };
    *slot = value.to_string();
    Some(bot)
}

/// Handle `ikichat chat`.
pub async fn handle_chat(args: ChatArgs, config: &ChatConfig) -> Result<()> {
    let parts = SessionParts::from_config(config)?;
    let share_param = args.link.as_deref().and_then(share::extract_share_param);

    let mut view = TerminalView::new();
    let mut prompt = PresetKey::new(args.key.clone(), StdinPrompt);
    let mut session = ChatSession::open(parts, share_param.as_deref(), &mut prompt, &mut view)?;

    if let Some(ref key) = args.key {
        session.set_credential(key);
    }
    if args.overrides_bot() {
        session.save_config(args.apply_to(session.bot()))?;
    }

    match args.prompt {
        Some(prompt) => send_once(&mut session, &prompt, &mut view).await,
        None => repl(&mut session, &mut view).await,
    }
}

async fn send_once(session: &mut ChatSession, prompt: &str, view: &mut TerminalView) -> Result<()> {
    match session.send(prompt, view).await? {
        Some(SendOutcome::Replied(_)) => Ok(()),
        Some(SendOutcome::Failed(err)) => Err(err.into()),
        None if !session.has_credential() => Err(ChatError::Configuration(
            "no API key: pass --key or open a share link".to_string(),
        )),
        None => Ok(()),
    }
}

async fn repl(session: &mut ChatSession, view: &mut TerminalView) -> Result<()> {
    let bot = session.bot();
    println!("{} ({}). Type /help for commands.", bot.name, bot.model);
    if !session.has_credential() {
        println!("No API key yet. Set one with /key <api key>.");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let outcome = match ReplCommand::parse(&line) {
            ReplCommand::Quit => break,
            command => run_command(session, view, command).await,
        };
        if let Err(err) = outcome {
            debug!(category = ?err.category(), error = %err, "command failed");
            eprintln!("Error: {err}");
        }
    }
    Ok(())
}

async fn run_command(
    session: &mut ChatSession,
    view: &mut TerminalView,
    command: ReplCommand,
) -> Result<()> {
    match command {
        ReplCommand::Send(text) => {
            if text.is_empty() {
                return Ok(());
            }
            if session.send(&text, view).await?.is_none() {
                println!("No API key. Set one with /key <api key>.");
            }
        }
        ReplCommand::New => {
            let id = session.new_conversation(view);
            println!("New conversation {id}");
        }
        ReplCommand::History => {
            if session.mode() == SessionMode::Guided {
                println!("History is hidden for shared bots.");
            } else {
                view.print_history();
            }
        }
        ReplCommand::Switch(raw) => {
            let id: ConversationId = raw.parse().map_err(|_| {
                ChatError::Configuration(format!("'{raw}' is not a conversation id"))
            })?;
            session.switch(id, view)?;
        }
        ReplCommand::Share => println!("{}", session.share_link()?),
        ReplCommand::Image(path) => session.attach_image(Path::new(&path), view)?,
        ReplCommand::ShowConfig => print_bot(session.bot()),
        ReplCommand::SetConfig { field, value } => {
            let bot = update_bot(session.bot(), &field, &value).ok_or_else(|| {
                ChatError::Configuration(format!(
                    "unknown field '{field}' (name, persona, model, user-color, ai-color)"
                ))
            })?;
            let link = session.save_config(bot)?;
            println!("Saved. Share link: {link}");
        }
        ReplCommand::Key(key) => {
            session.set_credential(&key);
            if session.has_credential() {
                println!("API key set.");
            } else {
                println!("API key cleared.");
            }
        }
        ReplCommand::Help => println!("{HELP}"),
        ReplCommand::Unknown(line) => println!("Unknown command: {line}. Type /help."),
        ReplCommand::Quit => {}
    }
    Ok(())
}

fn print_bot(bot: &BotConfig) {
    println!("name        {}", bot.name);
    println!("model       {}", bot.model);
    println!("persona     {}", bot.persona);
    println!("user-color  {}", bot.color_user);
    println!("ai-color    {}", bot.color_ai);
}

fn open_history(config: &ChatConfig) -> Result<HistoryStore> {
    let backend: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::new(&config.data_dir));
    HistoryStore::load(backend)
}

/// Handle `ikichat share`.
pub fn handle_share(args: &ShareArgs, config: &ChatConfig) -> Result<()> {
    let base = args.base_url.as_deref().unwrap_or(&config.share_base_url);
    println!("{}", share::share_link(base, &args.bot())?);
    Ok(())
}

/// Handle `ikichat history`.
pub fn handle_history(config: &ChatConfig) -> Result<()> {
    let history = open_history(config)?;
    if history.is_empty() {
        println!("No saved conversations.");
    }
    for entry in history.list(None) {
        println!("{}", format_entry(&entry));
    }
    Ok(())
}

/// Handle `ikichat show <id>`.
pub fn handle_show(raw_id: &str, config: &ChatConfig) -> Result<()> {
    let id: ConversationId = raw_id
        .parse()
        .map_err(|_| ChatError::Configuration(format!("'{raw_id}' is not a conversation id")))?;
    let history = open_history(config)?;
    let conversation = history.get(id)?;
    let bot = BotConfig::default();

    println!("{}", conversation.title);
    for message in &conversation.messages {
        let color = match message.sender {
            Sender::User => &bot.color_user,
            Sender::Ai => &bot.color_ai,
        };
        println!("{}", format_message(message, color));
    }
    Ok(())
}
