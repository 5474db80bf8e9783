//! CLI entry point for ikichat.

pub mod chat;
pub mod terminal;

use clap::{Parser, Subcommand};

use crate::config::ChatConfig;
use crate::error::Result;
use crate::types::bot::{DEFAULT_AI_COLOR, DEFAULT_BOT_NAME, DEFAULT_MODEL, DEFAULT_USER_COLOR};
use crate::types::BotConfig;

/// ikichat CLI
#[derive(Parser, Debug)]
#[command(name = "ikichat", version, about = "Persona chat for Gemini, OpenAI and Groq")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chat interactively, or send a single prompt
    Chat(ChatArgs),
    /// Print a share link for a bot configuration
    Share(ShareArgs),
    /// List saved conversations, newest first
    History,
    /// Print one saved conversation
    Show(ShowArgs),
}

/// Arguments for the `chat` subcommand.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// Share link (or bare `c` value) to open in guided mode
    #[arg(short, long)]
    pub link: Option<String>,

    /// Model id, e.g. gemini-1.5-flash, gpt-4o, llama3-70b-8192
    #[arg(short, long)]
    pub model: Option<String>,

    /// Persona instruction sent with every message
    #[arg(short, long)]
    pub persona: Option<String>,

    /// Bot display name
    #[arg(short, long)]
    pub name: Option<String>,

    /// API key for this session
    #[arg(short, long)]
    pub key: Option<String>,

    /// Send one prompt and exit (positional)
    pub prompt: Option<String>,
}

impl ChatArgs {
    /// Whether any bot setting was given on the command line.
    pub fn overrides_bot(&self) -> bool {
        self.model.is_some() || self.persona.is_some() || self.name.is_some()
    }

    /// Apply command-line settings on top of `bot`.
    pub fn apply_to(&self, bot: &BotConfig) -> BotConfig {
        let mut bot = bot.clone();
        if let Some(ref model) = self.model {
            bot.model = model.clone();
        }
        if let Some(ref persona) = self.persona {
            bot.persona = persona.clone();
        }
        if let Some(ref name) = self.name {
            bot.name = name.clone();
        }
        bot
    }
}

/// Arguments for `ikichat share`.
#[derive(Parser, Debug)]
pub struct ShareArgs {
    #[arg(short, long, default_value = DEFAULT_BOT_NAME)]
    pub name: String,

    #[arg(short, long, default_value = "")]
    pub persona: String,

    #[arg(short, long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Color of the user's messages
    #[arg(long, default_value = DEFAULT_USER_COLOR)]
    pub user_color: String,

    /// Color of the bot's messages
    #[arg(long, default_value = DEFAULT_AI_COLOR)]
    pub ai_color: String,

    /// Page the link points at (defaults to the configured share base URL)
    #[arg(long)]
    pub base_url: Option<String>,
}

impl ShareArgs {
    pub fn bot(&self) -> BotConfig {
        BotConfig {
            name: self.name.clone(),
            persona: self.persona.clone(),
            model: self.model.clone(),
            color_user: self.user_color.clone(),
            color_ai: self.ai_color.clone(),
        }
    }
}

/// Arguments for `ikichat show`.
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Conversation id as listed by `ikichat history`
    pub id: String,
}

/// Run one parsed command.
pub async fn run(command: Commands, config: ChatConfig) -> Result<()> {
    match command {
        Commands::Chat(args) => chat::handle_chat(args, &config).await,
        Commands::Share(args) => chat::handle_share(&args, &config),
        Commands::History => chat::handle_history(&config),
        Commands::Show(args) => chat::handle_show(&args.id, &config),
    }
}
