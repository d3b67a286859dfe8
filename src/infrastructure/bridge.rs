//! Chat Bridge - 标准输入聊天桥
//!
//! 代替聊天机器人层，从按行输入读取消息:
//!
//! ```text
//! alice: hello world
//! #rust bob: anyone around?
//! alice: .mute
//! ```
//!
//! 支持的命令: `.mute`, `.unmute`, `.myvoice`

use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::application::{ControlCommand, Controller, Ingress, VoiceCatalog};

/// 聊天命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCommand {
    Mute,
    Unmute,
    MyVoice,
}

impl ChatCommand {
    fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            ".mute" => Some(Self::Mute),
            ".unmute" => Some(Self::Unmute),
            ".myvoice" => Some(Self::MyVoice),
            _ => None,
        }
    }
}

/// 解析后的一行输入
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatLine {
    Message {
        channel: Option<String>,
        speaker: String,
        text: String,
    },
    Command {
        channel: Option<String>,
        speaker: String,
        command: ChatCommand,
    },
}

/// 解析 `[#channel ]nick: text`
pub fn parse_line(line: &str) -> Option<ChatLine> {
    let line = line.trim();
    let (channel, rest) = match line.strip_prefix('#') {
        Some(after) => {
            let (name, rest) = after.split_once(char::is_whitespace)?;
            (Some(format!("#{}", name)), rest.trim_start())
        }
        None => (None, line),
    };

    let (speaker, text) = rest.split_once(':')?;
    let speaker = speaker.trim();
    let text = text.trim();
    if speaker.is_empty() || speaker.contains(char::is_whitespace) || text.is_empty() {
        return None;
    }

    let speaker = speaker.to_string();
    Some(match ChatCommand::parse(text) {
        Some(command) => ChatLine::Command {
            channel,
            speaker,
            command,
        },
        None => ChatLine::Message {
            channel,
            speaker,
            text: text.to_string(),
        },
    })
}

/// 聊天桥
pub struct ChatBridge {
    ingress: Ingress,
    controller: Controller,
    catalog: Arc<VoiceCatalog>,
    default_language: String,
    prefer_premium: bool,
}

impl ChatBridge {
    pub fn new(
        ingress: Ingress,
        controller: Controller,
        catalog: Arc<VoiceCatalog>,
        default_language: impl Into<String>,
        prefer_premium: bool,
    ) -> Self {
        Self {
            ingress,
            controller,
            catalog,
            default_language: default_language.into(),
            prefer_premium,
        }
    }

    /// 处理一行输入，返回需要回复的内容
    pub fn handle(&self, line: ChatLine) -> Option<String> {
        match line {
            ChatLine::Message {
                channel,
                speaker,
                text,
            } => {
                self.ingress.accept(&text, &speaker, channel.as_deref());
                None
            }
            ChatLine::Command {
                speaker, command, ..
            } => Some(self.command(&speaker, command)),
        }
    }

    fn command(&self, speaker: &str, command: ChatCommand) -> String {
        let control = match command {
            ChatCommand::Mute => ControlCommand::Mute,
            ChatCommand::Unmute => ControlCommand::Unmute,
            ChatCommand::MyVoice => {
                return match self
                    .catalog
                    .voice_for(speaker, &self.default_language, self.prefer_premium)
                {
                    Ok(voice) => format!(
                        "{}: your voice is {} ({})",
                        speaker,
                        voice.name(),
                        voice.profile().language
                    ),
                    Err(e) => format!("{}: {}", speaker, e),
                };
            }
        };

        match self.controller.handle(speaker, control) {
            Ok(()) if control == ControlCommand::Mute => "Muted.".to_string(),
            Ok(()) => "Unmuted.".to_string(),
            Err(e) => {
                tracing::warn!(speaker = %speaker, error = %e, "Rejected control command");
                format!("{}: you are not allowed to do that", speaker)
            }
        }
    }

    /// 逐行读取直到输入结束
    pub async fn run<R>(self, reader: R) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            match parse_line(&line) {
                Some(parsed) => {
                    if let Some(reply) = self.handle(parsed) {
                        println!("{}", reply);
                    }
                }
                None => tracing::debug!(line = %line, "Ignoring malformed line"),
            }
        }
        tracing::info!("Chat input closed");
        Ok(())
    }
}
