//! Ingress - 消息接入边界
//!
//! 聊天层每收到一条消息调用一次 `accept`，过滤后投入文本队列。
//! 队列满时丢弃消息，不阻塞聊天层。

use std::collections::HashSet;
use tokio::sync::mpsc;

use crate::application::control::MuteSwitch;
use crate::domain::Utterance;

/// 过滤规则
#[derive(Debug, Clone, Default)]
pub struct FilterRules {
    /// 机器人自己的昵称
    pub bot_nick: Option<String>,
    /// 静音昵称（不区分大小写）
    pub muted_nicks: Vec<String>,
    /// 静音频道（不区分大小写）
    pub muted_channels: Vec<String>,
    /// 命令前缀，以此开头的消息不朗读
    pub muted_prefixes: Vec<String>,
}

/// 过滤原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Muted,
    OwnMessage,
    MutedNick,
    MutedChannel,
    CommandPrefix,
    QueueFull,
    Closed,
}

/// 消息接入端
#[derive(Debug, Clone)]
pub struct Ingress {
    sender: mpsc::Sender<Utterance>,
    switch: MuteSwitch,
    bot_nick: Option<String>,
    muted_nicks: HashSet<String>,
    muted_channels: HashSet<String>,
    muted_prefixes: Vec<String>,
}

impl Ingress {
    pub fn new(sender: mpsc::Sender<Utterance>, switch: MuteSwitch, rules: FilterRules) -> Self {
        let lower = |items: &[String]| -> HashSet<String> {
            items.iter().map(|s| s.trim().to_lowercase()).collect()
        };
        Self {
            sender,
            switch,
            bot_nick: rules.bot_nick.map(|n| n.trim().to_lowercase()),
            muted_nicks: lower(&rules.muted_nicks),
            muted_channels: lower(&rules.muted_channels),
            muted_prefixes: rules
                .muted_prefixes
                .into_iter()
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// 接收一条聊天消息，返回是否已入队
    pub fn accept(&self, text: &str, speaker: &str, channel: Option<&str>) -> bool {
        match self.try_accept(text, speaker, channel) {
            Ok(()) => true,
            Err(reason) => {
                tracing::debug!(speaker = %speaker, reason = ?reason, "Message filtered");
                false
            }
        }
    }

    /// 同 `accept`，但返回过滤原因
    pub fn try_accept(
        &self,
        text: &str,
        speaker: &str,
        channel: Option<&str>,
    ) -> Result<(), Rejection> {
        self.check(text, speaker, channel)?;

        let utterance = Utterance::new(text, speaker, channel.map(str::to_string));
        match self.sender.try_send(utterance) {
            Ok(()) => {
                tracing::info!(speaker = %speaker, "Speaking for");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(speaker = %speaker, "Text queue full, dropping message");
                Err(Rejection::QueueFull)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!(speaker = %speaker, "Pipeline closed, dropping message");
                Err(Rejection::Closed)
            }
        }
    }

    fn check(&self, text: &str, speaker: &str, channel: Option<&str>) -> Result<(), Rejection> {
        if self.switch.is_muted() {
            return Err(Rejection::Muted);
        }

        let speaker = speaker.trim().to_lowercase();
        if self.bot_nick.as_deref() == Some(speaker.as_str()) {
            return Err(Rejection::OwnMessage);
        }
        if self.muted_nicks.contains(&speaker) {
            return Err(Rejection::MutedNick);
        }
        if let Some(channel) = channel {
            if self.muted_channels.contains(&channel.trim().to_lowercase()) {
                return Err(Rejection::MutedChannel);
            }
        }
        if self
            .muted_prefixes
            .iter()
            .any(|prefix| text.starts_with(prefix.as_str()))
        {
            return Err(Rejection::CommandPrefix);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> FilterRules {
        FilterRules {
            bot_nick: Some("VoxBot".to_string()),
            muted_nicks: vec!["Spammer".to_string()],
            muted_channels: vec!["#quiet".to_string()],
            muted_prefixes: vec![".".to_string(), "!".to_string()],
        }
    }

    #[tokio::test]
    async fn test_accepted_message_is_queued() {
        let (tx, mut rx) = mpsc::channel(4);
        let ingress = Ingress::new(tx, MuteSwitch::new(), rules());

        assert!(ingress.accept("hello world", "alice", Some("#general")));

        let utterance = rx.try_recv().unwrap();
        assert_eq!(utterance.text(), "hello world");
        assert_eq!(utterance.speaker(), "alice");
        assert_eq!(utterance.channel(), Some("#general"));
    }

    #[tokio::test]
    async fn test_filter_rules() {
        let (tx, mut rx) = mpsc::channel(4);
        let ingress = Ingress::new(tx, MuteSwitch::new(), rules());

        assert_eq!(
            ingress.try_accept("hi", "voxbot", None),
            Err(Rejection::OwnMessage)
        );
        assert_eq!(
            ingress.try_accept("hi", "SPAMMER", None),
            Err(Rejection::MutedNick)
        );
        assert_eq!(
            ingress.try_accept("hi", "alice", Some("#Quiet")),
            Err(Rejection::MutedChannel)
        );
        assert_eq!(
            ingress.try_accept(".myvoice", "alice", None),
            Err(Rejection::CommandPrefix)
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_mute_switch_blocks_everything() {
        let (tx, mut rx) = mpsc::channel(4);
        let switch = MuteSwitch::new();
        let ingress = Ingress::new(tx, switch.clone(), rules());

        switch.mute();
        assert_eq!(
            ingress.try_accept("hello", "alice", None),
            Err(Rejection::Muted)
        );
        switch.unmute();
        assert!(ingress.accept("hello", "alice", None));
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_full_queue_drops_message() {
        let (tx, _rx) = mpsc::channel(1);
        let ingress = Ingress::new(tx, MuteSwitch::new(), FilterRules::default());

        assert!(ingress.accept("one", "alice", None));
        assert_eq!(
            ingress.try_accept("two", "alice", None),
            Err(Rejection::QueueFull)
        );
    }

    #[tokio::test]
    async fn test_closed_queue_drops_message() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let ingress = Ingress::new(tx, MuteSwitch::new(), FilterRules::default());
        assert_eq!(
            ingress.try_accept("hello", "alice", None),
            Err(Rejection::Closed)
        );
    }
}
