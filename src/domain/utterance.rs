//! Utterance - 一条待朗读的聊天消息

use serde::{Deserialize, Serialize};

/// 待朗读消息
///
/// 消息到达时创建，被流水线消费一次，不可修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    text: String,
    speaker: String,
    channel: Option<String>,
}

impl Utterance {
    pub fn new(
        text: impl Into<String>,
        speaker: impl Into<String>,
        channel: Option<String>,
    ) -> Self {
        Self {
            text: text.into(),
            speaker: speaker.into(),
            channel,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn speaker(&self) -> &str {
        &self.speaker
    }

    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }
}
