//! Playback Adapter - 音频播放实现

mod command_player;

pub use command_player::{validate_template, CommandPlayer, PLACEHOLDER};
