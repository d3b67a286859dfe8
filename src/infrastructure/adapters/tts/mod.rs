//! TTS Adapter - 语音合成提供方实现

mod espeak_client;
mod fake_tts_client;
mod google_tts_client;

pub use espeak_client::{parse_voice_list, EspeakClient, EspeakClientConfig};
pub use fake_tts_client::{
    fake_profile, FakeSpeechProvider, FakeSpeechProviderConfig, RecordedSynthesis,
};
pub use google_tts_client::*;
