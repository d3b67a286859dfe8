//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod language;
pub mod playback;
pub mod storage;
pub mod tts;

pub use language::*;
pub use playback::*;
pub use storage::*;
pub use tts::*;
