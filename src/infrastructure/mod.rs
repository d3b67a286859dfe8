//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现，以及后台 Worker 与聊天输入桥

pub mod adapters;
pub mod bridge;
pub mod worker;

pub use bridge::{parse_line, ChatBridge, ChatCommand, ChatLine};
pub use worker::{
    Pipeline, PipelineConfig, PipelineHandle, PlaybackWorker, PlaybackWorkerConfig,
    SynthesisWorker, SynthesisWorkerConfig, WorkerState,
};
