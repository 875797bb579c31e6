//! Worker Layer - Voice Session Processing
//!
//! 实现 SessionWorker，驱动每个语音会话的状态机

mod session_worker;

pub use session_worker::{Attempt, PlaybackStarted, SessionWorker, SessionWorkerConfig};
