//! 核心模块 - 配置、会话状态

pub mod config;
pub mod state;

pub use config::Config;
pub use state::SessionState;
