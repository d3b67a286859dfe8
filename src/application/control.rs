//! Control - 全局静音开关
//!
//! 静音标志是唯一跨任务共享的可变状态:
//! 控制命令以 Release 写入，接入边界以 Acquire 读取。

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControlError {
    #[error("{0} is not allowed to use control commands")]
    Unauthorized(String),
}

/// 控制命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Mute,
    Unmute,
}

/// 全局静音开关
#[derive(Debug, Clone, Default)]
pub struct MuteSwitch {
    muted: Arc<AtomicBool>,
}

impl MuteSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mute(&self) {
        self.muted.store(true, Ordering::Release);
    }

    pub fn unmute(&self) {
        self.muted.store(false, Ordering::Release);
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Acquire)
    }
}

/// 控制命令处理器，只接受管理员
#[derive(Debug, Clone)]
pub struct Controller {
    switch: MuteSwitch,
    admins: HashSet<String>,
}

impl Controller {
    pub fn new(switch: MuteSwitch, admins: &[String]) -> Self {
        Self {
            switch,
            admins: admins.iter().map(|a| a.trim().to_lowercase()).collect(),
        }
    }

    pub fn is_admin(&self, caller: &str) -> bool {
        self.admins.contains(&caller.trim().to_lowercase())
    }

    pub fn handle(&self, caller: &str, command: ControlCommand) -> Result<(), ControlError> {
        if !self.is_admin(caller) {
            tracing::warn!(caller = %caller, command = ?command, "Unauthorized control command");
            return Err(ControlError::Unauthorized(caller.to_string()));
        }

        match command {
            ControlCommand::Mute => self.switch.mute(),
            ControlCommand::Unmute => self.switch.unmute(),
        }
        tracing::info!(caller = %caller, command = ?command, "Control command applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_can_toggle() {
        let switch = MuteSwitch::new();
        let controller = Controller::new(switch.clone(), &["Root".to_string()]);

        assert!(!switch.is_muted());
        controller.handle("root", ControlCommand::Mute).unwrap();
        assert!(switch.is_muted());
        controller.handle("ROOT", ControlCommand::Unmute).unwrap();
        assert!(!switch.is_muted());
    }

    #[test]
    fn test_non_admin_is_rejected() {
        let switch = MuteSwitch::new();
        let controller = Controller::new(switch.clone(), &["root".to_string()]);

        assert_eq!(
            controller.handle("mallory", ControlCommand::Mute),
            Err(ControlError::Unauthorized("mallory".to_string()))
        );
        assert!(!switch.is_muted());
    }
}
