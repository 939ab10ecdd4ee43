//! 日志模块
//!
//! 所有与模块/目标相关的事件都通过这里输出为对齐的状态行：
//! `模块 | 目标 | 状态 | 详情`。

use std::fmt;

use log::{debug, error, info, warn};

/// 日志初始化
pub mod rlogger;

pub use rlogger::init_logger;

/// 模块列宽
pub const MODULE_WIDTH: usize = 26;
/// 目标列宽
pub const IP_WIDTH: usize = 18;
/// 状态列宽
pub const STATUS_WIDTH: usize = 18;

/// 状态关键字
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// 开始读取输入
    Load,
    /// 输入读取完成
    Loaded,
    /// 任务开始
    Started,
    /// 任务结束
    Complete,
    /// 名字解析成功
    Resolved,
    /// 扫描进程已启动
    Scanning,
    /// 扫描完成
    Finished,
    /// 已有结果，跳过
    Skipped,
    /// 单项失败
    Failed,
    /// 错误
    Error,
}

impl Status {
    /// 日志中使用的大写关键字
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Load => "LOAD",
            Status::Loaded => "LOADED",
            Status::Started => "STARTED",
            Status::Complete => "COMPLETE",
            Status::Resolved => "RESOLVED",
            Status::Scanning => "SCANNING",
            Status::Finished => "FINISHED",
            Status::Skipped => "SKIPPED",
            Status::Failed => "FAILED",
            Status::Error => "ERROR",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 使用 pad 以支持宽度对齐
        f.pad(self.as_str())
    }
}

/// 模块级状态行
pub fn status_line(module: &str, status: Status, detail: &str) -> String {
    format!(
        "{:<mw$} | {:<sw$} | {}",
        module,
        status,
        detail,
        mw = MODULE_WIDTH,
        sw = STATUS_WIDTH
    )
}

/// 目标级状态行
pub fn target_status_line(module: &str, target: &str, status: Status, detail: &str) -> String {
    format!(
        "{:<mw$} | {:<iw$} | {:<sw$} | {}",
        module,
        target,
        status,
        detail,
        mw = MODULE_WIDTH,
        iw = IP_WIDTH,
        sw = STATUS_WIDTH
    )
}

/// info 级模块状态
pub fn info_status(module: &str, status: Status, detail: &str) {
    info!("{}", status_line(module, status, detail));
}

/// error 级模块状态
pub fn error_status(module: &str, status: Status, detail: &str) {
    error!("{}", status_line(module, status, detail));
}

/// info 级目标状态
pub fn info_target(module: &str, target: &str, status: Status, detail: &str) {
    info!("{}", target_status_line(module, target, status, detail));
}

/// warn 级目标状态
pub fn warn_target(module: &str, target: &str, status: Status, detail: &str) {
    warn!("{}", target_status_line(module, target, status, detail));
}

/// error 级目标状态
pub fn error_target(module: &str, target: &str, status: Status, detail: &str) {
    error!("{}", target_status_line(module, target, status, detail));
}

/// debug 级目标状态
pub fn debug_target(module: &str, target: &str, status: Status, detail: &str) {
    debug!("{}", target_status_line(module, target, status, detail));
}
