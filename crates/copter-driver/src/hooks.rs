//! 钩子系统（Hook System）
//!
//! 在控制线程收到遥测帧、发出电机指令或遇到单次迭代错误时触发自定义回调。
//!
//! # 设计原则
//!
//! - **非阻塞**: 回调运行在控制线程上，必须尽快返回，耗时工作交给 Channel
//! - **诊断通道**: 每次迭代内被吞掉的错误都会经 `on_link_error` 上报，不会静默丢失
//!
//! # 使用示例
//!
//! ```rust
//! use copter_driver::hooks::{HookManager, TelemetryCallback};
//! use copter_protocol::TelemetryFrame;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! struct Counter(AtomicU64);
//!
//! impl TelemetryCallback for Counter {
//!     fn on_telemetry(&self, _frame: &TelemetryFrame) {
//!         self.0.fetch_add(1, Ordering::Relaxed);
//!     }
//! }
//!
//! let counter = Arc::new(Counter(AtomicU64::new(0)));
//! let mut hooks = HookManager::new();
//! hooks.add_callback(counter.clone());
//!
//! hooks.trigger_all(&TelemetryFrame::default());
//! assert_eq!(counter.0.load(Ordering::Relaxed), 1);
//! ```

use crate::error::DriverError;
use copter_protocol::{MotorCommand, TelemetryFrame};
use std::sync::Arc;

/// 遥测回调 Trait
///
/// # 性能要求
///
/// - 运行在控制线程上，禁止阻塞（I/O、长时间持锁）
/// - 推荐使用 `crossbeam_channel::Sender::try_send` 转交给其他线程
pub trait TelemetryCallback: Send + Sync {
    /// 收到并解码一帧遥测时调用
    fn on_telemetry(&self, frame: &TelemetryFrame);

    /// 电机指令发送成功后调用（可选）
    ///
    /// 仅在 `send_to` 成功后触发。
    fn on_command_sent(&self, command: &MotorCommand) {
        let _ = command;
    }

    /// 单次迭代内的非致命错误（超时、格式错误、收发失败）
    fn on_link_error(&self, error: &DriverError) {
        let _ = error;
    }
}

/// 钩子管理器
///
/// 回调列表本身不是线程安全的，由 `ControlLoop` 通过 `RwLock<HookManager>` 保护。
#[derive(Default)]
pub struct HookManager {
    callbacks: Vec<Arc<dyn TelemetryCallback>>,
}

impl HookManager {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    pub fn add_callback(&mut self, callback: Arc<dyn TelemetryCallback>) {
        self.callbacks.push(callback);
    }

    /// 移除所有回调
    pub fn clear(&mut self) {
        self.callbacks.clear();
    }

    /// 触发遥测回调（控制线程，每收到一帧调用一次）
    pub fn trigger_all(&self, frame: &TelemetryFrame) {
        for callback in self.callbacks.iter() {
            callback.on_telemetry(frame);
        }
    }

    /// 触发发送回调
    pub fn trigger_all_sent(&self, command: &MotorCommand) {
        for callback in self.callbacks.iter() {
            callback.on_command_sent(command);
        }
    }

    /// 上报单次迭代错误
    pub fn trigger_error(&self, error: &DriverError) {
        for callback in self.callbacks.iter() {
            callback.on_link_error(error);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}
