//! 电机指令缓冲区
//!
//! 调用者线程写、控制线程读。使用 `ArcSwap` 整体替换指令，
//! 读端拿到的永远是某一次 `set` 的完整结果，不会看到新旧混合的值。

use crate::error::DriverError;
use arc_swap::ArcSwap;
use copter_protocol::MotorCommand;
use std::sync::Arc;

/// 最新电机指令（最后写入者获胜）
#[derive(Debug)]
pub struct CommandBuffer {
    motor_count: usize,
    current: ArcSwap<MotorCommand>,
}

impl CommandBuffer {
    /// 创建缓冲区，初始值为全零
    pub fn new(motor_count: usize) -> Self {
        Self {
            motor_count,
            current: ArcSwap::from_pointee(MotorCommand::zeros(motor_count)),
        }
    }

    pub fn motor_count(&self) -> usize {
        self.motor_count
    }

    /// 原子替换当前指令
    ///
    /// # 错误
    /// - `DriverError::Size`: 长度与电机数量不符（缓冲区保持不变）
    pub fn set(&self, values: &[f64]) -> Result<(), DriverError> {
        self.store(MotorCommand::from_slice(values))
    }

    /// 原子替换当前指令（已构造好的 `MotorCommand`）
    pub fn store(&self, command: MotorCommand) -> Result<(), DriverError> {
        if command.len() != self.motor_count {
            return Err(DriverError::Size {
                expected: self.motor_count,
                actual: command.len(),
            });
        }
        self.current.store(Arc::new(command));
        Ok(())
    }

    /// 当前指令的一致快照（无锁）
    pub fn snapshot(&self) -> Arc<MotorCommand> {
        self.current.load_full()
    }
}
