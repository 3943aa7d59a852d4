//! # Copter Protocol
//!
//! 多旋翼模拟器 UDP 链路的线格式定义（无 socket 依赖）
//!
//! ## 模块
//!
//! - `codec`: f64 序列 ↔ 字节的编解码
//! - `command`: 电机指令（客户端 → 模拟器）
//! - `telemetry`: 遥测帧（模拟器 → 客户端）
//! - `constants`: 协议常量与默认端点
//!
//! ## 字节序
//!
//! 所有数值均为 IEEE-754 双精度，小端字节序（低位在前），无帧头。
//!
//! ```text
//! 指令数据报: [f64 LE] x N        (8*N 字节, N = 电机数量)
//! 遥测数据报: [f64 LE] x 11       (固定 88 字节)
//! ```

pub mod codec;
pub mod command;
pub mod constants;
pub mod telemetry;

// 重新导出常用类型
pub use command::{MotorCommand, MotorValues};
pub use constants::*;
pub use telemetry::TelemetryFrame;

use thiserror::Error;

/// 协议解析错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// 缓冲区长度不是 8 的整数倍
    #[error("Malformed buffer: length {len} is not a multiple of 8")]
    Format { len: usize },

    /// 遥测数据报长度不对
    #[error("Invalid frame length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// 输出缓冲区不够大
    #[error("Buffer too small: need {needed}, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },
}
