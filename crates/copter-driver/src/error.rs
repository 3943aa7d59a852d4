//! 驱动层错误类型定义

use copter_protocol::ProtocolError;
use std::io;
use thiserror::Error;

/// 驱动层错误类型
///
/// 单次迭代内的错误（`Protocol`、`Timeout`、`Send`、`Receive`）只会被记录和上报，
/// 不会终止控制循环；其余错误在构造或调用时同步返回。
#[derive(Error, Debug)]
pub enum DriverError {
    /// 数据报格式错误（长度不是 8 的倍数，或遥测帧不是 88 字节）
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 接收超时（丢包时的正常现象）
    #[error("Receive timeout")]
    Timeout,

    /// 发送电机指令失败
    #[error("Send error: {0}")]
    Send(#[source] io::Error),

    /// 接收遥测时的其他 socket 错误
    #[error("Receive error: {0}")]
    Receive(#[source] io::Error),

    /// 无法绑定本地 UDP 端口
    #[error("Failed to bind UDP port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: io::Error,
    },

    /// 电机指令长度与链路配置不符
    #[error("Command size mismatch: expected {expected} motors, got {actual}")]
    Size { expected: usize, actual: usize },

    /// 主机地址无法解析
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// 配置无效
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// 控制循环已在运行
    #[error("Control loop already running")]
    AlreadyRunning,

    /// 控制循环已停止（终态）
    #[error("Control loop stopped")]
    Stopped,

    /// 其他 IO 错误（如创建指令 socket）
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// 控制线程错误
    #[error("IO thread error: {0}")]
    IoThread(String),
}

impl DriverError {
    /// 是否为致命错误
    ///
    /// 非致命错误只影响当前迭代，控制循环继续运行。
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            DriverError::Protocol(_)
                | DriverError::Timeout
                | DriverError::Send(_)
                | DriverError::Receive(_)
        )
    }

    /// 是否为超时
    pub fn is_timeout(&self) -> bool {
        matches!(self, DriverError::Timeout)
    }
}

/// 判断 IO 错误是否为读超时
///
/// Unix 上 `SO_RCVTIMEO` 到期返回 `WouldBlock`，Windows 上返回 `TimedOut`。
pub(crate) fn is_timeout_kind(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}
