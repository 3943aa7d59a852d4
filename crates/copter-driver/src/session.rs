//! 链路会话
//!
//! 独占两个 UDP socket：临时端口的指令 socket 和本地绑定的遥测 socket。
//! 构造时打开，`close()` 消费会话，因此 socket 只会被关闭一次。

use crate::endpoint::Endpoint;
use crate::error::DriverError;
use crate::metrics::LinkMetrics;
use crate::telemetry_channel::TelemetryChannel;
use copter_protocol::MotorCommand;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::debug;

/// 电机指令发送端
#[derive(Debug)]
pub struct CommandSender {
    socket: UdpSocket,
    target: SocketAddr,
    /// 复用的发送缓冲区（`8 * motor_count` 字节）
    tx_buf: Vec<u8>,
}

impl CommandSender {
    /// 在临时端口上创建指令 socket
    pub fn open(bind: SocketAddr, target: SocketAddr, motor_count: usize) -> Result<Self, DriverError> {
        let socket = UdpSocket::bind(bind)?;
        Ok(Self {
            socket,
            target,
            tx_buf: vec![0u8; copter_protocol::codec::encoded_len(motor_count)],
        })
    }

    /// 编码并发送一条指令
    ///
    /// # 错误
    /// - `DriverError::Protocol`: 指令长度超过发送缓冲区（长度已由 `CommandBuffer` 保证）
    /// - `DriverError::Send`: socket 发送失败
    pub fn send(&mut self, command: &MotorCommand) -> Result<usize, DriverError> {
        let len = command.encode_into(&mut self.tx_buf)?;
        self.socket
            .send_to(&self.tx_buf[..len], self.target)
            .map_err(DriverError::Send)
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    pub fn local_addr(&self) -> Result<SocketAddr, DriverError> {
        Ok(self.socket.local_addr()?)
    }
}

/// 链路会话（socket 所有者）
#[derive(Debug)]
pub struct LinkSession {
    pub(crate) sender: CommandSender,
    pub(crate) telemetry: TelemetryChannel,
}

impl LinkSession {
    /// 打开会话
    ///
    /// 先绑定遥测端口（失败即 `DriverError::Bind`），再创建指令 socket。
    pub fn open(
        endpoint: &Endpoint,
        motor_count: usize,
        receive_timeout: Duration,
    ) -> Result<Self, DriverError> {
        let telemetry = TelemetryChannel::bind_addr(endpoint.telemetry_bind_addr(), receive_timeout)?;
        let sender = CommandSender::open(
            endpoint.ephemeral_bind_addr(),
            endpoint.motor_addr(),
            motor_count,
        )?;

        debug!(
            "Link session opened: telemetry on {:?}, commands -> {}",
            telemetry.local_addr().ok(),
            sender.target()
        );

        Ok(Self { sender, telemetry })
    }

    /// 实际绑定的遥测地址（端口 0 时由系统分配）
    pub fn telemetry_addr(&self) -> Result<SocketAddr, DriverError> {
        self.telemetry.local_addr()
    }

    /// 关闭两个 socket
    pub fn close(self, metrics: &LinkMetrics) {
        let Self { sender, telemetry } = self;
        drop(sender);
        drop(telemetry);
        metrics.sessions_closed.fetch_add(1, Ordering::Relaxed);
        debug!("Link session closed");
    }
}
