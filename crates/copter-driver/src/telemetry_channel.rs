//! 遥测接收通道
//!
//! 持有本地绑定的遥测 socket，按超时接收并解码 88 字节遥测帧。

use crate::error::{DriverError, is_timeout_kind};
use copter_protocol::TelemetryFrame;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;
use tracing::trace;

/// 接收缓冲区大小
///
/// 必须大于 88 字节，超长数据报才能被识别出来，而不是被截断成"合法"的 88 字节。
const RECV_BUFFER_SIZE: usize = 512;

/// 遥测接收通道
#[derive(Debug)]
pub struct TelemetryChannel {
    socket: UdpSocket,
    timeout: Duration,
    recv_buf: [u8; RECV_BUFFER_SIZE],
}

impl TelemetryChannel {
    /// 在通配地址上绑定遥测端口
    ///
    /// `port` 为 0 时由系统分配临时端口（测试常用），实际端口见 [`local_addr`](Self::local_addr)。
    ///
    /// # 错误
    /// - `DriverError::Bind`: 端口不可用（致命）
    /// - `DriverError::InvalidConfig`: 超时为 0
    pub fn bind(port: u16, timeout: Duration) -> Result<Self, DriverError> {
        Self::bind_addr(SocketAddr::from(([0, 0, 0, 0], port)), timeout)
    }

    /// 绑定到指定本地地址
    pub fn bind_addr(addr: SocketAddr, timeout: Duration) -> Result<Self, DriverError> {
        validate_timeout(timeout)?;

        let socket = UdpSocket::bind(addr).map_err(|source| DriverError::Bind {
            port: addr.port(),
            source,
        })?;
        socket.set_read_timeout(Some(timeout))?;

        Ok(Self {
            socket,
            timeout,
            recv_buf: [0u8; RECV_BUFFER_SIZE],
        })
    }

    /// 本地绑定地址
    pub fn local_addr(&self) -> Result<SocketAddr, DriverError> {
        Ok(self.socket.local_addr()?)
    }

    /// 当前接收超时
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// 接收一帧（使用构造时的超时）
    ///
    /// # 错误
    /// - `DriverError::Timeout`: 超时内没有数据报（非致命，下一次迭代重试）
    /// - `DriverError::Protocol`: 数据报不是 88 字节（非致命，丢弃该帧）
    /// - `DriverError::Receive`: 其他 socket 错误（非致命）
    pub fn receive_one(&mut self) -> Result<TelemetryFrame, DriverError> {
        let (len, peer) = match self.socket.recv_from(&mut self.recv_buf) {
            Ok(received) => received,
            Err(e) if is_timeout_kind(&e) => return Err(DriverError::Timeout),
            Err(e) => return Err(DriverError::Receive(e)),
        };

        trace!("Telemetry datagram: {} bytes from {}", len, peer);

        let frame = TelemetryFrame::from_bytes(&self.recv_buf[..len])?;
        Ok(frame)
    }

    /// 以指定超时接收一帧
    ///
    /// 超时只对本次调用生效，之后恢复构造时的超时。
    pub fn receive_one_timeout(
        &mut self,
        timeout: Duration,
    ) -> Result<TelemetryFrame, DriverError> {
        validate_timeout(timeout)?;
        if timeout == self.timeout {
            return self.receive_one();
        }

        self.socket.set_read_timeout(Some(timeout))?;
        let result = self.receive_one();
        self.socket.set_read_timeout(Some(self.timeout))?;
        result
    }
}

/// `set_read_timeout(Some(0))` 在所有平台上都会报错，提前拒绝
fn validate_timeout(timeout: Duration) -> Result<(), DriverError> {
    if timeout.is_zero() {
        return Err(DriverError::InvalidConfig(
            "receive timeout must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use copter_protocol::ProtocolError;
    use std::time::Instant;

    fn channel(timeout_ms: u64) -> (TelemetryChannel, SocketAddr, UdpSocket) {
        let channel = TelemetryChannel::bind(0, Duration::from_millis(timeout_ms)).unwrap();
        let port = channel.local_addr().unwrap().port();
        let target = SocketAddr::from(([127, 0, 0, 1], port));
        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        (channel, target, sender)
    }

    #[test]
    fn test_receive_valid_frame() {
        let (mut channel, target, sender) = channel(500);
        let frame = TelemetryFrame {
            timestamp: 2.0,
            gyro: [0.5, 0.0, -0.5],
            quaternion: [1.0, 0.0, 0.0, 0.0],
            position: [0.0, 0.0, -1.0],
        };
        sender.send_to(&frame.to_bytes(), target).unwrap();

        assert_eq!(channel.receive_one().unwrap(), frame);
    }

    #[test]
    fn test_timeout_window() {
        let (mut channel, _target, _sender) = channel(100);

        let start = Instant::now();
        let err = channel.receive_one().unwrap_err();
        let elapsed = start.elapsed();

        assert!(err.is_timeout(), "Expected timeout, got {:?}", err);
        assert!(elapsed >= Duration::from_millis(95), "returned early: {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(600), "returned late: {:?}", elapsed);
    }

    #[test]
    fn test_wrong_size_datagrams_rejected() {
        let (mut channel, target, sender) = channel(500);

        for len in [8usize, 80, 87, 89, 96, 200] {
            sender.send_to(&vec![0u8; len], target).unwrap();
            match channel.receive_one() {
                Err(DriverError::Protocol(ProtocolError::InvalidLength { expected, actual })) => {
                    assert_eq!(expected, 88);
                    assert_eq!(actual, len);
                },
                other => panic!("Expected InvalidLength for {} bytes, got {:?}", len, other),
            }
        }

        // 坏帧之后通道仍然可用
        sender.send_to(&[0u8; 88], target).unwrap();
        assert_eq!(channel.receive_one().unwrap(), TelemetryFrame::default());
    }

    #[test]
    fn test_receive_one_timeout_restores_default() {
        let (mut channel, _target, _sender) = channel(1000);

        let start = Instant::now();
        assert!(channel.receive_one_timeout(Duration::from_millis(50)).unwrap_err().is_timeout());
        assert!(start.elapsed() < Duration::from_millis(900));
        assert_eq!(channel.timeout(), Duration::from_millis(1000));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(matches!(
            TelemetryChannel::bind(0, Duration::ZERO),
            Err(DriverError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_bind_conflict() {
        let (channel, _target, _sender) = channel(100);
        let port = channel.local_addr().unwrap().port();

        match TelemetryChannel::bind(port, Duration::from_millis(100)) {
            Err(DriverError::Bind { port: p, .. }) => assert_eq!(p, port),
            other => panic!("Expected Bind error, got {:?}", other),
        }
    }
}
