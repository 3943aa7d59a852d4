//! 模拟器端点（SimPeer）
//!
//! 链路另一端的最小实现：在电机端口接收指令，向客户端的遥测端口回发帧。
//! 用于集成测试和命令行的 `sim` 子命令，不包含任何物理模型。

use crate::error::{DriverError, is_timeout_kind};
use copter_protocol::{MotorCommand, TelemetryFrame};
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, trace};

const RECV_BUFFER_SIZE: usize = 512;

/// 模拟器端点
#[derive(Debug)]
pub struct SimPeer {
    socket: UdpSocket,
    telemetry_target: SocketAddr,
    motor_count: usize,
    recv_buf: [u8; RECV_BUFFER_SIZE],
}

impl SimPeer {
    /// 在 `motor_addr` 上监听指令，遥测发往 `telemetry_target`
    ///
    /// # 错误
    /// - `DriverError::Bind`: 电机端口不可用
    pub fn bind(
        motor_addr: SocketAddr,
        telemetry_target: SocketAddr,
        motor_count: usize,
        timeout: Duration,
    ) -> Result<Self, DriverError> {
        if timeout.is_zero() {
            return Err(DriverError::InvalidConfig(
                "Receive timeout must be greater than zero".to_string(),
            ));
        }
        let socket = UdpSocket::bind(motor_addr).map_err(|source| DriverError::Bind {
            port: motor_addr.port(),
            source,
        })?;
        socket.set_read_timeout(Some(timeout))?;

        Ok(Self {
            socket,
            telemetry_target,
            motor_count,
            recv_buf: [0u8; RECV_BUFFER_SIZE],
        })
    }

    /// 实际监听地址
    pub fn local_addr(&self) -> Result<SocketAddr, DriverError> {
        Ok(self.socket.local_addr()?)
    }

    pub fn telemetry_target(&self) -> SocketAddr {
        self.telemetry_target
    }

    /// 修改遥测目标（客户端使用临时端口时，绑定后才知道端口）
    pub fn set_telemetry_target(&mut self, target: SocketAddr) {
        self.telemetry_target = target;
    }

    /// 接收一条电机指令
    ///
    /// # 错误
    /// - `DriverError::Timeout`: 超时内没有数据报
    /// - `DriverError::Protocol`: 长度不是 8 的倍数
    /// - `DriverError::Size`: 电机数量不符
    pub fn recv_command(&mut self) -> Result<MotorCommand, DriverError> {
        let len = match self.socket.recv_from(&mut self.recv_buf) {
            Ok((len, _src)) => len,
            Err(e) if is_timeout_kind(&e) => return Err(DriverError::Timeout),
            Err(e) => return Err(DriverError::Receive(e)),
        };

        let command = MotorCommand::from_bytes(&self.recv_buf[..len])?;
        if command.len() != self.motor_count {
            return Err(DriverError::Size {
                expected: self.motor_count,
                actual: command.len(),
            });
        }
        trace!("SimPeer received command: {:?}", command.as_slice());
        Ok(command)
    }

    /// 发送一帧遥测
    pub fn send_telemetry(&self, frame: &TelemetryFrame) -> Result<(), DriverError> {
        self.send_raw(&frame.to_bytes())
    }

    /// 发送任意数据报（测试畸形帧）
    pub fn send_raw(&self, bytes: &[u8]) -> Result<(), DriverError> {
        self.socket
            .send_to(bytes, self.telemetry_target)
            .map_err(DriverError::Send)?;
        Ok(())
    }

    /// 发送退出帧（时间戳为 -1）
    pub fn send_shutdown(&self) -> Result<(), DriverError> {
        debug!("SimPeer sending shutdown frame to {}", self.telemetry_target);
        self.send_telemetry(&TelemetryFrame::shutdown())
    }

    /// 应答循环：每收到一条指令，用 `respond` 生成一帧遥测回发
    ///
    /// `running` 变为 false 后发送退出帧并返回处理过的指令数。
    /// 超时和畸形指令被跳过。
    pub fn serve<F>(&mut self, running: &AtomicBool, mut respond: F) -> Result<u64, DriverError>
    where
        F: FnMut(&MotorCommand) -> TelemetryFrame,
    {
        let mut served = 0u64;
        info!(
            "SimPeer serving on {:?}, telemetry -> {}",
            self.local_addr().ok(),
            self.telemetry_target
        );

        while running.load(Ordering::Acquire) {
            match self.recv_command() {
                Ok(command) => {
                    let frame = respond(&command);
                    self.send_telemetry(&frame)?;
                    served += 1;
                },
                Err(e) if !e.is_fatal() => {
                    trace!("SimPeer skipped iteration: {}", e);
                },
                Err(DriverError::Size { expected, actual }) => {
                    debug!("SimPeer ignoring command with {} motors (expected {})", actual, expected);
                },
                Err(e) => return Err(e),
            }
        }

        self.send_shutdown()?;
        info!("SimPeer stopped after {} commands", served);
        Ok(served)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> (SimPeer, UdpSocket) {
        let client = UdpSocket::bind("127.0.0.1:0").unwrap();
        client.set_read_timeout(Some(Duration::from_secs(1))).unwrap();
        let peer = SimPeer::bind(
            SocketAddr::from(([127, 0, 0, 1], 0)),
            client.local_addr().unwrap(),
            4,
            Duration::from_millis(50),
        )
        .unwrap();
        (peer, client)
    }

    #[test]
    fn test_recv_command() {
        let (mut peer, client) = pair();
        let cmd = MotorCommand::from([0.1, 0.2, 0.3, 0.4]);
        client.send_to(&cmd.to_bytes(), peer.local_addr().unwrap()).unwrap();
        assert_eq!(peer.recv_command().unwrap(), cmd);
    }

    #[test]
    fn test_recv_command_errors() {
        let (mut peer, client) = pair();
        assert!(matches!(peer.recv_command(), Err(DriverError::Timeout)));

        let addr = peer.local_addr().unwrap();
        client.send_to(&[0u8; 12], addr).unwrap();
        assert!(matches!(peer.recv_command(), Err(DriverError::Protocol(_))));

        client.send_to(&[0u8; 16], addr).unwrap();
        assert!(matches!(
            peer.recv_command(),
            Err(DriverError::Size {
                expected: 4,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_send_telemetry_and_shutdown() {
        let (peer, client) = pair();
        let frame = TelemetryFrame {
            timestamp: 2.0,
            ..TelemetryFrame::default()
        };
        peer.send_telemetry(&frame).unwrap();
        peer.send_shutdown().unwrap();

        let mut buf = [0u8; 128];
        let (len, _) = client.recv_from(&mut buf).unwrap();
        assert_eq!(TelemetryFrame::from_bytes(&buf[..len]).unwrap(), frame);
        let (len, _) = client.recv_from(&mut buf).unwrap();
        assert!(TelemetryFrame::from_bytes(&buf[..len]).unwrap().is_shutdown());
    }

    #[test]
    fn test_serve_stops_and_sends_shutdown() {
        let (mut peer, client) = pair();
        let running = AtomicBool::new(false);
        let served = peer.serve(&running, |_| TelemetryFrame::default()).unwrap();
        assert_eq!(served, 0);

        let mut buf = [0u8; 128];
        let (len, _) = client.recv_from(&mut buf).unwrap();
        assert!(TelemetryFrame::from_bytes(&buf[..len]).unwrap().is_shutdown());
    }
}
