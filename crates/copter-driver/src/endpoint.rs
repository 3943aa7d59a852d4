//! 网络端点
//!
//! 已解析的模拟器地址 + 指令端口 + 遥测端口，构造后不可变。

use crate::error::DriverError;
use copter_protocol::{DEFAULT_HOST, DEFAULT_MOTOR_PORT, DEFAULT_TELEMETRY_PORT};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs};

/// 模拟器端点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: IpAddr,
    motor_port: u16,
    telemetry_port: u16,
}

impl Endpoint {
    /// 解析主机名并创建端点
    ///
    /// `host` 可以是 IP 字面量或主机名；主机名取第一个解析结果。
    ///
    /// # 错误
    /// - `DriverError::InvalidAddress`: 主机名无法解析
    pub fn resolve(host: &str, motor_port: u16, telemetry_port: u16) -> Result<Self, DriverError> {
        let ip = match host.parse::<IpAddr>() {
            Ok(ip) => ip,
            Err(_) => (host, motor_port)
                .to_socket_addrs()
                .map_err(|e| DriverError::InvalidAddress(format!("{}: {}", host, e)))?
                .next()
                .map(|addr| addr.ip())
                .ok_or_else(|| DriverError::InvalidAddress(format!("{}: no addresses", host)))?,
        };

        Ok(Self::new(ip, motor_port, telemetry_port))
    }

    pub const fn new(host: IpAddr, motor_port: u16, telemetry_port: u16) -> Self {
        Self {
            host,
            motor_port,
            telemetry_port,
        }
    }

    pub fn host(&self) -> IpAddr {
        self.host
    }

    pub fn motor_port(&self) -> u16 {
        self.motor_port
    }

    pub fn telemetry_port(&self) -> u16 {
        self.telemetry_port
    }

    /// 电机指令的发送目标
    pub fn motor_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.motor_port)
    }

    /// 本地遥测 socket 的绑定地址（与主机同协议族的通配地址）
    pub fn telemetry_bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.unspecified(), self.telemetry_port)
    }

    /// 指令 socket 的绑定地址（临时端口）
    pub fn ephemeral_bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.unspecified(), 0)
    }

    fn unspecified(&self) -> IpAddr {
        match self.host {
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        }
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::new(
            DEFAULT_HOST.parse().unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST)),
            DEFAULT_MOTOR_PORT,
            DEFAULT_TELEMETRY_PORT,
        )
    }
}
