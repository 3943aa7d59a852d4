//! Builder 模式实现
//!
//! 提供链式构造 `ControlLoop` 实例的便捷方式。

use crate::config::LinkConfig;
use crate::error::DriverError;
use crate::link::ControlLoop;
use std::time::Duration;

/// ControlLoop Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use copter_driver::LinkBuilder;
/// use std::time::Duration;
///
/// // 默认：127.0.0.1:5000 / 5001，四旋翼
/// let link = LinkBuilder::new().build().unwrap();
///
/// // 远程模拟器，六旋翼，100Hz
/// let link = LinkBuilder::new()
///     .host("192.168.1.20")
///     .motor_count(6)
///     .receive_timeout(Duration::from_millis(200))
///     .loop_rate_hz(100.0)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct LinkBuilder {
    config: LinkConfig,
}

impl LinkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以完整配置为起点
    pub fn config(mut self, config: LinkConfig) -> Self {
        self.config = config;
        self
    }

    /// 模拟器主机（IP 或主机名）
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn motor_port(mut self, port: u16) -> Self {
        self.config.motor_port = port;
        self
    }

    /// 本地遥测端口（0 表示由系统分配）
    pub fn telemetry_port(mut self, port: u16) -> Self {
        self.config.telemetry_port = port;
        self
    }

    pub fn motor_count(mut self, count: usize) -> Self {
        self.config.motor_count = count;
        self
    }

    /// 遥测接收超时（按毫秒截断）
    pub fn receive_timeout(mut self, timeout: Duration) -> Self {
        self.config.receive_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// 目标循环频率；不设置则不限速
    pub fn loop_rate_hz(mut self, hz: f64) -> Self {
        self.config.loop_rate_hz = Some(hz);
        self
    }

    pub fn halt_on_shutdown_frame(mut self, enabled: bool) -> Self {
        self.config.halt_on_shutdown_frame = enabled;
        self
    }

    pub fn stream_capacity(mut self, capacity: usize) -> Self {
        self.config.stream_capacity = capacity;
        self
    }

    /// 当前累积的配置
    pub fn as_config(&self) -> &LinkConfig {
        &self.config
    }

    /// 构建链路（绑定遥测端口，处于 `Idle` 状态）
    pub fn build(self) -> Result<ControlLoop, DriverError> {
        ControlLoop::new(self.config)
    }
}
