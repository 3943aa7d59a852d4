//! 链路配置
//!
//! 构造时一次性给定，运行期间不可修改。

use crate::error::DriverError;
use copter_protocol::{
    DEFAULT_HOST, DEFAULT_MOTOR_COUNT, DEFAULT_MOTOR_PORT, DEFAULT_RECEIVE_TIMEOUT_MS,
    DEFAULT_TELEMETRY_PORT,
};
use std::time::Duration;

/// 遥测流默认容量（帧）
pub const DEFAULT_STREAM_CAPACITY: usize = 1024;

/// 链路配置
///
/// # Example
///
/// ```
/// use copter_driver::LinkConfig;
///
/// // 默认：127.0.0.1，电机端口 5000，遥测端口 5001，4 电机，1000ms 超时
/// let config = LinkConfig::default();
///
/// // 六旋翼，200Hz 定频
/// let config = LinkConfig {
///     motor_count: 6,
///     loop_rate_hz: Some(200.0),
///     ..LinkConfig::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LinkConfig {
    /// 模拟器主机（IP 或主机名）
    pub host: String,
    /// 电机指令端口（发送目标）
    pub motor_port: u16,
    /// 遥测端口（本地绑定）
    pub telemetry_port: u16,
    /// 电机数量
    pub motor_count: usize,
    /// 遥测接收超时（毫秒）
    pub receive_timeout_ms: u64,
    /// 目标循环频率（Hz）
    ///
    /// `None` 表示不限速，每次迭代后仅让出 CPU。
    pub loop_rate_hz: Option<f64>,
    /// 收到退出帧（时间戳为负）后自动停止
    pub halt_on_shutdown_frame: bool,
    /// 遥测流（`subscribe()`）的通道容量
    pub stream_capacity: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            motor_port: DEFAULT_MOTOR_PORT,
            telemetry_port: DEFAULT_TELEMETRY_PORT,
            motor_count: DEFAULT_MOTOR_COUNT,
            receive_timeout_ms: DEFAULT_RECEIVE_TIMEOUT_MS,
            loop_rate_hz: None,
            halt_on_shutdown_frame: true,
            stream_capacity: DEFAULT_STREAM_CAPACITY,
        }
    }
}

impl LinkConfig {
    /// 校验配置
    pub fn validate(&self) -> Result<(), DriverError> {
        if self.motor_count == 0 {
            return Err(DriverError::InvalidConfig(
                "motor_count must be at least 1".to_string(),
            ));
        }
        if self.receive_timeout_ms == 0 {
            return Err(DriverError::InvalidConfig(
                "receive_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if let Some(hz) = self.loop_rate_hz
            && rate_period(hz).is_none()
        {
            return Err(DriverError::InvalidConfig(format!(
                "Invalid loop_rate_hz: {} (must be > 0 with a representable period)",
                hz
            )));
        }
        if self.stream_capacity == 0 {
            return Err(DriverError::InvalidConfig(
                "stream_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.receive_timeout_ms)
    }

    /// 节拍策略；未通过校验的频率退化为 `Pacing::Yield`
    pub fn pacing(&self) -> Pacing {
        self.loop_rate_hz
            .and_then(rate_period)
            .map_or(Pacing::Yield, Pacing::Period)
    }
}

/// 频率对应的周期；频率非正、非有限或周期超出 `Duration` 范围时为 `None`
fn rate_period(hz: f64) -> Option<Duration> {
    if !(hz.is_finite() && hz > 0.0) {
        return None;
    }
    Duration::try_from_secs_f64(1.0 / hz).ok()
}

/// 迭代之间的节拍策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// 不限速：迭代结束后 `yield_now()`，速率只受接收超时和网络往返约束
    Yield,
    /// 定频：每次迭代占用一个周期，用 `spin_sleep` 睡到下一个截止时间
    Period(Duration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LinkConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.motor_port, 5000);
        assert_eq!(config.telemetry_port, 5001);
        assert_eq!(config.motor_count, 4);
        assert_eq!(config.receive_timeout(), Duration::from_millis(1000));
        assert_eq!(config.pacing(), Pacing::Yield);
        assert!(config.halt_on_shutdown_frame);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rate_to_period() {
        let config = LinkConfig {
            loop_rate_hz: Some(250.0),
            ..LinkConfig::default()
        };
        assert_eq!(config.pacing(), Pacing::Period(Duration::from_millis(4)));
    }

    #[test]
    fn test_unrepresentable_rate_never_panics() {
        let config = LinkConfig {
            loop_rate_hz: Some(1e-20),
            ..LinkConfig::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(config.pacing(), Pacing::Yield);

        // 极低但可表示的频率仍然合法
        let slow = LinkConfig {
            loop_rate_hz: Some(1e-6),
            ..LinkConfig::default()
        };
        assert!(slow.validate().is_ok());
        assert_eq!(slow.pacing(), Pacing::Period(Duration::from_secs(1_000_000)));
    }

    #[test]
    fn test_invalid_configs() {
        let cases = [
            LinkConfig {
                motor_count: 0,
                ..LinkConfig::default()
            },
            LinkConfig {
                receive_timeout_ms: 0,
                ..LinkConfig::default()
            },
            LinkConfig {
                loop_rate_hz: Some(0.0),
                ..LinkConfig::default()
            },
            LinkConfig {
                loop_rate_hz: Some(f64::NAN),
                ..LinkConfig::default()
            },
            // 周期超出 Duration 范围
            LinkConfig {
                loop_rate_hz: Some(1e-20),
                ..LinkConfig::default()
            },
            // 次正规数：周期为无穷大
            LinkConfig {
                loop_rate_hz: Some(f64::MIN_POSITIVE / 4.0),
                ..LinkConfig::default()
            },
            LinkConfig {
                stream_capacity: 0,
                ..LinkConfig::default()
            },
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(DriverError::InvalidConfig(_))),
                "{:?} should be rejected",
                config
            );
        }
    }
}
