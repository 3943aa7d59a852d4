//! 遥测帧
//!
//! 模拟器每次回传一个 88 字节的数据报：11 个小端 f64，槽位布局固定：
//!
//! ```text
//! [0]      时间戳（秒）
//! [1..=3]  角速度 gyro x/y/z（rad/s）
//! [4..=7]  姿态四元数 w/x/y/z
//! [8..=10] 位置 x/y/z（m）
//! ```
//!
//! 时间戳为负表示模拟器即将退出（shutdown 帧）。

use crate::ProtocolError;
use crate::codec;
use crate::constants::*;
use std::fmt;

/// 解码后的遥测帧
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TelemetryFrame {
    /// 模拟时间（秒）
    pub timestamp: f64,
    /// 机体角速度 x/y/z（rad/s）
    pub gyro: [f64; 3],
    /// 姿态四元数 w/x/y/z
    pub quaternion: [f64; 4],
    /// 位置 x/y/z（m）
    pub position: [f64; 3],
}

impl TelemetryFrame {
    /// 模拟器退出信号帧（时间戳为 -1）
    pub fn shutdown() -> Self {
        Self {
            timestamp: -1.0,
            ..Self::default()
        }
    }

    /// 从 11 个槽位构造
    pub fn from_values(values: [f64; TELEMETRY_VALUE_COUNT]) -> Self {
        Self {
            timestamp: values[SLOT_TIMESTAMP],
            gyro: [values[SLOT_GYRO], values[SLOT_GYRO + 1], values[SLOT_GYRO + 2]],
            quaternion: [
                values[SLOT_QUATERNION],
                values[SLOT_QUATERNION + 1],
                values[SLOT_QUATERNION + 2],
                values[SLOT_QUATERNION + 3],
            ],
            position: [
                values[SLOT_POSITION],
                values[SLOT_POSITION + 1],
                values[SLOT_POSITION + 2],
            ],
        }
    }

    /// 按线上槽位顺序展开
    pub fn to_values(&self) -> [f64; TELEMETRY_VALUE_COUNT] {
        let mut values = [0.0; TELEMETRY_VALUE_COUNT];
        values[SLOT_TIMESTAMP] = self.timestamp;
        values[SLOT_GYRO..SLOT_QUATERNION].copy_from_slice(&self.gyro);
        values[SLOT_QUATERNION..SLOT_POSITION].copy_from_slice(&self.quaternion);
        values[SLOT_POSITION..].copy_from_slice(&self.position);
        values
    }

    /// 从数据报解码
    ///
    /// # 错误
    /// - `ProtocolError::InvalidLength`: 长度不是 88 字节
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() != TELEMETRY_FRAME_LEN {
            return Err(ProtocolError::InvalidLength {
                expected: TELEMETRY_FRAME_LEN,
                actual: bytes.len(),
            });
        }

        let mut values = [0.0; TELEMETRY_VALUE_COUNT];
        codec::decode_into(bytes, &mut values)?;
        Ok(Self::from_values(values))
    }

    /// 编码为 88 字节数据报（模拟器侧与测试使用）
    pub fn to_bytes(&self) -> [u8; TELEMETRY_FRAME_LEN] {
        let mut bytes = [0u8; TELEMETRY_FRAME_LEN];
        for (slot, value) in bytes.chunks_exact_mut(VALUE_WIDTH).zip(self.to_values()) {
            slot.copy_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    /// 是否为模拟器退出信号
    #[inline]
    pub fn is_shutdown(&self) -> bool {
        self.timestamp < 0.0
    }
}

impl TryFrom<&[u8]> for TelemetryFrame {
    type Error = ProtocolError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}

impl fmt::Display for TelemetryFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [gx, gy, gz] = self.gyro;
        let [qw, qx, qy, qz] = self.quaternion;
        let [px, py, pz] = self.position;
        write!(
            f,
            "t: {:6.3} | g: {:+.3} {:+.3} {:+.3} | q: {:+.3} {:+.3} {:+.3} {:+.3} | p: {:+.3} {:+.3} {:+.3}",
            self.timestamp, gx, gy, gz, qw, qx, qy, qz, px, py, pz
        )
    }
}
