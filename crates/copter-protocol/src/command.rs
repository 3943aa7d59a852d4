//! 电机指令
//!
//! 每个执行器一个 f64，长度在链路构造时固定。本层不对数值范围做约束。

use crate::ProtocolError;
use crate::codec;
use smallvec::SmallVec;
use std::ops::Index;

/// 电机数值缓冲区
///
/// 栈上预留 8 个位置，覆盖四旋翼、六旋翼和八旋翼，
/// 控制循环每次快照不会触发堆分配。
pub type MotorValues = SmallVec<[f64; 8]>;

/// 电机指令（有序，每个执行器一个值）
///
/// ```rust
/// use copter_protocol::MotorCommand;
///
/// let cmd = MotorCommand::from_slice(&[0.6, 0.6, 0.6, 0.6]);
/// assert_eq!(cmd.len(), 4);
/// assert_eq!(cmd.to_bytes().len(), 32);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotorCommand {
    values: MotorValues,
}

impl MotorCommand {
    /// 全零指令（链路的初始值）
    pub fn zeros(motor_count: usize) -> Self {
        Self {
            values: SmallVec::from_elem(0.0, motor_count),
        }
    }

    pub fn from_slice(values: &[f64]) -> Self {
        Self {
            values: SmallVec::from_slice(values),
        }
    }

    /// 所有电机取同一个值
    pub fn uniform(motor_count: usize, value: f64) -> Self {
        Self {
            values: SmallVec::from_elem(value, motor_count),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.values.iter()
    }

    /// 编码后的数据报长度（`8 * N`）
    #[inline]
    pub fn encoded_len(&self) -> usize {
        codec::encoded_len(self.values.len())
    }

    /// 编码为指令数据报
    pub fn to_bytes(&self) -> Vec<u8> {
        codec::encode(&self.values)
    }

    /// 编码到可复用的发送缓冲区
    pub fn encode_into(&self, out: &mut [u8]) -> Result<usize, ProtocolError> {
        codec::encode_into(&self.values, out)
    }

    /// 从指令数据报解码（模拟器侧使用）
    ///
    /// # 错误
    /// - `ProtocolError::Format`: 长度不是 8 的整数倍
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let values = codec::decode(bytes)?;
        Ok(Self {
            values: SmallVec::from_vec(values),
        })
    }
}

impl Index<usize> for MotorCommand {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.values[index]
    }
}

impl From<&[f64]> for MotorCommand {
    fn from(values: &[f64]) -> Self {
        Self::from_slice(values)
    }
}

impl<const N: usize> From<[f64; N]> for MotorCommand {
    fn from(values: [f64; N]) -> Self {
        Self::from_slice(&values)
    }
}

impl From<Vec<f64>> for MotorCommand {
    fn from(values: Vec<f64>) -> Self {
        Self {
            values: SmallVec::from_vec(values),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros() {
        let cmd = MotorCommand::zeros(4);
        assert_eq!(cmd.as_slice(), &[0.0; 4]);
        assert!(!cmd.is_empty());
        assert_eq!(cmd.encoded_len(), 32);
    }

    #[test]
    fn test_conversions() {
        let a = MotorCommand::from([0.1, 0.2]);
        let b = MotorCommand::from(vec![0.1, 0.2]);
        let c: MotorCommand = (&[0.1, 0.2][..]).into();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a[1], 0.2);
    }

    #[test]
    fn test_bytes_roundtrip_hexacopter() {
        // 6 电机：仍在栈上
        let cmd = MotorCommand::uniform(6, 0.35);
        let decoded = MotorCommand::from_bytes(&cmd.to_bytes()).unwrap();
        assert_eq!(decoded, cmd);
        assert!(!cmd.values.spilled());
    }

    #[test]
    fn test_from_bytes_misaligned() {
        assert!(matches!(
            MotorCommand::from_bytes(&[0u8; 31]),
            Err(ProtocolError::Format { len: 31 })
        ));
    }
}
