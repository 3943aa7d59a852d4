//! 二进制编解码
//!
//! 线格式：连续的 IEEE-754 双精度浮点数，每个 8 字节，小端字节序
//! （低位字节在前）。无长度前缀，无填充。
//!
//! 编码与 socket IO 完全解耦，控制循环只通过这里的函数接触字节。
//!
//! ```rust
//! use copter_protocol::codec;
//!
//! let bytes = codec::encode(&[1.0, -0.0]);
//! assert_eq!(bytes.len(), 16);
//! assert_eq!(&bytes[..8], &1.0f64.to_le_bytes());
//!
//! let values = codec::decode(&bytes).unwrap();
//! assert_eq!(values[0], 1.0);
//! assert!(values[1].is_sign_negative());
//! ```

use crate::ProtocolError;
use crate::constants::VALUE_WIDTH;

/// 编码后的字节长度
#[inline]
pub const fn encoded_len(count: usize) -> usize {
    count * VALUE_WIDTH
}

/// 将一组 f64 编码为字节
pub fn encode(values: &[f64]) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_len(values.len()));
    for value in values {
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

/// 编码到调用者提供的缓冲区（控制循环热路径，不分配）
///
/// 返回写入的字节数。
///
/// # 错误
/// - `ProtocolError::BufferTooSmall`: `out` 放不下全部数值
pub fn encode_into(values: &[f64], out: &mut [u8]) -> Result<usize, ProtocolError> {
    let needed = encoded_len(values.len());
    if out.len() < needed {
        return Err(ProtocolError::BufferTooSmall {
            needed,
            actual: out.len(),
        });
    }

    for (chunk, value) in out[..needed].chunks_exact_mut(VALUE_WIDTH).zip(values) {
        chunk.copy_from_slice(&value.to_le_bytes());
    }
    Ok(needed)
}

/// 将字节解码为一组 f64
///
/// 按位还原（包括 -0.0、NaN 负载和无穷大）。
///
/// # 错误
/// - `ProtocolError::Format`: 长度不是 8 的整数倍
pub fn decode(buffer: &[u8]) -> Result<Vec<f64>, ProtocolError> {
    check_alignment(buffer)?;
    Ok(buffer.chunks_exact(VALUE_WIDTH).map(read_f64).collect())
}

/// 解码到调用者提供的切片
///
/// 返回解码出的数值个数。
///
/// # 错误
/// - `ProtocolError::Format`: 长度不是 8 的整数倍
/// - `ProtocolError::BufferTooSmall`: `out` 放不下全部数值
pub fn decode_into(buffer: &[u8], out: &mut [f64]) -> Result<usize, ProtocolError> {
    check_alignment(buffer)?;

    let count = buffer.len() / VALUE_WIDTH;
    if out.len() < count {
        return Err(ProtocolError::BufferTooSmall {
            needed: count,
            actual: out.len(),
        });
    }

    for (slot, chunk) in out.iter_mut().zip(buffer.chunks_exact(VALUE_WIDTH)) {
        *slot = read_f64(chunk);
    }
    Ok(count)
}

fn check_alignment(buffer: &[u8]) -> Result<(), ProtocolError> {
    if buffer.len() % VALUE_WIDTH != 0 {
        return Err(ProtocolError::Format { len: buffer.len() });
    }
    Ok(())
}

#[inline]
fn read_f64(chunk: &[u8]) -> f64 {
    let mut bytes = [0u8; VALUE_WIDTH];
    bytes.copy_from_slice(chunk);
    f64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_byte_order() {
        // 1.0 = 0x3FF0_0000_0000_0000，小端下最高字节在最后
        let bytes = encode(&[1.0]);
        assert_eq!(bytes, vec![0, 0, 0, 0, 0, 0, 0xF0, 0x3F]);
    }

    #[test]
    fn test_encode_empty() {
        assert!(encode(&[]).is_empty());
        assert_eq!(decode(&[]).unwrap(), Vec::<f64>::new());
    }

    #[test]
    fn test_encode_motor_vector() {
        let bytes = encode(&[0.1, 0.2, 0.3, 0.4]);
        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[24..32], &0.4f64.to_le_bytes());
    }

    #[test]
    fn test_decode_rejects_misaligned() {
        for len in [1usize, 7, 9, 87, 89] {
            let buffer = vec![0u8; len];
            match decode(&buffer) {
                Err(ProtocolError::Format { len: got }) => assert_eq!(got, len),
                other => panic!("Expected Format error for len {}, got {:?}", len, other),
            }
        }
    }

    #[test]
    fn test_special_values_bit_exact() {
        let values = [
            0.0,
            -0.0,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NAN,
            f64::from_bits(0x7FF0_0000_0000_0001), // signalling NaN 负载
            f64::MIN_POSITIVE,
            f64::MAX,
        ];
        let decoded = decode(&encode(&values)).unwrap();
        for (a, b) in values.iter().zip(decoded.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_encode_into_buffer_too_small() {
        let mut out = [0u8; 16];
        let err = encode_into(&[1.0, 2.0, 3.0], &mut out).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::BufferTooSmall {
                needed: 24,
                actual: 16
            }
        ));
    }

    #[test]
    fn test_encode_into_matches_encode() {
        let values = [0.5, -1.25, 1e300];
        let mut out = [0xAAu8; 32];
        let written = encode_into(&values, &mut out).unwrap();
        assert_eq!(written, 24);
        assert_eq!(&out[..24], encode(&values).as_slice());
        // 超出部分不被触碰
        assert_eq!(&out[24..], &[0xAA; 8]);
    }

    #[test]
    fn test_decode_into() {
        let bytes = encode(&[3.0, 4.0]);
        let mut out = [0.0f64; 4];
        assert_eq!(decode_into(&bytes, &mut out).unwrap(), 2);
        assert_eq!(out, [3.0, 4.0, 0.0, 0.0]);

        let mut small = [0.0f64; 1];
        assert!(matches!(
            decode_into(&bytes, &mut small),
            Err(ProtocolError::BufferTooSmall { needed: 2, actual: 1 })
        ));
    }
}
