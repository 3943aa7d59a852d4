//! 编解码属性测试
//!
//! 使用 proptest 覆盖整个 f64 位模式空间（含 NaN 负载、±0、±∞）。

use copter_protocol::codec::{decode, encode};
use copter_protocol::{ProtocolError, TelemetryFrame};
use proptest::prelude::*;
use rand::Rng;

proptest! {
    /// 任意位模式编码再解码后逐位一致
    #[test]
    fn roundtrip_is_bit_exact(bits in prop::collection::vec(any::<u64>(), 0..64)) {
        let values: Vec<f64> = bits.iter().map(|b| f64::from_bits(*b)).collect();
        let decoded = decode(&encode(&values)).unwrap();
        prop_assert_eq!(decoded.len(), values.len());
        for (a, b) in values.iter().zip(decoded.iter()) {
            prop_assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    /// 编码长度恒为 8*N
    #[test]
    fn encoded_length_is_eight_per_value(values in prop::collection::vec(any::<f64>(), 0..32)) {
        prop_assert_eq!(encode(&values).len(), values.len() * 8);
    }

    /// 非 8 整数倍的长度一律拒绝
    #[test]
    fn misaligned_buffers_rejected(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let result = decode(&bytes);
        if bytes.len() % 8 == 0 {
            prop_assert!(result.is_ok());
        } else {
            prop_assert_eq!(result, Err(ProtocolError::Format { len: bytes.len() }));
        }
    }

    /// 遥测帧只接受恰好 88 字节
    #[test]
    fn telemetry_accepts_only_88_bytes(len in 0usize..200) {
        let bytes = vec![0u8; len];
        let result = TelemetryFrame::from_bytes(&bytes);
        prop_assert_eq!(result.is_ok(), len == 88);
    }
}

/// 随机 88 字节数据报：解码后再编码逐字节一致
#[test]
fn random_telemetry_datagrams_reencode_identically() {
    let mut rng = rand::thread_rng();
    for _ in 0..1000 {
        let mut bytes = [0u8; 88];
        rng.fill(&mut bytes[..]);
        let frame = TelemetryFrame::from_bytes(&bytes).unwrap();
        // NaN 负载也必须保留，比较字节而不是数值
        assert_eq!(frame.to_bytes(), bytes);
    }
}
