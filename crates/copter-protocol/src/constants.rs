//! 协议常量定义
//!
//! 集中定义线格式与默认端点相关的常量，避免在代码中散落"魔法数"。

/// 单个数值在线上的宽度（IEEE-754 双精度，8 字节）
pub const VALUE_WIDTH: usize = 8;

/// 遥测帧包含的数值个数
pub const TELEMETRY_VALUE_COUNT: usize = 11;

/// 遥测数据报的固定长度（字节）
pub const TELEMETRY_FRAME_LEN: usize = VALUE_WIDTH * TELEMETRY_VALUE_COUNT;

/// 默认电机数量（四旋翼）
pub const DEFAULT_MOTOR_COUNT: usize = 4;

/// 默认模拟器主机
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// 默认电机指令端口（客户端 → 模拟器）
pub const DEFAULT_MOTOR_PORT: u16 = 5000;

/// 默认遥测端口（模拟器 → 客户端）
pub const DEFAULT_TELEMETRY_PORT: u16 = 5001;

/// 默认遥测接收超时（毫秒）
pub const DEFAULT_RECEIVE_TIMEOUT_MS: u64 = 1000;

// 遥测帧槽位索引
pub const SLOT_TIMESTAMP: usize = 0;
pub const SLOT_GYRO: usize = 1;
pub const SLOT_QUATERNION: usize = 4;
pub const SLOT_POSITION: usize = 8;
