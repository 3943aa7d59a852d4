//! 驱动层模块
//!
//! 多旋翼模拟器 UDP 链路的控制循环与状态同步，包括：
//! - 控制线程管理（启动 / 协作式停止 / 超时 join）
//! - 电机指令共享（ArcSwap 无锁快照，永不撕裂）
//! - 遥测接收（带超时，畸形数据报跳过）
//! - 钩子系统与遥测流
//! - 模拟器端点 `SimPeer`（测试和本地演示）
//!
//! # 使用示例
//!
//! ```no_run
//! use copter_driver::LinkBuilder;
//! use std::time::Duration;
//!
//! let link = LinkBuilder::new().build()?;
//! link.start()?;
//!
//! let telemetry = link.subscribe();
//! link.set_command(&[0.5; 4])?;
//!
//! while let Some(frame) = telemetry.recv_timeout(Duration::from_secs(1)) {
//!     println!("{}", frame);
//! }
//! link.halt();
//! # Ok::<(), copter_driver::DriverError>(())
//! ```

mod builder;
pub mod command_buffer;
mod config;
mod endpoint;
mod error;
pub mod hooks;
mod link;
pub mod metrics;
pub mod peer;
pub mod pipeline;
pub mod session;
pub mod state;
pub mod stream;
pub mod telemetry_channel;

pub use builder::LinkBuilder;
pub use command_buffer::CommandBuffer;
pub use config::{DEFAULT_STREAM_CAPACITY, LinkConfig, Pacing};
pub use endpoint::Endpoint;
pub use error::DriverError;
pub use hooks::{HookManager, TelemetryCallback};
pub use link::ControlLoop;
pub use metrics::{LinkMetrics, MetricsSnapshot};
pub use peer::SimPeer;
pub use state::{AtomicLoopState, LoopState};
pub use stream::{TelemetryStream, telemetry_stream};
pub use telemetry_channel::TelemetryChannel;

// 协议层类型，方便下游只依赖驱动层
pub use copter_protocol::{MotorCommand, TelemetryFrame};
