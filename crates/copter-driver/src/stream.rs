//! 遥测流
//!
//! 基于有界 Channel 的遥测消费方式：控制线程 `try_send`，消费线程按自己的节奏读取。
//! 队列满时丢弃新帧并计数，控制线程永不阻塞。
//!
//! ```rust
//! use copter_driver::stream::telemetry_stream;
//! use copter_driver::hooks::TelemetryCallback;
//! use copter_protocol::TelemetryFrame;
//! use std::time::Duration;
//!
//! let (hook, stream) = telemetry_stream(16);
//! hook.on_telemetry(&TelemetryFrame::default());
//!
//! let frame = stream.recv_timeout(Duration::from_millis(10)).unwrap();
//! assert_eq!(frame.timestamp, 0.0);
//! ```

use crate::hooks::TelemetryCallback;
use copter_protocol::TelemetryFrame;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// 创建一对 (回调, 流)
pub fn telemetry_stream(capacity: usize) -> (StreamHook, TelemetryStream) {
    let (tx, rx) = bounded(capacity);
    let dropped = Arc::new(AtomicU64::new(0));
    (
        StreamHook {
            tx,
            dropped: dropped.clone(),
        },
        TelemetryStream { rx, dropped },
    )
}

/// 把遥测帧转发进 Channel 的回调
pub struct StreamHook {
    tx: Sender<TelemetryFrame>,
    dropped: Arc<AtomicU64>,
}

impl TelemetryCallback for StreamHook {
    fn on_telemetry(&self, frame: &TelemetryFrame) {
        match self.tx.try_send(*frame) {
            Ok(()) => {},
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            },
            // 消费端已经丢弃，静默忽略
            Err(TrySendError::Disconnected(_)) => {},
        }
    }
}

/// 遥测流（消费端）
///
/// 控制循环停止后，已缓冲的帧仍可读完，之后 `recv` 返回 `None`。
pub struct TelemetryStream {
    rx: Receiver<TelemetryFrame>,
    dropped: Arc<AtomicU64>,
}

impl TelemetryStream {
    /// 阻塞等待下一帧；链路停止且缓冲区读空后返回 `None`
    pub fn recv(&self) -> Option<TelemetryFrame> {
        self.rx.recv().ok()
    }

    /// 带超时等待下一帧
    pub fn recv_timeout(&self, timeout: Duration) -> Option<TelemetryFrame> {
        match self.rx.recv_timeout(timeout) {
            Ok(frame) => Some(frame),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// 非阻塞读取
    pub fn try_recv(&self) -> Option<TelemetryFrame> {
        self.rx.try_recv().ok()
    }

    /// 读空当前缓冲区，只保留最新一帧
    pub fn latest(&self) -> Option<TelemetryFrame> {
        self.rx.try_iter().last()
    }

    /// 当前缓冲的帧数
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// 因队列满被丢弃的帧数
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// 阻塞迭代器，链路停止后结束
    pub fn iter(&self) -> impl Iterator<Item = TelemetryFrame> + '_ {
        self.rx.iter()
    }
}
