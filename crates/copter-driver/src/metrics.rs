//! 链路指标
//!
//! 原子计数器，可以在任何线程读取，不引入锁竞争。

use std::sync::atomic::{AtomicU64, Ordering};

/// 链路实时指标
///
/// # 使用示例
///
/// ```rust
/// use copter_driver::LinkMetrics;
/// use std::sync::atomic::Ordering;
///
/// let metrics = LinkMetrics::new();
/// metrics.rx_timeouts.fetch_add(1, Ordering::Relaxed);
///
/// let snapshot = metrics.snapshot();
/// assert_eq!(snapshot.rx_timeouts, 1);
/// ```
#[derive(Debug, Default)]
pub struct LinkMetrics {
    /// 完成的迭代次数
    pub iterations: AtomicU64,

    /// 成功发送的指令数据报
    pub tx_commands: AtomicU64,

    /// 发送失败次数
    pub tx_errors: AtomicU64,

    /// 成功解码的遥测帧
    pub rx_frames: AtomicU64,

    /// 接收超时次数（丢包时的正常现象）
    pub rx_timeouts: AtomicU64,

    /// 长度错误被丢弃的数据报
    pub rx_protocol_errors: AtomicU64,

    /// 其他接收错误
    pub rx_errors: AtomicU64,

    /// 会话关闭次数（一次会话只会关闭一次）
    pub sessions_closed: AtomicU64,
}

impl LinkMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取所有计数器的快照
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            iterations: self.iterations.load(Ordering::Relaxed),
            tx_commands: self.tx_commands.load(Ordering::Relaxed),
            tx_errors: self.tx_errors.load(Ordering::Relaxed),
            rx_frames: self.rx_frames.load(Ordering::Relaxed),
            rx_timeouts: self.rx_timeouts.load(Ordering::Relaxed),
            rx_protocol_errors: self.rx_protocol_errors.load(Ordering::Relaxed),
            rx_errors: self.rx_errors.load(Ordering::Relaxed),
            sessions_closed: self.sessions_closed.load(Ordering::Relaxed),
        }
    }

    /// 重置所有计数器
    pub fn reset(&self) {
        self.iterations.store(0, Ordering::Relaxed);
        self.tx_commands.store(0, Ordering::Relaxed);
        self.tx_errors.store(0, Ordering::Relaxed);
        self.rx_frames.store(0, Ordering::Relaxed);
        self.rx_timeouts.store(0, Ordering::Relaxed);
        self.rx_protocol_errors.store(0, Ordering::Relaxed);
        self.rx_errors.store(0, Ordering::Relaxed);
        self.sessions_closed.store(0, Ordering::Relaxed);
    }
}

/// 指标快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub iterations: u64,
    pub tx_commands: u64,
    pub tx_errors: u64,
    pub rx_frames: u64,
    pub rx_timeouts: u64,
    pub rx_protocol_errors: u64,
    pub rx_errors: u64,
    pub sessions_closed: u64,
}

impl MetricsSnapshot {
    /// 遥测丢失率（百分比）
    ///
    /// 没有成功收到帧的迭代占比。`iterations` 为 0 时返回 0.0。
    pub fn loss_rate(&self) -> f64 {
        if self.iterations == 0 {
            return 0.0;
        }
        let lost = self.iterations.saturating_sub(self.rx_frames);
        (lost as f64 / self.iterations as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_and_reset() {
        let metrics = LinkMetrics::new();
        metrics.iterations.fetch_add(10, Ordering::Relaxed);
        metrics.rx_frames.fetch_add(7, Ordering::Relaxed);
        metrics.rx_timeouts.fetch_add(3, Ordering::Relaxed);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.iterations, 10);
        assert_eq!(snapshot.rx_frames, 7);
        assert!((snapshot.loss_rate() - 30.0).abs() < 1e-9);

        metrics.reset();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_loss_rate_empty() {
        assert_eq!(MetricsSnapshot::default().loss_rate(), 0.0);
    }
}
