//! 控制循环生命周期状态
//!
//! `Idle -> Running -> Stopped`，`Stopped` 为终态。

use std::sync::atomic::{AtomicU8, Ordering};

/// 控制循环状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum LoopState {
    /// 已构造，socket 已打开，控制线程尚未启动
    #[default]
    Idle = 0,

    /// 控制线程正在迭代
    Running = 1,

    /// 已停止，socket 已关闭（终态）
    Stopped = 2,
}

impl LoopState {
    /// 从 u8 转换
    ///
    /// 无效值视为 Stopped。
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Running,
            _ => Self::Stopped,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_running(self) -> bool {
        self == Self::Running
    }

    pub fn is_stopped(self) -> bool {
        self == Self::Stopped
    }
}

/// 控制循环状态（原子版本，用于线程间共享）
///
/// # 示例
///
/// ```rust
/// use copter_driver::state::{AtomicLoopState, LoopState};
/// use std::sync::atomic::Ordering;
///
/// let state = AtomicLoopState::new(LoopState::Idle);
/// assert!(state.transition(LoopState::Idle, LoopState::Running));
/// // 重复启动失败
/// assert!(!state.transition(LoopState::Idle, LoopState::Running));
/// assert_eq!(state.get(Ordering::Acquire), LoopState::Running);
/// ```
#[derive(Debug)]
pub struct AtomicLoopState {
    inner: AtomicU8,
}

impl AtomicLoopState {
    pub fn new(state: LoopState) -> Self {
        Self {
            inner: AtomicU8::new(state.as_u8()),
        }
    }

    pub fn get(&self, ordering: Ordering) -> LoopState {
        LoopState::from_u8(self.inner.load(ordering))
    }

    pub fn set(&self, state: LoopState, ordering: Ordering) {
        self.inner.store(state.as_u8(), ordering);
    }

    /// 状态迁移（Compare-and-Swap，AcqRel）
    ///
    /// 当前状态等于 `from` 时迁移到 `to` 并返回 true。
    pub fn transition(&self, from: LoopState, to: LoopState) -> bool {
        self.inner
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
