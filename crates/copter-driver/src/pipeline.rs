//! Pipeline 控制循环模块
//!
//! 控制线程的迭代逻辑：发送最新电机指令 → 带超时接收遥测 → 节拍让出。
//! 单次迭代内的任何错误都会被分类、记录并上报给钩子，但不会终止循环。

use crate::command_buffer::CommandBuffer;
use crate::config::Pacing;
use crate::error::DriverError;
use crate::hooks::HookManager;
use crate::metrics::LinkMetrics;
use crate::session::LinkSession;
use crate::state::{AtomicLoopState, LoopState};
use arc_swap::ArcSwapOption;
use copter_protocol::TelemetryFrame;
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{info, trace, warn};

/// 定频睡眠的最长单片，保证停止标志在一个单片内被看到
const PACE_SLICE: Duration = Duration::from_millis(20);

/// 带序号的最新遥测帧
///
/// 序号从 1 开始，每收到一帧加一，只由控制线程写入。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatestFrame {
    pub seq: u64,
    pub frame: TelemetryFrame,
}

/// 控制线程与调用者线程共享的上下文
///
/// 调用者只通过 `commands`（写）和 `is_running`（停止标志）影响控制线程。
pub struct LinkContext {
    /// 最新电机指令
    pub commands: CommandBuffer,
    /// 最新遥测帧及其序号（无锁读取）
    pub latest_telemetry: ArcSwapOption<LatestFrame>,
    /// 运行时回调
    pub hooks: Arc<RwLock<HookManager>>,
    /// 性能指标
    pub metrics: Arc<LinkMetrics>,
    /// 协作式停止标志
    pub is_running: AtomicBool,
    /// 生命周期状态
    pub state: AtomicLoopState,
}

impl LinkContext {
    pub fn new(motor_count: usize) -> Self {
        Self {
            commands: CommandBuffer::new(motor_count),
            latest_telemetry: ArcSwapOption::empty(),
            hooks: Arc::new(RwLock::new(HookManager::new())),
            metrics: Arc::new(LinkMetrics::new()),
            is_running: AtomicBool::new(false),
            state: AtomicLoopState::new(LoopState::Idle),
        }
    }
}

/// 控制循环参数（POD）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSettings {
    pub pacing: Pacing,
    /// 收到退出帧后自动停止
    pub halt_on_shutdown_frame: bool,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            pacing: Pacing::Yield,
            halt_on_shutdown_frame: true,
        }
    }
}

/// 单次迭代的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationOutcome {
    /// 继续下一次迭代
    Continue,
    /// 收到模拟器退出帧，循环应当停止
    Shutdown,
}

/// 执行一次迭代（发送一次，接收一次）
///
/// 阻塞只发生在接收上，上限为遥测通道的超时。
pub fn run_iteration(
    session: &mut LinkSession,
    ctx: &LinkContext,
    settings: &LoopSettings,
) -> IterationOutcome {
    let mut outcome = IterationOutcome::Continue;

    // ============================================================
    // 1. 发送最新电机指令（失败不影响接收）
    // ============================================================
    let command = ctx.commands.snapshot();
    match session.sender.send(&command) {
        Ok(_) => {
            ctx.metrics.tx_commands.fetch_add(1, Ordering::Relaxed);
            ctx.hooks.read().trigger_all_sent(&command);
        },
        Err(e) => {
            ctx.metrics.tx_errors.fetch_add(1, Ordering::Relaxed);
            warn!("Failed to send motor command: {}", e);
            ctx.hooks.read().trigger_error(&e);
        },
    }

    // ============================================================
    // 2. 接收遥测（带超时）
    // ============================================================
    match session.telemetry.receive_one() {
        Ok(frame) => {
            // 帧和序号一起发布，读者不会看到序号与帧错位
            let seq = ctx.latest_telemetry.load().as_deref().map_or(0, |latest| latest.seq) + 1;
            ctx.latest_telemetry.store(Some(Arc::new(LatestFrame { seq, frame })));
            ctx.metrics.rx_frames.fetch_add(1, Ordering::Release);
            ctx.hooks.read().trigger_all(&frame);

            if settings.halt_on_shutdown_frame && frame.is_shutdown() {
                info!("Simulator shutdown frame received (t = {})", frame.timestamp);
                outcome = IterationOutcome::Shutdown;
            }
        },
        Err(e) => {
            match &e {
                // 丢包时的正常现象
                DriverError::Timeout => {
                    ctx.metrics.rx_timeouts.fetch_add(1, Ordering::Relaxed);
                    trace!("Telemetry receive timeout");
                },
                DriverError::Protocol(inner) => {
                    ctx.metrics.rx_protocol_errors.fetch_add(1, Ordering::Relaxed);
                    warn!("Dropping malformed telemetry datagram: {}", inner);
                },
                other => {
                    ctx.metrics.rx_errors.fetch_add(1, Ordering::Relaxed);
                    warn!("Telemetry receive error: {}", other);
                },
            }
            ctx.hooks.read().trigger_error(&e);
        },
    }

    ctx.metrics.iterations.fetch_add(1, Ordering::Relaxed);
    outcome
}

/// 控制线程主循环
///
/// 每次迭代之间检查停止标志；退出后关闭会话（两个 socket）、
/// 清空回调（遥测流随之结束），最后把状态置为 `Stopped`。
///
/// # 参数
/// - `session`: 链路会话（移动进控制线程，由本函数负责关闭）
/// - `ctx`: 共享上下文
/// - `settings`: 循环参数
pub fn control_loop(mut session: LinkSession, ctx: Arc<LinkContext>, settings: LoopSettings) {
    let mut next_deadline = Instant::now();

    loop {
        // Acquire: 与 halt() 中的 Release 配对
        if !ctx.is_running.load(Ordering::Acquire) {
            trace!("Control loop: is_running flag is false, exiting");
            break;
        }

        if run_iteration(&mut session, &ctx, &settings) == IterationOutcome::Shutdown {
            ctx.is_running.store(false, Ordering::Release);
            break;
        }

        pace(settings.pacing, &mut next_deadline, &ctx.is_running);
    }

    session.close(&ctx.metrics);
    ctx.hooks.write().clear();
    ctx.state.set(LoopState::Stopped, Ordering::Release);

    let metrics = ctx.metrics.snapshot();
    info!(
        "Control loop stopped after {} iterations ({} frames, {} timeouts)",
        metrics.iterations, metrics.rx_frames, metrics.rx_timeouts
    );
}

/// 迭代之间的节拍点
///
/// 定频模式下错过的截止时间不追赶，直接从当前时刻重新计时。
/// 睡眠按 `PACE_SLICE` 分片，停止标志清除后立即返回。
fn pace(pacing: Pacing, next_deadline: &mut Instant, running: &AtomicBool) {
    let period = match pacing {
        Pacing::Yield => {
            std::thread::yield_now();
            return;
        },
        Pacing::Period(period) => period,
    };

    let now = Instant::now();
    let Some(deadline) = next_deadline.checked_add(period) else {
        // 截止时间超出 Instant 范围：睡到停止为止
        *next_deadline = now;
        while running.load(Ordering::Acquire) {
            spin_sleep::sleep(PACE_SLICE);
        }
        return;
    };

    if deadline <= now {
        *next_deadline = now;
        return;
    }
    *next_deadline = deadline;

    while running.load(Ordering::Acquire) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        spin_sleep::sleep((deadline - now).min(PACE_SLICE));
    }
}
