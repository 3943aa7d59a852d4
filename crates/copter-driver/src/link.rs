//! ControlLoop 对外 API
//!
//! 持有链路会话和控制线程句柄，调用者线程只通过无锁结构与控制线程交互。

use crate::config::LinkConfig;
use crate::endpoint::Endpoint;
use crate::error::DriverError;
use crate::hooks::{HookManager, TelemetryCallback};
use crate::metrics::MetricsSnapshot;
use crate::pipeline::{LatestFrame, LinkContext, LoopSettings, control_loop};
use crate::session::LinkSession;
use crate::state::LoopState;
use crate::stream::{TelemetryStream, telemetry_stream};
use copter_protocol::{MotorCommand, TelemetryFrame};
use parking_lot::{Mutex, RwLock};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread::{JoinHandle, spawn};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// 带告警的线程 join
///
/// 超过 `warn_after` 仍未结束时记录告警，然后继续等待，返回时线程一定已经结束。
trait JoinWatched {
    fn join_watched(self, warn_after: Duration) -> std::thread::Result<()>;
}

impl<T: Send + 'static> JoinWatched for JoinHandle<T> {
    fn join_watched(self, warn_after: Duration) -> std::thread::Result<()> {
        let (tx, rx) = crossbeam_channel::bounded(1);

        // 看门狗线程负责真正的 join
        spawn(move || {
            let _ = tx.send(self.join());
        });

        let joined = match rx.recv_timeout(warn_after) {
            Ok(join_result) => Ok(join_result),
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                warn!(
                    "Control thread still running after {:?}, waiting for the current iteration",
                    warn_after
                );
                rx.recv().map_err(|_| ())
            },
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => Err(()),
        };

        match joined {
            Ok(join_result) => join_result.map(|_| ()),
            Err(()) => Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "Thread panicked during join",
            ))),
        }
    }
}

/// 多旋翼模拟器控制链路
///
/// 生命周期：`Idle --start--> Running --halt/退出帧--> Stopped`，`Stopped` 为终态。
///
/// # Example
///
/// ```no_run
/// use copter_driver::{ControlLoop, LinkConfig};
/// use std::time::Duration;
///
/// let link = ControlLoop::new(LinkConfig::default())?;
/// link.start()?;
///
/// link.set_command(&[0.5, 0.5, 0.5, 0.5])?;
/// let frame = link.wait_for_telemetry(Duration::from_secs(2))?;
/// println!("{}", frame);
///
/// link.halt();
/// # Ok::<(), copter_driver::DriverError>(())
/// ```
pub struct ControlLoop {
    ctx: Arc<LinkContext>,
    /// 尚未交给控制线程的会话（`Idle` 状态下持有）
    session: Mutex<Option<LinkSession>>,
    /// 控制线程句柄；`start` 和 `halt` 都先获取这把锁，两者互斥
    handle: Mutex<Option<JoinHandle<()>>>,
    endpoint: Endpoint,
    telemetry_addr: SocketAddr,
    settings: LoopSettings,
    receive_timeout: Duration,
    stream_capacity: usize,
}

impl ControlLoop {
    /// 按配置创建链路（立即绑定遥测端口，但不启动控制线程）
    ///
    /// # 错误
    /// - `DriverError::InvalidConfig`: 配置非法
    /// - `DriverError::InvalidAddress`: 主机无法解析
    /// - `DriverError::Bind`: 遥测端口无法绑定
    pub fn new(config: LinkConfig) -> Result<Self, DriverError> {
        config.validate()?;
        let endpoint = Endpoint::resolve(&config.host, config.motor_port, config.telemetry_port)?;
        Self::with_endpoint(endpoint, &config)
    }

    /// 使用已解析的端点创建链路（忽略 `config` 中的地址字段）
    pub fn with_endpoint(endpoint: Endpoint, config: &LinkConfig) -> Result<Self, DriverError> {
        config.validate()?;
        let receive_timeout = config.receive_timeout();
        let session = LinkSession::open(&endpoint, config.motor_count, receive_timeout)?;
        let telemetry_addr = session.telemetry_addr()?;

        info!(
            "Copter link ready: {} motors -> {}, telemetry on {}",
            config.motor_count,
            endpoint.motor_addr(),
            telemetry_addr
        );

        Ok(Self {
            ctx: Arc::new(LinkContext::new(config.motor_count)),
            session: Mutex::new(Some(session)),
            handle: Mutex::new(None),
            endpoint,
            telemetry_addr,
            settings: LoopSettings {
                pacing: config.pacing(),
                halt_on_shutdown_frame: config.halt_on_shutdown_frame,
            },
            receive_timeout,
            stream_capacity: config.stream_capacity,
        })
    }

    /// 启动控制线程
    ///
    /// # 错误
    /// - `DriverError::AlreadyRunning`: 已在运行
    /// - `DriverError::Stopped`: 已停止（不可重启）
    /// - `DriverError::IoThread`: 线程创建失败
    pub fn start(&self) -> Result<(), DriverError> {
        let mut handle_guard = self.handle.lock();

        if !self.ctx.state.transition(LoopState::Idle, LoopState::Running) {
            return Err(match self.state() {
                LoopState::Running => DriverError::AlreadyRunning,
                _ => DriverError::Stopped,
            });
        }

        let Some(session) = self.session.lock().take() else {
            self.ctx.state.set(LoopState::Stopped, Ordering::Release);
            return Err(DriverError::Stopped);
        };

        self.ctx.is_running.store(true, Ordering::Release);

        let ctx = self.ctx.clone();
        let settings = self.settings;
        let spawned = std::thread::Builder::new()
            .name("copter-link".into())
            .spawn(move || control_loop(session, ctx, settings));

        match spawned {
            Ok(handle) => {
                *handle_guard = Some(handle);
                info!("Control loop started ({:?})", self.settings.pacing);
                Ok(())
            },
            Err(e) => {
                self.ctx.is_running.store(false, Ordering::Release);
                self.ctx.hooks.write().clear();
                self.ctx.state.set(LoopState::Stopped, Ordering::Release);
                Err(DriverError::IoThread(e.to_string()))
            },
        }
    }

    /// 停止控制链路
    ///
    /// 幂等：重复调用、在 `Idle` 状态调用都安全。返回时两个 socket 已关闭，
    /// 状态为 `Stopped`。控制线程卡在回调里时，`halt` 会一直等到该次迭代结束。
    ///
    /// 唯一的例外是在控制线程的回调里调用：此时只清除运行标志，循环在本次迭代后退出。
    pub fn halt(&self) {
        let mut handle_guard = self.handle.lock();

        match self.state() {
            LoopState::Idle => {
                if self.ctx.state.transition(LoopState::Idle, LoopState::Stopped) {
                    if let Some(session) = self.session.lock().take() {
                        session.close(&self.ctx.metrics);
                    }
                    self.ctx.hooks.write().clear();
                    info!("Copter link halted before start");
                }
            },
            LoopState::Running | LoopState::Stopped => {
                self.ctx.is_running.store(false, Ordering::Release);

                let Some(handle) = handle_guard.take() else {
                    return;
                };

                // 在回调中调用 halt：只能通知，不能 join 自己
                if handle.thread().id() == std::thread::current().id() {
                    warn!("halt() called from the control thread; loop will exit after this iteration");
                    *handle_guard = Some(handle);
                    return;
                }

                let warn_after = self.join_warn_after();
                if handle.join_watched(warn_after).is_ok() {
                    debug!("Control thread joined");
                } else {
                    // 会话随栈展开释放，这里补上停止状态
                    error!("Control thread panicked");
                    self.ctx.hooks.write().clear();
                    self.ctx.state.set(LoopState::Stopped, Ordering::Release);
                }
            },
        }
    }

    /// 正常退出的上界：最长一次接收 + 1 秒余量（节拍睡眠会随停止标志提前返回）
    fn join_warn_after(&self) -> Duration {
        self.receive_timeout
            .checked_add(Duration::from_secs(1))
            .unwrap_or(Duration::MAX)
    }

    /// 当前生命周期状态
    pub fn state(&self) -> LoopState {
        self.ctx.state.get(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.state().is_running()
    }

    /// 写入下一条电机指令（任意线程，任意状态）
    ///
    /// # 错误
    /// - `DriverError::Size`: 长度与电机数量不符，已有指令保持不变
    pub fn set_command(&self, values: &[f64]) -> Result<(), DriverError> {
        self.ctx.commands.set(values)
    }

    /// 当前指令的一致快照
    pub fn command_snapshot(&self) -> Arc<MotorCommand> {
        self.ctx.commands.snapshot()
    }

    pub fn motor_count(&self) -> usize {
        self.ctx.commands.motor_count()
    }

    /// 最近一帧遥测（无锁）
    pub fn latest_telemetry(&self) -> Option<TelemetryFrame> {
        self.ctx.latest_telemetry.load().as_deref().map(|latest| latest.frame)
    }

    /// 序号大于 `after` 的最新帧
    fn telemetry_after(&self, after: u64) -> Option<LatestFrame> {
        self.ctx
            .latest_telemetry
            .load()
            .as_deref()
            .copied()
            .filter(|latest| latest.seq > after)
    }

    /// 等待调用之后到达的下一帧遥测
    ///
    /// 以帧序号判断新旧，调用前已经存在的帧不会被返回。
    ///
    /// # 错误
    /// - `DriverError::Timeout`: 超时内没有新帧
    /// - `DriverError::Stopped`: 链路已停止且没有新帧
    pub fn wait_for_telemetry(&self, timeout: Duration) -> Result<TelemetryFrame, DriverError> {
        let baseline = self.telemetry_after(0).map_or(0, |latest| latest.seq);
        let start = Instant::now();

        loop {
            if let Some(latest) = self.telemetry_after(baseline) {
                return Ok(latest.frame);
            }

            if self.state().is_stopped() {
                return Err(DriverError::Stopped);
            }

            if start.elapsed() >= timeout {
                return Err(DriverError::Timeout);
            }

            std::thread::sleep(Duration::from_millis(1));
        }
    }

    /// 订阅遥测流
    ///
    /// 每个订阅者拥有独立的有界队列（容量来自配置）。链路停止后流结束。
    pub fn subscribe(&self) -> TelemetryStream {
        let (hook, stream) = telemetry_stream(self.stream_capacity);
        if self.state().is_stopped() {
            // hook 立即丢弃，流直接结束
            return stream;
        }
        self.ctx.hooks.write().add_callback(Arc::new(hook));
        stream
    }

    /// 注册回调
    pub fn add_callback(&self, callback: Arc<dyn TelemetryCallback>) {
        self.ctx.hooks.write().add_callback(callback);
    }

    /// 钩子管理器（高级用法）
    pub fn hooks(&self) -> Arc<RwLock<HookManager>> {
        self.ctx.hooks.clone()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.ctx.metrics.snapshot()
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// 实际绑定的遥测地址
    pub fn telemetry_addr(&self) -> SocketAddr {
        self.telemetry_addr
    }
}

impl Drop for ControlLoop {
    fn drop(&mut self) {
        self.halt();
    }
}
