//! 本地模拟器命令
//!
//! 不依赖外部模拟器的联调工具：在电机端口上应答指令，回发一个只有竖直方向的玩具模型。
//! 退出时发送退出帧，客户端随之停止。

use anyhow::{Context, Result, bail};
use clap::Args;
use copter_driver::{Endpoint, LinkConfig, MotorCommand, SimPeer, TelemetryFrame};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

/// 重力加速度（m/s²）
const GRAVITY: f64 = 9.81;

#[derive(Args, Debug, Clone)]
pub struct SimCommand {
    /// 悬停油门（平均油门等于此值时加速度为 0）
    #[arg(long, default_value_t = 0.5)]
    pub hover: f64,

    /// 运行时长（秒），不设置则直到 Ctrl+C
    #[arg(long)]
    pub duration: Option<f64>,
}

/// 竖直方向玩具模型
///
/// 平均油门 `hover` 时推力恰好抵消重力，地面高度为 0。
#[derive(Debug, Clone)]
pub struct HoverModel {
    hover: f64,
    time: f64,
    altitude: f64,
    climb_rate: f64,
}

impl HoverModel {
    pub fn new(hover: f64) -> Self {
        Self {
            hover,
            time: 0.0,
            altitude: 0.0,
            climb_rate: 0.0,
        }
    }

    /// 前进 `dt` 秒并生成遥测帧
    pub fn step(&mut self, command: &MotorCommand, dt: f64) -> TelemetryFrame {
        let throttle = if command.is_empty() {
            0.0
        } else {
            command.iter().sum::<f64>() / command.len() as f64
        };
        let accel = GRAVITY * (throttle / self.hover - 1.0);

        self.time += dt;
        self.climb_rate += accel * dt;
        self.altitude += self.climb_rate * dt;
        if self.altitude <= 0.0 {
            self.altitude = 0.0;
            self.climb_rate = self.climb_rate.max(0.0);
        }

        TelemetryFrame {
            timestamp: self.time,
            gyro: [0.0; 3],
            quaternion: [1.0, 0.0, 0.0, 0.0],
            position: [0.0, 0.0, self.altitude],
        }
    }
}

impl SimCommand {
    pub fn execute(&self, config: LinkConfig, running: &AtomicBool) -> Result<()> {
        if !(self.hover.is_finite() && self.hover > 0.0) {
            bail!("--hover must be greater than zero");
        }
        let duration = self
            .duration
            .map(Duration::try_from_secs_f64)
            .transpose()
            .context("--duration must be a non-negative number of seconds")?;

        let endpoint = Endpoint::resolve(&config.host, config.motor_port, config.telemetry_port)?;
        let bind_ip = match endpoint.host() {
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        };
        let mut peer = SimPeer::bind(
            SocketAddr::new(bind_ip, endpoint.motor_port()),
            SocketAddr::new(endpoint.host(), endpoint.telemetry_port()),
            config.motor_count,
            config.receive_timeout(),
        )
        .context("启动模拟器失败")?;

        let serving = AtomicBool::new(true);
        let started = Instant::now();
        let mut model = HoverModel::new(self.hover);
        let mut last_step = Instant::now();

        let served = std::thread::scope(|scope| {
            // 看门狗：Ctrl+C 或时长到达时停止应答
            scope.spawn(|| {
                while serving.load(Ordering::Acquire) {
                    let expired = duration.is_some_and(|limit| started.elapsed() >= limit);
                    if expired || !running.load(Ordering::Acquire) {
                        serving.store(false, Ordering::Release);
                        break;
                    }
                    std::thread::sleep(Duration::from_millis(20));
                }
            });

            let result = peer.serve(&serving, |command| {
                let now = Instant::now();
                let dt = now.duration_since(last_step).as_secs_f64();
                last_step = now;
                model.step(command, dt)
            });
            serving.store(false, Ordering::Release);
            result
        })?;

        info!(
            "Simulator served {} commands in {:.1}s",
            served,
            started.elapsed().as_secs_f64()
        );
        Ok(())
    }
}
