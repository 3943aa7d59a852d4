//! 遥测监控命令
//!
//! 以固定油门运行链路并打印遥测，直到 Ctrl+C、超过时长或模拟器退出。

use anyhow::{Context, Result, bail};
use clap::Args;
use copter_driver::{ControlLoop, LinkConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

use crate::utils::spawn_printer;

#[derive(Args, Debug, Clone)]
pub struct MonitorCommand {
    /// 所有电机的固定油门
    #[arg(long, default_value_t = 0.0)]
    pub throttle: f64,

    /// 运行时长（秒），不设置则一直运行
    #[arg(long)]
    pub duration: Option<f64>,

    /// 每 N 帧打印一帧遥测
    #[arg(long, default_value_t = 1)]
    pub print_every: u64,
}

impl MonitorCommand {
    pub fn execute(&self, config: LinkConfig, running: &AtomicBool) -> Result<()> {
        if !self.throttle.is_finite() {
            bail!("--throttle must be finite");
        }
        let duration = self
            .duration
            .map(Duration::try_from_secs_f64)
            .transpose()
            .context("--duration must be a non-negative number of seconds")?;

        let link = ControlLoop::new(config).context("创建链路失败")?;
        link.set_command(&vec![self.throttle; link.motor_count()])?;
        let printer = spawn_printer(link.subscribe(), self.print_every)?;
        link.start()?;
        info!("Monitoring telemetry on {}", link.telemetry_addr());

        let start = Instant::now();
        while running.load(Ordering::Acquire) && link.is_running() {
            if let Some(limit) = duration
                && start.elapsed() >= limit
            {
                break;
            }
            std::thread::sleep(Duration::from_millis(20));
        }

        link.halt();
        let frames = printer.join().unwrap_or(0);

        let metrics = link.metrics();
        println!(
            "frames: {} | timeouts: {} | malformed: {} | loss: {:.1}%",
            frames,
            metrics.rx_timeouts,
            metrics.rx_protocol_errors,
            metrics.loss_rate()
        );
        Ok(())
    }
}
