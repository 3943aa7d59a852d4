//! 油门阶梯演示
//!
//! 每隔 `interval` 把当前油门写入链路，然后所有电机加 `increment`，共 `steps` 步。
//! 默认参数：2 秒间隔，步长 0.1，10 步，第一步写入的是 0。

use anyhow::{Context, Result};
use clap::Args;
use copter_driver::{ControlLoop, LinkConfig};
use std::sync::atomic::AtomicBool;
use std::time::Duration;
use tracing::info;

use crate::utils::{sleep_while_running, spawn_printer};

/// 演示参数
#[derive(Args, Debug, Clone)]
pub struct FlyCommand {
    /// 步数
    #[arg(long, default_value_t = 10)]
    pub steps: u32,

    /// 每步的油门增量
    #[arg(long, default_value_t = 0.1)]
    pub increment: f64,

    /// 步间隔（秒）
    #[arg(long, default_value_t = 2.0)]
    pub interval: f64,

    /// 每 N 帧打印一帧遥测（0 表示不打印）
    #[arg(long, default_value_t = 1)]
    pub print_every: u64,
}

impl FlyCommand {
    /// 第 `step` 步写入的油门
    pub fn throttle_at(&self, step: u32) -> f64 {
        self.increment * step as f64
    }

    pub fn execute(&self, config: LinkConfig, running: &AtomicBool) -> Result<()> {
        let interval = Duration::try_from_secs_f64(self.interval)
            .context("--interval must be a non-negative number of seconds")?;

        let link = ControlLoop::new(config).context("创建链路失败")?;
        let printer = if self.print_every > 0 {
            Some(spawn_printer(link.subscribe(), self.print_every)?)
        } else {
            None
        };
        link.start()?;

        let motor_count = link.motor_count();
        for step in 0..self.steps {
            if !sleep_while_running(running, interval) {
                break;
            }
            let throttle = self.throttle_at(step);
            link.set_command(&vec![throttle; motor_count])?;
            info!("Step {}/{}: throttle {:.2}", step + 1, self.steps, throttle);
        }

        link.halt();
        if let Some(printer) = printer {
            let _ = printer.join();
        }

        let metrics = link.metrics();
        info!(
            "Flight finished: {} iterations, {} frames, loss rate {:.1}%",
            metrics.iterations,
            metrics.rx_frames,
            metrics.loss_rate()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> FlyCommand {
        FlyCommand {
            steps: 10,
            increment: 0.1,
            interval: 2.0,
            print_every: 1,
        }
    }

    #[test]
    fn test_throttle_schedule_starts_at_zero() {
        let cmd = defaults();
        assert_eq!(cmd.throttle_at(0), 0.0);
        assert!((cmd.throttle_at(9) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_negative_interval_rejected() {
        let cmd = FlyCommand {
            interval: -1.0,
            ..defaults()
        };
        let running = AtomicBool::new(true);
        assert!(cmd.execute(LinkConfig::default(), &running).is_err());
    }
}
