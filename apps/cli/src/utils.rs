//! 命令共用的小工具

use copter_driver::TelemetryStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// 可被 Ctrl+C 打断的睡眠
///
/// 返回 `false` 表示中途收到停止信号。
pub fn sleep_while_running(running: &AtomicBool, duration: Duration) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if !running.load(Ordering::Acquire) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        std::thread::sleep((deadline - now).min(Duration::from_millis(50)));
    }
}

/// 打印遥测的后台线程，链路停止（流结束）后退出
///
/// `every` 为 N 时每 N 帧打印一帧。返回收到的总帧数。
pub fn spawn_printer(stream: TelemetryStream, every: u64) -> std::io::Result<JoinHandle<u64>> {
    let every = every.max(1);
    std::thread::Builder::new()
        .name("telemetry-printer".into())
        .spawn(move || {
            let mut count = 0u64;
            for frame in stream.iter() {
                if count % every == 0 {
                    println!("{}", frame);
                }
                count += 1;
            }
            count
        })
}

/// 安装 Ctrl+C 处理器，返回运行标志
pub fn install_interrupt_flag() -> anyhow::Result<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nReceived interrupt signal. Shutting down...");
        flag.store(false, Ordering::Release);
    })?;
    Ok(running)
}
