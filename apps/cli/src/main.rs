//! # Copter CLI
//!
//! Command-line interface for the multicopter simulator link.
//!
//! ```bash
//! # 油门阶梯演示（每 2 秒加 0.1，共 10 步）
//! copter-cli fly
//!
//! # 固定油门监控遥测
//! copter-cli monitor --throttle 0.55 --duration 10
//!
//! # 另一个终端里启动本地模拟器
//! copter-cli sim --hover 0.5
//!
//! # 使用配置文件，命令行参数优先
//! copter-cli --config copter.toml --motors 6 monitor
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;
mod utils;

use commands::{FlyCommand, MonitorCommand, SimCommand};
use config::LinkArgs;

/// Copter CLI - 多旋翼模拟器链路工具
#[derive(Parser, Debug)]
#[command(name = "copter-cli")]
#[command(about = "Command-line interface for the multicopter simulator link", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    link: LinkArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 油门阶梯演示
    Fly {
        #[command(flatten)]
        args: FlyCommand,
    },

    /// 以固定油门监控遥测
    Monitor {
        #[command(flatten)]
        args: MonitorCommand,
    },

    /// 运行本地模拟器（链路的另一端）
    Sim {
        #[command(flatten)]
        args: SimCommand,
    },
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("copter_cli=info,copter_driver=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.link.resolve()?;
    let running = utils::install_interrupt_flag()?;

    match cli.command {
        Commands::Fly { args } => args.execute(config, &running),
        Commands::Monitor { args } => args.execute(config, &running),
        Commands::Sim { args } => args.execute(config, &running),
    }
}
