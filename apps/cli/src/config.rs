//! 链路配置
//!
//! 优先级：命令行参数 > `--config` 指定的 TOML 文件 > 内置默认值。
//!
//! ```toml
//! [link]
//! host = "127.0.0.1"
//! motor_port = 5000
//! telemetry_port = 5001
//! motor_count = 4
//! receive_timeout_ms = 1000
//! loop_rate_hz = 200.0
//! ```

use anyhow::{Context, Result};
use clap::Args;
use copter_driver::LinkConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// 配置文件结构
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub link: LinkConfig,
}

impl CliConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("解析配置文件失败: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// 所有子命令共享的链路参数
#[derive(Args, Debug, Clone, Default)]
pub struct LinkArgs {
    /// TOML 配置文件
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// 模拟器主机
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// 电机指令端口
    #[arg(long, global = true)]
    pub motor_port: Option<u16>,

    /// 遥测端口
    #[arg(long, global = true)]
    pub telemetry_port: Option<u16>,

    /// 电机数量
    #[arg(short, long, global = true)]
    pub motors: Option<usize>,

    /// 遥测接收超时（毫秒）
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// 控制循环频率（Hz），不设置则不限速
    #[arg(long, global = true)]
    pub rate: Option<f64>,
}

impl LinkArgs {
    /// 合并配置文件与命令行参数，并校验结果
    pub fn resolve(&self) -> Result<LinkConfig> {
        let base = match &self.config {
            Some(path) => CliConfig::load(path)?.link,
            None => LinkConfig::default(),
        };

        let config = self.apply(base);
        config.validate().context("链路配置无效")?;
        Ok(config)
    }

    fn apply(&self, mut config: LinkConfig) -> LinkConfig {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.motor_port {
            config.motor_port = port;
        }
        if let Some(port) = self.telemetry_port {
            config.telemetry_port = port;
        }
        if let Some(count) = self.motors {
            config.motor_count = count;
        }
        if let Some(timeout) = self.timeout_ms {
            config.receive_timeout_ms = timeout;
        }
        if self.rate.is_some() {
            config.loop_rate_hz = self.rate;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = CliConfig::parse(
            r#"
[link]
motor_count = 6
loop_rate_hz = 100.0
"#,
        )
        .unwrap();

        assert_eq!(config.link.motor_count, 6);
        assert_eq!(config.link.loop_rate_hz, Some(100.0));
        assert_eq!(config.link.motor_port, 5000);
        assert_eq!(config.link.host, "127.0.0.1");
    }

    #[test]
    fn test_empty_file_is_default() {
        let config = CliConfig::parse("").unwrap();
        assert_eq!(config.link, LinkConfig::default());
    }

    #[test]
    fn test_flags_override_file() {
        let args = LinkArgs {
            host: Some("10.0.0.5".to_string()),
            motors: Some(8),
            rate: Some(50.0),
            ..LinkArgs::default()
        };
        let base = LinkConfig {
            motor_count: 6,
            telemetry_port: 7001,
            ..LinkConfig::default()
        };

        let config = args.apply(base);
        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.motor_count, 8);
        assert_eq!(config.telemetry_port, 7001);
        assert_eq!(config.loop_rate_hz, Some(50.0));
    }

    #[test]
    fn test_resolve_rejects_invalid() {
        let args = LinkArgs {
            motors: Some(0),
            ..LinkArgs::default()
        };
        assert!(args.resolve().is_err());
    }

    #[test]
    fn test_unknown_field_type_is_error() {
        assert!(CliConfig::parse("[link]\nmotor_port = \"abc\"\n").is_err());
    }
}
