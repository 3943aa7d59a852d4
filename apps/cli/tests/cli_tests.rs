//! 命令行端到端测试

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn cli() -> Command {
    Command::cargo_bin("copter-cli").unwrap()
}

#[test]
fn test_help_lists_subcommands() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("fly"))
        .stdout(predicate::str::contains("monitor"))
        .stdout(predicate::str::contains("sim"));
}

#[test]
fn test_missing_config_file_fails() {
    cli()
        .args(["--config", "/nonexistent/copter.toml", "monitor"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("copter.toml"));
}

#[test]
fn test_invalid_motor_count_fails() {
    cli()
        .args(["--motors", "0", "monitor", "--duration", "0.1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("motor_count"));
}

/// 配置文件 + 命令行覆盖，模拟器不在线时按时长正常退出
#[test]
fn test_monitor_with_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[link]\nmotor_port = 9\ntelemetry_port = 0\nreceive_timeout_ms = 20\n"
    )
    .unwrap();

    cli()
        .args(["--config"])
        .arg(file.path())
        .args(["monitor", "--duration", "0.2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("frames: 0"));
}
