//! 日志工具模块
//!
//! 初始化 tracing（终端 + 日志文件），并提供流程日志的辅助函数

use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use anyhow::Result;
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use crate::models::{ClassGroup, GroupedWork};
use crate::source::EventInfo;
use crate::workflow::RunReport;

/// 初始化日志
///
/// 先写入日志文件头，再安装两个输出层：终端与日志文件。
/// 过滤级别取自 `RUST_LOG`，默认 `info`。
pub fn init(log_file_path: &str) -> Result<()> {
    init_log_file(log_file_path)?;
    let file = OpenOptions::new().append(true).open(log_file_path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()?;
    Ok(())
}

/// 初始化日志文件（覆盖旧内容）
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n学生表现上传日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

// ========== 日志辅助函数 ==========

pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 学生表现批量上传");
    info!("📄 Excel: {}", config.excel_file);
    match config.browser_debug_port {
        Some(port) => info!("🌐 连接已打开的浏览器 (端口: {})", port),
        None => info!("🌐 启动浏览器 (无头模式: {})", config.headless),
    }
    info!("{}", "=".repeat(60));
}

pub fn log_plan(event: &EventInfo, work: &GroupedWork) {
    info!("  日期: {}, 活动: {}", event.date, event.activity_code);
    info!(
        "✓ 共 {} 个班级，{} 位学生",
        work.class_count(),
        work.total_students()
    );
    if work.duplicates > 0 {
        info!("  已跳过重复行: {}", work.duplicates);
    }
}

pub fn log_group_start(index: usize, total: usize, group: &ClassGroup) {
    info!(
        "\n  [{}/{}] 班级: {}（{} 位）",
        index,
        total,
        group.class_code,
        group.len()
    );
}

/// 打印最终统计信息
pub fn print_final_stats(report: &RunReport, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    if let Some(label) = &report.activity_label {
        info!("🏷️ 活动: {}", label);
    }
    info!("✅ 成功添加: {}", report.found);
    info!("❌ 未找到: {}", report.missing);
    info!("📝 已回填: {}", report.reconciled);
    info!("📤 已提交: {}", if report.submitted { "是" } else { "否" });
    info!("{}", "=".repeat(60));
    match serde_json::to_string(report) {
        Ok(json) => debug!("运行结果: {}", json),
        Err(e) => debug!("运行结果序列化失败: {}", e),
    }
    info!("\n日志已保存至: {}", log_file_path);
}
