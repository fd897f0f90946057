use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::browser::BrowserSession;
use crate::error::{DriverError, DriverResult};

/// 启动 Chromium 并打开一个空白页面
///
/// `headless` 为假时显示浏览器窗口，方便操作员在结束前检查结果
pub async fn launch_browser(headless: bool) -> DriverResult<BrowserSession> {
    info!(
        "🚀 启动浏览器 ({})...",
        if headless { "无头模式" } else { "窗口模式" }
    );

    let builder = if headless {
        BrowserConfig::builder().new_headless_mode()
    } else {
        BrowserConfig::builder().with_head()
    };

    let config = builder
        .window_size(1200, 900)
        .args(vec![
            "--disable-gpu",
            "--no-sandbox",
            "--disable-blink-features=AutomationControlled",
        ])
        .build()
        .map_err(|e| {
            error!("配置浏览器失败: {}", e);
            DriverError::LaunchFailed(e)
        })?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        DriverError::LaunchFailed(e.to_string())
    })?;
    debug!("浏览器启动成功");

    // 在后台处理浏览器事件
    let handler = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建页面失败: {}", e);
        e
    })?;

    info!("✅ 浏览器已就绪");

    Ok(BrowserSession {
        browser,
        page,
        handler,
        attached: false,
    })
}
