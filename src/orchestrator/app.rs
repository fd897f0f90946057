use anyhow::{Context, Result};
use tracing::info;

use crate::browser::{self, BrowserSession};
use crate::config::Config;
use crate::infrastructure::ChromeDriver;
use crate::layout::PageLayout;
use crate::orchestrator::controller::WorkflowController;
use crate::orchestrator::preflight::preflight;
use crate::source::{SettingsFile, XlsxGrid};
use crate::utils::logging;

/// 应用主结构
pub struct App {
    config: Config,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::log_startup(&config);
        Ok(Self { config })
    }

    /// 运行应用主逻辑
    ///
    /// 预检全部通过之后才会启动浏览器
    pub async fn run(self) -> Result<()> {
        info!("[0/6] 读取设置和 Excel 资料...");
        let mut grid = XlsxGrid::open(&self.config.excel_file)
            .with_context(|| format!("无法打开 Excel: {}", self.config.excel_file))?;

        let settings = SettingsFile::new(&self.config.setting_file);
        let plan = preflight(&grid, Some(&settings))?;

        let session = open_session(&self.config).await?;
        let layout =
            PageLayout::default().with_urls(&self.config.login_url, &self.config.activity_url);
        let mut controller =
            WorkflowController::new(ChromeDriver::new(session), layout, self.config.clone());

        controller.run(&plan, &mut grid).await?;
        Ok(())
    }
}

/// 连接已打开的浏览器，或启动一个新的
async fn open_session(config: &Config) -> Result<BrowserSession> {
    let session = match config.browser_debug_port {
        Some(port) => browser::connect_to_browser(port)
            .await
            .with_context(|| format!("无法连接浏览器调试端口 {}", port))?,
        None => browser::launch_browser(config.headless)
            .await
            .context("无法启动浏览器")?,
    };
    Ok(session)
}
