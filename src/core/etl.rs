use crate::core::Pipeline;
use crate::domain::model::LoadResult;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct MenuEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> MenuEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// Parse, resolve, render and package. Days that fail are returned in
    /// `LoadResult::failures`; only whole-run errors come back as `Err`.
    pub async fn run(&self) -> Result<LoadResult> {
        tracing::info!("🚀 Starting daily menu generation");

        tracing::info!("📥 Reading weekly grid...");
        let week = self.pipeline.extract().await?;
        tracing::info!("✅ Parsed {} days", week.days().len());
        self.monitor.log_stats("Extract");

        tracing::info!("🔄 Resolving menus and rendering documents...");
        let transformed = self.pipeline.transform(&week).await?;
        tracing::info!(
            "✅ Rendered {} day(s), {} failed",
            transformed.rendered.len(),
            transformed.failures.len()
        );
        self.monitor.log_stats("Transform");

        tracing::info!("💾 Writing archives...");
        let loaded = self.pipeline.load(&week, transformed).await?;
        for path in &loaded.archives {
            tracing::info!("📦 {}", path);
        }
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(loaded)
    }

    /// Extract and resolve only; nothing is rendered or written.
    pub async fn preview(&self) -> Result<serde_json::Value> {
        tracing::info!("🔍 Dry run: resolving menus without writing");
        let week = self.pipeline.extract().await?;
        let preview = self.pipeline.preview(&week).await?;
        self.monitor.log_final_stats();
        Ok(preview)
    }
}
