use crate::analysis::ShipmentReport;
use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::{StageReport, SystemMonitor};

/// 一次執行的結果：報表路徑與統計內容
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub output_path: String,
    pub report: ShipmentReport,
}

pub struct ReportEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> ReportEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// 已完成階段的筆數與耗時
    pub fn stage_reports(&self) -> Vec<StageReport> {
        self.monitor.stages()
    }

    pub async fn run(&self) -> Result<RunOutput> {
        tracing::info!("🚀 Starting shipment analysis");

        // Extract
        let table = self.pipeline.extract().await?;
        tracing::info!(
            "📥 Extracted {} records ({} columns)",
            table.len(),
            table.headers.len()
        );
        self.monitor.record_stage("Extract", table.len());

        // Transform
        let result = self.pipeline.transform(table).await?;
        tracing::info!(
            "🔄 Analysed {} records into {} report tables",
            result.report.analysed_records,
            result.tables.len()
        );
        for warning in &result.report.warnings {
            tracing::warn!("⚠️ {}", warning);
        }
        self.monitor.record_stage("Transform", result.report.analysed_records);

        // Load
        let report = result.report.clone();
        let table_count = result.tables.len();
        let output_path = self.pipeline.load(result).await?;
        tracing::info!("💾 Report saved to: {}", output_path);
        self.monitor.record_stage("Load", table_count);

        self.monitor.log_summary();
        Ok(RunOutput {
            output_path,
            report,
        })
    }
}
