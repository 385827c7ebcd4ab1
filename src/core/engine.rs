use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::HarvestMonitor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestSummary {
    pub output_path: String,
    pub requested: usize,
    pub resolved: usize,
}

pub struct HarvestEngine<P: Pipeline> {
    pipeline: P,
    monitor: HarvestMonitor,
}

impl<P: Pipeline> HarvestEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: HarvestMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<HarvestSummary> {
        tracing::info!("🚀 Starting harvest");
        self.monitor.log_phase("Start");

        // Extract
        let records = self.pipeline.extract().await?;
        self.monitor.log_phase("Extract");

        // Transform
        let outcome = self.pipeline.transform(records).await?;
        let requested = outcome.requested;
        let resolved = outcome.resolved();
        tracing::info!("🔄 Resolved {} of {} requested", resolved, requested);
        self.monitor.log_phase("Transform");

        // Load
        let output_path = self.pipeline.load(outcome).await?;
        self.monitor.log_phase("Load");
        self.monitor.log_final();

        Ok(HarvestSummary {
            output_path,
            requested,
            resolved,
        })
    }
}
