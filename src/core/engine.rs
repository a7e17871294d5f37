use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Runs a pipeline's extract/transform/load stages in order.
pub struct PipelineEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> PipelineEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(false),
        }
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Collecting catalog entries...");
        let items = self.pipeline.extract().await?;
        tracing::info!("Collected {} entries", items.len());
        self.monitor.log_stats("extract");

        tracing::info!("Processing entries...");
        let output = self.pipeline.transform(items).await?;
        self.monitor.log_stats("transform");

        tracing::info!("Writing output...");
        let output_path = self.pipeline.load(output).await?;
        self.monitor.log_stats("load");
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct CountingPipeline {
        items: Vec<u32>,
    }

    #[async_trait]
    impl Pipeline for CountingPipeline {
        type Item = u32;
        type Output = usize;

        async fn extract(&self) -> Result<Vec<u32>> {
            Ok(self.items.clone())
        }

        async fn transform(&self, items: Vec<u32>) -> Result<usize> {
            Ok(items.len())
        }

        async fn load(&self, output: usize) -> Result<String> {
            Ok(format!("wrote {} items", output))
        }
    }

    #[test]
    fn test_engine_runs_stages_in_order() {
        let engine = PipelineEngine::new(CountingPipeline {
            items: vec![1, 2, 3],
        });
        let result = tokio_test::block_on(engine.run()).unwrap();
        assert_eq!(result, "wrote 3 items");
    }
}
