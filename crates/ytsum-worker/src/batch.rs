//! Batch runs over several provider combinations.

use std::sync::Arc;

use tracing::error;
use ytsum_llm::{ProviderCombination, ProviderRegistry};
use ytsum_media::ProgressSink;

use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::{Pipeline, RunReport};

/// Result of one combination in a batch.
#[derive(Debug)]
pub struct BatchOutcome {
    pub combination: ProviderCombination,
    pub result: PipelineResult<RunReport>,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

impl Pipeline {
    /// Run every combination against one reference, in order.
    ///
    /// A failing combination is logged and recorded; the rest still run.
    /// After the first successful transcription the others hit the cache.
    pub async fn run_batch(
        &self,
        reference: &str,
        combinations: &[ProviderCombination],
        registry: &mut ProviderRegistry,
        progress: Arc<dyn ProgressSink>,
    ) -> Vec<BatchOutcome> {
        let mut outcomes = Vec::with_capacity(combinations.len());

        for combination in combinations {
            let result = match registry.prepare(combination).await {
                Ok(provider) => {
                    self.process(reference, provider.as_ref(), Arc::clone(&progress))
                        .await
                }
                Err(e) => {
                    let err = PipelineError::Preparation(e);
                    error!(
                        provider = %combination,
                        stage = %err.stage(),
                        "Run failed: {}", err
                    );
                    Err(err)
                }
            };

            outcomes.push(BatchOutcome {
                combination: combination.clone(),
                result,
            });
        }

        outcomes
    }
}
