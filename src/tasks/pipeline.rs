use crate::{
    ai::{CompletionTransport, PromptTemplate, ServiceClient, ServiceError},
    domain::{ClassificationResult, ContentItem},
    infrastructure::shutdown::ShutdownListener,
    moderation::{Normalizer, ParseError},
};

/// How one item was resolved.
#[derive(Debug)]
pub enum ItemOutcome {
    Classified,
    UnparsableReply(ParseError),
    ServiceFailed(ServiceError),
}

impl ItemOutcome {
    pub fn is_fallback(&self) -> bool {
        !matches!(self, ItemOutcome::Classified)
    }
}

/// Observer notified after each item is resolved.
pub trait ProgressObserver {
    fn on_start(&self, _total: usize) {}
    fn on_item(&self, position: usize, total: usize, item: &ContentItem, outcome: &ItemOutcome);
}

/// Logs progress through `tracing`.
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn on_start(&self, total: usize) {
        tracing::info!(target: "pipeline", total, "processing content sequentially");
    }

    fn on_item(&self, position: usize, total: usize, item: &ContentItem, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Classified => tracing::info!(
                target: "pipeline",
                uid = item.short_uid(),
                "processed {position}/{total}"
            ),
            ItemOutcome::UnparsableReply(err) => tracing::warn!(
                target: "pipeline",
                uid = item.short_uid(),
                error = %err,
                "processed {position}/{total} with safe default (unparsable reply)"
            ),
            ItemOutcome::ServiceFailed(err) => tracing::error!(
                target: "pipeline",
                uid = item.short_uid(),
                error = %err,
                "processed {position}/{total} with safe default (service failure)"
            ),
        }
    }
}

#[derive(Debug, Default)]
pub struct PipelineRun {
    pub results: Vec<ClassificationResult>,
    pub fallbacks: usize,
    pub interrupted: bool,
}

pub struct Pipeline<T> {
    client: ServiceClient<T>,
    template: PromptTemplate,
    normalizer: Normalizer,
}

impl<T: CompletionTransport> Pipeline<T> {
    pub fn new(client: ServiceClient<T>, template: PromptTemplate, normalizer: Normalizer) -> Self {
        Self {
            client,
            template,
            normalizer,
        }
    }

    /// Resolves one item to exactly one result; failures become the safe default.
    pub async fn classify_item(&mut self, item: &ContentItem) -> (ClassificationResult, ItemOutcome) {
        let raw = match self.client.classify(item, &self.template).await {
            Ok(raw) => raw,
            Err(err) => {
                return (
                    self.normalizer.safe_default(&item.uid, &item.content),
                    ItemOutcome::ServiceFailed(err),
                )
            }
        };
        match self.normalizer.normalize(&raw, &item.uid, &item.content) {
            Ok(result) => (result, ItemOutcome::Classified),
            Err(err) => (
                self.normalizer.safe_default(&item.uid, &item.content),
                ItemOutcome::UnparsableReply(err),
            ),
        }
    }

    /// Classifies items one at a time in input order. A shutdown request stops
    /// the run before the next item; results gathered so far are returned.
    pub async fn run(
        &mut self,
        items: &[ContentItem],
        observer: &dyn ProgressObserver,
        shutdown: &mut ShutdownListener,
    ) -> PipelineRun {
        let total = items.len();
        let mut run = PipelineRun {
            results: Vec::with_capacity(total),
            ..Default::default()
        };
        observer.on_start(total);

        for (index, item) in items.iter().enumerate() {
            if shutdown.is_triggered() {
                run.interrupted = true;
                break;
            }

            let (result, outcome) = tokio::select! {
                resolved = self.classify_item(item) => resolved,
                _ = shutdown.notified() => {
                    tracing::info!(
                        target: "pipeline",
                        uid = item.short_uid(),
                        "shutdown requested during classification; stopping"
                    );
                    run.interrupted = true;
                    break;
                }
            };

            if outcome.is_fallback() {
                run.fallbacks += 1;
            }
            observer.on_item(index + 1, total, item, &outcome);
            run.results.push(result);
        }

        run
    }
}
