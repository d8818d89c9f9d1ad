use super::provider::{ProviderFuture, TargetProvider};
use crate::target::TargetGroup;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Provider for targets listed directly in the job config.
///
/// Sends its groups once, then idles until cancelled. Groups without a
/// source are numbered by position.
#[derive(Debug, Clone)]
pub struct StaticProvider {
    groups: Vec<TargetGroup>,
}

impl StaticProvider {
    pub fn new(groups: Vec<TargetGroup>) -> Self {
        let groups = groups
            .into_iter()
            .enumerate()
            .map(|(i, mut group)| {
                if group.source.is_empty() {
                    group.source = i.to_string();
                }
                group
            })
            .collect();
        Self { groups }
    }

    pub fn groups(&self) -> &[TargetGroup] {
        &self.groups
    }
}

impl TargetProvider for StaticProvider {
    fn run(
        &self,
        cancel: CancellationToken,
        updates: mpsc::Sender<Vec<TargetGroup>>,
    ) -> ProviderFuture<'_> {
        let groups = self.groups.clone();
        Box::pin(async move {
            tokio::select! {
                _ = cancel.cancelled() => return,
                sent = updates.send(groups) => {
                    if sent.is_err() {
                        return;
                    }
                }
            }
            cancel.cancelled().await;
        })
    }
}
