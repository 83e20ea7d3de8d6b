//! Periodic timeline poller.
//!
//! Each tick:
//! - snapshots tracked accounts + target channel under the config lock
//! - resolves the channel (unset/unresolvable: the whole tick is skipped)
//! - fetches each account's latest post, sequentially, in tracking order
//! - delivers posts above the account's high-water mark
//!
//! Every per-account failure is logged and recorded in the [`TickReport`];
//! nothing below startup aborts the loop.

use std::{sync::Arc, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    context::AppContext,
    domain::PostId,
    formatting::post_card,
    ports::{ChannelSink, FeedSource},
    seen::SeenTracker,
    Error,
};

/// Why a tick did no work at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    ChannelUnset,
    ChannelUnresolved,
    ChannelTimeout,
}

#[derive(Debug, Default)]
pub struct TickReport {
    pub skipped: Option<SkipReason>,
    pub delivered: Vec<(String, PostId)>,
    pub unchanged: Vec<String>,
    pub failures: Vec<(String, Error)>,
}

pub struct Poller {
    ctx: Arc<AppContext>,
    feed: Arc<dyn FeedSource>,
    sink: Arc<dyn ChannelSink>,
    seen: SeenTracker,
    op_timeout: Duration,
}

/// Cancellation handle for a spawned poller.
pub struct PollerHandle {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl PollerHandle {
    /// Stop scheduling new ticks and wait for the task to exit.
    ///
    /// An in-flight tick is abandoned at its next await point.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            if !e.is_cancelled() {
                tracing::warn!(error = %e, "poller task ended abnormally");
            }
        }
    }
}

impl Poller {
    pub fn new(
        ctx: Arc<AppContext>,
        feed: Arc<dyn FeedSource>,
        sink: Arc<dyn ChannelSink>,
        op_timeout: Duration,
    ) -> Self {
        Self {
            ctx,
            feed,
            sink,
            seen: SeenTracker::new(),
            op_timeout,
        }
    }

    pub fn seen(&self) -> &SeenTracker {
        &self.seen
    }

    /// Start from existing high-water marks instead of an empty tracker.
    pub fn with_seen(mut self, seen: SeenTracker) -> Self {
        self.seen = seen;
        self
    }

    /// Run ticks every `every` until `cancel` fires. The first tick runs immediately.
    pub fn spawn(mut self, every: Duration, cancel: CancellationToken) -> PollerHandle {
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(every);
            // A slow tick delays the next one instead of bursting to catch up.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(interval_secs = every.as_secs(), "poller started");

            loop {
                tokio::select! {
                  _ = token.cancelled() => break,
                  _ = ticker.tick() => {
                    tokio::select! {
                      _ = token.cancelled() => break,
                      report = self.tick() => log_report(&report),
                    }
                  }
                }
            }

            tracing::info!("poller stopped");
        });

        PollerHandle { cancel, handle }
    }

    pub async fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        let snapshot = self.ctx.snapshot().await;

        let Some(channel_id) = snapshot.channel else {
            report.skipped = Some(SkipReason::ChannelUnset);
            return report;
        };
        let channel = match time::timeout(self.op_timeout, self.sink.resolve_channel(channel_id)).await
        {
            Ok(Some(channel)) => channel,
            Ok(None) => {
                tracing::debug!(channel_id = channel_id.0, "target channel not resolvable, skipping tick");
                report.skipped = Some(SkipReason::ChannelUnresolved);
                return report;
            }
            Err(_) => {
                tracing::warn!(
                    channel_id = channel_id.0,
                    timeout_ms = self.op_timeout.as_millis() as u64,
                    "resolving target channel timed out, skipping tick"
                );
                report.skipped = Some(SkipReason::ChannelTimeout);
                return report;
            }
        };

        for account in snapshot.accounts {
            let post = match time::timeout(self.op_timeout, self.feed.latest_post(&account)).await
            {
                Ok(Ok(Some(post))) => post,
                Ok(Ok(None)) => {
                    tracing::debug!(account = %account, "timeline empty");
                    report.unchanged.push(account);
                    continue;
                }
                Ok(Err(e)) => {
                    tracing::warn!(account = %account, error = %e, "error fetching latest post");
                    report.failures.push((account, e));
                    continue;
                }
                Err(_) => {
                    let e = Error::fetch(
                        &account,
                        format!("timed out after {}s", self.op_timeout.as_secs()),
                    );
                    tracing::warn!(account = %account, error = %e, "error fetching latest post");
                    report.failures.push((account, e));
                    continue;
                }
            };

            if !self.seen.should_deliver(&account, post.id) {
                report.unchanged.push(account);
                continue;
            }

            let card = post_card(&account, &post);
            match time::timeout(self.op_timeout, self.sink.send_card(&channel, &card)).await {
                Ok(Ok(())) => {
                    tracing::info!(account = %account, post_id = post.id.0, channel = %channel.name, "delivered post");
                    report.delivered.push((account, post.id));
                }
                Ok(Err(e)) => {
                    tracing::warn!(account = %account, post_id = post.id.0, error = %e, "failed to deliver post");
                    report.failures.push((account, e));
                }
                Err(_) => {
                    let e = Error::Delivery(format!(
                        "timed out after {}s",
                        self.op_timeout.as_secs()
                    ));
                    tracing::warn!(account = %account, post_id = post.id.0, error = %e, "failed to deliver post");
                    report.failures.push((account, e));
                }
            }
        }

        report
    }
}

fn log_report(report: &TickReport) {
    if let Some(reason) = report.skipped {
        tracing::debug!(?reason, "tick skipped");
        return;
    }
    tracing::debug!(
        delivered = report.delivered.len(),
        unchanged = report.unchanged.len(),
        failed = report.failures.len(),
        "tick finished"
    );
}
