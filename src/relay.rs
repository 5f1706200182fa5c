//! The poll cycle
//!
//! One cycle, in order:
//!
//! 1. Reload the tenant registry; with no deliverable tenant the cycle stops here
//! 2. Fetch and parse the primary feed
//! 3. Reload the ledger and normalize unseen entries, oldest first
//! 4. For each entry: fan out to every tenant, then record it in the ledger
//! 5. Run the secondary stream for tenants with the `secondary_stream` feature
//!
//! A primary failure (fetch, parse, ledger write) ends step 4 early but does not
//! skip step 5. Delivery failures to individual tenants never stop the cycle and
//! never keep an entry out of the ledger.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{Config, FeedConfig, SecondaryFeedConfig};
use crate::delivery::{DeliveryGateway, FanoutDispatcher, TenantOutcome, WebhookGateway};
use crate::error::{Error, FeedcastErrorTrait, Result};
use crate::feed::{normalize, secondary, FeedFetcher, FeedParser, RssParser};
use crate::models::{DeliveryRecord, OutgoingMessage, SECONDARY_STREAM_FLAG};
use crate::registry::TenantRegistry;
use crate::scheduler::PollJob;
use crate::storage::{DeliveryLedger, SeenIdLedger, TenantStore};

// ============================================================================
// Reports
// ============================================================================

/// Summary of one poll cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Correlation id, also attached to the cycle's log span
    pub cycle_id: String,

    /// Tenants with a destination at cycle start
    pub tenants: usize,

    /// Primary entries fanned out and recorded
    pub new_entries: usize,

    /// Successful per-tenant deliveries across both streams
    pub deliveries: usize,

    /// Failed per-tenant deliveries across both streams
    pub failures: usize,

    /// Why the primary stream stopped early, if it did
    pub primary_error: Option<String>,

    /// Secondary posts fanned out and recorded
    pub secondary_posts: usize,

    /// Why the secondary stream stopped early, if it did
    pub secondary_error: Option<String>,
}

impl CycleReport {
    /// Whether the cycle was skipped for lack of tenants
    pub fn is_noop(&self) -> bool {
        self.tenants == 0
    }

    /// Whether either stream stopped early
    pub fn has_errors(&self) -> bool {
        self.primary_error.is_some() || self.secondary_error.is_some()
    }

    fn count(&mut self, outcomes: &[TenantOutcome]) {
        let delivered = outcomes.iter().filter(|o| o.is_delivered()).count();
        self.deliveries += delivered;
        self.failures += outcomes.len() - delivered;
    }
}

// ============================================================================
// Secondary Stream
// ============================================================================

/// The optional second feed, delivered as plain links
#[derive(Debug)]
pub struct SecondaryStream {
    fetcher: FeedFetcher,
    ledger: SeenIdLedger,
    link_template: String,
}

impl SecondaryStream {
    /// Create a secondary stream
    pub fn new(fetcher: FeedFetcher, ledger: SeenIdLedger, link_template: impl Into<String>) -> Self {
        Self {
            fetcher,
            ledger,
            link_template: link_template.into(),
        }
    }

    /// Build from the `[secondary]` config section
    ///
    /// Request settings (timeout, User-Agent) are shared with the primary feed.
    pub async fn from_config(config: &SecondaryFeedConfig, feed: &FeedConfig) -> Result<Self> {
        let mut fetcher = FeedFetcher::with_url(
            &config.url,
            Duration::from_secs(feed.request_timeout_secs),
        )?;
        if let Some(agent) = &feed.user_agent {
            fetcher = fetcher.with_user_agent(agent.clone());
        }
        let ledger = SeenIdLedger::open(&config.ledger_path).await?;
        Ok(Self::new(fetcher, ledger, config.link_template.clone()))
    }
}

// ============================================================================
// Relay
// ============================================================================

/// Owns every component of a poll cycle
pub struct Relay {
    tenants: TenantStore,
    ledger: DeliveryLedger,
    fetcher: FeedFetcher,
    parser: Arc<dyn FeedParser>,
    dispatcher: FanoutDispatcher,
    secondary: Option<SecondaryStream>,
}

impl std::fmt::Debug for Relay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay")
            .field("tenants", &self.tenants.path())
            .field("ledger", &self.ledger.path())
            .field("feed", &self.fetcher.url())
            .field("secondary", &self.secondary.is_some())
            .finish()
    }
}

impl Relay {
    /// Assemble a relay from its parts, using [`RssParser`] and no secondary stream
    pub fn new(
        tenants: TenantStore,
        ledger: DeliveryLedger,
        fetcher: FeedFetcher,
        dispatcher: FanoutDispatcher,
    ) -> Self {
        Self {
            tenants,
            ledger,
            fetcher,
            parser: Arc::new(RssParser::new()),
            dispatcher,
            secondary: None,
        }
    }

    /// Build the production relay: webhook gateway, stores from config paths
    pub async fn from_config(config: &Config) -> Result<Self> {
        let gateway = WebhookGateway::new(&config.delivery)?;
        Self::from_config_with_gateway(config, Arc::new(gateway)).await
    }

    /// Build a relay from config with a caller-supplied gateway
    pub async fn from_config_with_gateway(
        config: &Config,
        gateway: Arc<dyn DeliveryGateway>,
    ) -> Result<Self> {
        let dispatcher = FanoutDispatcher::new(gateway).with_call_timeout(config.delivery.timeout());
        let mut relay = Self::new(
            TenantStore::new(&config.storage.tenants_path),
            DeliveryLedger::open(&config.storage.ledger_path).await?,
            FeedFetcher::new(&config.feed)?,
            dispatcher,
        );

        if let Some(secondary) = &config.secondary {
            relay = relay.with_secondary(SecondaryStream::from_config(secondary, &config.feed).await?);
        }

        Ok(relay)
    }

    /// Use a different feed parser
    pub fn with_parser(mut self, parser: Arc<dyn FeedParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Enable the secondary stream
    pub fn with_secondary(mut self, secondary: SecondaryStream) -> Self {
        self.secondary = Some(secondary);
        self
    }

    /// Tenant store backing the registry
    pub fn tenant_store(&self) -> &TenantStore {
        &self.tenants
    }

    /// Primary ledger
    pub fn ledger(&self) -> &DeliveryLedger {
        &self.ledger
    }

    /// Run one full poll cycle
    ///
    /// Only a failure to load tenant configuration is returned as an error;
    /// stream failures are logged and reported in the [`CycleReport`].
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let cycle_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!("poll_cycle", cycle_id = %cycle_id);

        self.cycle(cycle_id).instrument(span).await
    }

    async fn cycle(&self, cycle_id: String) -> Result<CycleReport> {
        let mut report = CycleReport {
            cycle_id,
            ..Default::default()
        };

        let registry = TenantRegistry::load(&self.tenants).await?;
        let deliverable = registry.deliverable();
        report.tenants = deliverable.len();

        if deliverable.is_empty() {
            tracing::info!("No tenants configured; skipping cycle");
            return Ok(report);
        }

        tracing::info!(tenants = report.tenants, "Checking for new entries");

        if let Err(e) = self.run_primary(&deliverable, &mut report).await {
            log_stream_error("primary", &e);
            report.primary_error = Some(e.to_string());
        }

        if let Some(secondary) = &self.secondary {
            let flagged = registry.with_feature(SECONDARY_STREAM_FLAG);
            if flagged.is_empty() {
                tracing::debug!("No tenant has the secondary stream enabled");
            } else if let Err(e) = self.run_secondary(secondary, &flagged, &mut report).await {
                log_stream_error("secondary", &e);
                report.secondary_error = Some(e.to_string());
            }
        }

        tracing::info!(
            new_entries = report.new_entries,
            secondary_posts = report.secondary_posts,
            deliveries = report.deliveries,
            failures = report.failures,
            "Poll cycle complete"
        );
        Ok(report)
    }

    async fn run_primary(&self, tenants: &TenantRegistry, report: &mut CycleReport) -> Result<()> {
        let payload = self.fetcher.fetch().await?;
        let document = self.parser.parse(&payload)?;

        self.ledger.reload().await?;
        let new_entries = normalize(&document, &self.ledger.seen().await);

        if new_entries.is_empty() {
            tracing::info!(entries = document.entries.len(), "No new entries");
            return Ok(());
        }

        for entry in new_entries {
            tracing::info!(identity = %entry.identity, title = %entry.renderable.title, "Delivering entry");

            let message = OutgoingMessage::rich(entry.renderable.clone());
            let outcomes = self.dispatcher.dispatch(&message, tenants).await;
            report.count(&outcomes);

            // recorded regardless of per-tenant outcomes
            self.ledger.record(&DeliveryRecord::from_entry(&entry)).await?;
            report.new_entries += 1;
        }

        Ok(())
    }

    async fn run_secondary(
        &self,
        stream: &SecondaryStream,
        tenants: &TenantRegistry,
        report: &mut CycleReport,
    ) -> Result<()> {
        let payload = stream.fetcher.fetch().await?;
        let document = self.parser.parse(&payload)?;

        stream.ledger.reload().await?;
        let posts = secondary::unseen_posts(
            &document,
            &stream.ledger.seen().await,
            &stream.link_template,
        );

        for post in posts {
            tracing::info!(post_id = %post.id, "Delivering secondary post");

            let outcomes = self.dispatcher.dispatch(&post.message(), tenants).await;
            report.count(&outcomes);

            stream.ledger.record(&post.id).await?;
            report.secondary_posts += 1;
        }

        Ok(())
    }
}

fn log_stream_error(stream: &str, err: &Error) {
    if err.is_recoverable() {
        tracing::warn!(
            stream,
            category = err.category().as_str(),
            error = %err,
            "Stream aborted; next cycle will retry"
        );
    } else {
        tracing::error!(
            stream,
            category = err.category().as_str(),
            error = %err,
            "Stream aborted"
        );
    }
}

#[async_trait]
impl PollJob for Relay {
    async fn poll(&self) {
        if let Err(e) = self.run_cycle().await {
            tracing::error!(error = %e, "Poll cycle failed");
        }
    }
}
