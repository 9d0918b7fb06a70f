//! The inspection pipeline: validate the zone, discover its nameservers,
//! probe every address, then look at the DNSSEC deployment.

pub mod discovery;
pub mod dnssec;
pub mod lookup;
pub mod probe;
pub mod validate;

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::client::{NetworkClient, Query, QueryClient};
use crate::config::InspectConfig;
use crate::dns::DNSPacket;
use crate::error::{ConfigError, InspectError, InspectFailure, Result};
use crate::report::{Zone, ZoneReport};
use crate::resolver::{AddressResolver, SystemAddressResolver, UpstreamAddressResolver};
use crate::trace::{DebugTrace, TraceSink, TracingSink};

pub use probe::{ProbeOutcome, ProbeTally};

/// Runs zone inspections with one configuration and one set of
/// network collaborators.
pub struct ZoneInspector {
    config: InspectConfig,
    client: Arc<dyn QueryClient>,
    resolver: Arc<dyn AddressResolver>,
    sink: Arc<dyn TraceSink>,
}

impl ZoneInspector {
    /// Inspector on real sockets, resolving nameserver addresses through
    /// the configured recursive resolvers.
    pub fn new(config: InspectConfig) -> std::result::Result<Self, ConfigError> {
        let client: Arc<dyn QueryClient> = Arc::new(NetworkClient::new(config.query_timeout));
        let resolver = Arc::new(UpstreamAddressResolver::new(
            client.clone(),
            config.resolvers.clone(),
        ));
        Self::with_components(config, client, resolver)
    }

    /// Fails if the configuration does not pass `InspectConfig::validate`.
    pub fn with_components(
        config: InspectConfig,
        client: Arc<dyn QueryClient>,
        resolver: Arc<dyn AddressResolver>,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            client,
            resolver,
            sink: Arc::new(TracingSink),
        })
    }

    /// Resolve nameserver addresses with the operating system resolver instead.
    pub fn with_system_resolver(mut self) -> Self {
        self.resolver = Arc::new(SystemAddressResolver);
        self
    }

    /// Where debug trace entries are mirrored when `debug` is on.
    pub fn with_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &InspectConfig {
        &self.config
    }

    /// Inspect one zone. A fatal error comes back with the stub report:
    /// zone name and start time only, zero duration.
    pub async fn inspect_zone(&self, name: &str) -> std::result::Result<ZoneReport, InspectFailure> {
        let zone = Zone::new(name);
        let started = Instant::now();
        let check_start = Utc::now();

        let trace = if self.config.debug {
            DebugTrace::mirrored(self.sink.clone())
        } else {
            DebugTrace::new()
        };
        let mut report = ZoneReport::new(zone.clone(), trace);
        report.check_start = check_start;

        info!("Inspecting zone {}", zone);
        let outcome = match self.config.deadline {
            Some(deadline) => match timeout(deadline, self.run(&mut report)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(InspectError::DeadlineExceeded {
                    zone: zone.fqdn.clone(),
                    deadline,
                }),
            },
            None => self.run(&mut report).await,
        };

        match outcome {
            Ok(()) => {
                report.check_duration = started.elapsed();
                info!(
                    "Finished {} in {:?}: {} nameservers, {} addresses, dnssec={}",
                    zone,
                    report.check_duration,
                    report.nameservers.len(),
                    report.nsaddr_count_all,
                    report.has_dnssec
                );
                Ok(report)
            }
            Err(error) => {
                warn!("Inspection of {} failed: {}", zone, error);
                let mut stub = ZoneReport::stub(zone);
                stub.check_start = check_start;
                Err(InspectFailure {
                    error,
                    report: Box::new(stub),
                })
            }
        }
    }

    async fn run(&self, report: &mut ZoneReport) -> std::result::Result<(), InspectError> {
        validate::validate_zone(self, report).await?;

        discovery::discover_nameservers(self, report).await;
        if report.nameservers.is_empty() {
            return Err(InspectError::NoNameservers {
                zone: report.zone.fqdn.clone(),
            });
        }

        probe::probe_nameservers(self, report).await;
        dnssec::inspect_dnssec(self, report).await;
        Ok(())
    }

    async fn recursive(&self, query: &Query) -> Result<DNSPacket> {
        lookup::lookup(self.client.as_ref(), &self.config.resolvers, query).await
    }
}
