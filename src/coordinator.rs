//! Refresh Coordinator
//!
//! Owns the merged [`Snapshot`] of all categories and republishes it once per
//! refresh cycle.
//!
//! # Refresh Cycle
//!
//! 1. All eight category fetches are issued concurrently against the shared client
//! 2. Once every fetch has settled, a copy of the current snapshot is taken
//! 3. Successful categories replace their entry; failed ones keep the previous value
//! 4. The merged copy is published in one step through a `watch` channel
//!
//! Readers therefore see either the prior snapshot or the new one, never a
//! half-merged state. A cycle dropped mid-flight (entry unload, shutdown)
//! publishes nothing.
//!
//! # Failure Escalation
//!
//! Per-category failures are logged and downgrade the cycle to *degraded*. The
//! cycle only counts as failed when the system category failed or when every
//! category failed; the snapshot is still merged with whatever succeeded.
//!
//! # Single Writer
//!
//! Mutating methods take `&mut self`: the refresh loop owns the coordinator,
//! and push-channel updates reach it as messages, so polling merges and push
//! merges can never interleave on the same category.

use crate::error::{ClientError, ExporterError, Result};
use crate::unraid::types::*;
use crate::unraid::UnraidClient;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Category whose failure fails the whole refresh
pub const CRITICAL_CATEGORY: Category = Category::System;

/// Last successfully decoded payload per category
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub system: Option<SystemInfo>,
    pub array: Option<ArrayStatus>,
    pub disks: Option<Vec<Disk>>,
    pub containers: Option<Vec<Container>>,
    pub vms: Option<Vec<VirtualMachine>>,
    pub ups: Option<UpsStatus>,
    pub gpu: Option<Vec<Gpu>>,
    pub network: Option<Vec<NetworkInterface>>,
    /// When each category was last replaced
    pub fetched_at: BTreeMap<Category, Instant>,
}

impl Snapshot {
    /// Replace exactly one category, stamped with the current time
    pub fn apply(&mut self, update: CategoryUpdate) {
        self.apply_at(update, Instant::now());
    }

    pub fn apply_at(&mut self, update: CategoryUpdate, at: Instant) {
        self.fetched_at.insert(update.category(), at);
        match update {
            CategoryUpdate::System(v) => self.system = Some(v),
            CategoryUpdate::Array(v) => self.array = Some(v),
            CategoryUpdate::Disks(v) => self.disks = Some(v),
            CategoryUpdate::Containers(v) => self.containers = Some(v),
            CategoryUpdate::Vms(v) => self.vms = Some(v),
            CategoryUpdate::Ups(v) => self.ups = Some(v),
            CategoryUpdate::Gpu(v) => self.gpu = Some(v),
            CategoryUpdate::Network(v) => self.network = Some(v),
        }
    }

    pub fn contains(&self, category: Category) -> bool {
        self.fetched_at.contains_key(&category)
    }

    pub fn fetched_at(&self, category: Category) -> Option<Instant> {
        self.fetched_at.get(&category).copied()
    }

    pub fn disks(&self) -> &[Disk] {
        self.disks.as_deref().unwrap_or(&[])
    }

    pub fn containers(&self) -> &[Container] {
        self.containers.as_deref().unwrap_or(&[])
    }

    pub fn vms(&self) -> &[VirtualMachine] {
        self.vms.as_deref().unwrap_or(&[])
    }

    pub fn gpus(&self) -> &[Gpu] {
        self.gpu.as_deref().unwrap_or(&[])
    }

    pub fn network(&self) -> &[NetworkInterface] {
        self.network.as_deref().unwrap_or(&[])
    }

    pub fn fans(&self) -> &[Fan] {
        self.system.as_ref().map(|s| s.fans.as_slice()).unwrap_or(&[])
    }

    pub fn hostname(&self) -> Option<&str> {
        self.system.as_ref().and_then(|s| s.hostname.as_deref())
    }
}

/// Outcome of one refresh cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshReport {
    pub succeeded: Vec<Category>,
    pub failed: Vec<(Category, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStatus {
    Complete,
    Degraded,
    Failed,
}

impl RefreshReport {
    pub fn status(&self) -> RefreshStatus {
        let critical_failed = self.failed.iter().any(|(c, _)| *c == CRITICAL_CATEGORY);
        if critical_failed || self.succeeded.is_empty() {
            RefreshStatus::Failed
        } else if self.failed.is_empty() {
            RefreshStatus::Complete
        } else {
            RefreshStatus::Degraded
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status() == RefreshStatus::Failed
    }

    pub fn failed_categories(&self) -> Vec<Category> {
        self.failed.iter().map(|(c, _)| *c).collect()
    }

    fn summary(&self) -> String {
        self.failed
            .iter()
            .map(|(c, e)| format!("{}: {}", c, e))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Merge one cycle's fetch results into `snapshot`.
///
/// Failed categories leave their previous entry untouched.
pub fn merge_results(
    snapshot: &mut Snapshot,
    results: Vec<(Category, std::result::Result<CategoryUpdate, ClientError>)>,
) -> RefreshReport {
    let now = Instant::now();
    let mut report = RefreshReport::default();

    for (category, result) in results {
        match result {
            Ok(update) => {
                snapshot.apply_at(update, now);
                report.succeeded.push(category);
            }
            Err(e) => {
                warn!("Failed to fetch {}: {}", category, e);
                report.failed.push((category, e.to_string()));
            }
        }
    }

    report
}

/// State published to readers after every merge
#[derive(Debug, Clone, Default)]
pub struct CoordinatorState {
    pub snapshot: Snapshot,
    /// False when the last refresh failed
    pub available: bool,
    pub last_error: Option<String>,
    /// Whether each category's fetch succeeded in the last refresh
    pub category_ok: BTreeMap<Category, bool>,
    pub last_refresh: Option<Instant>,
    pub refresh_count: u64,
}

pub struct Coordinator {
    client: UnraidClient,
    state: watch::Sender<Arc<CoordinatorState>>,
}

impl Coordinator {
    pub fn new(client: UnraidClient) -> Self {
        let (state, _) = watch::channel(Arc::new(CoordinatorState::default()));
        Self { client, state }
    }

    pub fn client(&self) -> &UnraidClient {
        &self.client
    }

    /// Receiver that observes every published state
    pub fn subscribe(&self) -> watch::Receiver<Arc<CoordinatorState>> {
        self.state.subscribe()
    }

    /// Latest published state
    pub fn current(&self) -> Arc<CoordinatorState> {
        self.state.borrow().clone()
    }

    /// Fetch every category concurrently and publish the merged snapshot.
    ///
    /// Returns `Err(ExporterError::Refresh)` when the cycle failed; the merged
    /// state (with `available == false`) is published either way.
    pub async fn refresh(&mut self) -> Result<RefreshReport> {
        info!("Refreshing data from Unraid agent");
        let started = Instant::now();
        let client = &self.client;

        let (system, array, disks, containers, vms, ups, gpu, network) = tokio::join!(
            client.get_system_info(),
            client.get_array_status(),
            client.get_disks(),
            client.get_containers(),
            client.get_vms(),
            client.get_ups_status(),
            client.get_gpu_metrics(),
            client.get_network_interfaces(),
        );

        let results = vec![
            (Category::System, system.map(CategoryUpdate::System)),
            (Category::Array, array.map(CategoryUpdate::Array)),
            (Category::Disks, disks.map(CategoryUpdate::Disks)),
            (Category::Containers, containers.map(CategoryUpdate::Containers)),
            (Category::Vms, vms.map(CategoryUpdate::Vms)),
            (Category::Ups, ups.map(CategoryUpdate::Ups)),
            (Category::Gpu, gpu.map(CategoryUpdate::Gpu)),
            (Category::Network, network.map(CategoryUpdate::Network)),
        ];

        let mut next = (*self.current()).clone();
        let report = merge_results(&mut next.snapshot, results);

        let status = report.status();
        next.available = status != RefreshStatus::Failed;
        next.last_error = if report.failed.is_empty() {
            None
        } else {
            Some(report.summary())
        };
        next.category_ok = Category::ALL
            .iter()
            .map(|c| (*c, report.succeeded.contains(c)))
            .collect();
        next.last_refresh = Some(Instant::now());
        next.refresh_count += 1;

        self.state.send_replace(Arc::new(next));

        match status {
            RefreshStatus::Complete => {
                info!(
                    "Refresh complete: {} categories in {:.2}s",
                    report.succeeded.len(),
                    started.elapsed().as_secs_f64()
                );
                Ok(report)
            }
            RefreshStatus::Degraded => {
                warn!(
                    "Refresh degraded, keeping stale data for: {:?}",
                    report.failed_categories()
                );
                Ok(report)
            }
            RefreshStatus::Failed => Err(ExporterError::Refresh(report.summary())),
        }
    }

    /// Apply one pushed category update and publish.
    ///
    /// Updates that arrive before the first refresh are dropped: there is no
    /// baseline snapshot yet for them to amend.
    pub fn apply_update(&mut self, update: CategoryUpdate) -> bool {
        let current = self.current();
        if current.last_refresh.is_none() {
            debug!(
                "Ignoring push update for {} before first refresh",
                update.category()
            );
            return false;
        }

        let category = update.category();
        let mut next = (*current).clone();
        next.snapshot.apply(update);
        self.state.send_replace(Arc::new(next));
        debug!("Applied push update for {}", category);
        true
    }
}
