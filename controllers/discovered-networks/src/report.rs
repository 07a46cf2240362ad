//! Report assembly
//!
//! Turns reconciled records into the final report. Filtering never
//! reorders: the output is always an ordered subset of the input.

use crate::reconciler::{IpamStatus, NetworkKey, ReconcileStats, ReconciledRecord};
use std::collections::HashSet;

/// Record selection applied when assembling a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOptions {
    /// Keep only networks that are absent from IPAM
    pub not_in_ipam_only: bool,
    /// Keep only the first record for each network
    pub unique_networks: bool,
}

/// Run summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub devices_seen: usize,
    pub devices_without_networks: usize,
    /// Discovered (device, network) pairs before filtering
    pub total_discovered: usize,
    pub unique_networks: usize,
    pub lookups_issued: usize,
    pub not_in_ipam: usize,
    pub unknown: usize,
    /// One entry per record whose IPAM status is unknown
    pub warnings: Vec<String>,
}

/// Assembled report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub records: Vec<ReconciledRecord>,
    pub summary: Summary,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportAssembler {
    options: ReportOptions,
}

impl ReportAssembler {
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    /// Build the report from every reconciled record of a run
    ///
    /// Summary counts cover all records; the selection options only affect
    /// which records are kept for output.
    pub fn assemble(&self, records: Vec<ReconciledRecord>, stats: &ReconcileStats) -> Report {
        let mut summary = Summary {
            devices_seen: stats.devices_seen,
            devices_without_networks: stats.devices_without_networks,
            total_discovered: records.len(),
            unique_networks: stats.unique_networks,
            lookups_issued: stats.lookups_issued,
            ..Summary::default()
        };

        for record in &records {
            match &record.status {
                IpamStatus::Absent => summary.not_in_ipam += 1,
                IpamStatus::Unknown { reason } => {
                    summary.unknown += 1;
                    summary.warnings.push(format!(
                        "{} on {} ({}): {}",
                        record.network, record.device, record.device_ref, reason
                    ));
                }
                IpamStatus::Present { .. } => {}
            }
        }

        let mut records = records;
        if self.options.not_in_ipam_only {
            records = not_in_ipam(records);
        }
        if self.options.unique_networks {
            records = unique_networks(records);
        }

        Report { records, summary }
    }
}

/// Keep only records whose network is absent from IPAM
pub fn not_in_ipam(records: Vec<ReconciledRecord>) -> Vec<ReconciledRecord> {
    records
        .into_iter()
        .filter(|r| r.status == IpamStatus::Absent)
        .collect()
}

/// Keep the first record for each network
pub fn unique_networks(records: Vec<ReconciledRecord>) -> Vec<ReconciledRecord> {
    let mut seen: HashSet<NetworkKey> = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.network.clone()))
        .collect()
}
