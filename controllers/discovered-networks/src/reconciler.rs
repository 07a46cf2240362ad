//! Discovered network reconciler
//!
//! Tags every (device, discovered network) pair with its IPAM status. Each
//! network is looked up at most once per run; the outcome is memoised by
//! [`NetworkKey`] and shared by every device on that network.

use crate::backoff::{RetryPolicy, retry};
use crate::error::ReportError;
use ipnet::IpNet;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};
use wapi_client::{DiscoveredDevice, IpamNetwork, WapiClientTrait};

/// Consecutive lookups that may exhaust their transient retries before the
/// appliance is treated as unavailable
pub const MAX_CONSECUTIVE_OUTAGES: usize = 3;

/// Identity of a discovered network: network view plus CIDR
///
/// The CIDR is canonicalised when it parses, so textual variants of the
/// same network (e.g. upper-case IPv6) share one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NetworkKey {
    pub network_view: String,
    pub cidr: String,
}

impl NetworkKey {
    pub fn new(network_view: &str, network: &str) -> Self {
        let network = network.trim();
        let cidr = network
            .parse::<IpNet>()
            .map_or_else(|_| network.to_string(), |net| net.to_string());
        Self {
            network_view: network_view.to_string(),
            cidr,
        }
    }

    fn parsed(&self) -> Option<IpNet> {
        self.cidr.parse().ok()
    }

    /// Whether an IPAM network is this exact network in the same view
    fn matches(&self, candidate: &IpamNetwork) -> bool {
        candidate.network_view == self.network_view
            && self.parsed().is_some()
            && candidate.network.trim().parse::<IpNet>().ok() == self.parsed()
    }
}

impl fmt::Display for NetworkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.cidr, self.network_view)
    }
}

/// IPAM status of one network
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpamStatus {
    /// Managed in IPAM, optionally inside a network container
    Present { container: Option<String> },
    Absent,
    /// Lookup failed; the network may or may not be managed
    Unknown { reason: String },
}

impl IpamStatus {
    /// Report label: `true`, `false` or `unknown`
    pub fn label(&self) -> &'static str {
        match self {
            Self::Present { .. } => "true",
            Self::Absent => "false",
            Self::Unknown { .. } => "unknown",
        }
    }

    pub fn container(&self) -> Option<&str> {
        match self {
            Self::Present { container } => container.as_deref(),
            _ => None,
        }
    }
}

/// One discovered network seen on one device, with its IPAM status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledRecord {
    /// Device name (or address when unnamed)
    pub device: String,
    pub device_ref: String,
    pub network: NetworkKey,
    pub status: IpamStatus,
}

/// Counters gathered while reconciling
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub devices_seen: usize,
    pub devices_without_networks: usize,
    pub unique_networks: usize,
    pub lookups_issued: usize,
}

/// Reconciles discovered devices against IPAM
///
/// Owns the run-scoped lookup memo; one instance per run.
pub struct Reconciler<'a, C: ?Sized> {
    client: &'a C,
    retry: RetryPolicy,
    memo: HashMap<NetworkKey, IpamStatus>,
    stats: ReconcileStats,
    consecutive_outages: usize,
}

impl<C: ?Sized> fmt::Debug for Reconciler<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("retry", &self.retry)
            .field("memo", &self.memo.len())
            .field("stats", &self.stats)
            .field("consecutive_outages", &self.consecutive_outages)
            .finish_non_exhaustive()
    }
}

impl<'a, C> Reconciler<'a, C>
where
    C: WapiClientTrait + ?Sized,
{
    pub fn new(client: &'a C, retry: RetryPolicy) -> Self {
        Self {
            client,
            retry,
            memo: HashMap::new(),
            stats: ReconcileStats::default(),
            consecutive_outages: 0,
        }
    }

    pub fn stats(&self) -> ReconcileStats {
        ReconcileStats {
            unique_networks: self.memo.len(),
            ..self.stats.clone()
        }
    }

    /// Reconcile every discovered network of one device
    ///
    /// Returns one record per `network_infos` entry, in device order.
    /// Fails only when the lookup failure invalidates the whole run.
    pub async fn reconcile_device(
        &mut self,
        device: &DiscoveredDevice,
    ) -> Result<Vec<ReconciledRecord>, ReportError> {
        self.stats.devices_seen += 1;

        if device.network_infos.is_empty() {
            debug!("No networks found for device {}", device.display_name());
            self.stats.devices_without_networks += 1;
            return Ok(Vec::new());
        }

        let mut records = Vec::with_capacity(device.network_infos.len());
        for info in &device.network_infos {
            let key = NetworkKey::new(&device.network_view, &info.network_str);
            let status = self.status_for(&key).await?;

            let hinted = info.network.is_some();
            let disagrees = match status {
                IpamStatus::Present { .. } => !hinted,
                IpamStatus::Absent => hinted,
                IpamStatus::Unknown { .. } => false,
            };
            if disagrees {
                debug!(
                    "Device {} reference hint for {} disagrees with IPAM lookup ({})",
                    device.display_name(),
                    key,
                    status.label()
                );
            }
            if let IpamStatus::Unknown { reason } = &status {
                warn!(
                    "Device {}: IPAM status of {} unknown: {}",
                    device.display_name(),
                    key,
                    reason
                );
            }

            records.push(ReconciledRecord {
                device: device.display_name().to_string(),
                device_ref: device.reference.clone(),
                network: key,
                status,
            });
        }

        Ok(records)
    }

    /// Reconcile a batch of devices in order
    pub async fn reconcile_devices(
        &mut self,
        devices: &[DiscoveredDevice],
    ) -> Result<Vec<ReconciledRecord>, ReportError> {
        let mut records = Vec::new();
        for device in devices {
            records.extend(self.reconcile_device(device).await?);
        }
        Ok(records)
    }

    async fn status_for(&mut self, key: &NetworkKey) -> Result<IpamStatus, ReportError> {
        if let Some(status) = self.memo.get(key) {
            return Ok(status.clone());
        }

        let status = self.lookup(key).await?;
        self.memo.insert(key.clone(), status.clone());
        Ok(status)
    }

    async fn lookup(&mut self, key: &NetworkKey) -> Result<IpamStatus, ReportError> {
        if key.parsed().is_none() {
            return Ok(IpamStatus::Unknown {
                reason: format!("invalid CIDR '{}'", key.cidr),
            });
        }

        self.stats.lookups_issued += 1;
        let client = self.client;
        let cidr = key.cidr.as_str();
        let network_view = key.network_view.as_str();
        let result = retry(&self.retry, &format!("IPAM lookup for {}", key), move || {
            client.query_ipam_networks(cidr, network_view)
        })
        .await;

        if result.is_ok() {
            self.consecutive_outages = 0;
        }

        match result {
            Ok(candidates) => match candidates.into_iter().find(|n| key.matches(n)) {
                Some(network) => {
                    debug!("Network {} found in IPAM: {}", key, network.reference);
                    Ok(IpamStatus::Present {
                        container: network.network_container,
                    })
                }
                None => {
                    info!("Network {} not in IPAM", key);
                    Ok(IpamStatus::Absent)
                }
            },
            Err(e) if e.is_auth() => Err(ReportError::IpamLookup {
                network: key.to_string(),
                source: e,
            }),
            Err(e) if e.is_transient() => {
                self.consecutive_outages += 1;
                if self.consecutive_outages >= MAX_CONSECUTIVE_OUTAGES {
                    return Err(ReportError::IpamLookup {
                        network: key.to_string(),
                        source: e,
                    });
                }
                Ok(IpamStatus::Unknown { reason: e.to_string() })
            }
            Err(e) => Ok(IpamStatus::Unknown { reason: e.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use wapi_client::{MockFailure, MockWapiClient};

    fn statuses(records: &[ReconciledRecord]) -> Vec<&'static str> {
        records.iter().map(|r| r.status.label()).collect()
    }

    #[tokio::test]
    async fn test_shared_network_is_looked_up_once() {
        let mock = MockWapiClient::new("https://gm.test/wapi/v2.12");
        mock.add_ipam_network(ipam_network("10.0.0.0/24", "default", None));

        let devices = vec![
            device("sw1", "default", &["10.0.0.0/24"]),
            device("sw2", "default", &["10.0.0.0/24"]),
            device("sw3", "default", &["10.1.0.0/24"]),
        ];

        let mut reconciler = Reconciler::new(&mock, RetryPolicy::immediate(3));
        let records = reconciler.reconcile_devices(&devices).await.unwrap();

        assert_eq!(statuses(&records), vec!["true", "true", "false"]);
        assert_eq!(mock.ipam_lookups(), 2);
        assert_eq!(reconciler.stats().lookups_issued, 2);
        assert_eq!(reconciler.stats().unique_networks, 2);
    }

    #[tokio::test]
    async fn test_k_devices_one_lookup() {
        let mock = MockWapiClient::new("https://gm.test/wapi/v2.12");
        let devices: Vec<_> = (0..25)
            .map(|i| device(&format!("ap{}", i), "default", &["172.16.4.0/22"]))
            .collect();

        let mut reconciler = Reconciler::new(&mock, RetryPolicy::immediate(3));
        let records = reconciler.reconcile_devices(&devices).await.unwrap();

        assert_eq!(records.len(), 25);
        assert!(records.iter().all(|r| r.status == IpamStatus::Absent));
        assert_eq!(mock.lookups_for("172.16.4.0/22"), 1);
    }

    #[tokio::test]
    async fn test_network_view_is_part_of_identity() {
        let mock = MockWapiClient::new("https://gm.test/wapi/v2.12");
        mock.add_ipam_network(ipam_network("10.0.0.0/24", "lab", Some("10.0.0.0/16")));

        let devices = vec![
            device("lab-sw", "lab", &["10.0.0.0/24"]),
            device("prod-sw", "default", &["10.0.0.0/24"]),
        ];

        let mut reconciler = Reconciler::new(&mock, RetryPolicy::immediate(3));
        let records = reconciler.reconcile_devices(&devices).await.unwrap();

        assert_eq!(
            records[0].status,
            IpamStatus::Present {
                container: Some("10.0.0.0/16".to_string())
            }
        );
        assert_eq!(records[1].status, IpamStatus::Absent);
        assert_eq!(mock.ipam_lookups(), 2);
    }

    #[tokio::test]
    async fn test_textual_variants_share_one_lookup() {
        let mock = MockWapiClient::new("https://gm.test/wapi/v2.12");
        mock.add_ipam_network(ipam_network("2001:db8::/64", "default", None));

        let devices = vec![
            device("r1", "default", &["2001:DB8::/64"]),
            device("r2", "default", &[" 2001:db8::/64"]),
        ];

        let mut reconciler = Reconciler::new(&mock, RetryPolicy::immediate(3));
        let records = reconciler.reconcile_devices(&devices).await.unwrap();

        assert_eq!(statuses(&records), vec!["true", "true"]);
        assert_eq!(mock.lookups_for("2001:db8::/64"), 1);
    }

    #[tokio::test]
    async fn test_overlap_is_not_a_match() {
        let mock = MockWapiClient::new("https://gm.test/wapi/v2.12");
        mock.add_ipam_network(ipam_network("10.0.0.0/16", "default", None));

        let devices = vec![device("sw1", "default", &["10.0.1.0/24"])];
        let mut reconciler = Reconciler::new(&mock, RetryPolicy::immediate(3));
        let records = reconciler.reconcile_devices(&devices).await.unwrap();

        assert_eq!(records[0].status, IpamStatus::Absent);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_unknown_not_absent() {
        let mock = MockWapiClient::new("https://gm.test/wapi/v2.12");
        mock.fail_lookup("10.2.0.0/24", 1, MockFailure::Api);

        let devices = vec![
            device("sw1", "default", &["10.2.0.0/24"]),
            device("sw2", "default", &["10.2.0.0/24", "10.3.0.0/24"]),
        ];

        let mut reconciler = Reconciler::new(&mock, RetryPolicy::immediate(3));
        let records = reconciler.reconcile_devices(&devices).await.unwrap();

        assert_eq!(statuses(&records), vec!["unknown", "unknown", "false"]);
        assert_eq!(mock.lookups_for("10.2.0.0/24"), 1);
    }

    #[tokio::test]
    async fn test_transient_lookup_failure_is_retried() {
        let mock = MockWapiClient::new("https://gm.test/wapi/v2.12");
        mock.add_ipam_network(ipam_network("10.4.0.0/24", "default", None));
        mock.fail_lookup("10.4.0.0/24", 2, MockFailure::Transient);

        let devices = vec![device("sw1", "default", &["10.4.0.0/24"])];
        let mut reconciler = Reconciler::new(&mock, RetryPolicy::immediate(3));
        let records = reconciler.reconcile_devices(&devices).await.unwrap();

        assert_eq!(statuses(&records), vec!["true"]);
        assert_eq!(mock.lookups_for("10.4.0.0/24"), 3);
        assert_eq!(reconciler.stats().lookups_issued, 1);
    }

    #[tokio::test]
    async fn test_exhausted_transient_lookup_is_unknown() {
        let mock = MockWapiClient::new("https://gm.test/wapi/v2.12");
        mock.fail_lookup("10.5.0.0/24", 10, MockFailure::Transient);

        let devices = vec![device("sw1", "default", &["10.5.0.0/24"])];
        let mut reconciler = Reconciler::new(&mock, RetryPolicy::immediate(3));
        let records = reconciler.reconcile_devices(&devices).await.unwrap();

        assert_eq!(statuses(&records), vec!["unknown"]);
        assert_eq!(mock.lookups_for("10.5.0.0/24"), 3);
    }

    #[tokio::test]
    async fn test_repeated_outage_aborts() {
        let mock = MockWapiClient::new("https://gm.test/wapi/v2.12");
        let networks: Vec<String> = (0..10).map(|i| format!("10.{}.0.0/24", 50 + i)).collect();
        for network in &networks {
            mock.fail_lookup(network, 100, MockFailure::Transient);
        }
        let devices: Vec<_> = networks
            .iter()
            .enumerate()
            .map(|(i, n)| device(&format!("sw{}", i), "default", &[n.as_str()]))
            .collect();

        let mut reconciler = Reconciler::new(&mock, RetryPolicy::immediate(3));
        let result = reconciler.reconcile_devices(&devices).await;

        assert!(matches!(result, Err(ReportError::IpamLookup { .. })));
        assert_eq!(mock.ipam_lookups(), MAX_CONSECUTIVE_OUTAGES * 3);
    }

    #[tokio::test]
    async fn test_successful_lookup_resets_outage_count() {
        let mock = MockWapiClient::new("https://gm.test/wapi/v2.12");
        let mut devices = Vec::new();
        for i in 0..6 {
            let failing = format!("10.{}.0.0/24", 60 + i);
            let healthy = format!("10.{}.0.0/24", 70 + i);
            mock.fail_lookup(&failing, 100, MockFailure::Transient);
            devices.push(device(&format!("sw{}", i), "default", &[failing.as_str(), healthy.as_str()]));
        }

        let mut reconciler = Reconciler::new(&mock, RetryPolicy::immediate(3));
        let records = reconciler.reconcile_devices(&devices).await.unwrap();

        assert_eq!(records.len(), 12);
        assert_eq!(records.iter().filter(|r| r.status.label() == "unknown").count(), 6);
    }

    #[tokio::test]
    async fn test_auth_failure_aborts() {
        let mock = MockWapiClient::new("https://gm.test/wapi/v2.12");
        mock.fail_lookup("10.6.0.0/24", 1, MockFailure::Authentication);

        let devices = vec![device("sw1", "default", &["10.6.0.0/24"])];
        let mut reconciler = Reconciler::new(&mock, RetryPolicy::immediate(3));
        let result = reconciler.reconcile_devices(&devices).await;

        assert!(matches!(result, Err(ReportError::IpamLookup { .. })));
        assert_eq!(mock.lookups_for("10.6.0.0/24"), 1);
    }

    #[tokio::test]
    async fn test_invalid_cidr_skips_lookup() {
        let mock = MockWapiClient::new("https://gm.test/wapi/v2.12");
        let devices = vec![device("sw1", "default", &["not-a-network"])];

        let mut reconciler = Reconciler::new(&mock, RetryPolicy::immediate(3));
        let records = reconciler.reconcile_devices(&devices).await.unwrap();

        assert_eq!(statuses(&records), vec!["unknown"]);
        assert_eq!(mock.ipam_lookups(), 0);
    }

    #[tokio::test]
    async fn test_device_without_networks_yields_no_record() {
        let mock = MockWapiClient::new("https://gm.test/wapi/v2.12");
        let devices = vec![device("printer", "default", &[]), device("sw1", "default", &["10.7.0.0/24"])];

        let mut reconciler = Reconciler::new(&mock, RetryPolicy::immediate(3));
        let records = reconciler.reconcile_devices(&devices).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].device, "sw1");
        let stats = reconciler.stats();
        assert_eq!(stats.devices_seen, 2);
        assert_eq!(stats.devices_without_networks, 1);
    }
}
