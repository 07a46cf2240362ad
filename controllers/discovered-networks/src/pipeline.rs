//! Report pipeline
//!
//! One sequential run: credential check, paged walk over discovered
//! devices, reconciliation page by page, report assembly. Any fatal error
//! aborts the run before a report exists.

use crate::backoff::{RetryPolicy, retry};
use crate::error::ReportError;
use crate::reconciler::Reconciler;
use crate::report::{Report, ReportAssembler, ReportOptions};
use tracing::{debug, info};
use wapi_client::{DiscoveredDevice, ObjectQuery, Paginator, WapiClientTrait};

/// Parameters of one report run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// `_max_results` per discovered device page
    pub page_size: u32,
    pub retry: RetryPolicy,
    pub report: ReportOptions,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            page_size: 5,
            retry: RetryPolicy::default(),
            report: ReportOptions::default(),
        }
    }
}

/// Run the discovered networks report against `client`
pub async fn run<C>(client: &C, options: &RunOptions) -> Result<Report, ReportError>
where
    C: WapiClientTrait + ?Sized,
{
    info!("Connecting to {}", client.base_url());
    retry(&options.retry, "Credential check", || client.validate_credentials())
        .await
        .map_err(ReportError::Credentials)?;

    let mut pages = Paginator::<C, DiscoveredDevice>::new(
        client,
        ObjectQuery::discovered_devices(),
        options.page_size,
    );
    let mut reconciler = Reconciler::new(client, options.retry.clone());
    let mut records = Vec::new();

    loop {
        let page_number = pages.pages_fetched() + 1;
        let what = format!("Retrieving page {}", page_number);
        let mut attempts = options.retry.start();

        let page = loop {
            match pages.next_page().await {
                Ok(page) => break page,
                Err(e) => attempts
                    .backoff_or_fail(e, &what)
                    .await
                    .map_err(|source| ReportError::PageRetrieval {
                        page: page_number,
                        source,
                    })?,
            }
        };

        let Some(devices) = page else {
            break;
        };
        debug!("Reconciling {} devices from page {}", devices.len(), page_number);
        records.extend(reconciler.reconcile_devices(&devices).await?);
    }

    let stats = reconciler.stats();
    info!(
        "Reconciled {} discovered networks from {} devices across {} pages",
        records.len(),
        stats.devices_seen,
        pages.pages_fetched()
    );

    Ok(ReportAssembler::new(options.report).assemble(records, &stats))
}
