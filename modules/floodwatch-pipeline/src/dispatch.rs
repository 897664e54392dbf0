//! Hand-off of completed reports to persistence and alerting.
//!
//! Sink failures are logged and reported in the summary; they never change
//! the pipeline response.

use tracing::{info, warn};

use floodwatch_common::{ConsolidatedReport, ReportRequest};

use crate::deps::ServiceContext;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub persisted_to: Option<String>,
    pub notified: bool,
}

pub async fn dispatch(
    ctx: &ServiceContext,
    request: &ReportRequest,
    report: &ConsolidatedReport,
) -> DispatchSummary {
    let bucket = request.storage_target.as_deref().unwrap_or(&ctx.default_bucket);

    let persist = async {
        match &ctx.sink {
            Some(sink) => match sink.persist(bucket, report).await {
                Ok(location) => {
                    info!(
                        report_id = %report.report_id,
                        location = location.as_str(),
                        "Report persisted"
                    );
                    Some(location)
                }
                Err(e) => {
                    warn!(report_id = %report.report_id, error = %e, "Failed to persist report");
                    None
                }
            },
            None => None,
        }
    };

    let notify = async {
        match &ctx.notifier {
            Some(notifier) => match notifier.notify(report).await {
                Ok(()) => {
                    info!(report_id = %report.report_id, "Alert sent");
                    true
                }
                Err(e) => {
                    warn!(report_id = %report.report_id, error = %e, "Failed to send alert");
                    false
                }
            },
            None => false,
        }
    };

    let (persisted_to, notified) = tokio::join!(persist, notify);
    DispatchSummary {
        persisted_to,
        notified,
    }
}
