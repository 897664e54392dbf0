use anyhow::{bail, Result};
use async_trait::async_trait;
use tracing::warn;

use floodwatch_common::ConsolidatedReport;
use twilio::TwilioService;

use crate::traits::Notifier;

/// SMS alert to a fixed recipient list.
pub struct SmsNotifier {
    twilio: TwilioService,
    recipients: Vec<String>,
}

impl SmsNotifier {
    pub fn new(twilio: TwilioService, recipients: Vec<String>) -> Self {
        Self { twilio, recipients }
    }
}

pub fn alert_body(report: &ConsolidatedReport) -> String {
    format!(
        "FLOOD ALERT: {} (severity: {}, credibility {:.2}). {} \
         Reply if you can confirm conditions in your area.",
        report.headline_location(),
        report.severity_level,
        report.credibility_score,
        report.summary.trim(),
    )
}

#[async_trait]
impl Notifier for SmsNotifier {
    /// Succeeds if at least one recipient was reached.
    async fn notify(&self, report: &ConsolidatedReport) -> Result<()> {
        if self.recipients.is_empty() {
            bail!("no alert recipients configured");
        }

        let body = alert_body(report);
        let mut delivered = 0usize;
        for recipient in &self.recipients {
            match self.twilio.send_sms(recipient, &body).await {
                Ok(_) => delivered += 1,
                Err(e) => warn!(recipient = recipient.as_str(), error = %e, "SMS delivery failed"),
            }
        }

        if delivered == 0 {
            bail!("SMS delivery failed for all {} recipients", self.recipients.len());
        }
        Ok(())
    }
}
