use crate::{
    catalogue::{
        CERTIFICATE_VALID_SINCE,
        CERTIFICATE_VALID_TILL,
    },
    collector::Collector,
    coordinator::{
        Cycle,
        SampleStream,
        Unit,
    },
    error::{
        CycleError,
        UnitError,
    },
    payload::ACCOUNT_LABEL,
    sample::MetricSample,
};
use sbercdn_api_client::{
    CdnApiClient,
    CertificateFetcher,
    CertificateRecord,
};
use std::{
    future::Future,
    pin::Pin,
};

pub const COMMON_NAME_LABEL: &str = "cn";

/// Validity window of every certificate, one unit per account.
pub struct CertificateCollector {
    client: CdnApiClient,
}

impl CertificateCollector {
    pub fn new(client: CdnApiClient) -> Self {
        Self { client }
    }
}

impl Collector for CertificateCollector {
    fn collect<'a>(
        &'a self,
        cycle: &'a Cycle,
    ) -> Pin<Box<dyn Future<Output = Result<SampleStream, CycleError>> + Send + 'a>> {
        Box::pin(async move {
            let accounts = cycle.bounded(self.client.accounts().active_accounts()).await??;
            let units = accounts
                .iter()
                .map(|account| {
                    (
                        Unit::new(&account.name, "certificate"),
                        fetch_certificates(self.client.certificates().clone(), account.name.clone()),
                    )
                })
                .collect::<Vec<_>>();
            Ok(cycle.fan_out(units))
        })
    }

    fn name(&self) -> &'static str {
        "certificates"
    }
}

#[instrument(level = "debug", skip(certificates))]
async fn fetch_certificates(certificates: CertificateFetcher, account: String) -> Result<Vec<MetricSample>, UnitError> {
    let records = certificates.fetch(&account).await?;
    Ok(records.iter().flat_map(|record| samples(&account, record)).collect())
}

pub fn samples(account: &str, record: &CertificateRecord) -> [MetricSample; 2] {
    [
        (CERTIFICATE_VALID_SINCE, record.not_before),
        (CERTIFICATE_VALID_TILL, record.not_after),
    ]
    .map(|(name, value)| {
        MetricSample::new(name, value)
            .label(ACCOUNT_LABEL, account)
            .label(COMMON_NAME_LABEL, &record.common_name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn two_samples_per_certificate() {
        let record = CertificateRecord {
            common_name: "cdn.example.com".to_string(),
            alternate_names: vec![],
            issuer: "CA".to_string(),
            comment: String::new(),
            not_before: 1_700_000_000.0,
            not_after: 1_710_000_000.0,
        };
        let [since, till] = samples("acc1", &record);
        assert_eq!(since.name, "certificate_valid_since");
        assert_eq!(since.value, 1_700_000_000.0);
        assert_eq!(till.name, "certificate_valid_till");
        assert_eq!(till.value, 1_710_000_000.0);
        assert_eq!(
            till.labels,
            [
                ("account".to_string(), "acc1".to_string()),
                ("cn".to_string(), "cdn.example.com".to_string()),
            ]
        );
        assert_eq!(till.timestamp, None);
    }
}
