//! Help texts of the exported families.

use sbercdn_api_client::MetricGroup;
use std::borrow::Cow;
use strum::IntoEnumIterator as _;

pub const NAMESPACE: &str = "sbercdn";

pub const CERTIFICATE_VALID_SINCE: &str = "certificate_valid_since";
pub const CERTIFICATE_VALID_TILL: &str = "certificate_valid_till";
pub const COLLECTOR_SUCCESS: &str = "scrape_collector_success";
pub const COLLECTOR_DURATION: &str = "scrape_collector_duration_seconds";

const STATISTICS: [(&str, &str); 4] = [
    ("bandwidth", "Peak bandwidth in bits"),
    ("cache_ratio", "Cache hit ratio"),
    ("hits", "Cache hits"),
    ("traffic", "Traffic in bytes"),
];

const FIXED: [(&str, &str); 4] = [
    (CERTIFICATE_VALID_SINCE, "Certificate valid since (unix time)"),
    (CERTIFICATE_VALID_TILL, "Certificate valid till (unix time)"),
    (COLLECTOR_SUCCESS, "Whether the collector finished its scrape cycle"),
    (COLLECTOR_DURATION, "Duration of the collector scrape cycle in seconds"),
];

fn lookup(table: &[(&str, &'static str)], name: &str) -> Option<&'static str> {
    table.iter().find(|(known, _)| *known == name).map(|(_, help)| *help)
}

/// Help line of a family, by its name without namespace.
pub fn help(name: &str) -> Cow<'static, str> {
    if let Some(help) = lookup(&FIXED, name).or_else(|| lookup(&STATISTICS, name)) {
        return Cow::Borrowed(help);
    }
    for group in MetricGroup::iter().filter(|group| group.label().is_some()) {
        let Some(metric) = name.strip_prefix(&format!("{group}_")) else {
            continue;
        };
        if let Some(help) = lookup(&STATISTICS, metric) {
            return Cow::Owned(format!("{help} by {group}"));
        }
    }
    Cow::Owned(format!("SberCDN statistic {name}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn known_statistics() {
        assert_eq!(help("hits"), "Cache hits");
        assert_eq!(help("code_hits"), "Cache hits by code");
        assert_eq!(help("resource_cache_ratio"), "Cache hit ratio by resource");
        assert_eq!(help(CERTIFICATE_VALID_TILL), "Certificate valid till (unix time)");
    }

    #[test]
    fn unknown_statistics_still_get_help() {
        assert_eq!(help("code_requests"), "SberCDN statistic code_requests");
        assert_eq!(help("summary_hits"), "SberCDN statistic summary_hits");
    }
}
