//! Serde glue for human readable durations such as `10s`, `1m` or `6h`.
//!
//! Plain integers are read as seconds so `max_query_time: 10` keeps working.

use serde::{
    de,
    Deserializer,
};
use std::{
    fmt,
    time::Duration,
};

pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(DurationVisitor)
}

/// Bare numbers are seconds, anything else goes through `humantime`.
pub fn parse(value: &str) -> Result<Duration, humantime::DurationError> {
    let value = value.trim();
    match value.parse::<u64>() {
        Ok(seconds) => Ok(Duration::from_secs(seconds)),
        Err(_) => humantime::parse_duration(value),
    }
}

struct DurationVisitor;

impl de::Visitor<'_> for DurationVisitor {
    type Value = Duration;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a duration like \"10s\" or a number of seconds")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Duration, E> {
        parse(value).map_err(|err| E::custom(format!("invalid duration {value:?}: {err}")))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Duration, E> {
        Ok(Duration::from_secs(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Duration, E> {
        u64::try_from(value)
            .map(Duration::from_secs)
            .map_err(|_| E::custom(format!("negative duration: {value}")))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Duration, E> {
        Duration::try_from_secs_f64(value).map_err(|err| E::custom(format!("invalid duration {value}: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Holder {
        #[serde(deserialize_with = "deserialize")]
        value: Duration,
    }

    #[test]
    fn reads_humantime_strings_and_seconds() {
        let holder: Holder = serde_yml::from_str("value: 6h").unwrap();
        assert_eq!(holder.value, Duration::from_secs(6 * 3600));

        let holder: Holder = serde_yml::from_str("value: 90").unwrap();
        assert_eq!(holder.value, Duration::from_secs(90));

        let holder: Holder = serde_yml::from_str("value: 1m 30s").unwrap();
        assert_eq!(holder.value, Duration::from_secs(90));

        assert_eq!(parse(" 15 ").unwrap(), Duration::from_secs(15));
    }

    #[test]
    fn rejects_garbage() {
        assert!(serde_yml::from_str::<Holder>("value: soon").is_err());
        assert!(serde_yml::from_str::<Holder>("value: -3").is_err());
    }
}
