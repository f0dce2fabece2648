//! Prometheus text exposition format, version 0.0.4.

use sbercdn_exporter_collector::{
    Family,
    MetricSample,
};
use std::fmt::Write as _;

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub fn render(families: &[Family]) -> String {
    let mut output = String::new();
    for family in families.iter().filter(|family| !family.samples.is_empty()) {
        write_family(&mut output, family);
    }
    output
}

fn write_family(output: &mut String, family: &Family) {
    let _ = writeln!(output, "# HELP {} {}", family.name, escape(&family.help, false));
    let _ = writeln!(output, "# TYPE {} gauge", family.name);
    for sample in &family.samples {
        write_sample(output, &family.name, sample);
    }
}

fn write_sample(output: &mut String, name: &str, sample: &MetricSample) {
    output.push_str(name);
    if !sample.labels.is_empty() {
        let labels = sample
            .labels
            .iter()
            .map(|(label, value)| format!("{label}=\"{}\"", escape(value, true)))
            .collect::<Vec<_>>()
            .join(",");
        let _ = write!(output, "{{{labels}}}");
    }
    let _ = write!(output, " {}", format_value(sample.value));
    if let Some(timestamp) = sample.timestamp {
        let _ = write!(output, " {}", timestamp.timestamp_millis());
    }
    output.push('\n');
}

/// Backslash and newline are escaped everywhere, double quotes only inside label values.
fn escape(text: &str, quotes: bool) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '"' if quotes => escaped.push_str("\\\""),
            other => escaped.push(other),
        }
    }
    escaped
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "+Inf" } else { "-Inf" }.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(millis: i64) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_millis(millis).unwrap()
    }

    #[test]
    fn families_are_rendered_once_with_all_samples() {
        let families = Family::group([
            MetricSample::new("hits", 100.0).label("account", "acc1").at(at(1_709_294_400_000)),
            MetricSample::new("hits", 0.5).label("account", "acc2").at(at(1_709_294_400_000)),
            MetricSample::new("scrape_collector_success", 1.0).label("collector", "stats"),
        ]);
        assert_eq!(
            render(&families),
            "\
# HELP sbercdn_hits Cache hits
# TYPE sbercdn_hits gauge
sbercdn_hits{account=\"acc1\"} 100 1709294400000
sbercdn_hits{account=\"acc2\"} 0.5 1709294400000
# HELP sbercdn_scrape_collector_success Whether the collector finished its scrape cycle
# TYPE sbercdn_scrape_collector_success gauge
sbercdn_scrape_collector_success{collector=\"stats\"} 1
"
        );
    }

    #[test]
    fn label_values_are_escaped() {
        let families = Family::group([MetricSample::new("resource_hits", 1.0).label("resource", "a\"b\\c\nd")]);
        let rendered = render(&families);
        assert!(rendered.contains(r#"sbercdn_resource_hits{resource="a\"b\\c\nd"} 1"#), "{rendered}");
    }

    #[test]
    fn special_values() {
        assert_eq!(format_value(f64::NAN), "NaN");
        assert_eq!(format_value(f64::INFINITY), "+Inf");
        assert_eq!(format_value(f64::NEG_INFINITY), "-Inf");
        assert_eq!(format_value(-2.0), "-2");
    }

    #[test]
    fn help_keeps_quotes() {
        assert_eq!(escape("say \"hi\"\n", false), "say \"hi\"\\n");
    }
}
