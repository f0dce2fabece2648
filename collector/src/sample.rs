use crate::catalogue::{
    self,
    NAMESPACE,
};
use chrono::{
    DateTime,
    Utc,
};
use std::{
    borrow::Cow,
    collections::HashMap,
};

/// A single value found in an API response, before it is namespaced and rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    /// Name without the namespace, e.g. `hits` or `code_hits`.
    pub name: String,
    pub labels: Vec<(String, String)>,
    pub value: f64,
    pub timestamp: Option<DateTime<Utc>>,
}

impl MetricSample {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            labels: Vec::new(),
            value,
            timestamp: None,
        }
    }

    pub fn label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.push((name.into(), value.into()));
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn label_value(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(label, _)| label == name)
            .map(|(_, value)| value.as_str())
    }
}

/// All samples sharing one metric name, ready for exposition.
#[derive(Debug, Clone, PartialEq)]
pub struct Family {
    /// Fully qualified name, `sbercdn_<name>`.
    pub name: String,
    pub help: Cow<'static, str>,
    pub samples: Vec<MetricSample>,
}

impl Family {
    /// Groups samples by name, families ordered by first appearance.
    pub fn group(samples: impl IntoIterator<Item = MetricSample>) -> Vec<Family> {
        let mut families: Vec<Family> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for sample in samples {
            let position = *index.entry(sample.name.clone()).or_insert_with(|| {
                families.push(Family {
                    name: format!("{NAMESPACE}_{}", sample.name),
                    help: catalogue::help(&sample.name),
                    samples: Vec::new(),
                });
                families.len() - 1
            });
            families[position].samples.push(sample);
        }
        families
    }
}
