//! Table-driven mapping from typed payloads to metric samples.
//!
//! A [`Descriptor`] pairs a metric identity ([`MetricDesc`]) with two plain
//! functions: one extracting the value from a payload, one extracting the
//! label values from the entity id and payload. Collectors build their
//! tables once at construction; adding a metric means adding a row.

use std::fmt;
use std::sync::Arc;

/// Constant label pairs attached to every sample of a metric.
pub type ConstLabels = Vec<(String, String)>;

/// Extracts a metric value from a payload. Never fails.
pub type ValueFn<P> = fn(&P) -> f64;

/// Extracts label values (in label-name order) from an entity id and payload.
pub type LabelFn<P> = fn(&str, &P) -> Vec<String>;

/// Prometheus metric type.
///
/// Informational: every exported value is a point-in-time reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Gauge,
    Counter,
}

impl MetricKind {
    /// Type name for `# TYPE` lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Gauge => "gauge",
            MetricKind::Counter => "counter",
        }
    }
}

/// Identity of a metric: name, help text and label schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricDesc {
    pub fq_name: String,
    pub help: String,
    pub variable_labels: Vec<String>,
    pub const_labels: ConstLabels,
}

impl MetricDesc {
    pub fn new(
        fq_name: impl Into<String>,
        help: impl Into<String>,
        variable_labels: &[&str],
        const_labels: &ConstLabels,
    ) -> Self {
        Self {
            fq_name: fq_name.into(),
            help: help.into(),
            variable_labels: variable_labels.iter().map(|l| l.to_string()).collect(),
            const_labels: const_labels.clone(),
        }
    }
}

/// One sampled value of a metric.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub desc: Arc<MetricDesc>,
    pub kind: MetricKind,
    /// Values for `desc.variable_labels`, same order and length.
    pub label_values: Vec<String>,
    pub value: f64,
}

impl Sample {
    pub fn new(
        desc: Arc<MetricDesc>,
        kind: MetricKind,
        label_values: Vec<String>,
        value: f64,
    ) -> Self {
        debug_assert_eq!(
            label_values.len(),
            desc.variable_labels.len(),
            "label arity mismatch for {}",
            desc.fq_name
        );
        Self {
            desc,
            kind,
            label_values,
            value,
        }
    }

    /// The metric's fully qualified name.
    pub fn name(&self) -> &str {
        &self.desc.fq_name
    }

    /// All label pairs, constant labels first.
    pub fn labels(&self) -> impl Iterator<Item = (&str, &str)> {
        let constant = self
            .desc
            .const_labels
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()));
        let variable = self
            .desc
            .variable_labels
            .iter()
            .zip(&self.label_values)
            .map(|(k, v)| (k.as_str(), v.as_str()));
        constant.chain(variable)
    }

    /// Look up a label value by name.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels().find(|(k, _)| *k == name).map(|(_, v)| v)
    }
}

/// A metric identity with its value and label extraction functions.
pub struct Descriptor<P> {
    kind: MetricKind,
    desc: Arc<MetricDesc>,
    value: ValueFn<P>,
    labels: LabelFn<P>,
}

impl<P> Descriptor<P> {
    pub fn new(kind: MetricKind, desc: MetricDesc, value: ValueFn<P>, labels: LabelFn<P>) -> Self {
        Self {
            kind,
            desc: Arc::new(desc),
            value,
            labels,
        }
    }

    /// Shorthand for a gauge descriptor.
    pub fn gauge(desc: MetricDesc, value: ValueFn<P>, labels: LabelFn<P>) -> Self {
        Self::new(MetricKind::Gauge, desc, value, labels)
    }

    pub fn desc(&self) -> &Arc<MetricDesc> {
        &self.desc
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    /// Derive the sample for one entity's payload.
    pub fn sample(&self, entity: &str, payload: &P) -> Sample {
        Sample::new(
            Arc::clone(&self.desc),
            self.kind,
            (self.labels)(entity, payload),
            (self.value)(payload),
        )
    }
}

impl<P> fmt::Debug for Descriptor<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("kind", &self.kind)
            .field("desc", &self.desc)
            .finish_non_exhaustive()
    }
}

/// Ordered, immutable list of descriptors applied to one payload type.
#[derive(Debug)]
pub struct DescriptorTable<P> {
    descriptors: Vec<Descriptor<P>>,
}

impl<P> DescriptorTable<P> {
    pub fn new(descriptors: Vec<Descriptor<P>>) -> Self {
        Self { descriptors }
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Metric identities in table order.
    pub fn descs(&self) -> impl Iterator<Item = Arc<MetricDesc>> + '_ {
        self.descriptors.iter().map(|d| Arc::clone(d.desc()))
    }

    /// One sample per descriptor, in table order.
    pub fn samples<'a>(
        &'a self,
        entity: &'a str,
        payload: &'a P,
    ) -> impl Iterator<Item = Sample> + 'a {
        self.descriptors
            .iter()
            .map(move |descriptor| descriptor.sample(entity, payload))
    }
}
