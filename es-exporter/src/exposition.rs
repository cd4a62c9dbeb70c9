//! Prometheus text exposition format (version 0.0.4).

use std::collections::HashMap;
use std::fmt::Write;

use crate::descriptor::Sample;

/// Content type of [`render`] output.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Render samples in Prometheus exposition format.
///
/// Samples are grouped by metric name in first-seen order, each family
/// preceded by its `# HELP` and `# TYPE` lines.
pub fn render(samples: &[Sample]) -> String {
    let mut order: Vec<&str> = Vec::new();
    let mut by_name: HashMap<&str, Vec<&Sample>> = HashMap::new();
    for sample in samples {
        by_name
            .entry(sample.name())
            .or_insert_with(|| {
                order.push(sample.name());
                Vec::new()
            })
            .push(sample);
    }

    let mut output = String::with_capacity(samples.len() * 100);

    for name in order {
        let family = &by_name[name];
        let first = family[0];

        writeln!(output, "# HELP {} {}", name, escape_help(&first.desc.help)).ok();
        writeln!(output, "# TYPE {} {}", name, first.kind.as_str()).ok();

        for sample in family {
            writeln!(
                output,
                "{}{} {}",
                name,
                format_labels(sample),
                format_value(sample.value)
            )
            .ok();
        }
    }

    output
}

/// Format labels for Prometheus exposition format.
fn format_labels(sample: &Sample) -> String {
    let parts: Vec<String> = sample
        .labels()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label_value(v)))
        .collect();

    if parts.is_empty() {
        return String::new();
    }

    format!("{{{}}}", parts.join(","))
}

/// Escape special characters in label values.
fn escape_label_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape help text; quotes are allowed there.
fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Format a floating point value for Prometheus.
fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value.is_sign_positive() {
            "+Inf".to_string()
        } else {
            "-Inf".to_string()
        }
    } else if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}
