use crate::selection::Selection;
use serde::{Deserialize, Serialize};

pub type PointId = u64;

pub const MAX_VALUE: u8 = 10;
pub const OTHER_CATEGORY: &str = "Other";
pub const DEFAULT_CATEGORIES: [&str; 5] = ["Work", "Personal", "Health", "Social", OTHER_CATEGORY];
pub const DEFAULT_METRICS: [&str; 2] = ["confidence", "happiness"];
pub const SCHEMA_VERSION: u32 = 2;

/// One recorded observation of a metric at a milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub id: PointId,
    pub milestone: String,
    pub value: u8,
    #[serde(default)]
    pub annotation: Option<String>,
    pub category: String,
    pub metric: String,
    /// Unix epoch milliseconds at creation.
    pub timestamp: i64,
}

/// Aggregate root: known metrics and categories (in display order) plus every point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Journey {
    pub metrics: Vec<String>,
    pub categories: Vec<String>,
    pub points: Vec<Point>,
}

impl Default for Journey {
    fn default() -> Self {
        Self {
            metrics: DEFAULT_METRICS.iter().map(|m| m.to_string()).collect(),
            categories: default_categories(),
            points: Vec::new(),
        }
    }
}

impl Journey {
    pub fn has_metric(&self, metric: &str) -> bool {
        self.metrics.iter().any(|known| known.eq_ignore_ascii_case(metric))
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|known| known == category)
    }
}

pub fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
}

/// Persisted and exported shape of a journey.
#[derive(Debug, Clone, Serialize)]
pub struct JourneyDocument {
    pub version: u32,
    pub metrics: Vec<String>,
    pub categories: Vec<String>,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPoint {
    pub milestone: String,
    pub value: i64,
    #[serde(default)]
    pub annotation: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub metric: String,
}

/// Fields to replace on an existing point. Absent fields are kept; an empty
/// annotation clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PointPatch {
    pub milestone: Option<String>,
    pub value: Option<i64>,
    pub annotation: Option<String>,
    pub category: Option<String>,
    pub metric: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterMetricRequest {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterMetricResponse {
    pub metric: String,
    pub metrics: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub message: String,
    pub points: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesLine {
    pub metric: String,
    pub label: String,
    /// Aligned with `ChartSeries::labels`; `None` marks a gap.
    pub values: Vec<Option<u8>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationMarker {
    pub series_index: usize,
    pub position: usize,
    pub value: u8,
    pub annotation: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub series: Vec<SeriesLine>,
    pub markers: Vec<AnnotationMarker>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarEntry {
    pub metric: String,
    pub label: String,
    pub value: u8,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RadarSnapshot {
    pub entries: Vec<RadarEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Rising,
    Falling,
    Stable,
    #[serde(rename = "N/A")]
    NotAvailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub metric: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub max: Option<u8>,
    pub min: Option<u8>,
    pub trend: Trend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointGroup {
    pub metric: String,
    pub label: String,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JourneyView {
    pub selection: Selection,
    pub metrics: Vec<String>,
    pub categories: Vec<String>,
    pub chart: ChartSeries,
    pub radar: RadarSnapshot,
    pub groups: Vec<PointGroup>,
    pub statistics: Option<Statistics>,
}

/// Display label for a metric name: "confidence" becomes "Confidence".
pub fn metric_label(metric: &str) -> String {
    let mut chars = metric.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
