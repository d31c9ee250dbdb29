//! Derived views over a journey: chart series, radar snapshot, grouped list
//! and per-metric statistics. Everything here is a pure function of the
//! journey and the selection.

use crate::models::{
    AnnotationMarker, ChartSeries, Journey, JourneyView, Point, PointGroup, RadarEntry,
    RadarSnapshot, SeriesLine, Statistics, Trend, metric_label,
};
use crate::selection::{Selection, SortMode};
use std::collections::BTreeMap;

/// Points needed before a trend is reported.
const TREND_WINDOW: usize = 3;
/// How far the recent mean must move from the overall mean to count as a trend.
const TREND_BAND: f64 = 0.5;

pub struct ViewProjector<'a> {
    journey: &'a Journey,
    selection: &'a Selection,
}

impl<'a> ViewProjector<'a> {
    pub fn new(journey: &'a Journey, selection: &'a Selection) -> Self {
        Self { journey, selection }
    }

    /// Everything the page draws, with statistics for `stats_metric` or the
    /// first selected metric.
    pub fn derive_view(&self, stats_metric: Option<&str>) -> JourneyView {
        let stats_metric = stats_metric.or_else(|| self.selection.first_metric());
        JourneyView {
            selection: self.selection.clone(),
            metrics: self.journey.metrics.clone(),
            categories: self.journey.categories.clone(),
            chart: self.derive_chart_series(),
            radar: self.derive_radar_snapshot(),
            groups: self.derive_grouped_list(),
            statistics: stats_metric.map(|metric| derive_statistics(self.journey, metric)),
        }
    }

    pub fn derive_chart_series(&self) -> ChartSeries {
        let selected = self.selection.metrics();
        let filtered: Vec<&Point> = self
            .category_filtered()
            .filter(|p| self.selection.is_selected(&p.metric))
            .collect();

        let mut milestones: Vec<&str> = Vec::new();
        for point in &filtered {
            if !milestones.contains(&point.milestone.as_str()) {
                milestones.push(&point.milestone);
            }
        }

        match self.selection.sort() {
            SortMode::ByMilestone => milestones.sort_unstable(),
            SortMode::ByValue => {
                if let Some(first) = self.selection.first_metric() {
                    sort_by_metric_value(&mut milestones, &filtered, first);
                }
            }
        }

        let series = selected
            .iter()
            .map(|metric| SeriesLine {
                metric: metric.clone(),
                label: metric_label(metric),
                values: milestones
                    .iter()
                    .map(|milestone| value_at(&filtered, metric, milestone))
                    .collect(),
            })
            .collect();

        // Markers sit on the plotted value, which for repeated
        // (metric, milestone) pairs is the first point's.
        let markers = filtered
            .iter()
            .filter_map(|point| {
                let annotation = point.annotation.as_deref().filter(|a| !a.is_empty())?;
                Some(AnnotationMarker {
                    series_index: self.selection.position(&point.metric)?,
                    position: milestones.iter().position(|m| *m == point.milestone)?,
                    value: value_at(&filtered, &point.metric, &point.milestone)?,
                    annotation: annotation.to_string(),
                })
            })
            .collect();

        ChartSeries {
            labels: milestones.into_iter().map(str::to_string).collect(),
            series,
            markers,
        }
    }

    /// Latest value per selected metric; the last of equal timestamps wins
    /// and metrics without points read as zero.
    pub fn derive_radar_snapshot(&self) -> RadarSnapshot {
        let entries = self
            .selection
            .metrics()
            .iter()
            .map(|metric| {
                let mut latest: Option<&Point> = None;
                for point in self.journey.points.iter().filter(|p| &p.metric == metric) {
                    if latest.is_none_or(|l| point.timestamp >= l.timestamp) {
                        latest = Some(point);
                    }
                }
                RadarEntry {
                    metric: metric.clone(),
                    label: metric_label(metric),
                    value: latest.map_or(0, |p| p.value),
                }
            })
            .collect();
        RadarSnapshot { entries }
    }

    /// Category-filtered points grouped per selected metric, groups in
    /// metric name order.
    pub fn derive_grouped_list(&self) -> Vec<PointGroup> {
        let mut groups: BTreeMap<&str, Vec<&Point>> = BTreeMap::new();
        for point in self.category_filtered() {
            groups.entry(point.metric.as_str()).or_default().push(point);
        }

        groups
            .into_iter()
            .filter(|(metric, _)| self.selection.is_selected(metric))
            .map(|(metric, mut points)| {
                match self.selection.sort() {
                    SortMode::ByValue => points.sort_by_key(|p| p.value),
                    SortMode::ByMilestone => points.sort_by(|a, b| a.milestone.cmp(&b.milestone)),
                }
                PointGroup {
                    metric: metric.to_string(),
                    label: metric_label(metric),
                    points: points.into_iter().cloned().collect(),
                }
            })
            .collect()
    }

    fn category_filtered(&self) -> impl Iterator<Item = &'a Point> + '_ {
        let filter = self.selection.filter();
        self.journey
            .points
            .iter()
            .filter(move |p| filter.admits(&p.category))
    }
}

/// Aggregates over every point of `metric`, regardless of filter or selection.
pub fn derive_statistics(journey: &Journey, metric: &str) -> Statistics {
    let metric = metric.trim().to_lowercase();
    let points: Vec<&Point> = journey.points.iter().filter(|p| p.metric == metric).collect();
    let count = points.len();
    if count == 0 {
        return Statistics {
            metric,
            count,
            mean: None,
            max: None,
            min: None,
            trend: Trend::NotAvailable,
        };
    }

    let mean = mean_of(points.iter().map(|p| p.value));
    let trend = if count < TREND_WINDOW {
        Trend::NotAvailable
    } else {
        let mut recent = points.clone();
        recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        let recent_mean = mean_of(recent.iter().take(TREND_WINDOW).map(|p| p.value));
        if recent_mean > mean + TREND_BAND {
            Trend::Rising
        } else if recent_mean < mean - TREND_BAND {
            Trend::Falling
        } else {
            Trend::Stable
        }
    };

    Statistics {
        metric,
        count,
        mean: Some(mean),
        max: points.iter().map(|p| p.value).max(),
        min: points.iter().map(|p| p.value).min(),
        trend,
    }
}

fn mean_of(values: impl Iterator<Item = u8>) -> f64 {
    let (sum, count) = values.fold((0u64, 0u64), |(sum, count), v| (sum + u64::from(v), count + 1));
    if count == 0 { 0.0 } else { sum as f64 / count as f64 }
}

/// First point in storage order for (metric, milestone).
fn value_at(points: &[&Point], metric: &str, milestone: &str) -> Option<u8> {
    points
        .iter()
        .find(|p| p.metric == metric && p.milestone == milestone)
        .map(|p| p.value)
}

/// Orders milestones by the value `metric` has there. Milestones without a
/// value for `metric` keep their slot; the valued ones are stably sorted
/// among the remaining slots.
fn sort_by_metric_value(milestones: &mut [&str], points: &[&Point], metric: &str) {
    let slots: Vec<usize> = (0..milestones.len())
        .filter(|&i| value_at(points, metric, milestones[i]).is_some())
        .collect();
    let mut valued: Vec<(&str, u8)> = slots
        .iter()
        .filter_map(|&i| value_at(points, metric, milestones[i]).map(|v| (milestones[i], v)))
        .collect();
    valued.sort_by_key(|(_, value)| *value);
    for (slot, (milestone, _)) in slots.into_iter().zip(valued) {
        milestones[slot] = milestone;
    }
}
