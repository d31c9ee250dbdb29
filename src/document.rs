//! Reading saved, exported and imported journey documents.
//!
//! Two shapes are accepted: the current multi-metric document (optionally
//! carrying `version`) and the older single-metric one
//! `{ metric, points: [{ milestone, value, annotation }] }`, which is migrated.

use crate::errors::JourneyError;
use crate::models::{
    Journey, MAX_VALUE, OTHER_CATEGORY, Point, PointId, SCHEMA_VERSION, default_categories,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::info;

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    version: Option<u32>,
    metrics: Vec<String>,
    #[serde(default)]
    categories: Option<Vec<String>>,
    points: Vec<RawPoint>,
}

#[derive(Debug, Deserialize)]
struct RawPoint {
    #[serde(default)]
    id: Option<PointId>,
    milestone: String,
    value: u8,
    #[serde(default)]
    annotation: Option<String>,
    #[serde(default)]
    category: Option<String>,
    metric: String,
    #[serde(default)]
    timestamp: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct SingleMetricDocument {
    metric: String,
    points: Vec<SingleMetricPoint>,
}

#[derive(Debug, Deserialize)]
struct SingleMetricPoint {
    milestone: String,
    value: u8,
    #[serde(default)]
    annotation: Option<String>,
}

pub fn parse_bytes(bytes: &[u8]) -> Result<Journey, JourneyError> {
    let raw: Value = serde_json::from_slice(bytes).map_err(malformed)?;
    parse(&raw)
}

pub fn parse(raw: &Value) -> Result<Journey, JourneyError> {
    if !raw.is_object() {
        return Err(JourneyError::format("expected a JSON object"));
    }
    if raw.get("metrics").is_some() {
        RawDocument::deserialize(raw).map_err(malformed).and_then(from_current)
    } else if raw.get("metric").is_some() {
        SingleMetricDocument::deserialize(raw)
            .map_err(malformed)
            .and_then(migrate_single_metric)
    } else {
        Err(JourneyError::format("missing 'metrics' field"))
    }
}

fn malformed(err: serde_json::Error) -> JourneyError {
    JourneyError::format(err.to_string())
}

fn from_current(doc: RawDocument) -> Result<Journey, JourneyError> {
    if let Some(version) = doc.version.filter(|v| *v > SCHEMA_VERSION) {
        return Err(JourneyError::format(format!("unsupported version {version}")));
    }

    let mut metrics = Vec::with_capacity(doc.metrics.len());
    for name in &doc.metrics {
        push_metric(&mut metrics, name);
    }
    let mut categories = match doc.categories {
        None => default_categories(),
        Some(raw) => {
            let mut categories = Vec::with_capacity(raw.len());
            for name in &raw {
                push_category(&mut categories, name);
            }
            categories
        }
    };
    push_category(&mut categories, OTHER_CATEGORY);

    let mut points = Vec::with_capacity(doc.points.len());
    let mut ids = Vec::with_capacity(doc.points.len());
    for (index, raw) in doc.points.into_iter().enumerate() {
        let metric = raw.metric.trim().to_lowercase();
        if metric.is_empty() {
            return Err(JourneyError::format(format!("point {index}: missing metric")));
        }
        let category = raw
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(OTHER_CATEGORY)
            .to_string();

        push_metric(&mut metrics, &metric);
        push_category(&mut categories, &category);
        ids.push(raw.id);
        points.push(Point {
            id: 0,
            milestone: check_milestone(&raw.milestone, index)?,
            value: check_value(raw.value, index)?,
            annotation: clean_annotation(raw.annotation),
            category,
            metric,
            timestamp: raw.timestamp.unwrap_or(0),
        });
    }
    assign_ids(&mut points, &ids)?;

    Ok(Journey {
        metrics,
        categories,
        points,
    })
}

fn migrate_single_metric(doc: SingleMetricDocument) -> Result<Journey, JourneyError> {
    let metric = doc.metric.trim().to_lowercase();
    if metric.is_empty() {
        return Err(JourneyError::format("'metric' must not be empty"));
    }

    let mut points = Vec::with_capacity(doc.points.len());
    for (index, raw) in doc.points.into_iter().enumerate() {
        points.push(Point {
            id: index as PointId + 1,
            milestone: check_milestone(&raw.milestone, index)?,
            value: check_value(raw.value, index)?,
            annotation: clean_annotation(raw.annotation),
            category: OTHER_CATEGORY.to_string(),
            metric: metric.clone(),
            timestamp: index as i64,
        });
    }
    info!(metric = %metric, points = points.len(), "migrated single-metric journey");

    Ok(Journey {
        metrics: vec![metric],
        categories: default_categories(),
        points,
    })
}

fn check_milestone(milestone: &str, index: usize) -> Result<String, JourneyError> {
    let milestone = milestone.trim();
    if milestone.is_empty() {
        return Err(JourneyError::format(format!("point {index}: missing milestone")));
    }
    Ok(milestone.to_string())
}

fn check_value(value: u8, index: usize) -> Result<u8, JourneyError> {
    if value > MAX_VALUE {
        return Err(JourneyError::format(format!(
            "point {index}: value must be an integer between 0 and {MAX_VALUE}"
        )));
    }
    Ok(value)
}

fn clean_annotation(annotation: Option<String>) -> Option<String> {
    annotation
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn push_metric(metrics: &mut Vec<String>, name: &str) {
    let name = name.trim().to_lowercase();
    if !name.is_empty() && !metrics.iter().any(|m| m.eq_ignore_ascii_case(&name)) {
        metrics.push(name);
    }
}

fn push_category(categories: &mut Vec<String>, name: &str) {
    let name = name.trim();
    if !name.is_empty() && !categories.iter().any(|c| c == name) {
        categories.push(name.to_string());
    }
}

/// Keeps every unique stored id; missing and repeated ones get fresh ids
/// after the largest stored one. Fails when the largest id leaves no room
/// for the points added after loading.
fn assign_ids(points: &mut [Point], ids: &[Option<PointId>]) -> Result<(), JourneyError> {
    let largest = ids.iter().flatten().copied().max().unwrap_or(0);
    let mut next = largest
        .checked_add(1)
        .ok_or_else(|| JourneyError::format(format!("point id {largest} is out of range")))?;
    let mut seen = HashSet::with_capacity(points.len());
    for (point, id) in points.iter_mut().zip(ids) {
        point.id = match id {
            Some(id) if *id > 0 && seen.insert(*id) => *id,
            _ => {
                let fresh = next;
                next = next.checked_add(1).ok_or_else(|| {
                    JourneyError::format(format!("point id {fresh} is out of range"))
                })?;
                seen.insert(fresh);
                fresh
            }
        };
    }
    Ok(())
}
