//! Canonical journey state and every mutation on it.
//!
//! Points are addressed by an immutable id handed out from a per-journey
//! sequence. A failing operation leaves the journey untouched.

use crate::document;
use crate::errors::JourneyError;
use crate::models::{
    Journey, JourneyDocument, MAX_VALUE, NewPoint, OTHER_CATEGORY, Point, PointId, PointPatch,
    SCHEMA_VERSION,
};
use chrono::Utc;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct JourneyStore {
    journey: Journey,
    /// `None` once the id space is used up.
    next_id: Option<PointId>,
}

impl Default for JourneyStore {
    fn default() -> Self {
        Self::from_journey(Journey::default())
    }
}

impl JourneyStore {
    pub fn from_journey(journey: Journey) -> Self {
        let next_id = journey.points.iter().map(|p| p.id).max().unwrap_or(0).checked_add(1);
        Self { journey, next_id }
    }

    pub fn journey(&self) -> &Journey {
        &self.journey
    }

    pub fn len(&self) -> usize {
        self.journey.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.journey.points.is_empty()
    }

    pub fn add_point(&mut self, new: NewPoint) -> Result<Point, JourneyError> {
        self.add_point_at(new, Utc::now().timestamp_millis())
    }

    pub fn add_point_at(&mut self, new: NewPoint, timestamp: i64) -> Result<Point, JourneyError> {
        let id = self
            .next_id
            .ok_or_else(|| JourneyError::validation("no point ids left in this journey"))?;
        let point = Point {
            id,
            milestone: check_milestone(&new.milestone)?,
            value: check_value(new.value)?,
            annotation: clean_annotation(new.annotation.as_deref()),
            category: self.check_category(new.category.as_deref())?,
            metric: self.check_metric(&new.metric)?,
            timestamp,
        };
        self.next_id = id.checked_add(1);
        debug!(id = point.id, metric = %point.metric, "point added");
        self.journey.points.push(point.clone());
        Ok(point)
    }

    pub fn point(&self, id: PointId) -> Option<&Point> {
        self.journey.points.iter().find(|p| p.id == id)
    }

    /// Current values of a point, for pre-filling an edit form. The point
    /// stays in place until `update_point` replaces it.
    pub fn edit_point(&self, id: PointId) -> Result<Point, JourneyError> {
        self.point(id).cloned().ok_or_else(|| missing_point(id))
    }

    /// Replaces the patched fields of a point in one step, keeping its id
    /// and timestamp.
    pub fn update_point(&mut self, id: PointId, patch: PointPatch) -> Result<Point, JourneyError> {
        let index = self.index_of(id)?;
        let mut updated = self.journey.points[index].clone();
        if let Some(milestone) = &patch.milestone {
            updated.milestone = check_milestone(milestone)?;
        }
        if let Some(value) = patch.value {
            updated.value = check_value(value)?;
        }
        if let Some(annotation) = &patch.annotation {
            updated.annotation = clean_annotation(Some(annotation));
        }
        if let Some(category) = &patch.category {
            updated.category = self.check_category(Some(category))?;
        }
        if let Some(metric) = &patch.metric {
            updated.metric = self.check_metric(metric)?;
        }
        debug!(id, "point updated");
        self.journey.points[index] = updated.clone();
        Ok(updated)
    }

    pub fn delete_point(&mut self, id: PointId) -> Result<Point, JourneyError> {
        let index = self.index_of(id)?;
        debug!(id, "point deleted");
        Ok(self.journey.points.remove(index))
    }

    /// Registers a metric under its trimmed, lowercased name.
    pub fn register_metric(&mut self, name: &str) -> Result<String, JourneyError> {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return Err(JourneyError::validation("metric name must not be empty"));
        }
        if self.journey.has_metric(&name) {
            return Err(JourneyError::Duplicate(name));
        }
        self.journey.metrics.push(name.clone());
        Ok(name)
    }

    pub fn serialize(&self) -> JourneyDocument {
        JourneyDocument {
            version: SCHEMA_VERSION,
            metrics: self.journey.metrics.clone(),
            categories: self.journey.categories.clone(),
            points: self.journey.points.clone(),
        }
    }

    /// Parses a raw document; the current journey is not touched.
    pub fn deserialize(raw: &Value) -> Result<Self, JourneyError> {
        document::parse(raw).map(Self::from_journey)
    }

    /// Swaps in a whole journey, as load and import do.
    pub fn replace(&mut self, other: JourneyStore) {
        *self = other;
    }

    fn index_of(&self, id: PointId) -> Result<usize, JourneyError> {
        self.journey
            .points
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| missing_point(id))
    }

    fn check_category(&self, category: Option<&str>) -> Result<String, JourneyError> {
        let category = category.map(str::trim).filter(|c| !c.is_empty());
        match category {
            None => Ok(OTHER_CATEGORY.to_string()),
            Some(category) if self.journey.has_category(category) => Ok(category.to_string()),
            Some(category) => Err(JourneyError::validation(format!(
                "unknown category '{category}'"
            ))),
        }
    }

    fn check_metric(&self, metric: &str) -> Result<String, JourneyError> {
        let metric = metric.trim().to_lowercase();
        if metric.is_empty() {
            return Err(JourneyError::validation("metric must not be empty"));
        }
        if !self.journey.has_metric(&metric) {
            return Err(JourneyError::validation(format!(
                "metric '{metric}' is not registered"
            )));
        }
        Ok(metric)
    }
}

fn check_milestone(milestone: &str) -> Result<String, JourneyError> {
    let milestone = milestone.trim();
    if milestone.is_empty() {
        return Err(JourneyError::validation("please enter a milestone or week name"));
    }
    Ok(milestone.to_string())
}

fn check_value(value: i64) -> Result<u8, JourneyError> {
    u8::try_from(value)
        .ok()
        .filter(|v| *v <= MAX_VALUE)
        .ok_or_else(|| JourneyError::validation(format!("value must be between 0 and {MAX_VALUE}")))
}

fn clean_annotation(annotation: Option<&str>) -> Option<String> {
    annotation
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
}

fn missing_point(id: PointId) -> JourneyError {
    JourneyError::not_found(format!("point {id} not found"))
}
