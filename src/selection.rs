//! Ephemeral view selection: which metrics are plotted, the category filter
//! and the sort mode. Never persisted; passed explicitly to the projector.

use crate::errors::JourneyError;
use crate::models::Journey;
use serde::{Deserialize, Serialize};

const ALL_CATEGORIES: &str = "all";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    #[default]
    ByMilestone,
    ByValue,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategoryFilter {
    #[default]
    All,
    Category(String),
}

impl CategoryFilter {
    pub fn admits(&self, category: &str) -> bool {
        match self {
            Self::All => true,
            Self::Category(wanted) => wanted == category,
        }
    }
}

impl From<String> for CategoryFilter {
    fn from(value: String) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case(ALL_CATEGORIES) {
            Self::All
        } else {
            Self::Category(value.to_string())
        }
    }
}

impl From<CategoryFilter> for String {
    fn from(value: CategoryFilter) -> Self {
        match value {
            CategoryFilter::All => ALL_CATEGORIES.to_string(),
            CategoryFilter::Category(category) => category,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    metrics: Vec<String>,
    filter: CategoryFilter,
    sort: SortMode,
}

/// Full replacement of the selection, as sent by the page.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectionUpdate {
    pub metrics: Vec<String>,
    #[serde(default)]
    pub filter: CategoryFilter,
    #[serde(default)]
    pub sort: SortMode,
}

/// Partial change from the filter and sort controls.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectionPatch {
    pub filter: Option<CategoryFilter>,
    pub sort: Option<SortMode>,
}

impl Selection {
    /// Starts with the first known metric selected.
    pub fn for_journey(journey: &Journey) -> Self {
        Self {
            metrics: journey.metrics.first().cloned().into_iter().collect(),
            filter: CategoryFilter::All,
            sort: SortMode::ByMilestone,
        }
    }

    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    pub fn filter(&self) -> &CategoryFilter {
        &self.filter
    }

    pub fn sort(&self) -> SortMode {
        self.sort
    }

    pub fn first_metric(&self) -> Option<&str> {
        self.metrics.first().map(String::as_str)
    }

    pub fn is_selected(&self, metric: &str) -> bool {
        self.metrics.iter().any(|m| m == metric)
    }

    /// Index of `metric` among the selected metrics; this is its series index.
    pub fn position(&self, metric: &str) -> Option<usize> {
        self.metrics.iter().position(|m| m == metric)
    }

    pub fn select(&mut self, journey: &Journey, metric: &str) -> Result<(), JourneyError> {
        let metric = known_metric(journey, metric)?;
        if !self.is_selected(&metric) {
            self.metrics.push(metric);
        }
        Ok(())
    }

    /// Refuses to drop the last selected metric.
    pub fn deselect(&mut self, metric: &str) -> Result<(), JourneyError> {
        let metric = metric.trim().to_lowercase();
        let Some(index) = self.position(&metric) else {
            return Err(JourneyError::not_found(format!("metric '{metric}' is not selected")));
        };
        if self.metrics.len() == 1 {
            return Err(JourneyError::validation("at least one metric must stay selected"));
        }
        self.metrics.remove(index);
        Ok(())
    }

    pub fn set_filter(&mut self, journey: &Journey, filter: CategoryFilter) -> Result<(), JourneyError> {
        if let CategoryFilter::Category(category) = &filter {
            if !journey.has_category(category) {
                return Err(JourneyError::validation(format!("unknown category '{category}'")));
            }
        }
        self.filter = filter;
        Ok(())
    }

    pub fn set_sort(&mut self, sort: SortMode) {
        self.sort = sort;
    }

    pub fn apply(&mut self, journey: &Journey, patch: SelectionPatch) -> Result<(), JourneyError> {
        if let Some(filter) = patch.filter {
            self.set_filter(journey, filter)?;
        }
        if let Some(sort) = patch.sort {
            self.set_sort(sort);
        }
        Ok(())
    }

    /// Replaces the whole selection, or nothing on error.
    pub fn replace(&mut self, journey: &Journey, update: SelectionUpdate) -> Result<(), JourneyError> {
        let mut next = Self {
            metrics: Vec::with_capacity(update.metrics.len()),
            filter: CategoryFilter::All,
            sort: update.sort,
        };
        for metric in &update.metrics {
            next.select(journey, metric)?;
        }
        if next.metrics.is_empty() && !journey.metrics.is_empty() {
            return Err(JourneyError::validation("select at least one metric"));
        }
        next.set_filter(journey, update.filter)?;
        *self = next;
        Ok(())
    }

    /// Brings the selection back in line after the journey was replaced.
    pub fn reconcile(&mut self, journey: &Journey) {
        self.metrics.retain(|metric| journey.has_metric(metric));
        if self.metrics.is_empty() {
            if let Some(first) = journey.metrics.first() {
                self.metrics.push(first.clone());
            }
        }
        if let CategoryFilter::Category(category) = &self.filter {
            if !journey.has_category(category) {
                self.filter = CategoryFilter::All;
            }
        }
    }
}

fn known_metric(journey: &Journey, metric: &str) -> Result<String, JourneyError> {
    let metric = metric.trim().to_lowercase();
    if journey.has_metric(&metric) {
        Ok(metric)
    } else {
        Err(JourneyError::not_found(format!("unknown metric '{metric}'")))
    }
}
