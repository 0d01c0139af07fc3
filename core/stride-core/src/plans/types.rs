//! Blocking plan model.
//!
//! Serialized into `plans.json`; field defaults keep older files loadable.

use serde::{Deserialize, Serialize};

pub const METERS_PER_MILE: f64 = 1609.34;
pub const METERS_PER_KILOMETER: f64 = 1000.0;
pub const SECONDS_PER_MINUTE: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, uniffi::Enum)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Parses `mon`, `monday`, `Mon` and friends.
    pub fn parse(value: &str) -> Option<Weekday> {
        let lower = value.trim().to_ascii_lowercase();
        Weekday::ALL
            .into_iter()
            .find(|day| day.name().starts_with(&lower) && lower.len() >= 3)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }
}

/// When during an active day a plan blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, uniffi::Enum)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlanDuration {
    AllDay,
    /// 24-hour `HH:MM` bounds, both inclusive.
    SpecificHours { from: String, to: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    Kilometers,
    Miles,
}

impl DistanceUnit {
    pub fn to_meters(&self, value: f64) -> f64 {
        match self {
            DistanceUnit::Kilometers => value * METERS_PER_KILOMETER,
            DistanceUnit::Miles => value * METERS_PER_MILE,
        }
    }

    pub fn from_meters(&self, meters: f64) -> f64 {
        match self {
            DistanceUnit::Kilometers => meters / METERS_PER_KILOMETER,
            DistanceUnit::Miles => meters / METERS_PER_MILE,
        }
    }
}

/// The activity goal that releases a plan's block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, uniffi::Enum)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Criterion {
    Distance { value: f64, unit: DistanceUnit },
    Time { minutes: f64 },
    /// Never released by activity.
    Permanent,
}

impl Criterion {
    pub fn is_permanent(&self) -> bool {
        matches!(self, Criterion::Permanent)
    }

    /// Distance target in meters, if this is a distance criterion.
    pub fn target_meters(&self) -> Option<f64> {
        match self {
            Criterion::Distance { value, unit } => Some(unit.to_meters(*value)),
            _ => None,
        }
    }

    /// Time target in seconds, if this is a time criterion.
    pub fn target_seconds(&self) -> Option<f64> {
        match self {
            Criterion::Time { minutes } => Some(minutes * SECONDS_PER_MINUTE),
            _ => None,
        }
    }
}

fn default_active() -> bool {
    true
}

/// A user rule: which apps to block, when, and what releases them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct BlockingPlan {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub days: Vec<Weekday>,
    pub duration: PlanDuration,
    pub criterion: Criterion,
    /// Package identifiers of the apps this plan blocks.
    #[serde(default)]
    pub blocked_apps: Vec<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    /// RFC 3339
    #[serde(default)]
    pub created_at: String,
}

/// User-editable fields of a plan. The store assigns id and creation time.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct PlanDraft {
    pub name: String,
    pub days: Vec<Weekday>,
    pub duration: PlanDuration,
    pub criterion: Criterion,
    pub blocked_apps: Vec<String>,
    pub active: bool,
}

impl From<&BlockingPlan> for PlanDraft {
    fn from(plan: &BlockingPlan) -> Self {
        Self {
            name: plan.name.clone(),
            days: plan.days.clone(),
            duration: plan.duration.clone(),
            criterion: plan.criterion.clone(),
            blocked_apps: plan.blocked_apps.clone(),
            active: plan.active,
        }
    }
}
