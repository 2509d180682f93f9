use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Child {
    pub id: Uuid,
    pub name: String,
    pub group_label: String,
    pub age: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Week {
    pub id: Uuid,
    pub number: i32,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub id: Uuid,
    pub name: String,
    pub points: Decimal,
}

/// A result staged by the importer, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResult {
    pub child_id: Uuid,
    pub week_id: Uuid,
    pub activity_id: Uuid,
    pub quantity: i32,
}

/// One persisted result reduced to what the ranking needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredResult {
    pub child_id: Uuid,
    pub quantity: i32,
    pub points: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub children_seen: usize,
    pub weeks_processed: Vec<i32>,
    pub results_created: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Medal::Gold => "gold",
            Medal::Silver => "silver",
            Medal::Bronze => "bronze",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingEntry {
    pub position: usize,
    pub child_id: Uuid,
    pub name: String,
    pub group_label: String,
    pub total: Decimal,
    pub medal: Option<Medal>,
}
