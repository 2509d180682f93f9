//! The storage seams the import and ranking run against.
//!
//! `Store` is the long-lived handle; `ImportTx` is a single unit of work that
//! either commits as a whole or leaves the store untouched.

#![allow(async_fn_in_trait)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Activity, Child, NewResult, ScoredResult, Week};

pub trait Store {
    type Tx: ImportTx;

    async fn begin(&self) -> Result<Self::Tx, StoreError>;

    async fn list_children(&self) -> Result<Vec<Child>, StoreError>;

    async fn list_scored_results(&self) -> Result<Vec<ScoredResult>, StoreError>;

    /// Sets group label and/or age on every child with exactly this name.
    /// Returns how many children were updated.
    async fn update_child(
        &self,
        name: &str,
        group_label: Option<&str>,
        age: Option<u8>,
    ) -> Result<u64, StoreError>;
}

pub trait ImportTx {
    /// First child with this exact name, created if none exists.
    async fn get_or_create_child(&mut self, name: &str) -> Result<Child, StoreError>;

    /// Week by number; a new week spans `default_date` to `default_date`.
    async fn get_or_create_week(
        &mut self,
        number: i32,
        default_date: NaiveDate,
    ) -> Result<Week, StoreError>;

    /// Atomic find-or-insert keyed by point value. `name` is only used when
    /// the activity is created.
    async fn get_or_create_activity(
        &mut self,
        points: Decimal,
        name: &str,
    ) -> Result<Activity, StoreError>;

    async fn set_activity_name(&mut self, id: Uuid, name: &str) -> Result<(), StoreError>;

    /// Removes every result whose child is in `child_ids` and whose week is in
    /// `week_ids`.
    async fn delete_results(
        &mut self,
        child_ids: &[Uuid],
        week_ids: &[Uuid],
    ) -> Result<u64, StoreError>;

    async fn insert_results(&mut self, results: &[NewResult]) -> Result<u64, StoreError>;

    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}
