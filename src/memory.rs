//! In-memory store used by the test suite. A transaction works on a copy of
//! the state and swaps it in on commit.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Activity, Child, NewResult, ScoredResult, Week};
use crate::store::{ImportTx, Store};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredResult {
    pub id: Uuid,
    pub child_id: Uuid,
    pub week_id: Uuid,
    pub activity_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Default)]
pub struct State {
    pub children: Vec<Child>,
    pub weeks: Vec<Week>,
    pub activities: Vec<Activity>,
    pub results: Vec<StoredResult>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    fail_inserts: bool,
    fail_rollback: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose `insert_results` always fails, for rollback tests.
    pub fn failing_inserts(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            fail_inserts: true,
            fail_rollback: self.fail_rollback,
        }
    }

    /// A store whose transactions also fail to roll back.
    pub fn failing_rollback(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            fail_inserts: self.fail_inserts,
            fail_rollback: true,
        }
    }

    pub fn snapshot(&self) -> State {
        self.lock().clone()
    }

    pub fn add_child(&self, name: &str, age: Option<u8>) -> Child {
        let child = Child {
            id: Uuid::new_v4(),
            name: name.to_string(),
            group_label: String::new(),
            age,
        };
        self.lock().children.push(child.clone());
        child
    }

    pub fn add_activity(&self, name: &str, points: Decimal) -> Activity {
        let activity = Activity {
            id: Uuid::new_v4(),
            name: name.to_string(),
            points,
        };
        self.lock().activities.push(activity.clone());
        activity
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct MemoryTx {
    shared: Arc<Mutex<State>>,
    work: State,
    fail_inserts: bool,
    fail_rollback: bool,
}

impl Store for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, StoreError> {
        Ok(MemoryTx {
            shared: Arc::clone(&self.state),
            work: self.snapshot(),
            fail_inserts: self.fail_inserts,
            fail_rollback: self.fail_rollback,
        })
    }

    async fn list_children(&self) -> Result<Vec<Child>, StoreError> {
        Ok(self.lock().children.clone())
    }

    async fn list_scored_results(&self) -> Result<Vec<ScoredResult>, StoreError> {
        let state = self.lock();
        state
            .results
            .iter()
            .map(|result| {
                let activity = state
                    .activities
                    .iter()
                    .find(|a| a.id == result.activity_id)
                    .ok_or_else(|| StoreError::Constraint("dangling activity".to_string()))?;
                Ok(ScoredResult {
                    child_id: result.child_id,
                    quantity: result.quantity,
                    points: activity.points,
                })
            })
            .collect()
    }

    async fn update_child(
        &self,
        name: &str,
        group_label: Option<&str>,
        age: Option<u8>,
    ) -> Result<u64, StoreError> {
        if age.is_some_and(|age| age > 12) {
            return Err(StoreError::Constraint("age must be between 0 and 12".to_string()));
        }
        let mut state = self.lock();
        let mut updated = 0;
        for child in state.children.iter_mut().filter(|c| c.name == name) {
            if let Some(label) = group_label {
                child.group_label = label.to_string();
            }
            if age.is_some() {
                child.age = age;
            }
            updated += 1;
        }
        Ok(updated)
    }
}

impl ImportTx for MemoryTx {
    async fn get_or_create_child(&mut self, name: &str) -> Result<Child, StoreError> {
        if let Some(child) = self.work.children.iter().find(|c| c.name == name) {
            return Ok(child.clone());
        }
        let child = Child {
            id: Uuid::new_v4(),
            name: name.to_string(),
            group_label: String::new(),
            age: None,
        };
        self.work.children.push(child.clone());
        Ok(child)
    }

    async fn get_or_create_week(
        &mut self,
        number: i32,
        default_date: NaiveDate,
    ) -> Result<Week, StoreError> {
        if let Some(week) = self.work.weeks.iter().find(|w| w.number == number) {
            return Ok(week.clone());
        }
        let week = Week {
            id: Uuid::new_v4(),
            number,
            starts_on: default_date,
            ends_on: default_date,
        };
        self.work.weeks.push(week.clone());
        Ok(week)
    }

    async fn get_or_create_activity(
        &mut self,
        points: Decimal,
        name: &str,
    ) -> Result<Activity, StoreError> {
        if let Some(activity) = self.work.activities.iter().find(|a| a.points == points) {
            return Ok(activity.clone());
        }
        let activity = Activity {
            id: Uuid::new_v4(),
            name: name.to_string(),
            points,
        };
        self.work.activities.push(activity.clone());
        Ok(activity)
    }

    async fn set_activity_name(&mut self, id: Uuid, name: &str) -> Result<(), StoreError> {
        let activity = self
            .work
            .activities
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| StoreError::Constraint(format!("activity {id} does not exist")))?;
        activity.name = name.to_string();
        Ok(())
    }

    async fn delete_results(
        &mut self,
        child_ids: &[Uuid],
        week_ids: &[Uuid],
    ) -> Result<u64, StoreError> {
        let before = self.work.results.len();
        self.work
            .results
            .retain(|r| !(child_ids.contains(&r.child_id) && week_ids.contains(&r.week_id)));
        Ok((before - self.work.results.len()) as u64)
    }

    async fn insert_results(&mut self, results: &[NewResult]) -> Result<u64, StoreError> {
        if self.fail_inserts {
            return Err(StoreError::Constraint("injected insert failure".to_string()));
        }
        for result in results {
            if result.quantity <= 0 {
                return Err(StoreError::Constraint("quantity must be positive".to_string()));
            }
            let known = self.work.children.iter().any(|c| c.id == result.child_id)
                && self.work.weeks.iter().any(|w| w.id == result.week_id)
                && self.work.activities.iter().any(|a| a.id == result.activity_id);
            if !known {
                return Err(StoreError::Constraint("result references a missing row".to_string()));
            }
            self.work.results.push(StoredResult {
                id: Uuid::new_v4(),
                child_id: result.child_id,
                week_id: result.week_id,
                activity_id: result.activity_id,
                quantity: result.quantity,
            });
        }
        Ok(results.len() as u64)
    }

    async fn commit(self) -> Result<(), StoreError> {
        let mut shared = self
            .shared
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *shared = self.work;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        if self.fail_rollback {
            return Err(StoreError::Constraint("injected rollback failure".to_string()));
        }
        Ok(())
    }
}
