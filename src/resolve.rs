use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::error::StoreError;
use crate::models::{Child, Week};
use crate::store::ImportTx;

/// Get-or-creates one child per distinct name. Names are expected trimmed and
/// non-empty; matching is exact, so spelling variants become separate children.
pub async fn resolve_children<T: ImportTx>(
    tx: &mut T,
    names: &[String],
) -> Result<HashMap<String, Child>, StoreError> {
    let mut children = HashMap::new();
    for name in names {
        if children.contains_key(name) {
            continue;
        }
        let child = tx.get_or_create_child(name).await?;
        debug!(name = %name, child_id = %child.id, "child resolved");
        children.insert(name.clone(), child);
    }
    Ok(children)
}

pub async fn resolve_weeks<T: ImportTx>(
    tx: &mut T,
    numbers: &[i32],
    today: NaiveDate,
) -> Result<HashMap<i32, Week>, StoreError> {
    let mut weeks = HashMap::new();
    for &number in numbers {
        if weeks.contains_key(&number) {
            continue;
        }
        let week = tx.get_or_create_week(number, today).await?;
        debug!(number, week_id = %week.id, "week resolved");
        weeks.insert(number, week);
    }
    Ok(weeks)
}
