//! Spreadsheet import: reads a sheet, resolves children and weeks, replaces the
//! results of every (child, week) pair present in the file, all in one
//! transaction.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::activity::activity_for_score;
use crate::cell::parse_decimal;
use crate::columns::{self, WeekColumn};
use crate::error::ImportError;
use crate::models::{Child, ImportSummary, NewResult, Week};
use crate::resolve::{resolve_children, resolve_weeks};
use crate::sheet::Sheet;
use crate::store::{ImportTx, Store};

/// Imports a spreadsheet export. `today` supplies the dates of weeks that
/// do not exist yet. Nothing is persisted unless the whole file imports.
pub async fn import_sheet<S: Store>(
    store: &S,
    bytes: &[u8],
    today: NaiveDate,
) -> Result<ImportSummary, ImportError> {
    let sheet = Sheet::parse(bytes)?;
    if sheet.column_count() < 2 {
        return Err(ImportError::InsufficientColumns {
            found: sheet.column_count(),
        });
    }

    let week_columns = columns::classify(&sheet.headers)?;
    if week_columns.is_empty() {
        return Err(ImportError::NoWeekColumns);
    }
    info!(
        rows = sheet.rows.len(),
        week_columns = week_columns.len(),
        "spreadsheet read"
    );

    let mut tx = store.begin().await?;
    let outcome = write_results(&mut tx, &sheet, &week_columns, today).await;
    match outcome {
        Ok(summary) => {
            tx.commit().await?;
            info!(
                children = summary.children_seen,
                results = summary.results_created,
                "import committed"
            );
            Ok(summary)
        }
        Err(err) => {
            warn!(error = %err, "import failed, rolling back");
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}

async fn write_results<T: ImportTx>(
    tx: &mut T,
    sheet: &Sheet,
    week_columns: &[WeekColumn],
    today: NaiveDate,
) -> Result<ImportSummary, ImportError> {
    let row_names: Vec<Option<String>> = (0..sheet.rows.len()).map(|row| sheet.name(row)).collect();
    let names: Vec<String> = row_names.iter().flatten().cloned().collect();
    let numbers: Vec<i32> = week_columns.iter().map(|col| col.number).collect();

    let children = resolve_children(tx, &names).await?;
    let weeks = resolve_weeks(tx, &numbers, today).await?;

    let child_ids: Vec<Uuid> = children.values().map(|c| c.id).collect();
    let week_ids: Vec<Uuid> = weeks.values().map(|w| w.id).collect();
    if !child_ids.is_empty() && !week_ids.is_empty() {
        let deleted = tx.delete_results(&child_ids, &week_ids).await?;
        debug!(deleted, "stale results removed");
    }

    let staged = stage_results(tx, sheet, &row_names, week_columns, &children, &weeks).await?;
    if !staged.is_empty() {
        tx.insert_results(&staged).await?;
    }

    Ok(ImportSummary {
        children_seen: children.len(),
        weeks_processed: numbers,
        results_created: staged.len(),
    })
}

async fn stage_results<T: ImportTx>(
    tx: &mut T,
    sheet: &Sheet,
    row_names: &[Option<String>],
    week_columns: &[WeekColumn],
    children: &HashMap<String, Child>,
    weeks: &HashMap<i32, Week>,
) -> Result<Vec<NewResult>, ImportError> {
    let mut staged = Vec::new();
    for (row, name) in row_names.iter().enumerate() {
        let Some(child) = name.as_ref().and_then(|name| children.get(name)) else {
            continue;
        };
        for column in week_columns {
            let Some(score) = parse_decimal(&sheet.cell(row, column.index)) else {
                continue;
            };
            if score.is_zero() {
                continue;
            }
            let Some(week) = weeks.get(&column.number) else {
                continue;
            };
            let activity = activity_for_score(tx, score).await?;
            staged.push(NewResult {
                child_id: child.id,
                week_id: week.id,
                activity_id: activity.id,
                quantity: 1,
            });
        }
    }
    Ok(staged)
}
