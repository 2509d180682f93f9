use rust_decimal::Decimal;

use crate::error::ImportError;
use crate::models::Activity;
use crate::store::ImportTx;

/// Name given to an activity synthesized from a raw score, e.g. `Nota 1.5`.
pub fn activity_name(points: Decimal) -> String {
    format!("Nota {}", points.normalize())
}

/// Returns the single activity worth exactly `score` points, creating it on
/// first sight. Summing quantity x points over these reproduces the sheet.
pub async fn activity_for_score<T: ImportTx>(
    tx: &mut T,
    score: Decimal,
) -> Result<Activity, ImportError> {
    if score.is_zero() {
        return Err(ImportError::InvalidScore(score));
    }
    let points = score.normalize();
    let name = activity_name(points);

    let mut activity = tx.get_or_create_activity(points, &name).await?;
    if activity.name.trim().is_empty() {
        tx.set_activity_name(activity.id, &name).await?;
        activity.name = name;
    }
    Ok(activity)
}
