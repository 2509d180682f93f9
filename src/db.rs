use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Postgres, Row, Transaction};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Activity, Child, NewResult, ScoredResult, Week};
use crate::store::{ImportTx, Store};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub struct PgImportTx {
    tx: Transaction<'static, Postgres>,
}

fn child_from_row(row: &PgRow) -> Result<Child, StoreError> {
    let age: Option<i16> = row.try_get("age")?;
    let age = age
        .map(u8::try_from)
        .transpose()
        .map_err(|_| StoreError::Constraint("stored age out of range".to_string()))?;
    Ok(Child {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        group_label: row.try_get("group_label")?,
        age,
    })
}

fn week_from_row(row: &PgRow) -> Result<Week, StoreError> {
    Ok(Week {
        id: row.try_get("id")?,
        number: row.try_get("number")?,
        starts_on: row.try_get("starts_on")?,
        ends_on: row.try_get("ends_on")?,
    })
}

fn activity_from_row(row: &PgRow) -> Result<Activity, StoreError> {
    Ok(Activity {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        points: row.try_get("points")?,
    })
}

impl Store for PgStore {
    type Tx = PgImportTx;

    async fn begin(&self) -> Result<PgImportTx, StoreError> {
        Ok(PgImportTx {
            tx: self.pool.begin().await?,
        })
    }

    async fn list_children(&self) -> Result<Vec<Child>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, group_label, age FROM weekly_ranking.children ORDER BY name, created_at",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(child_from_row).collect()
    }

    async fn list_scored_results(&self) -> Result<Vec<ScoredResult>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT r.child_id, r.quantity, a.points
            FROM weekly_ranking.results r
            JOIN weekly_ranking.activities a ON a.id = r.activity_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            results.push(ScoredResult {
                child_id: row.try_get("child_id")?,
                quantity: row.try_get("quantity")?,
                points: row.try_get("points")?,
            });
        }
        Ok(results)
    }

    async fn update_child(
        &self,
        name: &str,
        group_label: Option<&str>,
        age: Option<u8>,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE weekly_ranking.children
            SET group_label = COALESCE($2, group_label),
                age = COALESCE($3, age)
            WHERE name = $1
            "#,
        )
        .bind(name)
        .bind(group_label)
        .bind(age.map(i16::from))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

impl ImportTx for PgImportTx {
    async fn get_or_create_child(&mut self, name: &str) -> Result<Child, StoreError> {
        // Names are not unique, so serialize concurrent creators of the same name.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(name)
            .execute(&mut *self.tx)
            .await?;

        let existing = sqlx::query(
            r#"
            SELECT id, name, group_label, age
            FROM weekly_ranking.children
            WHERE name = $1
            ORDER BY created_at, id
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(&mut *self.tx)
        .await?;
        if let Some(row) = existing {
            return child_from_row(&row);
        }

        let row = sqlx::query(
            r#"
            INSERT INTO weekly_ranking.children (id, name)
            VALUES ($1, $2)
            RETURNING id, name, group_label, age
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&mut *self.tx)
        .await?;
        child_from_row(&row)
    }

    async fn get_or_create_week(
        &mut self,
        number: i32,
        default_date: NaiveDate,
    ) -> Result<Week, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO weekly_ranking.weeks (id, number, starts_on, ends_on)
            VALUES ($1, $2, $3, $3)
            ON CONFLICT (number) DO UPDATE
            SET number = EXCLUDED.number
            RETURNING id, number, starts_on, ends_on
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(number)
        .bind(default_date)
        .fetch_one(&mut *self.tx)
        .await?;
        week_from_row(&row)
    }

    async fn get_or_create_activity(
        &mut self,
        points: Decimal,
        name: &str,
    ) -> Result<Activity, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO weekly_ranking.activities AS a (id, name, points)
            VALUES ($1, $2, $3)
            ON CONFLICT (points) DO UPDATE
            SET points = a.points
            RETURNING id, name, points
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(points)
        .fetch_one(&mut *self.tx)
        .await?;
        activity_from_row(&row)
    }

    async fn set_activity_name(&mut self, id: Uuid, name: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE weekly_ranking.activities SET name = $2 WHERE id = $1")
            .bind(id)
            .bind(name)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn delete_results(
        &mut self,
        child_ids: &[Uuid],
        week_ids: &[Uuid],
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM weekly_ranking.results
            WHERE child_id = ANY($1) AND week_id = ANY($2)
            "#,
        )
        .bind(child_ids)
        .bind(week_ids)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert_results(&mut self, results: &[NewResult]) -> Result<u64, StoreError> {
        let ids: Vec<Uuid> = results.iter().map(|_| Uuid::new_v4()).collect();
        let child_ids: Vec<Uuid> = results.iter().map(|r| r.child_id).collect();
        let week_ids: Vec<Uuid> = results.iter().map(|r| r.week_id).collect();
        let activity_ids: Vec<Uuid> = results.iter().map(|r| r.activity_id).collect();
        let quantities: Vec<i32> = results.iter().map(|r| r.quantity).collect();

        let result = sqlx::query(
            r#"
            INSERT INTO weekly_ranking.results (id, child_id, week_id, activity_id, quantity)
            SELECT * FROM UNNEST($1::uuid[], $2::uuid[], $3::uuid[], $4::uuid[], $5::int4[])
            "#,
        )
        .bind(&ids)
        .bind(&child_ids)
        .bind(&week_ids)
        .bind(&activity_ids)
        .bind(&quantities)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
