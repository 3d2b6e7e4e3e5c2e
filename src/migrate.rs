/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Idempotent schema applier

use log::{info, warn};
use sqlx::{Row, SqlitePool};

use crate::db::DbError;

/// Existence check that makes re-application of a unit a no-op.
pub enum Guard {
    TableAbsent(&'static str),
    ColumnAbsent {
        table: &'static str,
        column: &'static str,
    },
    IndexAbsent(&'static str),
}

/// One named, idempotent schema change. The DDL text is a fixed constant;
/// nothing derived from a request ever reaches it.
pub struct Unit {
    pub name: &'static str,
    pub guard: Guard,
    pub ddl: &'static str,
}

#[derive(Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "kebab-case", tag = "outcome", content = "detail")]
pub enum Outcome {
    Applied,
    AlreadyApplied,
    Failed(String),
}

impl Outcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

#[derive(Debug, serde::Serialize)]
pub struct UnitReport {
    pub unit: &'static str,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Applies each unit in order and classifies the result. A failed unit does
/// not abort the remaining units; later units that depended on it will report
/// their own failure.
pub async fn apply(pool: &SqlitePool, units: &[Unit]) -> Vec<UnitReport> {
    let mut reports = Vec::with_capacity(units.len());
    for unit in units {
        let outcome = apply_unit(pool, unit).await;
        match &outcome {
            Outcome::Applied => info!("Applied {}", unit.name),
            Outcome::AlreadyApplied => info!("Already applied: {}", unit.name),
            Outcome::Failed(detail) => warn!("Failed {}: {}", unit.name, detail),
        }
        reports.push(UnitReport {
            unit: unit.name,
            outcome,
        });
    }
    reports
}

/// Reports for an invocation whose store could not be opened at all.
pub fn store_unavailable(units: &[Unit], err: &DbError) -> Vec<UnitReport> {
    units
        .iter()
        .map(|unit| UnitReport {
            unit: unit.name,
            outcome: Outcome::Failed(format!("store unavailable: {}", err)),
        })
        .collect()
}

async fn apply_unit(pool: &SqlitePool, unit: &Unit) -> Outcome {
    match object_exists(pool, &unit.guard).await {
        Ok(true) => Outcome::AlreadyApplied,
        Ok(false) => match sqlx::query(unit.ddl).execute(pool).await {
            Ok(_) => Outcome::Applied,
            // Two invocations can race past the guard; the store then reports
            // the object as pre-existing, which is not a failure.
            Err(err) if is_already_exists(&err) => Outcome::AlreadyApplied,
            Err(err) => Outcome::Failed(err.to_string()),
        },
        Err(err) => Outcome::Failed(err.to_string()),
    }
}

async fn object_exists(pool: &SqlitePool, guard: &Guard) -> Result<bool, sqlx::Error> {
    match guard {
        Guard::TableAbsent(table) => {
            Ok(sqlx::query("select 1 from sqlite_master where type = 'table' and name = ?")
                .bind(*table)
                .fetch_optional(pool)
                .await?
                .is_some())
        }
        Guard::IndexAbsent(index) => {
            Ok(sqlx::query("select 1 from sqlite_master where type = 'index' and name = ?")
                .bind(*index)
                .fetch_optional(pool)
                .await?
                .is_some())
        }
        Guard::ColumnAbsent { table, column } => {
            // pragma arguments cannot be bound; the table name is a constant
            // from the catalogue.
            let rows = sqlx::query(&format!("pragma table_info('{}')", table))
                .fetch_all(pool)
                .await?;
            for row in rows {
                if row.try_get::<String, _>("name")? == *column {
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
}

fn is_already_exists(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(err) => {
            let message = err.message();
            message.contains("already exists") || message.contains("duplicate column name")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, migrations};

    async fn scratch_store(dir: &tempfile::TempDir, name: &str) -> SqlitePool {
        db::open(dir.path().to_str().unwrap(), name).await.unwrap()
    }

    fn outcomes(reports: &[UnitReport]) -> Vec<&Outcome> {
        reports.iter().map(|r| &r.outcome).collect()
    }

    #[async_std::test]
    async fn applying_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let pool = scratch_store(&dir, "logs").await;
        let set = migrations::find("logs").unwrap();

        let first = apply(&pool, set.units).await;
        assert!(first.iter().all(|r| r.outcome == Outcome::Applied));

        let second = apply(&pool, set.units).await;
        assert!(second.iter().all(|r| r.outcome == Outcome::AlreadyApplied));
        pool.close().await;
    }

    #[async_std::test]
    async fn webhook_log_has_expected_columns() {
        let dir = tempfile::tempdir().unwrap();
        let pool = scratch_store(&dir, "logs").await;
        let set = migrations::find("logs").unwrap();
        apply(&pool, set.units).await;

        let rows = sqlx::query("pragma table_info('webhook_log')")
            .fetch_all(&pool)
            .await
            .unwrap();
        let columns: Vec<String> = rows
            .iter()
            .map(|row| row.try_get("name").unwrap())
            .collect();
        assert_eq!(
            columns,
            vec![
                "id",
                "source",
                "event_type",
                "payload",
                "processed",
                "processed_at",
                "error",
                "received_at"
            ]
        );
        pool.close().await;
    }

    #[async_std::test]
    async fn add_column_applies_then_reports_already_applied() {
        let dir = tempfile::tempdir().unwrap();
        let pool = scratch_store(&dir, "users").await;
        let set = migrations::find("users").unwrap();
        apply(&pool, set.units).await;

        let unit = set
            .units
            .iter()
            .find(|u| u.name == "add_users_vip_server_id")
            .unwrap();
        let reports = apply(&pool, std::slice::from_ref(unit)).await;
        assert_eq!(outcomes(&reports), vec![&Outcome::AlreadyApplied]);
        pool.close().await;
    }

    #[async_std::test]
    async fn duplicate_error_reclassified_when_guard_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let pool = scratch_store(&dir, "users").await;
        sqlx::query("create table users (id integer primary key, status text)")
            .execute(&pool)
            .await
            .unwrap();

        // Guard names a column that is absent, but the DDL collides with an
        // existing one, as it would if a concurrent invocation won the race.
        let unit = Unit {
            name: "add_users_status",
            guard: Guard::ColumnAbsent {
                table: "users",
                column: "missing",
            },
            ddl: "alter table users add column status text",
        };
        let reports = apply(&pool, std::slice::from_ref(&unit)).await;
        assert_eq!(outcomes(&reports), vec![&Outcome::AlreadyApplied]);
        pool.close().await;
    }

    #[async_std::test]
    async fn failed_unit_does_not_abort_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let pool = scratch_store(&dir, "users").await;
        let units = [
            Unit {
                name: "broken",
                guard: Guard::TableAbsent("nope"),
                ddl: "create table nope (id integer primary key references",
            },
            Unit {
                name: "create_ok",
                guard: Guard::TableAbsent("ok"),
                ddl: "create table ok (id integer primary key)",
            },
        ];
        let reports = apply(&pool, &units).await;
        assert!(reports[0].outcome.is_failed());
        assert_eq!(reports[1].outcome, Outcome::Applied);
        pool.close().await;
    }

    #[async_std::test]
    async fn unavailable_store_fails_every_unit() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the data directory should be.
        let blocker = dir.path().join("data");
        std::fs::write(&blocker, b"").unwrap();

        let set = migrations::find("logs").unwrap();
        let err = db::open(blocker.to_str().unwrap(), set.database)
            .await
            .unwrap_err();
        let reports = store_unavailable(set.units, &err);
        assert_eq!(reports.len(), set.units.len());
        assert!(reports.iter().all(|r| r.outcome.is_failed()));
    }

    #[test]
    fn report_serializes_to_outcome_and_detail() {
        let report = UnitReport {
            unit: "create_webhook_log",
            outcome: Outcome::Failed("disk I/O error".to_owned()),
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["unit"], "create_webhook_log");
        assert_eq!(value["outcome"], "failed");
        assert_eq!(value["detail"], "disk I/O error");

        let applied = serde_json::to_value(&UnitReport {
            unit: "create_webhook_log",
            outcome: Outcome::AlreadyApplied,
        })
        .unwrap();
        assert_eq!(applied["outcome"], "already-applied");
    }
}
