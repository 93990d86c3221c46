//! Read-only relational lookup for regional income.
//!
//! The store is a SQLite file with a small fixed schema:
//!
//! ```sql
//! municipalities(municipality_id INTEGER, name TEXT, state TEXT)
//! municipality_status(municipality_id INTEGER, income REAL)
//! ```
//!
//! `sqlx` is async; the rest of the pipeline is synchronous batch code, so
//! the store owns a current-thread runtime and exposes blocking methods.
//! The runtime never leaks past this module.

use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::path::Path;
use tracing::debug;

/// One municipality row from the lookup database.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct MunicipalityRecord {
    pub municipality_id: i64,
    pub name: String,
    pub state: String,
}

/// Average income of one state, aggregated over its municipalities.
#[derive(Debug, Clone, PartialEq)]
pub struct StateIncome {
    pub state: String,
    pub average_income: f64,
}

#[derive(sqlx::FromRow)]
struct StateIncomeRow {
    state: String,
    average_income: Option<f64>,
}

/// Read-only handle to the regional income database.
pub struct RegionalIncomeStore {
    pool: SqlitePool,
    runtime: tokio::runtime::Runtime,
}

impl RegionalIncomeStore {
    /// Open the database file read-only.
    pub fn open(path: &Path) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;

        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .immutable(true);
        let pool = runtime.block_on(
            SqlitePoolOptions::new()
                .max_connections(1)
                .connect_with(options),
        )?;

        debug!("Opened regional income store at {}", path.display());
        Ok(Self { pool, runtime })
    }

    /// All municipalities with exactly the given name.
    pub fn municipalities_named(&self, name: &str) -> Result<Vec<MunicipalityRecord>> {
        let records = self.runtime.block_on(
            sqlx::query_as::<_, MunicipalityRecord>(
                "SELECT municipality_id, name, state FROM municipalities WHERE name = ?",
            )
            .bind(name)
            .fetch_all(&self.pool),
        )?;
        Ok(records)
    }

    /// Average income per state, restricted to the given states and
    /// grouped by state. States with no income data are omitted.
    pub fn average_income_by_state(&self, states: &[String]) -> Result<Vec<StateIncome>> {
        if states.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            "SELECT m.state AS state, AVG(s.income) AS average_income \
             FROM municipalities m \
             INNER JOIN municipality_status s ON m.municipality_id = s.municipality_id \
             WHERE m.state IN (",
        );
        let mut separated = builder.separated(", ");
        for state in states {
            separated.push_bind(state.clone());
        }
        separated.push_unseparated(") GROUP BY m.state ORDER BY m.state");

        let rows: Vec<StateIncomeRow> = self
            .runtime
            .block_on(builder.build_query_as().fetch_all(&self.pool))?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                row.average_income.map(|average_income| StateIncome {
                    state: row.state,
                    average_income,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a small fixture database on disk.
    fn create_fixture(path: &Path) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();

        runtime.block_on(async {
            let options = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true);
            let pool = SqlitePool::connect_with(options).await.unwrap();

            sqlx::query(
                "CREATE TABLE municipalities (
                    municipality_id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    state TEXT NOT NULL
                )",
            )
            .execute(&pool)
            .await
            .unwrap();
            sqlx::query(
                "CREATE TABLE municipality_status (
                    municipality_id INTEGER PRIMARY KEY,
                    income REAL NOT NULL
                )",
            )
            .execute(&pool)
            .await
            .unwrap();

            let municipalities = [
                (1i64, "Springfield", "SP"),
                (2, "Rivertown", "SP"),
                (3, "Lakeside", "RJ"),
                (4, "Hillcrest", "MG"),
            ];
            for (id, name, state) in municipalities {
                sqlx::query("INSERT INTO municipalities VALUES (?, ?, ?)")
                    .bind(id)
                    .bind(name)
                    .bind(state)
                    .execute(&pool)
                    .await
                    .unwrap();
            }
            let incomes = [(1i64, 2000.0f64), (2, 3000.0), (3, 1500.0)];
            for (id, income) in incomes {
                sqlx::query("INSERT INTO municipality_status VALUES (?, ?)")
                    .bind(id)
                    .bind(income)
                    .execute(&pool)
                    .await
                    .unwrap();
            }

            pool.close().await;
        });
    }

    #[test]
    fn test_average_income_by_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("income.db");
        create_fixture(&path);

        let store = RegionalIncomeStore::open(&path).unwrap();
        let states = vec!["SP".to_string(), "RJ".to_string(), "MG".to_string()];
        let incomes = store.average_income_by_state(&states).unwrap();

        // MG has no income data, so only two states come back
        assert_eq!(
            incomes,
            vec![
                StateIncome {
                    state: "RJ".to_string(),
                    average_income: 1500.0,
                },
                StateIncome {
                    state: "SP".to_string(),
                    average_income: 2500.0,
                },
            ]
        );
    }

    #[test]
    fn test_average_income_empty_state_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("income.db");
        create_fixture(&path);

        let store = RegionalIncomeStore::open(&path).unwrap();
        assert!(store.average_income_by_state(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_municipalities_named() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("income.db");
        create_fixture(&path);

        let store = RegionalIncomeStore::open(&path).unwrap();
        let records = store.municipalities_named("Springfield").unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].state, "SP");
        assert!(store.municipalities_named("Nowhere").unwrap().is_empty());
    }
}
