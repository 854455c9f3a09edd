use std::str::FromStr;

use anyhow::Context;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool};

use crate::error::LedgerError;
use crate::models::{NewScholarship, ScholarshipRecord};

const CREATE_TABLE: &str = r#"
    CREATE TABLE scholarship (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        student_id TEXT,
        name TEXT,
        country TEXT,
        department TEXT,
        grade TEXT,
        scholarship_type TEXT,
        can_renew TEXT,
        m1 REAL DEFAULT 0, m2 REAL DEFAULT 0, m3 REAL DEFAULT 0, m4 REAL DEFAULT 0,
        m5 REAL DEFAULT 0, m6 REAL DEFAULT 0, m7 REAL DEFAULT 0, m8 REAL DEFAULT 0,
        m9 REAL DEFAULT 0, m10 REAL DEFAULT 0, m11 REAL DEFAULT 0, m12 REAL DEFAULT 0,
        total_amount REAL DEFAULT 0,
        email TEXT
    )
"#;

const INSERT_RECORD: &str = r#"
    INSERT INTO scholarship
    (student_id, name, country, department, grade, scholarship_type, can_renew,
     m1, m2, m3, m4, m5, m6, m7, m8, m9, m10, m11, m12, total_amount, email)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

const SELECT_COLUMNS: &str = "SELECT id, student_id, name, country, department, grade, \
     scholarship_type, can_renew, m1, m2, m3, m4, m5, m6, m7, m8, m9, m10, m11, m12, \
     total_amount, email FROM scholarship";

pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("invalid database url {database_url}"))?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .context("failed to open scholarship store")?;
    Ok(pool)
}

/// Drops and recreates the `scholarship` table. All prior rows are lost.
pub async fn init_db(pool: &SqlitePool) -> anyhow::Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DROP TABLE IF EXISTS scholarship")
        .execute(&mut *tx)
        .await?;
    sqlx::query(CREATE_TABLE).execute(&mut *tx).await?;
    tx.commit().await?;
    Ok(())
}

fn insert_query(record: &NewScholarship) -> Query<'_, Sqlite, SqliteArguments<'_>> {
    let mut query = sqlx::query(INSERT_RECORD)
        .bind(&record.student_id)
        .bind(&record.name)
        .bind(&record.country)
        .bind(&record.department)
        .bind(&record.grade)
        .bind(&record.scholarship_type)
        .bind(record.can_renew.label());

    for amount in record.months {
        query = query.bind(amount);
    }

    query
        .bind(record.total_amount.unwrap_or_default())
        .bind(&record.email)
}

/// Appends one sheet's batch in a single transaction.
pub async fn insert_batch(pool: &SqlitePool, records: &[NewScholarship]) -> anyhow::Result<usize> {
    let mut tx = pool.begin().await?;
    for record in records {
        insert_query(record).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    Ok(records.len())
}

/// Manual single-record entry; student id and name must be non-blank.
pub async fn append_record(pool: &SqlitePool, record: &NewScholarship) -> anyhow::Result<i64> {
    if record.student_id.trim().is_empty() {
        return Err(LedgerError::MissingRequiredField("student_id").into());
    }
    if record.name.as_deref().map_or(true, |name| name.trim().is_empty()) {
        return Err(LedgerError::MissingRequiredField("name").into());
    }

    let result = insert_query(record).execute(pool).await?;
    Ok(result.last_insert_rowid())
}

fn record_from_row(row: &SqliteRow) -> anyhow::Result<ScholarshipRecord> {
    let mut months = [0.0; 12];
    for (index, month) in months.iter_mut().enumerate() {
        let column = format!("m{}", index + 1);
        *month = row
            .try_get::<Option<f64>, _>(column.as_str())?
            .unwrap_or_default();
    }

    Ok(ScholarshipRecord {
        id: row.try_get("id")?,
        student_id: row
            .try_get::<Option<String>, _>("student_id")?
            .unwrap_or_default(),
        name: row.try_get("name")?,
        country: row.try_get("country")?,
        department: row.try_get("department")?,
        grade: row.try_get("grade")?,
        scholarship_type: row.try_get("scholarship_type")?,
        can_renew: row.try_get("can_renew")?,
        months,
        total_amount: row
            .try_get::<Option<f64>, _>("total_amount")?
            .unwrap_or_default(),
        email: row.try_get("email")?,
    })
}

/// Exact student id match, or substring match on name or email.
pub async fn search(pool: &SqlitePool, term: &str) -> anyhow::Result<Vec<ScholarshipRecord>> {
    let pattern = format!("%{term}%");
    let query = format!(
        "{SELECT_COLUMNS} WHERE student_id = ? OR name LIKE ? OR email LIKE ? ORDER BY id"
    );
    let rows = sqlx::query(&query)
        .bind(term)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(pool)
        .await?;

    rows.iter().map(record_from_row).collect()
}

pub async fn fetch_all(pool: &SqlitePool) -> anyhow::Result<Vec<ScholarshipRecord>> {
    let query = format!("{SELECT_COLUMNS} ORDER BY id");
    let rows = sqlx::query(&query).fetch_all(pool).await?;
    rows.iter().map(record_from_row).collect()
}

pub async fn delete_by_student_id(pool: &SqlitePool, student_id: &str) -> anyhow::Result<u64> {
    let result = sqlx::query("DELETE FROM scholarship WHERE student_id = ?")
        .bind(student_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn count(pool: &SqlitePool) -> anyhow::Result<i64> {
    let total: i64 = sqlx::query("SELECT COUNT(*) AS total FROM scholarship")
        .fetch_one(pool)
        .await?
        .get("total");
    Ok(total)
}
