use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::models::{Account, Resident};
use crate::storage::sqlite::connection::DbConnection;
use crate::storage::traits::{AccountStore, PendingChange, UniqueViolation};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Repository for account operations.
///
/// Reads go straight to the pool and see committed data only. Writes are
/// queued and applied inside a single SQLite transaction on `commit`; if the
/// future is dropped before that, the transaction rolls back.
pub struct AccountRepository {
    db: DbConnection,
    pending: Mutex<Vec<PendingChange>>,
}

impl AccountRepository {
    pub fn new(db: DbConnection) -> Self {
        Self {
            db,
            pending: Mutex::new(Vec::new()),
        }
    }

    async fn load_residents(&self, account_id: i64) -> Result<Vec<Resident>> {
        let rows = sqlx::query(
            r#"
            SELECT id, account_id, last_name, first_name, middle_name, birth_date, is_main_resident
            FROM residents
            WHERE account_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(account_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(resident_from_row).collect()
    }

    async fn load_single(&self, row: Option<SqliteRow>) -> Result<Option<Account>> {
        match row {
            Some(r) => {
                let mut account = account_from_row(&r)?;
                account.residents = self.load_residents(account.id).await?;
                Ok(Some(account))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl AccountStore for AccountRepository {
    async fn get_by_id(&self, id: i64) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT id, account_number, start_date, end_date, address, area
            FROM accounts
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        self.load_single(row).await
    }

    async fn get_by_number(&self, account_number: &str) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT id, account_number, start_date, end_date, address, area
            FROM accounts
            WHERE account_number = ?
            "#,
        )
        .bind(account_number)
        .fetch_optional(self.db.pool())
        .await?;

        self.load_single(row).await
    }

    async fn get_all(&self) -> Result<Vec<Account>> {
        let account_rows = sqlx::query(
            r#"
            SELECT id, account_number, start_date, end_date, address, area
            FROM accounts
            ORDER BY id ASC
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        let resident_rows = sqlx::query(
            r#"
            SELECT id, account_id, last_name, first_name, middle_name, birth_date, is_main_resident
            FROM residents
            ORDER BY id ASC
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        let mut residents_by_account: HashMap<i64, Vec<Resident>> = HashMap::new();
        for row in &resident_rows {
            let resident = resident_from_row(row)?;
            residents_by_account
                .entry(resident.account_id)
                .or_default()
                .push(resident);
        }

        account_rows
            .iter()
            .map(|row| {
                let mut account = account_from_row(row)?;
                account.residents = residents_by_account.remove(&account.id).unwrap_or_default();
                Ok(account)
            })
            .collect()
    }

    async fn insert(&self, account: Account) -> Result<()> {
        self.pending.lock().await.push(PendingChange::Insert(account));
        Ok(())
    }

    async fn update(&self, account: Account) -> Result<()> {
        self.pending.lock().await.push(PendingChange::Update(account));
        Ok(())
    }

    async fn delete(&self, account: Account) -> Result<()> {
        self.pending.lock().await.push(PendingChange::Delete(account.id));
        Ok(())
    }

    async fn commit(&self) -> Result<bool> {
        let changes: Vec<PendingChange> = self.pending.lock().await.drain(..).collect();
        if changes.is_empty() {
            return Ok(false);
        }

        let mut tx = self.db.pool().begin().await?;
        let mut affected = 0u64;
        for change in changes {
            affected += match change {
                PendingChange::Insert(account) => insert_account(&mut tx, &account).await?,
                PendingChange::Update(account) => update_account(&mut tx, &account).await?,
                PendingChange::Delete(id) => delete_account(&mut tx, id).await?,
            };
        }
        tx.commit().await?;

        debug!(rows = affected, "Committed account changes");
        Ok(affected > 0)
    }

    async fn exists_by_number(&self, account_number: &str, exclude_id: Option<i64>) -> Result<bool> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM accounts
                WHERE account_number = ? AND (? IS NULL OR id != ?)
            ) AS found
            "#,
        )
        .bind(account_number)
        .bind(exclude_id)
        .bind(exclude_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(row.try_get("found")?)
    }

    async fn max_numeric_account_number(&self) -> Result<i64> {
        // Only ten digit strings count; anything else is skipped, not an error
        let row = sqlx::query(
            r#"
            SELECT MAX(CAST(account_number AS INTEGER)) AS max_number
            FROM accounts
            WHERE length(account_number) = 10
              AND account_number NOT GLOB '*[^0-9]*'
            "#,
        )
        .fetch_one(self.db.pool())
        .await?;

        let max: Option<i64> = row.try_get("max_number")?;
        Ok(max.unwrap_or(0))
    }
}

async fn insert_account(conn: &mut SqliteConnection, account: &Account) -> Result<u64> {
    let result = sqlx::query(
        r#"
        INSERT INTO accounts (account_number, start_date, end_date, address, area)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&account.account_number)
    .bind(format_date(account.start_date))
    .bind(account.end_date.map(format_date))
    .bind(&account.address)
    .bind(account.area)
    .execute(&mut *conn)
    .await
    .map_err(|e| map_write_error(e, &account.account_number))?;

    let account_id = result.last_insert_rowid();
    let residents = insert_residents(conn, account_id, &account.residents).await?;
    Ok(result.rows_affected() + residents)
}

async fn update_account(conn: &mut SqliteConnection, account: &Account) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE accounts
        SET account_number = ?, start_date = ?, end_date = ?, address = ?, area = ?
        WHERE id = ?
        "#,
    )
    .bind(&account.account_number)
    .bind(format_date(account.start_date))
    .bind(account.end_date.map(format_date))
    .bind(&account.address)
    .bind(account.area)
    .bind(account.id)
    .execute(&mut *conn)
    .await
    .map_err(|e| map_write_error(e, &account.account_number))?;

    if result.rows_affected() == 0 {
        return Ok(0);
    }

    // The resident set is replaced wholesale
    sqlx::query("DELETE FROM residents WHERE account_id = ?")
        .bind(account.id)
        .execute(&mut *conn)
        .await?;
    let residents = insert_residents(conn, account.id, &account.residents).await?;

    Ok(result.rows_affected() + residents)
}

async fn delete_account(conn: &mut SqliteConnection, account_id: i64) -> Result<u64> {
    let residents = sqlx::query("DELETE FROM residents WHERE account_id = ?")
        .bind(account_id)
        .execute(&mut *conn)
        .await?;

    let accounts = sqlx::query("DELETE FROM accounts WHERE id = ?")
        .bind(account_id)
        .execute(&mut *conn)
        .await?;

    Ok(residents.rows_affected() + accounts.rows_affected())
}

async fn insert_residents(
    conn: &mut SqliteConnection,
    account_id: i64,
    residents: &[Resident],
) -> Result<u64> {
    let mut affected = 0;
    for resident in residents {
        let result = sqlx::query(
            r#"
            INSERT INTO residents (account_id, last_name, first_name, middle_name, birth_date, is_main_resident)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(account_id)
        .bind(&resident.last_name)
        .bind(&resident.first_name)
        .bind(&resident.middle_name)
        .bind(format_date(resident.birth_date))
        .bind(resident.is_main_resident)
        .execute(&mut *conn)
        .await?;
        affected += result.rows_affected();
    }
    Ok(affected)
}

fn map_write_error(err: sqlx::Error, account_number: &str) -> anyhow::Error {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            UniqueViolation(account_number.to_string()).into()
        }
        _ => err.into(),
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .with_context(|| format!("Malformed date in database: {}", value))
}

fn account_from_row(row: &SqliteRow) -> Result<Account> {
    let start_date: String = row.try_get("start_date")?;
    let end_date: Option<String> = row.try_get("end_date")?;

    Ok(Account {
        id: row.try_get("id")?,
        account_number: row.try_get("account_number")?,
        start_date: parse_date(&start_date)?,
        end_date: end_date.as_deref().map(parse_date).transpose()?,
        address: row.try_get("address")?,
        area: row.try_get("area")?,
        residents: Vec::new(),
    })
}

fn resident_from_row(row: &SqliteRow) -> Result<Resident> {
    let birth_date: String = row.try_get("birth_date")?;

    Ok(Resident {
        id: row.try_get("id")?,
        account_id: row.try_get("account_id")?,
        last_name: row.try_get("last_name")?,
        first_name: row.try_get("first_name")?,
        middle_name: row.try_get("middle_name")?,
        birth_date: parse_date(&birth_date)?,
        is_main_resident: row.try_get("is_main_resident")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::traits::Connection;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn account(number: &str, residents: &[(&str, &str)]) -> Account {
        Account {
            id: 0,
            account_number: number.to_string(),
            start_date: date(2022, 3, 1),
            end_date: Some(date(2023, 3, 1)),
            address: "14 Harbour Lane".to_string(),
            area: 61.25,
            residents: residents
                .iter()
                .map(|(last, first)| Resident {
                    id: 0,
                    account_id: 0,
                    last_name: last.to_string(),
                    first_name: first.to_string(),
                    middle_name: String::new(),
                    birth_date: date(1979, 11, 30),
                    is_main_resident: false,
                })
                .collect(),
        }
    }

    async fn setup_test() -> DbConnection {
        DbConnection::init_test()
            .await
            .expect("Failed to create test database")
    }

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let db = setup_test().await;
        let repo = db.create_account_repository();

        repo.insert(account("0000000010", &[("Petrov", "Ivan"), ("Petrova", "Anna")]))
            .await
            .unwrap();
        assert!(repo.commit().await.unwrap());

        let stored = repo.get_by_number("0000000010").await.unwrap().unwrap();
        assert!(stored.id > 0);
        assert_eq!(stored.start_date, date(2022, 3, 1));
        assert_eq!(stored.end_date, Some(date(2023, 3, 1)));
        assert_eq!(stored.area, 61.25);
        assert_eq!(stored.residents.len(), 2);
        assert!(stored.residents.iter().all(|r| r.account_id == stored.id));

        let by_id = repo.get_by_id(stored.id).await.unwrap().unwrap();
        assert_eq!(by_id, stored);
    }

    #[tokio::test]
    async fn test_get_all_groups_residents() {
        let db = setup_test().await;
        let repo = db.create_account_repository();
        repo.insert(account("0000000001", &[("Doe", "Jane")])).await.unwrap();
        repo.insert(account("0000000002", &[])).await.unwrap();
        repo.commit().await.unwrap();

        let all = repo.get_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].residents.len(), 1);
        assert!(all[1].residents.is_empty());
    }

    #[tokio::test]
    async fn test_unique_index_rejects_duplicate_number() {
        let db = setup_test().await;
        let repo = db.create_account_repository();
        repo.insert(account("0000000001", &[])).await.unwrap();
        repo.commit().await.unwrap();

        let repo = db.create_account_repository();
        repo.insert(account("0000000002", &[])).await.unwrap();
        repo.insert(account("0000000001", &[])).await.unwrap();
        let err = repo.commit().await.unwrap_err();

        assert_eq!(
            err.downcast_ref::<UniqueViolation>(),
            Some(&UniqueViolation("0000000001".to_string()))
        );
        // The first insert of the failed commit was rolled back as well
        assert_eq!(repo.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_replaces_residents() {
        let db = setup_test().await;
        let repo = db.create_account_repository();
        repo.insert(account("0000000001", &[("Doe", "Jane"), ("Doe", "John")]))
            .await
            .unwrap();
        repo.commit().await.unwrap();

        let mut stored = repo.get_by_number("0000000001").await.unwrap().unwrap();
        stored.address = "2 New Road".to_string();
        stored.residents = account("", &[("Roe", "Richard")]).residents;
        repo.update(stored.clone()).await.unwrap();
        assert!(repo.commit().await.unwrap());

        let updated = repo.get_by_id(stored.id).await.unwrap().unwrap();
        assert_eq!(updated.address, "2 New Road");
        assert_eq!(updated.residents.len(), 1);
        assert_eq!(updated.residents[0].last_name, "Roe");
    }

    #[tokio::test]
    async fn test_update_of_missing_account_affects_nothing() {
        let db = setup_test().await;
        let repo = db.create_account_repository();
        let mut ghost = account("0000000001", &[("Doe", "Jane")]);
        ghost.id = 999;

        repo.update(ghost).await.unwrap();
        assert!(!repo.commit().await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_cascades_residents() {
        let db = setup_test().await;
        let repo = db.create_account_repository();
        repo.insert(account("0000000001", &[("Doe", "Jane")])).await.unwrap();
        repo.commit().await.unwrap();

        let stored = repo.get_by_number("0000000001").await.unwrap().unwrap();
        repo.delete(stored).await.unwrap();
        assert!(repo.commit().await.unwrap());

        let remaining: i64 = sqlx::query("SELECT COUNT(*) AS n FROM residents")
            .fetch_one(db.pool())
            .await
            .unwrap()
            .get("n");
        assert_eq!(remaining, 0);
        assert!(repo.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_exists_by_number() {
        let db = setup_test().await;
        let repo = db.create_account_repository();
        repo.insert(account("0000000001", &[])).await.unwrap();
        repo.commit().await.unwrap();
        let id = repo.get_by_number("0000000001").await.unwrap().unwrap().id;

        assert!(repo.exists_by_number("0000000001", None).await.unwrap());
        assert!(!repo.exists_by_number("0000000001", Some(id)).await.unwrap());
        assert!(repo.exists_by_number("0000000001", Some(id + 1)).await.unwrap());
        assert!(!repo.exists_by_number("0000000002", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_max_numeric_account_number() {
        let db = setup_test().await;
        let repo = db.create_account_repository();
        assert_eq!(repo.max_numeric_account_number().await.unwrap(), 0);

        repo.insert(account("0000000042", &[])).await.unwrap();
        repo.insert(account("0000000007", &[])).await.unwrap();
        repo.insert(account("12345678X0", &[])).await.unwrap();
        repo.insert(account("99999999999", &[])).await.unwrap();
        repo.commit().await.unwrap();

        assert_eq!(repo.max_numeric_account_number().await.unwrap(), 42);
    }
}
