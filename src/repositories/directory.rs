use std::future::Future;

use deadpool_postgres::Pool;
use tokio_postgres::Row;

use crate::{
    error::{AppError, Result},
    models::user::DirectoryUser,
};

/// Read/upsert contract toward the hosted user directory.
///
/// The core only ever issues point lookups and single-predicate scans; any
/// relational composition happens in the caller as sequential independent
/// calls. Implemented by [`PgDirectory`] in production and by in-memory
/// fakes in tests.
pub trait Directory {
    /// Point fetch by unique email.
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<DirectoryUser>>> + Send;

    /// Point fetch by unique referral code.
    fn find_by_referral_code(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<Option<DirectoryUser>>> + Send;

    /// All users whose referral parent is in `codes`, newest first.
    fn find_all_referred_by(
        &self,
        codes: &[String],
    ) -> impl Future<Output = Result<Vec<DirectoryUser>>> + Send;

    /// Inserts a user or overwrites the name of an existing one by email.
    fn upsert_user(
        &self,
        email: &str,
        name: Option<&str>,
    ) -> impl Future<Output = Result<DirectoryUser>> + Send;

    /// Up to `limit` known emails, for connectivity diagnostics.
    fn sample_emails(&self, limit: i64) -> impl Future<Output = Result<Vec<String>>> + Send;
}

/// A helper function to map a `tokio_postgres::Row` to a `DirectoryUser`.
fn row_to_user(row: &Row) -> Result<DirectoryUser> {
    Ok(DirectoryUser {
        id: row
            .try_get("id")
            .map_err(|_| AppError::MissingData("id".to_string()))?,
        name: row
            .try_get("name")
            .map_err(|_| AppError::MissingData("name".to_string()))?,
        email: row
            .try_get("email")
            .map_err(|_| AppError::MissingData("email".to_string()))?,
        created_at: row
            .try_get("created_at")
            .map_err(|_| AppError::MissingData("created_at".to_string()))?,
        referral_code: row
            .try_get("referral_code")
            .map_err(|_| AppError::MissingData("referral_code".to_string()))?,
        referred_by: row
            .try_get("referred_by")
            .map_err(|_| AppError::MissingData("referred_by".to_string()))?,
    })
}

const USER_COLUMNS: &str = "id, name, email, created_at, referral_code, referred_by";

/// The production directory gateway, backed by the hosted Postgres store.
#[derive(Clone)]
pub struct PgDirectory {
    pool: Pool,
}

impl PgDirectory {
    /// Creates a gateway over the given connection pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

impl Directory for PgDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<DirectoryUser>> {
        let client = self.pool.get().await?;
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = client.query_opt(sql.as_str(), &[&email]).await?;
        row.as_ref().map(row_to_user).transpose()
    }

    async fn find_by_referral_code(&self, code: &str) -> Result<Option<DirectoryUser>> {
        let client = self.pool.get().await?;
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE referral_code = $1");
        let row = client.query_opt(sql.as_str(), &[&code]).await?;
        row.as_ref().map(row_to_user).transpose()
    }

    async fn find_all_referred_by(&self, codes: &[String]) -> Result<Vec<DirectoryUser>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        let client = self.pool.get().await?;
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE referred_by = ANY($1) \
             ORDER BY created_at DESC"
        );
        let rows = client.query(sql.as_str(), &[&codes]).await?;
        rows.iter().map(row_to_user).collect()
    }

    async fn upsert_user(&self, email: &str, name: Option<&str>) -> Result<DirectoryUser> {
        let client = self.pool.get().await?;
        let sql = format!(
            "INSERT INTO users (email, name) VALUES ($1, $2) \
             ON CONFLICT (email) \
             DO UPDATE SET name = COALESCE(EXCLUDED.name, users.name) \
             RETURNING {USER_COLUMNS}"
        );
        let row = client.query_one(sql.as_str(), &[&email, &name]).await?;
        row_to_user(&row)
    }

    async fn sample_emails(&self, limit: i64) -> Result<Vec<String>> {
        let client = self.pool.get().await?;
        let rows = client
            .query("SELECT email FROM users LIMIT $1", &[&limit])
            .await?;
        rows.iter()
            .map(|row| {
                row.try_get("email")
                    .map_err(|_| AppError::MissingData("email".to_string()))
            })
            .collect()
    }
}
