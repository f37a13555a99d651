//! User repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use fitroom_core::{Role, UserId, UserName};

use super::{RepositoryError, UserStore, conflict_on_unique};
use crate::models::{Credentials, NewUser, PasswordHistory, Preference, User};

const USER_COLUMNS: &str = "id, name, age, gender, country, \
     preference_style, preference_color, preference_size, role, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    name: String,
    age: Option<i32>,
    gender: Option<String>,
    country: Option<String>,
    preference_style: Option<String>,
    preference_color: Option<String>,
    preference_size: Option<String>,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct UserCredentialsRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
    password_history: Vec<String>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let name = UserName::parse(&row.name).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid user name in database: {e}"))
        })?;
        let role = row.role.parse::<Role>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid role in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            name,
            age: row.age,
            gender: row.gender,
            country: row.country,
            preference: Preference {
                style: row.preference_style,
                color: row.preference_color,
                size: row.preference_size,
            },
            role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl UserCredentialsRow {
    fn into_parts(self) -> Result<(User, Credentials), RepositoryError> {
        let user = User::try_from(self.user)?;
        let credentials = Credentials {
            password_hash: self.password_hash,
            history: PasswordHistory::from_stored(self.password_history),
        };
        Ok((user, credentials))
    }
}

/// `PostgreSQL` user store.
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a new user store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn credentials_query(clause: &str) -> String {
        format!(
            "SELECT {USER_COLUMNS}, password_hash, password_history \
             FROM storefront.users WHERE {clause}"
        )
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create_with_cart(&self, new_user: NewUser) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r"
            INSERT INTO storefront.users
                (name, age, gender, country, preference_style, preference_color,
                 preference_size, role, password_hash, password_history)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, ARRAY[$9])
            RETURNING {USER_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(new_user.name.as_str())
            .bind(new_user.age)
            .bind(&new_user.gender)
            .bind(&new_user.country)
            .bind(&new_user.preference.style)
            .bind(&new_user.preference.color)
            .bind(&new_user.preference.size)
            .bind(Role::default().as_str())
            .bind(&new_user.password_hash)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| conflict_on_unique(e, "user name already exists"))?;

        let user = User::try_from(row)?;

        sqlx::query("INSERT INTO storefront.carts (user_id) VALUES ($1)")
            .bind(user.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(user)
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM storefront.users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(User::try_from).transpose()
    }

    async fn get_by_name(&self, name: &UserName) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM storefront.users WHERE name = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(name.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_credentials_by_name(
        &self,
        name: &UserName,
    ) -> Result<Option<(User, Credentials)>, RepositoryError> {
        let sql = Self::credentials_query("name = $1");
        let row = sqlx::query_as::<_, UserCredentialsRow>(&sql)
            .bind(name.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserCredentialsRow::into_parts).transpose()
    }

    async fn find_credentials_by_id(
        &self,
        id: UserId,
    ) -> Result<Option<(User, Credentials)>, RepositoryError> {
        let sql = Self::credentials_query("id = $1");
        let row = sqlx::query_as::<_, UserCredentialsRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserCredentialsRow::into_parts).transpose()
    }

    async fn update_credentials(
        &self,
        id: UserId,
        credentials: &Credentials,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE storefront.users
            SET password_hash = $2, password_history = $3, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&credentials.password_hash)
        .bind(credentials.history.as_slice())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn update_preference(
        &self,
        id: UserId,
        preference: &Preference,
    ) -> Result<Preference, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE storefront.users
            SET preference_style = $2, preference_color = $3, preference_size = $4,
                updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&preference.style)
        .bind(&preference.color)
        .bind(&preference.size)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(preference.clone())
    }
}
