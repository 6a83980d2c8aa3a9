use async_trait::async_trait;
use sqlx::PgPool;

use crate::dao::{
    CredentialsRow, NewUser, ProfileEdit, ProfileRow, SecurityRow, UserDao, UserInfoRow, UserRow,
};
use crate::errors::AppError;

/// `UserDao` over PostgreSQL.
#[derive(Clone)]
pub struct PgUserDao {
    pool: PgPool,
}

impl PgUserDao {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDao for PgUserDao {
    async fn create_user(&self, user: &NewUser) -> Result<UserRow, AppError> {
        Ok(sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users
                (first_name, last_name, email, password_hash, account_type,
                 q_type1, q_type2, ans1_hash, ans2_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id AS user_id, first_name, last_name, email, account_type, about
            "#,
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.account_type)
        .bind(&user.q_type1)
        .bind(&user.q_type2)
        .bind(&user.ans1_hash)
        .bind(&user.ans2_hash)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn find_credentials(&self, email: &str) -> Result<Option<CredentialsRow>, AppError> {
        Ok(sqlx::query_as::<_, CredentialsRow>(
            r#"
            SELECT id AS user_id, email, account_type, password_hash, is_deleted
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_by_type(&self, account_type: i16) -> Result<Vec<UserRow>, AppError> {
        Ok(sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id AS user_id, first_name, last_name, email, account_type, about
            FROM users
            WHERE account_type = $1 AND NOT is_deleted
            ORDER BY id
            "#,
        )
        .bind(account_type)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn edit_user(&self, edit: &ProfileEdit) -> Result<Option<ProfileRow>, AppError> {
        // The address row is written in the same statement; an edit of a missing
        // user leaves an orphan address behind but no user row changes.
        Ok(sqlx::query_as::<_, ProfileRow>(
            r#"
            WITH addr AS (
                INSERT INTO addresses (street, city, zipcode)
                VALUES ($5, $6, $7)
                RETURNING id
            )
            UPDATE users
            SET first_name = $2,
                last_name  = $3,
                about      = $4,
                address_id = (SELECT id FROM addr),
                image_key  = COALESCE($8, image_key)
            WHERE id = $1 AND NOT is_deleted
            RETURNING id AS user_id, first_name, last_name, about, address_id, image_key
            "#,
        )
        .bind(edit.user_id)
        .bind(&edit.first_name)
        .bind(&edit.last_name)
        .bind(&edit.about)
        .bind(&edit.street)
        .bind(&edit.city)
        .bind(&edit.zipcode)
        .bind(edit.image_key.as_deref())
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn find_security(&self, email: &str) -> Result<Option<SecurityRow>, AppError> {
        Ok(sqlx::query_as::<_, SecurityRow>(
            r#"
            SELECT id AS user_id, q_type1, q_type2, ans1_hash, ans2_hash
            FROM users
            WHERE email = $1 AND NOT is_deleted
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn update_password(&self, user_id: i32, password_hash: &str) -> Result<Option<i32>, AppError> {
        Ok(sqlx::query_scalar::<_, i32>(
            "UPDATE users SET password_hash = $2 WHERE id = $1 AND NOT is_deleted RETURNING id",
        )
        .bind(user_id)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn user_info(&self, user_id: i32) -> Result<Option<UserInfoRow>, AppError> {
        Ok(sqlx::query_as::<_, UserInfoRow>(
            r#"
            SELECT u.id AS user_id, u.first_name, u.last_name, u.email, u.account_type,
                   u.about, u.image_key, a.street, a.city, a.zipcode,
                   (SELECT AVG(r.value)::FLOAT8 FROM ratings r WHERE r.user_id = u.id) AS rating
            FROM users u
            LEFT JOIN addresses a ON a.id = u.address_id
            WHERE u.id = $1 AND NOT u.is_deleted
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn soft_delete(&self, user_id: i32) -> Result<Option<i32>, AppError> {
        Ok(sqlx::query_scalar::<_, i32>(
            "UPDATE users SET is_deleted = TRUE WHERE id = $1 AND NOT is_deleted RETURNING id",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }
}
