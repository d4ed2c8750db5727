use serde::Serialize;
use sqlx::FromRow;
use chrono::{DateTime, NaiveDate, Utc};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub user_id: i32,
    pub email: String,
    pub password_hash: String,
    pub password_plain: Option<String>, // For testing only
    pub first_name: String,
    pub surname: String,
    pub birthday: Option<NaiveDate>,
    pub registered_at: DateTime<Utc>,
    pub is_active: bool,
    pub last_logged_in: DateTime<Utc>,
}

impl User {
    // Найти пользователя по email
    pub async fn find_by_email(email: &str, db: &crate::database::Database) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE email = $1"
        )
        .bind(email)
        .fetch_optional(&db.pool)
        .await
    }

    // Проверить пароль: для тестовых аккаунтов plain, иначе bcrypt
    pub fn verify_password(&self, password: &str) -> bool {
        if let Some(ref plain) = self.password_plain {
            plain == password
        } else {
            bcrypt::verify(password, &self.password_hash).unwrap_or(false)
        }
    }
}
