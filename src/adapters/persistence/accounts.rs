use async_trait::async_trait;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    use_cases::account::AccountStore,
};

#[async_trait]
impl AccountStore for PostgresPersistence {
    async fn ensure(&self, subject: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (subject)
            VALUES ($1)
            ON CONFLICT (subject) DO NOTHING
            "#,
        )
        .bind(subject)
        .execute(self.pool())
        .await
        .map_err(AppError::from)?;

        Ok(())
    }

    async fn phone_verified(&self, subject: &str) -> AppResult<bool> {
        let verified: Option<bool> =
            sqlx::query_scalar("SELECT phone_verified FROM accounts WHERE subject = $1")
                .bind(subject)
                .fetch_optional(self.pool())
                .await
                .map_err(AppError::from)?;

        Ok(verified.unwrap_or(false))
    }

    async fn phone_number(&self, subject: &str) -> AppResult<Option<String>> {
        let number: Option<Option<String>> =
            sqlx::query_scalar("SELECT phone_number FROM accounts WHERE subject = $1")
                .bind(subject)
                .fetch_optional(self.pool())
                .await
                .map_err(AppError::from)?;

        Ok(number.flatten())
    }

    async fn set_phone_number(&self, subject: &str, number: &str) -> AppResult<()> {
        // A changed number always drops back to unverified.
        sqlx::query(
            r#"
            INSERT INTO accounts (subject, phone_number, phone_verified)
            VALUES ($1, $2, FALSE)
            ON CONFLICT (subject) DO UPDATE
            SET phone_number = $2, phone_verified = FALSE, updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(subject)
        .bind(number)
        .execute(self.pool())
        .await
        .map_err(AppError::from)?;

        Ok(())
    }
}
