//! admin 계정 생성 또는 승격.

use anyhow::{ensure, Context, Result};
use sqlx::PgPool;
use tracing::info;

use shop_api::hash_password;
use shop_api::repository::{NewUser, User, UserRepository, UserUpdate};
use shop_core::Role;

/// 최소 비밀번호 길이 (가입 검증과 동일).
pub const MIN_PASSWORD_LEN: usize = 6;

/// admin 생성 설정.
#[derive(Debug)]
pub struct CreateAdminConfig {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl CreateAdminConfig {
    /// 입력 검증.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.name.trim().is_empty(), "name must not be empty");
        ensure!(self.email.contains('@'), "invalid email: {}", self.email);
        ensure!(
            self.password.chars().count() >= MIN_PASSWORD_LEN,
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        );
        Ok(())
    }
}

/// 처리 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminOutcome {
    Created,
    Promoted,
    AlreadyAdmin,
}

/// admin 계정 생성.
///
/// 같은 이메일의 사용자가 이미 있으면 비밀번호는 유지한 채 역할만 admin으로 올립니다.
pub async fn create_admin(pool: &PgPool, config: CreateAdminConfig) -> Result<(User, AdminOutcome)> {
    config.validate()?;

    if let Some(existing) = UserRepository::get_by_email(pool, &config.email)
        .await
        .context("Failed to look up user")?
    {
        if existing.role.is_admin() {
            return Ok((existing, AdminOutcome::AlreadyAdmin));
        }

        let promoted = UserRepository::update(
            pool,
            existing.id,
            UserUpdate {
                role: Some(Role::Admin),
                ..Default::default()
            },
        )
        .await
        .context("Failed to promote user")?
        .context("User disappeared during promotion")?;

        info!(user_id = promoted.id, "User promoted to admin");
        return Ok((promoted, AdminOutcome::Promoted));
    }

    let password_hash = hash_password(&config.password)?;
    let user = UserRepository::create(
        pool,
        NewUser {
            name: config.name.trim().to_string(),
            email: config.email,
            password_hash,
            role: Role::Admin,
        },
    )
    .await
    .context("Failed to create admin user")?;

    info!(user_id = user.id, "Admin user created");
    Ok((user, AdminOutcome::Created))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(name: &str, email: &str, password: &str) -> CreateAdminConfig {
        CreateAdminConfig {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_validate() {
        assert!(config("Admin", "admin@x.com", "secret1").validate().is_ok());
        assert!(config("  ", "admin@x.com", "secret1").validate().is_err());
        assert!(config("Admin", "admin.x.com", "secret1").validate().is_err());
        assert!(config("Admin", "admin@x.com", "12345").validate().is_err());
    }
}
