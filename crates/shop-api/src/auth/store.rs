//! 사용자 저장소 추상화.
//!
//! 인증 미들웨어와 사용자 라우트는 [`UserStore`] 트레이트만 의존합니다.
//! 데이터베이스가 설정되면 [`PgUserStore`], 없으면 [`MemoryUserStore`]를 사용합니다.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::repository::users::{normalize_email, NewUser, User, UserRepository, UserUpdate};

/// 저장소 에러.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already in use")]
    DuplicateEmail,

    #[error("데이터베이스 에러: {0}")]
    Database(#[from] sqlx::Error),
}

/// 사용자 저장소 트레이트.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// ID로 사용자 조회.
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;

    /// 이메일로 사용자 조회 (대소문자 무시).
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// 사용자 생성. 이메일이 이미 있으면 [`StoreError::DuplicateEmail`].
    async fn create_user(&self, input: NewUser) -> Result<User, StoreError>;

    /// 사용자 부분 수정. 대상이 없으면 `None`.
    async fn update_user(&self, id: i64, update: UserUpdate) -> Result<Option<User>, StoreError>;

    /// 사용자 삭제. 삭제되었으면 `true`.
    async fn delete_user(&self, id: i64) -> Result<bool, StoreError>;

    /// 전체 사용자 목록 (ID 순).
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    /// 저장소 상태 확인.
    async fn is_healthy(&self) -> bool {
        true
    }
}

// ==================== PostgreSQL ====================

/// PostgreSQL 기반 사용자 저장소.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// unique violation(23505)은 이메일 중복으로 변환.
fn map_write_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return StoreError::DuplicateEmail;
        }
    }
    StoreError::Database(e)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(UserRepository::get_by_id(&self.pool, id).await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(UserRepository::get_by_email(&self.pool, email).await?)
    }

    async fn create_user(&self, input: NewUser) -> Result<User, StoreError> {
        UserRepository::create(&self.pool, input)
            .await
            .map_err(map_write_error)
    }

    async fn update_user(&self, id: i64, update: UserUpdate) -> Result<Option<User>, StoreError> {
        UserRepository::update(&self.pool, id, update)
            .await
            .map_err(map_write_error)
    }

    async fn delete_user(&self, id: i64) -> Result<bool, StoreError> {
        Ok(UserRepository::delete(&self.pool, id).await?)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(UserRepository::list(&self.pool).await?)
    }

    async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }
}

// ==================== In-memory ====================

#[derive(Debug, Default)]
struct MemoryInner {
    next_id: i64,
    users: BTreeMap<i64, User>,
}

/// 프로세스 내 메모리 사용자 저장소.
///
/// 데이터베이스 없이 서버를 띄우거나 테스트할 때 사용합니다.
/// 재시작하면 내용이 사라집니다.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let email = normalize_email(email);
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, input: NewUser) -> Result<User, StoreError> {
        let email = normalize_email(&input.email);
        let mut inner = self.inner.write().await;

        if inner.users.values().any(|u| u.email == email) {
            return Err(StoreError::DuplicateEmail);
        }

        inner.next_id += 1;
        let now = Utc::now();
        let user = User {
            id: inner.next_id,
            name: input.name,
            email,
            password_hash: input.password_hash,
            role: input.role,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn update_user(&self, id: i64, update: UserUpdate) -> Result<Option<User>, StoreError> {
        let mut inner = self.inner.write().await;

        if let Some(email) = update.email.as_deref().map(normalize_email) {
            if inner.users.values().any(|u| u.id != id && u.email == email) {
                return Err(StoreError::DuplicateEmail);
            }
        }

        let Some(user) = inner.users.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(email) = update.email {
            user.email = normalize_email(&email);
        }
        if let Some(hash) = update.password_hash {
            user.password_hash = hash;
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.users.remove(&id).is_some())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.inner.read().await.users.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_core::Role;

    fn new_user(name: &str, email: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = MemoryUserStore::new();
        let alice = store.create_user(new_user("Alice", "alice@x.com")).await.unwrap();
        let bob = store.create_user(new_user("Bob", "bob@x.com")).await.unwrap();

        assert_eq!(alice.id, 1);
        assert_eq!(bob.id, 2);
        assert_eq!(store.get_user_by_id(1).await.unwrap(), Some(alice));
        assert!(store.get_user_by_id(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_case_insensitive() {
        let store = MemoryUserStore::new();
        store.create_user(new_user("Alice", "alice@x.com")).await.unwrap();

        let err = store
            .create_user(new_user("Alice2", " ALICE@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));

        let found = store.find_by_email("Alice@X.com").await.unwrap();
        assert_eq!(found.map(|u| u.name), Some("Alice".to_string()));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = MemoryUserStore::new();
        let alice = store.create_user(new_user("Alice", "alice@x.com")).await.unwrap();
        store.create_user(new_user("Bob", "bob@x.com")).await.unwrap();

        let updated = store
            .update_user(
                alice.id,
                UserUpdate {
                    role: Some(Role::Admin),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.role, Role::Admin);
        assert_eq!(updated.name, "Alice");

        // 다른 사용자의 이메일로 변경 불가
        let err = store
            .update_user(
                alice.id,
                UserUpdate {
                    email: Some("bob@x.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));

        assert!(store.update_user(42, UserUpdate::default()).await.unwrap().is_none());

        assert!(store.delete_user(alice.id).await.unwrap());
        assert!(!store.delete_user(alice.id).await.unwrap());
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }
}
