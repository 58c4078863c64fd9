//! 사용자 역할 및 인증 주체.

use serde::{Deserialize, Serialize};

/// 사용자 역할.
///
/// 신규 가입 사용자는 항상 [`Role::User`]로 시작합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 일반 사용자 - 본인 계정과 주문만 관리
    #[default]
    User,
    /// 관리자 - 상품 관리 및 모든 사용자/주문 접근
    Admin,
}

impl Role {
    /// 저장소/토큰에 기록되는 문자열 표현.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    /// 문자열에서 역할 파싱 (대소문자 무시).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 인증된 요청 주체.
///
/// 토큰 발급 시점의 사용자 ID와 역할입니다. 토큰에 한 번 기록되면 바뀌지 않으며,
/// 이후 역할 변경은 이미 발급된 토큰에 반영되지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: i64,
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: i64, role: Role) -> Self {
        Self { user_id, role }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("USER"), Some(Role::User));
        assert_eq!(Role::parse(" Admin "), Some(Role::Admin));
        assert_eq!(Role::parse("superuser"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn test_role_default_is_user() {
        assert_eq!(Role::default(), Role::User);
        assert!(!Role::User.is_admin());
        assert!(Role::Admin.is_admin());
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Role::Admin).unwrap();
        assert_eq!(json, "\"admin\"");

        let parsed: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(parsed, Role::User);
        assert_eq!(Role::User.to_string(), "user");
    }

    #[test]
    fn test_identity_serialization() {
        let identity = Identity::new(42, Role::Admin);
        let json = serde_json::to_value(identity).unwrap();
        assert_eq!(json["user_id"], 42);
        assert_eq!(json["role"], "admin");
    }
}
