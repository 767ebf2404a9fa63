use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::state::AppState;
use crate::users::repo::{User, UserRole};

/// Fixed token lifetime. There is no refresh and no revocation; a token
/// stays valid until expiry even if the account is suspended afterwards.
pub const TOKEN_TTL_HOURS: i64 = 24;

/// JWT payload: identity snapshot at issuance time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub role: UserRole,
    pub iat: usize,
    pub exp: usize,
}

/// HS256 signing and verification keys, built once from the configured
/// secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::new(&state.config.jwt.secret)
    }
}

impl JwtKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn sign(&self, user: &User) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + Duration::hours(TOKEN_TTL_HOURS);
        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user.id, "jwt signed");
        Ok(token)
    }

    /// Signature and expiry check. All failure modes (malformed, expired,
    /// mis-signed) collapse into one error; callers do not distinguish them.
    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::repo::test_user;

    #[test]
    fn sign_and_verify_roundtrip_preserves_identity() {
        let keys = JwtKeys::new("dev-secret");
        let user = test_user(UserRole::Admin);
        let token = keys.sign(&user).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.username, user.username);
        assert_eq!(claims.role, UserRole::Admin);
    }

    #[test]
    fn verify_rejects_token_signed_with_another_secret() {
        let good = JwtKeys::new("dev-secret");
        let bad = JwtKeys::new("other-secret");
        let token = bad.sign(&test_user(UserRole::User)).expect("sign");
        assert!(good.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_garbage() {
        let keys = JwtKeys::new("dev-secret");
        assert!(keys.verify("not.a.jwt").is_err());
    }

    #[test]
    fn verify_rejects_expired_token() {
        let keys = JwtKeys::new("dev-secret");
        let user = test_user(UserRole::User);
        let issued = OffsetDateTime::now_utc() - Duration::hours(25);
        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role,
            iat: issued.unix_timestamp() as usize,
            exp: (issued + Duration::hours(TOKEN_TTL_HOURS)).unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).expect("encode");
        assert!(keys.verify(&token).is_err());
    }
}
