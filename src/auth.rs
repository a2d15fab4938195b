//! Passwords, access tokens, and the identity of whoever is making a request.
//!
//! Authenticated routes are wrapped in bearer-token middleware (see [`validator`]). A valid token
//! attaches an [`AuthUser`] to the request, which handlers extract like any other argument.
use crate::config::Config;
use crate::twoface::{BlockingResp, Cause, DescribeErr, ExternalError, Fallible, TfError};
use actix_web::{dev::Payload, dev::ServiceRequest, web, FromRequest, HttpMessage, HttpRequest};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use anyhow::anyhow;
use futures::future::{ready, Ready};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

const INVALID_TOKEN: ExternalError = ExternalError::new(Cause::UserForbidden, "invalid access token");
const MISSING_IDENTITY: ExternalError = ExternalError::new(Cause::UserBadAuth, "not logged in");

/// The authenticated user behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i32,
}

impl FromRequest for AuthUser {
    type Error = TfError;
    type Future = Ready<Fallible<Self>>;
    type Config = ();

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let user = req.extensions().get::<AuthUser>().copied();
        ready(user.ok_or_else(|| TfError::from(MISSING_IDENTITY)))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    user_id: i32,
    /// Seconds since the epoch.
    exp: i64,
}

/// Issues and verifies HS256 access tokens.
#[derive(Clone)]
pub struct Tokens {
    secret: String,
    lifetime_secs: i64,
}

impl Tokens {
    pub fn new(secret: String, lifetime_secs: u64) -> Self {
        Self {
            secret,
            lifetime_secs: lifetime_secs as i64,
        }
    }

    pub fn issue(&self, user_id: i32) -> Fallible<String> {
        self.encode(&Claims {
            user_id,
            exp: chrono::Utc::now().timestamp() + self.lifetime_secs,
        })
    }

    fn encode(&self, claims: &Claims) -> Fallible<String> {
        let key = EncodingKey::from_secret(self.secret.as_bytes());
        Ok(jsonwebtoken::encode(&Header::default(), claims, &key)?)
    }

    pub fn verify(&self, token: &str) -> Fallible<AuthUser> {
        let key = DecodingKey::from_secret(self.secret.as_bytes());
        let data = jsonwebtoken::decode::<Claims>(token, &key, &Validation::default())
            .describe_err(INVALID_TOKEN)?;
        Ok(AuthUser {
            user_id: data.claims.user_id,
        })
    }
}

/// Hashes and checks passwords with bcrypt, off the async executor.
#[derive(Clone, Copy)]
pub struct Passwords {
    cost: u32,
}

impl Passwords {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash(&self, password: String) -> Fallible<String> {
        let cost = self.cost;
        web::block(move || bcrypt::hash(password, cost))
            .await
            .to_resp()
    }

    pub async fn verify(&self, password: String, hash: String) -> Fallible<bool> {
        web::block(move || bcrypt::verify(password, &hash))
            .await
            .to_resp()
    }
}

/// Everything handlers need to authenticate users.
#[derive(Clone)]
pub struct Auth {
    pub tokens: Tokens,
    pub passwords: Passwords,
}

impl Auth {
    pub fn from_config(config: &Config) -> Self {
        Self {
            tokens: Tokens::new(config.jwt_secret.clone(), config.token_lifetime_secs),
            passwords: Passwords::new(config.bcrypt_cost),
        }
    }
}

/// Bearer middleware callback: verify the token and attach the user it names to the request.
/// Requests without a bearer token never get here; the middleware rejects them with 401.
pub async fn validator(
    req: ServiceRequest,
    credentials: BearerAuth,
) -> Result<ServiceRequest, actix_web::Error> {
    let user = match req.app_data::<web::Data<Auth>>() {
        Some(auth) => auth.tokens.verify(credentials.token())?,
        None => return Err(TfError::from(anyhow!("Auth missing from app data")).into()),
    };
    req.extensions_mut().insert(user);
    Ok(req)
}
