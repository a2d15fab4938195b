//! Registration, login, and everything a user can change about themselves.
use crate::api::{observe, validation, Message, State};
use crate::auth::{Auth, AuthUser};
use crate::datastore::{
    structs::{Account, CredentialType, NewCredential, NewUser},
    Datastore, USER_NOT_FOUND,
};
use crate::twoface::{Cause, ExternalError, Fallible};
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

const WRONG_PASSWORD: ExternalError =
    ExternalError::new(Cause::UserActionInvalid, "invalid credential or password");

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBody {
    pub name: String,
    pub password: String,
    pub credential_type: CredentialType,
    pub credential_value: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LoginBody {
    pub password: String,
    pub credential_type: CredentialType,
    pub credential_value: String,
}

#[derive(Deserialize, Debug)]
pub struct LinkEmailBody {
    pub email: String,
}

#[derive(Deserialize, Debug)]
pub struct LinkPhoneBody {
    pub phone: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProfileBody {
    pub name: String,
    pub image_url: String,
}

/// What a client gets back after registering or logging in.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub name: String,
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Session {
    fn new(account: &Account, access_token: String) -> Self {
        Self {
            name: account.user.name.clone(),
            access_token,
            email: account.credential(CredentialType::Email).map(str::to_owned),
            phone: account.credential(CredentialType::Phone).map(str::to_owned),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SessionResponse {
    pub message: String,
    pub data: Session,
}

pub async fn register<DS: Datastore>(
    state: web::Data<State<DS>>,
    auth: web::Data<Auth>,
    body: web::Json<RegisterBody>,
) -> Fallible<HttpResponse> {
    observe("register", || async {
        let body = body.into_inner();
        validation::credential(body.credential_type, &body.credential_value)?;
        validation::length(&body.name, 5, 50, validation::INVALID_NAME)?;
        validation::length(&body.password, 5, 15, validation::INVALID_PASSWORD)?;

        let password = auth.passwords.hash(body.password).await?;
        let account = state
            .ds
            .create_user(
                NewUser {
                    name: body.name,
                    password,
                },
                NewCredential {
                    credential_type: body.credential_type,
                    value: body.credential_value,
                },
            )
            .await?;
        let token = auth.tokens.issue(account.user.id)?;
        Ok(HttpResponse::Created().json(SessionResponse {
            message: "User registered successfully".to_owned(),
            data: Session::new(&account, token),
        }))
    })
    .await
}

pub async fn login<DS: Datastore>(
    state: web::Data<State<DS>>,
    auth: web::Data<Auth>,
    body: web::Json<LoginBody>,
) -> Fallible<web::Json<SessionResponse>> {
    observe("login", || async {
        let body = body.into_inner();
        validation::credential(body.credential_type, &body.credential_value)?;
        validation::length(&body.password, 5, 15, validation::INVALID_PASSWORD)?;

        guard!(let Some(account) = state.ds.find_account(body.credential_value).await? else {
            return Err(USER_NOT_FOUND.into());
        });
        let valid = auth
            .passwords
            .verify(body.password, account.user.password.clone())
            .await?;
        if !valid {
            return Err(WRONG_PASSWORD.into());
        }
        let token = auth.tokens.issue(account.user.id)?;
        Ok(web::Json(SessionResponse {
            message: "User logged successfully".to_owned(),
            data: Session::new(&account, token),
        }))
    })
    .await
}

pub async fn link_email<DS: Datastore>(
    state: web::Data<State<DS>>,
    user: AuthUser,
    body: web::Json<LinkEmailBody>,
) -> Fallible<web::Json<Message>> {
    observe("link_email", || async {
        let body = body.into_inner();
        validation::email(&body.email)?;
        let credential = NewCredential {
            credential_type: CredentialType::Email,
            value: body.email,
        };
        state.ds.link_credential(user.user_id, credential).await?;
        Ok(web::Json(Message {
            message: "email linked",
        }))
    })
    .await
}

pub async fn link_phone<DS: Datastore>(
    state: web::Data<State<DS>>,
    user: AuthUser,
    body: web::Json<LinkPhoneBody>,
) -> Fallible<web::Json<Message>> {
    observe("link_phone", || async {
        let body = body.into_inner();
        validation::phone(&body.phone)?;
        let credential = NewCredential {
            credential_type: CredentialType::Phone,
            value: body.phone,
        };
        state.ds.link_credential(user.user_id, credential).await?;
        Ok(web::Json(Message {
            message: "phone linked",
        }))
    })
    .await
}

pub async fn update_profile<DS: Datastore>(
    state: web::Data<State<DS>>,
    user: AuthUser,
    body: web::Json<ProfileBody>,
) -> Fallible<web::Json<Message>> {
    observe("update_profile", || async {
        let body = body.into_inner();
        validation::length(&body.name, 5, 50, validation::INVALID_NAME)?;
        validation::image_url(&body.image_url)?;
        state
            .ds
            .update_profile(user.user_id, body.name, body.image_url)
            .await?;
        Ok(web::Json(Message {
            message: "profile updated",
        }))
    })
    .await
}
