use crate::datastore::{
    postgres::{
        errors::{DbPoolResult, During},
        PostgresStore,
    },
    structs::{Account, Credential, NewCredential, NewUser, User},
    tables::{user_credentials, users},
    CREDENTIAL_TAKEN, CREDENTIAL_TYPE_LINKED, USER_NOT_FOUND,
};
use crate::twoface::{describe_diesel, BlockingResp, ExternalError, Fallible, TfError};
use actix_web::web::block;
use diesel::{
    dsl::exists,
    query_dsl::{QueryDsl, RunQueryDsl},
    BelongingToDsl, Connection, ExpressionMethods, OptionalExtension,
};

impl PostgresStore {
    pub async fn insert_user(
        &self,
        new_user: NewUser,
        credential: NewCredential,
    ) -> Fallible<Account> {
        let conn = self.pool.get()?;
        let account = block(move || {
            conn.transaction::<_, TfError, _>(|| {
                let user: User = diesel::insert_into(users::table)
                    .values(&new_user)
                    .get_result(&conn)
                    .during("failed to create user")?;
                let credential: Credential = diesel::insert_into(user_credentials::table)
                    .values(&credential.for_user(user.id))
                    .get_result(&conn)
                    .map_err(|e| describe_diesel(e, CREDENTIAL_TAKEN, ExternalError::default()))
                    .during("failed to create credential")?;
                Ok(Account {
                    user,
                    credentials: vec![credential],
                })
            })
        })
        .await
        .to_resp()?;
        Ok(account)
    }

    pub async fn account_by_credential(&self, credential_value: String) -> Fallible<Option<Account>> {
        let conn = self.pool.get()?;
        let query_result: DbPoolResult<_> = block(move || {
            let user: Option<User> = user_credentials::table
                .inner_join(users::table)
                .filter(user_credentials::credential_value.eq(credential_value))
                .select(users::all_columns)
                .first(&conn)
                .optional()?;

            guard!(let Some(user) = user else {
                return Ok(None);
            });

            let credentials = Credential::belonging_to(&user).load::<Credential>(&conn)?;
            Ok(Some(Account { user, credentials }))
        })
        .await;
        query_result.to_resp()
    }

    pub async fn insert_credential(&self, user_id: i32, credential: NewCredential) -> Fallible<()> {
        let conn = self.pool.get()?;
        block(move || {
            conn.transaction::<_, TfError, _>(|| {
                let linked: bool = diesel::select(exists(
                    user_credentials::table
                        .filter(user_credentials::user_id.eq(user_id))
                        .filter(user_credentials::credential_type.eq(credential.credential_type)),
                ))
                .get_result(&conn)?;
                if linked {
                    return Err(CREDENTIAL_TYPE_LINKED.into());
                }

                diesel::insert_into(user_credentials::table)
                    .values(&credential.for_user(user_id))
                    .execute(&conn)
                    .map_err(|e| describe_diesel(e, CREDENTIAL_TAKEN, USER_NOT_FOUND))
                    .during("failed to link credential")?;
                Ok(())
            })
        })
        .await
        .to_resp()
    }

    pub async fn set_profile(&self, user_id: i32, name: String, image_url: String) -> Fallible<()> {
        let conn = self.pool.get()?;
        let updated = block(move || {
            diesel::update(users::table.find(user_id))
                .set((users::name.eq(name), users::image_url.eq(Some(image_url))))
                .execute(&conn)
        })
        .await
        .to_resp()?;
        if updated == 0 {
            return Err(USER_NOT_FOUND.into());
        }
        Ok(())
    }
}
