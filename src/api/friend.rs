use crate::api::{observe, Message, State};
use crate::auth::AuthUser;
use crate::datastore::{
    filters::{FilterSet, FriendFilters},
    structs::{Listing, UserSummary},
    Datastore,
};
use crate::twoface::{ExternalError, Fallible};
use actix_web::web;
use serde::Deserialize;

const INVALID_USER_ID: ExternalError = ExternalError::invalid_field("userId must be numeric");

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct FriendBody {
    /// Numeric, but sent as a string.
    pub user_id: String,
}

impl FriendBody {
    fn friend_id(&self) -> Fallible<i32> {
        Ok(self.user_id.parse().map_err(|_| INVALID_USER_ID)?)
    }
}

pub async fn list_friends<DS: Datastore>(
    state: web::Data<State<DS>>,
    user: AuthUser,
    filters: FilterSet,
) -> Fallible<web::Json<Listing<UserSummary>>> {
    observe("list_friends", || async {
        let filters = FriendFilters::from_filter_set(&filters)?;
        let listing = state.ds.list_friends(user.user_id, filters).await?;
        Ok(web::Json(listing))
    })
    .await
}

pub async fn add_friend<DS: Datastore>(
    state: web::Data<State<DS>>,
    user: AuthUser,
    body: web::Json<FriendBody>,
) -> Fallible<web::Json<Message>> {
    observe("add_friend", || async {
        let friend_id = body.friend_id()?;
        state.ds.add_friend(user.user_id, friend_id).await?;
        Ok(web::Json(Message {
            message: "friend added",
        }))
    })
    .await
}

pub async fn delete_friend<DS: Datastore>(
    state: web::Data<State<DS>>,
    user: AuthUser,
    body: web::Json<FriendBody>,
) -> Fallible<web::Json<Message>> {
    observe("delete_friend", || async {
        let friend_id = body.friend_id()?;
        state.ds.delete_friend(user.user_id, friend_id).await?;
        Ok(web::Json(Message {
            message: "friend deleted",
        }))
    })
    .await
}
