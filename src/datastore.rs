pub mod filters;
pub mod grouping;
#[cfg(test)]
pub mod mock;
pub mod postgres;
pub mod query;
pub mod structs;
pub mod tables;

use crate::twoface::{Cause, ExternalError, Fallible};
use async_trait::async_trait;
use filters::{FriendFilters, PostFilters};
use structs::{
    Account, Comment, Listing, NewComment, NewCredential, NewPost, NewUser, Post, PostView,
    UserSummary,
};

pub const CREDENTIAL_TAKEN: ExternalError =
    ExternalError::new(Cause::UserConflict, "credential is already in use");
pub const CREDENTIAL_TYPE_LINKED: ExternalError = ExternalError::new(
    Cause::UserActionInvalid,
    "a credential of this type is already linked",
);
pub const USER_NOT_FOUND: ExternalError = ExternalError::not_found("user not found");
pub const SELF_FRIEND: ExternalError =
    ExternalError::new(Cause::UserActionInvalid, "you can't befriend yourself");
pub const ALREADY_FRIENDS: ExternalError =
    ExternalError::new(Cause::UserConflict, "already friends with this user");
pub const NOT_FRIENDS: ExternalError = ExternalError::not_found("not friends with this user");
pub const POST_NOT_FOUND: ExternalError = ExternalError::not_found("post not found");

#[async_trait]
/// The interface for storing users, friendships, posts and comments.
pub trait Datastore: Clone + Send + Sync {
    /// Insert a user and their first credential together.
    async fn create_user(&self, new_user: NewUser, credential: NewCredential) -> Fallible<Account>;
    async fn find_account(&self, credential_value: String) -> Fallible<Option<Account>>;
    /// Link another credential. Each user has at most one of each type.
    async fn link_credential(&self, user_id: i32, credential: NewCredential) -> Fallible<()>;
    async fn update_profile(&self, user_id: i32, name: String, image_url: String) -> Fallible<()>;

    async fn add_friend(&self, user_id: i32, friend_id: i32) -> Fallible<()>;
    async fn delete_friend(&self, user_id: i32, friend_id: i32) -> Fallible<()>;
    async fn list_friends(&self, user_id: i32, filters: FriendFilters) -> Fallible<Listing<UserSummary>>;

    async fn new_post(&self, new_post: NewPost) -> Fallible<Post>;
    async fn new_comment(&self, new_comment: NewComment) -> Fallible<Comment>;
    async fn list_posts(&self, filters: PostFilters) -> Fallible<Listing<PostView>>;
}
