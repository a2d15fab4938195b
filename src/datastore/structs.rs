use crate::datastore::query::Page;
use crate::datastore::tables::{comments, posts, user_credentials, users};
use chrono::{offset::Utc, DateTime};
use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};

/// A user of the website. Holds the password hash, so it's never serialized directly.
#[derive(Queryable, Identifiable, Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub password: String,
    pub image_url: Option<String>,
    pub friend_count: i32,
    pub created_at: DateTime<Utc>,
}

/// Parameters for the database statement which inserts new users.
#[derive(Insertable, Clone, Debug)]
#[table_name = "users"]
pub struct NewUser {
    pub name: String,
    /// Already hashed.
    pub password: String,
}

#[derive(DbEnum, Debug, PartialEq, Serialize, Deserialize, Clone, Copy, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CredentialType {
    Email,
    Phone,
}

/// An email address or phone number a user can log in with.
#[derive(Queryable, Identifiable, Associations, Clone, Debug, PartialEq, Eq)]
#[belongs_to(User)]
#[table_name = "user_credentials"]
pub struct Credential {
    pub id: i32,
    pub user_id: i32,
    pub credential_type: CredentialType,
    pub credential_value: String,
}

/// A credential that isn't attached to a user yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewCredential {
    pub credential_type: CredentialType,
    pub value: String,
}

impl NewCredential {
    pub fn for_user(&self, user_id: i32) -> InsertCredential {
        InsertCredential {
            user_id,
            credential_type: self.credential_type,
            credential_value: self.value.clone(),
        }
    }
}

/// Parameters for the database statement which inserts new credentials.
#[derive(Insertable)]
#[table_name = "user_credentials"]
pub struct InsertCredential {
    pub user_id: i32,
    pub credential_type: CredentialType,
    pub credential_value: String,
}

/// A user together with every credential linked to them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub user: User,
    pub credentials: Vec<Credential>,
}

impl Account {
    pub fn credential(&self, credential_type: CredentialType) -> Option<&str> {
        self.credentials
            .iter()
            .find(|c| c.credential_type == credential_type)
            .map(|c| c.credential_value.as_str())
    }
}

/// A post from a user
#[derive(Queryable, Identifiable, Associations, Clone, Debug, PartialEq, Eq)]
#[belongs_to(User)]
pub struct Post {
    pub id: i32,
    pub html: String,
    pub tags: Vec<String>,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
}

/// Parameters for the database statement which inserts new posts.
#[derive(Insertable, Clone, Debug)]
#[table_name = "posts"]
pub struct NewPost {
    pub html: String,
    pub tags: Vec<String>,
    pub user_id: i32,
}

#[derive(Queryable, Identifiable, Associations, Clone, Debug, PartialEq, Eq)]
#[belongs_to(Post)]
pub struct Comment {
    pub id: i32,
    pub comment: String,
    pub post_id: i32,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
}

/// Parameters for the database statement which inserts new comments.
#[derive(Insertable, Clone, Debug)]
#[table_name = "comments"]
pub struct NewComment {
    pub comment: String,
    pub post_id: i32,
    pub user_id: i32,
}

/// The public face of a user: a post's creator, a commenter, or an entry in the friends listing.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub user_id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub friend_count: i32,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.to_string(),
            name: user.name.clone(),
            image_url: user.image_url.clone(),
            friend_count: user.friend_count,
            created_at: user.created_at,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PostContent {
    pub post_in_html: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub comment: String,
    pub creator: UserSummary,
    pub created_at: DateTime<Utc>,
}

/// A post as it appears in the posts listing.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub post_id: String,
    pub post: PostContent,
    pub comments: Vec<CommentView>,
    pub creator: UserSummary,
}

impl PostView {
    pub fn with_comments(self, comments: Vec<CommentView>) -> Self {
        Self { comments, ..self }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Meta {
    pub limit: i64,
    pub offset: i64,
    /// Size of the whole filtered set, not of this page.
    pub total: i64,
}

/// One page of a listing.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Listing<T> {
    pub data: Vec<T>,
    pub meta: Meta,
}

impl<T> Listing<T> {
    pub fn new(data: Vec<T>, page: Page, total: i64) -> Self {
        Self {
            data,
            meta: Meta {
                limit: page.limit,
                offset: page.offset,
                total,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_serializes_data_and_meta() {
        let listing = Listing::new(vec![1, 2], Page { limit: 2, offset: 4 }, 9);
        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"data": [1, 2], "meta": {"limit": 2, "offset": 4, "total": 9}})
        );
    }

    #[test]
    fn test_account_credential_lookup() {
        let account = Account {
            user: User {
                id: 1,
                name: "alice".to_owned(),
                password: "hash".to_owned(),
                image_url: None,
                friend_count: 0,
                created_at: Utc::now(),
            },
            credentials: vec![Credential {
                id: 1,
                user_id: 1,
                credential_type: CredentialType::Phone,
                credential_value: "+62812345".to_owned(),
            }],
        };
        assert_eq!(account.credential(CredentialType::Phone), Some("+62812345"));
        assert_eq!(account.credential(CredentialType::Email), None);
    }
}
