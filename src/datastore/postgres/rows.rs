//! Rows returned by the hand-built listing statements, matched to columns by name.
use crate::datastore::query::{BuiltQuery, SqlParam};
use crate::datastore::structs::{CommentView, PostContent, PostView, UserSummary};
use chrono::{offset::Utc, DateTime};
use diesel::{
    deserialize::QueryableByName,
    pg::{Pg, PgConnection},
    query_builder::{AstPass, QueryFragment, QueryId},
    result::Error as DieselError,
    sql_types::{Array, BigInt, Integer, Nullable, Text, Timestamptz},
    Connection, QueryResult,
};

/// A built query, run by Diesel with each parameter bound in placeholder order.
#[derive(Debug, Clone)]
pub struct ListingStatement(pub BuiltQuery);

impl ListingStatement {
    pub fn load<R: QueryableByName<Pg>>(&self, conn: &PgConnection) -> QueryResult<Vec<R>> {
        conn.query_by_name(self)
    }

    /// Run a `SELECT COUNT(*) AS total` statement.
    pub fn total(&self, conn: &PgConnection) -> QueryResult<i64> {
        self.load::<TotalRow>(conn)?
            .into_iter()
            .next()
            .map(|row| row.total)
            .ok_or(DieselError::NotFound)
    }
}

// The SQL text changes with the filters, so the statement has no static ID.
impl QueryId for ListingStatement {
    type QueryId = ();
    const HAS_STATIC_QUERY_ID: bool = false;
}

impl QueryFragment<Pg> for ListingStatement {
    fn walk_ast(&self, mut out: AstPass<Pg>) -> QueryResult<()> {
        out.push_sql(&self.0.sql);
        for param in &self.0.params {
            match param {
                SqlParam::Integer(v) => out.push_bind_param::<Integer, _>(v)?,
                SqlParam::BigInt(v) => out.push_bind_param::<BigInt, _>(v)?,
                SqlParam::Text(v) => out.push_bind_param::<Text, _>(v)?,
                SqlParam::IntegerArray(v) => out.push_bind_param::<Array<Integer>, _>(v)?,
            }
        }
        Ok(())
    }
}

#[derive(QueryableByName, Debug)]
pub struct TotalRow {
    #[sql_type = "BigInt"]
    pub total: i64,
}

#[derive(QueryableByName, Debug)]
pub struct PostRow {
    #[sql_type = "Integer"]
    pub id: i32,
    #[sql_type = "Text"]
    pub html: String,
    #[sql_type = "Array<Text>"]
    pub tags: Vec<String>,
    #[sql_type = "Timestamptz"]
    pub created_at: DateTime<Utc>,
    #[sql_type = "Integer"]
    pub creator_id: i32,
    #[sql_type = "Text"]
    pub creator_name: String,
    #[sql_type = "Nullable<Text>"]
    pub creator_image_url: Option<String>,
    #[sql_type = "Integer"]
    pub creator_friend_count: i32,
    #[sql_type = "Timestamptz"]
    pub creator_created_at: DateTime<Utc>,
}

impl From<PostRow> for PostView {
    fn from(row: PostRow) -> Self {
        PostView {
            post_id: row.id.to_string(),
            post: PostContent {
                post_in_html: row.html,
                tags: row.tags,
                created_at: row.created_at,
            },
            comments: Vec::new(),
            creator: UserSummary {
                user_id: row.creator_id.to_string(),
                name: row.creator_name,
                image_url: row.creator_image_url,
                friend_count: row.creator_friend_count,
                created_at: row.creator_created_at,
            },
        }
    }
}

#[derive(QueryableByName, Debug)]
pub struct CommentRow {
    #[sql_type = "Integer"]
    pub post_id: i32,
    #[sql_type = "Text"]
    pub comment: String,
    #[sql_type = "Timestamptz"]
    pub created_at: DateTime<Utc>,
    #[sql_type = "Integer"]
    pub creator_id: i32,
    #[sql_type = "Text"]
    pub creator_name: String,
    #[sql_type = "Nullable<Text>"]
    pub creator_image_url: Option<String>,
    #[sql_type = "Integer"]
    pub creator_friend_count: i32,
    #[sql_type = "Timestamptz"]
    pub creator_created_at: DateTime<Utc>,
}

impl From<CommentRow> for CommentView {
    fn from(row: CommentRow) -> Self {
        CommentView {
            comment: row.comment,
            created_at: row.created_at,
            creator: UserSummary {
                user_id: row.creator_id.to_string(),
                name: row.creator_name,
                image_url: row.creator_image_url,
                friend_count: row.creator_friend_count,
                created_at: row.creator_created_at,
            },
        }
    }
}

#[derive(QueryableByName, Debug)]
pub struct FriendRow {
    #[sql_type = "Integer"]
    pub id: i32,
    #[sql_type = "Text"]
    pub name: String,
    #[sql_type = "Nullable<Text>"]
    pub image_url: Option<String>,
    #[sql_type = "Integer"]
    pub friend_count: i32,
    #[sql_type = "Timestamptz"]
    pub created_at: DateTime<Utc>,
}

impl From<FriendRow> for UserSummary {
    fn from(row: FriendRow) -> Self {
        UserSummary {
            user_id: row.id.to_string(),
            name: row.name,
            image_url: row.image_url,
            friend_count: row.friend_count,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datastore::filters::{FriendFilters, PostFilters};
    use crate::datastore::postgres::listing;
    use crate::datastore::query::Page;
    use diesel::debug_query;

    #[test]
    fn test_params_bind_in_placeholder_order() {
        let queries = listing::posts(&PostFilters {
            search: Some("hi".to_owned()),
            tags: vec!["rust".to_owned()],
            page: Page { limit: 5, offset: 0 },
        });
        let page = debug_query::<Pg, _>(&ListingStatement(queries.page)).to_string();
        assert!(
            page.contains("WHERE p.html LIKE $1 AND $2 = ANY(p.tags)"),
            "{}",
            page
        );
        assert!(page.ends_with(r#" -- binds: ["%hi%", "rust", 5, 0]"#), "{}", page);

        let count = debug_query::<Pg, _>(&ListingStatement(queries.count)).to_string();
        assert!(count.ends_with(r#" -- binds: ["%hi%", "rust"]"#), "{}", count);
    }

    #[test]
    fn test_friend_params_bind_in_placeholder_order() {
        let queries = listing::friends(
            9,
            &FriendFilters {
                only_friend: true,
                search: Some("ann".to_owned()),
                ..Default::default()
            },
        );
        let page = debug_query::<Pg, _>(&ListingStatement(queries.page)).to_string();
        assert!(
            page.ends_with(r#" -- binds: [9, 9, 9, "%ann%", 10, 0]"#),
            "{}",
            page
        );
    }

    #[test]
    fn test_post_ids_bind_as_one_array() {
        let query = listing::comments_for_posts(vec![4, 2]);
        let rendered = debug_query::<Pg, _>(&ListingStatement(query)).to_string();
        assert!(rendered.ends_with(" -- binds: [[4, 2]]"), "{}", rendered);
    }
}
