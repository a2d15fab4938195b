//! SQL for the paginated posts and friends listings.
//!
//! Each listing builds its WHERE predicate once and splices it into two statements: the page
//! itself (ordered, with LIMIT/OFFSET as its last two parameters) and a count of the whole
//! filtered set. So the count's parameters are always the page's minus that trailing pair.
use crate::datastore::filters::{FriendFilters, PostFilters};
use crate::datastore::query::{like_substring, BuiltQuery, Condition, Query, WhereClause};

const POSTS_PAGE: &str = "SELECT p.id, p.html, p.tags, p.created_at, \
     u.id AS creator_id, u.name AS creator_name, u.image_url AS creator_image_url, \
     u.friend_count AS creator_friend_count, u.created_at AS creator_created_at \
     FROM posts p JOIN users u ON p.user_id = u.id";
const POSTS_COUNT: &str = "SELECT COUNT(*) AS total FROM posts p";

const COMMENTS_FOR_POSTS: &str = "SELECT c.post_id, c.comment, c.created_at, \
     u.id AS creator_id, u.name AS creator_name, u.image_url AS creator_image_url, \
     u.friend_count AS creator_friend_count, u.created_at AS creator_created_at \
     FROM comments c JOIN users u ON c.user_id = u.id \
     WHERE c.post_id = ANY(";

const FRIENDS_SOURCE: &str = "SELECT u.id, u.name, u.image_url, u.friend_count, u.created_at \
     FROM users u \
     LEFT JOIN relationships r ON u.id = r.user_first_id OR u.id = r.user_second_id";

/// The two statements behind one page of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQueries {
    pub page: BuiltQuery,
    pub count: BuiltQuery,
}

fn post_predicate(filters: &PostFilters) -> WhereClause {
    let mut clause = WhereClause::default();
    if let Some(search) = &filters.search {
        clause.and(Condition::new("p.html LIKE ").param(like_substring(search)));
    }
    for tag in &filters.tags {
        clause.and(Condition::new("").param(tag.as_str()).sql(" = ANY(p.tags)"));
    }
    clause
}

pub fn posts(filters: &PostFilters) -> ListingQueries {
    let predicate = post_predicate(filters);

    let mut page = Query::new(POSTS_PAGE);
    page.push_where(&predicate)
        .push_sql(" ORDER BY p.created_at DESC, p.id DESC")
        .push_page(filters.page);

    let mut count = Query::new(POSTS_COUNT);
    count.push_where(&predicate);

    ListingQueries {
        page: page.build(),
        count: count.build(),
    }
}

/// Comments on the given posts, oldest first.
pub fn comments_for_posts(post_ids: Vec<i32>) -> BuiltQuery {
    let mut query = Query::new(COMMENTS_FOR_POSTS);
    query
        .push_param(post_ids)
        .push_sql(") ORDER BY c.created_at ASC, c.id ASC");
    query.build()
}

fn friend_predicate(user_id: i32, filters: &FriendFilters) -> WhereClause {
    let mut clause = WhereClause::default();
    if filters.only_friend {
        clause
            .and(Condition::new("u.id <> ").param(user_id))
            .and(
                Condition::new("(r.user_first_id = ")
                    .param(user_id)
                    .sql(" OR r.user_second_id = ")
                    .param(user_id)
                    .sql(")"),
            );
    }
    if let Some(search) = &filters.search {
        clause.and(Condition::new("u.name LIKE ").param(like_substring(search)));
    }
    clause
}

/// Users joined to their relationship edges, one row per user.
fn push_friends_source(query: &mut Query, predicate: &WhereClause) {
    query
        .push_sql(FRIENDS_SOURCE)
        .push_where(predicate)
        .push_sql(" GROUP BY u.id");
}

/// The grouped statement can't take the predicate as a flat WHERE in a count, so the count wraps
/// it as a subquery instead.
pub fn friends(user_id: i32, filters: &FriendFilters) -> ListingQueries {
    let predicate = friend_predicate(user_id, filters);

    let mut page = Query::default();
    push_friends_source(&mut page, &predicate);
    page.push_sql(&format!(
        " ORDER BY {} {}, u.id {}",
        filters.sort_by.column(),
        filters.order_by.keyword(),
        filters.order_by.keyword()
    ))
    .push_page(filters.page);

    let mut count = Query::new("SELECT COUNT(*) AS total FROM (");
    push_friends_source(&mut count, &predicate);
    count.push_sql(") AS subquery");

    ListingQueries {
        page: page.build(),
        count: count.build(),
    }
}
