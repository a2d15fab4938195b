use crate::datastore::{
    filters::FriendFilters,
    postgres::{
        errors::During,
        listing,
        rows::{FriendRow, ListingStatement},
        PostgresStore,
    },
    structs::{Listing, UserSummary},
    tables::{relationships, users},
    ALREADY_FRIENDS, NOT_FRIENDS, SELF_FRIEND, USER_NOT_FOUND,
};
use crate::twoface::{describe_diesel, BlockingResp, Fallible, TfError};
use actix_web::web::block;
use diesel::{
    dsl::exists,
    expression_methods::BoolExpressionMethods,
    query_dsl::{QueryDsl, RunQueryDsl},
    Connection, ExpressionMethods,
};
use tracing::debug;

impl PostgresStore {
    /// Store one edge between the two users and bump both of their friend counts.
    pub async fn insert_relationship(&self, user_id: i32, friend_id: i32) -> Fallible<()> {
        if user_id == friend_id {
            return Err(SELF_FRIEND.into());
        }
        let conn = self.pool.get()?;
        block(move || {
            conn.transaction::<_, TfError, _>(|| {
                let friend_exists: bool = diesel::select(exists(users::table.find(friend_id)))
                    .get_result(&conn)
                    .during("failed to check user exists")?;
                if !friend_exists {
                    return Err(USER_NOT_FOUND.into());
                }

                let already_friends: bool = diesel::select(exists(relationships::table.filter(
                    relationships::user_first_id
                        .eq(user_id)
                        .and(relationships::user_second_id.eq(friend_id))
                        .or(relationships::user_first_id
                            .eq(friend_id)
                            .and(relationships::user_second_id.eq(user_id))),
                )))
                .get_result(&conn)
                .during("failed to check relationship")?;
                if already_friends {
                    return Err(ALREADY_FRIENDS.into());
                }

                diesel::insert_into(relationships::table)
                    .values((
                        relationships::user_first_id.eq(friend_id),
                        relationships::user_second_id.eq(user_id),
                    ))
                    .execute(&conn)
                    .map_err(|e| describe_diesel(e, ALREADY_FRIENDS, USER_NOT_FOUND))
                    .during("failed to add relationship")?;
                diesel::update(users::table.filter(users::id.eq_any(vec![user_id, friend_id])))
                    .set(users::friend_count.eq(users::friend_count + 1))
                    .execute(&conn)
                    .during("failed to update friend counts")?;
                Ok(())
            })
        })
        .await
        .to_resp()
    }

    /// Remove the edge between the two users, whichever way round it was stored.
    pub async fn delete_relationship(&self, user_id: i32, friend_id: i32) -> Fallible<()> {
        let conn = self.pool.get()?;
        block(move || {
            conn.transaction::<_, TfError, _>(|| {
                let deleted = diesel::delete(relationships::table.filter(
                    relationships::user_first_id
                        .eq(user_id)
                        .and(relationships::user_second_id.eq(friend_id))
                        .or(relationships::user_first_id
                            .eq(friend_id)
                            .and(relationships::user_second_id.eq(user_id))),
                ))
                .execute(&conn)
                .during("failed to delete relationship")?;
                if deleted == 0 {
                    return Err(NOT_FRIENDS.into());
                }

                diesel::update(users::table.filter(users::id.eq_any(vec![user_id, friend_id])))
                    .set(users::friend_count.eq(users::friend_count - 1))
                    .execute(&conn)
                    .during("failed to update friend counts")?;
                Ok(())
            })
        })
        .await
        .to_resp()
    }

    pub async fn friend_listing(
        &self,
        user_id: i32,
        filters: FriendFilters,
    ) -> Fallible<Listing<UserSummary>> {
        let conn = self.pool.get()?;
        let page = filters.page;
        let queries = listing::friends(user_id, &filters);
        debug!(
            fragments = ?queries.page.fragments,
            params = ?queries.page.params,
            "listing friends"
        );
        let listing = block(move || -> Result<_, TfError> {
            let rows: Vec<FriendRow> = ListingStatement(queries.page)
                .load(&conn)
                .during("failed to query friend list")?;
            let total = ListingStatement(queries.count)
                .total(&conn)
                .during("failed to count friend list")?;
            let data = rows.into_iter().map(UserSummary::from).collect();
            Ok(Listing::new(data, page, total))
        })
        .await
        .to_resp()?;
        Ok(listing)
    }
}
