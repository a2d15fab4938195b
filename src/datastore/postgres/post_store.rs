use crate::datastore::{
    filters::PostFilters,
    grouping::Grouper,
    postgres::{
        errors::During,
        listing,
        rows::{CommentRow, ListingStatement, PostRow},
        PostgresStore,
    },
    structs::{Comment, CommentView, Listing, NewComment, NewPost, Post, PostView},
    tables::{comments, posts},
    POST_NOT_FOUND,
};
use crate::twoface::{describe_diesel, BlockingResp, ExternalError, Fallible, TfError};
use actix_web::web::block;
use diesel::query_dsl::RunQueryDsl;
use tracing::debug;

impl PostgresStore {
    pub async fn insert_post(&self, new_post: NewPost) -> Fallible<Post> {
        let conn = self.pool.get()?;
        let post = block(move || {
            diesel::insert_into(posts::table)
                .values(&new_post)
                .get_result::<Post>(&conn)
                .during("failed to create post")
        })
        .await
        .to_resp()?;
        Ok(post)
    }

    pub async fn insert_comment(&self, new_comment: NewComment) -> Fallible<Comment> {
        let conn = self.pool.get()?;
        let comment = block(move || {
            diesel::insert_into(comments::table)
                .values(&new_comment)
                .get_result::<Comment>(&conn)
                .map_err(|e| describe_diesel(e, ExternalError::default(), POST_NOT_FOUND))
                .during("failed to create comment")
        })
        .await
        .to_resp()?;
        Ok(comment)
    }

    /// One page of posts, newest first, each with all of its comments.
    pub async fn post_listing(&self, filters: PostFilters) -> Fallible<Listing<PostView>> {
        let conn = self.pool.get()?;
        let page = filters.page;
        let queries = listing::posts(&filters);
        debug!(
            fragments = ?queries.page.fragments,
            params = ?queries.page.params,
            "listing posts"
        );
        let listing = block(move || -> Result<_, TfError> {
            let rows: Vec<PostRow> = ListingStatement(queries.page)
                .load(&conn)
                .during("failed to get posts")?;

            let post_ids: Vec<i32> = rows.iter().map(|row| row.id).collect();
            let mut grouper = Grouper::new();
            for row in rows {
                grouper.push_parent(row.id, PostView::from(row));
            }

            if !post_ids.is_empty() {
                let comments: Vec<CommentRow> =
                    ListingStatement(listing::comments_for_posts(post_ids))
                        .load(&conn)
                        .during("failed to get comments")?;
                for comment in comments {
                    let post_id = comment.post_id;
                    grouper.push_child(&post_id, CommentView::from(comment));
                }
            }

            let total = ListingStatement(queries.count)
                .total(&conn)
                .during("failed to count posts")?;

            let data = grouper
                .finish()
                .into_iter()
                .map(|group| group.parent.with_comments(group.children))
                .collect();
            Ok(Listing::new(data, page, total))
        })
        .await
        .to_resp()?;
        Ok(listing)
    }
}
