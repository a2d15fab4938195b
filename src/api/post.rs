use crate::api::{observe, validation, Message, State};
use crate::auth::AuthUser;
use crate::datastore::{
    filters::{FilterSet, PostFilters},
    structs::{Listing, NewComment, NewPost, PostView},
    Datastore, POST_NOT_FOUND,
};
use crate::twoface::Fallible;
use actix_web::web;
use serde::Deserialize;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct WritePostBody {
    pub post_in_html: String,
    pub tags: Vec<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct WriteCommentBody {
    /// Numeric, but sent as a string.
    pub post_id: String,
    pub comment: String,
}

pub async fn list_posts<DS: Datastore>(
    state: web::Data<State<DS>>,
    _user: AuthUser,
    filters: FilterSet,
) -> Fallible<web::Json<Listing<PostView>>> {
    observe("list_posts", || async {
        let filters = PostFilters::from_filter_set(&filters)?;
        let listing = state.ds.list_posts(filters).await?;
        Ok(web::Json(listing))
    })
    .await
}

pub async fn write_post<DS: Datastore>(
    state: web::Data<State<DS>>,
    user: AuthUser,
    body: web::Json<WritePostBody>,
) -> Fallible<web::Json<Message>> {
    observe("write_post", || async {
        let body = body.into_inner();
        validation::length(&body.post_in_html, 2, 500, validation::INVALID_POST)?;
        validation::tags(&body.tags)?;
        let new_post = NewPost {
            html: body.post_in_html,
            tags: body.tags,
            user_id: user.user_id,
        };
        state.ds.new_post(new_post).await?;
        Ok(web::Json(Message {
            message: "post created",
        }))
    })
    .await
}

pub async fn write_comment<DS: Datastore>(
    state: web::Data<State<DS>>,
    user: AuthUser,
    body: web::Json<WriteCommentBody>,
) -> Fallible<web::Json<Message>> {
    observe("write_comment", || async {
        let body = body.into_inner();
        validation::length(&body.comment, 2, 500, validation::INVALID_COMMENT)?;
        let post_id: i32 = body.post_id.parse().map_err(|_| POST_NOT_FOUND)?;
        let new_comment = NewComment {
            comment: body.comment,
            post_id,
            user_id: user.user_id,
        };
        state.ds.new_comment(new_comment).await?;
        Ok(web::Json(Message {
            message: "comment created",
        }))
    })
    .await
}
