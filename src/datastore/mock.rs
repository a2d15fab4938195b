use crate::datastore::{
    filters::{Direction, FriendFilters, PostFilters, SortBy},
    grouping::Grouper,
    structs::{
        Account, Comment, CommentView, Credential, Listing, NewComment, NewCredential, NewPost,
        NewUser, Post, PostContent, PostView, User, UserSummary,
    },
    Datastore, ALREADY_FRIENDS, CREDENTIAL_TAKEN, CREDENTIAL_TYPE_LINKED, NOT_FRIENDS,
    POST_NOT_FOUND, SELF_FRIEND, USER_NOT_FOUND,
};
use crate::twoface::Fallible;
use async_trait::async_trait;
use chrono::{offset::Utc, DateTime, Duration};
use std::convert::TryFrom;
use std::sync::{Arc, Mutex};

#[derive(Default, Debug)]
struct Tables {
    users: Vec<User>,
    credentials: Vec<Credential>,
    relationships: Vec<(i32, i32)>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    /// Every inserted row gets a distinct, increasing timestamp so orderings are deterministic.
    ticks: i64,
}

impl Tables {
    fn now(&mut self) -> DateTime<Utc> {
        self.ticks += 1;
        DateTime::<Utc>::from(std::time::UNIX_EPOCH) + Duration::seconds(self.ticks)
    }

    fn user(&self, id: i32) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn summary(&self, id: i32) -> Option<UserSummary> {
        self.user(id).map(UserSummary::from)
    }

    fn are_friends(&self, a: i32, b: i32) -> bool {
        self.relationships
            .iter()
            .any(|&(first, second)| (first, second) == (a, b) || (first, second) == (b, a))
    }

    fn bump_friend_counts(&mut self, ids: [i32; 2], delta: i32) {
        for user in self.users.iter_mut().filter(|u| ids.contains(&u.id)) {
            user.friend_count += delta;
        }
    }
}

/// A mock implementation of datastore::Datastore
#[derive(Clone, Default, Debug)]
pub struct Client {
    tables: Arc<Mutex<Tables>>,
}

fn page_of<T>(items: Vec<T>, offset: i64, limit: i64) -> Vec<T> {
    let offset = usize::try_from(offset).unwrap_or(usize::MAX);
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    items.into_iter().skip(offset).take(limit).collect()
}

/// Does this post match all specified filters? Mirrors the SQL the posts listing generates.
fn post_matches(post: &Post, filters: &PostFilters) -> bool {
    if let Some(search) = &filters.search {
        if !post.html.contains(search.as_str()) {
            return false;
        }
    }
    filters.tags.iter().all(|tag| post.tags.contains(tag))
}

fn post_view(post: &Post, creator: UserSummary) -> PostView {
    PostView {
        post_id: post.id.to_string(),
        post: PostContent {
            post_in_html: post.html.clone(),
            tags: post.tags.clone(),
            created_at: post.created_at,
        },
        comments: Vec::new(),
        creator,
    }
}

#[async_trait]
impl Datastore for Client {
    async fn create_user(&self, new_user: NewUser, credential: NewCredential) -> Fallible<Account> {
        let mut tables = self.tables.lock().unwrap();
        if tables
            .credentials
            .iter()
            .any(|c| c.credential_value == credential.value)
        {
            return Err(CREDENTIAL_TAKEN.into());
        }
        let user = User {
            id: tables.users.len() as i32 + 1,
            name: new_user.name,
            password: new_user.password,
            image_url: None,
            friend_count: 0,
            created_at: tables.now(),
        };
        let credential = Credential {
            id: tables.credentials.len() as i32 + 1,
            user_id: user.id,
            credential_type: credential.credential_type,
            credential_value: credential.value,
        };
        tables.users.push(user.clone());
        tables.credentials.push(credential.clone());
        Ok(Account {
            user,
            credentials: vec![credential],
        })
    }

    async fn find_account(&self, credential_value: String) -> Fallible<Option<Account>> {
        let tables = self.tables.lock().unwrap();
        let user_id = tables
            .credentials
            .iter()
            .find(|c| c.credential_value == credential_value)
            .map(|c| c.user_id);
        guard!(let Some(user) = user_id.and_then(|id| tables.user(id)) else {
            return Ok(None)
        });
        let credentials = tables
            .credentials
            .iter()
            .filter(|c| c.user_id == user.id)
            .cloned()
            .collect();
        Ok(Some(Account {
            user: user.clone(),
            credentials,
        }))
    }

    async fn link_credential(&self, user_id: i32, credential: NewCredential) -> Fallible<()> {
        let mut tables = self.tables.lock().unwrap();
        if tables
            .credentials
            .iter()
            .any(|c| c.user_id == user_id && c.credential_type == credential.credential_type)
        {
            return Err(CREDENTIAL_TYPE_LINKED.into());
        }
        if tables
            .credentials
            .iter()
            .any(|c| c.credential_value == credential.value)
        {
            return Err(CREDENTIAL_TAKEN.into());
        }
        let id = tables.credentials.len() as i32 + 1;
        tables.credentials.push(Credential {
            id,
            user_id,
            credential_type: credential.credential_type,
            credential_value: credential.value,
        });
        Ok(())
    }

    async fn update_profile(&self, user_id: i32, name: String, image_url: String) -> Fallible<()> {
        let mut tables = self.tables.lock().unwrap();
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(USER_NOT_FOUND)?;
        user.name = name;
        user.image_url = Some(image_url);
        Ok(())
    }

    async fn add_friend(&self, user_id: i32, friend_id: i32) -> Fallible<()> {
        if user_id == friend_id {
            return Err(SELF_FRIEND.into());
        }
        let mut tables = self.tables.lock().unwrap();
        if tables.user(friend_id).is_none() {
            return Err(USER_NOT_FOUND.into());
        }
        if tables.are_friends(user_id, friend_id) {
            return Err(ALREADY_FRIENDS.into());
        }
        tables.relationships.push((friend_id, user_id));
        tables.bump_friend_counts([user_id, friend_id], 1);
        Ok(())
    }

    async fn delete_friend(&self, user_id: i32, friend_id: i32) -> Fallible<()> {
        let mut tables = self.tables.lock().unwrap();
        if !tables.are_friends(user_id, friend_id) {
            return Err(NOT_FRIENDS.into());
        }
        tables
            .relationships
            .retain(|&edge| edge != (user_id, friend_id) && edge != (friend_id, user_id));
        tables.bump_friend_counts([user_id, friend_id], -1);
        Ok(())
    }

    async fn list_friends(
        &self,
        user_id: i32,
        filters: FriendFilters,
    ) -> Fallible<Listing<UserSummary>> {
        let tables = self.tables.lock().unwrap();
        let mut users: Vec<&User> = tables
            .users
            .iter()
            .filter(|u| {
                !filters.only_friend || (u.id != user_id && tables.are_friends(u.id, user_id))
            })
            .filter(|u| match &filters.search {
                Some(search) => u.name.contains(search.as_str()),
                None => true,
            })
            .collect();
        users.sort_by(|a, b| match filters.sort_by {
            SortBy::CreatedAt => (a.created_at, a.id).cmp(&(b.created_at, b.id)),
            SortBy::FriendCount => (a.friend_count, a.id).cmp(&(b.friend_count, b.id)),
        });
        if filters.order_by == Direction::Desc {
            users.reverse();
        }
        let total = users.len() as i64;
        let data = page_of(users, filters.page.offset, filters.page.limit)
            .into_iter()
            .map(UserSummary::from)
            .collect();
        Ok(Listing::new(data, filters.page, total))
    }

    async fn new_post(&self, new_post: NewPost) -> Fallible<Post> {
        let mut tables = self.tables.lock().unwrap();
        let post = Post {
            id: tables.posts.len() as i32 + 1,
            html: new_post.html,
            tags: new_post.tags,
            user_id: new_post.user_id,
            created_at: tables.now(),
        };
        tables.posts.push(post.clone());
        Ok(post)
    }

    async fn new_comment(&self, new_comment: NewComment) -> Fallible<Comment> {
        let mut tables = self.tables.lock().unwrap();
        if !tables.posts.iter().any(|p| p.id == new_comment.post_id) {
            return Err(POST_NOT_FOUND.into());
        }
        let comment = Comment {
            id: tables.comments.len() as i32 + 1,
            comment: new_comment.comment,
            post_id: new_comment.post_id,
            user_id: new_comment.user_id,
            created_at: tables.now(),
        };
        tables.comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_posts(&self, filters: PostFilters) -> Fallible<Listing<PostView>> {
        let tables = self.tables.lock().unwrap();
        let mut posts: Vec<&Post> = tables
            .posts
            .iter()
            .filter(|p| post_matches(p, &filters))
            .collect();
        posts.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        let total = posts.len() as i64;

        let mut grouper = Grouper::new();
        for post in page_of(posts, filters.page.offset, filters.page.limit) {
            let creator = tables.summary(post.user_id).ok_or(USER_NOT_FOUND)?;
            grouper.push_parent(post.id, post_view(post, creator));
        }
        for comment in &tables.comments {
            let creator = tables.summary(comment.user_id).ok_or(USER_NOT_FOUND)?;
            grouper.push_child(
                &comment.post_id,
                CommentView {
                    comment: comment.comment.clone(),
                    creator,
                    created_at: comment.created_at,
                },
            );
        }

        let data = grouper
            .finish()
            .into_iter()
            .map(|group| group.parent.with_comments(group.children))
            .collect();
        Ok(Listing::new(data, filters.page, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(html: &str, tags: &[&str]) -> Post {
        Post {
            id: 1,
            html: html.to_owned(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            user_id: 1,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_post_matches() {
        let post = post("<p>hi there</p>", &["rust", "sql"]);

        assert!(post_matches(&post, &PostFilters::default()));
        assert!(post_matches(
            &post,
            &PostFilters {
                search: Some("hi".to_owned()),
                ..Default::default()
            }
        ));
        assert!(post_matches(
            &post,
            &PostFilters {
                tags: vec!["rust".to_owned(), "sql".to_owned()],
                ..Default::default()
            }
        ));
        assert!(!post_matches(
            &post,
            &PostFilters {
                tags: vec!["rust".to_owned(), "go".to_owned()],
                ..Default::default()
            }
        ));
        assert!(!post_matches(
            &post,
            &PostFilters {
                search: Some("bye".to_owned()),
                ..Default::default()
            }
        ));
    }

    #[test]
    fn test_page_of_saturates_large_offsets() {
        assert_eq!(page_of(vec![1, 2, 3], 1, 10), vec![2, 3]);
        assert_eq!(page_of(vec![1, 2, 3], i64::MAX, 10), Vec::<i32>::new());
        assert_eq!(page_of(vec![1, 2, 3], 0, i64::MAX), vec![1, 2, 3]);
    }
}
