mod errors;
mod friend_store;
pub mod listing;
mod post_store;
mod rows;
mod user_store;

use crate::config::Config;
use crate::datastore::{
    filters::{FriendFilters, PostFilters},
    structs::{
        Account, Comment, Listing, NewComment, NewCredential, NewPost, NewUser, Post, PostView,
        UserSummary,
    },
    Datastore,
};
use crate::twoface::Fallible;
use async_trait::async_trait;
use diesel::{
    pg::PgConnection,
    r2d2::{ConnectionManager, Pool},
};
use prometheus::{
    core::{Collector, Desc},
    proto::MetricFamily,
    IntGauge, Opts,
};
use std::time::Duration;

pub struct Dsn {
    secret: String,
}

impl Dsn {
    pub fn new(config: &Config) -> Self {
        Dsn {
            secret: config.db_dsn.clone(),
        }
    }
}

impl From<Dsn> for String {
    fn from(dsn: Dsn) -> String {
        dsn.secret
    }
}

/// An implementation of `Datastore` backed by Postgres
#[derive(Clone)]
pub struct PostgresStore {
    pool: Pool<ConnectionManager<PgConnection>>,
    idle_conns: IntGauge,
    conns: IntGauge,
}

impl PostgresStore {
    pub fn new(
        dsn: Dsn,
        max_pool_size: u32,
        conn_timeout: Duration,
    ) -> Result<Self, anyhow::Error> {
        let manager = ConnectionManager::<PgConnection>::new(dsn);
        let pool = Pool::builder()
            .max_size(max_pool_size)
            .connection_timeout(conn_timeout)
            .build(manager)?;
        let idle_conns = IntGauge::with_opts(Opts::new(
            "socialmedia_db_connections_idle",
            "How many DB connections are currently idle",
        ))?;
        let conns = IntGauge::with_opts(Opts::new(
            "socialmedia_db_connections",
            "How many DB connections are open",
        ))?;
        Ok(Self {
            pool,
            idle_conns,
            conns,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, anyhow::Error> {
        Self::new(
            Dsn::new(config),
            config.db_pool_size,
            Duration::from_secs(config.db_connection_timeout),
        )
    }
}

impl Collector for PostgresStore {
    fn desc(&self) -> Vec<&Desc> {
        let mut descs = self.idle_conns.desc();
        descs.extend(self.conns.desc());
        descs
    }

    fn collect(&self) -> Vec<MetricFamily> {
        self.idle_conns
            .set(self.pool.state().idle_connections as i64);
        self.conns.set(self.pool.state().connections as i64);
        let mut metrics = self.idle_conns.collect();
        metrics.extend(self.conns.collect());
        metrics
    }
}

// The operations themselves live in the *_store modules, grouped by the tables they touch.
#[async_trait]
impl Datastore for PostgresStore {
    async fn create_user(&self, new_user: NewUser, credential: NewCredential) -> Fallible<Account> {
        self.insert_user(new_user, credential).await
    }

    async fn find_account(&self, credential_value: String) -> Fallible<Option<Account>> {
        self.account_by_credential(credential_value).await
    }

    async fn link_credential(&self, user_id: i32, credential: NewCredential) -> Fallible<()> {
        self.insert_credential(user_id, credential).await
    }

    async fn update_profile(&self, user_id: i32, name: String, image_url: String) -> Fallible<()> {
        self.set_profile(user_id, name, image_url).await
    }

    async fn add_friend(&self, user_id: i32, friend_id: i32) -> Fallible<()> {
        self.insert_relationship(user_id, friend_id).await
    }

    async fn delete_friend(&self, user_id: i32, friend_id: i32) -> Fallible<()> {
        self.delete_relationship(user_id, friend_id).await
    }

    async fn list_friends(
        &self,
        user_id: i32,
        filters: FriendFilters,
    ) -> Fallible<Listing<UserSummary>> {
        self.friend_listing(user_id, filters).await
    }

    async fn new_post(&self, new_post: NewPost) -> Fallible<Post> {
        self.insert_post(new_post).await
    }

    async fn new_comment(&self, new_comment: NewComment) -> Fallible<Comment> {
        self.insert_comment(new_comment).await
    }

    async fn list_posts(&self, filters: PostFilters) -> Fallible<Listing<PostView>> {
        self.post_listing(filters).await
    }
}
