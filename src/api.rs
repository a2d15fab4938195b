use crate::auth::validator;
use crate::datastore::Datastore;
use crate::metrics;
use crate::twoface::Fallible;
use actix_web::web;
use actix_web_httpauth::middleware::HttpAuthentication;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// Builds the whole `/v1` API over a mock datastore.
#[cfg(test)]
macro_rules! test_app {
    ($ds:expr, $auth:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .data(crate::api::State {
                    ds: std::sync::Arc::new($ds),
                })
                .data($auth)
                .service(
                    actix_web::web::scope("/v1")
                        .configure(crate::api::configure::<crate::datastore::mock::Client>),
                ),
        )
        .await
    };
}

pub mod friend;
pub mod post;
pub mod user;
mod validation;

pub struct State<DS> {
    pub ds: Arc<DS>,
}

// Derive(Clone) would demand DS: Clone, but only the Arc is cloned.
impl<DS> Clone for State<DS> {
    fn clone(&self) -> Self {
        Self {
            ds: Arc::clone(&self.ds),
        }
    }
}

/// Body of responses which have nothing to report except success.
#[derive(Serialize, Debug)]
pub struct Message {
    pub message: &'static str,
}

/// Every route, to be mounted under `/v1`.
pub fn configure<DS: Datastore + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/user")
            .route("/register", web::post().to(user::register::<DS>))
            .route("/login", web::post().to(user::login::<DS>))
            .service(
                web::scope("/link")
                    .wrap(HttpAuthentication::bearer(validator))
                    .route("", web::post().to(user::link_email::<DS>))
                    .route("/phone", web::post().to(user::link_phone::<DS>)),
            )
            .service(
                web::resource("")
                    .wrap(HttpAuthentication::bearer(validator))
                    .route(web::patch().to(user::update_profile::<DS>)),
            ),
    )
    .service(
        web::scope("/friend")
            .wrap(HttpAuthentication::bearer(validator))
            .route("", web::get().to(friend::list_friends::<DS>))
            .route("", web::post().to(friend::add_friend::<DS>))
            .route("", web::delete().to(friend::delete_friend::<DS>)),
    )
    .service(
        web::scope("/post")
            .wrap(HttpAuthentication::bearer(validator))
            .route("", web::get().to(post::list_posts::<DS>))
            .route("", web::post().to(post::write_post::<DS>))
            .route("/comment", web::post().to(post::write_comment::<DS>)),
    );
}

/// Execute the closure, then log its operational metrics, e.g. time taken, whether it returned Ok/Err, etc.
async fn observe<F, Fut, R>(name: &'static str, f: F) -> Fallible<R>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Fallible<R>>,
{
    let start = Instant::now();
    let return_val = f().await;
    let duration = start.elapsed();
    metrics::HANDLER_SECS
        .with_label_values(&[name])
        .observe(duration.as_secs_f64());
    metrics::RESPONSES
        .with_label_values(&[name, variant_name(&return_val)])
        .inc();
    return_val
}

fn variant_name<T, E>(result: &Result<T, E>) -> &'static str {
    if result.is_ok() {
        "ok"
    } else {
        "err"
    }
}
