use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::middleware::ErrorHandlers;
use actix_web::{App, HttpServer, web};
use mongodb::bson::oid::ObjectId;

use social_feed::client::{
    ApiError, CommentSection, FeedEngine, HttpSocialApi, LikeLedger, LikeState, LikersCache,
    SocialApi, Target,
};
use social_feed::config::{AuthConfig, FeedConfig};
use social_feed::database::{MemoryStore, Store};
use social_feed::middleware::auth::create_token;
use social_feed::middleware::error_handler::handle_error;
use social_feed::middleware::not_found::not_found;
use social_feed::post::model::CreatePostRequest;
use social_feed::post::service::PostService;
use social_feed::router::index::{register_services, routes};
use social_feed::user::model::UserSummary;

const SECRET: &str = "roundtrip-secret";

fn auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: SECRET.into(),
    }
}

async fn seed(store: &Arc<MemoryStore>, posts: usize) -> ObjectId {
    let user = ObjectId::new();
    store
        .insert_user(UserSummary {
            id: user,
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
        })
        .await;

    let service = PostService::new(store.clone(), FeedConfig::default());
    for n in 1..=posts {
        service
            .create_post(
                &user,
                CreatePostRequest {
                    content: format!("post {}", n),
                    image_url: None,
                    is_public: None,
                },
            )
            .await
            .unwrap();
    }
    user
}

#[actix_web::test]
async fn client_engine_against_live_server() {
    let store = Arc::new(MemoryStore::new());
    let user = seed(&store, 12).await;

    let server_store: Arc<dyn Store> = store.clone();
    let server = HttpServer::new(move || {
        let store = server_store.clone();
        App::new()
            .wrap(
                ErrorHandlers::new()
                    .handler(StatusCode::NOT_FOUND, not_found)
                    .default_handler(handle_error),
            )
            .app_data(web::Data::new(auth_config()))
            .configure(move |cfg| {
                register_services(cfg, store, FeedConfig::default());
                routes(cfg);
            })
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();
    let addr = server.addrs()[0];
    let server = server.run();
    let handle = server.handle();
    actix_web::rt::spawn(server);

    let token = create_token(&user.to_hex(), &auth_config()).unwrap();
    let api = HttpSocialApi::new(format!("http://{}", addr), token).unwrap();

    // Pagination: 5 + 5 + 2
    let mut feed = FeedEngine::new(5);
    assert!(feed.refresh(&api).await);
    assert_eq!(feed.posts().len(), 5);
    assert_eq!(feed.posts()[0].content, "post 12");
    assert!(feed.load_more(&api).await);
    assert!(feed.load_more(&api).await);
    assert_eq!(feed.posts().len(), 12);
    assert!(!feed.has_more());
    assert!(!feed.load_more(&api).await);
    assert!(feed.last_error().is_none());

    // Optimistic likes, including a like the server already has
    let first = Target::Post(feed.posts()[0].id.clone());
    let mut ledger = LikeLedger::new();
    ledger.track_posts(feed.posts());
    assert_eq!(
        ledger.toggle(&api, &first).await,
        Some(LikeState { liked: true, count: 1 })
    );

    let mut stale_tab = LikeLedger::new();
    stale_tab.track_posts(feed.posts());
    assert_eq!(stale_tab.state(&first), LikeState { liked: false, count: 0 });
    assert_eq!(
        stale_tab.toggle(&api, &first).await,
        Some(LikeState { liked: true, count: 1 })
    );

    let missing = Target::Post(ObjectId::new().to_hex());
    ledger.track(missing.clone(), LikeState { liked: false, count: 4 });
    assert_eq!(
        ledger.toggle(&api, &missing).await,
        Some(LikeState { liked: false, count: 4 })
    );

    // Likers
    let mut likers = LikersCache::new();
    let list = likers.open(&api, &first).await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(
        list[0].user.as_ref().map(|u| u.first_name.as_str()),
        Some("Ada")
    );

    // Comments and a reply
    let mut section = CommentSection::for_post(&feed.posts()[0]);
    section.toggle_and_load(&api).await;
    assert_eq!(section.comments().map(|c| c.len()), Some(0));

    let top = section.submit(&api, "first!").await.unwrap().unwrap();
    section.reply_to(Some(top.id.clone()));
    let reply = section.submit(&api, "welcome").await.unwrap().unwrap();
    assert_eq!(reply.parent_id.as_deref(), Some(top.id.as_str()));
    assert_eq!(section.comment_count(), 2);
    assert!(feed.sync_comment_count(&section));
    assert_eq!(feed.posts()[0].comment_count, 2);

    let threads = section.threads();
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].comment.id, top.id);
    assert_eq!(threads[0].replies.len(), 1);

    let comment_target = Target::Comment(reply.id.clone());
    assert_eq!(
        ledger.toggle(&api, &comment_target).await,
        Some(LikeState { liked: true, count: 1 })
    );

    // Refresh picks up the server-side counts
    assert!(feed.refresh(&api).await);
    assert_eq!(feed.posts()[0].like_count, 1);
    assert_eq!(feed.posts()[0].comment_count, 2);
    assert!(feed.posts()[0].liked_by_me);

    let intruder = HttpSocialApi::new(format!("http://{}", addr), "garbage").unwrap();
    assert_eq!(
        intruder.fetch_feed(None, 5).await.unwrap_err(),
        ApiError::Unauthorized
    );

    handle.stop(true).await;
}
