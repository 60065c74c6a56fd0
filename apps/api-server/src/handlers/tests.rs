use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::{App, http::StatusCode, http::header, test, web};
use async_trait::async_trait;
use serde_json::{Value, json};

use globe_core::chat::{AgentSettings, ChatService, PollSettings};
use globe_core::ports::{
    AgentDefinition, AgentError, AgentInfo, AgentMessage, AgentRun, AgentService, RunError,
    RunStatus,
};

use super::configure_routes;
use crate::middleware::functions::FunctionsPrefix;
use crate::state::AppState;

const MISSING_ID: &str = "65f1c2a0b1c2d3e4f5a6b7c8";

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .configure(configure_routes),
        )
        .await
    };
    ($state:expr, prefix = $prefix:expr) => {
        test::init_service(
            App::new()
                .wrap(FunctionsPrefix::new(Some($prefix)))
                .app_data(web::Data::new($state))
                .configure(configure_routes),
        )
        .await
    };
}

fn post_body(title: &str, published: bool, category_id: Option<&str>) -> Value {
    json!({
        "title": title,
        "content": "Body",
        "author": "Ada",
        "slug": title.to_lowercase().replace(' ', "-"),
        "tags": ["news"],
        "published": published,
        "categoryId": category_id,
    })
}

/// Agent double: one thread, runs that complete on the first poll.
#[derive(Default)]
struct EchoAgents {
    posted: Mutex<Vec<(String, String)>>,
    fail_with: Option<(String, String)>,
}

#[async_trait]
impl AgentService for EchoAgents {
    async fn get_agent(&self, agent_id: &str) -> Result<AgentInfo, AgentError> {
        Ok(AgentInfo {
            id: agent_id.to_string(),
            name: None,
            description: None,
            created_at: None,
        })
    }

    async fn create_agent(&self, _definition: &AgentDefinition) -> Result<AgentInfo, AgentError> {
        Err(AgentError::Transport("agents are preconfigured".into()))
    }

    async fn list_agents(&self) -> Result<Vec<AgentInfo>, AgentError> {
        Ok(Vec::new())
    }

    async fn get_thread(&self, thread_id: &str) -> Result<(), AgentError> {
        if thread_id == "thread_known" {
            Ok(())
        } else {
            Err(AgentError::Http {
                status: 404,
                code: None,
                message: "No thread found".into(),
                retry_after: None,
            })
        }
    }

    async fn create_thread(&self) -> Result<String, AgentError> {
        Ok("thread_new".into())
    }

    async fn post_message(
        &self,
        _thread_id: &str,
        role: &str,
        content: &str,
    ) -> Result<(), AgentError> {
        self.posted
            .lock()
            .unwrap()
            .push((role.to_string(), content.to_string()));
        Ok(())
    }

    async fn create_run(&self, _thread_id: &str, _agent_id: &str) -> Result<AgentRun, AgentError> {
        Ok(AgentRun {
            id: "run_1".into(),
            status: RunStatus::Queued,
            last_error: None,
        })
    }

    async fn get_run(&self, _thread_id: &str, run_id: &str) -> Result<AgentRun, AgentError> {
        let (status, last_error) = match &self.fail_with {
            Some((code, message)) => (
                RunStatus::Failed,
                Some(RunError {
                    code: Some(code.clone()),
                    message: message.clone(),
                }),
            ),
            None => (RunStatus::Completed, None),
        };
        Ok(AgentRun {
            id: run_id.to_string(),
            status,
            last_error,
        })
    }

    async fn list_messages(&self, _thread_id: &str) -> Result<Vec<AgentMessage>, AgentError> {
        let last = self
            .posted
            .lock()
            .unwrap()
            .last()
            .map(|(_, content)| content.clone())
            .unwrap_or_default();
        Ok(vec![
            AgentMessage {
                role: "user".into(),
                text: Some(last.clone()),
                created_at: Some("2025-01-01T00:00:00Z".into()),
            },
            AgentMessage {
                role: "assistant".into(),
                text: Some(format!("You said: {last}")),
                created_at: Some("2025-01-01T00:00:01Z".into()),
            },
        ])
    }
}

fn chat_state(agents: Arc<EchoAgents>) -> AppState {
    let settings = AgentSettings {
        agent_id: Some("asst_1".into()),
        ..Default::default()
    };
    let service = ChatService::new(agents, None, settings).with_poll_settings(PollSettings {
        interval: Duration::from_millis(5),
        max_polls: 3,
    });
    AppState::in_memory().with_chat(Arc::new(service))
}

#[actix_web::test]
async fn health_reports_running() {
    let app = app!(AppState::in_memory());
    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["message"], "API is running");
    assert!(body["timestamp"].is_string());
}

#[actix_web::test]
async fn category_lifecycle() {
    let app = app!(AppState::in_memory());

    let req = test::TestRequest::post()
        .uri("/categories")
        .set_json(json!({"name": "World", "slug": "world"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let location = resp.headers().get(header::LOCATION).unwrap().to_str().unwrap().to_string();
    let created: Value = test::read_body_json(resp).await;
    let id = created["id"].as_str().unwrap().to_string();
    assert!(location.ends_with(&format!("/categories/{id}")));
    assert_eq!(created["name"], "World");
    assert!(created["createdDate"].is_string());

    let req = test::TestRequest::get()
        .uri(&format!("/categories/{id}"))
        .to_request();
    let fetched: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched, created);

    let req = test::TestRequest::put()
        .uri(&format!("/categories/{id}"))
        .set_json(json!({"description": "Foreign news"}))
        .to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated["name"], "World");
    assert_eq!(updated["description"], "Foreign news");
    assert!(updated["updatedDate"].is_string());

    let req = test::TestRequest::delete()
        .uri(&format!("/categories/{id}"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/categories/{id}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "Category not found");
}

#[actix_web::test]
async fn malformed_ids_and_bodies_are_unprocessable() {
    let app = app!(AppState::in_memory());

    let req = test::TestRequest::get().uri("/posts/not-an-id").to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );

    let req = test::TestRequest::post()
        .uri("/posts")
        .set_json(json!({"title": "No body"}))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );

    let req = test::TestRequest::post()
        .uri("/posts")
        .set_json(post_body("Bad category", false, Some("nope")))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );

    let req = test::TestRequest::get().uri("/posts?top=many").to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[actix_web::test]
async fn missing_post_is_not_found() {
    let app = app!(AppState::in_memory());

    for req in [
        test::TestRequest::get().uri(&format!("/posts/{MISSING_ID}")),
        test::TestRequest::put()
            .uri(&format!("/posts/{MISSING_ID}"))
            .set_json(json!({"title": "x"})),
        test::TestRequest::delete().uri(&format!("/posts/{MISSING_ID}")),
    ] {
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["detail"], "Blog post not found");
    }
}

#[actix_web::test]
async fn post_filters_and_publication_date() {
    let app = app!(AppState::in_memory());
    let category = "aaaaaaaaaaaaaaaaaaaaaaaa";

    for (title, published, category_id) in [
        ("Draft", false, Some(category)),
        ("Live", true, Some(category)),
        ("Elsewhere", true, None),
    ] {
        let req = test::TestRequest::post()
            .uri("/posts")
            .set_json(post_body(title, published, category_id))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::get()
        .uri(&format!("/posts?published=true&categoryId={category}"))
        .to_request();
    let posts: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["title"], "Live");
    assert!(posts[0]["publishedDate"].is_string());
    assert_eq!(posts[0]["tags"], json!(["news"]));

    let req = test::TestRequest::get().uri("/posts").to_request();
    let all: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    let mut titles: Vec<&str> = all.iter().filter_map(|p| p["title"].as_str()).collect();
    titles.sort_unstable();
    assert_eq!(titles, ["Draft", "Elsewhere", "Live"]);

    let req = test::TestRequest::get().uri("/posts?skip=1&top=1").to_request();
    let page: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page.len(), 1);

    // Publishing a draft stamps it once.
    let req = test::TestRequest::get().uri("/posts?published=false").to_request();
    let drafts: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    let draft_id = drafts[0]["id"].as_str().unwrap();
    assert!(drafts[0]["publishedDate"].is_null());

    let req = test::TestRequest::put()
        .uri(&format!("/posts/{draft_id}"))
        .set_json(json!({"published": true}))
        .to_request();
    let published: Value = test::call_and_read_body_json(&app, req).await;
    let stamped = published["publishedDate"].clone();
    assert!(stamped.is_string());

    let req = test::TestRequest::put()
        .uri(&format!("/posts/{draft_id}"))
        .set_json(json!({"title": "Draft, revised"}))
        .to_request();
    let revised: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(revised["publishedDate"], stamped);
}

#[actix_web::test]
async fn post_and_comment_keep_every_field() {
    let app = app!(AppState::in_memory());
    let category = "aaaaaaaaaaaaaaaaaaaaaaaa";

    let req = test::TestRequest::post()
        .uri("/posts")
        .set_json(json!({
            "title": "Harbour reopens",
            "content": "Ships are moving again.",
            "excerpt": "Ships are moving",
            "author": "Ada",
            "categoryId": category,
            "tags": ["port", "shipping"],
            "slug": "harbour-reopens",
            "published": true,
            "publishedDate": "2025-03-01T09:30:00Z",
            "imageUrl": "https://cdn.example/harbour.jpg",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    let post_id = created["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{post_id}"))
        .to_request();
    let post: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(post, created);
    assert_eq!(post["excerpt"], "Ships are moving");
    assert_eq!(post["categoryId"], category);
    assert_eq!(post["tags"], json!(["port", "shipping"]));
    assert_eq!(post["published"], true);
    assert_eq!(post["publishedDate"], "2025-03-01T09:30:00Z");
    assert_eq!(post["imageUrl"], "https://cdn.example/harbour.jpg");

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{post_id}/comments"))
        .set_json(json!({
            "author": "Bo",
            "email": "bo@example.com",
            "content": "Good news.",
            "approved": true,
        }))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let comment_id = created["id"].as_str().unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{post_id}/comments/{comment_id}"))
        .to_request();
    let comment: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(comment, created);
    assert_eq!(comment["postId"], post_id.as_str());
    assert_eq!(comment["email"], "bo@example.com");
    assert_eq!(comment["approved"], true);
    assert!(comment["createdDate"].is_string());
}

#[actix_web::test]
async fn comments_survive_post_deletion() {
    let app = app!(AppState::in_memory());

    let req = test::TestRequest::post()
        .uri("/posts")
        .set_json(post_body("Commented", true, None))
        .to_request();
    let post: Value = test::call_and_read_body_json(&app, req).await;
    let post_id = post["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{post_id}/comments"))
        .set_json(json!({"author": "Bo", "content": "First!", "approved": true}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let comment: Value = test::read_body_json(resp).await;
    let comment_id = comment["id"].as_str().unwrap().to_string();
    assert_eq!(comment["postId"], post_id.as_str());

    let req = test::TestRequest::delete()
        .uri(&format!("/posts/{post_id}"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{post_id}/comments?approved=true"))
        .to_request();
    let comments: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(comments.len(), 1);

    // Addressed through the wrong post, the comment does not exist.
    let req = test::TestRequest::delete()
        .uri(&format!("/posts/{MISSING_ID}/comments/{comment_id}"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::delete()
        .uri(&format!("/posts/{post_id}/comments/{comment_id}"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{post_id}/comments"))
        .to_request();
    let comments: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert!(comments.is_empty());
}

#[actix_web::test]
async fn diagnostics_report_in_memory_storage() {
    let app = app!(AppState::in_memory());

    let req = test::TestRequest::get().uri("/db-status").to_request();
    let status: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(status["status"], "connected");
    assert_eq!(status["backend"], "memory");
    assert_eq!(status["initialization"]["state"], "ready");

    let req = test::TestRequest::get().uri("/db-check").to_request();
    let check: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(check["status"], "success");
    assert_eq!(check["blog_posts_count"], 0);
}

#[actix_web::test]
async fn function_prefix_is_stripped_and_kept_in_location() {
    let app = app!(AppState::in_memory(), prefix = "api");

    let req = test::TestRequest::get().uri("/api/health").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/categories")
        .insert_header((header::HOST, "globe.example"))
        .set_json(json!({"name": "Arts", "slug": "arts"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let location = resp.headers().get(header::LOCATION).unwrap().to_str().unwrap();
    assert!(location.starts_with("http://globe.example/api/categories/"));
}

#[actix_web::test]
async fn chat_without_agent_endpoint_fails() {
    let app = app!(AppState::in_memory());

    let req = test::TestRequest::post()
        .uri("/chat")
        .set_json(json!({"message": "hello"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["detail"].as_str().unwrap().starts_with("Chat error:"));
}

#[actix_web::test]
async fn chat_replays_history_into_new_thread() {
    let agents = Arc::new(EchoAgents::default());
    let app = app!(chat_state(agents.clone()));

    let req = test::TestRequest::post()
        .uri("/chat")
        .set_json(json!({
            "message": "What's new?",
            "conversation_history": [
                {"role": "assistant", "content": "Hi there"},
                {"content": "Hello"},
                {"role": "user", "content": ""}
            ],
            "conversation_id": "thread_gone"
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["response"], "You said: What's new?");
    assert_eq!(body["conversation_id"], "thread_new");

    let posted = agents.posted.lock().unwrap().clone();
    assert_eq!(
        posted,
        vec![
            ("assistant".to_string(), "Hi there".to_string()),
            ("user".to_string(), "Hello".to_string()),
            ("user".to_string(), "What's new?".to_string()),
        ]
    );
}

#[actix_web::test]
async fn chat_rate_limit_maps_to_429() {
    let agents = Arc::new(EchoAgents {
        fail_with: Some((
            "rate_limit_exceeded".into(),
            "Rate limit is exceeded. Try again in 12 seconds.".into(),
        )),
        ..Default::default()
    });
    let app = app!(chat_state(agents));

    let req = test::TestRequest::post()
        .uri("/chat")
        .set_json(json!({"message": "hello", "conversation_id": "thread_known"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(resp.headers().get(header::RETRY_AFTER).unwrap(), "12");
}
