//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo; `/socket` upgrades to the relay WebSocket.

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::config::Args;
use crate::content::ContentBrowser;
use crate::quiz::{self, ExamSessions};
use crate::relay::{Relay, RoomHub};
use crate::routes::{self, form::decode_segment, render};
use crate::server::websocket;
use crate::store::Store;
use crate::types::{LyceumError, Result};

/// Paths served by the router, for 405 vs 404
const KNOWN_PATHS: [&str; 17] = [
    "/",
    "/health",
    "/healthz",
    "/version",
    "/socket",
    "/knowledge_base",
    "/branch",
    "/post_research",
    "/publish_research",
    "/explore_system",
    "/learn_system",
    "/exam_system",
    "/take_exam",
    "/exam_result",
    "/function1",
    "/function2",
    "/favicon.ico",
];

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Ledger, chat log, research notes and taxonomy
    pub store: Arc<Store>,
    pub content: ContentBrowser,
    /// Exam sessions keyed by session cookie
    pub exams: Arc<ExamSessions>,
    /// Room membership for realtime connections
    pub hub: Arc<RoomHub>,
    pub relay: Relay,
    pub started_at: Instant,
}

impl AppState {
    /// Build state, loading the taxonomy named in `args`
    pub fn new(args: Args) -> Result<Self> {
        let store = Store::load(args.taxonomy_file.as_deref())?;
        Ok(Self::with_store(args, Arc::new(store)))
    }

    /// Build state around an existing store
    pub fn with_store(args: Args, store: Arc<Store>) -> Self {
        let hub = Arc::new(RoomHub::new());
        let relay = Relay::new(Arc::clone(&store), hub.clone());
        let exams = Arc::new(ExamSessions::new(Duration::from_secs(
            args.exam_session_ttl_secs,
        )));

        Self {
            content: ContentBrowser::new(Arc::clone(&store)),
            args,
            store,
            exams,
            hub,
            relay,
            started_at: Instant::now(),
        }
    }
}

/// Start the HTTP server; returns after ctrl-c
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;
    info!("Lyceum listening on {}", state.args.listen);

    quiz::spawn_cleanup_task(
        Arc::clone(&state.exams),
        Duration::from_secs(state.args.exam_cleanup_interval_secs),
    );
    info!(
        "Exam sessions expire after {}s of inactivity",
        state.args.exam_session_ttl_secs
    );
    info!("Realtime relay enabled at /socket");

    serve(listener, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    })
    .await
}

/// Accept connections on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = service_fn(move |req| {
                            let state = Arc::clone(&state);
                            async move { Ok::<_, Infallible>(handle_request(state, addr, req).await) }
                        });

                        if let Err(err) = http1::Builder::new()
                            .serve_connection(io, service)
                            .with_upgrades()
                            .await
                        {
                            debug!("Error serving connection from {}: {:?}", addr, err);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {:?}", e);
                }
            },
            _ = &mut shutdown => return Ok(()),
        }
    }
}

/// Route incoming HTTP requests
pub async fn handle_request<B>(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<B>,
) -> Response<Full<Bytes>>
where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    match (method, path.as_str()) {
        (Method::GET, "/") => routes::home(),

        // Liveness probe
        (Method::GET, "/health") | (Method::GET, "/healthz") => routes::health_check(&state),

        (Method::GET, "/version") => routes::version_info(),

        // Realtime relay
        (Method::GET, "/socket") => {
            if hyper_tungstenite::is_upgrade_request(&req) {
                websocket::handle_relay_upgrade(state, req)
            } else {
                render::html_with_status(
                    StatusCode::BAD_REQUEST,
                    render::page("Bad Request", "<p>WebSocket upgrade required</p>"),
                )
            }
        }

        // Knowledge base and research
        (Method::GET, "/knowledge_base") => routes::knowledge_base_index(&state),
        (Method::POST, "/knowledge_base") => {
            respond(&path, routes::knowledge_base_submit(state, req).await)
        }
        (Method::POST, "/branch") => respond(&path, routes::branch(state, req).await),
        (Method::POST, "/post_research") => respond(&path, routes::post_research(req).await),
        (Method::POST, "/publish_research") => {
            respond(&path, routes::publish_research(state, req).await)
        }
        (Method::GET, "/explore_system") => routes::explore_system(&state),
        (Method::GET, p) if p.starts_with("/view_research/") => {
            let area = decode_segment(p.strip_prefix("/view_research/").unwrap_or(""));
            routes::view_research(&state, &area)
        }
        (Method::GET, p) if p.starts_with("/view_branch_research/") => {
            let branch = decode_segment(p.strip_prefix("/view_branch_research/").unwrap_or(""));
            routes::view_research(&state, &branch)
        }

        // Learn
        (Method::GET, "/learn_system") => routes::learn_system_index(&state),
        (Method::POST, "/learn_system") => {
            respond(&path, routes::learn_system_submit(state, req).await)
        }

        // Exam
        (Method::GET, "/exam_system") => routes::exam_system_index(&state),
        (Method::POST, "/exam_system") => {
            respond(&path, routes::exam_system_submit(state, req).await)
        }
        (Method::GET, "/take_exam") => respond(&path, routes::take_exam_show(&state, &req)),
        (Method::POST, "/take_exam") => respond(&path, routes::take_exam_answer(state, req).await),
        (Method::GET, "/exam_result") => respond(&path, routes::exam_result(&state, &req)),

        // Chat and payments
        (Method::GET, "/function1") => routes::social_index(),
        (Method::POST, "/function1") => respond(&path, routes::social_submit(state, req).await),
        (Method::GET, "/function2") => routes::placeholder(),

        (Method::GET, "/favicon.ico") => Response::builder()
            .status(StatusCode::NO_CONTENT)
            .body(Full::new(Bytes::new()))
            .unwrap(),

        (_, p) if KNOWN_PATHS.contains(&p) || is_research_view(p) => {
            render::method_not_allowed(p)
        }
        (_, p) => render::not_found(p),
    }
}

fn is_research_view(path: &str) -> bool {
    path.starts_with("/view_research/") || path.starts_with("/view_branch_research/")
}

/// Turn a handler result into a response, logging failures
fn respond(path: &str, result: Result<Response<Full<Bytes>>>) -> Response<Full<Bytes>> {
    match result {
        Ok(response) => response,
        Err(err) => {
            log_error(path, &err);
            render::error_response(&err)
        }
    }
}

fn log_error(path: &str, err: &LyceumError) {
    match err {
        LyceumError::NoExamSession => debug!(path = %path, "No exam session, redirecting"),
        e if e.is_client_error() => warn!(path = %path, error = %e, "Request rejected"),
        e => error!(path = %path, error = %e, "Request failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use hyper::header::{COOKIE, LOCATION, SET_COOKIE};

    fn state() -> Arc<AppState> {
        Arc::new(AppState::with_store(Args::default(), Arc::new(Store::default())))
    }

    fn addr() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    fn get(path: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(Method::GET)
            .uri(path)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    fn post(path: &str, body: &'static str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(Method::POST)
            .uri(path)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Full::new(Bytes::from_static(body.as_bytes())))
            .unwrap()
    }

    fn with_cookie(mut req: Request<Full<Bytes>>, cookie: &str) -> Request<Full<Bytes>> {
        req.headers_mut().insert(COOKIE, cookie.parse().unwrap());
        req
    }

    async fn body_text(resp: Response<Full<Bytes>>) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_home_lists_sections() {
        let resp = handle_request(state(), addr(), get("/")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_text(resp).await;
        assert!(body.contains("Knowledge Base"));
        assert!(body.contains("/function2"));
    }

    #[tokio::test]
    async fn test_unknown_path_and_method() {
        let resp = handle_request(state(), addr(), get("/nope")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = handle_request(state(), addr(), get("/branch")).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_research_view_rejects_post() {
        for path in ["/view_research/mathematics", "/view_branch_research/algebra"] {
            let resp = handle_request(state(), addr(), post(path, "")).await;
            assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        }
        let resp = handle_request(state(), addr(), post("/view_researchers", "")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_knowledge_base_topic() {
        let resp = handle_request(
            state(),
            addr(),
            post("/knowledge_base", "function=mathematics"),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_text(resp).await;
        assert!(body.contains("algebra"));
        assert!(body.contains("Every proof starts from stated axioms"));
    }

    #[tokio::test]
    async fn test_missing_field_is_bad_request() {
        let resp = handle_request(state(), addr(), post("/branch", "")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(resp).await.contains("branch"));
    }

    #[tokio::test]
    async fn test_publish_then_view() {
        let state = state();
        let resp = handle_request(
            Arc::clone(&state),
            addr(),
            post("/publish_research", "branch=algebra&research_content=%3Cb%3Enote%3C%2Fb%3E"),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = handle_request(Arc::clone(&state), addr(), get("/view_branch_research/algebra")).await;
        let body = body_text(resp).await;
        assert!(body.contains("&lt;b&gt;note&lt;/b&gt;"));
        assert_eq!(state.content.notes_for("algebra"), vec!["<b>note</b>"]);

        let resp = handle_request(Arc::clone(&state), addr(), get("/view_research/geometry")).await;
        assert!(!body_text(resp).await.contains("note"));
    }

    #[tokio::test]
    async fn test_payment_flow() {
        let state = state();
        for body in ["uid=u1&amount=5", "uid=u1&amount=3"] {
            let resp = handle_request(Arc::clone(&state), addr(), post("/function1", body)).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }
        assert_eq!(state.store.ledger.balance("u1"), 8.0);
        assert_eq!(state.relay.history("u1"), vec!["$5", "$3"]);

        let resp = handle_request(Arc::clone(&state), addr(), post("/function1", "uid=u1")).await;
        let body = body_text(resp).await;
        assert!(body.contains("<li>$5</li><li>$3</li>"));
    }

    #[tokio::test]
    async fn test_non_numeric_amount_is_bad_request() {
        let state = state();
        let resp = handle_request(
            Arc::clone(&state),
            addr(),
            post("/function1", "uid=u1&amount=ten"),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(!state.store.ledger.contains("u1"));

        let resp = handle_request(Arc::clone(&state), addr(), post("/function1", "amount=5")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_exam_flow() {
        let state = state();
        let resp = handle_request(
            Arc::clone(&state),
            addr(),
            post("/exam_system", "topic=algebra"),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[LOCATION], "/take_exam");
        let set_cookie = resp.headers()[SET_COOKIE].to_str().unwrap().to_string();
        let cookie = set_cookie.split(';').next().unwrap().to_string();

        let resp = handle_request(
            Arc::clone(&state),
            addr(),
            with_cookie(get("/take_exam"), &cookie),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("Question 1 of 5"));

        for action in ["correct", "correct", "incorrect", "correct"] {
            let body: &'static str = if action == "correct" {
                "action=correct"
            } else {
                "action=incorrect"
            };
            let resp = handle_request(
                Arc::clone(&state),
                addr(),
                with_cookie(post("/take_exam", body), &cookie),
            )
            .await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let resp = handle_request(
            Arc::clone(&state),
            addr(),
            with_cookie(post("/take_exam", "action=correct"), &cookie),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[LOCATION], "/exam_result");

        let resp = handle_request(
            Arc::clone(&state),
            addr(),
            with_cookie(get("/exam_result"), &cookie),
        )
        .await;
        let body = body_text(resp).await;
        assert!(body.contains("Your score: 80"));
        assert!(body.contains("Result: Pass"));
    }

    #[tokio::test]
    async fn test_exam_unknown_topic_rerenders_form() {
        let resp = handle_request(state(), addr(), post("/exam_system", "topic=ghost")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(resp.headers().get(SET_COOKIE).is_none());
        assert!(body_text(resp).await.contains("Start Exam"));
    }

    #[tokio::test]
    async fn test_take_exam_without_session_redirects() {
        let resp = handle_request(state(), addr(), get("/take_exam")).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[LOCATION], "/exam_system");
    }

    #[tokio::test]
    async fn test_learn_system() {
        let state = state();
        let resp = handle_request(
            Arc::clone(&state),
            addr(),
            post("/learn_system", "topic=optics"),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_text(resp).await;
        assert!(body.contains("Topic: optics"));

        let resp = handle_request(state, addr(), post("/learn_system", "topic=ghost")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_socket_requires_upgrade() {
        let resp = handle_request(state(), addr(), get("/socket")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health() {
        let resp = handle_request(state(), addr(), get("/health")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
        assert_eq!(value["healthy"], true);
        assert_eq!(value["store"]["taxonomy_topics"], 3);
    }
}
