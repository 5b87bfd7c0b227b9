use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Json, Router};
use invite_server::config::Config;
use invite_server::tracker::{self, TrackerState};
use invite_server::{db, fetch, router, ApiState};
use serde_json::{json, Value};

const PUBLIC_URL: &str = "https://invite.example/";

fn demo_config() -> Value {
    json!({
        "brand": "UVX",
        "title": {"en": "Spring Gala", "jp": "春のガラ"},
        "tiers": [
            {"id": "ga", "name": {"en": "General", "jp": "一般"}, "price": 1500},
            {"id": "vip", "name": "VIP", "price": 12000}
        ],
        "gallery": ["one.jpg"],
        "music": "theme.mp3"
    })
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Static host for event configs.
async fn config_host(with_demo: bool) -> String {
    let mut app = Router::new().route(
        "/events/broken/config.json",
        get(|| async { "{ not json" }),
    );
    if with_demo {
        app = app.route(
            "/events/demo/config.json",
            get(|| async { Json(demo_config()) }),
        );
    }
    serve(app).await
}

struct TestApp {
    url: String,
    config_base: String,
    http: reqwest::Client,
}

async fn spawn_app(with_demo: bool) -> TestApp {
    let config_base = config_host(with_demo).await;
    let config = Config {
        config_base_url: config_base.clone(),
        asset_base_url: "https://cdn.example".to_string(),
        public_url: PUBLIC_URL.to_string(),
        database_url: "sqlite::memory:".to_string(),
        api_port: 0,
        fetch_timeout_secs: 5,
        tracking_cap: 50,
    };

    let pool = db::init_pool(&config.database_url).await.unwrap();
    let (sink, rx) = tracker::channel();
    tokio::spawn(tracker::run(
        Arc::new(TrackerState {
            pool: pool.clone(),
            cap: config.tracking_cap,
        }),
        rx,
    ));
    let client = fetch::build_client(config.fetch_timeout_secs).unwrap();

    let url = serve(router(Arc::new(ApiState {
        pool,
        client,
        config,
        sink,
    })))
    .await;

    TestApp {
        url,
        config_base,
        http: reqwest::Client::new(),
    }
}

impl TestApp {
    async fn get(&self, path_and_query: &str) -> (u16, String) {
        let (status, body, _) = self.get_as(path_and_query, None).await;
        (status, body)
    }

    /// GET with an optional `Cookie` header; returns any `Set-Cookie` pair.
    async fn get_as(
        &self,
        path_and_query: &str,
        cookie: Option<&str>,
    ) -> (u16, String, Option<String>) {
        let mut req = self.http.get(format!("{}{path_and_query}", self.url));
        if let Some(cookie) = cookie {
            req = req.header("cookie", cookie);
        }
        let resp = req.send().await.unwrap();
        let status = resp.status().as_u16();
        let set_cookie = resp
            .headers()
            .get("set-cookie")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string);
        (status, resp.text().await.unwrap(), set_cookie)
    }

    async fn action(&self, query: &str, action: Value) -> (u16, Value) {
        self.action_with(query, action, json!({})).await
    }

    /// POST an action together with what the browser reported.
    async fn action_with(&self, query: &str, action: Value, report: Value) -> (u16, Value) {
        let mut body = json!({ "query": query, "action": action });
        if let (Some(body), Some(report)) = (body.as_object_mut(), report.as_object()) {
            body.extend(report.clone());
        }
        let resp = self
            .http
            .post(format!("{}/actions", self.url))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }
}

#[tokio::test]
async fn health_reports_ok() {
    let app = spawn_app(true).await;
    let (status, body) = app.get("/health").await;
    assert_eq!(status, 200);
    assert!(body.contains("\"status\":\"ok\""));
}

#[tokio::test]
async fn renders_japanese_page_with_referral() {
    let app = spawn_app(true).await;
    let (status, html) = app.get("/?event=demo&lang=jp&ref=ABC123").await;
    assert_eq!(status, 200);
    assert!(html.contains("<title>春のガラ</title>"));
    assert!(html.contains("ABC123"));
    assert!(html.contains("一般 ¥1,500"));
    assert!(html.contains("https://cdn.example/events/demo/assets/one.jpg"));
}

#[tokio::test]
async fn missing_config_shows_error_panel_only() {
    let app = spawn_app(false).await;
    let (status, html) = app.get("/?event=demo").await;
    assert_eq!(status, 502);
    assert!(html.contains("error-panel"));
    assert!(html.contains(&format!("{}/events/demo/config.json", app.config_base)));
    assert!(html.contains("404"));
    for absent in ["tierSelect", "id=\"gallery\"", "id=\"payments\""] {
        assert!(!html.contains(absent), "{absent} should not be rendered");
    }
}

#[tokio::test]
async fn undecodable_config_is_unavailable() {
    let app = spawn_app(true).await;
    let (status, html) = app.get("/?event=broken").await;
    assert_eq!(status, 502);
    assert!(html.contains("/events/broken/config.json"));
}

#[tokio::test]
async fn invalid_slug_is_rejected_before_fetch() {
    let app = spawn_app(true).await;
    let (status, html) = app.get("/?event=..%2Fsecret").await;
    assert_eq!(status, 502);
    assert!(html.contains("invalid event slug"));
}

#[tokio::test]
async fn referral_persists_across_visits() {
    let app = spawn_app(true).await;
    let (status, _, cookie) = app.get_as("/?event=demo&ref=FRIEND1", None).await;
    assert_eq!(status, 200);
    let cookie = cookie.expect("first visit is issued a visitor cookie");
    assert!(cookie.starts_with("invite_visitor="));

    let (status, html, reissued) = app.get_as("/?event=demo", Some(&cookie)).await;
    assert_eq!(status, 200);
    assert!(html.contains("Referral: FRIEND1"));
    assert!(reissued.is_none());
}

#[tokio::test]
async fn referral_is_private_to_its_visitor() {
    let app = spawn_app(true).await;
    let (_, _, cookie) = app.get_as("/?event=demo&ref=FRIEND1", None).await;
    assert!(cookie.is_some());

    let (status, html, _) = app.get_as("/?event=demo", None).await;
    assert_eq!(status, 200);
    assert!(!html.contains("FRIEND1"));
}

#[tokio::test]
async fn share_endpoint_builds_link() {
    let app = spawn_app(true).await;
    let (status, body) = app.get("/share?event=demo&lang=jp&ref=ABC123").await;
    assert_eq!(status, 200);
    let body: Value = serde_json::from_str(&body).unwrap();
    let link = body["share_link"].as_str().unwrap();
    assert!(link.starts_with(PUBLIC_URL));
    assert!(link.contains("event=demo&lang=jp&ref=ABC123"));
}

#[tokio::test]
async fn actions_apply_through_controller() {
    let app = spawn_app(true).await;

    let (status, body) = app
        .action("event=demo", json!({"type": "set_locale", "locale": "jp"}))
        .await;
    assert_eq!(status, 200);
    assert!(body["markup"].as_str().unwrap().contains("春のガラ"));
    assert_eq!(body["query"], "event=demo&lang=jp");

    let (status, body) = app
        .action("event=demo&lang=jp", json!({"type": "select_tier", "id": "vip"}))
        .await;
    assert_eq!(status, 200);
    assert!(body["markup"].is_null());
    assert_eq!(body["query"], "event=demo&lang=jp&tier=vip");

    let (status, body) = app
        .action("event=demo&lang=jp&tier=vip", json!({"type": "copy_link"}))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["notice"]["kind"], "link_copied");
    assert_eq!(body["notice"]["ttl_ms"], 1200);
    assert_eq!(
        body["share_link"],
        "https://invite.example/?event=demo&lang=jp&tier=vip"
    );
}

#[tokio::test]
async fn playback_cycles_across_requests() {
    let app = spawn_app(true).await;
    let mut playback = Value::Null;
    let mut seen = Vec::new();
    for _ in 0..3 {
        let (status, body) = app
            .action_with(
                "event=demo",
                json!({"type": "toggle_playback"}),
                json!({ "playback": playback }),
            )
            .await;
        assert_eq!(status, 200);
        playback = body["playback"].clone();
        seen.push(playback.as_str().unwrap().to_string());
    }
    assert_eq!(seen, vec!["playing", "paused", "playing"]);
}

#[tokio::test]
async fn blocked_playback_returns_notice() {
    let app = spawn_app(true).await;
    let (status, body) = app
        .action_with(
            "event=demo&lang=jp",
            json!({"type": "toggle_playback"}),
            json!({ "playback_blocked": true }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["playback"], "stopped");
    assert_eq!(body["notice"]["kind"], "playback_blocked");
}

#[tokio::test]
async fn denied_clipboard_falls_back_to_manual_copy() {
    let app = spawn_app(true).await;
    let (status, body) = app
        .action_with(
            "event=demo",
            json!({"type": "copy_link"}),
            json!({ "clipboard_denied": true }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["notice"]["kind"], "copy_manually");
    assert_eq!(body["notice"]["text"], "Copy this link");
    assert_eq!(body["share_link"], "https://invite.example/?event=demo&lang=en");
}

#[tokio::test]
async fn actions_report_unavailable_config() {
    let app = spawn_app(false).await;
    let (status, body) = app
        .action("event=demo", json!({"type": "copy_link"}))
        .await;
    assert_eq!(status, 502);
    assert!(body["markup"]
        .as_str()
        .unwrap()
        .contains("/events/demo/config.json"));
}

#[tokio::test]
async fn interactions_are_tracked() {
    let app = spawn_app(true).await;
    app.get("/?event=demo").await;
    app.action("event=demo", json!({"type": "copy_link"})).await;

    // The tracker writes in the background.
    let mut names = Vec::new();
    for _ in 0..50 {
        let (_, body) = app.get("/tracking").await;
        let body: Value = serde_json::from_str(&body).unwrap();
        names = body["events"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["name"].as_str().unwrap().to_string())
            .collect();
        if names.len() >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(names, vec!["page_view", "copy_link"]);
}
