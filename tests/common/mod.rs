// Fake distribution service shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::json;
use tokio::net::TcpListener;

use stellar_launch_engine::config::LauncherConfig;

pub const LIB_A: &str = "org/x/lib-1.0.jar";
pub const LIB_B: &str = "com/y/util-2.0.jar";
pub const HASH_ICON: &str = "ab12cd34ef";
pub const HASH_SOUND: &str = "f00dbabe99";

#[derive(Default)]
pub struct Upstream {
    files: Mutex<HashMap<String, Bytes>>,
    hits: Mutex<HashMap<String, usize>>,
}

pub struct FakeServer {
    base: String,
    state: Arc<Upstream>,
}

async fn serve(State(state): State<Arc<Upstream>>, uri: Uri) -> Response {
    let path = uri.path().to_string();
    *state.hits.lock().entry(path.clone()).or_default() += 1;
    let body = state.files.lock().get(&path).cloned();
    match body {
        Some(body) => (StatusCode::OK, body).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

impl FakeServer {
    pub async fn start() -> Self {
        stellar_launch_engine::api::simple::init_tracing();
        let state = Arc::new(Upstream::default());
        let app = Router::new().fallback(serve).with_state(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        Self {
            base: format!("http://{}", addr),
            state,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn put(&self, path: &str, body: impl Into<Bytes>) {
        self.state.files.lock().insert(path.to_string(), body.into());
    }

    pub fn remove(&self, path: &str) {
        self.state.files.lock().remove(path);
    }

    pub fn hits(&self, path: &str) -> usize {
        self.state.hits.lock().get(path).copied().unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.state.hits.lock().values().sum()
    }

    /// Publish release `1.20.4` with two libraries, a primary archive and two asset objects.
    pub fn publish_release(&self) {
        let descriptor = json!({
            "id": "1.20.4",
            "mainClass": "net.minecraft.client.main.Main",
            "downloads": {"client": {"url": self.url("/client/1.20.4.jar")}},
            "assetIndex": {"id": "12", "url": self.url("/indexes/12.json")},
            "libraries": [
                {"name": "org.x:lib:1.0", "downloads": {"artifact": {"path": LIB_A, "url": ""}}},
                {"name": "com.y:util:2.0", "downloads": {"artifact": {"path": LIB_B, "url": ""}}},
                {"name": "org.z:natives:1.0"}
            ]
        });
        let catalog = json!({
            "latest": {"release": "1.20.4", "snapshot": "1.20.4"},
            "versions": [
                {"id": "1.20.4", "type": "release", "url": self.url("/v1/1.20.4.json")},
                {"id": "1.19.4", "type": "release", "url": self.url("/v1/1.19.4.json")}
            ]
        });
        let index = json!({
            "objects": {
                "icons/icon.png": {"hash": HASH_ICON, "size": 4},
                "sounds/click.ogg": {"hash": HASH_SOUND, "size": 5}
            }
        });

        self.put("/manifest.json", serde_json::to_vec(&catalog).unwrap());
        self.put("/v1/1.20.4.json", serde_json::to_vec_pretty(&descriptor).unwrap());
        self.put("/indexes/12.json", serde_json::to_vec(&index).unwrap());
        self.put("/client/1.20.4.jar", &b"client-jar"[..]);
        self.put(&format!("/libs/{}", LIB_A), &b"lib-a"[..]);
        self.put(&format!("/libs/{}", LIB_B), &b"lib-b"[..]);
        self.put(&format!("/objects/ab/{}", HASH_ICON), &b"icon"[..]);
        self.put(&format!("/objects/f0/{}", HASH_SOUND), &b"sound"[..]);
    }

    pub fn config(&self, game_dir: &Path) -> LauncherConfig {
        LauncherConfig {
            catalog_url: self.url("/manifest.json"),
            library_base_url: self.url("/libs"),
            asset_base_url: self.url("/objects"),
            max_concurrency: 4,
            max_retries: 0,
            retry_backoff_ms: 1,
            request_timeout_secs: 5,
            ..LauncherConfig::with_game_dir(game_dir)
        }
    }
}

/// Every regular file under `root`, relative path to contents, sorted.
pub fn snapshot_tree(root: &Path) -> Vec<(String, Vec<u8>)> {
    fn walk(dir: &Path, root: &Path, out: &mut Vec<(String, Vec<u8>)>) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(&path, root, out);
            } else {
                let rel = path.strip_prefix(root).unwrap().display().to_string();
                out.push((rel, std::fs::read(&path).unwrap()));
            }
        }
    }
    let mut out = Vec::new();
    walk(root, root, &mut out);
    out.sort();
    out
}
