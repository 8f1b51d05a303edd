use once_cell::sync::Lazy;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use skrate::errors::RecorderError;
use skrate::recorder::{ElementDescriptor, MISS_CLASS, SUCCESS_CLASS};
use skrate::tricks::CATALOGUE;
use skrate::{AttemptRecorder, HttpTransport, Page};
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct AttemptResponse {
    attempted: bool,
    update_game: bool,
    update_all_tricks: bool,
    update_tricks: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct StartGameResponse {
    started: bool,
    game_id: u64,
}

struct TestServer {
    base_url: String,
    data_path: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("skrate_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

/// Ids are handed out in catalogue order on a fresh data file.
fn trick_id(name: &str) -> u32 {
    CATALOGUE
        .iter()
        .position(|candidate| *candidate == name)
        .expect("trick not in catalogue") as u32
        + 1
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/static/skrate.js")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_skrate"))
        .env("HOST", "127.0.0.1")
        .env("PORT", port.to_string())
        .env("SKRATE_DATA_PATH", &data_path)
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer {
        base_url,
        data_path,
        child,
    }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn get_as(client: &Client, url: String, cookie: &str) -> reqwest::Response {
    client
        .get(url)
        .header(header::COOKIE, cookie)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_index_lists_tricks_and_starts_session() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .get(format!("{}/johndoe", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookies: Vec<String> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect();
    assert!(cookies.iter().any(|c| c.starts_with("skrate_user=johndoe")));

    let html = response.text().await.unwrap();
    assert!(html.contains(&format!("trickstats{}", trick_id("Kickflip"))));
    assert!(html.contains("Heelflip Bigspin"));
    assert!(html.contains("/static/skrate.js"));

    let response = client
        .get(format!("{}/not%20a%20user", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_miss_is_counted_in_trick_stats() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let cookie = "skrate_user=bailer";
    let id = trick_id("Kickflip");

    let response = get_as(&client, format!("{}/attempt/{id}/false/false", server.base_url), cookie).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: AttemptResponse = response.json().await.unwrap();
    assert!(body.attempted);
    assert!(!body.update_game);
    assert!(!body.update_all_tricks);
    assert_eq!(body.update_tricks, vec![id.to_string()]);

    let html = get_as(&client, format!("{}/get_single_trick_stats/{id}", server.base_url), cookie)
        .await
        .text()
        .await
        .unwrap();
    assert!(html.contains("Attempts: 1 "));
    assert!(html.contains("Lands: 0 "));
}

#[tokio::test]
async fn http_land_is_counted_per_user() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let id = trick_id("Ollie");

    let response = get_as(&client, format!("{}/attempt/{id}/true/false", server.base_url), "skrate_user=lander").await;
    assert_eq!(response.status(), StatusCode::OK);

    let mine = get_as(&client, format!("{}/get_single_trick_stats/{id}", server.base_url), "skrate_user=lander")
        .await
        .text()
        .await
        .unwrap();
    assert!(mine.contains("Attempts: 1 "));
    assert!(mine.contains("Lands: 1 "));

    let theirs = get_as(&client, format!("{}/get_single_trick_stats/{id}", server.base_url), "skrate_user=watcher")
        .await
        .text()
        .await
        .unwrap();
    assert!(theirs.contains("Attempts: 0 "));
}

#[tokio::test]
async fn http_rejects_bad_trick_ids() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .get(format!("{}/attempt/undefined/true/false", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .get(format!("{}/attempt/9999/true/false", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .get(format!("{}/get_single_trick_stats/9999", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_game_attempts_update_the_game() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let started: StartGameResponse = get_as(&client, format!("{}/start_game", server.base_url), "skrate_user=gamer")
        .await
        .json()
        .await
        .unwrap();
    assert!(started.started);

    let cookie = format!("skrate_user=gamer; skrate_game={}", started.game_id);
    let id = trick_id("Heelflip");
    let body: AttemptResponse = get_as(&client, format!("{}/attempt/{id}/true/false", server.base_url), &cookie)
        .await
        .json()
        .await
        .unwrap();
    assert!(body.update_game);

    let html = get_as(&client, format!("{}/get_game_stats", server.base_url), &cookie)
        .await
        .text()
        .await
        .unwrap();
    assert!(html.contains("New you landed a Heelflip! Can Past you match it?"));

    let body: AttemptResponse = get_as(&client, format!("{}/attempt/{id}/false/true", server.base_url), &cookie)
        .await
        .json()
        .await
        .unwrap();
    assert!(body.update_game);
    let html = get_as(&client, format!("{}/get_game_stats", server.base_url), &cookie)
        .await
        .text()
        .await
        .unwrap();
    assert!(html.contains("Past you: <b>S</b>"));
}

async fn stored_data(server: &TestServer) -> serde_json::Value {
    let bytes = tokio::fs::read(&server.data_path).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn start_game_as(client: &Client, server: &TestServer, user: &str) -> String {
    let started: StartGameResponse = get_as(client, format!("{}/start_game", server.base_url), &format!("skrate_user={user}"))
        .await
        .json()
        .await
        .unwrap();
    assert!(started.started);
    format!("skrate_user={user}; skrate_game={}", started.game_id)
}

#[tokio::test]
async fn http_reload_keeps_the_running_game() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let cookie = start_game_as(&client, &server, "reloader").await;
    let id = trick_id("Nollie");

    get_as(&client, format!("{}/attempt/{id}/true/false", server.base_url), &cookie).await;

    let response = get_as(&client, format!("{}/reloader", server.base_url), &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);
    let clears_game = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .any(|value| value.to_str().unwrap().starts_with("skrate_game="));
    assert!(!clears_game);

    let html = response.text().await.unwrap();
    assert!(html.contains("In progress"));
    assert!(html.contains("New you landed a Nollie! Can Past you match it?"));

    // still attached to the same game after the reload
    let body: AttemptResponse = get_as(&client, format!("{}/attempt/{id}/true/true", server.base_url), &cookie)
        .await
        .json()
        .await
        .unwrap();
    assert!(body.update_game);
}

#[tokio::test]
async fn http_finished_game_is_closed_with_a_winner() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let cookie = start_game_as(&client, &server, "finisher").await;
    let game_id: u64 = cookie.rsplit('=').next().unwrap().parse().unwrap();

    // past self sets five tricks and the user bails every one
    for name in &CATALOGUE[..5] {
        let id = trick_id(name);
        for (landed, past) in [(true, true), (false, false)] {
            let body: AttemptResponse = get_as(
                &client,
                format!("{}/attempt/{id}/{landed}/{past}", server.base_url),
                &cookie,
            )
            .await
            .json()
            .await
            .unwrap();
            assert!(body.update_game);
        }
    }

    let html = get_as(&client, format!("{}/get_game_stats", server.base_url), &cookie)
        .await
        .text()
        .await
        .unwrap();
    assert!(html.contains("New you: <b>SKATE</b>"));
    assert!(html.contains("Past you wins!"));
    assert!(html.contains("Game over"));

    let data = stored_data(&server).await;
    let game = data["games"]
        .as_array()
        .unwrap()
        .iter()
        .find(|game| game["id"] == game_id)
        .expect("game not stored");
    assert_eq!(game["complete"], true);
    assert_eq!(game["winner"], "past_finisher");

    let id = trick_id(CATALOGUE[5]);
    let body: AttemptResponse = get_as(&client, format!("{}/attempt/{id}/true/false", server.base_url), &cookie)
        .await
        .json()
        .await
        .unwrap();
    assert!(!body.update_game);

    let data = stored_data(&server).await;
    let last = data["attempts"].as_array().unwrap().last().unwrap().clone();
    assert_eq!(last["user"], "finisher");
    assert_eq!(last["trick_id"], id);
    assert!(last["game_id"].is_null());

    // a finished game no longer shows on the page
    let html = get_as(&client, format!("{}/finisher", server.base_url), &cookie)
        .await
        .text()
        .await
        .unwrap();
    assert!(html.contains("No game running"));
}

#[derive(Clone, Default)]
struct RecordingPage {
    replaced: Arc<std::sync::Mutex<Vec<(String, String)>>>,
    errors: Arc<std::sync::Mutex<Vec<String>>>,
}

impl Page for RecordingPage {
    fn replace_markup(&self, container_id: &str, markup: &str) {
        self.replaced
            .lock()
            .unwrap()
            .push((container_id.to_string(), markup.to_string()));
    }

    fn notify_error(&self, error: &RecorderError) {
        self.errors.lock().unwrap().push(error.to_string());
    }
}

#[tokio::test]
async fn recorder_click_updates_stats_container() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let id = trick_id("Bigspin");

    let page = RecordingPage::default();
    let recorder = AttemptRecorder::new(HttpTransport::new(&server.base_url).unwrap(), page.clone());
    let target = ElementDescriptor::new(format!("land-{id}"), &[SUCCESS_CLASS]);
    recorder.handle_click(&target).unwrap().await.unwrap().unwrap();

    let expected = Client::new()
        .get(format!("{}/get_single_trick_stats/{id}", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    let replaced = page.replaced.lock().unwrap().clone();
    assert_eq!(replaced, vec![(format!("trickstats{id}"), expected.clone())]);
    assert!(expected.contains("Lands: 1 "));
    assert!(page.errors.lock().unwrap().is_empty());
}

#[tokio::test]
async fn recorder_surfaces_server_errors() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;

    let page = RecordingPage::default();
    let recorder = AttemptRecorder::new(HttpTransport::new(&server.base_url).unwrap(), page.clone());
    let target = ElementDescriptor::new("miss-9999", &[MISS_CLASS]);
    let result = recorder.handle_click(&target).unwrap().await.unwrap();

    assert!(matches!(result, Err(RecorderError::Status { status: 404, .. })));
    assert!(page.replaced.lock().unwrap().is_empty());
    assert_eq!(page.errors.lock().unwrap().len(), 1);
}
