use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;

static SERVER: OnceLock<TestServer> = OnceLock::new();

/// Integration tests need a live Postgres; skip politely when the
/// environment does not provide one.
pub fn database_available() -> bool {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set; skipping integration test");
        return false;
    }
    true
}

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    #[allow(dead_code)]
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Spawn the already-built binary to keep start fast during tests
        // Assumes debug profile; adjust if you run tests with --release
        let mut cmd = Command::new("target/debug/catnip-api");
        cmd.env("CATNIP_PORT", port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // Inherit environment so the server sees DATABASE_URL from .env
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK
                    || resp.status() == StatusCode::SERVICE_UNAVAILABLE
                {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!(
            "server did not become ready on {} within {:?}",
            self.base_url,
            timeout
        )
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Register a user and fetch a token for it. Usernames get a random suffix
/// so repeated runs against a persistent database do not collide.
pub async fn signup_and_token(
    client: &reqwest::Client,
    base_url: &str,
    prefix: &str,
) -> Result<(String, String)> {
    let username = format!("{}-{}", prefix, unique_suffix());

    let res = client
        .post(format!("{}/auth/signup", base_url))
        .json(&serde_json::json!({ "username": username }))
        .send()
        .await?;
    anyhow::ensure!(
        res.status() == StatusCode::CREATED,
        "signup failed: {}",
        res.status()
    );

    let res = client
        .post(format!("{}/auth/token", base_url))
        .json(&serde_json::json!({ "username": username }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "token failed: {}", res.status());

    let payload = res.json::<serde_json::Value>().await?;
    let token = payload["data"]["token"]
        .as_str()
        .context("token missing from response")?
        .to_string();

    Ok((username, token))
}

fn unique_suffix() -> String {
    // Nanosecond timestamp plus pid is unique enough for test fixtures
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    format!("{}-{}", std::process::id(), nanos)
}
