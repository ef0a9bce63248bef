//! Test server management.
//!
//! Spawns and manages yapple-relay instances for integration testing.

use std::path::PathBuf;
use std::process::{Child, Command};
use std::time::Duration;
use tokio::time::sleep;

/// Knobs rendered into the generated config file.
#[derive(Debug, Clone, Default)]
pub struct TestServerOptions {
    pub reply_on_invalid_frame: bool,
    pub allow_origins: Vec<String>,
}

/// A test server instance.
pub struct TestServer {
    child: Child,
    port: u16,
    data_dir: PathBuf,
}

impl TestServer {
    /// Spawn a relay with default options.
    pub async fn spawn(port: u16) -> anyhow::Result<Self> {
        Self::spawn_with(port, TestServerOptions::default()).await
    }

    /// Spawn a relay listening on `port` with the given options.
    pub async fn spawn_with(port: u16, options: TestServerOptions) -> anyhow::Result<Self> {
        let data_dir = std::env::temp_dir().join(format!("yapple-test-{}", port));
        let _ = std::fs::remove_dir_all(&data_dir);
        std::fs::create_dir_all(&data_dir)?;

        let origins = options
            .allow_origins
            .iter()
            .map(|o| format!("{o:?}"))
            .collect::<Vec<_>>()
            .join(", ");

        let config_path = data_dir.join("config.toml");
        let config_content = format!(
            r#"
[server]
name = "test-relay"
metrics_port = 0

[listen]
address = "127.0.0.1:{port}"
allow_origins = [{origins}]

[relay]
reply_on_invalid_frame = {reply}

[database]
path = "{dir}/test.db"

[history]
backend = "sqlite"
"#,
            port = port,
            origins = origins,
            reply = options.reply_on_invalid_frame,
            dir = data_dir.display()
        );
        std::fs::write(&config_path, config_content)?;

        let child = Command::new(env!("CARGO_BIN_EXE_yapple-relay"))
            .arg(&config_path)
            .spawn()?;

        let server = Self {
            child,
            port,
            data_dir,
        };
        server.wait_until_ready().await?;
        Ok(server)
    }

    /// Wait until the server is accepting connections.
    async fn wait_until_ready(&self) -> anyhow::Result<()> {
        for _ in 0..50 {
            if tokio::net::TcpStream::connect(("127.0.0.1", self.port))
                .await
                .is_ok()
            {
                return Ok(());
            }
            sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("Server failed to start within 5 seconds")
    }

    /// WebSocket URL of the server.
    pub fn url(&self) -> String {
        format!("ws://127.0.0.1:{}", self.port)
    }

    /// Connect a client and announce it as `user`.
    pub async fn connect_as(&self, user: &str) -> anyhow::Result<super::client::TestClient> {
        let mut client = super::client::TestClient::connect(&self.url()).await?;
        client.announce(user).await?;
        Ok(client)
    }

    /// Path of the SQLite file the server persists to.
    #[allow(dead_code)]
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("test.db")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_dir_all(&self.data_dir);
    }
}
