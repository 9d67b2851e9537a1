//! CLI commands

use anyhow::{Context as _, Result};
use clap::Subcommand;
use serde_json::{Value, json};
use smartmix_core::{ClientConfig, FileStore, KeyValueStore, SessionStore};
use smartmix_http::{ApiClient, ClientError};
use smartmix_router::{Navigation, Router};
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the session
    Login {
        /// Account name
        username: String,

        /// Account password
        #[arg(long, env = "SMARTMIX_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Clear the stored session
    Logout,

    /// Show the logged-in user
    Whoami {
        /// Fetch the profile from the server and store it
        #[arg(long)]
        refresh: bool,
    },

    /// Print the stored session
    Session {
        /// Include the raw token in the output
        #[arg(long)]
        show_token: bool,
    },

    /// Navigate to an application route and print where it lands
    Open {
        /// Route path, e.g. /tasks
        path: String,
    },

    /// Send an authenticated GET request and print the response body
    Get {
        /// API path, e.g. /api/materials
        path: String,
    },
}

/// Session, client and router sharing one session store
pub struct Context {
    session: Arc<SessionStore>,
    client: ApiClient,
    router: Router,
}

impl Context {
    /// Open the persisted session configured in `config`
    pub fn open(config: &ClientConfig) -> Result<Self> {
        let path = config.session_path();
        debug!(path = %path.display(), "Opening session file");
        let storage = FileStore::open(&path)
            .with_context(|| format!("Failed to open session file {}", path.display()))?;
        Self::with_storage(config, Arc::new(storage))
    }

    pub fn with_storage(config: &ClientConfig, storage: Arc<dyn KeyValueStore>) -> Result<Self> {
        let session = Arc::new(SessionStore::load(storage)?);
        let client = ApiClient::from_config(config, session.clone())?;
        let router = Router::new(session.clone());
        Ok(Self {
            session,
            client,
            router,
        })
    }
}

impl Commands {
    pub async fn execute(self, ctx: &Context, out: &mut impl Write) -> Result<()> {
        match self {
            Self::Login { username, password } => {
                let login = ctx.client.login(&username, password).await?;
                writeln!(
                    out,
                    "Logged in as {} ({})",
                    login.real_name.as_deref().unwrap_or(&login.username),
                    login.role
                )?;
            }
            Self::Logout => {
                ctx.client.logout()?;
                ctx.router.apply_session_events();
                writeln!(out, "Logged out")?;
            }
            Self::Whoami { refresh } => {
                if !ctx.session.is_authenticated() {
                    anyhow::bail!("Not logged in");
                }
                if refresh {
                    let result = ctx.client.refresh_profile().await;
                    report_expiry(ctx, out, result.as_ref().err())?;
                    result?;
                }
                let profile = Value::Object(ctx.session.profile());
                writeln!(out, "{}", serde_json::to_string_pretty(&profile)?)?;
            }
            Self::Session { show_token } => {
                let snapshot = ctx.session.snapshot();
                let token = match (snapshot.token.is_empty(), show_token) {
                    (true, _) => Value::Null,
                    (false, true) => Value::String(snapshot.token),
                    (false, false) => Value::String("<redacted>".to_string()),
                };
                let output = json!({
                    "authenticated": ctx.session.is_authenticated(),
                    "token": token,
                    "roles": snapshot.roles,
                    "profile": snapshot.profile,
                });
                writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
            }
            Self::Open { path } => {
                let navigation = ctx.router.navigate(&path);
                print_navigation(out, &navigation)?;
            }
            Self::Get { path } => {
                let result: Result<Value, ClientError> = ctx.client.get(&path).await;
                report_expiry(ctx, out, result.as_ref().err())?;
                let body = result?;
                writeln!(out, "{}", serde_json::to_string_pretty(&body)?)?;
            }
        }
        Ok(())
    }
}

/// Let the router react to an expired session and tell the user where it went
fn report_expiry(ctx: &Context, out: &mut impl Write, error: Option<&ClientError>) -> Result<()> {
    if error.is_some_and(ClientError::is_auth_expired) && ctx.router.apply_session_events() > 0 {
        warn!("Session expired, log in again");
        if let Some(location) = ctx.router.current() {
            writeln!(out, "Session expired, redirected to {}", location.path)?;
        }
    }
    Ok(())
}

fn print_navigation(out: &mut impl Write, navigation: &Navigation) -> Result<()> {
    let location = navigation.location();
    let view = location.view.map_or_else(|| "-".to_string(), |v| v.to_string());
    match navigation {
        Navigation::Proceeded(_) => {
            info!(path = %location.path, "Navigated");
            writeln!(out, "{} -> {view}", location.path)?;
        }
        Navigation::Redirected { requested, .. } => {
            writeln!(out, "{requested} redirected to {} -> {view}", location.path)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartmix_core::MemoryStore;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn context(server: &MockServer, storage: Arc<dyn KeyValueStore>) -> Context {
        let mut config = ClientConfig::default();
        config.api.base_url = server.uri();
        Context::with_storage(&config, storage).unwrap()
    }

    async fn run(ctx: &Context, command: Commands) -> (Result<()>, String) {
        let mut out = Vec::new();
        let result = command.execute(ctx, &mut out).await;
        (result, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_open_without_session_redirects() {
        let server = MockServer::start().await;
        let ctx = context(&server, Arc::new(MemoryStore::new()));

        let (result, out) = run(
            &ctx,
            Commands::Open {
                path: "/materials".to_string(),
            },
        )
        .await;
        result.unwrap();
        assert_eq!(out, "/materials redirected to /login -> Login\n");
    }

    #[tokio::test]
    async fn test_login_then_get_then_logout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 200,
                "data": {"token": "abc123", "username": "admin", "realName": "管理员", "role": "ADMIN"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/tasks"))
            .and(header("authorization", "Bearer abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("session.json");
        let ctx = context(&server, Arc::new(FileStore::open(&file).unwrap()));

        let (result, out) = run(
            &ctx,
            Commands::Login {
                username: "admin".to_string(),
                password: "admin123".to_string(),
            },
        )
        .await;
        result.unwrap();
        assert_eq!(out, "Logged in as 管理员 (ADMIN)\n");

        // A fresh process sees the persisted session
        let ctx = context(&server, Arc::new(FileStore::open(&file).unwrap()));
        let (result, out) = run(
            &ctx,
            Commands::Open {
                path: "/tasks".to_string(),
            },
        )
        .await;
        result.unwrap();
        assert_eq!(out, "/tasks -> Tasks\n");

        let (result, out) = run(
            &ctx,
            Commands::Get {
                path: "/api/tasks".to_string(),
            },
        )
        .await;
        result.unwrap();
        assert_eq!(out, "[]\n");

        let (result, _) = run(&ctx, Commands::Logout).await;
        result.unwrap();
        assert_eq!(ctx.router.current_path().as_deref(), Some("/login"));
        let reloaded = FileStore::open(&file).unwrap();
        assert_eq!(reloaded.get("token").unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_with_expired_token_reports_redirect() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/materials"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let storage = Arc::new(MemoryStore::new());
        storage.set("token", "stale").unwrap();
        let ctx = context(&server, storage.clone());

        let (result, out) = run(
            &ctx,
            Commands::Get {
                path: "/api/materials".to_string(),
            },
        )
        .await;
        assert!(result.is_err());
        assert_eq!(out, "Session expired, redirected to /login\n");
        assert_eq!(storage.get("token").unwrap(), None);
    }

    #[tokio::test]
    async fn test_session_redacts_token() {
        let server = MockServer::start().await;
        let storage = Arc::new(MemoryStore::new());
        storage.set("token", "abc123").unwrap();
        storage.set("roles", r#"["ADMIN"]"#).unwrap();
        let ctx = context(&server, storage);

        let (result, out) = run(&ctx, Commands::Session { show_token: false }).await;
        result.unwrap();
        let printed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(printed["authenticated"], json!(true));
        assert_eq!(printed["token"], json!("<redacted>"));
        assert_eq!(printed["roles"], json!(["ADMIN"]));
    }

    #[tokio::test]
    async fn test_whoami_requires_login() {
        let server = MockServer::start().await;
        let ctx = context(&server, Arc::new(MemoryStore::new()));

        let (result, _) = run(&ctx, Commands::Whoami { refresh: false }).await;
        assert!(result.is_err());
    }
}
