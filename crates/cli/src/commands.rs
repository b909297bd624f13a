//! CLI commands

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use ojt_http::types::RegistrationRequest;
use ojt_session::{Access, Role, SessionStore, authorize};
use serde_json::{Map, Value, json};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Subcommand)]
pub enum Commands {
    /// Ask the backend whether a session is active and who owns it
    CheckAuth,

    /// Sign in, optionally call protected endpoints, then optionally sign out
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "OJT_PASSWORD", hide_env_values = true)]
        password: String,

        /// Protected path to GET after signing in (repeatable)
        #[arg(long = "fetch", value_name = "PATH")]
        fetch: Vec<String>,

        /// Sign out again before exiting
        #[arg(long)]
        logout: bool,
    },

    /// Create an account from a JSON registration payload
    Register {
        /// File holding the registration fields
        payload: PathBuf,
    },

    /// GET a protected path
    Fetch {
        /// Path relative to the API root, e.g. /applications/
        path: String,

        /// Sign in as this user first
        #[arg(short, long, requires = "password")]
        username: Option<String>,

        #[arg(short, long, env = "OJT_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Only proceed for accounts with this role (repeatable)
        #[arg(long = "role", value_name = "ROLE")]
        roles: Vec<Role>,
    },

    /// Print the resolved configuration
    Config,
}

impl Commands {
    pub async fn execute(self, store: &SessionStore) -> Result<Value> {
        match self {
            Self::CheckAuth => check_auth(store).await,
            Self::Login {
                username,
                password,
                fetch,
                logout,
            } => login(store, &username, &password, &fetch, logout).await,
            Self::Register { payload } => register(store, payload).await,
            Self::Fetch {
                path,
                username,
                password,
                roles,
            } => {
                let credentials = username.zip(password);
                fetch(store, &path, credentials, &roles).await
            }
            // Handled before a session exists
            Self::Config => Ok(Value::Null),
        }
    }
}

async fn check_auth(store: &SessionStore) -> Result<Value> {
    let status = store.initialize().await;
    info!(%status, "session checked");
    Ok(serde_json::to_value(store.session())?)
}

async fn login(
    store: &SessionStore,
    username: &str,
    password: &str,
    paths: &[String],
    logout: bool,
) -> Result<Value> {
    let user = store.login(username, password).await?;

    let mut responses = Map::new();
    for path in paths {
        debug!(path = %path, "fetching");
        let body: Value = store
            .client()
            .get(path)
            .await
            .with_context(|| format!("GET {path}"))?;
        responses.insert(path.clone(), body);
    }

    if logout {
        store.logout().await;
    }

    Ok(json!({
        "user": user,
        "responses": responses,
        "session": store.session(),
    }))
}

async fn register(store: &SessionStore, payload: PathBuf) -> Result<Value> {
    let content = tokio::fs::read_to_string(&payload)
        .await
        .with_context(|| format!("reading {}", payload.display()))?;
    let registration: RegistrationRequest = serde_json::from_str(&content)
        .with_context(|| format!("parsing {}", payload.display()))?;

    let user = store.register(&registration).await?;
    info!(user = %user.username, "account created");

    Ok(serde_json::to_value(store.session())?)
}

async fn fetch(
    store: &SessionStore,
    path: &str,
    credentials: Option<(String, String)>,
    roles: &[Role],
) -> Result<Value> {
    if let Some((username, password)) = credentials {
        store.login(&username, &password).await?;
    } else {
        store.initialize().await;
    }

    match authorize(&store.session(), roles) {
        Access::Granted(user) => {
            let body: Value = store
                .client()
                .get(path)
                .await
                .with_context(|| format!("GET {path}"))?;
            Ok(json!({
                "user": user.username,
                "path": path,
                "response": body,
            }))
        }
        Access::SignInRequired => bail!("not signed in; pass --username and --password"),
        Access::Forbidden(role) => bail!("{role} accounts may not access {path}"),
        Access::Pending => bail!("session is still initializing"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ojt_http::OjtClient;
    use ojt_session::Session;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn auth_body(username: &str, role: &str) -> Value {
        json!({
            "success": true,
            "user": {"id": 4, "username": username, "role": role}
        })
    }

    fn store_for(server: &MockServer) -> SessionStore {
        SessionStore::new(OjtClient::new(server.uri()).unwrap())
    }

    #[tokio::test]
    async fn login_fetches_and_logs_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("maria", "student")))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/applications/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/logout/"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server);
        let output = Commands::Login {
            username: "maria".into(),
            password: "secret1".into(),
            fetch: vec!["/applications/".into()],
            logout: true,
        }
        .execute(&store)
        .await
        .unwrap();

        assert_eq!(output["user"]["username"], "maria");
        assert_eq!(output["responses"]["/applications/"], json!([{"id": 1}]));
        assert_eq!(output["session"]["status"], "unauthenticated");
        assert_eq!(store.session(), Session::Unauthenticated);
    }

    #[tokio::test]
    async fn fetch_without_session_requires_sign_in() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/check-auth/"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/listings/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let store = store_for(&server);
        let err = Commands::Fetch {
            path: "/listings/".into(),
            username: None,
            password: None,
            roles: vec![],
        }
        .execute(&store)
        .await
        .unwrap_err();

        assert!(err.to_string().contains("not signed in"));
    }

    #[tokio::test]
    async fn fetch_enforces_roles() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("maria", "student")))
            .mount(&server)
            .await;

        let store = store_for(&server);
        let err = Commands::Fetch {
            path: "/dashboard/company-stats/".into(),
            username: Some("maria".into()),
            password: Some("secret1".into()),
            roles: vec![Role::Company],
        }
        .execute(&store)
        .await
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "student accounts may not access /dashboard/company-stats/"
        );
    }

    #[tokio::test]
    async fn rejected_login_surfaces_reason() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login/"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({"non_field_errors": ["Account is disabled"]})),
            )
            .mount(&server)
            .await;

        let store = store_for(&server);
        let err = Commands::Login {
            username: "maria".into(),
            password: "secret1".into(),
            fetch: vec![],
            logout: false,
        }
        .execute(&store)
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "Account is disabled");
    }

    #[tokio::test]
    async fn register_reads_payload_file() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/register/"))
            .respond_with(ResponseTemplate::new(201).set_body_json(auth_body("acme", "company")))
            .mount(&server)
            .await;

        let payload = std::env::temp_dir().join(format!("ojt-register-{}.json", std::process::id()));
        std::fs::write(
            &payload,
            json!({
                "username": "acme",
                "email": "hr@acme.test",
                "password": "secret1",
                "confirm_password": "secret1",
                "role": "company",
                "company_name": "Acme"
            })
            .to_string(),
        )
        .unwrap();

        let store = store_for(&server);
        let output = Commands::Register {
            payload: payload.clone(),
        }
        .execute(&store)
        .await
        .unwrap();
        std::fs::remove_file(&payload).ok();

        assert_eq!(output["status"], "authenticated");
        assert_eq!(output["user"]["role"], "company");
    }
}
