//! Client Shell Entry Point
//!
//! Composition root for the session core: wires the credential store, the
//! session service, the interceptor-equipped HTTP client and the REST
//! gateway together, then dispatches a small set of commands for driving
//! the flows end to end against a running backend.
//!
//! Uses `anyhow` for startup errors; flow-level errors are `AuthError`.

use std::env;
use std::io::{BufRead, Write};
use std::sync::Arc;

use auth::models::Email;
use auth::{
    AuthConfig, ChallengeState, MfaChallenge, MfaSetupUseCase, Navigator, RestAuthGateway,
    SessionService, SignInInput, SignInOutcome, SignInUseCase,
};
use guard::{GuardDecision, RouteGuard};
use platform::config::HttpConfig;
use platform::http::HttpClient;
use platform::storage::FileCredentialStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// The shell has no router; a forced redirect is logged so the operator
/// sees where a browser would have been sent.
struct ShellNavigator;

impl Navigator for ShellNavigator {
    fn navigate(&self, path: &str) {
        tracing::info!(path, "navigation requested");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shell=info,auth=info,guard=info,platform=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let api_url = env::var("API_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());
    let session_file =
        env::var("SESSION_FILE").unwrap_or_else(|_| ".storefront-session.json".to_string());

    // Wiring: store -> session -> http (interceptors) -> gateway
    let auth_config = Arc::new(AuthConfig::default());
    let store = Arc::new(FileCredentialStore::open(&session_file));
    let session = Arc::new(SessionService::new(
        store.clone(),
        Arc::new(ShellNavigator),
        auth_config.clone(),
    ));
    session.restore();

    let http = Arc::new(HttpClient::new(
        &HttpConfig::with_base_url(api_url.clone()),
        store.clone(),
        session.clone(),
    )?);
    let gateway = Arc::new(RestAuthGateway::new(http));

    tracing::info!(api_url = %api_url, "client shell ready");

    let args: Vec<String> = env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("status") => status(&session, &gateway).await,
        Some("login") => {
            let (email, password) = match (args.get(1), args.get(2)) {
                (Some(email), Some(password)) => (email.clone(), password.clone()),
                _ => anyhow::bail!("usage: shell login <email> <password>"),
            };
            login(&gateway, &session, &auth_config, email, password).await
        }
        Some("logout") => {
            session.logout();
            println!("Signed out.");
            Ok(())
        }
        Some("mfa-status") => {
            let email = args
                .get(1)
                .ok_or_else(|| anyhow::anyhow!("usage: shell mfa-status <email>"))?;
            mfa_status(&gateway, email).await
        }
        Some(other) => {
            anyhow::bail!("unknown command {other}; expected status | login | logout | mfa-status")
        }
    }
}

async fn status(
    session: &Arc<SessionService<FileCredentialStore>>,
    gateway: &Arc<RestAuthGateway>,
) -> anyhow::Result<()> {
    match session.current() {
        None => println!("Not signed in."),
        Some(current) => {
            println!(
                "Signed in as {} (role: {})",
                current.nickname(),
                current
                    .role()
                    .map(|r| r.code())
                    .unwrap_or("unknown until next login")
            );

            // Live check, the same one guarded routes run on entry
            let decision = RouteGuard::admin()
                .check_on_entry(session, gateway.as_ref())
                .await;
            match decision {
                GuardDecision::Allow => println!("Admin routes: accessible"),
                GuardDecision::Deny(_) if session.is_authenticated() => {
                    println!("Admin routes: denied")
                }
                GuardDecision::Deny(_) => println!("Session was no longer valid; signed out."),
            }
        }
    }
    Ok(())
}

async fn login(
    gateway: &Arc<RestAuthGateway>,
    session: &Arc<SessionService<FileCredentialStore>>,
    auth_config: &Arc<AuthConfig>,
    email: String,
    password: String,
) -> anyhow::Result<()> {
    let sign_in = SignInUseCase::new(gateway.clone(), session.clone());
    let outcome = sign_in.execute(SignInInput { email, password }).await?;

    match outcome {
        SignInOutcome::Authenticated => {
            println!("Signed in.");
            Ok(())
        }
        SignInOutcome::MfaRequired { email } => challenge_loop(gateway, session, auth_config, email).await,
    }
}

/// Interactive stand-in for the MFA verification prompt
async fn challenge_loop(
    gateway: &Arc<RestAuthGateway>,
    session: &Arc<SessionService<FileCredentialStore>>,
    auth_config: &Arc<AuthConfig>,
    email: Email,
) -> anyhow::Result<()> {
    let challenge = MfaChallenge::new(gateway.clone(), session.clone(), email, auth_config);
    let stdin = std::io::stdin();

    loop {
        println!(
            "Enter the 6-digit code (or \"backup <code>\" / \"cancel\"); next rotation in {}s:",
            challenge.seconds_until_rotation()
        );
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            challenge.cancel();
            anyhow::bail!("input closed, sign-in abandoned");
        }
        let line = line.trim();

        let result = match line {
            "cancel" => {
                challenge.cancel();
                println!("Sign-in cancelled.");
                return Ok(());
            }
            _ => match line.strip_prefix("backup ") {
                Some(code) => challenge.submit_backup(code).await,
                None => challenge.submit(line).await,
            },
        };

        match result {
            Ok(ChallengeState::Authenticated) => {
                println!("Signed in.");
                return Ok(());
            }
            Ok(state) => {
                tracing::debug!(%state, "challenge not finished");
            }
            Err(e) => {
                println!(
                    "{}",
                    challenge.error().unwrap_or_else(|| e.to_string())
                );
            }
        }
    }
}

async fn mfa_status(gateway: &Arc<RestAuthGateway>, email: &str) -> anyhow::Result<()> {
    let email = Email::new(email)?;
    let use_case = MfaSetupUseCase::new(gateway.clone());
    let status = use_case.status(&email).await?;

    println!(
        "MFA for {}: {} (type: {}, backup codes: {})",
        status.email,
        if status.enabled { "enabled" } else { "disabled" },
        status.mfa_type,
        if status.has_backup_codes { "yes" } else { "no" },
    );
    if status.setup_required {
        println!("Setup is required before this account can sign in.");
    }
    Ok(())
}
