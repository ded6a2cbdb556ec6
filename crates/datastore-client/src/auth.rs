//! Bearer-token authentication.
//!
//! A [`TokenProvider`] hands out the current JWT; [`AuthInterceptor`] puts it
//! on every outgoing request as `authorization: Bearer <token>`. Token
//! lookup for [`JwtTokenProvider`] goes, in order:
//!
//! 1. `NIGEL_SERVICES_JWT_TOKEN` environment variable
//! 2. the last token obtained, while it is more than 60 s from expiry
//! 3. `nigel auth token`, located via `NIGEL_CLI_PATH`, `PATH`, then the
//!    per-platform install locations

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use parking_lot::Mutex;
use thiserror::Error;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::service::Interceptor;
use tonic::{Request, Status};

/// Environment variable holding a ready-made token.
pub const TOKEN_ENV_VAR: &str = "NIGEL_SERVICES_JWT_TOKEN";
/// Environment variable pointing at the `nigel` executable.
pub const CLI_PATH_ENV_VAR: &str = "NIGEL_CLI_PATH";

const EXPIRY_BUFFER_SECS: f64 = 60.0;
const CLI_TIMEOUT: Duration = Duration::from_secs(10);
const CLI_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Errors obtaining an authentication token.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The `nigel` executable could not be located.
    #[error("nigel CLI not found; set {CLI_PATH_ENV_VAR} or add it to PATH")]
    CliNotFound,

    /// The CLI ran but exited unsuccessfully.
    #[error("nigel auth token failed ({status}): {stderr}")]
    CliFailed {
        /// Exit status description.
        status: String,
        /// Captured standard error.
        stderr: String,
    },

    /// The CLI did not finish in time.
    #[error("nigel auth token timed out after {0:?}")]
    CliTimeout(Duration),

    /// The CLI printed nothing.
    #[error("nigel auth token returned an empty token")]
    EmptyToken,

    /// Spawning or talking to the CLI failed.
    #[error("Failed to run nigel CLI: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of bearer tokens.
pub trait TokenProvider: Send + Sync + fmt::Debug {
    /// Current token, or why none is available.
    fn token(&self) -> Result<String, AuthError>;
}

/// Always returns the same configured token.
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    /// Provider for a fixed token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("token", &"<redacted>")
            .finish()
    }
}

impl TokenProvider for StaticTokenProvider {
    fn token(&self) -> Result<String, AuthError> {
        Ok(self.token.clone())
    }
}

/// Token provider backed by the environment and the `nigel` CLI.
///
/// `token()` runs inside tonic's synchronous interceptor. When neither
/// `NIGEL_SERVICES_JWT_TOKEN` nor a configured `jwt_token` is set and no
/// unexpired token is cached, it spawns `nigel auth token` and blocks the
/// calling thread for up to 10 s. On a Tokio runtime that stalls a worker
/// thread, so call [`JwtTokenProvider::prefetch`] from `spawn_blocking`
/// before the first request to fill the cache off the request path.
#[derive(Default)]
pub struct JwtTokenProvider {
    cached: Mutex<Option<String>>,
    cli_path: Option<PathBuf>,
}

impl fmt::Debug for JwtTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtTokenProvider")
            .field("cached", &self.cached.lock().is_some())
            .field("cli_path", &self.cli_path)
            .finish()
    }
}

impl JwtTokenProvider {
    /// Provider that discovers the CLI on first use.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider that runs a specific CLI executable.
    #[must_use]
    pub fn with_cli_path(path: impl Into<PathBuf>) -> Self {
        Self {
            cached: Mutex::new(None),
            cli_path: Some(path.into()),
        }
    }

    /// Resolve a token now so later interceptor calls hit the cache.
    pub fn prefetch(&self) -> Result<(), AuthError> {
        self.token().map(drop)
    }

    fn fetch_from_cli(&self) -> Result<String, AuthError> {
        let path = match &self.cli_path {
            Some(path) => path.clone(),
            None => find_nigel_executable().ok_or(AuthError::CliNotFound)?,
        };
        tracing::debug!(cli = %path.display(), "Requesting token from nigel CLI");
        run_token_command(&path, CLI_TIMEOUT)
    }
}

impl TokenProvider for JwtTokenProvider {
    fn token(&self) -> Result<String, AuthError> {
        if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
            if !token.trim().is_empty() {
                return Ok(token.trim().to_string());
            }
        }

        let mut cached = self.cached.lock();
        if let Some(token) = cached.as_ref() {
            if !is_token_expired(token, unix_now()) {
                return Ok(token.clone());
            }
            tracing::debug!("Cached token expired or expiring soon");
        }

        let token = self.fetch_from_cli()?;
        *cached = Some(token.clone());
        Ok(token)
    }
}

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Whether `token` is expired (or within 60 s of it) at `now` (Unix seconds).
///
/// Tokens that cannot be decoded or carry no `exp` claim count as expired.
#[must_use]
pub fn is_token_expired(token: &str, now: f64) -> bool {
    let Some(payload) = token.split('.').nth(1) else {
        tracing::warn!("Malformed JWT token");
        return true;
    };
    let claims: serde_json::Value = match URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
    {
        Some(claims) => claims,
        None => {
            tracing::warn!("Could not decode JWT payload");
            return true;
        }
    };
    match claims.get("exp").and_then(serde_json::Value::as_f64) {
        Some(exp) => now >= exp - EXPIRY_BUFFER_SECS,
        None => {
            tracing::warn!("JWT token missing 'exp' claim");
            true
        }
    }
}

fn executable_name() -> &'static str {
    if cfg!(windows) {
        "nigel.exe"
    } else {
        "nigel"
    }
}

fn platform_candidates() -> Vec<PathBuf> {
    let home = dirs::home_dir();
    if cfg!(windows) {
        dirs::data_local_dir()
            .map(|dir| vec![dir.join("nigel").join("nigel.exe")])
            .unwrap_or_default()
    } else if cfg!(target_os = "macos") {
        let mut paths = vec![PathBuf::from("/usr/local/bin/nigel")];
        paths.extend(home.map(|h| h.join(".local/bin/nigel")));
        paths
    } else {
        home.map(|h| {
            vec![
                h.join(".local/bin/nigel"),
                h.join("bin/nigel"),
                h.join("opt/nigel/bin/nigel"),
            ]
        })
        .unwrap_or_default()
    }
}

/// Locate the `nigel` executable.
#[must_use]
pub fn find_nigel_executable() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CLI_PATH_ENV_VAR) {
        let path = PathBuf::from(path);
        if path.is_file() {
            return Some(path);
        }
        tracing::warn!(path = %path.display(), "{CLI_PATH_ENV_VAR} does not name a file");
    }

    if let Some(paths) = std::env::var_os("PATH") {
        if let Some(found) = std::env::split_paths(&paths)
            .map(|dir| dir.join(executable_name()))
            .find(|candidate| candidate.is_file())
        {
            return Some(found);
        }
    }

    platform_candidates().into_iter().find(|p| p.is_file())
}

fn run_token_command(path: &Path, timeout: Duration) -> Result<String, AuthError> {
    let mut child = Command::new(path)
        .args(["auth", "token"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let deadline = Instant::now() + timeout;
    while child.try_wait()?.is_none() {
        if Instant::now() >= deadline {
            // Best effort; the child may exit between the check and the kill.
            let _ = child.kill();
            let _ = child.wait();
            return Err(AuthError::CliTimeout(timeout));
        }
        std::thread::sleep(CLI_POLL_INTERVAL);
    }

    let output = child.wait_with_output()?;
    if !output.status.success() {
        return Err(AuthError::CliFailed {
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(AuthError::EmptyToken);
    }
    Ok(token)
}

/// Interceptor adding `authorization: Bearer <token>` to each request.
///
/// With no provider the request passes through untouched. When the provider
/// fails, the failure is logged and the request is sent without a token.
#[derive(Clone, Default)]
pub struct AuthInterceptor {
    provider: Option<Arc<dyn TokenProvider>>,
}

impl AuthInterceptor {
    /// Interceptor using `provider`.
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// Interceptor that never adds a token.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }
}

impl fmt::Debug for AuthInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthInterceptor")
            .field("provider", &self.provider)
            .finish()
    }
}

impl Interceptor for AuthInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        let Some(provider) = &self.provider else {
            return Ok(request);
        };
        match provider.token() {
            Ok(token) => match MetadataValue::<Ascii>::try_from(format!("Bearer {token}")) {
                Ok(value) => {
                    request.metadata_mut().insert("authorization", value);
                }
                Err(e) => tracing::warn!(error = %e, "Token is not a valid header value"),
            },
            Err(e) => {
                tracing::warn!(error = %e, "Failed to obtain JWT token, proceeding without auth");
            }
        }
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn token_with_payload(payload: &str) -> String {
        format!("e30.{}.sig", URL_SAFE_NO_PAD.encode(payload))
    }

    #[test]
    fn test_expiry_uses_buffer() {
        let token = token_with_payload(r#"{"exp": 1000}"#);
        assert!(!is_token_expired(&token, 900.0));
        assert!(is_token_expired(&token, 940.0));
        assert!(is_token_expired(&token, 1200.0));
    }

    #[test]
    fn test_undecodable_tokens_are_expired() {
        assert!(is_token_expired("not-a-jwt", 0.0));
        assert!(is_token_expired("a.!!!.c", 0.0));
        assert!(is_token_expired(&token_with_payload(r#"{"sub": "x"}"#), 0.0));
    }

    #[test]
    #[serial]
    fn test_env_token_wins() {
        std::env::set_var(TOKEN_ENV_VAR, " env-token \n");
        let provider = JwtTokenProvider::with_cli_path("/nonexistent/nigel");
        let token = provider.token();
        std::env::remove_var(TOKEN_ENV_VAR);
        assert_eq!(token.unwrap(), "env-token");
    }

    #[test]
    #[serial]
    fn test_cached_token_reused_until_expiry() {
        std::env::remove_var(TOKEN_ENV_VAR);
        let fresh = token_with_payload(&format!(r#"{{"exp": {}}}"#, unix_now() + 3600.0));
        let provider = JwtTokenProvider::with_cli_path("/nonexistent/nigel");
        *provider.cached.lock() = Some(fresh.clone());
        assert_eq!(provider.token().unwrap(), fresh);

        *provider.cached.lock() = Some(token_with_payload(r#"{"exp": 1}"#));
        assert!(matches!(provider.token(), Err(AuthError::Io(_))));
    }

    #[cfg(unix)]
    #[test]
    #[serial]
    fn test_cli_token_is_trimmed_and_cached() {
        use std::os::unix::fs::PermissionsExt;

        std::env::remove_var(TOKEN_ENV_VAR);
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("nigel");
        std::fs::write(&script, "#!/bin/sh\necho \"  cli-token  \"\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let provider = JwtTokenProvider::with_cli_path(&script);
        assert_eq!(provider.token().unwrap(), "cli-token");
        assert_eq!(provider.cached.lock().as_deref(), Some("cli-token"));
    }

    #[cfg(unix)]
    #[test]
    #[serial]
    fn test_prefetch_fills_cache_for_later_requests() {
        use std::os::unix::fs::PermissionsExt;

        std::env::remove_var(TOKEN_ENV_VAR);
        let token = token_with_payload(r#"{"exp": 4102444800}"#);
        let dir = tempfile::tempdir().unwrap();
        let calls = dir.path().join("calls");
        let script = dir.path().join("nigel");
        std::fs::write(
            &script,
            format!("#!/bin/sh\necho x >> '{}'\necho {token}\n", calls.display()),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let provider = JwtTokenProvider::with_cli_path(&script);
        provider.prefetch().unwrap();
        assert_eq!(provider.token().unwrap(), token);
        assert_eq!(provider.token().unwrap(), token);
        assert_eq!(std::fs::read_to_string(&calls).unwrap().lines().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_cli_failure_is_reported() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("nigel");
        std::fs::write(&script, "#!/bin/sh\necho denied >&2\nexit 3\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        match run_token_command(&script, CLI_TIMEOUT) {
            Err(AuthError::CliFailed { stderr, .. }) => assert_eq!(stderr, "denied"),
            other => panic!("expected CliFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_interceptor_adds_bearer_header() {
        let mut interceptor = AuthInterceptor::new(Arc::new(StaticTokenProvider::new("abc")));
        let request = interceptor.call(Request::new(())).unwrap();
        let header = request.metadata().get("authorization").unwrap();
        assert_eq!(header.to_str().unwrap(), "Bearer abc");
    }

    #[derive(Debug)]
    struct FailingProvider;

    impl TokenProvider for FailingProvider {
        fn token(&self) -> Result<String, AuthError> {
            Err(AuthError::CliNotFound)
        }
    }

    #[test]
    fn test_interceptor_proceeds_without_token_on_failure() {
        let mut interceptor = AuthInterceptor::new(Arc::new(FailingProvider));
        let request = interceptor.call(Request::new(())).unwrap();
        assert!(request.metadata().get("authorization").is_none());

        let mut disabled = AuthInterceptor::disabled();
        let request = disabled.call(Request::new(())).unwrap();
        assert!(request.metadata().get("authorization").is_none());
    }
}
