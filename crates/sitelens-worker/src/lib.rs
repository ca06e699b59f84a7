//! Cloudflare Worker for sitelens
//!
//! Serves the site audit API on top of sitelens-core:
//! - `POST /api/tools/audit` with `{"url": "..."}`, bearer-token gated
//! - `GET /health`
//!
//! The request handler and the Fetch API transport only exist on wasm32;
//! the request parsing helpers build everywhere so they can be unit tested.

#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

use std::time::Duration;

#[cfg(target_arch = "wasm32")]
use async_trait::async_trait;
#[cfg(target_arch = "wasm32")]
use futures::future::{Either, select};
#[cfg(target_arch = "wasm32")]
use futures::pin_mut;
#[cfg(target_arch = "wasm32")]
use serde::Serialize;
use sitelens_core::auditor::MISSING_URL_MESSAGE;
use sitelens_core::{AuditConfig, AuditError, AuditRequest, ErrorBody};
#[cfg(target_arch = "wasm32")]
use sitelens_core::{FetchError, FetchRequest, PageAuditor, PageFetcher};
use worker::*;

const AUDIT_PATH: &str = "/api/tools/audit";

/// Secret holding the bearer token callers must present
const AUTH_TOKEN_SECRET: &str = "AUTH_TOKEN";
const TIMEOUT_VAR: &str = "AUDIT_TIMEOUT_SECS";
const USER_AGENT_VAR: &str = "AUDIT_USER_AGENT";

const NO_TOKEN_MESSAGE: &str = "Not authorized, no token";
const BAD_TOKEN_MESSAGE: &str = "Not authorized, token failed";

/// Page transport over the Workers Fetch API.
///
/// The request races a timer; on expiry the fetch is aborted.
#[cfg(target_arch = "wasm32")]
struct WorkerFetcher;

#[cfg(target_arch = "wasm32")]
#[async_trait(?Send)]
impl PageFetcher for WorkerFetcher {
    async fn fetch(&self, request: &FetchRequest<'_>) -> std::result::Result<String, FetchError> {
        let mut outbound = Request::new(request.url, Method::Get)
            .map_err(|e| FetchError::transport(e.to_string()))?;
        outbound
            .headers_mut()
            .and_then(|headers| headers.set("User-Agent", request.user_agent))
            .map_err(|e| FetchError::transport(e.to_string()))?;

        let controller = AbortController::default();
        let signal = controller.signal();
        let fetch = Fetch::Request(outbound);

        let download = download(&fetch, &signal);
        let timer = Delay::from(request.timeout);
        pin_mut!(download, timer);

        match select(download, timer).await {
            Either::Left((result, _)) => result,
            Either::Right(_) => {
                controller.abort();
                Err(FetchError::Timeout {
                    timeout: request.timeout,
                })
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
async fn download(fetch: &Fetch, signal: &AbortSignal) -> std::result::Result<String, FetchError> {
    let mut response = fetch
        .send_with_signal(signal)
        .await
        .map_err(|e| FetchError::transport(e.to_string()))?;

    let status = response.status_code();
    if !(200..300).contains(&status) {
        return Err(FetchError::Status { status });
    }

    response
        .text()
        .await
        .map_err(|e| FetchError::Body(e.to_string()))
}

/// Validate an `Authorization` header against the configured token.
///
/// Without a configured token every request is rejected.
fn check_bearer(
    header: Option<&str>,
    expected: Option<&str>,
) -> std::result::Result<(), &'static str> {
    let token = header
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(NO_TOKEN_MESSAGE)?;

    match expected {
        Some(expected) if !expected.is_empty() && expected == token => Ok(()),
        _ => Err(BAD_TOKEN_MESSAGE),
    }
}

/// Parse the request body. Anything that is not a JSON object is treated
/// like a missing URL.
fn parse_audit_request(body: &str) -> std::result::Result<AuditRequest, AuditError> {
    serde_json::from_str(body).map_err(|_| AuditError::validation(MISSING_URL_MESSAGE))
}

/// Build the audit config from optional worker vars, falling back to defaults.
fn config_from_vars(timeout_secs: Option<&str>, user_agent: Option<&str>) -> AuditConfig {
    let mut config = AuditConfig::default();

    if let Some(raw) = timeout_secs {
        match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => config = config.with_timeout(Duration::from_secs(secs)),
            _ => console_warn!("[Worker] ignoring invalid {}: {:?}", TIMEOUT_VAR, raw),
        }
    }

    if let Some(user_agent) = user_agent.filter(|ua| !ua.trim().is_empty()) {
        config = config.with_user_agent(user_agent);
    }

    config
}

/// Body for runtime failures inside the audit handler, e.g. an unreadable
/// request body.
fn internal_error_body(error: &Error) -> ErrorBody {
    ErrorBody::new(format!("Failed to audit site: {error}"))
}

#[cfg(target_arch = "wasm32")]
fn config_from_env(env: &Env) -> AuditConfig {
    let timeout = env.var(TIMEOUT_VAR).ok().map(|v| v.to_string());
    let user_agent = env.var(USER_AGENT_VAR).ok().map(|v| v.to_string());
    config_from_vars(timeout.as_deref(), user_agent.as_deref())
}

#[cfg(target_arch = "wasm32")]
fn json_response<T: Serialize>(value: &T, status: u16) -> Result<Response> {
    Ok(Response::from_json(value)?.with_status(status))
}

#[cfg(target_arch = "wasm32")]
fn error_response(error: &AuditError) -> Result<Response> {
    json_response(&ErrorBody::from(error), error.status_code())
}

#[cfg(target_arch = "wasm32")]
fn with_cors(mut response: Response) -> Result<Response> {
    let headers = response.headers_mut();
    headers.set("Access-Control-Allow-Origin", "*")?;
    headers.set("Access-Control-Allow-Methods", "GET, POST, OPTIONS")?;
    headers.set("Access-Control-Allow-Headers", "Content-Type, Authorization")?;
    Ok(response)
}

#[cfg(target_arch = "wasm32")]
async fn handle_audit(mut req: Request, env: &Env) -> Result<Response> {
    let expected = env.secret(AUTH_TOKEN_SECRET).ok().map(|s| s.to_string());
    if expected.is_none() {
        console_warn!("[Worker] {} secret is not set; rejecting audit", AUTH_TOKEN_SECRET);
    }

    let authorization = req.headers().get("Authorization")?;
    if let Err(message) = check_bearer(authorization.as_deref(), expected.as_deref()) {
        return json_response(&ErrorBody::new(message), 401);
    }

    let body = req.text().await?;
    let request = match parse_audit_request(&body) {
        Ok(request) => request,
        Err(e) => return error_response(&e),
    };

    let auditor = PageAuditor::new(config_from_env(env), WorkerFetcher);
    match auditor.audit_request(&request).await {
        Ok(report) => {
            console_log!(
                "[Worker] Audited {}: score {}, {} issues",
                report.url,
                report.score,
                report.issues.len()
            );
            json_response(&report, 200)
        }
        Err(e) => {
            console_error!("[Worker] {}", e);
            error_response(&e)
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[event(fetch)]
async fn main(req: Request, env: Env, _ctx: Context) -> Result<Response> {
    console_error_panic_hook::set_once();

    let url = req.url()?;
    console_log!("[Worker] {} {}", req.method(), url.path());

    // Handle CORS preflight
    if req.method() == Method::Options {
        return with_cors(Response::empty()?);
    }

    let response = match url.path() {
        AUDIT_PATH if req.method() == Method::Post => match handle_audit(req, &env).await {
            Ok(response) => response,
            Err(e) => {
                console_error!("[Worker] audit handler failed: {}", e);
                json_response(&internal_error_body(&e), 500)?
            }
        },
        AUDIT_PATH => json_response(&ErrorBody::new("Method Not Allowed"), 405)?,
        "/health" => {
            let health = serde_json::json!({
                "status": "healthy",
                "version": env!("CARGO_PKG_VERSION")
            });
            json_response(&health, 200)?
        }
        _ => Response::error("Not Found", 404)?,
    };

    with_cors(response)
}
