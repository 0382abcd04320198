//! The main listener's only handler.
//!
//! Every request that passed the access filter lands here. A path ending in
//! `/Languages` gets the language listing; anything else is a check.

use std::time::Instant;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::{Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use tokio::sync::OwnedMutexGuard;
use tracing::{info, warn};

use crate::check::{CheckRequest, param};
use crate::error::{CheckError, CheckResult};
use crate::params::ParameterMap;
use crate::state::AppState;
use crate::xml::{self, CONTEXT_SIZE, XML_CONTENT_TYPE};

/// Path suffix selecting the language listing.
pub const LANGUAGES_SUFFIX: &str = "/Languages";

/// Every path goes through the fallback.
pub fn router() -> Router<AppState> {
    Router::new().fallback(dispatch)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Languages,
    Check,
}

impl Route {
    fn for_path(path: &str) -> Self {
        if path.ends_with(LANGUAGES_SUFFIX) {
            Route::Languages
        } else {
            Route::Check
        }
    }

    fn label(self) -> &'static str {
        match self {
            Route::Languages => "languages",
            Route::Check => "check",
        }
    }
}

async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    // Listings hold the region here; checks hand it to the blocking task.
    let mut exclusive = state.exclusive().await;
    let route = Route::for_path(uri.path());

    let result = match read_parameters(&method, &uri, body) {
        Ok(params) => match route {
            Route::Languages => Ok(xml::languages_xml(&state.registry().languages())),
            Route::Check => run_check(&state, params, exclusive.take()).await,
        },
        Err(err) => Err(err),
    };

    let response = match result {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, XML_CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(err) => {
            state.metrics().record_error(err.kind().as_str());
            err.into_response()
        }
    };

    state
        .metrics()
        .record_request(route.label(), response.status().as_u16());
    response
}

/// Query string for everything but POST, whose parameters are the first body line.
fn read_parameters(
    method: &Method,
    uri: &Uri,
    body: Result<Bytes, BytesRejection>,
) -> CheckResult<ParameterMap> {
    if *method != Method::POST {
        return ParameterMap::parse(uri.query().unwrap_or_default());
    }

    let body = body.map_err(|rejection| CheckError::MalformedRequest {
        reason: rejection.body_text(),
    })?;
    let body = std::str::from_utf8(&body).map_err(|e| CheckError::MalformedRequest {
        reason: format!("body is not UTF-8: {e}"),
    })?;
    ParameterMap::parse_body(body)
}

/// Validate and run a check on the blocking pool.
///
/// `exclusive` moves into the blocking task, so a dropped client cannot
/// release the serialized region while its engine work is still running.
async fn run_check(
    state: &AppState,
    params: ParameterMap,
    exclusive: Option<OwnedMutexGuard<()>>,
) -> CheckResult<String> {
    let request = match CheckRequest::from_params(&params, state.registry()) {
        Ok(request) => request,
        Err(err) => {
            log_failed_text(state, params.get(param::TEXT), &err);
            return Err(err);
        }
    };

    let mode = request.mode();
    let failed_text = state.verbose().then(|| request.checked_text().to_string());
    let started = Instant::now();

    let worker = state.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let _exclusive = exclusive;
        request
            .run(worker.registry(), worker.engines())
            .map(|matches| xml::matches_xml(&matches, request.checked_text(), CONTEXT_SIZE))
    })
    .await
    .map_err(|e| {
        CheckError::EngineTask(if e.is_panic() {
            "engine panicked".to_string()
        } else {
            "engine task cancelled".to_string()
        })
    })
    .and_then(|rendered| rendered);

    match outcome {
        Ok(xml) => {
            let elapsed = started.elapsed();
            state.metrics().record_check(mode, elapsed.as_secs_f64());
            info!(mode, ?elapsed, "check finished");
            Ok(xml)
        }
        Err(err) => {
            log_failed_text(state, failed_text.as_deref(), &err);
            Err(err)
        }
    }
}

fn log_failed_text(state: &AppState, text: Option<&str>, err: &CheckError) {
    if state.verbose()
        && let Some(text) = text
    {
        warn!(error = %err, text, "check failed");
    }
}
