//! The request pipeline.
//!
//! # Stages
//! ```text
//! OPTIONS → 200                      (no auth, no admission)
//! method != GET → InvalidMethod
//! auth → InvalidSecret
//! /health → 200                      (never waits for admission)
//! metrics + admission slot + deadline
//! parse → check → download → check → ETag / 304 → check
//!       → process → check → encode
//! ```
//!
//! Every stage returns an [`ImageResult`]; [`handle_request`] is the single
//! point where a failure becomes an error response. Panics are not caught
//! and take down the connection task instead.

use axum::{
    extract::{Request, State},
    http::{request::Parts, Method, StatusCode, Uri},
    response::Response,
};
use tracing::Instrument;

use crate::error::{classify, ImageError, ImageResult};
use crate::http::request::RequestId;
use crate::http::response;
use crate::http::server::AppState;
use crate::observability::logging::{log_error, log_response};
use crate::observability::metrics::{self, ErrorSource, RequestTimer};
use crate::processing::{etag, ParsedRequest, ProcessingOptions};
use crate::resilience::Deadline;

/// Path answered by the health shortcut.
pub const HEALTH_PATH: &str = "/health";

/// Per-request state derived once the path is parsed.
#[derive(Debug)]
struct RequestContext<'a> {
    id: &'a RequestId,
    deadline: Deadline,
    options: ProcessingOptions,
    source_url: String,
}

/// Axum entry point for every request.
pub async fn handle_request(State(state): State<AppState>, request: Request) -> Response {
    let request_id = RequestId::generate();
    let (parts, _body) = request.into_parts();
    let span = tracing::info_span!("request", request_id = %request_id, method = %parts.method);

    async move {
        tracing::info!(target_uri = %request_target(&parts.uri), "Request started");

        let mut response = match run_pipeline(&state, &request_id, &parts).await {
            Ok(response) => response,
            Err(err) => respond_with_error(&request_id, &err),
        };

        state.cors.apply(response.headers_mut());
        response
    }
    .instrument(span)
    .await
}

fn request_target(uri: &Uri) -> &str {
    uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/")
}

fn respond_with_error(request_id: &RequestId, err: &ImageError) -> Response {
    log_error(request_id.as_str(), err);
    response::error(err)
}

async fn run_pipeline(state: &AppState, request_id: &RequestId, request: &Parts) -> ImageResult<Response> {
    if request.method == Method::OPTIONS {
        log_response(request_id.as_str(), StatusCode::OK, "Respond with options");
        return Ok(response::options());
    }
    if request.method != Method::GET {
        return Err(ImageError::invalid_method());
    }

    state.auth.check(&request.headers)?;

    if request_target(&request.uri) == HEALTH_PATH {
        return Ok(response::health());
    }

    let _timer = RequestTimer::start();
    let _permit = state.admission.acquire().await;
    let deadline = Deadline::start(state.write_timeout);

    let ParsedRequest { options, source_url } = state
        .collaborators
        .parser
        .parse(request)
        .map_err(classify)?;
    let ctx = RequestContext {
        id: request_id,
        deadline,
        options,
        source_url,
    };

    ctx.deadline.check()?;

    let image = ctx
        .deadline
        .run(state.collaborators.downloader.download(&ctx.source_url, &ctx.deadline))
        .await
        .inspect_err(|_| metrics::record_error(ErrorSource::Download))?;

    ctx.deadline.check()?;

    let etag = if state.etag_enabled {
        let etag = etag::calculate(image.data(), &ctx.options)?;
        if etag::matches(&request.headers, &etag) {
            log_response(ctx.id.as_str(), StatusCode::NOT_MODIFIED, "Not modified");
            return Ok(state.encoder.not_modified(&etag));
        }
        Some(etag)
    } else {
        None
    };

    ctx.deadline.check()?;

    let output = ctx
        .deadline
        .run(
            state
                .collaborators
                .processor
                .process(image.data(), &ctx.options, &ctx.deadline),
        )
        .await
        .inspect_err(|_| metrics::record_error(ErrorSource::Processing))?;

    ctx.deadline.check()?;

    respond_with_image(state, &ctx, request, etag.as_deref(), output)
}

fn respond_with_image(
    state: &AppState,
    ctx: &RequestContext<'_>,
    request: &Parts,
    etag: Option<&str>,
    data: axum::body::Bytes,
) -> ImageResult<Response> {
    let response = state
        .encoder
        .image(&request.headers, &ctx.options, &ctx.source_url, etag, data)?;

    log_response(
        ctx.id.as_str(),
        StatusCode::OK,
        &format!(
            "Processed in {:?}: {}; {:?}",
            ctx.deadline.elapsed(),
            ctx.source_url,
            ctx.options
        ),
    );
    Ok(response)
}
