//! Proactive token refresh: the session fetches a re-signed stream URL
//! ahead of expiry and swaps the engine onto it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use rstest::rstest;
use zoetrope::api::{ApiClient, ApiOptions};
use zoetrope::player::{PlaybackController, SessionEvent, SessionOptions};
use zoetrope_test_utils::{signed_token, tracing_setup, ScriptedFactory, StubHost, TestHttpServer};

use super::fixture::{
    next_event, quick_options, wait_for_created, wait_for_error, wait_for_ready, PlayerRig,
};
use crate::common::{details_for, VideoService};

fn refresh_options() -> SessionOptions {
    quick_options()
        .with_refresh_grace(Duration::from_secs(1))
        .with_refresh_retry_delay(Duration::from_millis(50))
}

#[rstest]
#[timeout(Duration::from_secs(15))]
#[tokio::test]
async fn token_expiry_rebuilds_the_engine_on_a_fresh_url(_tracing_setup: ()) {
    // Two-second tokens with a one-second grace: refresh lands after ~1s.
    let service = VideoService::start_with_ttl(Duration::from_secs(2)).await;
    let mut rig = PlayerRig::assemble(service, StubHost::media_source(), refresh_options());
    rig.load_until_ready("clip").await;
    let first = rig.probe();

    wait_for_created(&rig.factory, 2).await;
    rig.controller.shutdown().await;

    assert!(first.is_destroyed());
    assert_eq!(rig.factory.created(), 2);
    assert_eq!(rig.factory.peak_live(), 1);
    assert_eq!(rig.factory.live(), 0);
    assert_eq!(rig.service.stream_hits(), 2);

    let second = rig.factory.engine(1);
    assert!(first.loads()[0].path().contains("/v1/"));
    assert!(second.loads()[0].path().contains("/v2/"));
}

/// Serves metadata for any id and scripts the stream-url route per call.
async fn scripted_signer<F>(respond: F) -> (TestHttpServer, Arc<AtomicUsize>)
where
    F: Fn(usize) -> (StatusCode, String) + Clone + Send + Sync + 'static,
{
    let hits = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route("/videos/{id}", get(|| async { Json(details_for("clip")) }))
        .route("/videos/{id}/hls-stream-url", {
            let hits = hits.clone();
            get(move || {
                let hits = hits.clone();
                let respond = respond.clone();
                async move { respond(hits.fetch_add(1, Ordering::SeqCst) + 1) }
            })
        })
        .route("/videos/{id}/views", patch(|| async { StatusCode::OK }));
    (TestHttpServer::new(router).await, hits)
}

fn signer_rig(server: &TestHttpServer, factory: &Arc<ScriptedFactory>) -> PlaybackController {
    PlaybackController::new(
        Arc::new(ApiClient::new(ApiOptions::new(server.base_url().clone()))),
        factory.clone(),
        Arc::new(StubHost::media_source()),
        refresh_options(),
    )
}

#[rstest]
#[timeout(Duration::from_secs(15))]
#[tokio::test]
async fn one_refresh_setback_is_retried(_tracing_setup: ()) {
    // Signing call 2 fails; the retry (call 3) succeeds with a long token.
    let (server, hits) = scripted_signer(|serial| match serial {
        2 => (StatusCode::SERVICE_UNAVAILABLE, String::new()),
        _ => {
            let ttl = if serial == 1 { 2 } else { 3600 };
            (
                StatusCode::OK,
                format!(
                    "/stream/clip/v{serial}/index.m3u8?token={}",
                    signed_token(Duration::from_secs(ttl))
                ),
            )
        }
    })
    .await;
    let factory = Arc::new(ScriptedFactory::new());
    let mut controller = signer_rig(&server, &factory);
    let mut events = controller.subscribe();

    controller.load("clip");
    wait_for_ready(&mut events).await;
    let first = factory.engine(0);

    wait_for_created(&factory, 2).await;
    controller.shutdown().await;

    assert_eq!(hits.load(Ordering::SeqCst), 3);
    assert!(first.is_destroyed());
    assert!(factory.engine(1).loads()[0].path().contains("/v3/"));
    while let Ok(event) = events.try_recv() {
        assert!(
            !matches!(event, SessionEvent::StatusChanged(_)),
            "unexpected status change after ready: {event:?}"
        );
    }
}

#[rstest]
#[timeout(Duration::from_secs(15))]
#[tokio::test]
async fn a_second_consecutive_setback_ends_the_session(_tracing_setup: ()) {
    let (server, hits) = scripted_signer(|serial| {
        if serial == 1 {
            (
                StatusCode::OK,
                format!(
                    "/stream/clip/v1/index.m3u8?token={}",
                    signed_token(Duration::from_secs(2))
                ),
            )
        } else {
            (StatusCode::SERVICE_UNAVAILABLE, String::new())
        }
    })
    .await;
    let factory = Arc::new(ScriptedFactory::new());
    let mut controller = signer_rig(&server, &factory);
    let mut events = controller.subscribe();

    controller.load("clip");
    wait_for_ready(&mut events).await;

    let message = wait_for_error(&mut events).await;
    assert_eq!(message, "failed to load video stream");
    assert!(matches!(
        next_event(&mut events).await,
        SessionEvent::Redirect
    ));
    assert_eq!(hits.load(Ordering::SeqCst), 3);
    assert_eq!(factory.created(), 1);
    assert!(factory.engine(0).is_destroyed());

    controller.shutdown().await;
}

#[rstest]
#[timeout(Duration::from_secs(15))]
#[tokio::test]
async fn an_unchanged_stream_url_counts_as_a_setback(_tracing_setup: ()) {
    // The signer keeps handing out the very same signed URL.
    let stale = format!(
        "/stream/clip/v1/index.m3u8?token={}",
        signed_token(Duration::from_secs(2))
    );
    let (server, hits) = scripted_signer(move |_| (StatusCode::OK, stale.clone())).await;
    let factory = Arc::new(ScriptedFactory::new());
    let mut controller = signer_rig(&server, &factory);
    let mut events = controller.subscribe();

    controller.load("clip");
    wait_for_ready(&mut events).await;

    let message = wait_for_error(&mut events).await;
    assert_eq!(message, "signing service returned the same stream url");
    assert!(matches!(
        next_event(&mut events).await,
        SessionEvent::Redirect
    ));
    assert_eq!(hits.load(Ordering::SeqCst), 3);
    assert_eq!(factory.created(), 1);

    controller.shutdown().await;
}
