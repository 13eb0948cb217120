//! Fatal engine faults: one recovery attempt per kind inside the burst
//! window, then the session gives up.

use std::time::Duration;

use rstest::rstest;
use tokio::sync::broadcast::error::TryRecvError;
use zoetrope::engine::{EngineEvent, EngineFault};
use zoetrope::player::{PlaybackState, SessionEvent};
use zoetrope_test_utils::{tracing_setup, EngineCall};

use super::fixture::{
    next_event, quick_options, wait_for, wait_for_calls, wait_for_error, PlayerRig,
};

async fn expect_notice(rig: &mut PlayerRig, expected: &str) {
    let event = wait_for(&mut rig.events, |event| {
        matches!(event, SessionEvent::Notice { .. })
    })
    .await;
    match event {
        SessionEvent::Notice { message } => assert_eq!(message, expected),
        _ => unreachable!(),
    }
}

#[rstest]
#[case::media(
    EngineFault::media(true, "buffer stall"),
    "recovering from a playback glitch",
    EngineCall::RecoverMedia
)]
#[case::network(
    EngineFault::network(Some(502), true, "segment fetch failed"),
    "reconnecting to the stream",
    EngineCall::RestartLoad
)]
#[timeout(Duration::from_secs(15))]
#[tokio::test]
async fn first_fatal_fault_recovers_in_place(
    _tracing_setup: (),
    #[case] fault: EngineFault,
    #[case] notice: &str,
    #[case] expected: EngineCall,
) {
    let mut rig = PlayerRig::start(quick_options()).await;
    rig.load_and_settle("v").await;
    let probe = rig.probe();

    probe.emit(EngineEvent::Fault(fault));

    expect_notice(&mut rig, notice).await;
    wait_for_calls(&probe, "the recovery call", |calls| calls.contains(&expected)).await;

    // Same instance keeps playing; no token refresh was involved.
    assert_eq!(rig.factory.created(), 1);
    assert!(!probe.is_destroyed());
    assert_eq!(rig.service.stream_hits(), 1);
}

#[tokio::test]
async fn a_repeat_media_fault_in_the_burst_window_aborts() {
    let mut rig = PlayerRig::start(quick_options()).await;
    rig.load_and_settle("v").await;
    let probe = rig.probe();

    probe.emit(EngineEvent::Fault(EngineFault::media(true, "buffer stall")));
    probe.emit(EngineEvent::Fault(EngineFault::media(true, "buffer stall")));

    let message = wait_for_error(&mut rig.events).await;
    assert_eq!(message, "playback error: buffer stall");
    assert!(matches!(
        next_event(&mut rig.events).await,
        SessionEvent::Redirect
    ));
    assert!(probe.is_destroyed());
    assert_eq!(rig.factory.live(), 0);
}

#[tokio::test]
async fn media_faults_outside_the_burst_window_recover_again() {
    let mut rig = PlayerRig::start(quick_options().with_burst_window(Duration::from_millis(50)))
        .await;
    rig.load_and_settle("v").await;
    let probe = rig.probe();

    probe.emit(EngineEvent::Fault(EngineFault::media(true, "buffer stall")));
    wait_for_calls(&probe, "first media recovery", |calls| {
        calls.contains(&EngineCall::RecoverMedia)
    })
    .await;

    tokio::time::sleep(Duration::from_millis(80)).await;
    probe.emit(EngineEvent::Fault(EngineFault::media(true, "buffer stall")));
    wait_for_calls(&probe, "second media recovery", |calls| {
        calls
            .iter()
            .filter(|call| matches!(call, EngineCall::RecoverMedia))
            .count()
            == 2
    })
    .await;
    assert!(!probe.is_destroyed());
}

#[tokio::test]
async fn auth_rejection_rearms_the_same_engine() {
    let mut rig = PlayerRig::start(quick_options()).await;
    rig.load_and_settle("v").await;
    let probe = rig.probe();
    assert_eq!(rig.service.stream_hits(), 1);

    probe.emit(EngineEvent::Fault(EngineFault::network(
        Some(401),
        true,
        "token rejected",
    )));

    wait_for_calls(&probe, "the in-place rearm", |calls| {
        calls.last() == Some(&EngineCall::RestartLoad)
    })
    .await;

    // Same instance, second signed URL.
    assert_eq!(rig.factory.created(), 1);
    assert_eq!(rig.service.stream_hits(), 2);
    let loads = probe.loads();
    assert_eq!(loads.len(), 2);
    assert!(loads[0].path().contains("/v1/"));
    assert!(loads[1].path().contains("/v2/"));

    // The recovery is invisible: nothing user-facing was published.
    assert!(matches!(
        rig.events.try_recv(),
        Err(TryRecvError::Empty)
    ));
}

#[tokio::test]
async fn a_second_auth_rejection_in_the_burst_window_aborts() {
    let mut rig = PlayerRig::start(quick_options()).await;
    rig.load_and_settle("v").await;
    let probe = rig.probe();

    probe.emit(EngineEvent::Fault(EngineFault::network(
        Some(401),
        true,
        "token rejected",
    )));
    probe.emit(EngineEvent::Fault(EngineFault::network(
        Some(401),
        true,
        "token rejected",
    )));

    let message = wait_for_error(&mut rig.events).await;
    assert_eq!(message, "streaming network error: token rejected");
    assert!(matches!(
        next_event(&mut rig.events).await,
        SessionEvent::Redirect
    ));
    assert!(probe.is_destroyed());
}

#[tokio::test]
async fn unclassified_faults_abort_without_recovery() {
    let mut rig = PlayerRig::start(quick_options()).await;
    rig.load_and_settle("v").await;
    let probe = rig.probe();

    probe.emit(EngineEvent::Fault(EngineFault::other(
        true,
        "incompatible stream",
    )));

    let message = wait_for_error(&mut rig.events).await;
    assert_eq!(message, "fatal streaming error: incompatible stream");
    let calls = probe.calls();
    assert!(!calls.contains(&EngineCall::RecoverMedia));
    assert!(!calls.contains(&EngineCall::RestartLoad));
    assert!(probe.is_destroyed());
}

#[tokio::test]
async fn non_fatal_faults_are_ignored() {
    let mut rig = PlayerRig::start(quick_options()).await;
    rig.load_and_settle("v").await;
    let probe = rig.probe();

    probe.emit(EngineEvent::Fault(EngineFault::network(
        None,
        false,
        "transient hiccup",
    )));
    probe.emit(EngineEvent::Playing);

    assert!(matches!(
        next_event(&mut rig.events).await,
        SessionEvent::PlaybackChanged(PlaybackState::Playing)
    ));
    let calls = probe.calls();
    assert!(!calls.contains(&EngineCall::RecoverMedia));
    assert!(!calls.contains(&EngineCall::RestartLoad));
}
