//! Integration tests for RenderController against an in-memory host
//!
//! These tests verify:
//! - Dispatch order, output paths and render invocation
//! - Cancellation keeping the unrendered cameras queued
//! - Empty snapshots and configuration refusal
//! - Teardown on every stop path, including Drop
//! - The async event loop

mod common;

use common::{HostCall, RecordingHost};
use renderburst::host::{HostError, HostEvent};
use renderburst::models::{FileFormat, FilterMode};
use renderburst::services::ConfigurationError;
use renderburst::{
    BurstError, ControllerOptions, Job, RenderController, RunState, StartOutcome, StateChange,
    StopReason, TickOutcome,
};
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

fn names(controller: &RenderController<&mut RecordingHost>) -> Vec<String> {
    controller
        .queue()
        .jobs()
        .map(|job| job.name().to_string())
        .collect()
}

#[test]
fn test_cancel_after_first_camera_keeps_rest_queued() {
    let mut host = RecordingHost::new(&["Cam1", "Cam2", "Cam3"]);
    let mut controller = RenderController::new(&mut host, ControllerOptions::default());

    assert_eq!(
        assert_ok!(controller.start()),
        StartOutcome::Started { jobs: 3 }
    );

    let outcome = assert_ok!(controller.tick());
    assert!(matches!(outcome, TickOutcome::Dispatched(ref t) if t.camera == Job::from("Cam1")));

    controller.on_render_start();
    assert_ok!(controller.on_render_finish());
    assert_eq!(names(&controller), vec!["Cam2", "Cam3"]);

    controller.on_render_cancel();
    assert!(controller.is_cancelled());

    assert_eq!(
        assert_ok!(controller.tick()),
        TickOutcome::Stopped(StopReason::Cancelled)
    );
    assert_eq!(assert_ok!(controller.tick()), TickOutcome::Inactive);

    assert_eq!(controller.state(), RunState::Stopped);
    assert_eq!(names(&controller), vec!["Cam2", "Cam3"]);
    assert_eq!(controller.dispatch_count(), 1);
    drop(controller);

    assert_eq!(host.rendered_cameras(), vec!["Cam1"]);
    assert_eq!(host.subscriber_count(), 0);
    assert_eq!(host.timer_count(), 0);
}

#[test]
fn test_render_finishing_after_cancel_still_completes() {
    let mut host = RecordingHost::new(&["Cam1", "Cam2", "Cam3"]);
    let mut controller = RenderController::new(&mut host, ControllerOptions::default());
    assert_ok!(controller.start());

    let outcome = assert_ok!(controller.tick());
    assert!(matches!(outcome, TickOutcome::Dispatched(ref t) if t.camera == Job::from("Cam1")));
    controller.on_render_start();

    // Cancelled while Cam1 renders; its finish still arrives
    controller.on_render_cancel();
    assert!(controller.is_rendering());
    assert_ok!(controller.on_render_finish());
    assert_eq!(names(&controller), vec!["Cam2", "Cam3"]);

    assert_eq!(
        assert_ok!(controller.tick()),
        TickOutcome::Stopped(StopReason::Cancelled)
    );
    assert_eq!(controller.state(), RunState::Stopped);
    assert_eq!(names(&controller), vec!["Cam2", "Cam3"]);
    assert_eq!(controller.dispatch_count(), 1);
    drop(controller);

    assert_eq!(host.rendered_cameras(), vec!["Cam1"]);
    assert_eq!(host.subscriber_count(), 0);
    assert_eq!(host.timer_count(), 0);
}

#[test]
fn test_empty_snapshot_stops_immediately() {
    let mut host = RecordingHost::new(&[]).with_camera("Hidden", false, true);
    let status;
    {
        let mut controller = RenderController::new(&mut host, ControllerOptions::default());
        let mut changes = controller.state_manager().subscribe();

        assert_eq!(assert_ok!(controller.start()), StartOutcome::NoEligibleJobs);
        assert_eq!(controller.state(), RunState::Stopped);
        assert_eq!(controller.stop_reason(), Some(StopReason::NoEligibleJobs));
        assert_eq!(assert_ok!(controller.tick()), TickOutcome::Inactive);

        assert_eq!(
            changes.try_recv(),
            Ok(StateChange::Notice {
                message: "No cameras to render".to_string()
            })
        );
        status = controller.state_manager().snapshot();
    }

    assert_eq!(host.render_invocations(), 0);
    assert_eq!(host.count(|c| matches!(c, HostCall::Subscribe(_))), 0);
    assert_eq!(host.count(|c| matches!(c, HostCall::ScheduleTimer(_))), 0);
    assert_eq!(status.stop_reason, Some(StopReason::NoEligibleJobs));
}

#[test]
fn test_full_burst_renders_every_camera_in_order() {
    let mut host = RecordingHost::new(&["Front", "Side", "Top"]);
    {
        let mut controller = RenderController::new(&mut host, ControllerOptions::default());
        assert_ok!(controller.start());

        for _ in 0..3 {
            assert!(matches!(
                assert_ok!(controller.tick()),
                TickOutcome::Dispatched(_)
            ));
            // Ticks while rendering change nothing
            assert_eq!(assert_ok!(controller.tick()), TickOutcome::Waiting);
            controller.on_render_start();
            assert_ok!(controller.on_render_finish());
        }

        assert_eq!(
            assert_ok!(controller.tick()),
            TickOutcome::Stopped(StopReason::Completed)
        );
        assert!(controller.queue().is_empty());

        let state = controller.state_manager().snapshot();
        assert_eq!(state.completed_jobs, vec!["Front", "Side", "Top"]);
        assert_eq!(state.progress_summary(), "Burst completed: 3/3 cameras rendered");
    }

    assert_eq!(host.rendered_cameras(), vec!["Front", "Side", "Top"]);
    assert_eq!(
        host.calls
            .iter()
            .filter_map(|call| match call {
                HostCall::InvokeRender {
                    output_path,
                    write_still,
                    ..
                } => {
                    assert!(*write_still);
                    Some(output_path.as_str())
                }
                _ => None,
            })
            .collect::<Vec<_>>(),
        vec!["//renders/Front.png", "//renders/Side.png", "//renders/Top.png"]
    );
}

#[test]
fn test_dispatch_side_effects_are_ordered() {
    let mut host = RecordingHost::new(&["Cam1"]).with_output_path("/abs/out/previous.exr");
    host.file_format = FileFormat::OpenExr;
    {
        let mut controller = RenderController::new(&mut host, ControllerOptions::default());
        assert_ok!(controller.start());
        assert_ok!(controller.tick());
    }

    let dispatch: Vec<&HostCall> = host
        .calls
        .iter()
        .filter(|call| {
            matches!(
                call,
                HostCall::SetActiveCamera(_)
                    | HostCall::SetOutputPath(_)
                    | HostCall::InvokeRender { .. }
            )
        })
        .collect();

    assert_eq!(
        dispatch,
        vec![
            &HostCall::SetActiveCamera("Cam1".to_string()),
            &HostCall::SetOutputPath("/abs/out/Cam1.exr".to_string()),
            &HostCall::InvokeRender {
                camera: Some("Cam1".to_string()),
                output_path: "/abs/out/Cam1.exr".to_string(),
                write_still: true,
            },
        ]
    );
}

#[test]
fn test_relative_override_resolves_against_project() {
    let mut host = RecordingHost::new(&["Cam2"]).with_output_path("//relative/render/");
    {
        let options = ControllerOptions {
            base_path: "/tmp/out".to_string(),
            ..Default::default()
        };
        let mut controller = RenderController::new(&mut host, options);
        assert_ok!(controller.start());

        let target = match assert_ok!(controller.tick()) {
            TickOutcome::Dispatched(target) => target,
            other => panic!("Expected a dispatch, got {:?}", other),
        };
        assert_eq!(target.output_path, "//relative/render/Cam2.png");
    }

    assert_eq!(host.output_path, "//relative/render/Cam2.png");
}

#[test]
fn test_selected_filter_limits_queue() {
    let mut host = RecordingHost::new(&[])
        .with_camera("A", true, false)
        .with_camera("B", true, true)
        .with_camera("C", false, true)
        .with_camera("D", true, true);
    let options = ControllerOptions {
        filter: FilterMode::Selected,
        ..Default::default()
    };
    let mut controller = RenderController::new(&mut host, options);

    assert_eq!(
        assert_ok!(controller.start()),
        StartOutcome::Started { jobs: 2 }
    );
    assert_eq!(names(&controller), vec!["B", "D"]);
}

#[test]
fn test_configuration_errors_refuse_to_start() {
    let mut host = RecordingHost::new(&["Cam1"]).with_output_path("");
    {
        let mut controller = RenderController::new(&mut host, ControllerOptions::default());
        let err = assert_err!(controller.start());
        assert_eq!(
            err,
            BurstError::Configuration(ConfigurationError::OutputPathUnset)
        );
        assert_eq!(controller.state(), RunState::Idle);
    }

    let mut movie_host = RecordingHost::new(&["Cam1"]).with_format(FileFormat::AviRaw);
    {
        let mut controller = RenderController::new(&mut movie_host, ControllerOptions::default());
        assert_eq!(
            controller.start(),
            Err(BurstError::Configuration(
                ConfigurationError::UnsupportedFormat(FileFormat::AviRaw)
            ))
        );
    }

    assert!(host.calls.is_empty());
    assert!(movie_host.calls.is_empty());
}

#[test]
fn test_render_failure_tears_down() {
    let mut host = RecordingHost::new(&["Cam1", "Cam2"]);
    host.render_error = Some(HostError::RenderBusy);
    {
        let mut controller = RenderController::new(&mut host, ControllerOptions::default());
        assert_ok!(controller.start());

        assert_eq!(
            controller.tick(),
            Err(BurstError::Host(HostError::RenderBusy))
        );
        assert_eq!(controller.stop_reason(), Some(StopReason::Failed));
        assert_eq!(names(&controller), vec!["Cam1", "Cam2"]);
    }

    assert_eq!(host.count(|c| matches!(c, HostCall::Unsubscribe(_))), 1);
    assert_eq!(host.count(|c| matches!(c, HostCall::CancelTimer(_))), 1);
}

#[test]
fn test_drop_releases_subscription_and_timer() {
    let mut host = RecordingHost::new(&["Cam1"]);
    {
        let mut controller = RenderController::new(&mut host, ControllerOptions::default());
        assert_ok!(controller.start());
        assert_ok!(controller.tick());
        // Dropped mid-render without ever stopping
    }

    assert_eq!(host.subscriber_count(), 0);
    assert_eq!(host.timer_count(), 0);
    assert_eq!(host.count(|c| matches!(c, HostCall::Unsubscribe(_))), 1);
    assert_eq!(host.count(|c| matches!(c, HostCall::CancelTimer(_))), 1);
}

#[test]
fn test_poll_interval_is_passed_to_timer() {
    let mut host = RecordingHost::new(&["Cam1"]);
    {
        let options = ControllerOptions {
            poll_interval: Duration::from_millis(40),
            ..Default::default()
        };
        let mut controller = RenderController::new(&mut host, options);
        assert_ok!(controller.start());
    }

    assert!(host
        .calls
        .contains(&HostCall::ScheduleTimer(Duration::from_millis(40))));
}

#[tokio::test]
async fn test_run_consumes_scripted_events() {
    let mut host = RecordingHost::new(&["Cam1", "Cam2"]);
    {
        let mut controller = RenderController::new(&mut host, ControllerOptions::default());
        assert_ok!(controller.start());

        let sink = controller.host().event_sink().unwrap();
        for event in [
            HostEvent::Tick,
            HostEvent::RenderStarted,
            HostEvent::Tick,
            HostEvent::RenderFinished,
            HostEvent::Tick,
            HostEvent::RenderStarted,
            HostEvent::RenderFinished,
            HostEvent::Tick,
        ] {
            sink.send(event).unwrap();
        }

        let reason = tokio::time::timeout(Duration::from_secs(2), controller.run())
            .await
            .expect("Timeout waiting for burst")
            .unwrap();

        assert_eq!(reason, StopReason::Completed);
        assert_eq!(controller.dispatch_count(), 2);
        assert!(controller.queue().is_empty());
    }

    assert_eq!(host.rendered_cameras(), vec!["Cam1", "Cam2"]);
}

#[tokio::test]
async fn test_run_stops_on_cancel_notification() {
    let mut host = RecordingHost::new(&["Cam1", "Cam2"]);
    {
        let mut controller = RenderController::new(&mut host, ControllerOptions::default());
        assert_ok!(controller.start());

        let sink = controller.host().event_sink().unwrap();
        for event in [
            HostEvent::Tick,
            HostEvent::RenderStarted,
            HostEvent::RenderCancelled,
            HostEvent::Tick,
        ] {
            sink.send(event).unwrap();
        }

        assert_eq!(controller.run().await, Ok(StopReason::Cancelled));
        // The cancelled camera never finished, so it is still queued
        assert_eq!(names(&controller), vec!["Cam1", "Cam2"]);
    }

    assert_eq!(host.rendered_cameras(), vec!["Cam1"]);
}

#[test]
fn test_run_reports_disconnected_host() {
    let mut host = RecordingHost::new(&["Cam1"]);
    let mut controller = RenderController::new(&mut host, ControllerOptions::default());
    assert_ok!(controller.start());

    controller.host_mut().disconnect();

    let reason = tokio_test::block_on(controller.run());
    assert_eq!(reason, Ok(StopReason::Disconnected));
    assert_eq!(controller.state(), RunState::Stopped);
}

#[test]
fn test_run_after_immediate_stop_returns_reason() {
    let mut host = RecordingHost::new(&[]);
    let mut controller = RenderController::new(&mut host, ControllerOptions::default());
    assert_ok!(controller.start());

    assert_eq!(
        tokio_test::block_on(controller.run()),
        Ok(StopReason::NoEligibleJobs)
    );
}
