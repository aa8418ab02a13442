//! Progressive retrieval against a fake extraction tool
//!
//! Each test reads the event stream of a real process run and checks the
//! ordering guarantees, the terminal event and temp file cleanup.

#![cfg(unix)]

mod common;

use common::{
    DOWNLOAD_FAIL, DOWNLOAD_HANG, DOWNLOAD_HANG_WITH_HELPER, DOWNLOAD_OK, FakeTool, RESOLVE_OK,
    video_request, wait_for_idle,
};
use futures::StreamExt;
use media_relay::{EventKind, ProgressEvent, RelayStream};
use std::time::Duration;

async fn collect(stream: RelayStream) -> Vec<ProgressEvent> {
    tokio::time::timeout(Duration::from_secs(15), stream.collect::<Vec<_>>())
        .await
        .expect("stream should end")
}

fn kinds(events: &[ProgressEvent]) -> Vec<EventKind> {
    events.iter().map(ProgressEvent::kind).collect()
}

#[tokio::test]
async fn test_progressive_run_emits_ordered_events() {
    let tool = FakeTool::new(DOWNLOAD_OK, RESOLVE_OK);
    let orchestrator = tool.orchestrator(|_| {});

    let events = collect(orchestrator.fetch_progressive(video_request()).unwrap()).await;

    assert_eq!(
        kinds(&events),
        [
            EventKind::Start,
            EventKind::Progress,
            EventKind::Progress,
            EventKind::Progress,
            EventKind::Processing,
            EventKind::Complete,
        ]
    );

    let percents: Vec<f64> = events
        .iter()
        .filter_map(|event| match event {
            ProgressEvent::Progress { percent, .. } => Some(*percent),
            _ => None,
        })
        .collect();
    assert_eq!(percents, [10.0, 50.0, 100.0]);

    match events.last().unwrap() {
        ProgressEvent::Complete {
            file_size_bytes,
            handle,
        } => {
            assert_eq!(*file_size_bytes, 16);
            assert_eq!(handle.quality, "720");
            assert!(handle.download_url.starts_with("/api/v1/download?url="));
        }
        other => panic!("expected Complete, got {other:?}"),
    }

    assert!(tool.leftover_files().is_empty(), "{:?}", tool.leftover_files());
}

#[tokio::test]
async fn test_progressive_failure_ends_with_one_error() {
    let tool = FakeTool::new(DOWNLOAD_FAIL, RESOLVE_OK);
    let orchestrator = tool.orchestrator(|_| {});

    let events = collect(orchestrator.fetch_progressive(video_request()).unwrap()).await;

    assert_eq!(events.first(), Some(&ProgressEvent::Start));
    let errors: Vec<&ProgressEvent> = events.iter().filter(|e| e.is_terminal()).collect();
    assert_eq!(errors.len(), 1);
    match errors[0] {
        ProgressEvent::Error { message } => assert!(message.contains("Video unavailable")),
        other => panic!("expected Error, got {other:?}"),
    }
    assert!(events.last().unwrap().is_terminal());
    assert!(tool.leftover_files().is_empty(), "{:?}", tool.leftover_files());
}

#[tokio::test]
async fn test_progressive_timeout_kills_tool() {
    let tool = FakeTool::new(DOWNLOAD_HANG, RESOLVE_OK);
    let orchestrator = tool.orchestrator(|config| {
        config.extractor.progressive_timeout = Duration::from_secs(1);
    });

    let events = collect(orchestrator.fetch_progressive(video_request()).unwrap()).await;

    match events.last().unwrap() {
        ProgressEvent::Error { message } => assert!(message.contains("timed out"), "{message}"),
        other => panic!("expected Error, got {other:?}"),
    }
    assert!(tool.leftover_files().is_empty(), "{:?}", tool.leftover_files());
}

#[tokio::test]
async fn test_timeout_also_kills_helper_processes() {
    let tool = FakeTool::new(DOWNLOAD_HANG_WITH_HELPER, RESOLVE_OK);
    let orchestrator = tool.orchestrator(|config| {
        config.extractor.progressive_timeout = Duration::from_secs(1);
    });

    let events = collect(orchestrator.fetch_progressive(video_request()).unwrap()).await;
    match events.last().unwrap() {
        ProgressEvent::Error { message } => assert!(message.contains("timed out"), "{message}"),
        other => panic!("expected Error, got {other:?}"),
    }
    assert!(tool.leftover_files().is_empty(), "{:?}", tool.leftover_files());

    // the helper would have written its file by now had it survived
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(
        tool.leftover_files().is_empty(),
        "helper wrote under the job's stem after the job ended: {:?}",
        tool.leftover_files()
    );
}

#[tokio::test]
async fn test_disconnect_also_kills_helper_processes() {
    let tool = FakeTool::new(DOWNLOAD_HANG_WITH_HELPER, RESOLVE_OK);
    let orchestrator = tool.orchestrator(|config| {
        config.extractor.progressive_timeout = Duration::from_secs(60);
    });

    let mut stream = orchestrator.fetch_progressive(video_request()).unwrap();
    assert_eq!(stream.next().await, Some(ProgressEvent::Start));
    drop(stream);

    assert!(wait_for_idle(&orchestrator, Duration::from_secs(10)).await);
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(tool.leftover_files().is_empty(), "{:?}", tool.leftover_files());
}

#[tokio::test]
async fn test_dropping_the_stream_cancels_the_job() {
    let tool = FakeTool::new(DOWNLOAD_HANG, RESOLVE_OK);
    let orchestrator = tool.orchestrator(|config| {
        config.extractor.progressive_timeout = Duration::from_secs(60);
    });

    let mut stream = orchestrator.fetch_progressive(video_request()).unwrap();
    assert_eq!(stream.next().await, Some(ProgressEvent::Start));
    let first = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.kind(), EventKind::Progress);

    drop(stream);

    assert!(
        wait_for_idle(&orchestrator, Duration::from_secs(10)).await,
        "job should be cancelled after the subscriber leaves"
    );
    assert!(tool.leftover_files().is_empty(), "{:?}", tool.leftover_files());
}

#[tokio::test]
async fn test_simultaneous_jobs_are_isolated() {
    let tool = FakeTool::new(DOWNLOAD_OK, RESOLVE_OK);
    let orchestrator = tool.orchestrator(|_| {});

    let first = orchestrator.fetch_progressive(video_request()).unwrap();
    let second = orchestrator.fetch_progressive(video_request()).unwrap();
    let (first, second) = tokio::join!(collect(first), collect(second));

    for events in [&first, &second] {
        assert_eq!(events.first(), Some(&ProgressEvent::Start));
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
        assert_eq!(events.last().unwrap().kind(), EventKind::Complete);
        assert_eq!(
            events
                .iter()
                .filter(|e| e.kind() == EventKind::Processing)
                .count(),
            1
        );
    }
    assert!(tool.leftover_files().is_empty(), "{:?}", tool.leftover_files());
}

#[tokio::test]
async fn test_shutdown_terminates_running_jobs() {
    let tool = FakeTool::new(DOWNLOAD_HANG, RESOLVE_OK);
    let orchestrator = tool.orchestrator(|config| {
        config.extractor.progressive_timeout = Duration::from_secs(60);
    });

    let mut stream = orchestrator.fetch_progressive(video_request()).unwrap();
    assert_eq!(stream.next().await, Some(ProgressEvent::Start));

    orchestrator.shutdown().await;

    let rest = collect(stream).await;
    match rest.last() {
        Some(ProgressEvent::Error { message }) => assert!(message.contains("cancelled"), "{message}"),
        other => panic!("expected a cancellation error, got {other:?}"),
    }
    assert!(orchestrator.fetch_progressive(video_request()).is_err());
    assert!(tool.leftover_files().is_empty(), "{:?}", tool.leftover_files());
}
