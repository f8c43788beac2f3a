//! End-to-end behaviour of the public retry API.

use retrier::prelude::*;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("flaky service: {0}")]
struct ServiceError(String);

fn recording(attempts: u32, base: Duration) -> (Retrier, RecordingSleeper) {
    let sleeper = RecordingSleeper::new();
    let retrier = Retrier::builder()
        .attempts(attempts)
        .base_delay(base)
        .sleeper(sleeper.clone())
        .build();
    (retrier, sleeper)
}

#[test]
fn zero_retries_is_trivial_success() {
    let mut calls = 0;

    let result = retry(0, Duration::from_secs(60), || {
        calls += 1;
        Err(ServiceError("never called".into()))
    });

    assert!(result.is_ok());
    assert_eq!(calls, 0);
}

#[test]
fn three_attempts_one_unit_scenario() {
    let unit = Duration::from_millis(1);
    let (retrier, sleeper) = recording(3, unit);
    let mut calls = 0;

    let err = retrier
        .run(|| {
            calls += 1;
            Err::<(), _>(ServiceError(format!("attempt {}", calls)))
        })
        .unwrap_err();

    assert_eq!(calls, 3);
    assert_eq!(sleeper.recorded(), vec![unit, unit * 2]);
    assert_eq!(
        err.to_string(),
        "retry failed after 3 attempts: flaky service: attempt 3"
    );
    assert_eq!(
        err.into_last_error(),
        Some(ServiceError("attempt 3".into()))
    );
}

#[test]
fn exhaustion_wraps_last_error_as_source() {
    let err = retry(2, Duration::ZERO, || {
        Err::<(), _>(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"))
    })
    .unwrap_err();

    let source = std::error::Error::source(&err).expect("exhaustion has a source");
    let io_err = source
        .downcast_ref::<io::Error>()
        .expect("source is the operation's error");
    assert_eq!(io_err.kind(), io::ErrorKind::ConnectionRefused);
    assert_eq!(err.attempts(), 2);
}

#[test]
fn success_on_kth_attempt_stops_immediately() {
    let (retrier, sleeper) = recording(5, Duration::from_millis(3));
    let mut calls = 0;

    let value = retrier
        .run_with_value(|| {
            calls += 1;
            if calls == 4 {
                Ok("payload")
            } else {
                Err(ServiceError("busy".into()))
            }
        })
        .unwrap();

    assert_eq!(value, "payload");
    assert_eq!(calls, 4);
    assert_eq!(
        sleeper.recorded(),
        vec![
            Duration::from_millis(3),
            Duration::from_millis(6),
            Duration::from_millis(12)
        ]
    );
}

#[test]
fn repeated_runs_are_identical() {
    let (retrier, sleeper) = recording(4, Duration::from_millis(5));

    let outcome = |retrier: &Retrier| {
        let mut calls = 0u32;
        let result = retrier.run(|| {
            calls += 1;
            if calls == 3 {
                Ok(())
            } else {
                Err(ServiceError("deterministic".into()))
            }
        });
        (result.is_ok(), calls)
    };

    let first = outcome(&retrier);
    let first_sleeps = sleeper.recorded();
    sleeper.clear();
    let second = outcome(&retrier);

    assert_eq!(first, (true, 3));
    assert_eq!(first, second);
    assert_eq!(first_sleeps, sleeper.recorded());
}

#[test]
fn real_sleeps_follow_the_schedule() {
    let start = Instant::now();
    let mut calls = 0;

    let result = retry(3, Duration::from_millis(10), || {
        calls += 1;
        Err::<(), _>(ServiceError("down".into()))
    });

    // 10ms + 20ms between attempts, nothing after the last.
    assert!(result.is_err());
    assert_eq!(calls, 3);
    assert!(start.elapsed() >= Duration::from_millis(30));
}

#[test]
fn independent_threads_do_not_interfere() {
    let retrier = Retrier::new(3, Duration::from_millis(1));
    let total_calls = Arc::new(AtomicU32::new(0));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let retrier = retrier.clone();
            let total_calls = Arc::clone(&total_calls);
            thread::spawn(move || {
                let mut calls = 0;
                let result = retrier.run(|| {
                    calls += 1;
                    total_calls.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(ServiceError("always".into()))
                });
                (result.map_err(|e| e.attempts()), calls)
            })
        })
        .collect();

    for handle in handles {
        let (result, calls) = handle.join().expect("worker thread panicked");
        assert_eq!(result, Err(3));
        assert_eq!(calls, 3);
    }
    assert_eq!(total_calls.load(Ordering::SeqCst), 12);
}

#[test]
fn config_drives_retrier() {
    let config: RetryConfig = toml::from_str(
        r#"
        attempts = 2
        base_delay_ms = 40
        trailing_sleep = true
        "#,
    )
    .unwrap();

    let sleeper = RecordingSleeper::new();
    let retrier = Retrier::builder()
        .attempts(config.attempts)
        .base_delay(config.base_delay)
        .trailing_sleep(config.trailing_sleep)
        .sleeper(sleeper.clone())
        .build();

    let _ = retrier.run(|| Err::<(), _>(ServiceError("down".into())));

    assert_eq!(
        sleeper.recorded(),
        vec![Duration::from_millis(40), Duration::from_millis(80)]
    );
    assert_eq!(Retrier::from_config(&config).total_backoff(), sleeper.total());
}

#[tokio::test(start_paused = true)]
async fn async_operations_share_the_schedule() {
    let retrier = Retrier::builder()
        .attempts(4)
        .base_delay(Duration::from_secs(1))
        .trailing_sleep(true)
        .build();
    let calls = Arc::new(AtomicU32::new(0));
    let start = tokio::time::Instant::now();

    let err = retrier
        .run_async(|| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ServiceError("async down".into()))
            }
        })
        .await
        .unwrap_err();

    let elapsed = start.elapsed();
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(err.attempts(), 4);
    assert!(elapsed >= retrier.total_backoff());
    assert!(elapsed < retrier.total_backoff() + Duration::from_secs(1));
}
