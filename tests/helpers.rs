use metron::{BucketCounter, SpyMetricSink, StatsdClient, Stopwatch};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn spy_client(prefix: &str) -> (crossbeam_channel::Receiver<Vec<u8>>, Arc<StatsdClient>) {
    let (rx, sink) = SpyMetricSink::new();
    (rx, Arc::new(StatsdClient::from_sink(prefix, sink)))
}

fn payload(raw: Vec<u8>) -> String {
    String::from_utf8(raw).unwrap()
}

// Pull the value out of a payload like "timeit.total:253|ms"
fn timer_value(metric: &str) -> u64 {
    let start = metric.find(':').unwrap() + 1;
    let end = metric.find('|').unwrap();
    metric[start..end].parse().unwrap()
}

#[test]
fn test_bucket_counter_fluent_syntax() {
    let (rx, client) = spy_client("");
    let mut counter = BucketCounter::new(client, "counted");

    counter += 1;
    counter += 5;
    counter -= 1;
    counter -= 5;

    assert_eq!("counted:1|c", payload(rx.recv().unwrap()));
    assert_eq!("counted:5|c", payload(rx.recv().unwrap()));
    assert_eq!("counted:-1|c", payload(rx.recv().unwrap()));
    assert_eq!("counted:-5|c", payload(rx.recv().unwrap()));
}

#[test]
fn test_stopwatch_start_stop() {
    let (rx, client) = spy_client("");
    let mut watch = Stopwatch::new(client, "timeit");

    watch.start();
    thread::sleep(Duration::from_millis(250));
    watch.stop().unwrap();

    let sent = payload(rx.recv().unwrap());
    assert!(sent.starts_with("timeit.total:"));
    assert!(sent.ends_with("|ms"));

    let total = timer_value(&sent);
    assert!(total >= 250, "total was {}ms", total);
    assert!(total < 1000, "total was {}ms", total);
}

#[test]
fn test_stopwatch_split_measures_lap_time() {
    let (rx, client) = spy_client("");
    let mut watch = Stopwatch::new(client, "timeit");

    watch.start();
    thread::sleep(Duration::from_millis(250));
    watch.split("lap").unwrap();
    thread::sleep(Duration::from_millis(260));
    watch.stop().unwrap();

    let lap = payload(rx.recv().unwrap());
    assert!(lap.starts_with("timeit.lap:"));
    let lap_ms = timer_value(&lap);
    assert!(lap_ms >= 250, "lap was {}ms", lap_ms);
    assert!(lap_ms < 500, "lap was {}ms", lap_ms);

    let total = payload(rx.recv().unwrap());
    assert!(total.starts_with("timeit.total:"));
    let total_ms = timer_value(&total);
    assert!(total_ms >= 510, "total was {}ms", total_ms);
    assert!(total_ms < 1000, "total was {}ms", total_ms);
}

#[test]
fn test_stopwatch_scoped_guard_records_total() {
    let (rx, client) = spy_client("");
    let mut watch = Stopwatch::new(client, "timeit");

    {
        let _guard = watch.scoped();
        thread::sleep(Duration::from_millis(250));
    }

    let sent = payload(rx.recv().unwrap());
    assert!(sent.starts_with("timeit.total:"));
    assert!(timer_value(&sent) >= 250);
}

#[test]
fn test_stopwatch_scoped_guard_labels_panics() {
    let (rx, client) = spy_client("");
    let mut watch = Stopwatch::new(client, "timeit");

    let res = panic::catch_unwind(AssertUnwindSafe(|| {
        let _guard = watch.scoped();
        panic!("boom");
    }));
    assert!(res.is_err());

    let sent = payload(rx.recv().unwrap());
    assert!(sent.starts_with("timeit.total-except:"));
}

#[test]
fn test_stopwatch_time_passes_through_result_and_panics() {
    let (rx, client) = spy_client("");
    let mut watch = Stopwatch::new(client, "timeit");

    let res = watch.time(|| {
        thread::sleep(Duration::from_millis(250));
        1
    });
    assert_eq!(1, res);

    let sent = payload(rx.recv().unwrap());
    assert!(sent.starts_with("timeit.total:"));
    assert!(timer_value(&sent) >= 250);

    let res = panic::catch_unwind(AssertUnwindSafe(|| {
        watch.time(|| panic!("boom"));
    }));
    assert!(res.is_err());

    let sent = payload(rx.recv().unwrap());
    assert!(sent.starts_with("timeit.total-except:"));
}

#[test]
fn test_stopwatch_wrap_times_every_invocation() {
    let (rx, client) = spy_client("");
    let mut wrapped = Stopwatch::wrap(client, "timeit", || {
        thread::sleep(Duration::from_millis(250));
        1
    });

    assert_eq!(1, wrapped());

    let sent = payload(rx.recv().unwrap());
    assert!(sent.starts_with("timeit.total:"));
    assert!(timer_value(&sent) >= 250);
}

#[test]
fn test_stopwatch_helpers_use_client_prefix() {
    let (rx, client) = spy_client("app");
    let mut watch = Stopwatch::new(client, "timeit");

    watch.start();
    watch.stop().unwrap();

    let sent = payload(rx.recv().unwrap());
    assert!(sent.starts_with("app.timeit.total:"));
}
