use metron::{
    count, current_settings, decrement, default_client, gauge, increment, initialize,
    set_default_client, timing, Settings, SpyMetricSink, StatsdClient,
};

fn payload(raw: Vec<u8>) -> String {
    String::from_utf8(raw).unwrap()
}

// The default client is process-wide state shared by every test in this
// binary, so all assertions against it run in sequence in a single test.
#[test]
fn test_default_client_lifecycle() {
    // lazy initialization from built-in defaults
    let client = default_client().unwrap();
    let settings = current_settings();
    assert_eq!("localhost", settings.host);
    assert_eq!(8125, settings.port);
    assert_eq!(None, settings.sample_rate);
    assert_eq!(None, settings.prefix);

    // free functions work without explicit initialization, dropping
    // datagrams on the floor if nothing is listening on localhost
    increment("counted").unwrap();
    drop(client);

    // an installed spy client observes the free functions
    let (rx, sink) = SpyMetricSink::new();
    set_default_client(StatsdClient::from_sink("", sink));

    increment("counted").unwrap();
    assert_eq!("counted:1|c", payload(rx.recv().unwrap()));

    decrement("counted").unwrap();
    assert_eq!("counted:-1|c", payload(rx.recv().unwrap()));

    count("counted", 5).unwrap();
    assert_eq!("counted:5|c", payload(rx.recv().unwrap()));

    count("counted", -5).unwrap();
    assert_eq!("counted:-5|c", payload(rx.recv().unwrap()));

    timing("timed", 250).unwrap();
    assert_eq!("timed:250|ms", payload(rx.recv().unwrap()));

    gauge("gauged", -5).unwrap();
    assert_eq!("gauged:-5|g", payload(rx.recv().unwrap()));

    // initialize replaces the spy client and applies the patch
    initialize(
        Settings::default()
            .with_host("127.0.0.1")
            .with_port(9999)
            .with_sample_rate(0.99)
            .with_prefix("testing"),
    )
    .unwrap();

    let settings = current_settings();
    assert_eq!("127.0.0.1", settings.host);
    assert_eq!(9999, settings.port);
    assert_eq!(Some(0.99), settings.sample_rate);
    assert_eq!(Some("testing".to_string()), settings.prefix);

    // re-initialization retains options the patch doesn't mention
    initialize(Settings::default().with_port(8125)).unwrap();

    let settings = current_settings();
    assert_eq!("127.0.0.1", settings.host);
    assert_eq!(8125, settings.port);
    assert_eq!(Some(0.99), settings.sample_rate);
    assert_eq!(Some("testing".to_string()), settings.prefix);

    // an out of range sample rate is rejected and the previous client
    // and settings stay in place
    let res = initialize(Settings::default().with_sample_rate(1.5));
    assert!(res.is_err());
    assert_eq!(Some(0.99), current_settings().sample_rate);
}
