use metron::{StatsdClient, UdpMetricSink, DEFAULT_PORT};
use std::net::UdpSocket;

mod utils;
use utils::run_arc_threaded_test;

const TARGET_HOST: (&str, u16) = ("127.0.0.1", DEFAULT_PORT);

fn new_udp_client(prefix: &str) -> StatsdClient {
    let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
    let sink = UdpMetricSink::from(TARGET_HOST, socket).unwrap();
    StatsdClient::from_sink(prefix, sink)
}

#[test]
fn test_statsd_client_udp_sink_single_threaded() {
    let client = new_udp_client("metron");
    run_arc_threaded_test(client, 1, 1);
}

#[test]
fn test_statsd_client_udp_sink_many_threaded() {
    let client = new_udp_client("metron");
    run_arc_threaded_test(client, 4, 4);
}

#[test]
fn test_statsd_client_from_udp_host() {
    let client = StatsdClient::from_udp_host("metron", TARGET_HOST).unwrap();
    run_arc_threaded_test(client, 1, 1);
}

#[test]
fn test_statsd_client_from_udp_host_bad_address() {
    let res = StatsdClient::from_udp_host("metron", "asdf");
    assert!(res.is_err());
}
