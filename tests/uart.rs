//! End-to-end coverage of the transport against a scripted serial port,
//! exercising the public crate surface rather than transport internals.

use std::sync::Once;

use sim7080_driver::at::fake::ScriptedSerialPort;
use sim7080_driver::at::{AtRequest, AtRequestState, Transport};
use sim7080_driver::logging::NullLogger;

static LOGGER_INIT: Once = Once::new();

/// `log`'s global logger can only be installed once per process; these
/// tests don't assert on log output, so a `NullLogger` keeps the default
/// stdout sink from racing across test binaries.
fn init_logger() {
    LOGGER_INIT.call_once(|| {
        let _ = log::set_boxed_logger(Box::new(NullLogger));
    });
}

#[test]
fn bare_ping_round_trips_through_the_public_api() {
    init_logger();
    let port = ScriptedSerialPort::new(vec![("AT\r\n", b"AT\r\r\nOK\r\n" as &[u8])]);
    let mut transport = Transport::new(port);
    let done = transport.call(AtRequest::exec(""));
    assert_eq!(done.state, AtRequestState::Finished);
}

#[test]
fn queued_commands_are_sent_in_order_over_one_connection() {
    init_logger();
    let port = ScriptedSerialPort::new(vec![
        ("ATI\r\n", b"ATI\r\r\nOK\r\n" as &[u8]),
        ("AT+CGMM\r\n", b"AT+CGMM\r\r\nSIM7080G\r\nOK\r\n"),
    ]);
    let mut transport = Transport::new(port);
    transport.enqueue(AtRequest::exec("I"));
    transport.enqueue(AtRequest::exec("+CGMM"));
    let done = transport.run();
    assert_eq!(done.len(), 2);
    assert!(done.iter().all(|r| r.state == AtRequestState::Finished));
    assert_eq!(done[1].res_other, vec!["SIM7080G".to_string()]);
}

#[test]
fn unsolicited_lines_surface_through_urc_drain() {
    init_logger();
    let port = ScriptedSerialPort::new(vec![(
        "AT+CGMM\r\n",
        b"AT+CGMM\r\r\n+CPIN: READY\r\nSIM7080G\r\nOK\r\n" as &[u8],
    )]);
    let mut transport = Transport::new(port);
    transport.call(AtRequest::exec("+CGMM"));
    assert_eq!(transport.urc_drain(), vec!["+CPIN: READY".to_string()]);
}
