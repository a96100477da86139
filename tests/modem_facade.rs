//! End-to-end coverage of the modem facade's bring-up sequence against a
//! scripted serial port, through the public crate surface only.

use sim7080_driver::at::fake::ScriptedSerialPort;
use sim7080_driver::gpio::NullPin;
use sim7080_driver::Sim7080;

#[test]
fn pdp_context_bring_up_reports_success_and_exposes_the_ip() {
    let port = ScriptedSerialPort::new(vec![
        ("AT+CGNAPN\r\n", b"AT+CGNAPN\r\r\nOK\r\n" as &[u8]),
        ("AT+CNCFG=0,1\r\n", b"AT+CNCFG=0,1\r\r\nOK\r\n"),
        ("AT+CNACT=0,1\r\n", b"AT+CNACT=0,1\r\r\nOK\r\n"),
        (
            "AT+CNACT?\r\n",
            b"AT+CNACT?\r\r\n+CNACT: 0,1,\"10.0.0.5\"\r\nOK\r\n",
        ),
    ]);
    let mut modem = Sim7080::new(port, NullPin);
    assert!(modem.setup_pdp_context());

    let mut modem = Sim7080::new(
        ScriptedSerialPort::new(vec![(
            "AT+CNACT?\r\n",
            b"AT+CNACT?\r\r\n+CNACT: 0,1,\"10.0.0.5\"\r\nOK\r\n" as &[u8],
        )]),
        NullPin,
    );
    let addrs = modem.get_ip_addresses();
    assert_eq!(addrs, vec![(0, true, "10.0.0.5".to_string())]);
}

#[test]
fn identity_queries_read_the_trailing_informational_line() {
    let port = ScriptedSerialPort::new(vec![("AT+CGMM\r\n", b"AT+CGMM\r\r\nSIM7080G\r\nOK\r\n" as &[u8])]);
    let mut modem = Sim7080::new(port, NullPin);
    assert_eq!(modem.get_model().unwrap(), "SIM7080G");
}

#[test]
fn aws_connect_and_publish_round_trip() {
    let port = ScriptedSerialPort::new(vec![
        ("AT+SMCONN\r\n", b"AT+SMCONN\r\r\nOK\r\n" as &[u8]),
        (
            "AT+SMPUB=\"devices/d1/update\",2,0,0\r\n",
            b"AT+SMPUB=\"devices/d1/update\",2,0,0\r\r\n>\r\nOK\r\n",
        ),
        ("AT+SMDISC\r\n", b"AT+SMDISC\r\r\nOK\r\n"),
    ]);
    let mut modem = Sim7080::new(port, NullPin);
    assert!(modem.connect_aws());
    assert!(modem.publish_mqtt("devices/d1/update", "{}", 0, 0));
    assert!(modem.disconnect_aws());
}
