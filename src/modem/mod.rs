//! The modem facade: typed, high-level operations built as fixed AT
//! sequences against the transport.

pub mod network;
pub mod time_sync;

use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use crate::at::{AtRequest, AtRequestState, SerialPort, Transport};
use crate::error::Result;
use crate::gpio::ModemPin;

pub use network::NetworkInfo;

/// Consecutive bare-`AT` timeouts tolerated during `initialize` before the
/// facade re-cycles power.
const MAX_INIT_TIMEOUTS: u32 = 10;
const POWER_CYCLE_HOLD: Duration = Duration::from_secs(2);
const POWER_CYCLE_SETTLE: Duration = Duration::from_secs(5);

/// High-level operations on a SIM7080-family modem, expressed as sequences
/// of AT requests against the transport. Holds the transport and the
/// power pin; everything else (config, clock sink) is passed in per call.
pub struct Sim7080<P: SerialPort, G: ModemPin> {
    transport: Transport<P>,
    power_pin: G,
}

impl<P: SerialPort, G: ModemPin> Sim7080<P, G> {
    pub fn new(port: P, power_pin: G) -> Self {
        Self {
            transport: Transport::new(port),
            power_pin,
        }
    }

    pub fn transport_mut(&mut self) -> &mut Transport<P> {
        &mut self.transport
    }

    /// Holds the power pin high for 2s then releases it. The caller
    /// should wait at least 5s before expecting bytes from the modem;
    /// this method performs that wait itself so callers never need to.
    pub fn power_cycle(&mut self) -> Result<()> {
        info!("power-cycling modem");
        self.power_pin.set_high()?;
        thread::sleep(POWER_CYCLE_HOLD);
        self.power_pin.set_low()?;
        thread::sleep(POWER_CYCLE_SETTLE);
        Ok(())
    }

    /// Brings the modem up: tolerates up to `MAX_INIT_TIMEOUTS` consecutive
    /// bare-`AT` timeouts before re-cycling power; re-cycles again if the
    /// modem answers with a NUL terminator alongside a `NORMAL POWER DOWN`
    /// URC (it was mid-shutdown when we started probing). A NUL terminator
    /// without that URC is just another inconclusive probe and re-probes
    /// with another bare `AT`; only a clean, non-NUL `OK` breaks the loop
    /// and moves on to enabling verbose error reporting.
    pub fn initialize(&mut self, reboot: bool) -> Result<()> {
        if reboot {
            self.power_cycle()?;
        }

        let mut consecutive_timeouts = 0;
        loop {
            let ping = self.transport.call(AtRequest::exec(""));
            match ping.state {
                AtRequestState::Finished => break,
                AtRequestState::FinishedNull => {
                    if self.transport.urc_contains(crate::at::urc::NORMAL_POWER_DOWN) {
                        warn!("modem reported NORMAL POWER DOWN mid-init, re-cycling power");
                        self.power_cycle()?;
                        consecutive_timeouts = 0;
                    } else {
                        debug!("NUL-terminated response probing modem, retrying");
                    }
                }
                AtRequestState::Timeout => {
                    consecutive_timeouts += 1;
                    if consecutive_timeouts >= MAX_INIT_TIMEOUTS {
                        warn!("{MAX_INIT_TIMEOUTS} consecutive AT timeouts, re-cycling power");
                        self.power_cycle()?;
                        consecutive_timeouts = 0;
                    }
                }
                other => {
                    debug!("unexpected state {other:?} probing modem, retrying");
                }
            }
        }

        let cmee = self.transport.call(AtRequest::write("+CMEE", "2"));
        if cmee.state != AtRequestState::Finished {
            warn!("failed to enable verbose error reporting (+CMEE=2)");
        }
        Ok(())
    }

    /// `+CFUN=0`, `+CNMP=38` (LTE only), `+CFUN=1`, `+CMNB=1` (CAT-M1,
    /// 5s afterrun). Success iff `+CNMP` finished cleanly.
    pub fn setup_lte(&mut self) -> bool {
        self.transport.call(AtRequest::write("+CFUN", "0"));
        let cnmp = self.transport.call(AtRequest::write("+CNMP", "38"));
        self.transport.call(AtRequest::write("+CFUN", "1"));
        self.transport.call(
            AtRequest::write("+CMNB", "1").with_afterrun(Duration::from_secs(5)),
        );
        cnmp.state == AtRequestState::Finished
    }

    /// `+CGNAPN`, `+CNCFG=0,1`, `+CNACT=0,1` (3s timeout, 10s afterrun),
    /// then `+CNACT?`. Success iff the read terminates cleanly.
    pub fn setup_pdp_context(&mut self) -> bool {
        self.transport.call(AtRequest::exec("+CGNAPN"));
        self.transport.call(AtRequest::write("+CNCFG", "0,1"));
        self.transport.call(
            AtRequest::write("+CNACT", "0,1")
                .with_timeout(Duration::from_secs(3))
                .with_afterrun(Duration::from_secs(10)),
        );
        let cnact = self.transport.call(AtRequest::read("+CNACT"));
        cnact.state == AtRequestState::Finished
    }

    /// Reads `+CNACT?` and parses each tagged line as `id,state,ip`.
    pub fn get_ip_addresses(&mut self) -> Vec<(u32, bool, String)> {
        let cnact = self.transport.call(AtRequest::read("+CNACT"));
        cnact
            .res_tagged
            .iter()
            .filter_map(|line| parse_cnact_line(line))
            .collect()
    }

    fn identity_query(&mut self, head: &str) -> Result<String> {
        let done = self.transport.call(AtRequest::exec(head));
        match done.state {
            AtRequestState::Timeout => return Err(crate::error::Error::Timeout),
            AtRequestState::Failed => return Err(crate::error::Error::ModemError),
            AtRequestState::FinishedNull => return Err(crate::error::Error::NullTerminated),
            _ => {}
        }
        done.last_other()
            .map(str::to_string)
            .ok_or_else(|| crate::error::Error::Operation(format!("no response to AT{head}")))
    }

    pub fn get_manufacturer(&mut self) -> Result<String> {
        self.identity_query("+CGMI")
    }

    pub fn get_model(&mut self) -> Result<String> {
        self.identity_query("+CGMM")
    }

    pub fn get_revision(&mut self) -> Result<String> {
        self.identity_query("+CGMR")
    }

    pub fn get_imsi(&mut self) -> Result<String> {
        self.identity_query("+CIMI")
    }

    pub fn get_imei(&mut self) -> Result<String> {
        self.identity_query("+GSN")
    }

    /// Iteratively writes the three AWS IoT bring-up parameter families
    /// supplied by configuration.
    pub fn setup_aws_context(
        &mut self,
        smconf_params: &[String],
        csslcfg_params: &[String],
        smssl_params: &[String],
    ) {
        for param in smconf_params {
            self.transport.call(AtRequest::write("+SMCONF", param.clone()));
        }
        for param in csslcfg_params {
            self.transport.call(AtRequest::write("+CSSLCFG", param.clone()));
        }
        for param in smssl_params {
            self.transport.call(AtRequest::write("+SMSSL", param.clone()));
        }
    }

    /// `+SMCONN`, with a 20s timeout.
    pub fn connect_aws(&mut self) -> bool {
        let req = AtRequest::exec("+SMCONN").with_timeout(Duration::from_secs(20));
        self.transport.call(req).state == AtRequestState::Finished
    }

    pub fn disconnect_aws(&mut self) -> bool {
        self.transport.call(AtRequest::exec("+SMDISC")).state == AtRequestState::Finished
    }

    /// `+SMPUB="<topic>",<len>,<qos>,<retain>` with `content` delivered
    /// through the send-prompt sub-protocol.
    pub fn publish_mqtt(&mut self, topic: &str, content: &str, qos: u8, retain: u8) -> bool {
        let param = format!("\"{topic}\",{},{qos},{retain}", content.len());
        let req = AtRequest::write("+SMPUB", param).with_data(content.as_bytes().to_vec());
        self.transport.call(req).state == AtRequestState::Finished
    }

    pub fn turn_on_gnss(&mut self) -> bool {
        self.transport.call(AtRequest::write("+CGNSPWR", "1")).state == AtRequestState::Finished
    }

    pub fn turn_off_gnss(&mut self) -> bool {
        self.transport.call(AtRequest::write("+CGNSPWR", "0")).state == AtRequestState::Finished
    }

    /// Parses the first tagged `+CGNSINF` line as comma-separated fields.
    /// `None` when the modem hasn't got a fix yet (the first field isn't `1`).
    pub fn get_gnss_position(&mut self) -> Option<GnssFix> {
        let done = self.transport.call(AtRequest::exec("+CGNSINF"));
        done.res_tagged.first().and_then(|line| parse_cgnsinf(line))
    }

    pub fn urc_drain(&mut self) -> Vec<String> {
        self.transport.urc_drain()
    }
}

/// Parses one `+CNACT?` tagged line: `<id>,<state>,"<ip>"`.
fn parse_cnact_line(line: &str) -> Option<(u32, bool, String)> {
    let mut fields = line.splitn(3, ',');
    let id: u32 = fields.next()?.parse().ok()?;
    let state: u32 = fields.next()?.parse().ok()?;
    let ip = fields.next()?.trim_matches('"').to_string();
    Some((id, state == 1, ip))
}

/// A parsed `+CGNSINF` fix.
#[derive(Debug, Clone, PartialEq)]
pub struct GnssFix {
    pub utc: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: f64,
    pub speed_kmh: f64,
    pub course: f64,
}

fn parse_cgnsinf(line: &str) -> Option<GnssFix> {
    let fields: Vec<&str> = line.split(',').collect();
    // run status, fix status, utc, lat, lon, alt, speed, course, ...
    if fields.len() < 8 {
        return None;
    }
    if fields[1] != "1" {
        return None;
    }
    Some(GnssFix {
        utc: fields[2].to_string(),
        latitude: fields[3].parse().ok()?,
        longitude: fields[4].parse().ok()?,
        altitude_m: fields[5].parse().ok()?,
        speed_kmh: fields[6].parse().ok()?,
        course: fields[7].parse().ok()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::at::fake::ScriptedSerialPort;
    use crate::gpio::NullPin;

    #[test]
    fn setup_lte_reports_success_from_cnmp() {
        let port = ScriptedSerialPort::new(vec![
            ("AT+CFUN=0\r\n", b"AT+CFUN=0\r\r\nOK\r\n" as &[u8]),
            ("AT+CNMP=38\r\n", b"AT+CNMP=38\r\r\nOK\r\n"),
            ("AT+CFUN=1\r\n", b"AT+CFUN=1\r\r\nOK\r\n"),
            ("AT+CMNB=1\r\n", b"AT+CMNB=1\r\r\nOK\r\n"),
        ]);
        let mut modem = Sim7080::new(port, NullPin);
        assert!(modem.setup_lte());
    }

    #[test]
    fn setup_lte_fails_when_cnmp_errors() {
        let port = ScriptedSerialPort::new(vec![
            ("AT+CFUN=0\r\n", b"AT+CFUN=0\r\r\nOK\r\n" as &[u8]),
            ("AT+CNMP=38\r\n", b"AT+CNMP=38\r\r\nERROR\r\n"),
            ("AT+CFUN=1\r\n", b"AT+CFUN=1\r\r\nOK\r\n"),
            ("AT+CMNB=1\r\n", b"AT+CMNB=1\r\r\nOK\r\n"),
        ]);
        let mut modem = Sim7080::new(port, NullPin);
        assert!(!modem.setup_lte());
    }

    #[test]
    fn ip_addresses_are_parsed_from_cnact_read() {
        let port = ScriptedSerialPort::new(vec![(
            "AT+CNACT?\r\n",
            b"AT+CNACT?\r\r\n+CNACT: 0,1,\"10.0.0.5\"\r\n+CNACT: 1,0,\"0.0.0.0\"\r\nOK\r\n"
                as &[u8],
        )]);
        let mut modem = Sim7080::new(port, NullPin);
        let addrs = modem.get_ip_addresses();
        assert_eq!(
            addrs,
            vec![(0, true, "10.0.0.5".to_string()), (1, false, "0.0.0.0".to_string())]
        );
    }

    #[test]
    fn gnss_position_none_without_fix() {
        let port = ScriptedSerialPort::new(vec![(
            "AT+CGNSINF\r\n",
            b"AT+CGNSINF\r\r\n+CGNSINF: 1,0,,,,,,,1,,,,,,,,,,,,\r\nOK\r\n" as &[u8],
        )]);
        let mut modem = Sim7080::new(port, NullPin);
        assert_eq!(modem.get_gnss_position(), None);
    }

    #[test]
    fn gnss_position_parses_a_fix() {
        let port = ScriptedSerialPort::new(vec![(
            "AT+CGNSINF\r\n",
            b"AT+CGNSINF\r\r\n+CGNSINF: 1,1,20241224104823.000,48.2963,17.2667,170.3,0.2,180.0,1,,,,,,,,,,,,\r\nOK\r\n"
                as &[u8],
        )]);
        let mut modem = Sim7080::new(port, NullPin);
        let fix = modem.get_gnss_position().unwrap();
        assert_eq!(fix.latitude, 48.2963);
        assert_eq!(fix.longitude, 17.2667);
    }

    #[test]
    fn publish_mqtt_chunks_content_through_send_prompt() {
        let content = "x".repeat(150);
        let param = format!("\"topic\",{},0,0", content.len());
        let wire = format!("AT+SMPUB={param}\r\n");
        let response = format!("AT+SMPUB={param}\r\r\n>\r\nOK\r\n");
        let port = ScriptedSerialPort::new(vec![(&wire, response.as_bytes())]);
        let mut modem = Sim7080::new(port, NullPin);
        assert!(modem.publish_mqtt("topic", &content, 0, 0));
    }
}
