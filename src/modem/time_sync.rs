//! NTP synchronization: `+CNTP` kicks off the modem's own NTP query,
//! `+CCLK?` reads back the result.

use std::time::Duration;

use log::{info, warn};

use crate::at::{AtRequest, AtRequestState, SerialPort};
use crate::error::Result;
use crate::gpio::ModemPin;
use crate::time::{parse_cclk, ClockSink, NTP_FAILURE_CODES};

use super::Sim7080;

impl<P: SerialPort, G: ModemPin> Sim7080<P, G> {
    /// Writes `+CNTP=<server>,<4*tz_hours>`, execs `+CNTP` with a 3s
    /// afterrun, then reads `+CCLK?` and hands the parsed timestamp to
    /// `sink`. Recognized NTP failure codes are logged, not treated as
    /// fatal; per the original tracker's behavior this branch never
    /// actually triggers on real responses, so it is effectively
    /// informational only.
    pub fn sync_ntp_time(
        &mut self,
        server: &str,
        tz_hours: i32,
        sink: &mut dyn ClockSink,
    ) -> Result<()> {
        let quarter_hours = tz_hours * 4;
        let param = format!("\"{server}\",{quarter_hours}");
        self.transport_mut().call(AtRequest::write("+CNTP", param));

        let cntp = self
            .transport_mut()
            .call(AtRequest::exec("+CNTP").with_afterrun(Duration::from_secs(3)));
        if let Some(code) = cntp.last_other().and_then(|line| line.parse::<i32>().ok()) {
            if NTP_FAILURE_CODES.contains(&code) {
                warn!("modem reported NTP failure code {code}");
            }
        }

        let cclk = self.transport_mut().call(AtRequest::read("+CCLK"));
        match cclk.state {
            AtRequestState::Finished => {}
            AtRequestState::Timeout => return Err(crate::error::Error::Timeout),
            AtRequestState::FinishedNull => return Err(crate::error::Error::NullTerminated),
            _ => return Err(crate::error::Error::ModemError),
        }
        let Some(body) = cclk.res_tagged.first() else {
            return Err(crate::error::Error::Operation(
                "+CCLK? returned no tagged response".to_string(),
            ));
        };
        let datetime = parse_cclk(body)?;
        info!("modem clock synchronized: {datetime}");
        sink.set_datetime(datetime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::at::fake::ScriptedSerialPort;
    use crate::gpio::NullPin;
    use chrono::{DateTime, FixedOffset};

    struct Captured(Option<DateTime<FixedOffset>>);

    impl ClockSink for Captured {
        fn set_datetime(&mut self, datetime: DateTime<FixedOffset>) -> Result<()> {
            self.0 = Some(datetime);
            Ok(())
        }
    }

    #[test]
    fn sync_ntp_time_parses_and_forwards_clock() {
        let port = ScriptedSerialPort::new(vec![
            (
                "AT+CNTP=\"pool.ntp.org\",4\r\n",
                b"AT+CNTP=\"pool.ntp.org\",4\r\r\nOK\r\n" as &[u8],
            ),
            ("AT+CNTP\r\n", b"AT+CNTP\r\r\n1\r\nOK\r\n"),
            (
                "AT+CCLK?\r\n",
                b"AT+CCLK?\r\r\n+CCLK: \"24/12/24,10:48:23+04\"\r\nOK\r\n",
            ),
        ]);
        let mut modem = Sim7080::new(port, NullPin);
        let mut sink = Captured(None);
        modem.sync_ntp_time("pool.ntp.org", 1, &mut sink).unwrap();
        assert!(sink.0.is_some());
    }
}
