//! Network status composition: `+CPSI`, `+CSDP`, `+CGNAPN`, `+CLBS`.

use std::collections::HashMap;

use crate::at::{AtRequest, SerialPort};
use crate::gpio::ModemPin;

use super::Sim7080;

/// Parsed cell/network status, schema depending on how many comma fields
/// `+CPSI` returned: a 14-field response is an LTE report, 9 fields is GSM.
/// Anything else yields an empty map rather than a guess.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkInfo {
    pub fields: HashMap<String, String>,
}

impl NetworkInfo {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

/// Splits a `+CPSI` tagged line on commas and maps it onto the LTE or GSM
/// field schema depending on the field count. `eNBID`/`SectorID` are
/// derived from the LTE schema's `SCellID` with integer bit operations.
fn parse_cpsi(line: &str) -> NetworkInfo {
    let parts: Vec<&str> = line.split(',').collect();
    let mut fields = HashMap::new();

    match parts.len() {
        14 => {
            const KEYS: [&str; 14] = [
                "SystemMode",
                "OperationMode",
                "MCC-MNC",
                "TAC",
                "SCellID",
                "PCellID",
                "FreqBand",
                "EARFCN",
                "DLBand",
                "ULBand",
                "RSRQ",
                "RSRP",
                "RSSI",
                "RSSNR",
            ];
            for (key, value) in KEYS.iter().zip(parts.iter()) {
                fields.insert((*key).to_string(), (*value).to_string());
            }
            if let Some(scell_id) = fields.get("SCellID").and_then(|v| v.parse::<i64>().ok()) {
                fields.insert("eNBID".to_string(), (scell_id >> 8).to_string());
                fields.insert("SectorID".to_string(), (scell_id & 0xFF).to_string());
            }
        }
        9 => {
            const KEYS: [&str; 9] = [
                "SystemMode",
                "OperationMode",
                "MCC-MNC",
                "LAC",
                "CellID",
                "BSIC",
                "Channel",
                "RxLev",
                "TrackingAreaCode",
            ];
            for (key, value) in KEYS.iter().zip(parts.iter()) {
                fields.insert((*key).to_string(), (*value).to_string());
            }
        }
        _ => {}
    }
    NetworkInfo { fields }
}

impl<P: SerialPort, G: ModemPin> Sim7080<P, G> {
    /// Composes `+CPSI?`, `+CSDP?`, `+CGNAPN?`, `+CLBS=1,0` into one
    /// network status report. Each leg is best-effort: a leg that fails or
    /// parses oddly contributes no fields rather than aborting the rest.
    pub fn get_network_info(&mut self) -> NetworkInfo {
        let cpsi = self.transport_mut().call(AtRequest::read("+CPSI"));
        let mut info = cpsi
            .res_tagged
            .first()
            .map(|line| parse_cpsi(line))
            .unwrap_or_default();

        let csdp = self.transport_mut().call(AtRequest::read("+CSDP"));
        if let Some(line) = csdp.res_tagged.first() {
            info.fields.insert("CSDP".to_string(), line.clone());
        }

        let cgnapn = self.transport_mut().call(AtRequest::read("+CGNAPN"));
        if let Some(line) = cgnapn.res_tagged.first() {
            info.fields.insert("CGNAPN".to_string(), line.clone());
        }

        let clbs = self.transport_mut().call(AtRequest::write("+CLBS", "1,0"));
        if let Some(line) = clbs.res_tagged.first() {
            info.fields.insert("CLBS".to_string(), line.clone());
        }

        info
    }
}
