// ── Reading table ──
//
// Every reading the router exposes, described as data: which endpoint it
// comes from, where the value lives in the payload, and how the raw value
// is coerced. One generic routine evaluates any entry.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use miwifi_api::Endpoint;

use crate::reader::{self, DataPath, Scalar};

use Coercion::{Count, Flag, KibPerSecond, MebiBytes, Number, Text};
use Endpoint::{
    ApnInfo, CpeDetect, DeviceList, InitInfo, MobileNetCfg, MsgboxCount, SimInfo, SystemInfo,
    WanStatistics, WifiDetail, WifiDetailAll, WifiStatus,
};

/// How a raw extracted value becomes a reading value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Coercion {
    /// Displayed as-is.
    Text,
    /// Numeric, numeric strings parsed.
    Number,
    /// `"1"`/`1`/`true` and `"0"`/`0`/`false`.
    Flag,
    /// Bytes per second to KiB/s, two decimals.
    KibPerSecond,
    /// Bytes to MiB, two decimals.
    MebiBytes,
    /// Length of the sequence at the key path.
    Count,
}

impl Coercion {
    pub fn unit(self) -> Option<&'static str> {
        match self {
            Self::KibPerSecond => Some("KiB/s"),
            Self::MebiBytes => Some("MiB"),
            Self::Text | Self::Number | Self::Flag | Self::Count => None,
        }
    }

    /// Coerce an extracted scalar.
    pub fn apply(self, scalar: &Scalar) -> Option<ReadingValue> {
        match self {
            Self::Text => Some(ReadingValue::Text(scalar.to_string())),
            Self::Number | Self::Count => scalar.as_f64().map(ReadingValue::Number),
            Self::Flag => flag(scalar).map(ReadingValue::Flag),
            Self::KibPerSecond => scalar
                .as_f64()
                .map(|bytes| ReadingValue::Number(round2(bytes / 1024.0))),
            Self::MebiBytes => scalar
                .as_f64()
                .map(|bytes| ReadingValue::Number(round2(bytes / 1_048_576.0))),
        }
    }
}

fn flag(scalar: &Scalar) -> Option<bool> {
    match scalar {
        Scalar::Bool(b) => Some(*b),
        Scalar::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Scalar::Text(s) => match s.trim() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        },
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A coerced reading value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReadingValue {
    Text(String),
    Number(f64),
    Flag(bool),
}

impl fmt::Display for ReadingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Flag(true) => f.write_str("on"),
            Self::Flag(false) => f.write_str("off"),
        }
    }
}

/// One declarative reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadingSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub endpoint: Endpoint,
    pub key_path: &'static str,
    #[serde(skip)]
    pub data_path: Option<DataPath<'static>>,
    pub coercion: Coercion,
}

impl ReadingSpec {
    const fn new(
        key: &'static str,
        label: &'static str,
        endpoint: Endpoint,
        key_path: &'static str,
        coercion: Coercion,
    ) -> Self {
        Self {
            key,
            label,
            endpoint,
            key_path,
            data_path: None,
            coercion,
        }
    }

    const fn at(mut self, data_path: DataPath<'static>) -> Self {
        self.data_path = Some(data_path);
        self
    }

    /// Evaluate against a payload (`None` when the fetch failed).
    pub fn evaluate(&self, payload: Option<&Value>) -> Reading {
        let value = payload.and_then(|payload| match self.coercion {
            Coercion::Count => reader::count(payload, self.key_path)
                .and_then(|n| u32::try_from(n).ok())
                .map(|n| ReadingValue::Number(f64::from(n))),
            coercion => reader::extract(payload, self.key_path, self.data_path)
                .and_then(|scalar| coercion.apply(&scalar)),
        });

        Reading {
            key: self.key,
            label: self.label,
            unit: self.coercion.unit(),
            value,
        }
    }
}

/// An evaluated reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub key: &'static str,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    pub value: Option<ReadingValue>,
}

impl Reading {
    /// A reading is available iff it has a value.
    pub fn available(&self) -> bool {
        self.value.is_some()
    }
}

/// Every known reading.
pub const READINGS: &[ReadingSpec] = &[
    ReadingSpec::new("connected_devices", "Connected devices", DeviceList, "list", Count),
    ReadingSpec::new(
        "wan_download_speed",
        "WAN download speed",
        WanStatistics,
        "statistics.downspeed",
        KibPerSecond,
    ),
    ReadingSpec::new(
        "wan_upload_speed",
        "WAN upload speed",
        WanStatistics,
        "statistics.upspeed",
        KibPerSecond,
    ),
    ReadingSpec::new(
        "wan_max_download_speed",
        "WAN max download speed",
        WanStatistics,
        "statistics.maxdownloadspeed",
        KibPerSecond,
    ),
    ReadingSpec::new(
        "wan_max_upload_speed",
        "WAN max upload speed",
        WanStatistics,
        "statistics.maxuploadspeed",
        KibPerSecond,
    ),
    ReadingSpec::new(
        "wan_download_total",
        "WAN downloaded",
        WanStatistics,
        "statistics.download",
        MebiBytes,
    ),
    ReadingSpec::new(
        "wan_upload_total",
        "WAN uploaded",
        WanStatistics,
        "statistics.upload",
        MebiBytes,
    ),
    ReadingSpec::new("system_version", "System version", SystemInfo, "system.version", Text),
    ReadingSpec::new("firmware_version", "Firmware version", InitInfo, "romversion", Text),
    ReadingSpec::new("wifi_enabled", "Wi-Fi", WifiStatus, "wifi.on", Flag),
    ReadingSpec::new("wifi_ssid", "Wi-Fi SSID", WifiDetail, "info.ssid", Text),
    ReadingSpec::new("wifi_ssids", "Wi-Fi SSIDs", WifiDetailAll, "info", Text)
        .at(DataPath::Key("ssid")),
    ReadingSpec::new("cell_band", "Cell band", CpeDetect, "net.info.cell_band", Text),
    ReadingSpec::new("network_type", "Network type", CpeDetect, "net.info.net_type", Text),
    ReadingSpec::new("operator", "Operator", CpeDetect, "net.info.operator", Text),
    ReadingSpec::new("rsrp", "RSRP", CpeDetect, "net.info.rsrp", Number),
    ReadingSpec::new("rsrq", "RSRQ", CpeDetect, "net.info.rsrq", Number),
    ReadingSpec::new("sinr", "SINR", CpeDetect, "net.info.sinr", Number),
    ReadingSpec::new("rssi", "RSSI", CpeDetect, "net.info.rssi", Number),
    ReadingSpec::new("pci", "PCI", CpeDetect, "net.info.pci", Number),
    ReadingSpec::new("cell_id", "Cell ID", CpeDetect, "net.info.cellid", Text),
    ReadingSpec::new("wan_ipv4_address", "WAN IPv4", CpeDetect, "net.ipv4info.ip", Text),
    ReadingSpec::new("primary_dns", "Primary DNS", CpeDetect, "net.ipv4info.dns", Text)
        .at(DataPath::Index(0)),
    ReadingSpec::new("secondary_dns", "Secondary DNS", CpeDetect, "net.ipv4info.dns", Text)
        .at(DataPath::Index(1)),
    ReadingSpec::new("sim_status", "SIM status", SimInfo, "sim.status", Text),
    ReadingSpec::new("sim_iccid", "SIM ICCID", SimInfo, "sim.iccid", Text),
    ReadingSpec::new("sim_imsi", "SIM IMSI", SimInfo, "sim.imsi", Text),
    ReadingSpec::new("apn_name", "APN", ApnInfo, "apn", Text).at(DataPath::Key("name")),
    ReadingSpec::new("mobile_data_enabled", "Mobile data", MobileNetCfg, "data_switch", Flag),
    ReadingSpec::new("unread_messages", "Unread messages", MsgboxCount, "unread", Number),
];

/// Look up a reading by key.
pub fn find(key: &str) -> Option<&'static ReadingSpec> {
    READINGS.iter().find(|spec| spec.key == key)
}
