// Router API endpoints
//
// One accessor per vendor capability, each a pass-through to the
// authenticated GET. Accessors never fail: errors are logged and surface as
// `None`. `fetch` is the fallible form for callers that need the cause.

use serde::Serialize;
use serde_json::Value;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use tracing::{debug, warn};

use crate::client::RouterClient;
use crate::error::Error;

/// A fixed vendor API endpoint.
///
/// The snake_case name (`cpe_detect`, `wan_statistics`, ...) is the stable
/// endpoint name used by field paths and the response cache.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    WanStatistics,
    DeviceList,
    InitInfo,
    WifiDisplay,
    NewStatus,
    SimInfo,
    SystemInfo,
    WifiStatus,
    WifiDetail,
    WifiDetailAll,
    CpeDetect,
    ApnInfo,
    MobileNetCfg,
    MsgboxCount,
}

impl Endpoint {
    /// API path below `;stok={token}/api/`.
    pub fn path(self) -> &'static str {
        match self {
            Self::WanStatistics => "xqnetwork/wan_statistics",
            Self::DeviceList => "misystem/devicelist",
            Self::InitInfo => "xqsystem/init_info",
            Self::WifiDisplay => "xqdtcustom/wifi_display",
            Self::NewStatus => "xqdtcustom/newstatus",
            Self::SimInfo => "xqdtcustom/get_sim_info",
            Self::SystemInfo => "xqsystem/system_info",
            Self::WifiStatus => "xqnetwork/wifi_status",
            Self::WifiDetail => "xqnetwork/wifi_detail",
            Self::WifiDetailAll => "xqnetwork/wifi_detail_all",
            Self::CpeDetect => "xqdtcustom/cpe_detect",
            Self::ApnInfo => "xqmobile/get_apn_info",
            Self::MobileNetCfg => "xqmobile/get_mobile_net_cfg",
            Self::MsgboxCount => "xqmobile/get_msgbox_count",
        }
    }

    /// The stable snake_case endpoint name.
    pub fn name(self) -> &'static str {
        self.into()
    }
}

// ── Identity ─────────────────────────────────────────────────────────

/// Identity snapshot captured once after the first successful login.
///
/// Both fields are best-effort; a firmware that omits the key leaves the
/// field unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub mac_address: Option<String>,
    pub firmware_version: Option<String>,
}

impl Identity {
    /// Lowercase hex MAC without separators, suitable as a stable device id.
    pub fn device_id(&self) -> Option<String> {
        let mac = self.mac_address.as_deref()?;
        let id: String = mac
            .chars()
            .filter(char::is_ascii_hexdigit)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        (!id.is_empty()).then_some(id)
    }
}

fn string_at(value: &Value, pointer: &str) -> Option<String> {
    match value.pointer(pointer)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl RouterClient {
    /// The identity snapshot, or an empty one before the first login.
    pub fn identity(&self) -> Identity {
        self.identity.get().cloned().unwrap_or_default()
    }

    /// Derive MAC address (`newstatus → hardware.mac`) and firmware version
    /// (`init_info → romversion`).
    pub(crate) async fn derive_identity(&self) -> Identity {
        let mac_address = match self.fetch(Endpoint::NewStatus).await {
            Ok(status) => {
                let mac = string_at(&status, "/hardware/mac");
                if mac.is_none() {
                    debug!("newstatus response carries no hardware.mac");
                }
                mac
            }
            Err(e) => {
                warn!(error = %e, "could not fetch MAC address");
                None
            }
        };

        let firmware_version = match self.fetch(Endpoint::InitInfo).await {
            Ok(info) => {
                let version = string_at(&info, "/romversion");
                if version.is_none() {
                    debug!("init_info response carries no romversion");
                }
                version
            }
            Err(e) => {
                warn!(error = %e, "could not fetch firmware version");
                None
            }
        };

        debug!(?mac_address, ?firmware_version, "identity derived");
        Identity {
            mac_address,
            firmware_version,
        }
    }

    /// Fetch one endpoint, returning the failure cause.
    pub async fn fetch(&self, endpoint: Endpoint) -> Result<Value, Error> {
        self.authenticated_get(endpoint.path()).await
    }

    /// Fetch one endpoint, logging and swallowing any failure.
    pub async fn get_endpoint(&self, endpoint: Endpoint) -> Option<Value> {
        match self.fetch(endpoint).await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(endpoint = %endpoint, error = %e, "endpoint call failed");
                None
            }
        }
    }

    /// WAN throughput counters.
    ///
    /// `GET xqnetwork/wan_statistics`
    pub async fn wan_statistics(&self) -> Option<Value> {
        self.get_endpoint(Endpoint::WanStatistics).await
    }

    /// Connected client devices.
    ///
    /// `GET misystem/devicelist`
    pub async fn device_list(&self) -> Option<Value> {
        self.get_endpoint(Endpoint::DeviceList).await
    }

    /// Initialisation info (ROM version, model, locale).
    ///
    /// `GET xqsystem/init_info`
    pub async fn init_info(&self) -> Option<Value> {
        self.get_endpoint(Endpoint::InitInfo).await
    }

    /// `GET xqdtcustom/wifi_display`
    pub async fn wifi_display(&self) -> Option<Value> {
        self.get_endpoint(Endpoint::WifiDisplay).await
    }

    /// Custom status block, including `hardware.mac`.
    ///
    /// `GET xqdtcustom/newstatus`
    pub async fn new_status(&self) -> Option<Value> {
        self.get_endpoint(Endpoint::NewStatus).await
    }

    /// `GET xqdtcustom/get_sim_info`
    pub async fn sim_info(&self) -> Option<Value> {
        self.get_endpoint(Endpoint::SimInfo).await
    }

    /// `GET xqsystem/system_info`
    pub async fn system_info(&self) -> Option<Value> {
        self.get_endpoint(Endpoint::SystemInfo).await
    }

    /// `GET xqnetwork/wifi_status`
    pub async fn wifi_status(&self) -> Option<Value> {
        self.get_endpoint(Endpoint::WifiStatus).await
    }

    /// `GET xqnetwork/wifi_detail`
    pub async fn wifi_detail(&self) -> Option<Value> {
        self.get_endpoint(Endpoint::WifiDetail).await
    }

    /// `GET xqnetwork/wifi_detail_all`
    pub async fn wifi_detail_all(&self) -> Option<Value> {
        self.get_endpoint(Endpoint::WifiDetailAll).await
    }

    /// Cellular modem status: band, signal levels, IPv4 info.
    ///
    /// `GET xqdtcustom/cpe_detect`
    pub async fn cpe_detect(&self) -> Option<Value> {
        self.get_endpoint(Endpoint::CpeDetect).await
    }

    /// `GET xqmobile/get_apn_info`
    pub async fn apn_info(&self) -> Option<Value> {
        self.get_endpoint(Endpoint::ApnInfo).await
    }

    /// `GET xqmobile/get_mobile_net_cfg`
    pub async fn mobile_net_cfg(&self) -> Option<Value> {
        self.get_endpoint(Endpoint::MobileNetCfg).await
    }

    /// SMS inbox counters.
    ///
    /// `GET xqmobile/get_msgbox_count`
    pub async fn msgbox_count(&self) -> Option<Value> {
        self.get_endpoint(Endpoint::MsgboxCount).await
    }
}
