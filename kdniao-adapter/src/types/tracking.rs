//! Tracking subscription and push types.

use serde::{Deserialize, Serialize};

use super::{null_as_default, ProviderReply};

// =============================================================================
// Subscription (outbound)
// =============================================================================

/// Subscribe to pushes for one waybill.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeTracingRequest {
    /// Courier company code, e.g. "SF"
    #[serde(rename = "ShipperCode")]
    pub shipper_code: String,
    /// Waybill number
    #[serde(rename = "LogisticCode")]
    pub logistic_code: String,
}

impl SubscribeTracingRequest {
    pub fn new(shipper_code: impl Into<String>, logistic_code: impl Into<String>) -> Self {
        Self {
            shipper_code: shipper_code.into(),
            logistic_code: logistic_code.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SubscribeTracingResponse {
    #[serde(rename = "EBusinessID")]
    pub ebusiness_id: String,
    #[serde(rename = "UpdateTime")]
    pub update_time: String,
    #[serde(rename = "Success")]
    pub success: bool,
    #[serde(rename = "ResultCode")]
    pub result_code: Option<String>,
    #[serde(rename = "Reason")]
    pub reason: String,
    #[serde(rename = "EstimatedDeliveryTime")]
    pub estimated_delivery_time: String,
}

impl ProviderReply for SubscribeTracingResponse {
    fn result_code(&self) -> Option<&str> {
        self.result_code.as_deref().filter(|c| !c.is_empty())
    }

    fn is_success(&self) -> bool {
        self.success
    }

    fn reason(&self) -> &str {
        &self.reason
    }
}

// =============================================================================
// Push (inbound)
// =============================================================================

/// Shipment state reported in [`TrackingEvent::state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    NoTrace,
    PickedUp,
    InTransit,
    Delivered,
    Exception,
}

impl TrackingState {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "0" => Some(TrackingState::NoTrace),
            "1" => Some(TrackingState::PickedUp),
            "2" => Some(TrackingState::InTransit),
            "3" => Some(TrackingState::Delivered),
            "4" => Some(TrackingState::Exception),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            TrackingState::NoTrace => "0",
            TrackingState::PickedUp => "1",
            TrackingState::InTransit => "2",
            TrackingState::Delivered => "3",
            TrackingState::Exception => "4",
        }
    }
}

/// One entry of a shipment's trace history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceItem {
    #[serde(rename = "AcceptTime", deserialize_with = "null_as_default")]
    pub accept_time: String,
    /// Station description
    #[serde(rename = "AcceptStation", deserialize_with = "null_as_default")]
    pub accept_station: String,
    #[serde(rename = "Remark", skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
}

/// Courier or station contact attached to a tracking event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactInfo {
    #[serde(rename = "PersonName", skip_serializing_if = "Option::is_none")]
    pub person_name: Option<String>,
    #[serde(rename = "PersonTel", skip_serializing_if = "Option::is_none")]
    pub person_tel: Option<String>,
    #[serde(rename = "PersonCode", skip_serializing_if = "Option::is_none")]
    pub person_code: Option<String>,
    #[serde(rename = "StationName", skip_serializing_if = "Option::is_none")]
    pub station_name: Option<String>,
    #[serde(rename = "StationAddress", skip_serializing_if = "Option::is_none")]
    pub station_address: Option<String>,
    #[serde(rename = "StationTel", skip_serializing_if = "Option::is_none")]
    pub station_tel: Option<String>,
}

/// Current status and trace history of one shipment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingEvent {
    #[serde(rename = "EBusinessID", skip_serializing_if = "Option::is_none")]
    pub ebusiness_id: Option<String>,
    #[serde(rename = "OrderCode", skip_serializing_if = "Option::is_none")]
    pub order_code: Option<String>,
    #[serde(rename = "ShipperCode", deserialize_with = "null_as_default")]
    pub shipper_code: String,
    #[serde(rename = "LogisticCode", deserialize_with = "null_as_default")]
    pub logistic_code: String,
    #[serde(rename = "Success", deserialize_with = "null_as_default")]
    pub success: bool,
    #[serde(rename = "Reason", skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Raw state code, see [`TrackingState`]
    #[serde(rename = "State", deserialize_with = "null_as_default")]
    pub state: String,
    /// Value of `Callback` given when subscribing
    #[serde(rename = "CallBack", skip_serializing_if = "Option::is_none")]
    pub callback: Option<String>,
    #[serde(rename = "Traces", deserialize_with = "null_as_default")]
    pub traces: Vec<TraceItem>,
    #[serde(rename = "EstimatedDeliveryTime", skip_serializing_if = "Option::is_none")]
    pub estimated_delivery_time: Option<String>,
    /// Courier who picked up the parcel
    #[serde(rename = "PickerInfo", skip_serializing_if = "Option::is_none")]
    pub picker_info: Option<ContactInfo>,
    /// Courier delivering the parcel
    #[serde(rename = "SenderInfo", skip_serializing_if = "Option::is_none")]
    pub sender_info: Option<ContactInfo>,
}

impl TrackingEvent {
    /// Typed view of [`TrackingEvent::state`]; `None` for codes outside the known set.
    pub fn tracking_state(&self) -> Option<TrackingState> {
        TrackingState::from_code(&self.state)
    }
}

/// Decoded `RequestData` of a tracking push.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingPush {
    #[serde(rename = "EBusinessID", deserialize_with = "null_as_default")]
    pub ebusiness_id: String,
    #[serde(rename = "PushTime", deserialize_with = "null_as_default")]
    pub push_time: String,
    #[serde(rename = "Count", deserialize_with = "null_as_default")]
    pub count: u32,
    #[serde(rename = "Data", deserialize_with = "null_as_default")]
    pub data: Vec<TrackingEvent>,
}

/// Response body KDNiao expects after a push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgment {
    #[serde(rename = "EBusinessID")]
    pub ebusiness_id: String,
    #[serde(rename = "UpdateTime")]
    pub update_time: String,
    #[serde(rename = "Success")]
    pub success: bool,
}

impl Acknowledgment {
    /// Accept `push`, echoing its business ID and push time.
    pub fn accepted(push: &TrackingPush) -> Self {
        Self {
            ebusiness_id: push.ebusiness_id.clone(),
            update_time: push.push_time.clone(),
            success: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUSH_DATA: &str = r#"{
        "EBusinessID": "1237100",
        "PushTime": "2024-03-01 10:20:30",
        "Count": 1,
        "Data": [{
            "EBusinessID": "1237100",
            "OrderCode": "ORD-1",
            "ShipperCode": "SF",
            "LogisticCode": "118650888018",
            "Success": true,
            "State": "2",
            "CallBack": "cb-1",
            "Traces": [
                {"AcceptTime": "2024-03-01 08:00:00", "AcceptStation": "Shenzhen hub"},
                {"AcceptTime": "2024-03-01 10:00:00", "AcceptStation": "Guangzhou hub", "Remark": "sorted"}
            ],
            "PickerInfo": {"PersonName": "Li", "PersonTel": "13800000000"}
        }]
    }"#;

    #[test]
    fn test_tracking_push_parse() {
        let push: TrackingPush = serde_json::from_str(PUSH_DATA).unwrap();

        assert_eq!(push.ebusiness_id, "1237100");
        assert_eq!(push.count, 1);
        assert_eq!(push.data.len(), 1);

        let event = &push.data[0];
        assert_eq!(event.shipper_code, "SF");
        assert_eq!(event.tracking_state(), Some(TrackingState::InTransit));
        assert_eq!(event.callback.as_deref(), Some("cb-1"));
        assert_eq!(event.traces.len(), 2);
        assert_eq!(event.traces[1].remark.as_deref(), Some("sorted"));
        assert!(event.traces[0].remark.is_none());
        assert_eq!(
            event.picker_info.as_ref().and_then(|p| p.person_name.as_deref()),
            Some("Li")
        );
        assert!(event.sender_info.is_none());
    }

    #[test]
    fn test_tracking_push_null_fields_default() {
        let push: TrackingPush = serde_json::from_str(
            r#"{"EBusinessID":"1237100","PushTime":null,"Count":null,"Data":[
                {"ShipperCode":"SF","LogisticCode":null,"Success":null,"State":"0","Traces":null,
                 "Reason":null,"PickerInfo":null},
                {"ShipperCode":"YTO","LogisticCode":"9","State":"2",
                 "Traces":[{"AcceptTime":null,"AcceptStation":"Hangzhou hub"}]}
            ]}"#,
        )
        .unwrap();

        assert_eq!(push.push_time, "");
        assert_eq!(push.count, 0);
        assert_eq!(push.data.len(), 2);

        let empty = &push.data[0];
        assert_eq!(empty.logistic_code, "");
        assert!(!empty.success);
        assert!(empty.traces.is_empty());
        assert_eq!(empty.tracking_state(), Some(TrackingState::NoTrace));

        assert_eq!(push.data[1].traces[0].accept_time, "");
        assert_eq!(push.data[1].traces[0].accept_station, "Hangzhou hub");

        let no_data: TrackingPush =
            serde_json::from_str(r#"{"EBusinessID":"1237100","Data":null}"#).unwrap();
        assert!(no_data.data.is_empty());
    }

    #[test]
    fn test_tracking_state_codes() {
        for state in [
            TrackingState::NoTrace,
            TrackingState::PickedUp,
            TrackingState::InTransit,
            TrackingState::Delivered,
            TrackingState::Exception,
        ] {
            assert_eq!(TrackingState::from_code(state.code()), Some(state));
        }
        assert_eq!(TrackingState::from_code("9"), None);
    }

    #[test]
    fn test_acknowledgment_echoes_push() {
        let push: TrackingPush = serde_json::from_str(PUSH_DATA).unwrap();
        let ack = Acknowledgment::accepted(&push);

        let json = serde_json::to_string(&ack).unwrap();
        assert_eq!(
            json,
            r#"{"EBusinessID":"1237100","UpdateTime":"2024-03-01 10:20:30","Success":true}"#
        );
    }

    #[test]
    fn test_subscribe_response_check() {
        let ok: SubscribeTracingResponse =
            serde_json::from_str(r#"{"EBusinessID":"1","Success":true,"Reason":""}"#).unwrap();
        assert!(ok.check().is_ok());

        let rejected: SubscribeTracingResponse = serde_json::from_str(
            r#"{"EBusinessID":"1","Success":false,"ResultCode":"106","Reason":"duplicate"}"#,
        )
        .unwrap();
        let err = rejected.check().unwrap_err();
        assert!(matches!(
            err,
            crate::KdniaoError::Business { ref code, ref reason } if code == "106" && reason == "duplicate"
        ));
    }
}
