//! Electronic order (e-order) types.
//!
//! Struct field order is the order KDNiao documents, and it is the order the
//! fields appear in the signed `RequestData`.

use serde::{Deserialize, Serialize};

use super::ProviderReply;

/// `ExpType` for standard express delivery.
pub const EXP_TYPE_STANDARD: &str = "1";

/// Parcel recipient.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receiver {
    #[serde(rename = "Company", default, skip_serializing_if = "String::is_empty")]
    pub company: String,
    #[serde(rename = "Name")]
    pub name: String,
    /// One of `tel` or `mobile` is required by the provider
    #[serde(rename = "Tel", default, skip_serializing_if = "String::is_empty")]
    pub tel: String,
    #[serde(rename = "Mobile", default, skip_serializing_if = "String::is_empty")]
    pub mobile: String,
    #[serde(rename = "PostCode", default, skip_serializing_if = "String::is_empty")]
    pub post_code: String,
    /// Full province name, including the "省" suffix
    #[serde(rename = "ProvinceName")]
    pub province_name: String,
    /// Full city name, including the "市" suffix
    #[serde(rename = "CityName")]
    pub city_name: String,
    #[serde(rename = "ExpAreaName", default, skip_serializing_if = "String::is_empty")]
    pub exp_area_name: String,
    #[serde(rename = "Address")]
    pub address: String,
}

/// Parcel sender. Same shape as [`Receiver`].
pub type Sender = Receiver;

/// Value-added service, e.g. insurance or cash on delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddService {
    #[serde(rename = "Name", default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "Value", default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(rename = "CustomerID", default, skip_serializing_if = "String::is_empty")]
    pub customer_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commodity {
    #[serde(rename = "GoodsName")]
    pub goods_name: String,
    #[serde(rename = "GoodsCode")]
    pub goods_code: String,
    #[serde(rename = "Goodsquantity")]
    pub goods_quantity: String,
    #[serde(rename = "GoodsPrice")]
    pub goods_price: String,
    /// Weight in kg
    #[serde(rename = "GoodsWeight")]
    pub goods_weight: String,
    #[serde(rename = "GoodsDesc")]
    pub goods_desc: String,
    /// Volume in m3
    #[serde(rename = "GoodsVol")]
    pub goods_vol: String,
}

/// Request body of the e-order service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EOrderRequest {
    /// Caller-defined value echoed back in responses and pushes
    #[serde(rename = "Callback")]
    pub callback: String,
    #[serde(rename = "MemberID")]
    pub member_id: String,
    /// E-waybill customer account
    #[serde(rename = "CustomerName")]
    pub customer_name: String,
    #[serde(rename = "CustomerPwd")]
    pub customer_pwd: String,
    #[serde(rename = "SendSite")]
    pub send_site: String,
    #[serde(rename = "ShipperCode")]
    pub shipper_code: String,
    #[serde(rename = "LogisticCode")]
    pub logistic_code: String,
    #[serde(rename = "ThrOrderCode", default, skip_serializing_if = "Option::is_none")]
    pub thr_order_code: Option<String>,
    #[serde(rename = "OrderCode")]
    pub order_code: String,
    #[serde(rename = "MonthCode")]
    pub month_code: String,
    /// 1 sender pays, 2 receiver pays, 3 monthly account, 4 third party
    #[serde(rename = "PayType")]
    pub pay_type: String,
    #[serde(rename = "ExpType")]
    pub exp_type: String,
    /// 0 notify a courier to pick up, 1 do not
    #[serde(rename = "IsNotice")]
    pub is_notice: String,
    #[serde(rename = "Cost")]
    pub cost: String,
    #[serde(rename = "OtherCost")]
    pub other_cost: String,
    #[serde(rename = "Receiver")]
    pub receiver: Receiver,
    #[serde(rename = "Sender")]
    pub sender: Sender,
    /// Pick-up window start, "yyyy-MM-dd HH:mm:ss"
    #[serde(rename = "StartDate")]
    pub start_date: String,
    #[serde(rename = "EndDate")]
    pub end_date: String,
    #[serde(rename = "Weight")]
    pub weight: String,
    #[serde(rename = "Quantity")]
    pub quantity: String,
    #[serde(rename = "Volume")]
    pub volume: String,
    #[serde(rename = "Remark")]
    pub remark: String,
    #[serde(rename = "AddService", default, skip_serializing_if = "Option::is_none")]
    pub add_service: Option<AddService>,
    #[serde(rename = "Commodity")]
    pub commodity: Vec<Commodity>,
    /// 0 no print template in the response, 1 include it
    #[serde(rename = "IsReturnPrintTemplate")]
    pub is_return_print_template: String,
    #[serde(rename = "IsSendMessage", default, skip_serializing_if = "Option::is_none")]
    pub is_send_message: Option<String>,
    #[serde(rename = "TemplateSize", default, skip_serializing_if = "Option::is_none")]
    pub template_size: Option<String>,
}

/// Waybill details assigned to an accepted e-order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OrderInfo {
    #[serde(rename = "OrderCode")]
    pub order_code: String,
    #[serde(rename = "ShipperCode")]
    pub shipper_code: String,
    #[serde(rename = "LogisticCode")]
    pub logistic_code: String,
    #[serde(rename = "MarkDestination")]
    pub mark_destination: Option<String>,
    #[serde(rename = "OriginCode")]
    pub origin_code: Option<String>,
    #[serde(rename = "OriginName")]
    pub origin_name: Option<String>,
    #[serde(rename = "DestinatioCode")]
    pub destination_code: Option<String>,
    #[serde(rename = "DestinatioName")]
    pub destination_name: Option<String>,
    #[serde(rename = "SortingCode")]
    pub sorting_code: Option<String>,
    #[serde(rename = "PackageCode")]
    pub package_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EOrderResponse {
    #[serde(rename = "EBusinessID")]
    pub ebusiness_id: String,
    #[serde(rename = "Order")]
    pub order: OrderInfo,
    #[serde(rename = "Success")]
    pub success: bool,
    #[serde(rename = "ResultCode")]
    pub result_code: String,
    #[serde(rename = "Reason")]
    pub reason: String,
    #[serde(rename = "UniquerRequestNumber")]
    pub unique_request_number: String,
    #[serde(rename = "PrintTemplate")]
    pub print_template: Option<String>,
    #[serde(rename = "EstimatedDeliveryTime")]
    pub estimated_delivery_time: Option<String>,
    #[serde(rename = "Callback")]
    pub callback: Option<String>,
    #[serde(rename = "SubCount")]
    pub sub_count: u32,
    #[serde(rename = "SubOrders")]
    pub sub_orders: Option<String>,
    #[serde(rename = "SubPrintTemplates")]
    pub sub_print_templates: Option<String>,
    #[serde(rename = "ReceiverSafePhone")]
    pub receiver_safe_phone: Option<String>,
    #[serde(rename = "SenderSafePhone")]
    pub sender_safe_phone: Option<String>,
    /// Dial page URL, rendered as a QR code on the label
    #[serde(rename = "DialPage")]
    pub dial_page: String,
}

impl ProviderReply for EOrderResponse {
    /// Always present: an e-order is accepted only on `"100"`, whatever
    /// `Success` says.
    fn result_code(&self) -> Option<&str> {
        Some(self.result_code.as_str())
    }

    fn is_success(&self) -> bool {
        self.success
    }

    fn reason(&self) -> &str {
        &self.reason
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receiver_omits_empty_optionals() {
        let receiver = Receiver {
            name: "Zhang San".to_string(),
            mobile: "13800000000".to_string(),
            company: String::new(),
            province_name: "广东省".to_string(),
            city_name: "深圳市".to_string(),
            address: "1 Keyuan Rd".to_string(),
            ..Default::default()
        };

        let json = serde_json::to_string(&receiver).unwrap();
        assert_eq!(
            json,
            r#"{"Name":"Zhang San","Mobile":"13800000000","ProvinceName":"广东省","CityName":"深圳市","Address":"1 Keyuan Rd"}"#
        );
    }

    #[test]
    fn test_eorder_request_field_order() {
        let json = serde_json::to_string(&EOrderRequest::default()).unwrap();

        let callback = json.find("\"Callback\"").unwrap();
        let shipper = json.find("\"ShipperCode\"").unwrap();
        let receiver = json.find("\"Receiver\"").unwrap();
        let template = json.find("\"IsReturnPrintTemplate\"").unwrap();
        assert!(callback < shipper && shipper < receiver && receiver < template);
        assert!(!json.contains("AddService"));
        assert!(!json.contains("ThrOrderCode"));
    }

    #[test]
    fn test_eorder_response_parse() {
        let body = r#"{
            "EBusinessID": "1237100",
            "Order": {"OrderCode": "ORD-1", "ShipperCode": "SF", "LogisticCode": "118650888018", "DestinatioName": "Guangzhou"},
            "Success": true,
            "ResultCode": "100",
            "UniquerRequestNumber": "5e66486b-8fbc-4131",
            "SubCount": 0
        }"#;

        let rep: EOrderResponse = serde_json::from_str(body).unwrap();
        assert_eq!(rep.order.logistic_code, "118650888018");
        assert_eq!(rep.order.destination_name.as_deref(), Some("Guangzhou"));
        assert!(rep.check().is_ok());
    }

    #[test]
    fn test_eorder_response_without_result_code_fails() {
        let body = r#"{"EBusinessID":"1237100","Success":true,"Reason":"pending"}"#;
        let rep: EOrderResponse = serde_json::from_str(body).unwrap();

        match rep.check() {
            Err(crate::KdniaoError::Business { code, reason }) => {
                assert_eq!(code, "");
                assert_eq!(reason, "pending");
            }
            other => panic!("Expected business error, got {other:?}"),
        }
    }

    #[test]
    fn test_eorder_response_business_failure() {
        let body = r#"{"EBusinessID":"1237100","Success":false,"ResultCode":"105","Reason":"bad sign"}"#;
        let rep: EOrderResponse = serde_json::from_str(body).unwrap();

        match rep.check() {
            Err(crate::KdniaoError::Business { code, reason }) => {
                assert_eq!(code, "105");
                assert_eq!(reason, "bad sign");
            }
            other => panic!("Expected business error, got {other:?}"),
        }
    }
}
