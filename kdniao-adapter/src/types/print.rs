//! Print-token types.
//!
//! The print service posts the orders it wants to print; the adapter answers
//! with a signature the print service presents to KDNiao in its place.

use serde::{Deserialize, Serialize};

/// One label to print.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintItem {
    #[serde(rename = "OrderCode", default)]
    pub order_code: String,
    #[serde(rename = "PortName", default)]
    pub port_name: String,
}

/// Signed print token returned to the print service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintSignature {
    pub eid: String,
    pub signature: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_item_field_names() {
        let items = vec![PrintItem {
            order_code: "012657700387".to_string(),
            port_name: "Printer 1".to_string(),
        }];

        let json = serde_json::to_string(&items).unwrap();
        assert_eq!(json, r#"[{"OrderCode":"012657700387","PortName":"Printer 1"}]"#);
    }

    #[test]
    fn test_print_item_missing_fields_default() {
        let items: Vec<PrintItem> = serde_json::from_str(r#"[{"OrderCode":"A1"}]"#).unwrap();
        assert_eq!(items[0].order_code, "A1");
        assert!(items[0].port_name.is_empty());
    }
}
