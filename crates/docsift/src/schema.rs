//! Typed document records for the seven supported classification kinds.
//!
//! The classifier returns a free-form label and JSON payload; this module is
//! the validation boundary that turns them into a closed tagged union. Any
//! payload that does not deserialize into the labeled kind's record shape
//! demotes the document to [`SimpleText`] carrying the original extracted
//! text — malformed structured extraction never becomes a hard error.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocKind {
    BankStatement,
    SimpleText,
    PurchaseInvoice,
    SalesInvoice,
    Receipt,
    PurchaseOrder,
    Challan,
}

impl DocKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BankStatement => "bank_statement",
            Self::SimpleText => "simple_text",
            Self::PurchaseInvoice => "purchase_invoice",
            Self::SalesInvoice => "sales_invoice",
            Self::Receipt => "receipt",
            Self::PurchaseOrder => "purchase_order",
            Self::Challan => "challan",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_lowercase().as_str() {
            "bank_statement" => Some(Self::BankStatement),
            "simple_text" => Some(Self::SimpleText),
            "purchase_invoice" => Some(Self::PurchaseInvoice),
            "sales_invoice" => Some(Self::SalesInvoice),
            "receipt" => Some(Self::Receipt),
            "purchase_order" => Some(Self::PurchaseOrder),
            "challan" => Some(Self::Challan),
            _ => None,
        }
    }

    /// Fields the classifier payload must carry for this kind to validate.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Self::BankStatement => {
                &["account_holder", "bank_details", "account_summary", "transactions"]
            }
            Self::SimpleText => &["extracted_text"],
            Self::PurchaseInvoice => {
                &["invoice_number", "invoice_date", "supplier", "total_amount"]
            }
            Self::SalesInvoice => &["invoice_number", "invoice_date", "customer", "total_amount"],
            Self::Receipt => &["merchant", "date", "total_amount"],
            Self::PurchaseOrder => &["order_number", "order_date", "supplier", "items"],
            Self::Challan => &["challan_number", "date", "consignee", "items"],
        }
    }

    /// Example payload shape embedded into the classification prompt.
    pub fn schema_hint(&self) -> &'static str {
        match self {
            Self::BankStatement => {
                r#"{"account_holder": {}, "bank_details": {}, "account_summary": {}, "transactions": [{}]}"#
            }
            Self::SimpleText => r#"{"extracted_text": "..."}"#,
            Self::PurchaseInvoice => {
                r#"{"invoice_number": "...", "invoice_date": "...", "supplier": "...", "line_items": [{}], "total_amount": "..."}"#
            }
            Self::SalesInvoice => {
                r#"{"invoice_number": "...", "invoice_date": "...", "customer": "...", "line_items": [{}], "total_amount": "..."}"#
            }
            Self::Receipt => {
                r#"{"merchant": "...", "date": "...", "items": [{}], "total_amount": "..."}"#
            }
            Self::PurchaseOrder => {
                r#"{"order_number": "...", "order_date": "...", "supplier": "...", "items": [{}], "total_amount": "..."}"#
            }
            Self::Challan => {
                r#"{"challan_number": "...", "date": "...", "consignee": "...", "items": [{}]}"#
            }
        }
    }

    pub fn all() -> &'static [DocKind] {
        &[
            Self::BankStatement,
            Self::SimpleText,
            Self::PurchaseInvoice,
            Self::SalesInvoice,
            Self::Receipt,
            Self::PurchaseOrder,
            Self::Challan,
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankStatement {
    pub account_holder: Value,
    pub bank_details: Value,
    pub account_summary: Value,
    /// Must be a sequence; anything else fails validation.
    pub transactions: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleText {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub extracted_text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseInvoice {
    pub invoice_number: Value,
    pub invoice_date: Value,
    pub supplier: Value,
    pub total_amount: Value,
    #[serde(default)]
    pub line_items: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesInvoice {
    pub invoice_number: Value,
    pub invoice_date: Value,
    pub customer: Value,
    pub total_amount: Value,
    #[serde(default)]
    pub line_items: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub merchant: Value,
    pub date: Value,
    pub total_amount: Value,
    #[serde(default)]
    pub items: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub order_number: Value,
    pub order_date: Value,
    pub supplier: Value,
    pub items: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challan {
    pub challan_number: Value,
    pub date: Value,
    pub consignee: Value,
    pub items: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Final per-document payload. Serializes as the bare record, matching the
/// JSON written next to each input file.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DocumentRecord {
    BankStatement(BankStatement),
    SimpleText(SimpleText),
    PurchaseInvoice(PurchaseInvoice),
    SalesInvoice(SalesInvoice),
    Receipt(Receipt),
    PurchaseOrder(PurchaseOrder),
    Challan(Challan),
}

impl DocumentRecord {
    pub fn kind(&self) -> DocKind {
        match self {
            Self::BankStatement(_) => DocKind::BankStatement,
            Self::SimpleText(_) => DocKind::SimpleText,
            Self::PurchaseInvoice(_) => DocKind::PurchaseInvoice,
            Self::SalesInvoice(_) => DocKind::SalesInvoice,
            Self::Receipt(_) => DocKind::Receipt,
            Self::PurchaseOrder(_) => DocKind::PurchaseOrder,
            Self::Challan(_) => DocKind::Challan,
        }
    }

    /// The recovery record: the untruncated primary text as a plain-text
    /// payload, with no partially-populated fields from the failed kind.
    pub fn fallback(original_text: &str) -> Self {
        Self::SimpleText(SimpleText {
            file_name: None,
            extracted_text: original_text.to_string(),
            extra: Map::new(),
        })
    }

    pub fn simple_text(file_name: &str, text: &str) -> Self {
        Self::SimpleText(SimpleText {
            file_name: Some(file_name.to_string()),
            extracted_text: text.to_string(),
            extra: Map::new(),
        })
    }

    /// Validates a classifier response against the labeled kind. Unknown
    /// labels, non-object payloads, and payloads missing required fields all
    /// demote to the simple-text fallback carrying `original_text`.
    pub fn from_classifier(label: &str, payload: Value, original_text: &str) -> Self {
        let Some(kind) = DocKind::from_label(label) else {
            warn!("Classifier returned unknown document type '{}'. Defaulting to simple_text.", label);
            return Self::fallback(original_text);
        };

        let parsed = match kind {
            DocKind::BankStatement => {
                serde_json::from_value::<BankStatement>(payload).map(Self::BankStatement)
            }
            DocKind::SimpleText => serde_json::from_value::<SimpleText>(payload).map(Self::SimpleText),
            DocKind::PurchaseInvoice => {
                serde_json::from_value::<PurchaseInvoice>(payload).map(Self::PurchaseInvoice)
            }
            DocKind::SalesInvoice => {
                serde_json::from_value::<SalesInvoice>(payload).map(Self::SalesInvoice)
            }
            DocKind::Receipt => serde_json::from_value::<Receipt>(payload).map(Self::Receipt),
            DocKind::PurchaseOrder => {
                serde_json::from_value::<PurchaseOrder>(payload).map(Self::PurchaseOrder)
            }
            DocKind::Challan => serde_json::from_value::<Challan>(payload).map(Self::Challan),
        };

        match parsed {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    "Classified as {} but payload failed validation ({}). Falling back to simple_text.",
                    kind.as_str(),
                    e
                );
                Self::fallback(original_text)
            }
        }
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_label_round_trip() {
        for kind in DocKind::all() {
            assert_eq!(DocKind::from_label(kind.as_str()), Some(*kind));
        }
        assert_eq!(DocKind::from_label("BANK_STATEMENT"), Some(DocKind::BankStatement));
        assert_eq!(DocKind::from_label("memo"), None);
    }

    #[test]
    fn test_valid_bank_statement_payload() {
        let payload = json!({
            "account_holder": {"name": "Jane Roe"},
            "bank_details": {"bank": "Example Bank"},
            "account_summary": {"closing_balance": "500"},
            "transactions": [{"description": "Salary Credit", "amount": "500"}],
            "statement_period": "Jan 2024"
        });

        let record = DocumentRecord::from_classifier("bank_statement", payload, "raw text");
        match record {
            DocumentRecord::BankStatement(ref bs) => {
                assert_eq!(bs.transactions.len(), 1);
                // Unknown field survives in the side map
                assert!(bs.extra.contains_key("statement_period"));
            }
            _ => panic!("expected bank statement, got {:?}", record.kind()),
        }
    }

    #[test]
    fn test_missing_required_field_falls_back() {
        // No "transactions" key
        let payload = json!({
            "account_holder": {},
            "bank_details": {},
            "account_summary": {}
        });

        let record = DocumentRecord::from_classifier("bank_statement", payload, "original text");
        match record {
            DocumentRecord::SimpleText(st) => {
                assert_eq!(st.extracted_text, "original text");
                assert!(st.file_name.is_none());
            }
            _ => panic!("expected simple_text fallback"),
        }
    }

    #[test]
    fn test_transactions_must_be_sequence() {
        let payload = json!({
            "account_holder": {},
            "bank_details": {},
            "account_summary": {},
            "transactions": "not a list"
        });

        let record = DocumentRecord::from_classifier("bank_statement", payload, "text");
        assert_eq!(record.kind(), DocKind::SimpleText);
    }

    #[test]
    fn test_non_object_payload_falls_back() {
        let record = DocumentRecord::from_classifier("receipt", json!("just a string"), "text");
        assert_eq!(record.kind(), DocKind::SimpleText);
    }

    #[test]
    fn test_unknown_label_falls_back() {
        let record = DocumentRecord::from_classifier("mystery_kind", json!({}), "text");
        assert_eq!(record.kind(), DocKind::SimpleText);
    }

    #[test]
    fn test_fallback_is_idempotent() {
        let first = DocumentRecord::from_classifier("purchase_invoice", json!({}), "body");
        let second = DocumentRecord::from_classifier("purchase_invoice", json!({}), "body");
        let a = first.to_value().unwrap();
        let b = second.to_value().unwrap();
        assert_eq!(a, b);
        assert_eq!(a, json!({"extracted_text": "body"}));
    }

    #[test]
    fn test_valid_receipt_payload() {
        let payload = json!({
            "merchant": "Corner Store",
            "date": "2024-03-01",
            "total_amount": "12.50",
            "items": [{"name": "coffee"}]
        });

        let record = DocumentRecord::from_classifier("receipt", payload, "text");
        assert_eq!(record.kind(), DocKind::Receipt);
    }

    #[test]
    fn test_simple_text_serializes_without_absent_file_name() {
        let record = DocumentRecord::fallback("hello");
        let value = record.to_value().unwrap();
        assert_eq!(value, json!({"extracted_text": "hello"}));

        let named = DocumentRecord::simple_text("a.pdf", "hello");
        let value = named.to_value().unwrap();
        assert_eq!(value, json!({"file_name": "a.pdf", "extracted_text": "hello"}));
    }

    #[test]
    fn test_required_fields_cover_schema_hints() {
        for kind in DocKind::all() {
            for field in kind.required_fields() {
                assert!(
                    kind.schema_hint().contains(field),
                    "{} hint missing {}",
                    kind.as_str(),
                    field
                );
            }
        }
    }
}
