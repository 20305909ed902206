use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;

/// One USD-BRL observation as published by the upstream API.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct QuotationReading {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub codein: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub high: String,
    #[serde(default)]
    pub low: String,
    #[serde(rename = "varBid", default)]
    pub var_bid: String,
    #[serde(rename = "pctChange", default)]
    pub pct_change: String,
    pub bid: String,
    #[serde(default)]
    pub ask: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub create_date: String,
}

#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct UpstreamEnvelope {
    #[serde(rename = "USDBRL")]
    pub usd_brl: QuotationReading,
}

/// The only part of a reading that leaves the server.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TrimmedQuotation {
    pub bid: String,
}

impl From<&QuotationReading> for TrimmedQuotation {
    fn from(reading: &QuotationReading) -> Self {
        TrimmedQuotation {
            bid: reading.bid.clone(),
        }
    }
}

impl TrimmedQuotation {
    /// Line written to the client's output file.
    pub fn file_line(&self) -> String {
        format!("Dólar: {}\n", self.bid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PersistedQuotation {
    pub id: i64,
    pub bid: String,
    pub created_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "USDBRL": {
            "code": "USD",
            "codein": "BRL",
            "name": "Dólar Americano/Real Brasileiro",
            "high": "5.2786",
            "low": "5.2201",
            "varBid": "0.0104",
            "pctChange": "0.2",
            "bid": "5.25",
            "ask": "5.2522",
            "timestamp": "1718830799",
            "create_date": "2024-06-19 17:59:59"
        }
    }"#;

    #[test]
    fn parses_upstream_payload() {
        let envelope: UpstreamEnvelope = serde_json::from_str(SAMPLE).unwrap();
        let reading = envelope.usd_brl;
        assert_eq!(reading.code, "USD");
        assert_eq!(reading.var_bid, "0.0104");
        assert_eq!(reading.pct_change, "0.2");
        assert_eq!(reading.bid, "5.25");
        assert_eq!(reading.create_date, "2024-06-19 17:59:59");
    }

    #[test]
    fn only_bid_is_required() {
        let envelope: UpstreamEnvelope =
            serde_json::from_str(r#"{"USDBRL":{"bid":"4.99"}}"#).unwrap();
        assert_eq!(envelope.usd_brl.bid, "4.99");
        assert!(envelope.usd_brl.ask.is_empty());
    }

    #[test]
    fn rejects_payload_without_pair() {
        let result = serde_json::from_str::<UpstreamEnvelope>(r#"{"EURBRL":{"bid":"6.01"}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn trims_reading_to_bid() {
        let envelope: UpstreamEnvelope = serde_json::from_str(SAMPLE).unwrap();
        let trimmed = TrimmedQuotation::from(&envelope.usd_brl);
        assert_eq!(serde_json::to_string(&trimmed).unwrap(), r#"{"bid":"5.25"}"#);
    }

    #[test]
    fn formats_file_line() {
        let trimmed = TrimmedQuotation {
            bid: "5.30".to_string(),
        };
        assert_eq!(trimmed.file_line(), "Dólar: 5.30\n");
    }
}
