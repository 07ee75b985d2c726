use serde::{Deserialize, Serialize};

/// One entry of the reference-data symbol list.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SymbolRecord {
    pub symbol: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl SymbolRecord {
    /// Common stocks are tagged `cs`.
    pub fn is_common_stock(&self) -> bool {
        !self.symbol.is_empty()
            && self
                .kind
                .as_deref()
                .is_some_and(|k| k.eq_ignore_ascii_case("cs"))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub latest_price: Option<f64>,
}

/// Key statistics for one company.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub pe_ratio: Option<f64>,
    #[serde(default, rename = "marketcap")]
    pub market_cap: Option<f64>,
    #[serde(default, rename = "week52high")]
    pub week52_high: Option<f64>,
    #[serde(default, rename = "week52low")]
    pub week52_low: Option<f64>,
}

/// A daily closing price.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DataPoint {
    pub date: String,
    pub close: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics_field_names() {
        let stats: Statistics = serde_json::from_str(
            r#"{"companyName":"Apple Inc","peRatio":28.4,"marketcap":2.1e12,"week52high":182.9,"week52low":124.2,"employees":1}"#,
        )
        .unwrap();
        assert_eq!(stats.symbol, None);
        assert_eq!(stats.company_name, "Apple Inc");
        assert_eq!(stats.pe_ratio, Some(28.4));
        assert_eq!(stats.market_cap, Some(2.1e12));
        assert_eq!(stats.week52_high, Some(182.9));
        assert_eq!(stats.week52_low, Some(124.2));
    }

    #[test]
    fn test_null_statistics_are_none() {
        let stats: Statistics =
            serde_json::from_str(r#"{"companyName":"X","peRatio":null}"#).unwrap();
        assert_eq!(stats.pe_ratio, None);
        assert_eq!(stats.market_cap, None);
    }

    #[test]
    fn test_common_stock_filter() {
        let records: Vec<SymbolRecord> = serde_json::from_str(
            r#"[{"symbol":"A","type":"cs"},{"symbol":"B","type":"et"},{"symbol":"C"},{"symbol":"","type":"cs"},{"symbol":"D","type":"CS"}]"#,
        )
        .unwrap();
        let common: Vec<&str> = records
            .iter()
            .filter(|r| r.is_common_stock())
            .map(|r| r.symbol.as_str())
            .collect();
        assert_eq!(common, ["A", "D"]);
    }
}
