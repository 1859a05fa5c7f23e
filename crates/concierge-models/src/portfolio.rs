use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One holding in the portfolio dataset. Field names follow the CSV headers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioRow {
    #[serde(rename = "Family")]
    pub family: String,
    #[serde(rename = "Asset_Name")]
    pub asset_name: String,
    #[serde(rename = "Asset_Class")]
    pub asset_class: String,
    #[serde(rename = "Value_USD", with = "rust_decimal::serde::str")]
    pub value_usd: Decimal,
    #[serde(rename = "Liquidity")]
    pub liquidity: String,
}

/// Row predicate used by aggregate and listing queries.
///
/// Every populated field must match; comparisons ignore ASCII case.
/// `asset` is a substring match on the asset name, the others are exact.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RowFilter {
    pub asset_class: Option<String>,
    pub liquidity: Option<String>,
    pub asset: Option<String>,
}

impl RowFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.asset_class.is_none() && self.liquidity.is_none() && self.asset.is_none()
    }

    pub fn matches(&self, row: &PortfolioRow) -> bool {
        let class_ok = self
            .asset_class
            .as_deref()
            .map_or(true, |c| row.asset_class.eq_ignore_ascii_case(c.trim()));
        let liquidity_ok = self
            .liquidity
            .as_deref()
            .map_or(true, |l| row.liquidity.eq_ignore_ascii_case(l.trim()));
        let asset_ok = self.asset.as_deref().map_or(true, |a| {
            row.asset_name
                .to_lowercase()
                .contains(&a.trim().to_lowercase())
        });
        class_ok && liquidity_ok && asset_ok
    }
}

impl fmt::Display for RowFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("all holdings");
        }
        let mut parts = Vec::new();
        if let Some(c) = &self.asset_class {
            parts.push(format!("asset_class={c}"));
        }
        if let Some(l) = &self.liquidity {
            parts.push(format!("liquidity={l}"));
        }
        if let Some(a) = &self.asset {
            parts.push(format!("asset~{a}"));
        }
        f.write_str(&parts.join(", "))
    }
}

/// Share of the portfolio held in one asset class.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetAllocation {
    pub asset_class: String,
    pub value_usd: Decimal,
    /// 0-100, rounded to one decimal place.
    pub percent: Decimal,
}

/// Per-client summary sent as context to the research service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioProfile {
    pub client: String,
    pub holdings: usize,
    pub total_usd: Decimal,
    pub top_allocation: Option<AssetAllocation>,
    pub secondary_allocation: Option<AssetAllocation>,
    pub cash_percent: Decimal,
    /// Up to three asset names, largest first.
    pub key_assets: Vec<String>,
}

impl PortfolioProfile {
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PortfolioProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.holdings == 0 {
            return f.write_str("Client Portfolio Profile: No data available.");
        }

        let allocation = |a: &Option<AssetAllocation>| match a {
            Some(a) => format!("{:.1}% {}", a.percent, a.asset_class),
            None => "0.0% N/A".to_string(),
        };

        writeln!(f, "Client Portfolio Profile ({} Family):", self.client)?;
        writeln!(f, "- Total AUM: {} USD", format_usd(self.total_usd))?;
        writeln!(f, "- Top Allocation: {}", allocation(&self.top_allocation))?;
        writeln!(
            f,
            "- Secondary Allocation: {}",
            allocation(&self.secondary_allocation)
        )?;
        writeln!(f, "- Cash Position: {:.1}%", self.cash_percent)?;
        write!(f, "- Key Assets: {}", self.key_assets.join(", "))
    }
}

/// Format a dollar amount as `$1,234,567.89`.
pub fn format_usd(value: Decimal) -> String {
    let fixed = format!("{:.2}", value.round_dp(2));
    let (sign, digits) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}${grouped}.{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(name: &str, class: &str, value: Decimal, liquidity: &str) -> PortfolioRow {
        PortfolioRow {
            family: "Wayne".to_string(),
            asset_name: name.to_string(),
            asset_class: class.to_string(),
            value_usd: value,
            liquidity: liquidity.to_string(),
        }
    }

    #[test]
    fn format_usd_groups_thousands() {
        assert_eq!(format_usd(dec!(0)), "$0.00");
        assert_eq!(format_usd(dec!(999.5)), "$999.50");
        assert_eq!(format_usd(dec!(1000)), "$1,000.00");
        assert_eq!(format_usd(dec!(1234567.891)), "$1,234,567.89");
        assert_eq!(format_usd(dec!(-25000)), "-$25,000.00");
    }

    #[test]
    fn filter_matches_ignoring_case() {
        let r = row("Apple Inc.", "Equity", dec!(100), "High");
        let filter = RowFilter {
            asset_class: Some("equity".to_string()),
            liquidity: None,
            asset: Some("APPLE".to_string()),
        };
        assert!(filter.matches(&r));
        assert!(RowFilter::all().matches(&r));

        let other = RowFilter {
            liquidity: Some("Low".to_string()),
            ..RowFilter::default()
        };
        assert!(!other.matches(&r));
    }

    #[test]
    fn row_filter_deserializes_partial_object() {
        let filter: RowFilter = serde_json::from_str(r#"{"asset_class": "Cash"}"#).unwrap();
        assert_eq!(filter.asset_class.as_deref(), Some("Cash"));
        assert!(filter.liquidity.is_none());
    }

    #[test]
    fn empty_profile_renders_placeholder() {
        let profile = PortfolioProfile {
            client: "Stark".to_string(),
            holdings: 0,
            total_usd: Decimal::ZERO,
            top_allocation: None,
            secondary_allocation: None,
            cash_percent: Decimal::ZERO,
            key_assets: vec![],
        };
        assert_eq!(
            profile.render(),
            "Client Portfolio Profile: No data available."
        );
    }

    #[test]
    fn profile_renders_all_lines() {
        let profile = PortfolioProfile {
            client: "Wayne".to_string(),
            holdings: 3,
            total_usd: dec!(2000000),
            top_allocation: Some(AssetAllocation {
                asset_class: "Real Estate".to_string(),
                value_usd: dec!(1500000),
                percent: dec!(75.0),
            }),
            secondary_allocation: None,
            cash_percent: dec!(25.0),
            key_assets: vec!["Wayne Manor".to_string(), "Cash Reserve".to_string()],
        };
        let text = profile.render();
        assert!(text.starts_with("Client Portfolio Profile (Wayne Family):"));
        assert!(text.contains("- Total AUM: $2,000,000.00 USD"));
        assert!(text.contains("- Top Allocation: 75.0% Real Estate"));
        assert!(text.contains("- Secondary Allocation: 0.0% N/A"));
        assert!(text.contains("- Cash Position: 25.0%"));
        assert!(text.ends_with("- Key Assets: Wayne Manor, Cash Reserve"));
    }
}
