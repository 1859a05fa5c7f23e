use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use concierge_models::portfolio::{AssetAllocation, PortfolioProfile, PortfolioRow, RowFilter};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::DataError;

const TABLE_HEADER: &str = "| Family | Asset_Name | Asset_Class | Value_USD | Liquidity |\n\
                            |---|---|---|---|---|";

/// The whole portfolio dataset, every client included.
///
/// Only [`ClientPortfolio`] views are handed to agents.
#[derive(Debug, Clone, Default)]
pub struct PortfolioStore {
    rows: Vec<PortfolioRow>,
}

impl PortfolioStore {
    /// Load the CSV dataset from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let store = Self::from_reader(file)?;
        debug!(path = %path.display(), rows = store.rows.len(), "Loaded portfolio dataset");
        Ok(store)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DataError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let rows = csv_reader
            .deserialize()
            .collect::<Result<Vec<PortfolioRow>, csv::Error>>()?;
        Ok(Self { rows })
    }

    pub fn from_rows(rows: Vec<PortfolioRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct client identifiers in first-seen order.
    pub fn clients(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for row in &self.rows {
            if !seen.iter().any(|c| c == &row.family) {
                seen.push(row.family.clone());
            }
        }
        seen
    }

    /// The read-only view for one client.
    pub fn for_client(&self, client: &str) -> ClientPortfolio {
        ClientPortfolio::new(client, self.rows.iter().cloned())
    }
}

/// One client's holdings. Rows belonging to any other client are dropped
/// at construction, so nothing downstream can see them.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientPortfolio {
    client: String,
    rows: Vec<PortfolioRow>,
}

impl ClientPortfolio {
    pub fn new(client: &str, rows: impl IntoIterator<Item = PortfolioRow>) -> Self {
        Self {
            client: client.to_string(),
            rows: rows.into_iter().filter(|r| r.family == client).collect(),
        }
    }

    pub fn client(&self) -> &str {
        &self.client
    }

    pub fn rows(&self) -> &[PortfolioRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of `Value_USD` over matching rows.
    pub fn total(&self, filter: &RowFilter) -> Decimal {
        self.rows
            .iter()
            .filter(|r| filter.matches(r))
            .map(|r| r.value_usd)
            .sum()
    }

    pub fn filter(&self, filter: &RowFilter) -> Vec<&PortfolioRow> {
        self.rows.iter().filter(|r| filter.matches(r)).collect()
    }

    /// Value per asset class, largest first. Percentages are of the client total.
    pub fn allocations(&self) -> Vec<AssetAllocation> {
        let total = self.total(&RowFilter::all());
        let mut by_class: BTreeMap<&str, Decimal> = BTreeMap::new();
        for row in &self.rows {
            *by_class.entry(row.asset_class.as_str()).or_default() += row.value_usd;
        }

        let mut allocations: Vec<AssetAllocation> = by_class
            .into_iter()
            .map(|(class, value)| AssetAllocation {
                asset_class: class.to_string(),
                value_usd: value,
                percent: percent_of(value, total),
            })
            .collect();
        // BTreeMap order breaks ties by class name; the sort is stable.
        allocations.sort_by(|a, b| b.value_usd.cmp(&a.value_usd));
        allocations
    }

    pub fn profile(&self) -> PortfolioProfile {
        let total = self.total(&RowFilter::all());
        let mut allocations = self.allocations().into_iter();

        let cash: Decimal = self
            .rows
            .iter()
            .filter(|r| r.asset_class.eq_ignore_ascii_case("cash"))
            .map(|r| r.value_usd)
            .sum();

        let mut by_value: Vec<&PortfolioRow> = self.rows.iter().collect();
        by_value.sort_by(|a, b| b.value_usd.cmp(&a.value_usd));

        PortfolioProfile {
            client: self.client.clone(),
            holdings: self.rows.len(),
            total_usd: total,
            top_allocation: allocations.next(),
            secondary_allocation: allocations.next(),
            cash_percent: percent_of(cash, total),
            key_assets: by_value
                .into_iter()
                .take(3)
                .map(|r| r.asset_name.clone())
                .collect(),
        }
    }

    /// Every row as a markdown table.
    pub fn to_markdown(&self) -> String {
        rows_to_markdown(self.rows.iter())
    }
}

/// Render rows as a markdown table with the dataset's column names.
pub fn rows_to_markdown<'a>(rows: impl IntoIterator<Item = &'a PortfolioRow>) -> String {
    let mut out = String::from(TABLE_HEADER);
    for row in rows {
        out.push_str(&format!(
            "\n| {} | {} | {} | {} | {} |",
            row.family, row.asset_name, row.asset_class, row.value_usd, row.liquidity
        ));
    }
    out
}

/// Parse a predicate description such as `asset_class=Equity and liquidity=High`.
///
/// Clauses are separated by `,` or `and`; each is `field=value` (`==` and `:`
/// also accepted). Fields: `asset_class`/`class`, `liquidity`, `asset`/`name`.
/// An empty description or `all` selects every row.
pub fn parse_filter(description: &str) -> Result<RowFilter, DataError> {
    let trimmed = description.trim();
    let mut filter = RowFilter::all();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
        return Ok(filter);
    }

    let normalized = trimmed.replace(" AND ", ",").replace(" and ", ",");
    for clause in normalized.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        let (field, value) = clause
            .split_once("==")
            .or_else(|| clause.split_once('='))
            .or_else(|| clause.split_once(':'))
            .ok_or_else(|| DataError::Filter(format!("expected field=value, got '{clause}'")))?;

        let value = value.trim().trim_matches(|c| c == '"' || c == '\'').to_string();
        if value.is_empty() {
            return Err(DataError::Filter(format!("empty value in '{clause}'")));
        }

        match field.trim().to_ascii_lowercase().replace(['_', ' '], "").as_str() {
            "assetclass" | "class" => filter.asset_class = Some(value),
            "liquidity" => filter.liquidity = Some(value),
            "asset" | "assetname" | "name" => filter.asset = Some(value),
            other => return Err(DataError::Filter(format!("unknown field '{other}'"))),
        }
    }

    Ok(filter)
}

fn percent_of(part: Decimal, total: Decimal) -> Decimal {
    if total.is_zero() {
        return Decimal::ZERO;
    }
    (part / total * Decimal::ONE_HUNDRED).round_dp(1)
}
