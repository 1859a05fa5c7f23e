use std::sync::Arc;

use async_trait::async_trait;
use concierge_data::portfolio::parse_filter;
use concierge_data::ClientPortfolio;
use concierge_models::{format_usd, AgentKind, RowFilter};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AgentError;
use crate::llm::{ChatModel, ChatRequest};
use crate::parser::{parse_query_plan, strip_reasoning};
use crate::prompts::analyst_system_prompt;
use crate::specialist::SpecialistAgent;

/// What the model asks to be computed over the client's rows.
///
/// Plans are executed here against the pre-filtered holdings; the model has
/// no other way to read data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum QueryPlan {
    Total {
        #[serde(default)]
        filter: Option<FilterSpec>,
    },
    List {
        #[serde(default)]
        filter: Option<FilterSpec>,
    },
    Answer {
        text: String,
    },
}

/// A row filter as the model wrote it: structured fields or a
/// `field=value and ...` expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterSpec {
    Fields(RowFilter),
    Expression(String),
}

impl FilterSpec {
    pub fn resolve(&self) -> Result<RowFilter, AgentError> {
        match self {
            FilterSpec::Fields(filter) => Ok(filter.clone()),
            FilterSpec::Expression(text) => Ok(parse_filter(text)?),
        }
    }
}

fn resolve(filter: &Option<FilterSpec>) -> Result<RowFilter, AgentError> {
    filter
        .as_ref()
        .map_or_else(|| Ok(RowFilter::all()), FilterSpec::resolve)
}

fn holdings(count: usize) -> String {
    match count {
        1 => "1 holding".to_string(),
        n => format!("{n} holdings"),
    }
}

/// Answers questions about one client's holdings.
pub struct PortfolioAnalyst {
    llm: Arc<dyn ChatModel>,
    portfolio: Arc<ClientPortfolio>,
}

impl PortfolioAnalyst {
    pub fn new(llm: Arc<dyn ChatModel>, portfolio: Arc<ClientPortfolio>) -> Self {
        Self { llm, portfolio }
    }

    /// Run a plan against the client's rows and phrase the result.
    pub fn execute(&self, plan: &QueryPlan) -> Result<String, AgentError> {
        match plan {
            QueryPlan::Total { filter } => {
                let filter = resolve(filter)?;
                let total = format_usd(self.portfolio.total(&filter));
                if filter.is_empty() {
                    Ok(format!("The total value is {total}."))
                } else {
                    let count = self.portfolio.filter(&filter).len();
                    Ok(format!(
                        "The total value is {total} across {} ({filter}).",
                        holdings(count)
                    ))
                }
            }
            QueryPlan::List { filter } => {
                let filter = resolve(filter)?;
                let rows = self.portfolio.filter(&filter);
                if rows.is_empty() {
                    return Ok(format!("No holdings match {filter}."));
                }
                let mut out = format!("Found {} ({filter}):", holdings(rows.len()));
                for row in rows {
                    out.push_str(&format!(
                        "\n- {} ({}, {}): {}",
                        row.asset_name,
                        row.asset_class,
                        row.liquidity,
                        format_usd(row.value_usd)
                    ));
                }
                Ok(out)
            }
            QueryPlan::Answer { text } => Ok(text.trim().to_string()),
        }
    }
}

#[async_trait]
impl SpecialistAgent for PortfolioAnalyst {
    fn name(&self) -> &str {
        "analyst"
    }

    fn kind(&self) -> AgentKind {
        AgentKind::Analyst
    }

    async fn answer(&self, question: &str) -> Result<String, AgentError> {
        let system = analyst_system_prompt(self.portfolio.client(), &self.portfolio.to_markdown());
        let raw = self
            .llm
            .complete(&ChatRequest::new(system, question).json())
            .await?;
        let reply = strip_reasoning(&raw);

        match parse_query_plan(&reply) {
            Some(plan) => {
                debug!(client = %self.portfolio.client(), plan = ?plan, "Executing query plan");
                self.execute(&plan)
            }
            None => Ok(reply),
        }
    }
}
