use std::sync::Arc;
use std::time::Instant;

use concierge_data::ClientPortfolio;
use concierge_models::{AgentKind, Route, RouteResult, RouterConfig};
use tracing::{info, warn};

use crate::error::AgentError;
use crate::llm::{ChatModel, ChatRequest};
use crate::parser::{parse_route, strip_reasoning};
use crate::prompts::{router_system_prompt, synthesis_prompt};
use crate::specialist::SpecialistAgent;

/// The three collaborators a question can be dispatched to.
#[derive(Clone)]
pub struct Specialists {
    pub analyst: Arc<dyn SpecialistAgent>,
    pub lawyer: Arc<dyn SpecialistAgent>,
    pub researcher: Arc<dyn SpecialistAgent>,
}

/// Classifies each question once and runs the matching execution path.
///
/// Every failure below this point is turned into visible text in the
/// returned [`RouteResult`]; nothing is retried.
pub struct IntentRouter {
    llm: Arc<dyn ChatModel>,
    specialists: Specialists,
    portfolio: Arc<ClientPortfolio>,
    config: RouterConfig,
}

impl IntentRouter {
    pub fn new(
        llm: Arc<dyn ChatModel>,
        specialists: Specialists,
        portfolio: Arc<ClientPortfolio>,
        config: RouterConfig,
    ) -> Self {
        Self {
            llm,
            specialists,
            portfolio,
            config,
        }
    }

    pub fn client(&self) -> &str {
        self.portfolio.client()
    }

    /// One classification call; the reply is mapped with [`parse_route`].
    pub async fn classify(&self, question: &str) -> Result<Route, AgentError> {
        let request = ChatRequest::new(router_system_prompt(), question).json();
        let raw = self.llm.complete(&request).await?;
        Ok(parse_route(&strip_reasoning(&raw)))
    }

    pub async fn route_and_execute(&self, question: &str) -> RouteResult {
        let start = Instant::now();

        let route = match self.classify(question).await {
            Ok(route) => route,
            Err(e) => {
                warn!(client = %self.client(), error = %e, "Classification failed");
                return RouteResult::new(AgentKind::Error, format!("Routing error: {e}"));
            }
        };
        info!(client = %self.client(), route = ?route, "Routed question");

        let result = match route {
            Route::Data => self.delegate(&self.specialists.analyst, question).await,
            Route::Legal => self.delegate(&self.specialists.lawyer, question).await,
            Route::Market => self.delegate(&self.specialists.researcher, question).await,
            Route::Hybrid => RouteResult::new(route.agent(), self.hybrid(question).await),
            Route::Unknown => RouteResult::unknown(),
        };

        info!(
            client = %self.client(),
            agent = %result.agent,
            elapsed_ms = start.elapsed().as_millis(),
            "Question answered"
        );
        RouteResult::new(result.agent, strip_reasoning(&result.response))
    }

    /// Whether hybrid mode should hand synthesis the full holdings table
    /// instead of the analyst's answer.
    pub fn is_impact_question(&self, question: &str) -> bool {
        let lower = question.to_lowercase();
        self.config
            .impact_keywords
            .iter()
            .any(|k| lower.contains(&k.to_lowercase()))
    }

    async fn delegate(&self, agent: &Arc<dyn SpecialistAgent>, question: &str) -> RouteResult {
        RouteResult::new(agent.kind(), run_stage(agent.as_ref(), question).await)
    }

    /// Data and market inputs concurrently, then one synthesis call.
    async fn hybrid(&self, question: &str) -> String {
        let start = Instant::now();
        let impact = self.is_impact_question(question);
        let data_feed = if impact { "holdings" } else { "analyst" };
        info!(client = %self.client(), data_feed, "Running hybrid protocol");

        let data = async {
            if impact {
                format!("Current Portfolio Holdings:\n{}", self.portfolio.to_markdown())
            } else {
                run_stage(self.specialists.analyst.as_ref(), question).await
            }
        };
        let market = run_stage(self.specialists.researcher.as_ref(), question);
        let (data, market) = tokio::join!(data, market);
        info!(elapsed_ms = start.elapsed().as_millis(), "Hybrid inputs gathered");

        let (system, user) = synthesis_prompt(question, &data, &market);
        match self.llm.complete(&ChatRequest::new(system, user)).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Hybrid synthesis failed");
                format!("Error executing hybrid synthesis: {e}")
            }
        }
    }
}

/// Run one collaborator, turning its failure into a stage-prefixed message.
async fn run_stage(agent: &dyn SpecialistAgent, question: &str) -> String {
    let start = Instant::now();
    match agent.answer(question).await {
        Ok(text) => {
            info!(agent = agent.name(), elapsed_ms = start.elapsed().as_millis(), "Agent succeeded");
            text
        }
        Err(e) => {
            warn!(agent = agent.name(), error = %e, elapsed_ms = start.elapsed().as_millis(), "Agent failed");
            format!("Error executing {} query: {e}", agent.name())
        }
    }
}
