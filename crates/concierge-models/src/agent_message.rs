use std::fmt;

use serde::{Deserialize, Serialize};

/// Fixed reply when the classifier output names none of the known routes.
pub const UNKNOWN_ROUTE_RESPONSE: &str = "I'm not sure how to route this query.";

/// Which execution path answers a question. Decided once per question.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Data,
    Legal,
    Market,
    Hybrid,
    Unknown,
}

impl Route {
    /// Routable variants in the order their labels are matched.
    pub const PRIORITY: [Route; 4] = [Route::Data, Route::Legal, Route::Market, Route::Hybrid];

    /// The label the classifier is asked to emit for this route.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Route::Data => Some("Analyst"),
            Route::Legal => Some("Lawyer"),
            Route::Market => Some("Researcher"),
            Route::Hybrid => Some("Hybrid"),
            Route::Unknown => None,
        }
    }

    /// The agent tag reported for answers produced on this route.
    pub fn agent(&self) -> AgentKind {
        match self {
            Route::Data => AgentKind::Analyst,
            Route::Legal => AgentKind::Lawyer,
            Route::Market => AgentKind::Researcher,
            Route::Hybrid => AgentKind::Hybrid,
            Route::Unknown => AgentKind::Unknown,
        }
    }
}

/// Tag identifying which path answered. Serialized as the bare name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AgentKind {
    Analyst,
    Lawyer,
    Researcher,
    Hybrid,
    Unknown,
    Error,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Analyst => "Analyst",
            AgentKind::Lawyer => "Lawyer",
            AgentKind::Researcher => "Researcher",
            AgentKind::Hybrid => "Hybrid",
            AgentKind::Unknown => "Unknown",
            AgentKind::Error => "Error",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The answer handed back across the conversation shell boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouteResult {
    pub agent: AgentKind,
    pub response: String,
}

impl RouteResult {
    pub fn new(agent: AgentKind, response: impl Into<String>) -> Self {
        Self {
            agent,
            response: response.into(),
        }
    }

    pub fn unknown() -> Self {
        Self::new(AgentKind::Unknown, UNKNOWN_ROUTE_RESPONSE)
    }

    /// Markdown shown in the chat transcript.
    pub fn render(&self) -> String {
        format!("**[{} Agent]**\n\n{}", self.agent, self.response)
    }
}
