//! End-to-end routing scenarios with mocked chat and research services.
//!
//! Each test scripts the classifier reply (and the synthesis reply where the
//! hybrid path runs), then checks which collaborators were called, what the
//! synthesis call was given, and the tagged answer that came back.

use std::sync::Arc;

use concierge_agents::prompts::{ANALYST_PERSONA, ROUTER_PERSONA, SYNTHESIS_PERSONA};
use concierge_agents::test_support::{
    sample_portfolio, HashEmbedder, MockSpecialist, ScriptedChat,
};
use concierge_agents::{
    DocumentLawyer, IntentRouter, MarketResearcher, PortfolioAnalyst, SpecialistAgent,
    Specialists,
};
use concierge_data::{Chunk, SemanticIndex};
use concierge_models::agent_message::UNKNOWN_ROUTE_RESPONSE;
use concierge_models::{AgentKind, RetrievalConfig, RouteResult, RouterConfig};

const MISSING_KEY: &str = "Error: PERPLEXITY_API_KEY not found in environment variables.";

struct Harness {
    chat: Arc<ScriptedChat>,
    analyst: Arc<MockSpecialist>,
    lawyer: Arc<MockSpecialist>,
    researcher: Arc<MockSpecialist>,
    router: IntentRouter,
}

impl Harness {
    fn new(chat: ScriptedChat) -> Self {
        Self::with(
            chat,
            MockSpecialist::answering(AgentKind::Analyst, "You hold $15,000,000.00 in cash."),
            MockSpecialist::answering(AgentKind::Lawyer, "Alfred Pennyworth is the trustee."),
            MockSpecialist::answering(AgentKind::Researcher, "**Tariffs pressure US tech.** [1]"),
        )
    }

    fn with(
        chat: ScriptedChat,
        analyst: MockSpecialist,
        lawyer: MockSpecialist,
        researcher: MockSpecialist,
    ) -> Self {
        let chat = Arc::new(chat);
        let analyst = Arc::new(analyst);
        let lawyer = Arc::new(lawyer);
        let researcher = Arc::new(researcher);
        let router = IntentRouter::new(
            chat.clone(),
            Specialists {
                analyst: analyst.clone(),
                lawyer: lawyer.clone(),
                researcher: researcher.clone(),
            },
            sample_portfolio("Wayne"),
            RouterConfig::default(),
        );
        Self {
            chat,
            analyst,
            lawyer,
            researcher,
            router,
        }
    }

    fn calls(&self) -> (usize, usize, usize) {
        (
            self.analyst.calls(),
            self.lawyer.calls(),
            self.researcher.calls(),
        )
    }

    /// The user message of the single synthesis call.
    fn synthesis_input(&self) -> String {
        let calls = self.chat.requests_matching(SYNTHESIS_PERSONA);
        assert_eq!(calls.len(), 1, "expected exactly one synthesis call");
        calls[0].user.clone()
    }
}

fn classify_as(label_reply: &str) -> ScriptedChat {
    ScriptedChat::new().reply_when(ROUTER_PERSONA, label_reply)
}

fn hybrid_chat() -> ScriptedChat {
    classify_as(r#"{"route": "Hybrid"}"#)
        .reply_when(SYNTHESIS_PERSONA, "- Wayne Enterprises Stock faces tariff risk.")
}

#[tokio::test]
async fn data_question_goes_to_analyst() {
    let h = Harness::new(classify_as(r#"{"route": "Analyst"}"#));
    let result = h.router.route_and_execute("How much cash do I have?").await;

    assert_eq!(
        result,
        RouteResult::new(AgentKind::Analyst, "You hold $15,000,000.00 in cash.")
    );
    assert_eq!(h.calls(), (1, 0, 0));
    assert_eq!(h.analyst.questions(), vec!["How much cash do I have?"]);
    assert_eq!(h.chat.call_count(), 1);
}

#[tokio::test]
async fn legal_question_goes_to_lawyer() {
    let h = Harness::new(classify_as("Lawyer"));
    let result = h.router.route_and_execute("Who is the trustee?").await;

    assert_eq!(result.agent, AgentKind::Lawyer);
    assert_eq!(result.response, "Alfred Pennyworth is the trustee.");
    assert_eq!(h.calls(), (0, 1, 0));
}

#[tokio::test]
async fn market_question_goes_to_researcher() {
    let h = Harness::new(classify_as(r#"{"route": "Researcher"}"#));
    let result = h
        .router
        .route_and_execute("How does the tariff war affect my tech stocks?")
        .await;

    assert_eq!(result.agent, AgentKind::Researcher);
    assert_eq!(h.calls(), (0, 0, 1));
    assert!(h.chat.requests_matching(SYNTHESIS_PERSONA).is_empty());
}

#[tokio::test]
async fn unrecognized_label_is_unknown() {
    let h = Harness::new(classify_as("Banana"));
    let result = h.router.route_and_execute("Tell me a joke").await;

    assert_eq!(result.agent, AgentKind::Unknown);
    assert_eq!(result.response, UNKNOWN_ROUTE_RESPONSE);
    assert_eq!(h.calls(), (0, 0, 0));
    assert_eq!(h.chat.call_count(), 1);
}

#[tokio::test]
async fn hybrid_with_impact_keyword_feeds_full_holdings() {
    let h = Harness::new(hybrid_chat());
    let result = h
        .router
        .route_and_execute("How will new tariffs impact my holdings and what is the latest news?")
        .await;

    assert_eq!(result.agent, AgentKind::Hybrid);
    assert_eq!(result.response, "- Wayne Enterprises Stock faces tariff risk.");
    assert_eq!(h.calls(), (0, 0, 1));

    let input = h.synthesis_input();
    assert!(input.starts_with(
        "User Query: How will new tariffs impact my holdings and what is the latest news?"
    ));
    assert!(input.contains(
        "Source 1 (Client's Portfolio Data):\nCurrent Portfolio Holdings:\n| Family | Asset_Name | Asset_Class | Value_USD | Liquidity |"
    ));
    for asset in ["Wayne Manor", "Wayne Enterprises Stock", "Cash Reserve", "Batmobile Fleet"] {
        assert!(input.contains(asset), "missing {asset}");
    }
    assert!(!input.contains("Lannister"));
    assert!(input.contains("Source 2 (External Market Intelligence):\n**Tariffs pressure US tech.** [1]"));
}

#[tokio::test]
async fn hybrid_without_impact_keyword_feeds_analyst_answer() {
    let h = Harness::new(hybrid_chat());
    let result = h
        .router
        .route_and_execute("What is my Apple position and what is the latest news on Apple?")
        .await;

    assert_eq!(result.agent, AgentKind::Hybrid);
    assert_eq!(h.calls(), (1, 0, 1));
    assert_eq!(
        h.analyst.questions(),
        vec!["What is my Apple position and what is the latest news on Apple?"]
    );

    let input = h.synthesis_input();
    assert!(input.contains("Source 1 (Client's Portfolio Data):\nYou hold $15,000,000.00 in cash."));
    assert!(!input.contains("Current Portfolio Holdings"));
}

#[tokio::test]
async fn routing_is_idempotent_with_fixed_replies() {
    let h = Harness::new(hybrid_chat());
    let question = "What is my cash balance and the news on rates?";

    let first = h.router.route_and_execute(question).await;
    let second = h.router.route_and_execute(question).await;
    assert_eq!(first, second);
    assert_eq!(h.chat.requests_matching(ROUTER_PERSONA).len(), 2);
}

#[tokio::test]
async fn missing_research_key_makes_no_call() {
    let researcher = MarketResearcher::new(
        sample_portfolio("Wayne").profile(),
        None,
        "PERPLEXITY_API_KEY",
    );
    assert_eq!(researcher.answer("Outlook for gold?").await.unwrap(), MISSING_KEY);

    let chat = Arc::new(classify_as("Researcher"));
    let router = IntentRouter::new(
        chat.clone(),
        Specialists {
            analyst: Arc::new(MockSpecialist::answering(AgentKind::Analyst, "data")),
            lawyer: Arc::new(MockSpecialist::answering(AgentKind::Lawyer, "legal")),
            researcher: Arc::new(researcher),
        },
        sample_portfolio("Wayne"),
        RouterConfig::default(),
    );

    let result = router.route_and_execute("Outlook for gold?").await;
    assert_eq!(result, RouteResult::new(AgentKind::Researcher, MISSING_KEY));
    assert_eq!(chat.call_count(), 1);
}

#[tokio::test]
async fn hybrid_passes_missing_key_message_to_synthesis() {
    let chat = Arc::new(hybrid_chat());
    let router = IntentRouter::new(
        chat.clone(),
        Specialists {
            analyst: Arc::new(MockSpecialist::answering(AgentKind::Analyst, "data")),
            lawyer: Arc::new(MockSpecialist::answering(AgentKind::Lawyer, "legal")),
            researcher: Arc::new(MarketResearcher::new(
                sample_portfolio("Wayne").profile(),
                None,
                "PERPLEXITY_API_KEY",
            )),
        },
        sample_portfolio("Wayne"),
        RouterConfig::default(),
    );

    let result = router.route_and_execute("What is the outlook for my stocks?").await;
    assert_eq!(result.agent, AgentKind::Hybrid);

    let synthesis = chat.requests_matching(SYNTHESIS_PERSONA);
    assert!(synthesis[0]
        .user
        .contains(&format!("Source 2 (External Market Intelligence):\n{MISSING_KEY}")));
}

#[tokio::test]
async fn collaborator_failure_is_tagged_with_its_stage() {
    let h = Harness::with(
        classify_as("Lawyer"),
        MockSpecialist::answering(AgentKind::Analyst, "data"),
        MockSpecialist::failing(AgentKind::Lawyer, "index offline"),
        MockSpecialist::answering(AgentKind::Researcher, "market"),
    );
    let result = h.router.route_and_execute("Who inherits the manor?").await;

    assert_eq!(result.agent, AgentKind::Lawyer);
    assert_eq!(
        result.response,
        "Error executing lawyer query: lawyer returned 503: index offline"
    );
}

#[tokio::test]
async fn hybrid_forwards_analyst_error_to_synthesis() {
    let h = Harness::with(
        hybrid_chat(),
        MockSpecialist::failing(AgentKind::Analyst, "bad plan"),
        MockSpecialist::answering(AgentKind::Lawyer, "legal"),
        MockSpecialist::answering(AgentKind::Researcher, "market news"),
    );
    let result = h
        .router
        .route_and_execute("What is my cash and what are rates doing?")
        .await;

    assert_eq!(result.agent, AgentKind::Hybrid);
    assert_eq!(result.response, "- Wayne Enterprises Stock faces tariff risk.");
    let input = h.synthesis_input();
    assert!(input.contains(
        "Source 1 (Client's Portfolio Data):\nError executing analyst query: analyst returned 503: bad plan"
    ));
    assert!(input.contains("Source 2 (External Market Intelligence):\nmarket news"));
}

#[tokio::test]
async fn synthesis_failure_is_reported_under_hybrid() {
    let chat = classify_as("Hybrid").fail_when(SYNTHESIS_PERSONA, "overloaded");
    let h = Harness::new(chat);
    let result = h.router.route_and_execute("Cash and the news?").await;

    assert_eq!(result.agent, AgentKind::Hybrid);
    assert_eq!(
        result.response,
        "Error executing hybrid synthesis: scripted returned 503: overloaded"
    );
}

#[tokio::test]
async fn classification_failure_is_a_routing_error() {
    let h = Harness::new(ScriptedChat::new().fail_when(ROUTER_PERSONA, "connection reset"));
    let result = h.router.route_and_execute("How much cash do I have?").await;

    assert_eq!(result.agent, AgentKind::Error);
    assert_eq!(
        result.response,
        "Routing error: scripted returned 503: connection reset"
    );
    assert_eq!(h.calls(), (0, 0, 0));
}

#[tokio::test]
async fn reasoning_spans_are_stripped_from_answers() {
    let h = Harness::with(
        classify_as("Lawyer"),
        MockSpecialist::answering(AgentKind::Analyst, "data"),
        MockSpecialist::answering(
            AgentKind::Lawyer,
            "<think>\nCheck the trust deed.\n<think>again</think>\n</think>\n\n  Alfred is the trustee.  ",
        ),
        MockSpecialist::answering(AgentKind::Researcher, "market"),
    );
    let result = h.router.route_and_execute("Who is the trustee?").await;
    assert_eq!(result.response, "Alfred is the trustee.");
}

#[tokio::test]
async fn real_agents_answer_a_data_question() {
    let chat = Arc::new(
        classify_as(r#"{"route": "Analyst"}"#)
            .reply_when(ANALYST_PERSONA, r#"{"operation": "total", "filter": {"asset_class": "Cash"}}"#),
    );
    let embedder = Arc::new(HashEmbedder::default());
    let index = SemanticIndex::build(
        vec![Chunk {
            source: "trust_deed.txt".to_string(),
            text: "Alfred Pennyworth serves as trustee.".to_string(),
        }],
        embedder.as_ref(),
    )
    .await
    .unwrap();

    let portfolio = sample_portfolio("Wayne");
    let router = IntentRouter::new(
        chat.clone(),
        Specialists {
            analyst: Arc::new(PortfolioAnalyst::new(chat.clone(), portfolio.clone())),
            lawyer: Arc::new(DocumentLawyer::new(
                chat.clone(),
                embedder,
                Arc::new(index),
                &RetrievalConfig::default(),
            )),
            researcher: Arc::new(MarketResearcher::new(
                portfolio.profile(),
                None,
                "PERPLEXITY_API_KEY",
            )),
        },
        portfolio,
        RouterConfig::default(),
    );

    let result = router.route_and_execute("How much cash do I have?").await;
    assert_eq!(
        result,
        RouteResult::new(
            AgentKind::Analyst,
            "The total value is $15,000,000.00 across 1 holding (asset_class=Cash)."
        )
    );
    assert_eq!(chat.call_count(), 2);
}
