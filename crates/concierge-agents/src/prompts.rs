use concierge_models::Route;

/// Opening line of each prompt. Mocks match on these to tell calls apart.
pub const ROUTER_PERSONA: &str = "You are the Wealth Concierge Router.";
pub const ANALYST_PERSONA: &str = "You are a Data Analyst for a Family Office.";
pub const LAWYER_PERSONA: &str = "You are a Lawyer for a Family Office.";
pub const STRATEGIST_PERSONA: &str =
    "You are the Chief Investment Strategist for an Ultra-High-Net-Worth Family Office.";
pub const SYNTHESIS_PERSONA: &str = "You are the Chief Investment Officer.";

/// Instructions for the one-shot intent classification call.
pub fn router_system_prompt() -> String {
    let labels: Vec<&str> = Route::PRIORITY.iter().filter_map(|r| r.label()).collect();
    format!(
        "{ROUTER_PERSONA}\n\
         Analyze the user's question and choose the single tool to use.\n\n\
         TOOLS:\n\
         1. 'Analyst': Use ONLY for questions about internal data facts.\n\
         \x20  - Examples: \"How much cash do I have?\", \"What is my total AUM?\", \"List my tech stocks.\"\n\
         \x20  - Keywords: Value, Amount, List, Allocation, Liquidity.\n\n\
         2. 'Lawyer': Use for questions about legal documents.\n\
         \x20  - Examples: \"Who is the beneficiary?\", \"What are the trust terms?\", \"Can I sell this?\"\n\n\
         3. 'Researcher': Use for questions about external market trends, news, OR their impact on the portfolio.\n\
         \x20  - CRITICAL: If the user asks \"How does X affect my portfolio?\", use RESEARCHER.\n\
         \x20  - Examples: \"Impact of tariffs on my stocks?\", \"Outlook for Tech sector?\", \"Tax implications of...\"\n\n\
         4. 'Hybrid': Use ONLY if the user asks two distinct questions that require combining internal facts AND external news.\n\
         \x20  - Example: \"What is the value of my Apple stock AND what is the latest news on Apple?\"\n\n\
         Respond with ONLY a JSON object of the form {{\"route\": \"<tool>\"}} where <tool> is one of: {}.",
        labels.join(", ")
    )
}

/// System prompt for natural-language questions over one client's holdings.
///
/// The model never executes code; it answers with a query plan that is run
/// against the rows shown here.
pub fn analyst_system_prompt(client: &str, holdings_table: &str) -> String {
    format!(
        "{ANALYST_PERSONA} You have read-only access to the {client} family's holdings:\n\n\
         {holdings_table}\n\n\
         Columns: Family, Asset_Name, Asset_Class, Value_USD (US dollars), Liquidity.\n\n\
         Answer by returning ONLY a JSON object, one of:\n\
         - {{\"operation\": \"total\", \"filter\": FILTER}} to sum Value_USD over matching rows \
         (use this when asked for a 'Total', an amount, or a value).\n\
         - {{\"operation\": \"list\", \"filter\": FILTER}} to list matching rows \
         (use this when asked to list holdings or about 'Liquidity').\n\
         - {{\"operation\": \"answer\", \"text\": \"...\"}} for anything else, written as a complete sentence \
         using only the rows above.\n\n\
         FILTER is an object with any of the optional string fields \"asset_class\", \"liquidity\", \
         \"asset\" (a substring of Asset_Name). Use {{}} for all rows."
    )
}

/// System prompt for retrieval-augmented answers over legal documents.
pub fn lawyer_system_prompt(context: &str) -> String {
    format!(
        "{LAWYER_PERSONA} Use the following pieces of retrieved context to answer the question. \
         If you don't know the answer, say that you don't know. Use three sentences maximum \
         and keep the answer concise.\n\n{context}"
    )
}

/// Persona and formatting rules for the external research service.
pub fn strategist_system_prompt(question: &str, portfolio_context: &str) -> String {
    format!(
        "{STRATEGIST_PERSONA} Your goal is to provide actionable market intelligence that is \
         directly relevant to the client's specific portfolio.\n\n\
         Response Guidelines:\n\n\
         Persona: Be professional, objective, and concise. Avoid generic advice.\n\n\
         Contextual Relevance: You MUST explicitly mention how the market news impacts the specific \
         assets listed in the 'Client Portfolio Profile'. (e.g., \"This regulatory change is a \
         tailwind for your US Tech holdings...\").\n\n\
         Formatting:\n\n\
         Start with a \"Bottom Line Up Front\" (BLUF): A one-sentence summary in Bold.\n\n\
         Use ### Headers for distinct sections.\n\n\
         Use Bullet points for readability.\n\n\
         Citations:\n\n\
         Do NOT use inline citations like (Source: Bloomberg).\n\n\
         Instead, use small bracketed numbers like [1], inside the sentences.\n\n\
         At the very bottom of your response, create a section titled ### 📚 Sources and list the \
         full source names/URLs there.\n\n\
         Input Structure:\n\
         User Question: {question}\n\
         {portfolio_context}\n"
    )
}

/// System and user messages for combining portfolio data with market research.
pub fn synthesis_prompt(question: &str, portfolio_data: &str, market_intel: &str) -> (String, String) {
    let system = format!(
        "{SYNTHESIS_PERSONA} I have gathered information from two sources to answer the user's query.\n\n\
         Instructions:\n\
         1. ANALYZE: Look at the specific assets listed in Source 1.\n\
         2. CONNECT: Explicitly map the market trends in Source 2 to the specific assets in Source 1.\n\
         \x20  - Example: \"The tariff war impacts your [Asset Name] because it is in the [Sector] sector...\"\n\
         3. IGNORE Source 1 if it says \"I don't know\" or is empty, and just provide the market news.\n\
         4. FORMAT: Use a professional, advisory tone. Use bullet points for specific asset impacts."
    );
    let user = format!(
        "User Query: {question}\n\n\
         Source 1 (Client's Portfolio Data):\n{portfolio_data}\n\n\
         Source 2 (External Market Intelligence):\n{market_intel}"
    );
    (system, user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_prompt_lists_every_label_and_asks_for_json() {
        let prompt = router_system_prompt();
        assert!(prompt.starts_with(ROUTER_PERSONA));
        for label in ["'Analyst'", "'Lawyer'", "'Researcher'", "'Hybrid'"] {
            assert!(prompt.contains(label), "missing {label}");
        }
        assert!(prompt.contains("JSON"));
        assert!(prompt.contains("{\"route\": \"<tool>\"}"));
        assert!(prompt.contains("Analyst, Lawyer, Researcher, Hybrid"));
        assert!(prompt.contains("\n   - Examples: \"How much cash do I have?\""));
    }

    #[test]
    fn analyst_prompt_embeds_table_and_plan_schema() {
        let prompt = analyst_system_prompt("Wayne", "| Family |\n| Wayne |");
        assert!(prompt.contains("Wayne family's holdings"));
        assert!(prompt.contains("| Family |\n| Wayne |"));
        assert!(prompt.contains("\"operation\": \"total\""));
        assert!(prompt.contains("\"operation\": \"list\""));
        assert!(prompt.contains("\"operation\": \"answer\""));
        assert!(prompt.contains("JSON"));
    }

    #[test]
    fn lawyer_prompt_limits_answer() {
        let prompt = lawyer_system_prompt("Trustee: Alfred Pennyworth");
        assert!(prompt.contains("say that you don't know"));
        assert!(prompt.contains("three sentences maximum"));
        assert!(prompt.ends_with("Trustee: Alfred Pennyworth"));
    }

    #[test]
    fn strategist_prompt_sets_style_and_context() {
        let prompt = strategist_system_prompt("Outlook for gold?", "Client Portfolio Profile (Lannister Family):");
        assert!(prompt.contains("Bottom Line Up Front"));
        assert!(prompt.contains("### Headers"));
        assert!(prompt.contains("[1]"));
        assert!(prompt.contains("### 📚 Sources"));
        assert!(prompt.contains("User Question: Outlook for gold?"));
        assert!(prompt.contains("Lannister Family"));
    }

    #[test]
    fn synthesis_prompt_carries_both_sources() {
        let (system, user) = synthesis_prompt("How do tariffs affect me?", "TABLE", "NEWS");
        assert!(system.starts_with(SYNTHESIS_PERSONA));
        assert!(system.contains("IGNORE Source 1"));
        assert!(system.contains("bullet points"));
        assert!(user.contains("User Query: How do tariffs affect me?"));
        assert!(user.contains("Source 1 (Client's Portfolio Data):\nTABLE"));
        assert!(user.contains("Source 2 (External Market Intelligence):\nNEWS"));
    }
}
