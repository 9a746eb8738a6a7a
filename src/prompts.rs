//! Prompt templates for the three insight actions

/// Role text sent as the system message on every completion
pub const SYSTEM_PROMPT: &str =
    "You are a financial market assistant providing stock insights, trends, and analysis.";

const RISK_CONSIDERATIONS: [&str; 5] = [
    "Market conditions",
    "Recent earnings reports",
    "Competitive landscape",
    "Macroeconomic factors",
    "Emerging trends in the industry",
];

/// Performance-summary request built around the computed summary block
pub fn performance_prompt(summary: &str) -> String {
    format!(
        "Analyze the following stock data: {summary}\n\
         Provide a natural language summary of the stock trends, market movements, \
         and potential factors affecting performance."
    )
}

/// Risk/opportunity request for the selected tickers
pub fn risk_prompt(tickers: &[String]) -> String {
    let considerations: String = RISK_CONSIDERATIONS
        .iter()
        .map(|c| format!("- {c}\n"))
        .collect();

    format!(
        "Analyze the risks and opportunities for the following stocks: {}.\n\n\
         Consider:\n{}\n\
         Provide an overview of the biggest risks and potential opportunities for each stock.",
        tickers.join(", "),
        considerations
    )
}

/// Free-form question, prefixed with the ticker list when there is one
pub fn question_prompt(tickers: &[String], query: &str) -> String {
    if tickers.is_empty() {
        query.to_string()
    } else {
        format!("Stocks: {}\nUser Query: {}", tickers.join(", "), query)
    }
}
