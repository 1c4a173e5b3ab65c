//! Prompts for the product analysis.
//!
//! Every piece of prompt text lives here so the wording can change without
//! touching the request or retry logic in [`crate::pipeline::llm`], and so
//! tests can inspect the exact text sent to the model.
//!
//! Callers can override the system turn via
//! [`crate::config::AnalysisConfig::system_prompt`]; the user turn is always
//! produced by [`build_prompt`].

use crate::request::AnalysisRequest;

/// Default system turn establishing the advisor persona.
pub const SYSTEM_PROMPT: &str = "You are a helpful financial advisor.";

/// The nine keys the model must return, in report order.
pub const RESPONSE_KEYS: [&str; 9] = [
    "verdict",
    "summary",
    "pros",
    "cons",
    "charges_or_expenses",
    "risks",
    "red_flags",
    "suitability",
    "questions_to_ask",
];

/// Build the user turn for one analysis.
///
/// Pure and infallible: the same request always yields the same prompt. The
/// request's content is already bounded, so the prompt length is bounded by
/// the template plus the user-typed fields plus
/// [`crate::request::MAX_CONTENT_CHARS`].
pub fn build_prompt(request: &AnalysisRequest) -> String {
    format!(
        "You are an expert investment advisor for Indian users.\n\
Product type: {product_type}\n\
User goals: {goals}\n\
Risk profile: {risk}\n\
Time horizon: {horizon}\n\
Notes: {notes}\n\
\n\
Here is the product document:\n\
{content}\n\
\n\
Analyze this product for alignment with goals, risks, charges, and red flags.\n\
Return ONLY a JSON object with keys:\n\
{keys}.\n\
Do NOT wrap the JSON in ``` fences and do NOT add any text before or after it.\n\
\"suitability\" must be an object with keys risk, horizon, notes.\n\
All other keys except verdict and summary must be arrays of strings.\n",
        product_type = request.product_type(),
        goals = request.goals(),
        risk = request.risk_profile(),
        horizon = request.horizon(),
        notes = request.notes(),
        content = request.content(),
        keys = RESPONSE_KEYS.join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{Horizon, ProductType, RiskProfile, MAX_CONTENT_CHARS};

    fn request(content: &str) -> AnalysisRequest {
        AnalysisRequest::new(
            ProductType::MutualFund,
            "Retirement corpus",
            "Agent promised 12% returns",
            RiskProfile::Medium,
            Horizon::Long,
            content,
        )
    }

    #[test]
    fn every_field_is_interpolated() {
        let prompt = build_prompt(&request("Exit load 1% within 1 year."));
        assert!(prompt.contains("Product type: Mutual Fund"));
        assert!(prompt.contains("User goals: Retirement corpus"));
        assert!(prompt.contains("Risk profile: Medium"));
        assert!(prompt.contains("Time horizon: Long"));
        assert!(prompt.contains("Notes: Agent promised 12% returns"));
        assert!(prompt.contains("Exit load 1% within 1 year."));
    }

    #[test]
    fn lists_all_response_keys() {
        let prompt = build_prompt(&request("doc"));
        assert!(prompt.contains(
            "verdict, summary, pros, cons, charges_or_expenses, risks, red_flags, suitability, questions_to_ask"
        ));
        assert!(prompt.contains("Return ONLY a JSON object"));
    }

    #[test]
    fn deterministic() {
        let r = request("same");
        assert_eq!(build_prompt(&r), build_prompt(&r));
    }

    #[test]
    fn prompt_length_is_bounded() {
        let base = build_prompt(&request("")).chars().count();
        let huge = "Z".repeat(MAX_CONTENT_CHARS * 10);
        let prompt = build_prompt(&request(&huge));
        assert_eq!(prompt.chars().count(), base + MAX_CONTENT_CHARS);
        assert!(!prompt.contains(&"Z".repeat(MAX_CONTENT_CHARS + 1)));
    }
}
