//! System prompts for the three supervisor nodes.

/// Classifier prompt: the model must answer with one JSON object.
pub const SUPERVISOR_PROMPT: &str = r#"You are a supervisor for an agent.

You need to decide whether the agent should respond or clarify.
If the agent should respond, you should return "respond".
If the agent should clarify, you should return "clarify".

CRITICAL: You MUST return a valid JSON object, not a markdown or text response.

Example:
{
    "decision": "respond",
    "reasoning": "The user's question is clear and concise, so we can respond directly."
}"#;

/// Sent after a reply that failed to parse, when repair attempts are enabled.
pub const SUPERVISOR_REPAIR_PROMPT: &str = r#"Your previous reply could not be parsed. Reply again with only a JSON object of the form {"decision": "respond" | "clarify", "reasoning": "<why>"} and nothing else."#;

const RESPONSE_PROMPT_TEMPLATE: &str = "You are a helpful AI assistant tasked with answering the user's question.
Make sure to refer to the user as {name}.";

/// Clarification prompt: the model asks one question back.
pub const CLARIFICATION_PROMPT: &str = "You are a helpful AI assistant tasked with clarifying the user's question.
Ask the user a question to help clarify their request.";

/// Response prompt addressed to `name`.
pub fn response_prompt(name: &str) -> String {
    RESPONSE_PROMPT_TEMPLATE.replace("{name}", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_prompt_names_the_user() {
        let p = response_prompt("Alice");
        assert!(p.contains("refer to the user as Alice."));
        assert!(!p.contains("{name}"));
    }
}
