// Shared prompt fragments.
// Each agent defines its own template in agents/prompts.rs; this file holds
// the cross-cutting pieces appended to all of them.

/// Trailer appended to every agent prompt that expects structured output.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    Respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT include explanations or apologies.";

/// Appends the JSON-only trailer to a rendered prompt.
pub fn with_json_only(prompt: String) -> String {
    format!("{prompt}\n\n{JSON_ONLY_INSTRUCTION}")
}
