// Shared prompt fragments and prompt-building utilities.
// Each stage that calls the LLM defines its own prompts.rs alongside it.
// This file contains cross-cutting fragments.

/// Trailer appended to every extraction prompt.
pub const JSON_ONLY_TRAILER: &str = "\
Only return the valid JSON. Do not use markdown code fences. \
Do not add any explanatory text outside of the JSON.";

/// Fills `{name}` placeholders in a template in a single pass, so braces inside
/// substituted values are never expanded. Unknown placeholders are left as-is.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replacement = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, close))
        });
        match replacement {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
