//! Prompt text embedded at compile time.
//!
//! [`SYSTEM_INSTRUCTION`] is sent verbatim on every request and is never
//! combined with user data. User data only ever flows through the `USER_*`
//! templates.

pub const SYSTEM_INSTRUCTION: &str = include_str!("../data/prompts/system_instruction.txt");
pub const USER_HEADER: &str = include_str!("../data/prompts/user_header.txt");
pub const USER_REFERENCE_IMAGE: &str = include_str!("../data/prompts/user_reference_image.txt");
pub const USER_ESSAY_IMAGE: &str = include_str!("../data/prompts/user_essay_image.txt");
pub const USER_ESSAY_TEXT: &str = include_str!("../data/prompts/user_essay_text.txt");
pub const USER_NO_ESSAY: &str = include_str!("../data/prompts/user_no_essay.txt");

/// Replace `{{key}}` placeholders in a template string.
///
/// Substitution is single-pass: placeholder-like text inside a substituted
/// value is copied through untouched. Unknown keys are left as written.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        match after_open.find("}}") {
            Some(end) => {
                let key = &after_open[..end];
                match vars.iter().find(|(k, _)| *k == key) {
                    Some((_, value)) => result.push_str(value),
                    None => {
                        result.push_str("{{");
                        result.push_str(key);
                        result.push_str("}}");
                    }
                }
                rest = &after_open[end + 2..];
            }
            None => {
                result.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    result.push_str(rest);
    result
}
