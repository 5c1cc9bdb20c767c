//! Prompt builders for the built-in analysis flows.
//!
//! Pure functions assembling the prompts the assistant sends out; no
//! service or model specifics leak in here.

/// Angles every code review prompt asks the model to cover.
const CODE_REVIEW_ANGLES: &str = "\
1. Code quality and style
2. Performance optimization opportunities
3. Security checks
4. Maintainability assessment
5. Potential problem identification";

/// Sections every error analysis prompt asks the model to produce.
const ERROR_ANALYSIS_SECTIONS: &str = "\
1. Root cause analysis
2. Concrete fixes
3. Prevention advice
4. Related best practices";

/// Prompt for a free-form analysis of arbitrary content.
pub fn analysis_prompt(content: &str) -> String {
    content.to_string()
}

/// Prompt for a full review of a piece of code.
pub fn code_review_prompt(code: &str, language: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str(&format!(
        "Please analyze the following {} code comprehensively:\n\n",
        language
    ));
    prompt.push_str(&format!("```{}\n{}\n```\n\n", language, code));
    prompt.push_str("Cover these angles:\n");
    prompt.push_str(CODE_REVIEW_ANGLES);
    prompt.push_str("\n\nProvide concrete improvement suggestions and best-practice recommendations.");
    prompt
}

/// Prompt for diagnosing an error message, optionally with the code that
/// produced it.
pub fn error_analysis_prompt(error_message: &str, code: &str, language: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str("Please analyze the following error:\n\n");
    prompt.push_str(&format!("Error message:\n{}\n\n", error_message));
    if !code.is_empty() {
        prompt.push_str(&format!("Related code:\n```{}\n{}\n```\n\n", language, code));
    }
    prompt.push_str("Provide:\n");
    prompt.push_str(ERROR_ANALYSIS_SECTIONS);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_prompt_passes_content_through() {
        assert_eq!(analysis_prompt("summarize this"), "summarize this");
    }

    #[test]
    fn test_code_review_prompt_fences_the_code() {
        let prompt = code_review_prompt("fn main() {}", "rust");
        assert!(prompt.contains("```rust\nfn main() {}\n```"));
        assert!(prompt.contains("Security checks"));
        assert!(prompt.contains("rust code"));
    }

    #[test]
    fn test_error_analysis_prompt_includes_code_only_when_given() {
        let with_code = error_analysis_prompt("stack overflow", "loop {}", "rust");
        assert!(with_code.contains("Related code:"));
        assert!(with_code.contains("```rust\nloop {}\n```"));

        let without_code = error_analysis_prompt("stack overflow", "", "rust");
        assert!(!without_code.contains("Related code:"));
        assert!(without_code.contains("Root cause analysis"));
    }
}
