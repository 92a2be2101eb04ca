use serde::{Deserialize, Serialize};

const CONTENT_PLACEHOLDER: &str = "{CONTENT}";

pub const DEFAULT_PROMPT_TEMPLATE: &str = r#"You are an experienced software testing professional specializing in Jira component testing. Your expertise spans project management, requirements analysis, development, and quality assurance.

TASK: Generate comprehensive test cases for the given component using the provided requirements.

INPUT: {CONTENT}

OUTPUT FORMAT:
- Each test case must begin with "Check" and describe a specific behavior or function that needs to be tested.
- Use format: "Check [specific functionality/behavior]"
- Return only plain text, one test case per line
- No JSON, bullets, or special formatting

TESTING REQUIREMENTS:

1. VISUAL SCALING TESTS:
   - Test component across different screen sizes: 100% - 300%
   - Test with different font ratios: 100% - 225%
   - Combine both requirements into single comprehensive test cases
   - Avoid duplicate scaling tests
   - Write in one case that can overview all scenarios

2. IMAGE ANALYSIS:
   - If images are present, analyze them thoroughly
   - Extract acceptance criteria from visual context
   - Ensure test cases reflect image-based requirements

3. CONDITIONAL LOGIC TESTING:
   - When acceptance criteria contains "When..." statements:
     * Create detailed test cases for each condition
     * Test both positive and negative scenarios
     * Keep descriptions concise but complete
     * If text has a delete tag, ignore that case

4. ACCESSIBILITY & THEME TESTING:
   - Light Mode: Include ONLY if explicitly mentioned in accessibility requirements and minimum conditions of acceptance
   - Dark Mode: Include ONLY if explicitly mentioned in accessibility requirements and minimum conditions of acceptance
   - High Contrast Mode: Include ONLY if explicitly mentioned in accessibility requirements and minimum conditions of acceptance
   - Multi-theme: If multiple themes mentioned, combine into single comprehensive test case and write all cases in one line
   - IF NO REQUIREMENT, YOU MUST NOT WRITE

5. QUALITY CONTROL:
   - Generate approximately 10 test cases
   - Eliminate duplicate or overlapping test cases
   - Ensure comprehensive coverage of all requirements
   - Merge similar functionality tests where appropriate

FINAL OUTPUT:
   - Provide approximately 10 unique test cases (if you need more, you can provide up to 15 test cases maximum), comprehensive test cases covering all specified requirements.
   - IF ACCESSIBILITY has no requirements, YOU MUST NOT WRITE TEST CASE OR MENTION about ACCESSIBILITY
   - No duplicate test cases
"#;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Title {
    pub text: String,
}

/// The `{ titles: [{ text }] }` envelope handed to the prompt builder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptInput {
    pub titles: Vec<Title>,
}

impl PromptInput {
    pub fn from_outline(text: &str) -> Self {
        Self {
            titles: vec![Title {
                text: text.to_string(),
            }],
        }
    }
}

/// Fill the first `{CONTENT}` slot with the non-blank titles, one per line.
pub fn build_prompt(template: &str, input: &PromptInput) -> String {
    let content = input
        .titles
        .iter()
        .map(|t| t.text.as_str())
        .filter(|t| !t.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    template.replacen(CONTENT_PLACEHOLDER, &content, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_has_one_slot() {
        assert_eq!(DEFAULT_PROMPT_TEMPLATE.matches(CONTENT_PLACEHOLDER).count(), 1);
    }

    #[test]
    fn outline_is_substituted() {
        let prompt = build_prompt(DEFAULT_PROMPT_TEMPLATE, &PromptInput::from_outline("1. Login"));
        assert!(prompt.contains("INPUT: 1. Login\n"));
        assert!(!prompt.contains(CONTENT_PLACEHOLDER));
    }

    #[test]
    fn blank_titles_are_skipped() {
        let input = PromptInput {
            titles: vec![
                Title { text: "a".into() },
                Title { text: "  ".into() },
                Title { text: "b".into() },
            ],
        };
        assert_eq!(build_prompt("[{CONTENT}]", &input), "[a\nb]");
    }

    #[test]
    fn only_first_slot_is_filled() {
        let input = PromptInput::from_outline("x");
        assert_eq!(build_prompt("{CONTENT} {CONTENT}", &input), "x {CONTENT}");
    }

    #[test]
    fn envelope_shape() {
        let json = serde_json::to_value(PromptInput::from_outline("t")).unwrap();
        assert_eq!(json, serde_json::json!({ "titles": [{ "text": "t" }] }));
    }
}
