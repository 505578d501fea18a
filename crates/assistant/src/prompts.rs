// Prompt templates
//
// The snapshot is embedded verbatim; nothing here reformats analysis data.

use ledgerlens_analysis::ContextSnapshot;

/// System instruction that grounds a chat in one data epoch.
pub fn chat_system_instruction(snapshot: &ContextSnapshot, language: &str) -> String {
    format!(
        "You are a financial analysis assistant.\n\
         Answer the user's questions using the analyzed balance-sheet data below as the \
         primary context for every answer. If the data does not contain what is asked, \
         say so instead of guessing. Respond in {language}.\n\
         \n\
         Analyzed balance-sheet data:\n\
         {snapshot}",
        language = language,
        snapshot = snapshot.as_str(),
    )
}

/// Fixed role instruction for the one-shot summary.
pub fn summary_role_instruction(language: &str) -> String {
    format!(
        "You are a professional financial analyst. Based on the indicators below, write an \
         objective, concise assessment (about 3-4 paragraphs) of the company's financial \
         position. Focus on growth, changes in asset structure and the current ratio. \
         Respond in {language}."
    )
}

pub fn summary_prompt(payload: &str) -> String {
    format!("Raw data and indicators:\n{payload}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_embedded_verbatim() {
        let snapshot = ContextSnapshot::from("| Line item |\n| Cash | 1.00 |\n".to_string());
        let instruction = chat_system_instruction(&snapshot, "Vietnamese");
        assert!(instruction.ends_with(snapshot.as_str()));
        assert!(instruction.contains("Respond in Vietnamese."));
    }

    #[test]
    fn test_summary_role_language() {
        assert!(summary_role_instruction("English").ends_with("Respond in English."));
    }
}
