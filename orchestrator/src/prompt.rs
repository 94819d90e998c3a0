//! System instruction assembly.

use forum_store::Category;

/// Builds the system instruction for one generation call.
///
/// The category's fixed instruction comes first; when a non-empty context
/// block is available it is appended under a labeled section. The user's
/// text is never merged in here, it travels as conversation turns.
pub fn system_instruction(category: Category, context_block: &str) -> String {
    let base = category.profile().system_instruction;
    if context_block.is_empty() {
        base.to_string()
    } else {
        format!("{base}\n\nRelevant documents from the knowledge base:\n\n{context_block}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_context_keeps_base_instruction_only() {
        let s = system_instruction(Category::General, "");
        assert_eq!(s, Category::General.profile().system_instruction);
    }

    #[test]
    fn context_is_appended_under_label() {
        let s = system_instruction(Category::Technical, "Document: vpn.md (Type: guide)\nContent: x");
        assert!(s.starts_with(Category::Technical.profile().system_instruction));
        assert!(s.contains("Relevant documents from the knowledge base:"));
        assert!(s.ends_with("Content: x"));
    }
}
