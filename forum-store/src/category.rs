//! Closed set of forum categories and their fixed behavioral profiles.
//!
//! Every question, chat session, and document record belongs to exactly one
//! category. The profile maps a category to the system instruction used for
//! generation, the document types admins may upload, and the name of the
//! vector collection backing contextual retrieval. Resolving behavior through
//! this table keeps prompt text and collection naming out of handler code.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Forum/knowledge partition. Fixed, closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Technical support questions.
    Technical,
    /// Product/process ideas and proposals.
    Ideas,
    /// General queries.
    General,
    /// HR and onboarding topics.
    Hr,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Category; 4] = [
        Category::Technical,
        Category::Ideas,
        Category::General,
        Category::Hr,
    ];

    /// Stable lowercase name used in URLs and storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Technical => "technical",
            Category::Ideas => "ideas",
            Category::General => "general",
            Category::Hr => "hr",
        }
    }

    /// Fixed behavioral profile for this category.
    pub fn profile(&self) -> &'static CategoryProfile {
        match self {
            Category::Technical => &TECHNICAL_PROFILE,
            Category::Ideas => &IDEAS_PROFILE,
            Category::General => &GENERAL_PROFILE,
            Category::Hr => &HR_PROFILE,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unknown category names in paths or payloads.
#[derive(Debug, thiserror::Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "technical" => Ok(Category::Technical),
            "ideas" => Ok(Category::Ideas),
            "general" => Ok(Category::General),
            "hr" => Ok(Category::Hr),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

/// Fixed configuration record resolved once per category.
#[derive(Debug)]
pub struct CategoryProfile {
    /// System instruction template guiding the assistant for this category.
    pub system_instruction: &'static str,
    /// Document types admins may upload into this category.
    pub document_types: &'static [&'static str],
    /// Vector collection holding this category's ingested documents.
    pub collection: &'static str,
}

static TECHNICAL_PROFILE: CategoryProfile = CategoryProfile {
    system_instruction: "You are an AI assistant for the internal Q&A forum, specializing in \
the technical support category. Give precise, technically accurate answers with concrete \
steps and commands where applicable. Be concise and avoid speculating when you do not know \
something.",
    document_types: &["runbook", "guide", "specifications", "architecture"],
    collection: "technical_docs",
};

static IDEAS_PROFILE: CategoryProfile = CategoryProfile {
    system_instruction: "You are an AI assistant for the internal Q&A forum, specializing in \
the product ideas category. Respond constructively: highlight strengths of the proposal, \
point out risks, and suggest concrete next steps. Be encouraging but honest.",
    document_types: &["proposal", "roadmap", "research"],
    collection: "ideas_docs",
};

static GENERAL_PROFILE: CategoryProfile = CategoryProfile {
    system_instruction: "You are an AI assistant for the internal Q&A forum, specializing in \
the general queries category. Provide comprehensive, well-structured answers that cover the \
question from all relevant angles. Be polite and professional.",
    document_types: &["policy", "guide", "faq"],
    collection: "general_docs",
};

static HR_PROFILE: CategoryProfile = CategoryProfile {
    system_instruction: "You are an AI assistant for the internal Q&A forum, specializing in \
the HR and onboarding category. Treat every question as potentially confidential: answer \
from official policy only, never guess about individual cases, and recommend contacting HR \
directly for personal matters.",
    document_types: &["policy", "handbook", "onboarding", "benefits"],
    collection: "hr_docs",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_known_category() {
        for c in Category::ALL {
            assert_eq!(c.as_str().parse::<Category>().unwrap(), c);
        }
    }

    #[test]
    fn rejects_unknown_category() {
        assert!("finance".parse::<Category>().is_err());
    }

    #[test]
    fn profiles_are_partitioned_per_category() {
        let mut collections: Vec<&str> = Category::ALL
            .iter()
            .map(|c| c.profile().collection)
            .collect();
        collections.sort();
        collections.dedup();
        assert_eq!(collections.len(), Category::ALL.len());
    }
}
