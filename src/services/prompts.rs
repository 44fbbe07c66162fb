//! Centralized user-facing text for the assistant panel.
//!
//! Single source of truth for greetings, fallback replies, suggested prompts
//! and status lines. Edit this file to customize what the panel says.

// ============================================================================
// GREETINGS
// ============================================================================

/// First welcome bubble shown when a panel is created.
pub const WELCOME_TITLE: &str = "Welcome to the Legal AI Assistant";

/// Second welcome bubble shown when a panel is created.
pub const WELCOME_INTRO: &str = "I'm here to help with your legal questions. \
You can ask me about contracts, rights, regulations, or any other legal matters.";

/// Single greeting left after "New Chat".
pub const FRESH_GREETING: &str = "How can I assist you with your legal questions today?";

// ============================================================================
// REPLIES & STATUS
// ============================================================================

/// Body of the assistant bubble appended when a request fails.
pub const ERROR_FALLBACK: &str = "I apologize, but I encountered an error processing your \
request. Please try again or rephrase your question.";

pub const TYPING_INDICATOR: &str = "Analyzing your question...";

pub const ERROR_BADGE: &str = "Error occurred";

pub const INPUT_HINT: &str = "Ask your legal question...";

pub const INPUT_HINT_WITH_FILE: &str = "Add a message about this document...";

/// Body used for a file-only submission.
pub fn analyzing_document(file_name: &str) -> String {
    format!("Analyzing document: {}", file_name)
}

// ============================================================================
// SUGGESTIONS
// ============================================================================

pub const SUGGESTED_PROMPTS: [&str; 6] = [
    "What are my rights as a tenant?",
    "Explain contract termination clauses",
    "How do I file a small claims case?",
    "What is the difference between a will and a trust?",
    "Explain intellectual property rights",
    "What should I do after a car accident?",
];

/// Feature cards shown under the suggestions (title, description).
pub const FEATURE_CARDS: [(&str, &str); 3] = [
    (
        "Document Analysis",
        "Upload legal documents for AI analysis and explanation",
    ),
    (
        "Case Research",
        "Find relevant case law and legal precedents",
    ),
    (
        "Reasoning Explanations",
        "Ask the AI to explain its reasoning for any answer",
    ),
];

// ============================================================================
// ACCOUNT
// ============================================================================

pub const LOGIN_MISSING_FIELDS: &str = "Please fill in both fields";
pub const LOGIN_SUCCESS: &str = "Login successful";
pub const LOGIN_INVALID: &str = "Invalid credentials";
pub const LOGIN_FAILED: &str = "Error occurred. Please try again";
