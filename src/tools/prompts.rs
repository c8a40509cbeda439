//! Prompt templates offered through the MCP `prompts/*` methods.

use serde::{Deserialize, Serialize};

/// Arguments accepted by a prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptArgument {
    /// Argument name
    pub name: String,
    /// What the argument is for
    pub description: String,
    /// Whether the prompt can be rendered without it
    pub required: bool,
}

/// A prompt as listed by `prompts/list`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Prompt name
    pub name: String,
    /// Prompt description
    pub description: String,
    /// Accepted arguments
    pub arguments: Vec<PromptArgument>,
}

fn argument(name: &str, description: &str, required: bool) -> PromptArgument {
    PromptArgument {
        name: name.to_string(),
        description: description.to_string(),
        required,
    }
}

/// Definitions of all available prompts
pub fn prompt_definitions() -> Vec<PromptDefinition> {
    vec![
        PromptDefinition {
            name: "search_assistant".to_string(),
            description: "Generate a search assistant prompt for analyzing search results."
                .to_string(),
            arguments: vec![
                argument("query", "The search query", true),
                argument(
                    "context",
                    "Additional context about what the user is looking for",
                    false,
                ),
            ],
        },
        PromptDefinition {
            name: "research_planner".to_string(),
            description:
                "Generate a research planning prompt for comprehensive topic exploration."
                    .to_string(),
            arguments: vec![
                argument("topic", "The research topic", true),
                argument(
                    "depth",
                    "Research depth level (basic, intermediate, comprehensive)",
                    false,
                ),
            ],
        },
    ]
}

/// Prompt asking a model to analyze results for `query`.
///
/// `context` is appended as an extra paragraph when non-empty. The results
/// themselves go where the `[SEARCH_RESULTS]` placeholder sits.
pub fn search_assistant(query: &str, context: &str) -> String {
    let mut prompt = format!(
        "I need you to help me analyze search results for the query: \"{query}\"\n\
         \n\
         Please examine the following search results and provide insights about:\n\
         1. The most relevant and authoritative sources\n\
         2. Key information and facts from the results\n\
         3. Any patterns or trends in the information\n\
         4. Potential biases or limitations in the results\n\
         5. Recommendations for follow-up searches if needed\n\
         \n"
    );

    if !context.is_empty() {
        prompt.push_str(&format!("\nAdditional context: {context}\n\n"));
    }

    prompt.push_str("Search Results:\n[SEARCH_RESULTS]");
    prompt
}

/// How many questions each research depth asks for
fn depth_description(depth: &str) -> &'static str {
    match depth {
        "intermediate" => "5-8 focused questions",
        "comprehensive" => "8-12 detailed questions",
        _ => "3-5 key questions",
    }
}

/// Prompt asking a model to break `topic` into searchable questions.
///
/// Unknown depths get the basic question count but are echoed back as given.
pub fn research_planner(topic: &str, depth: &str) -> String {
    let questions = depth_description(depth);

    format!(
        "I need to research the topic: \"{topic}\"\n\
         \n\
         Please help me create a structured research plan. \
         Break this topic down into {questions} that I should search for.\n\
         \n\
         For each question, suggest:\n\
         1. Specific search queries to use\n\
         2. What type of information I'm looking for\n\
         3. How the results will contribute to understanding the overall topic\n\
         \n\
         Organize the research plan logically, starting with foundational questions\n\
         and building to more complex analysis.\n\
         \n\
         Topic: {topic}\n\
         Research Depth: {depth}\n"
    )
}
