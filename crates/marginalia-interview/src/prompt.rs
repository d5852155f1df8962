use crate::extraction::{CLOSE_TAG, OPEN_TAG};
use crate::metadata::ProjectMetadata;

/// Instruction sent as the user's turn when the caller asks to finish early.
pub const GENERATE_NOW_PROMPT: &str =
    "Please generate the product description now based on what we've discussed so far.";

/// Build the interviewer system prompt for `metadata`.
///
/// The project facts are embedded verbatim. The question budget is
/// `min_questions..=max_questions`.
#[must_use]
pub fn build_system_prompt(
    metadata: &ProjectMetadata,
    min_questions: u32,
    max_questions: u32,
) -> String {
    let name = metadata.name();
    format!(
        r#"You are a product analyst helping a developer define their new software project.
The project is called "{name}" and is described as: "{description}"
The primary language is {language}.

Interview the developer with {min_questions} to {max_questions} focused questions that cover:
- Target users and personas
- The core problem being solved
- Key features and capabilities
- Success criteria (measurable)
- Constraints (technical, business, or design)

Ask one question at a time. Keep questions concise and focused. Build on previous answers rather than repeating information the developer already provided.

When you have gathered enough information, or the developer asks you to finish, write the final product description as Markdown wrapped in {OPEN_TAG} and {CLOSE_TAG} tags, using this structure:

{OPEN_TAG}
# {name} - Product Description

## What is {name}?
...

## Target Users
...

## Core Problem
...

## Key Features
...

## Success Criteria
...

## Constraints
...
{CLOSE_TAG}

Do NOT include these tags in any response until you are ready to deliver the final document."#,
        description = metadata.description(),
        language = metadata.language(),
    )
}
