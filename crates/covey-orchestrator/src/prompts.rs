use crate::types::{AnalysisKind, Task, WorkItem};
use serde::{Deserialize, Serialize};

/// How an agent turns a task into a prompt.
///
/// Configured as an optional string: absent means [`PromptTemplate::Builtin`],
/// present means a custom template where `{target}`, `{description}`,
/// `{context}` and `{kind}` are substituted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum PromptTemplate {
    /// Kind-specific built-in prompt.
    #[default]
    Builtin,
    /// User-supplied template.
    Custom(String),
}

impl From<Option<String>> for PromptTemplate {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(template) if !template.trim().is_empty() => PromptTemplate::Custom(template),
            _ => PromptTemplate::Builtin,
        }
    }
}

impl From<PromptTemplate> for Option<String> {
    fn from(value: PromptTemplate) -> Self {
        match value {
            PromptTemplate::Builtin => None,
            PromptTemplate::Custom(template) => Some(template),
        }
    }
}

impl PromptTemplate {
    /// Render the prompt for a task.
    pub fn render(&self, task: &Task) -> String {
        match self {
            PromptTemplate::Builtin => builtin_prompt(task.kind, &task.payload),
            PromptTemplate::Custom(template) => substitute(template, task),
        }
    }
}

/// Single pass over `template`; substituted values are never rescanned and
/// unknown `{...}` spans are kept as written.
fn substitute(template: &str, task: &Task) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            rest = &rest[open..];
            break;
        };
        match &after[..close] {
            "target" => out.push_str(&task.payload.target),
            "description" => out.push_str(&task.payload.description),
            "context" => out.push_str(task.payload.context.as_deref().unwrap_or("")),
            "kind" => out.push_str(&task.kind.to_string()),
            _ => {
                // Not a placeholder: emit the brace and rescan after it.
                out.push('{');
                rest = after;
                continue;
            }
        }
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    out
}

/// The built-in prompt for `kind`: shared framing plus a kind-specific brief.
pub fn builtin_prompt(kind: AnalysisKind, item: &WorkItem) -> String {
    let brief = match kind {
        AnalysisKind::Architecture => ARCHITECTURE_BRIEF,
        AnalysisKind::Security => SECURITY_BRIEF,
        AnalysisKind::Performance => PERFORMANCE_BRIEF,
        AnalysisKind::Quality => QUALITY_BRIEF,
        AnalysisKind::Testing => TESTING_BRIEF,
        AnalysisKind::Documentation => DOCUMENTATION_BRIEF,
    };

    let mut prompt = format!(
        "You are the {kind} specialist in a team of analysis agents.\n\n\
         TARGET: {}\n",
        item.target
    );
    if !item.description.is_empty() {
        prompt.push_str(&format!("REQUEST: {}\n", item.description));
    }
    if let Some(context) = item.context.as_deref().filter(|c| !c.trim().is_empty()) {
        prompt.push_str(&format!("\nCONTEXT:\n{context}\n"));
    }
    prompt.push('\n');
    prompt.push_str(brief);
    prompt
}

/// Prompt for the coordinator's synthesis call.
///
/// `combined` is the successful outputs already labeled by kind.
pub fn synthesis_prompt(
    item: &WorkItem,
    combined: &str,
    top_recommendations: usize,
    successful: usize,
    total: usize,
) -> String {
    format!(
        "You are the lead reviewer combining reports from specialist agents.\n\n\
         TARGET: {target}\n\
         REPORTS RECEIVED: {successful} of {total}\n\n\
         {combined}\n\
         Write a consolidated assessment using exactly these sections:\n\n\
         EXECUTIVE SUMMARY:\n\
         Two to four sentences on the overall state of the target.\n\n\
         RECOMMENDATIONS:\n\
         The {top_recommendations} most important actions, ranked, one per numbered line.\n\n\
         RISK LEVEL: one of low, medium, high, critical\n\n\
         CONFIDENCE:\n\
         One sentence on how much the reports can be trusted and what is missing.\n",
        target = item.target,
    )
}

const ARCHITECTURE_BRIEF: &str = r#"Assess the architecture:
- Module boundaries, layering, and dependency direction
- Coupling hot spots and circular dependencies
- Whether the structure fits the stated purpose

Finish with a short list of concrete structural recommendations."#;

const SECURITY_BRIEF: &str = r#"Audit for security issues:
- Injection, deserialization, and path traversal risks
- Secrets or credentials in code or config
- Authentication, authorization, and input validation gaps
- Dependencies with known vulnerability patterns

Rate each finding low/medium/high/critical and suggest a fix."#;

const PERFORMANCE_BRIEF: &str = r#"Review performance:
- Hot paths, algorithmic complexity, unnecessary allocation
- Blocking I/O on async paths, missing batching or caching
- Resource limits and contention points

Order findings by expected impact."#;

const QUALITY_BRIEF: &str = r#"Review code quality:
- Readability, naming, and duplication
- Error handling consistency
- Dead code and overly long functions

List the changes that would most improve maintainability."#;

const TESTING_BRIEF: &str = r#"Evaluate the test strategy:
- What is covered and what is obviously missing
- Unit vs integration balance, flaky or slow test risks
- Edge cases worth adding

Propose the next tests to write, most valuable first."#;

const DOCUMENTATION_BRIEF: &str = r#"Evaluate the documentation:
- README accuracy and onboarding path
- Public API docs and examples
- Operational docs: configuration, deployment, troubleshooting

Suggest the documentation gaps to close first."#;
