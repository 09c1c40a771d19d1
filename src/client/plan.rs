//! Plan steps a user may re-submit as prompts.

/// One selectable sub-task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStep {
    pub text: String,
    pub checked: bool,
}

impl PlanStep {
    pub fn new(text: impl Into<String>, checked: bool) -> Self {
        Self {
            text: text.into(),
            checked,
        }
    }

    /// Extract list items from a reply, in order.
    ///
    /// Recognizes `- [ ] x`, `- [x] x`, `- x`, `* x` and `1. x`; a `[x]` box
    /// starts checked.
    pub fn parse_list(text: &str) -> Vec<PlanStep> {
        text.lines().filter_map(parse_item).collect()
    }
}

fn parse_item(line: &str) -> Option<PlanStep> {
    let line = line.trim();
    let body = if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
        rest
    } else {
        let digits = line.find(|c: char| !c.is_ascii_digit())?;
        if digits == 0 {
            return None;
        }
        line[digits..]
            .strip_prefix(". ")
            .or_else(|| line[digits..].strip_prefix(") "))?
    };

    let (checked, body) = if let Some(rest) = body.strip_prefix("[ ] ") {
        (false, rest)
    } else if let Some(rest) = body
        .strip_prefix("[x] ")
        .or_else(|| body.strip_prefix("[X] "))
    {
        (true, rest)
    } else {
        (false, body)
    };

    let body = body.trim();
    (!body.is_empty()).then(|| PlanStep::new(body, checked))
}
