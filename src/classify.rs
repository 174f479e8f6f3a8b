// src/classify.rs

/// Annotation state of a row. Absent and blank cells are the same state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observations {
    Unannotated,
    Annotated(String),
}

impl Observations {
    pub fn from_cell(cell: Option<&str>) -> Self {
        match cell {
            Some(s) if !s.is_empty() => Observations::Annotated(s.to_string()),
            _ => Observations::Unannotated,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Observations::Unannotated => "",
            Observations::Annotated(s) => s,
        }
    }

    pub fn is_annotated(&self) -> bool {
        matches!(self, Observations::Annotated(_))
    }
}

/// Predicate over `(concept, argument, observations)`.
pub type CleanupMatcher = fn(&str, &str, &str) -> bool;

fn empty_brackets(concept: &str, argument: &str, _observations: &str) -> bool {
    concept.contains("[]") || argument.contains("[]")
}

fn ellipsis(concept: &str, argument: &str, _observations: &str) -> bool {
    concept.contains("...") || argument.contains("...")
}

fn double_question_mark(concept: &str, argument: &str, _observations: &str) -> bool {
    concept.contains("??") || argument.contains("??")
}

fn emphasis_marker(_concept: &str, _argument: &str, observations: &str) -> bool {
    observations.contains("**")
}

/// Known malformed-data patterns; such rows never get an automated annotation.
pub static CLEANUP_MATCHERS: &[(&str, CleanupMatcher)] = &[
    ("empty brackets", empty_brackets),
    ("ellipsis", ellipsis),
    ("double question mark", double_question_mark),
    ("emphasis marker", emphasis_marker),
];

/// Name of the first matcher that fires, if any.
pub fn matching_cleanup(concept: &str, argument: &str, observations: &str) -> Option<&'static str> {
    CLEANUP_MATCHERS
        .iter()
        .find(|(_, matcher)| matcher(concept, argument, observations))
        .map(|(name, _)| *name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A cleanup matcher fired but there was nothing to clear.
    CleanupMatched(&'static str),
    /// Concept or argument is blank.
    MissingInput,
    AlreadyAnnotated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Skip(SkipReason),
    /// Clear observations and save; names the matcher that fired.
    Clear(&'static str),
    Annotate,
}

/// Decide what to do with one row. Pure; looks at nothing but its inputs.
pub fn classify(concept: Option<&str>, argument: Option<&str>, observations: &Observations) -> Action {
    let concept = concept.unwrap_or("");
    let argument = argument.unwrap_or("");

    if let Some(name) = matching_cleanup(concept, argument, observations.as_str()) {
        return if observations.is_annotated() {
            Action::Clear(name)
        } else {
            Action::Skip(SkipReason::CleanupMatched(name))
        };
    }

    if concept.is_empty() || argument.is_empty() {
        return Action::Skip(SkipReason::MissingInput);
    }

    if observations.is_annotated() {
        return Action::Skip(SkipReason::AlreadyAnnotated);
    }

    Action::Annotate
}
