//! Scenario scripts.
//!
//! One step per line; blank lines and `#` comments are ignored. A `#`
//! only starts a comment at the start of a line or after whitespace, so
//! hrefs may carry fragments (`href /docs#intro`).
//!
//! ```text
//! href /docs/a      # initial destination when it is the first step
//! mount
//! enter
//! flush
//! hover
//! href /docs/b
//! hover
//! unmount
//! ```

use std::fmt;
use std::str::FromStr;

/// Initial href when the script does not set one.
pub const DEFAULT_HREF: &str = "/";

/// One host event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Render the link element.
    Mount,
    /// Re-render the link as a new element.
    Remount,
    /// Remove the link element.
    Unmount,
    /// Pointer enters the element.
    Hover,
    /// Element scrolls into the viewport.
    Enter,
    /// Element scrolls out of the viewport.
    Leave,
    /// Deliver queued visibility notifications.
    Flush,
    /// Point the link at a new href.
    Href(String),
    /// Turn prefetching on.
    Enable,
    /// Turn prefetching off.
    Disable,
    /// Activate the link.
    Click,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Mount => write!(f, "mount"),
            Step::Remount => write!(f, "remount"),
            Step::Unmount => write!(f, "unmount"),
            Step::Hover => write!(f, "hover"),
            Step::Enter => write!(f, "enter"),
            Step::Leave => write!(f, "leave"),
            Step::Flush => write!(f, "flush"),
            Step::Href(href) => write!(f, "href {}", href),
            Step::Enable => write!(f, "enable"),
            Step::Disable => write!(f, "disable"),
            Step::Click => write!(f, "click"),
        }
    }
}

/// A step and the script line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptStep {
    pub line: usize,
    pub step: Step,
}

/// Parsed scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    /// Href the link starts with.
    pub initial_href: String,

    /// Steps in script order.
    pub steps: Vec<ScriptStep>,
}

impl Scenario {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Errors raised while parsing a scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioError {
    /// The step name is not recognised.
    UnknownStep { line: usize, step: String },

    /// `href` without a value.
    MissingArgument { line: usize, step: String },

    /// A step that takes no argument was given one.
    UnexpectedArgument { line: usize, step: String },
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioError::UnknownStep { line, step } => {
                write!(f, "line {}: unknown step '{}'", line, step)
            }
            ScenarioError::MissingArgument { line, step } => {
                write!(f, "line {}: '{}' requires an argument", line, step)
            }
            ScenarioError::UnexpectedArgument { line, step } => {
                write!(f, "line {}: '{}' takes no argument", line, step)
            }
        }
    }
}

impl std::error::Error for ScenarioError {}

fn strip_comment(text: &str) -> &str {
    let mut after_whitespace = true;
    for (i, c) in text.char_indices() {
        if c == '#' && after_whitespace {
            return &text[..i];
        }
        after_whitespace = c.is_whitespace();
    }
    text
}

fn parse_line(line: usize, text: &str) -> Result<Option<Step>, ScenarioError> {
    let text = strip_comment(text).trim();
    if text.is_empty() {
        return Ok(None);
    }

    let (name, argument) = match text.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, Some(rest.trim())),
        None => (text, None),
    };

    let bare = |step: Step| match argument {
        Some(_) => Err(ScenarioError::UnexpectedArgument {
            line,
            step: name.to_string(),
        }),
        None => Ok(Some(step)),
    };

    match name.to_lowercase().as_str() {
        "mount" => bare(Step::Mount),
        "remount" => bare(Step::Remount),
        "unmount" => bare(Step::Unmount),
        "hover" => bare(Step::Hover),
        "enter" => bare(Step::Enter),
        "leave" => bare(Step::Leave),
        "flush" => bare(Step::Flush),
        "enable" => bare(Step::Enable),
        "disable" => bare(Step::Disable),
        "click" => bare(Step::Click),
        "href" => match argument {
            Some(href) if !href.is_empty() => Ok(Some(Step::Href(href.to_string()))),
            _ => Err(ScenarioError::MissingArgument {
                line,
                step: name.to_string(),
            }),
        },
        _ => Err(ScenarioError::UnknownStep {
            line,
            step: name.to_string(),
        }),
    }
}

impl FromStr for Scenario {
    type Err = ScenarioError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut steps = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            if let Some(step) = parse_line(index + 1, raw)? {
                steps.push(ScriptStep {
                    line: index + 1,
                    step,
                });
            }
        }

        let initial_href = match steps.first() {
            Some(ScriptStep {
                step: Step::Href(href),
                ..
            }) => {
                let href = href.clone();
                steps.remove(0);
                href
            }
            _ => DEFAULT_HREF.to_string(),
        };

        Ok(Self {
            initial_href,
            steps,
        })
    }
}
