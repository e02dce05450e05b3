//! Minimal `{{variable}}` template engine used by the prompt builders.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// Result alias for prompt operations.
pub type PromptResult<T> = Result<T, PromptError>;

/// Errors raised while parsing or rendering prompt templates.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    /// A placeholder was referenced but never bound.
    #[error("missing template variable: {name}")]
    MissingVariable {
        /// Name of the unbound placeholder.
        name: String,
    },

    /// The template text is malformed.
    #[error("malformed template at byte {offset}: {reason}")]
    Malformed {
        /// Byte offset of the offending placeholder.
        offset: usize,
        /// What is wrong with it.
        reason: &'static str,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(String),
}

/// A parsed template.
///
/// Placeholders are resolved in a single pass, so substituted values are
/// never scanned for further placeholders.
///
/// ```
/// use coach_prompts::{PromptTemplate, TemplateVars};
///
/// let template = PromptTemplate::parse("Week {{week}} of {{total}}").unwrap();
/// let vars = TemplateVars::new().with("week", 3).with("total", 12);
/// assert_eq!(template.render(&vars).unwrap(), "Week 3 of 12");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Parses `source` into literal and placeholder segments.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Malformed`] for unclosed or empty placeholders.
    pub fn parse(source: &str) -> PromptResult<Self> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(open) = rest.find("{{") {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_owned()));
            }
            let after_open = &rest[open + 2..];
            let close = after_open.find("}}").ok_or(PromptError::Malformed {
                offset: offset + open,
                reason: "unclosed placeholder",
            })?;
            let name = after_open[..close].trim();
            if name.is_empty() {
                return Err(PromptError::Malformed {
                    offset: offset + open,
                    reason: "empty placeholder",
                });
            }
            segments.push(Segment::Variable(name.to_owned()));

            let consumed = open + 2 + close + 2;
            offset += consumed;
            rest = &rest[consumed..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_owned()));
        }

        Ok(Self { segments })
    }

    /// Names of the placeholders in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Variable(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Renders the template.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::MissingVariable`] when a placeholder has no
    /// binding in `vars`. Bind an empty string to omit a section.
    pub fn render(&self, vars: &TemplateVars) -> PromptResult<String> {
        let mut output = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => output.push_str(text),
                Segment::Variable(name) => {
                    let value = vars.get(name).ok_or_else(|| PromptError::MissingVariable {
                        name: name.clone(),
                    })?;
                    output.push_str(value);
                }
            }
        }
        Ok(output)
    }
}

impl fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => f.write_str(text)?,
                Segment::Variable(name) => write!(f, "{{{{{name}}}}}")?,
            }
        }
        Ok(())
    }
}

/// Variable bindings for [`PromptTemplate::render`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TemplateVars {
    values: HashMap<String, String>,
}

impl TemplateVars {
    /// Creates an empty binding set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to the display form of `value`.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.values.insert(name.into(), value.to_string());
        self
    }

    /// Returns the value bound to `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_bound_variables() {
        let template = PromptTemplate::parse("{{greeting}} {{ name }}, week {{week}}").unwrap();
        let vars = TemplateVars::new()
            .with("greeting", "Hello")
            .with("name", "runner")
            .with("week", 4);
        assert_eq!(template.render(&vars).unwrap(), "Hello runner, week 4");
    }

    #[test]
    fn missing_binding_errors() {
        let template = PromptTemplate::parse("Hello {{name}}!").unwrap();
        let err = template.render(&TemplateVars::new()).unwrap_err();
        assert_eq!(
            err,
            PromptError::MissingVariable {
                name: "name".into()
            }
        );
    }

    #[test]
    fn values_are_not_rescanned() {
        let template = PromptTemplate::parse("Plan: {{plan}}").unwrap();
        let vars = TemplateVars::new().with("plan", "Mon: {{rest}}");
        assert_eq!(template.render(&vars).unwrap(), "Plan: Mon: {{rest}}");
    }

    #[test]
    fn rejects_malformed_placeholders() {
        assert!(matches!(
            PromptTemplate::parse("ok {{open"),
            Err(PromptError::Malformed { offset: 3, .. })
        ));
        assert!(matches!(
            PromptTemplate::parse("{{  }}"),
            Err(PromptError::Malformed { reason: "empty placeholder", .. })
        ));
    }

    #[test]
    fn lists_placeholders_in_order() {
        let template = PromptTemplate::parse("{{a}} and {{b}} then {{a}}").unwrap();
        assert_eq!(template.placeholders().collect::<Vec<_>>(), ["a", "b", "a"]);
        assert_eq!(template.to_string(), "{{a}} and {{b}} then {{a}}");
    }
}
