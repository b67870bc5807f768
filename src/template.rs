//! `{name}` placeholder rendering for command and rename templates.
//!
//! `{name}` is replaced by the value of `name` in the context; `{{` and `}}`
//! produce literal braces.  Anything else involving braces is malformed.
use std::collections::BTreeMap;

use crate::error::TemplateError;

/// Render `template`, substituting every `{name}` from `vars`.
///
/// # Errors
///
/// Returns [`TemplateError::MissingVariable`] if a placeholder names a
/// variable absent from `vars`, and [`TemplateError::Malformed`] for an
/// unterminated, empty, or nested placeholder or a lone `}`.
pub fn render(template: &str, vars: &BTreeMap<String, String>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    for segment in parse(template)? {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Escaped(c) => out.push(c),
            Segment::Placeholder(name) => match vars.get(name) {
                Some(value) => out.push_str(value),
                None => {
                    return Err(TemplateError::MissingVariable {
                        template: template.to_string(),
                        variable: name.to_string(),
                        available: vars.keys().cloned().collect(),
                    });
                }
            },
        }
    }
    Ok(out)
}

/// Names of every placeholder in `template`, in order of appearance.
///
/// # Errors
///
/// Returns [`TemplateError::Malformed`] if the template cannot be parsed.
pub fn placeholders(template: &str) -> Result<Vec<&str>, TemplateError> {
    Ok(parse(template)?
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Placeholder(name) => Some(name),
            Segment::Literal(_) | Segment::Escaped(_) => None,
        })
        .collect())
}

#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Escaped(char),
    Placeholder(&'a str),
}

fn parse(template: &str) -> Result<Vec<Segment<'_>>, TemplateError> {
    let malformed = |reason: &str| TemplateError::Malformed {
        template: template.to_string(),
        reason: reason.to_string(),
    };

    let mut segments = Vec::new();
    let mut rest = template;
    while let Some(pos) = rest.find(['{', '}']) {
        let (literal, tail) = rest.split_at(pos);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        if let Some(after) = tail.strip_prefix("{{") {
            segments.push(Segment::Escaped('{'));
            rest = after;
        } else if let Some(after) = tail.strip_prefix("}}") {
            segments.push(Segment::Escaped('}'));
            rest = after;
        } else if let Some(after) = tail.strip_prefix('{') {
            let end = after
                .find(['{', '}'])
                .ok_or_else(|| malformed("unterminated placeholder"))?;
            let (name, closing) = after.split_at(end);
            let Some(after_name) = closing.strip_prefix('}') else {
                return Err(malformed("unexpected '{' in placeholder"));
            };
            if name.is_empty() {
                return Err(malformed("empty placeholder '{}'"));
            }
            segments.push(Segment::Placeholder(name));
            rest = after_name;
        } else {
            return Err(malformed("single '}' encountered"));
        }
    }
    if !rest.is_empty() {
        segments.push(Segment::Literal(rest));
    }
    Ok(segments)
}
