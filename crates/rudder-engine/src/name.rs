//! Release name generation from name templates
//!
//! Name templates are rendered with MiniJinja. Go-template call style is
//! accepted inside `{{ }}` blocks and rewritten to call syntax before
//! rendering:
//!
//! ```text
//! demo-{{randAlphaNum 4}}          =>  demo-{{ randAlphaNum(4) }}
//! {{ randAlpha 6 | lower }}        =>  {{ randAlpha(6) | lower }}
//! {{ "Web" | lower | trunc 2 }}    =>  {{ "Web" | lower | trunc(2) }}
//! ```
//!
//! Random helpers draw from a generator seeded with the SHA-256 of the
//! template text, so a template always produces the same name.

use minijinja::{Environment, UndefinedBehavior};
use sha2::{Digest, Sha256};

use crate::error::{EngineError, Result, TemplateError};
use crate::filters;
use crate::functions::{SharedRng, register_random};

const TEMPLATE_NAME: &str = "nameTemplate";

/// Renders release names from name templates
#[derive(Debug, Clone, Default)]
pub struct NameGenerator;

impl NameGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Render `template` into a release name
    pub fn generate(&self, template: &str) -> Result<String> {
        let source = to_call_syntax(template);
        let env = environment(seed(template));

        let name = env
            .render_str(&source, minijinja::context! {})
            .map_err(|e| TemplateError::from_minijinja(e, TEMPLATE_NAME, &source))?;

        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(EngineError::EmptyName {
                template: template.to_string(),
            });
        }

        tracing::debug!(template, name = %name, "generated release name");
        Ok(name)
    }
}

fn seed(template: &str) -> [u8; 32] {
    Sha256::digest(template.as_bytes()).into()
}

fn environment(seed: [u8; 32]) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);

    env.add_filter("trunc", filters::trunc);
    env.add_filter("trimprefix", filters::trimprefix);
    env.add_filter("trimPrefix", filters::trimprefix);
    env.add_filter("trimsuffix", filters::trimsuffix);
    env.add_filter("trimSuffix", filters::trimsuffix);
    env.add_filter("kebabcase", filters::kebabcase);

    register_random(&mut env, &SharedRng::from_seed(seed));
    env
}

/// Rewrite Go-template calls inside every `{{ }}` block
pub fn to_call_syntax(template: &str) -> String {
    let mut out = String::with_capacity(template.len() + 8);
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        let Some(len) = rest[start + 2..].find("}}") else {
            break;
        };
        let end = start + 2 + len;

        let inner = &rest[start + 2..end];
        let (open, inner) = match inner.strip_prefix('-') {
            Some(trimmed) => ("{{- ", trimmed),
            None => ("{{ ", inner),
        };
        let (inner, close) = match inner.strip_suffix('-') {
            Some(trimmed) => (trimmed, " -}}"),
            None => (inner, " }}"),
        };

        out.push_str(&rest[..start]);
        out.push_str(open);
        out.push_str(&rewrite_expression(inner));
        out.push_str(close);
        rest = &rest[end + 2..];
    }

    out.push_str(rest);
    out
}

/// Rewrite each pipeline segment of one expression
fn rewrite_expression(expr: &str) -> String {
    split_outside_quotes(expr, '|')
        .iter()
        .map(|segment| rewrite_call(segment.trim()))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// `ident arg1 arg2` becomes `ident(arg1, arg2)`
fn rewrite_call(segment: &str) -> String {
    let tokens = split_outside_quotes(segment, ' ');
    let tokens: Vec<&str> = tokens.iter().map(|t| t.trim()).filter(|t| !t.is_empty()).collect();

    match tokens.split_first() {
        Some((ident, args))
            if !args.is_empty() && is_identifier(ident) && !segment.contains('(') =>
        {
            format!("{}({})", ident, args.join(", "))
        }
        _ => segment.to_string(),
    }
}

fn is_identifier(token: &str) -> bool {
    let mut chars = token.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Split on `sep` outside of single- or double-quoted strings
fn split_outside_quotes(input: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in input.chars() {
        match quote {
            Some(q) if c == q => {
                quote = None;
                current.push(c);
            }
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                current.push(c);
            }
            None if c == sep => parts.push(std::mem::take(&mut current)),
            None => current.push(c),
        }
    }

    parts.push(current);
    parts
}
