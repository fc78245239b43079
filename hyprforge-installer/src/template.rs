//! Placeholder substitution for generated configuration files.
//!
//! A [`Template`] declares the `{{name}}` placeholders it may contain. Rendering
//! walks the body once: each placeholder is replaced by its escaped value and
//! the output is never scanned again, so a value containing `{{...}}` stays
//! literal text.

use thiserror::Error;

/// How a substituted value is encoded for its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escape {
    /// Inserted verbatim.
    Raw,
    /// Verbatim, but must not contain a line break (line-oriented config files).
    Line,
    /// Single-quoted POSIX shell word.
    Shell,
    /// Contents of a JSON string literal, without the surrounding quotes.
    Json,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template {template}: placeholder {{{{{name}}}}} is not declared")]
    Undeclared { template: String, name: String },

    #[error("template {template}: no value for {{{{{name}}}}}")]
    MissingValue { template: String, name: String },

    #[error("template {template}: value for {name} is not declared")]
    UnknownValue { template: String, name: String },

    #[error("template {template}: unterminated placeholder at byte {offset}")]
    Unterminated { template: String, offset: usize },

    #[error("template {template}: value for {name} contains a line break")]
    MultiLine { template: String, name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub name: &'static str,
    pub body: &'static str,
    pub vars: &'static [&'static str],
}

impl Template {
    pub const fn new(name: &'static str, body: &'static str, vars: &'static [&'static str]) -> Self {
        Self { name, body, vars }
    }

    pub fn render(&self, values: &[(&str, &str)], escape: Escape) -> Result<String, TemplateError> {
        for (name, _) in values {
            if !self.vars.contains(name) {
                return Err(TemplateError::UnknownValue {
                    template: self.name.to_string(),
                    name: name.to_string(),
                });
            }
        }

        let mut out = String::with_capacity(self.body.len());
        let mut rest = self.body;
        let mut consumed = 0;

        while let Some(open) = rest.find("{{") {
            out.push_str(&rest[..open]);
            let after = &rest[open + 2..];
            let close = after.find("}}").ok_or_else(|| TemplateError::Unterminated {
                template: self.name.to_string(),
                offset: consumed + open,
            })?;

            let name = after[..close].trim();
            if !self.vars.contains(&name) {
                return Err(TemplateError::Undeclared {
                    template: self.name.to_string(),
                    name: name.to_string(),
                });
            }
            let value = values
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, v)| *v)
                .ok_or_else(|| TemplateError::MissingValue {
                    template: self.name.to_string(),
                    name: name.to_string(),
                })?;

            out.push_str(&self.escape(name, value, escape)?);

            let advance = open + 2 + close + 2;
            consumed += advance;
            rest = &rest[advance..];
        }
        out.push_str(rest);

        Ok(out)
    }

    fn escape(&self, name: &str, value: &str, escape: Escape) -> Result<String, TemplateError> {
        match escape {
            Escape::Raw => Ok(value.to_string()),
            Escape::Line => {
                if value.contains(['\n', '\r']) {
                    return Err(TemplateError::MultiLine {
                        template: self.name.to_string(),
                        name: name.to_string(),
                    });
                }
                Ok(value.to_string())
            }
            Escape::Shell => Ok(shell_quote(value)),
            Escape::Json => Ok(json_string_contents(value)),
        }
    }
}

pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

fn json_string_contents(value: &str) -> String {
    let quoted = serde_json::Value::String(value.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}
