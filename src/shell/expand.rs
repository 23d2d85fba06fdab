//! Parameter expansion and field splitting.

use super::ast::{Param, Word, WordPart};
use super::interp::{Exit, Runner};
use super::status::ExitStatus;

fn is_ifs(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n')
}

/// Accumulates fields while a word list is expanded.
#[derive(Default)]
struct Fields {
    done: Vec<String>,
    current: Option<String>,
}

impl Fields {
    fn push_str(&mut self, text: &str) {
        self.current.get_or_insert_with(String::new).push_str(text);
    }

    fn mark(&mut self) {
        self.current.get_or_insert_with(String::new);
    }

    fn end(&mut self) {
        if let Some(field) = self.current.take() {
            self.done.push(field);
        }
    }

    /// Appends an unquoted expansion, splitting on whitespace.
    fn split(&mut self, value: &str) {
        if value.starts_with(is_ifs) {
            self.end();
        }
        for (index, piece) in value.split(is_ifs).filter(|p| !p.is_empty()).enumerate() {
            if index > 0 {
                self.end();
            }
            self.push_str(piece);
        }
        if value.ends_with(is_ifs) {
            self.end();
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.end();
        self.done
    }
}

impl Runner {
    /// Expands words into fields, as for command arguments.
    pub(super) fn expand_fields(&self, words: &[Word]) -> Result<Vec<String>, Exit> {
        let mut fields = Fields::default();
        for word in words {
            for part in &word.parts {
                self.expand_part(part, &mut fields)?;
            }
            fields.end();
        }
        Ok(fields.finish())
    }

    /// Expands a word into a single string without field splitting.
    pub(super) fn expand_string(&self, word: &Word) -> Result<String, Exit> {
        let mut out = String::new();
        for part in &word.parts {
            self.append_joined(part, &mut out)?;
        }
        Ok(out)
    }

    fn append_joined(&self, part: &WordPart, out: &mut String) -> Result<(), Exit> {
        match part {
            WordPart::Literal(text) | WordPart::SingleQuoted(text) => out.push_str(text),
            WordPart::DoubleQuoted(inner) => {
                for part in inner {
                    self.append_joined(part, out)?;
                }
            }
            WordPart::Param(param) => out.push_str(&self.param_value(param)?),
        }
        Ok(())
    }

    fn expand_part(&self, part: &WordPart, fields: &mut Fields) -> Result<(), Exit> {
        match part {
            WordPart::Literal(text) => fields.push_str(text),
            WordPart::SingleQuoted(text) => {
                fields.mark();
                fields.push_str(text);
            }
            WordPart::DoubleQuoted(inner) => {
                if !inner.contains(&WordPart::Param(Param::All)) {
                    fields.mark();
                }
                for part in inner {
                    match part {
                        WordPart::Param(Param::All) => {
                            for (index, param) in self.params.iter().enumerate() {
                                if index > 0 {
                                    fields.end();
                                }
                                fields.push_str(param);
                            }
                        }
                        WordPart::Param(param) => fields.push_str(&self.param_value(param)?),
                        WordPart::Literal(text) | WordPart::SingleQuoted(text) => fields.push_str(text),
                        WordPart::DoubleQuoted(_) => self.expand_part(part, fields)?,
                    }
                }
            }
            WordPart::Param(Param::All | Param::Joined) => {
                for (index, param) in self.params.iter().enumerate() {
                    if index > 0 {
                        fields.end();
                    }
                    fields.split(param);
                }
            }
            WordPart::Param(param) => fields.split(&self.param_value(param)?),
        }
        Ok(())
    }

    fn param_value(&self, param: &Param) -> Result<String, Exit> {
        let value = match param {
            Param::Named(name) => self.var(name).map(str::to_string),
            Param::Positional(0) => Some(self.name.clone()),
            Param::Positional(n) => self.params.get(n - 1).cloned(),
            Param::All | Param::Joined => Some(self.params.join(" ")),
            Param::Count => Some(self.params.len().to_string()),
            Param::Status => Some(self.status.to_string()),
            Param::ProcessId => Some(std::process::id().to_string()),
        };
        match value {
            Some(value) => Ok(value),
            None if self.options.nounset => {
                let label = match param {
                    Param::Named(name) => name.clone(),
                    Param::Positional(n) => n.to_string(),
                    _ => String::new(),
                };
                self.streams.stderr.diagnostic(&format!("{}: {label}: unbound variable", self.name));
                Err(Exit(ExitStatus::FAILURE))
            }
            None => Ok(String::new()),
        }
    }
}
