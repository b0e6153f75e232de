//! Script loader
//!
//! Reads a script, keeps the directive lines (`menu <verb> ...`), tokenizes
//! them and resolves verb aliases. Collection stops at `show`; lines after it
//! are still read and counted. A bad line is logged and skipped.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use super::registry::CommandRegistry;
use crate::error::{LoadError, ParseError};
use crate::parser::{has_directive_prefix, tokenize, COMMENT_MARKER};

/// Terminal verb that ends instruction collection
pub const SHOW_VERB: &str = "show";

/// One parsed directive line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// Canonical, lowercased verb
    pub verb: String,
    pub args: Vec<String>,
    /// 1-based source line, 0 when not loaded from a script
    pub line: usize,
}

impl Instruction {
    pub fn new<S: Into<String>>(verb: &str, args: impl IntoIterator<Item = S>) -> Self {
        Self {
            verb: verb.to_lowercase(),
            args: args.into_iter().map(Into::into).collect(),
            line: 0,
        }
    }

    /// Verb followed by the arguments
    pub fn tokens(&self) -> Vec<String> {
        std::iter::once(self.verb.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Script {
    pub instructions: Vec<Instruction>,
    /// The terminal `show` instruction, if the script has one
    pub show: Option<Instruction>,
    pub skipped: Vec<ParseError>,
    /// Directive lines read after `show`
    pub ignored_after_show: usize,
    /// SHA-256 of the script bytes, hex encoded
    pub digest: String,
}

pub struct ScriptLoader<'a> {
    registry: &'a CommandRegistry,
}

impl<'a> ScriptLoader<'a> {
    pub fn new(registry: &'a CommandRegistry) -> Self {
        Self { registry }
    }

    pub fn load_file(&self, path: &Path) -> Result<Script, LoadError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(LoadError::NotFound {
                    path: path.to_path_buf(),
                })
            }
            Err(source) => {
                return Err(LoadError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let script = self.load_bytes(&bytes);
        info!(
            path = %path.display(),
            instructions = script.instructions.len(),
            skipped = script.skipped.len(),
            "script loaded"
        );
        Ok(script)
    }

    pub fn load_str(&self, source: &str) -> Script {
        self.load_bytes(source.as_bytes())
    }

    fn load_bytes(&self, bytes: &[u8]) -> Script {
        let mut script = Script {
            digest: format!("{:x}", Sha256::digest(bytes)),
            ..Script::default()
        };

        for (index, raw) in bytes.split(|b| *b == b'\n').enumerate() {
            let line = index + 1;
            let text = match std::str::from_utf8(raw) {
                Ok(text) => text.trim(),
                Err(_) => {
                    let err = ParseError::InvalidEncoding { line };
                    warn!(error = %err, "skipping line");
                    script.skipped.push(err);
                    continue;
                }
            };

            if text.is_empty() || text.starts_with(COMMENT_MARKER) {
                continue;
            }
            if !has_directive_prefix(text) {
                debug!(line, "not a directive, ignored");
                continue;
            }
            if script.show.is_some() {
                script.ignored_after_show += 1;
                continue;
            }

            match self.parse_line(text, line) {
                Ok(Some(instruction)) if instruction.verb == SHOW_VERB => {
                    script.show = Some(instruction);
                }
                Ok(Some(instruction)) => script.instructions.push(instruction),
                Ok(None) => {}
                Err(err) => {
                    warn!(error = %err, "skipping line");
                    script.skipped.push(err);
                }
            }
        }

        script
    }

    /// Tokenize one line and resolve its verb; `None` for lines without tokens
    pub fn parse_line(&self, text: &str, line: usize) -> Result<Option<Instruction>, ParseError> {
        let mut tokens = tokenize(text).into_iter();
        let Some(verb) = tokens.next() else {
            return Ok(None);
        };
        if verb.trim().is_empty() {
            return Err(ParseError::EmptyVerb { line });
        }

        Ok(Some(Instruction {
            verb: self.registry.canonical_name(verb.trim()),
            args: tokens.collect(),
            line,
        }))
    }
}
