//! Streaming decoder for memcheck XML report files.
//!
//! Reports can be large, and a traced process that crashed or was killed
//! leaves a truncated, non-well-formed trailing fragment. The decoder pulls
//! events off the document without building a tree, collects every complete
//! `<error>` element, and stops silently at the first incomplete one.
//! Parsing never mutates the source file.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use crate::config::Configuration;
use crate::error::Result;
use crate::report::error::ValgrindError;
use crate::report::frame::Frame;
use crate::report::stack::Stack;
use crate::report::suppression::{PatternKind, Suppression, SuppressionPattern};

/// Parse one report file into its complete error records, in document
/// order.
pub fn parse_file(path: &Path, config: &Configuration) -> Result<Vec<ValgrindError>> {
    debug!(report = %path.display(), "parsing report file");
    let file = File::open(path)?;
    parse_reader(BufReader::new(file), config)
}

/// Parse a report document from any buffered reader.
pub fn parse_reader<R: BufRead>(reader: R, config: &Configuration) -> Result<Vec<ValgrindError>> {
    let mut xml = Reader::from_reader(reader);
    let mut buf = Vec::new();
    let mut errors = Vec::new();
    let mut builder: Option<ErrorBuilder> = None;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(start)) => {
                let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                match builder.as_mut() {
                    Some(b) => b.open(name),
                    None if name == "error" => builder = Some(ErrorBuilder::default()),
                    None => {}
                }
            }
            Ok(Event::Empty(start)) => {
                if let Some(b) = builder.as_mut() {
                    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                    b.open(name);
                    b.close();
                }
            }
            Ok(Event::End(end)) => {
                if end.local_name().as_ref() == b"error" && builder.as_ref().is_some_and(|b| b.at_root()) {
                    if let Some(b) = builder.take() {
                        if let Some(record) = b.finish(config)? {
                            errors.push(record);
                        }
                    }
                } else if let Some(b) = builder.as_mut() {
                    b.close();
                }
            }
            Ok(Event::Text(text)) => {
                if let Some(b) = builder.as_mut() {
                    if let Ok(text) = text.unescape() {
                        b.text(text.trim());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                // A crashed or killed process truncates its report; every
                // complete error element has already been collected.
                debug!(error = %err, "stopping at incomplete report fragment");
                break;
            }
        }
        buf.clear();
    }

    Ok(errors)
}

/// Accumulates the children of one `<error>` element. Only the first
/// `<stack>` belongs to the error's allocation path; later stacks describe
/// auxiliary addresses and are not part of the record.
#[derive(Default)]
struct ErrorBuilder {
    path: Vec<String>,
    kind: Option<String>,
    what: Option<String>,
    xwhat_text: Option<String>,
    stacks_seen: usize,
    frames: Vec<Frame>,
    suppression: Option<SuppressionBuilder>,
}

#[derive(Default)]
struct SuppressionBuilder {
    name: Option<String>,
    kind: Option<String>,
    aux: Option<String>,
    patterns: Vec<SuppressionPattern>,
}

impl ErrorBuilder {
    fn at_root(&self) -> bool {
        self.path.is_empty()
    }

    fn open(&mut self, name: String) {
        let at_error_root = self.path.is_empty();
        let in_stack = self.path.len() == 1 && self.path[0] == "stack";
        let in_sframe =
            self.path.len() == 2 && self.path[0] == "suppression" && self.path[1] == "sframe";
        match name.as_str() {
            "stack" if at_error_root => self.stacks_seen += 1,
            "suppression" if at_error_root => {
                self.suppression
                    .get_or_insert_with(SuppressionBuilder::default);
            }
            "frame" if in_stack && self.stacks_seen == 1 => {
                self.frames.push(Frame::default());
            }
            "fun" if in_sframe => self.push_pattern(PatternKind::Function),
            "obj" if in_sframe => self.push_pattern(PatternKind::Object),
            _ => {}
        }
        self.path.push(name);
    }

    fn close(&mut self) {
        self.path.pop();
    }

    fn push_pattern(&mut self, kind: PatternKind) {
        if let Some(suppression) = self.suppression.as_mut() {
            suppression.patterns.push(SuppressionPattern {
                kind,
                value: String::new(),
            });
        }
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let path: Vec<&str> = self.path.iter().map(String::as_str).collect();
        match path.as_slice() {
            ["kind"] => append(&mut self.kind, text),
            ["what"] => append(&mut self.what, text),
            ["xwhat", "text"] => append(&mut self.xwhat_text, text),
            ["stack", "frame", field] if self.stacks_seen == 1 => {
                if let Some(frame) = self.frames.last_mut() {
                    match *field {
                        "fn" => append(&mut frame.function, text),
                        "obj" => append(&mut frame.object, text),
                        "file" => append(&mut frame.file, text),
                        "line" => append(&mut frame.line, text),
                        _ => {}
                    }
                }
            }
            ["suppression", "sname"] => {
                if let Some(s) = self.suppression.as_mut() {
                    append(&mut s.name, text);
                }
            }
            ["suppression", "skind"] => {
                if let Some(s) = self.suppression.as_mut() {
                    append(&mut s.kind, text);
                }
            }
            ["suppression", "skaux"] => {
                if let Some(s) = self.suppression.as_mut() {
                    append(&mut s.aux, text);
                }
            }
            ["suppression", "sframe", "fun" | "obj"] => {
                if let Some(pattern) = self
                    .suppression
                    .as_mut()
                    .and_then(|s| s.patterns.last_mut())
                {
                    pattern.value.push_str(text);
                }
            }
            _ => {}
        }
    }

    fn finish(self, config: &Configuration) -> Result<Option<ValgrindError>> {
        let Some(kind) = self.kind else {
            return Ok(None);
        };
        // The two error families describe themselves in different
        // sub-elements: leak kinds in the structured xwhat description,
        // everything else in the flat what field.
        let message = if kind.starts_with("Leak_") {
            self.xwhat_text
        } else {
            self.what
        };
        let Some(message) = message else {
            return Ok(None);
        };
        let suppression = self.suppression.map(SuppressionBuilder::finish);
        ValgrindError::new(config, kind, message, Stack::new(self.frames), suppression).map(Some)
    }
}

impl SuppressionBuilder {
    fn finish(self) -> Suppression {
        Suppression {
            name: self.name.unwrap_or_default(),
            kind: self.kind.unwrap_or_default(),
            aux: self.aux,
            patterns: self.patterns,
        }
    }
}

fn append(slot: &mut Option<String>, text: &str) {
    match slot {
        Some(existing) => existing.push_str(text),
        None => *slot = Some(text.to_string()),
    }
}
