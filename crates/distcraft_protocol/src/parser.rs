//! Incremental DMP message decoder.
//!
//! A push-based parser: bytes arrive in arbitrary chunk sizes across
//! multiple [`MessageParser::feed`] calls, including splits inside tags,
//! attribute values and entities. Decoded events are pushed into the
//! caller's sink in the order their closing tags complete, so a caller
//! sees events as soon as they are whole without waiting for the end of
//! the message.
//!
//! The parser decodes exactly one message. Once it reaches
//! [`ParserState::Finished`] (or fails), it refuses further input until
//! [`MessageParser::reset`] is called.

use crate::error::ProtocolError;
use crate::value::Value;
use crate::MIN_PROTOCOL_VERSION;

/// Lifecycle of a single message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    Uninitialized,
    Transmitting,
    Finished,
}

/// A decoded event: a name plus its ordered, typed arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct WireEvent {
    pub name: String,
    pub args: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArgType {
    Int,
    Float,
    Str,
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Start {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    End {
        name: String,
    },
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum LexState {
    /// Character data between tags.
    #[default]
    Text,
    /// Just consumed `<`.
    TagOpen,
    /// Reading a start tag name.
    StartName,
    /// Inside a start tag, between attributes.
    BeforeAttr,
    /// Reading an attribute name.
    AttrName,
    /// Attribute name done, `=` not yet seen.
    AfterAttrName,
    /// `=` seen, opening quote not yet seen.
    BeforeAttrValue,
    /// Inside a quoted attribute value; the byte is the quote character.
    AttrValue(u8),
    /// Consumed `/` inside a start tag, expecting `>`.
    SelfClosing,
    /// Reading an end tag name.
    EndName,
    /// End tag name done, expecting `>`.
    AfterEndName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntityTarget {
    Text,
    AttrValue,
}

/// Byte-at-a-time tokenizer for the markup subset DMP uses. All of its
/// buffers survive chunk boundaries, so a tag or entity may be split at
/// any byte.
#[derive(Debug, Default)]
struct Lexer {
    state: LexState,
    text: Vec<u8>,
    name: Vec<u8>,
    attrs: Vec<(String, String)>,
    attr_name: Vec<u8>,
    attr_value: Vec<u8>,
    entity: Option<Vec<u8>>,
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-' | b':')
}

fn is_ws(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

impl Lexer {
    fn push(&mut self, b: u8, out: &mut Vec<Token>) -> Result<(), ProtocolError> {
        if self.entity.is_some() {
            let target = match self.state {
                LexState::Text => EntityTarget::Text,
                LexState::AttrValue(_) => EntityTarget::AttrValue,
                _ => unreachable!("entities only start inside text or attribute values"),
            };
            return self.entity_byte(b, target);
        }

        match self.state {
            LexState::Text => match b {
                b'<' => {
                    self.flush_text(out)?;
                    self.state = LexState::TagOpen;
                }
                b'&' => self.entity = Some(Vec::new()),
                b'>' => return Err(ProtocolError::Malformed("stray '>' in character data".into())),
                _ => self.text.push(b),
            },
            LexState::TagOpen => match b {
                b'/' => {
                    self.name.clear();
                    self.state = LexState::EndName;
                }
                _ if is_name_byte(b) => {
                    self.name.clear();
                    self.name.push(b);
                    self.state = LexState::StartName;
                }
                _ => return Err(ProtocolError::Malformed("invalid tag opening".into())),
            },
            LexState::StartName => match b {
                _ if is_name_byte(b) => self.name.push(b),
                b'>' => self.emit_start(false, out)?,
                b'/' => self.state = LexState::SelfClosing,
                _ if is_ws(b) => self.state = LexState::BeforeAttr,
                _ => return Err(ProtocolError::Malformed("invalid character in tag name".into())),
            },
            LexState::BeforeAttr => match b {
                _ if is_ws(b) => {}
                b'>' => self.emit_start(false, out)?,
                b'/' => self.state = LexState::SelfClosing,
                _ if is_name_byte(b) => {
                    self.attr_name.clear();
                    self.attr_name.push(b);
                    self.state = LexState::AttrName;
                }
                _ => return Err(ProtocolError::Malformed("invalid character in tag".into())),
            },
            LexState::AttrName => match b {
                _ if is_name_byte(b) => self.attr_name.push(b),
                b'=' => {
                    self.attr_value.clear();
                    self.state = LexState::BeforeAttrValue;
                }
                _ if is_ws(b) => self.state = LexState::AfterAttrName,
                _ => {
                    return Err(ProtocolError::Malformed(
                        "invalid character in attribute name".into(),
                    ))
                }
            },
            LexState::AfterAttrName => match b {
                _ if is_ws(b) => {}
                b'=' => {
                    self.attr_value.clear();
                    self.state = LexState::BeforeAttrValue;
                }
                _ => return Err(ProtocolError::Malformed("expected '=' after attribute".into())),
            },
            LexState::BeforeAttrValue => match b {
                _ if is_ws(b) => {}
                b'"' | b'\'' => self.state = LexState::AttrValue(b),
                _ => {
                    return Err(ProtocolError::Malformed(
                        "attribute values must be quoted".into(),
                    ))
                }
            },
            LexState::AttrValue(quote) => match b {
                _ if b == quote => {
                    let name = take_utf8(&mut self.attr_name)?;
                    let value = take_utf8(&mut self.attr_value)?;
                    self.attrs.push((name, value));
                    self.state = LexState::BeforeAttr;
                }
                b'&' => self.entity = Some(Vec::new()),
                b'<' => {
                    return Err(ProtocolError::Malformed(
                        "unescaped '<' in attribute value".into(),
                    ))
                }
                _ => self.attr_value.push(b),
            },
            LexState::SelfClosing => match b {
                b'>' => self.emit_start(true, out)?,
                _ => return Err(ProtocolError::Malformed("expected '>' after '/'".into())),
            },
            LexState::EndName => match b {
                _ if is_name_byte(b) => self.name.push(b),
                b'>' => self.emit_end(out)?,
                _ if is_ws(b) && !self.name.is_empty() => self.state = LexState::AfterEndName,
                _ => return Err(ProtocolError::Malformed("invalid end tag".into())),
            },
            LexState::AfterEndName => match b {
                _ if is_ws(b) => {}
                b'>' => self.emit_end(out)?,
                _ => return Err(ProtocolError::Malformed("invalid end tag".into())),
            },
        }
        Ok(())
    }

    fn entity_byte(&mut self, b: u8, target: EntityTarget) -> Result<(), ProtocolError> {
        let buf = self.entity.as_mut().unwrap();
        match b {
            b';' => {
                let decoded: u8 = match buf.as_slice() {
                    b"amp" => b'&',
                    b"lt" => b'<',
                    b"gt" => b'>',
                    b"quot" => b'"',
                    b"apos" => b'\'',
                    other => {
                        return Err(ProtocolError::Malformed(format!(
                            "unknown entity &{};",
                            String::from_utf8_lossy(other)
                        )))
                    }
                };
                self.entity = None;
                match target {
                    EntityTarget::Text => self.text.push(decoded),
                    EntityTarget::AttrValue => self.attr_value.push(decoded),
                }
                Ok(())
            }
            b'&' | b'<' | b'>' => Err(ProtocolError::Malformed("unterminated entity".into())),
            _ => {
                buf.push(b);
                if buf.len() > 8 {
                    return Err(ProtocolError::Malformed("entity too long".into()));
                }
                Ok(())
            }
        }
    }

    fn flush_text(&mut self, out: &mut Vec<Token>) -> Result<(), ProtocolError> {
        if !self.text.is_empty() {
            out.push(Token::Text(take_utf8(&mut self.text)?));
        }
        Ok(())
    }

    fn emit_start(&mut self, self_closing: bool, out: &mut Vec<Token>) -> Result<(), ProtocolError> {
        if self.name.is_empty() {
            return Err(ProtocolError::Malformed("empty tag name".into()));
        }
        out.push(Token::Start {
            name: take_utf8(&mut self.name)?,
            attrs: std::mem::take(&mut self.attrs),
            self_closing,
        });
        self.state = LexState::Text;
        Ok(())
    }

    fn emit_end(&mut self, out: &mut Vec<Token>) -> Result<(), ProtocolError> {
        if self.name.is_empty() {
            return Err(ProtocolError::Malformed("empty end tag".into()));
        }
        out.push(Token::End {
            name: take_utf8(&mut self.name)?,
        });
        self.state = LexState::Text;
        Ok(())
    }
}

fn take_utf8(buf: &mut Vec<u8>) -> Result<String, ProtocolError> {
    String::from_utf8(std::mem::take(buf))
        .map_err(|_| ProtocolError::Malformed("invalid utf-8 in message".into()))
}

fn attr<'a>(attrs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

// ---------------------------------------------------------------------------
// Message state machine
// ---------------------------------------------------------------------------

/// Stateful decoder for one DMP message.
#[derive(Debug)]
pub struct MessageParser {
    state: ParserState,
    lexer: Lexer,
    /// Names of the currently open elements, innermost last.
    element_stack: Vec<String>,
    parsing_event: bool,
    event_name: String,
    event_args: Vec<Value>,
    arg_type: ArgType,
    arg_text: String,
    min_version: f64,
    failed: bool,
}

impl MessageParser {
    pub fn new() -> Self {
        Self::with_minimum_version(MIN_PROTOCOL_VERSION)
    }

    /// A parser with a custom protocol version floor.
    pub fn with_minimum_version(min_version: f64) -> Self {
        Self {
            state: ParserState::Uninitialized,
            lexer: Lexer::default(),
            element_stack: Vec::new(),
            parsing_event: false,
            event_name: String::new(),
            event_args: Vec::new(),
            arg_type: ArgType::Str,
            arg_text: String::new(),
            min_version,
            failed: false,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == ParserState::Finished
    }

    /// True when the parser cannot accept more input for the current
    /// message: it either completed one or stopped on a decode error.
    pub fn needs_reset(&self) -> bool {
        self.failed || self.state == ParserState::Finished
    }

    /// Clear all state back to `Uninitialized`, ready for the next
    /// independent message.
    pub fn reset(&mut self) {
        let min_version = self.min_version;
        *self = Self::with_minimum_version(min_version);
    }

    /// Feed a chunk of bytes; events are pushed into `events` in the order
    /// their closing tags complete.
    ///
    /// A decode failure stops processing of the current message only; the
    /// parser stays unusable until [`reset`](Self::reset) but the error is
    /// not fatal to anything that owns it. Events completed before the
    /// failure are already in `events` and remain valid.
    pub fn feed(
        &mut self,
        chunk: &[u8],
        events: &mut Vec<WireEvent>,
    ) -> Result<(), ProtocolError> {
        self.feed_impl(chunk, false, events).map(|_| ())
    }

    /// Like [`feed`](Self::feed), but stops consuming once the message
    /// completes and reports how many bytes were used. A caller draining a
    /// socket resets and continues with the remainder when two messages
    /// arrive back to back in one read.
    pub fn feed_until_finished(
        &mut self,
        chunk: &[u8],
        events: &mut Vec<WireEvent>,
    ) -> Result<usize, ProtocolError> {
        self.feed_impl(chunk, true, events)
    }

    fn feed_impl(
        &mut self,
        chunk: &[u8],
        stop_at_finish: bool,
        events: &mut Vec<WireEvent>,
    ) -> Result<usize, ProtocolError> {
        if self.failed {
            return Err(ProtocolError::ResetRequired);
        }
        match self.feed_inner(chunk, stop_at_finish, events) {
            Ok(consumed) => Ok(consumed),
            Err(e) => {
                self.failed = true;
                Err(e)
            }
        }
    }

    fn feed_inner(
        &mut self,
        chunk: &[u8],
        stop_at_finish: bool,
        events: &mut Vec<WireEvent>,
    ) -> Result<usize, ProtocolError> {
        let mut tokens = Vec::new();
        for (i, &b) in chunk.iter().enumerate() {
            self.lexer.push(b, &mut tokens)?;
            for token in tokens.drain(..) {
                self.handle_token(token, events)?;
            }
            if stop_at_finish && self.state == ParserState::Finished {
                return Ok(i + 1);
            }
        }
        Ok(chunk.len())
    }

    fn handle_token(
        &mut self,
        token: Token,
        events: &mut Vec<WireEvent>,
    ) -> Result<(), ProtocolError> {
        match token {
            Token::Start {
                name,
                attrs,
                self_closing,
            } => {
                self.open_element(&name, &attrs)?;
                if self_closing {
                    self.close_element(&name, events)?;
                }
                Ok(())
            }
            Token::End { name } => self.close_element(&name, events),
            Token::Text(data) => self.character_data(&data),
        }
    }

    fn open_element(&mut self, name: &str, attrs: &[(String, String)]) -> Result<(), ProtocolError> {
        if self.state == ParserState::Finished {
            return Err(ProtocolError::Malformed("data after message end".into()));
        }
        if self.element_stack.last().map(String::as_str) == Some("argument") {
            return Err(ProtocolError::Malformed(
                "argument content must be text".into(),
            ));
        }
        match name {
            "message" => {
                if self.state != ParserState::Uninitialized {
                    return Err(ProtocolError::Malformed(
                        "message must be the root element".into(),
                    ));
                }
                let version = attr(attrs, "version")
                    .and_then(|v| v.trim().parse::<f64>().ok())
                    .ok_or(ProtocolError::InvalidVersion)?;
                if version < self.min_version {
                    return Err(ProtocolError::VersionTooOld {
                        version,
                        minimum: self.min_version,
                    });
                }
                self.state = ParserState::Transmitting;
            }
            "event" => {
                if self.state != ParserState::Transmitting {
                    return Err(ProtocolError::Malformed("event outside message".into()));
                }
                if self.parsing_event {
                    return Err(ProtocolError::NestedEvent);
                }
                let event_name = attr(attrs, "name").ok_or(ProtocolError::MissingEventName)?;
                self.parsing_event = true;
                self.event_name = event_name.to_string();
            }
            "argument" => {
                if !self.parsing_event {
                    return Err(ProtocolError::ArgumentOutsideEvent);
                }
                // Missing or unrecognized type tags decode as string.
                self.arg_type = match attr(attrs, "type") {
                    Some("int") => ArgType::Int,
                    Some("float") => ArgType::Float,
                    _ => ArgType::Str,
                };
                self.arg_text.clear();
            }
            other => return Err(ProtocolError::UnexpectedElement(other.to_string())),
        }
        self.element_stack.push(name.to_string());
        Ok(())
    }

    fn close_element(
        &mut self,
        name: &str,
        events: &mut Vec<WireEvent>,
    ) -> Result<(), ProtocolError> {
        match self.element_stack.pop() {
            Some(top) if top == name => {}
            _ => {
                return Err(ProtocolError::Malformed(format!(
                    "mismatched end tag </{}>",
                    name
                )))
            }
        }
        match name {
            "argument" => {
                let raw = std::mem::take(&mut self.arg_text);
                let value = match self.arg_type {
                    ArgType::Int => {
                        Value::Int(raw.trim().parse().map_err(|_| {
                            ProtocolError::InvalidArgument {
                                declared: "int",
                                text: raw.clone(),
                            }
                        })?)
                    }
                    ArgType::Float => {
                        Value::Float(raw.trim().parse().map_err(|_| {
                            ProtocolError::InvalidArgument {
                                declared: "float",
                                text: raw.clone(),
                            }
                        })?)
                    }
                    ArgType::Str => Value::Str(raw),
                };
                self.event_args.push(value);
            }
            "event" => {
                events.push(WireEvent {
                    name: std::mem::take(&mut self.event_name),
                    args: std::mem::take(&mut self.event_args),
                });
                self.parsing_event = false;
            }
            "message" => self.state = ParserState::Finished,
            _ => unreachable!("only known elements reach the stack"),
        }
        Ok(())
    }

    fn character_data(&mut self, data: &str) -> Result<(), ProtocolError> {
        if self.element_stack.last().map(String::as_str) == Some("argument") {
            self.arg_text.push_str(data);
            Ok(())
        } else if data.trim().is_empty() {
            // Indentation and newlines between elements are tolerated.
            Ok(())
        } else if self.state == ParserState::Finished {
            Err(ProtocolError::Malformed("data after message end".into()))
        } else {
            Err(ProtocolError::Malformed(
                "unexpected character data".into(),
            ))
        }
    }
}

impl Default for MessageParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PING: &str =
        r#"<message version="0.1"><event name="ping"><argument type="int">7</argument></event></message>"#;

    /// Feed everything in one chunk and collect the decoded events.
    fn feed_all(
        parser: &mut MessageParser,
        bytes: &[u8],
    ) -> Result<Vec<WireEvent>, ProtocolError> {
        let mut events = Vec::new();
        parser.feed(bytes, &mut events)?;
        Ok(events)
    }

    #[test]
    fn decodes_a_single_event() {
        let mut parser = MessageParser::new();
        let events = feed_all(&mut parser, PING.as_bytes()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "ping");
        assert_eq!(events[0].args, vec![Value::Int(7)]);
        assert!(parser.is_finished());
    }

    #[test]
    fn decodes_identically_when_fed_byte_by_byte() {
        let mut parser = MessageParser::new();
        let mut events = Vec::new();
        for b in PING.as_bytes() {
            parser.feed(std::slice::from_ref(b), &mut events).unwrap();
        }
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "ping");
        assert_eq!(events[0].args, vec![Value::Int(7)]);
        assert!(parser.is_finished());
    }

    #[test]
    fn mixed_argument_types_preserve_order() {
        let wire = concat!(
            r#"<message version="0.1"><event name="e">"#,
            r#"<argument type="int">1</argument>"#,
            r#"<argument type="float">2.5</argument>"#,
            r#"<argument type="string">s</argument>"#,
            r#"</event></message>"#
        );
        let mut parser = MessageParser::new();
        let events = feed_all(&mut parser, wire.as_bytes()).unwrap();
        assert_eq!(
            events[0].args,
            vec![Value::Int(1), Value::Float(2.5), Value::Str("s".into())]
        );
    }

    #[test]
    fn version_below_floor_is_rejected_before_any_event() {
        let wire = r#"<message version="0.05"><event name="ping"/></message>"#;
        let mut parser = MessageParser::new();
        let err = feed_all(&mut parser, wire.as_bytes()).unwrap_err();
        assert!(matches!(err, ProtocolError::VersionTooOld { .. }));
    }

    #[test]
    fn missing_version_is_rejected() {
        let mut parser = MessageParser::new();
        let err =
            feed_all(&mut parser, b"<message><event name=\"ping\"/></message>").unwrap_err();
        assert_eq!(err, ProtocolError::InvalidVersion);
    }

    #[test]
    fn nested_events_are_rejected_without_firing() {
        let wire = r#"<message version="0.1"><event name="outer"><event name="inner">"#;
        let mut parser = MessageParser::new();
        let mut events = Vec::new();
        let err = parser.feed(wire.as_bytes(), &mut events).unwrap_err();
        assert_eq!(err, ProtocolError::NestedEvent);
        assert!(events.is_empty());
    }

    #[test]
    fn events_completed_before_a_failure_are_still_delivered() {
        let wire = concat!(
            r#"<message version="0.1">"#,
            r#"<event name="good"/>"#,
            r#"<argument type="int">7</argument>"#
        );
        let mut parser = MessageParser::new();
        let mut events = Vec::new();
        let err = parser.feed(wire.as_bytes(), &mut events).unwrap_err();
        assert_eq!(err, ProtocolError::ArgumentOutsideEvent);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "good");
    }

    #[test]
    fn argument_outside_event_is_rejected() {
        let wire = r#"<message version="0.1"><argument type="int">7</argument>"#;
        let mut parser = MessageParser::new();
        let err = feed_all(&mut parser, wire.as_bytes()).unwrap_err();
        assert_eq!(err, ProtocolError::ArgumentOutsideEvent);
    }

    #[test]
    fn event_without_name_is_rejected() {
        let wire = r#"<message version="0.1"><event>"#;
        let mut parser = MessageParser::new();
        let err = feed_all(&mut parser, wire.as_bytes()).unwrap_err();
        assert_eq!(err, ProtocolError::MissingEventName);
    }

    #[test]
    fn unknown_argument_type_defaults_to_string() {
        let wire = concat!(
            r#"<message version="0.1"><event name="e">"#,
            r#"<argument type="blob">data</argument>"#,
            r#"<argument>more</argument>"#,
            r#"</event></message>"#
        );
        let mut parser = MessageParser::new();
        let events = feed_all(&mut parser, wire.as_bytes()).unwrap();
        assert_eq!(
            events[0].args,
            vec![Value::Str("data".into()), Value::Str("more".into())]
        );
    }

    #[test]
    fn non_numeric_int_argument_is_a_decode_error() {
        let wire = r#"<message version="0.1"><event name="e"><argument type="int">seven</argument>"#;
        let mut parser = MessageParser::new();
        let err = feed_all(&mut parser, wire.as_bytes()).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidArgument { declared: "int", .. }));
    }

    #[test]
    fn reset_allows_a_second_independent_message() {
        let mut parser = MessageParser::new();
        feed_all(&mut parser, PING.as_bytes()).unwrap();
        assert!(parser.needs_reset());
        parser.reset();

        let second = r#"<message version="0.1"><event name="pong"/></message>"#;
        let events = feed_all(&mut parser, second.as_bytes()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "pong");
        assert!(events[0].args.is_empty());
    }

    #[test]
    fn failed_parser_refuses_input_until_reset() {
        let mut parser = MessageParser::new();
        feed_all(&mut parser, b"<bogus>").unwrap_err();
        assert!(parser.needs_reset());
        assert_eq!(
            feed_all(&mut parser, PING.as_bytes()).unwrap_err(),
            ProtocolError::ResetRequired
        );
        parser.reset();
        assert_eq!(feed_all(&mut parser, PING.as_bytes()).unwrap().len(), 1);
    }

    #[test]
    fn whitespace_between_elements_is_tolerated() {
        let wire = "<message version=\"0.1\">\n  <event name=\"ping\">\n    <argument type=\"int\">7</argument>\n  </event>\n</message>\n";
        let mut parser = MessageParser::new();
        let events = feed_all(&mut parser, wire.as_bytes()).unwrap();
        assert_eq!(events[0].args, vec![Value::Int(7)]);
        assert!(parser.is_finished());
    }

    #[test]
    fn unknown_elements_are_rejected() {
        let mut parser = MessageParser::new();
        let err = feed_all(&mut parser, br#"<message version="0.1"><physics/>"#).unwrap_err();
        assert_eq!(err, ProtocolError::UnexpectedElement("physics".into()));
    }

    #[test]
    fn mismatched_end_tag_is_rejected() {
        let mut parser = MessageParser::new();
        let err = feed_all(&mut parser, br#"<message version="0.1"><event name="e"></message>"#)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed(_)));
    }

    #[test]
    fn entities_decode_in_argument_text() {
        let wire = concat!(
            r#"<message version="0.1"><event name="e">"#,
            r#"<argument type="string">a &lt;b&gt; &amp; &quot;c&quot;</argument>"#,
            r#"</event></message>"#
        );
        let mut parser = MessageParser::new();
        let events = feed_all(&mut parser, wire.as_bytes()).unwrap();
        assert_eq!(events[0].args, vec![Value::Str("a <b> & \"c\"".into())]);
    }

    #[test]
    fn events_fire_in_order_within_one_message() {
        let wire = concat!(
            r#"<message version="0.1">"#,
            r#"<event name="first"/>"#,
            r#"<event name="second"/>"#,
            r#"</message>"#
        );
        let mut parser = MessageParser::new();
        let events = feed_all(&mut parser, wire.as_bytes()).unwrap();
        let names: Vec<_> = events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["first", "second"]);
    }

    #[test]
    fn feed_until_finished_leaves_the_next_message_unconsumed() {
        let second = r#"<message version="0.1"><event name="pong"/></message>"#;
        let wire = format!("{}{}", PING, second);

        let mut parser = MessageParser::new();
        let mut events = Vec::new();
        let consumed = parser
            .feed_until_finished(wire.as_bytes(), &mut events)
            .unwrap();
        assert_eq!(events[0].name, "ping");
        assert_eq!(consumed, PING.len());
        assert!(parser.is_finished());

        parser.reset();
        events.clear();
        let consumed = parser
            .feed_until_finished(&wire.as_bytes()[consumed..], &mut events)
            .unwrap();
        assert_eq!(events[0].name, "pong");
        assert_eq!(consumed, second.len());
    }

    #[test]
    fn raised_version_floor_is_honored() {
        let mut parser = MessageParser::with_minimum_version(2.0);
        let err = feed_all(&mut parser, PING.as_bytes()).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::VersionTooOld {
                version: 0.1,
                minimum: 2.0
            }
        );
    }
}
