//! DMP message encoder.

use bytes::Bytes;

use crate::value::Value;
use crate::PROTOCOL_VERSION;

/// Builds one outgoing DMP message.
///
/// The container is stamped with [`PROTOCOL_VERSION`]; events are appended
/// in call order and arguments in the order given, so the peer parser
/// reproduces them exactly.
#[derive(Debug)]
pub struct MessageBuilder {
    buf: String,
}

impl MessageBuilder {
    /// Start a new message container.
    pub fn new() -> Self {
        let mut buf = String::with_capacity(128);
        buf.push_str("<message version=\"");
        buf.push_str(&PROTOCOL_VERSION.to_string());
        buf.push_str("\">");
        Self { buf }
    }

    /// Append an event block. Zero-argument events serialize self-closed.
    pub fn add_event<I>(&mut self, name: &str, args: I) -> &mut Self
    where
        I: IntoIterator<Item = Value>,
    {
        self.buf.push_str("<event name=\"");
        escape_into(name, &mut self.buf);
        let mut iter = args.into_iter().peekable();
        if iter.peek().is_none() {
            self.buf.push_str("\"/>");
            return self;
        }
        self.buf.push_str("\">");
        for arg in iter {
            self.buf.push_str("<argument type=\"");
            self.buf.push_str(arg.type_tag());
            self.buf.push_str("\">");
            escape_into(&arg.to_string(), &mut self.buf);
            self.buf.push_str("</argument>");
        }
        self.buf.push_str("</event>");
        self
    }

    /// Close the container and yield the wire bytes.
    pub fn finish(mut self) -> Bytes {
        self.buf.push_str("</message>");
        Bytes::from(self.buf)
    }
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::MessageParser;

    #[test]
    fn round_trips_through_a_fresh_parser() {
        let mut builder = MessageBuilder::new();
        builder.add_event(
            "e",
            [Value::Int(1), Value::Float(2.5), Value::Str("s".into())],
        );
        let wire = builder.finish();

        let mut parser = MessageParser::new();
        let mut events = Vec::new();
        parser.feed(&wire, &mut events).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "e");
        assert_eq!(
            events[0].args,
            vec![Value::Int(1), Value::Float(2.5), Value::Str("s".into())]
        );
        assert!(parser.is_finished());
    }

    #[test]
    fn zero_argument_event_is_self_closed() {
        let mut builder = MessageBuilder::new();
        builder.add_event("client.greeting", []);
        let wire = builder.finish();
        assert_eq!(
            wire,
            Bytes::from_static(
                b"<message version=\"0.1\"><event name=\"client.greeting\"/></message>"
            )
        );
    }

    #[test]
    fn escaped_text_round_trips() {
        let mut builder = MessageBuilder::new();
        builder.add_event("e", [Value::Str("a <b> & \"c\" 'd'".into())]);
        let wire = builder.finish();

        let mut parser = MessageParser::new();
        let mut events = Vec::new();
        parser.feed(&wire, &mut events).unwrap();
        assert_eq!(events[0].args, vec![Value::Str("a <b> & \"c\" 'd'".into())]);
    }

    #[test]
    fn multiple_events_keep_their_order() {
        let mut builder = MessageBuilder::new();
        builder.add_event("first", [Value::Int(1)]);
        builder.add_event("second", []);
        let wire = builder.finish();

        let mut parser = MessageParser::new();
        let mut events = Vec::new();
        parser.feed(&wire, &mut events).unwrap();
        let names: Vec<_> = events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["first", "second"]);
    }
}
