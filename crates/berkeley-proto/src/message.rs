//! Protocol messages and their line representation.

use std::fmt;
use std::str::FromStr;

use crate::error::{ProtocolError, Result};

/// Leading keyword of a protocol line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    /// `HELLO`
    Hello,
    /// `TIME_REQUEST`
    TimeRequest,
    /// `OFFSET`
    Offset,
    /// `ADJUST`
    Adjust,
    /// `BYE`
    Bye,
}

impl Keyword {
    /// The keyword exactly as it appears on the wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            Keyword::Hello => "HELLO",
            Keyword::TimeRequest => "TIME_REQUEST",
            Keyword::Offset => "OFFSET",
            Keyword::Adjust => "ADJUST",
            Keyword::Bye => "BYE",
        }
    }

    fn lookup(word: &str) -> Option<Self> {
        match word {
            "HELLO" => Some(Keyword::Hello),
            "TIME_REQUEST" => Some(Keyword::TimeRequest),
            "OFFSET" => Some(Keyword::Offset),
            "ADJUST" => Some(Keyword::Adjust),
            "BYE" => Some(Keyword::Bye),
            _ => None,
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single protocol message.
///
/// Keywords are case-sensitive. Arguments are trimmed of surrounding
/// whitespace before they are interpreted, so `OFFSET   -5 ` is `Offset(-5)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Identification sent by a peer as the first line of a session.
    Hello(String),
    /// Poll carrying the coordinator's logical time in milliseconds.
    TimeRequest(i64),
    /// Reply to a poll: peer logical time minus the polled server time.
    Offset(i64),
    /// Signed correction the peer must add to its clock offset.
    Adjust(i64),
    /// Coordinator is going away; the peer should close its session.
    Bye,
}

impl Message {
    /// Keyword this message is introduced by.
    pub fn keyword(&self) -> Keyword {
        match self {
            Message::Hello(_) => Keyword::Hello,
            Message::TimeRequest(_) => Keyword::TimeRequest,
            Message::Offset(_) => Keyword::Offset,
            Message::Adjust(_) => Keyword::Adjust,
            Message::Bye => Keyword::Bye,
        }
    }
}

fn parse_millis(keyword: Keyword, arg: Option<&str>) -> Result<i64> {
    let value = arg.ok_or(ProtocolError::MissingArgument(keyword.as_str()))?;
    value
        .parse::<i64>()
        .map_err(|_| ProtocolError::InvalidNumber {
            command: keyword.as_str(),
            value: value.to_string(),
        })
}

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Err(ProtocolError::EmptyLine);
        }

        let (word, rest) = match line.split_once(' ') {
            Some((word, rest)) => (word, Some(rest)),
            None => (line, None),
        };
        let keyword =
            Keyword::lookup(word).ok_or_else(|| ProtocolError::UnknownCommand(word.to_string()))?;
        let arg = rest.map(str::trim).filter(|s| !s.is_empty());

        match keyword {
            Keyword::Hello => {
                // "HELLO" alone lacks the separator; "HELLO   " has one but nothing after it.
                if rest.is_none() {
                    return Err(ProtocolError::MissingArgument(keyword.as_str()));
                }
                arg.map(|id| Message::Hello(id.to_string()))
                    .ok_or(ProtocolError::EmptyIdentity)
            }
            Keyword::TimeRequest => parse_millis(keyword, arg).map(Message::TimeRequest),
            Keyword::Offset => parse_millis(keyword, arg).map(Message::Offset),
            Keyword::Adjust => parse_millis(keyword, arg).map(Message::Adjust),
            Keyword::Bye => Ok(Message::Bye),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Hello(id) => write!(f, "{} {}", Keyword::Hello, id),
            Message::TimeRequest(t) => write!(f, "{} {}", Keyword::TimeRequest, t),
            Message::Offset(d) => write!(f, "{} {}", Keyword::Offset, d),
            Message::Adjust(d) => write!(f, "{} {}", Keyword::Adjust, d),
            Message::Bye => f.write_str(Keyword::Bye.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hello_trims_identity() {
        let msg: Message = "HELLO   node-7  \r\n".parse().unwrap();
        assert_eq!(msg, Message::Hello("node-7".to_string()));
    }

    #[test]
    fn test_parse_hello_without_identity() {
        assert!(matches!(
            "HELLO".parse::<Message>(),
            Err(ProtocolError::MissingArgument("HELLO"))
        ));
        assert!(matches!(
            "HELLO    ".parse::<Message>(),
            Err(ProtocolError::EmptyIdentity)
        ));
    }

    #[test]
    fn test_parse_numeric_arguments() {
        assert_eq!(
            "TIME_REQUEST 1700000000000".parse::<Message>().unwrap(),
            Message::TimeRequest(1_700_000_000_000)
        );
        assert_eq!(
            "OFFSET  -500 ".parse::<Message>().unwrap(),
            Message::Offset(-500)
        );
        assert_eq!("ADJUST +33".parse::<Message>().unwrap(), Message::Adjust(33));
    }

    #[test]
    fn test_parse_rejects_garbage_numbers() {
        let err = "OFFSET twelve".parse::<Message>().unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::InvalidNumber { command: "OFFSET", ref value } if value == "twelve"
        ));
        assert!(matches!(
            "ADJUST".parse::<Message>(),
            Err(ProtocolError::MissingArgument("ADJUST"))
        ));
    }

    #[test]
    fn test_parse_keywords_are_case_sensitive() {
        assert!(matches!(
            "hello bob".parse::<Message>(),
            Err(ProtocolError::UnknownCommand(ref w)) if w == "hello"
        ));
        assert!(matches!(
            "HELLOX bob".parse::<Message>(),
            Err(ProtocolError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_parse_empty_line() {
        assert!(matches!("\r\n".parse::<Message>(), Err(ProtocolError::EmptyLine)));
        assert!(matches!("   ".parse::<Message>(), Err(ProtocolError::EmptyLine)));
    }

    #[test]
    fn test_display_matches_wire_format() {
        assert_eq!(Message::Hello("a".into()).to_string(), "HELLO a");
        assert_eq!(Message::Adjust(-167).to_string(), "ADJUST -167");
        assert_eq!(Message::Bye.to_string(), "BYE");
    }

    #[test]
    fn test_keyword_of_message() {
        assert_eq!(Message::Offset(1).keyword(), Keyword::Offset);
        assert_eq!(Keyword::TimeRequest.to_string(), "TIME_REQUEST");
    }
}
