//! Typed requests and their `|`-delimited argument encoding.

use thiserror::Error;

use crate::document::{DocId, MAX_AUTHORS, MAX_PATH, MAX_TITLE, MAX_YEAR};
use crate::index::NewDocument;
use crate::protocol::frame::{Command, Frame};
use crate::util::truncate_str;

/// Longest keyword forwarded to the line counter, in bytes.
pub const MAX_KEYWORD: usize = 127;

/// Why a frame's arguments could not be turned into a [`Request`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("Error: Invalid format for add command")]
    InvalidAddFormat,

    #[error("Error: Invalid document id '{0}'")]
    InvalidId(String),

    #[error("Error: Invalid arguments format")]
    MissingArguments,

    #[error("Error: Empty search keyword")]
    EmptyKeyword,

    #[error("Error: Unknown command")]
    UnknownCommand(u32),
}

/// A decoded, validated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Add(NewDocument),
    Query(DocId),
    Remove(DocId),
    LineCount { id: DocId, keyword: String },
    /// `workers` of 0 or 1 means a sequential search.
    Search { keyword: String, workers: usize },
    Shutdown,
}

impl Request {
    /// Parse the arguments carried by `frame`.
    pub fn from_frame(frame: &Frame) -> Result<Self, ArgumentError> {
        let command = frame
            .command()
            .ok_or(ArgumentError::UnknownCommand(frame.code))?;
        Self::parse(command, &frame.args)
    }

    pub fn parse(command: Command, args: &str) -> Result<Self, ArgumentError> {
        match command {
            Command::Add => parse_add(args).map(Request::Add),
            Command::Query => parse_id(args).map(Request::Query),
            Command::Remove => parse_id(args).map(Request::Remove),
            Command::LineCount => {
                if args.is_empty() {
                    return Err(ArgumentError::MissingArguments);
                }
                let (id, keyword) = args.split_once('|').unwrap_or((args, ""));
                Ok(Request::LineCount {
                    id: parse_id(id)?,
                    keyword: truncate_str(keyword, MAX_KEYWORD).to_string(),
                })
            }
            Command::Search => {
                let mut fields = args.split('|');
                let keyword = fields.next().unwrap_or_default();
                if keyword.is_empty() {
                    return Err(ArgumentError::EmptyKeyword);
                }
                let workers = match fields.next().map(str::trim) {
                    None | Some("") => 0,
                    Some(raw) => raw.parse().unwrap_or_else(|_| {
                        log::warn!("Ignoring invalid worker count '{raw}'");
                        0
                    }),
                };
                Ok(Request::Search {
                    keyword: keyword.to_string(),
                    workers,
                })
            }
            Command::Shutdown => Ok(Request::Shutdown),
        }
    }

    pub fn command(&self) -> Command {
        match self {
            Request::Add(_) => Command::Add,
            Request::Query(_) => Command::Query,
            Request::Remove(_) => Command::Remove,
            Request::LineCount { .. } => Command::LineCount,
            Request::Search { .. } => Command::Search,
            Request::Shutdown => Command::Shutdown,
        }
    }

    /// Encode the arguments field for this request.
    pub fn to_args(&self) -> String {
        match self {
            Request::Add(doc) => {
                format!("{}|{}|{}|{}", doc.title, doc.authors, doc.year, doc.path)
            }
            Request::Query(id) | Request::Remove(id) => id.to_string(),
            Request::LineCount { id, keyword } => format!("{id}|{keyword}"),
            Request::Search { keyword, workers } if *workers > 0 => {
                format!("{keyword}|{workers}")
            }
            Request::Search { keyword, .. } => keyword.clone(),
            Request::Shutdown => String::new(),
        }
    }
}

fn parse_add(args: &str) -> Result<NewDocument, ArgumentError> {
    let fields: Vec<&str> = args.split('|').take(4).collect();
    let &[title, authors, year, path] = fields.as_slice() else {
        return Err(ArgumentError::InvalidAddFormat);
    };

    let bounded = [
        (title, MAX_TITLE),
        (authors, MAX_AUTHORS),
        (year, MAX_YEAR),
        (path, MAX_PATH),
    ];
    if bounded
        .iter()
        .any(|(value, max)| {
            value.is_empty() || value.len() > *max || value.contains(['\n', '\r'])
        })
    {
        return Err(ArgumentError::InvalidAddFormat);
    }

    Ok(NewDocument {
        title: title.to_string(),
        authors: authors.to_string(),
        year: year.to_string(),
        path: path.to_string(),
    })
}

fn parse_id(raw: &str) -> Result<DocId, ArgumentError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgumentError::InvalidId(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add() {
        let request = Request::parse(Command::Add, "Dune|Herbert|1965|dune.txt|extra").unwrap();
        let Request::Add(doc) = request else {
            panic!("Expected Add request");
        };
        assert_eq!(doc.title, "Dune");
        assert_eq!(doc.path, "dune.txt");
    }

    #[test]
    fn test_parse_add_rejects_bad_format() {
        let long_path = format!("Dune|Herbert|1965|{}", "p".repeat(65));
        for args in [
            "Dune|Herbert|1965",
            "Dune||1965|dune.txt",
            "Dune|Herbert|19655|dune.txt",
            "Dune|Herbert|1965|dune\n.txt",
            "Du\rne|Herbert|1965|dune.txt",
            long_path.as_str(),
        ] {
            assert_eq!(
                Request::parse(Command::Add, args),
                Err(ArgumentError::InvalidAddFormat),
                "args: {args}"
            );
        }
    }

    #[test]
    fn test_parse_ids() {
        assert_eq!(Request::parse(Command::Query, " 12 "), Ok(Request::Query(12)));
        assert_eq!(Request::parse(Command::Remove, "3"), Ok(Request::Remove(3)));
        assert_eq!(
            Request::parse(Command::Query, "abc"),
            Err(ArgumentError::InvalidId("abc".to_string()))
        );
    }

    #[test]
    fn test_parse_line_count() {
        assert_eq!(
            Request::parse(Command::LineCount, "4|whale"),
            Ok(Request::LineCount {
                id: 4,
                keyword: "whale".to_string()
            })
        );
        assert_eq!(
            Request::parse(Command::LineCount, "4"),
            Ok(Request::LineCount {
                id: 4,
                keyword: String::new()
            })
        );
        assert_eq!(
            Request::parse(Command::LineCount, ""),
            Err(ArgumentError::MissingArguments)
        );
    }

    #[test]
    fn test_parse_search() {
        assert_eq!(
            Request::parse(Command::Search, "whale|4"),
            Ok(Request::Search {
                keyword: "whale".to_string(),
                workers: 4
            })
        );
        assert_eq!(
            Request::parse(Command::Search, "whale|lots"),
            Ok(Request::Search {
                keyword: "whale".to_string(),
                workers: 0
            })
        );
        assert_eq!(
            Request::parse(Command::Search, ""),
            Err(ArgumentError::EmptyKeyword)
        );
    }

    #[test]
    fn test_args_round_trip() {
        let requests = [
            Request::Query(5),
            Request::LineCount {
                id: 2,
                keyword: "sea".to_string(),
            },
            Request::Search {
                keyword: "sea".to_string(),
                workers: 3,
            },
            Request::Search {
                keyword: "sea".to_string(),
                workers: 0,
            },
            Request::Shutdown,
        ];
        for request in requests {
            let parsed = Request::parse(request.command(), &request.to_args()).unwrap();
            assert_eq!(parsed, request);
        }
    }

    #[test]
    fn test_unknown_command() {
        let mut frame = Frame::new(Command::Query, "/tmp/r", "1").unwrap();
        frame.code = 42;
        assert_eq!(
            Request::from_frame(&frame),
            Err(ArgumentError::UnknownCommand(42))
        );
        assert_eq!(
            ArgumentError::UnknownCommand(42).to_string(),
            "Error: Unknown command"
        );
    }
}
