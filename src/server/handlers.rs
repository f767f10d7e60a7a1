//! Per-command request handlers.
//!
//! Handlers never fail: every error is rendered as the text response the
//! client receives.

use crate::document::DocId;
use crate::error::DocIndexError;
use crate::index::NewDocument;
use crate::protocol::{
    ArgumentError, EMPTY_ID_LIST, Frame, Request, bound_response, format_id_list,
};
use crate::server::Server;

const SHUTDOWN_RESPONSE: &str = "Server is shutting down";

/// Whether the serve loop keeps going after a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Shutdown,
}

/// Result of handling one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub response: String,
    pub flow: Flow,
}

impl Outcome {
    fn reply(response: String) -> Self {
        Self {
            response: bound_response(response),
            flow: Flow::Continue,
        }
    }
}

impl Server {
    /// Handle one decoded frame.
    pub fn dispatch(&mut self, frame: &Frame) -> Outcome {
        match Request::from_frame(frame) {
            Ok(request) => {
                log::debug!("{} from {}", request.command(), frame.reply_channel);
                self.handle(request)
            }
            Err(ArgumentError::EmptyKeyword) => Outcome::reply(EMPTY_ID_LIST.to_string()),
            Err(e) => {
                log::warn!("Rejected request with code {}: {e}", frame.code);
                Outcome::reply(e.to_string())
            }
        }
    }

    /// Handle one parsed request.
    pub fn handle(&mut self, request: Request) -> Outcome {
        match request {
            Request::Add(document) => Outcome::reply(self.add(document)),
            Request::Query(id) => Outcome::reply(self.query(id)),
            Request::Remove(id) => Outcome::reply(self.remove(id)),
            Request::LineCount { id, keyword } => Outcome::reply(self.line_count(id, &keyword)),
            Request::Search { keyword, workers } => Outcome::reply(self.search(&keyword, workers)),
            Request::Shutdown => Outcome {
                response: SHUTDOWN_RESPONSE.to_string(),
                flow: Flow::Shutdown,
            },
        }
    }

    fn add(&mut self, document: NewDocument) -> String {
        let full_path = match self.index.resolve_path(&document.path) {
            Ok(path) => path,
            Err(e) => return path_error(&document.path, e),
        };
        if !full_path.exists() {
            return format!("Error: File {} not found", document.path);
        }

        match self.index.add(document) {
            Ok(id) => {
                self.persist();
                format!("Document {id} indexed")
            }
            Err(e) => {
                log::warn!("Failed to add document: {e}");
                "Error adding document".to_string()
            }
        }
    }

    fn query(&mut self, id: DocId) -> String {
        match self.cache.get(id, &self.index) {
            Some(record) => record.describe(),
            None => not_found(id),
        }
    }

    fn remove(&mut self, id: DocId) -> String {
        match self.index.remove(id) {
            Ok(_) => {
                self.cache.invalidate(id);
                self.persist();
                format!("Index entry {id} deleted")
            }
            Err(_) => not_found(id),
        }
    }

    fn line_count(&mut self, id: DocId, keyword: &str) -> String {
        let Some(record) = self.cache.get(id, &self.index) else {
            return not_found(id);
        };
        let full_path = match self.index.resolve_path(&record.path) {
            Ok(path) => path,
            Err(e) => return path_error(&record.path, e),
        };

        match self.engine.matcher().count_lines(keyword, &full_path) {
            Ok(count) => count.to_string(),
            Err(DocIndexError::Spawn(msg)) => {
                log::error!("Line counter could not start: {msg}");
                "Error: Failed to run line counter".to_string()
            }
            Err(e) => {
                log::warn!("Line count for document {id} failed: {e}");
                "0".to_string()
            }
        }
    }

    fn search(&self, keyword: &str, workers: usize) -> String {
        match self.engine.search(
            keyword,
            workers,
            self.index.records(),
            self.index.document_root(),
        ) {
            Ok(ids) => format_id_list(&ids),
            Err(e) => {
                log::error!("Search for '{keyword}' failed: {e}");
                EMPTY_ID_LIST.to_string()
            }
        }
    }
}

fn not_found(id: DocId) -> String {
    format!("Document {id} not found")
}

fn path_error(path: &str, error: DocIndexError) -> String {
    match error {
        DocIndexError::OutsideRoot(_) => {
            log::warn!("Refusing path outside the document root: {path}");
            format!("Error: File {path} not found")
        }
        _ => "Error: Path too long".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::index::MemoryStore;
    use crate::matcher::SubstringMatcher;
    use crate::protocol::Command;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn setup(cache_size: usize) -> (TempDir, Server) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("docs");
        fs::create_dir_all(&root).unwrap();
        fs::write(
            root.join("moby.txt"),
            "Title: Moby Dick\nAuthor: Herman Melville\nCall me Ishmael.\nThe whale.\nwhale again\n",
        )
        .unwrap();
        fs::write(root.join("plain.txt"), "nothing to see\n").unwrap();

        let config = ServerConfig::new(&root).with_cache_size(cache_size);
        let server =
            Server::with_store(config, Box::new(MemoryStore::new()), Arc::new(SubstringMatcher));
        (dir, server)
    }

    fn send(server: &mut Server, command: Command, args: &str) -> String {
        let frame = Frame::new(command, "/tmp/test_reply", args).unwrap();
        server.dispatch(&frame).response
    }

    #[test]
    fn test_add_and_query() {
        let (_dir, mut server) = setup(10);

        assert_eq!(
            send(&mut server, Command::Add, "x|y|1851|moby.txt"),
            "Document 1 indexed"
        );
        assert_eq!(
            send(&mut server, Command::Query, "1"),
            "Title: Moby Dick\nAuthors: Herman Melville\nYear: 1851\nPath: moby.txt"
        );
        assert_eq!(send(&mut server, Command::Query, "9"), "Document 9 not found");
    }

    #[test]
    fn test_add_errors() {
        let (_dir, mut server) = setup(10);

        assert_eq!(
            send(&mut server, Command::Add, "x|y|1851|missing.txt"),
            "Error: File missing.txt not found"
        );
        assert_eq!(
            send(&mut server, Command::Add, "x|y|1851"),
            "Error: Invalid format for add command"
        );
        assert!(server.index().is_empty());
    }

    #[test]
    fn test_add_refuses_files_outside_document_root() {
        let (dir, mut server) = setup(10);
        let outside = dir.path().join("outside.txt");
        fs::write(&outside, "Title: Secret\nAuthor: Nobody\n").unwrap();
        let absolute = outside.to_str().unwrap().to_string();

        assert_eq!(
            send(&mut server, Command::Add, &format!("t|a|2000|{absolute}")),
            format!("Error: File {absolute} not found")
        );
        assert_eq!(
            send(&mut server, Command::Add, "t|a|2000|../outside.txt"),
            "Error: File ../outside.txt not found"
        );
        assert!(server.index().is_empty());
        assert_eq!(send(&mut server, Command::Query, "1"), "Document 1 not found");
    }

    #[test]
    fn test_add_beyond_capacity() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        let config = ServerConfig::new(dir.path()).with_max_documents(1);
        let mut server =
            Server::with_store(config, Box::new(MemoryStore::new()), Arc::new(SubstringMatcher));

        assert_eq!(send(&mut server, Command::Add, "a|b|2000|a.txt"), "Document 1 indexed");
        assert_eq!(send(&mut server, Command::Add, "a|b|2000|a.txt"), "Error adding document");
    }

    #[test]
    fn test_remove_invalidates_cache() {
        let (_dir, mut server) = setup(10);
        send(&mut server, Command::Add, "x|y|1851|moby.txt");
        send(&mut server, Command::Query, "1");
        assert!(server.cache().contains(1));

        assert_eq!(send(&mut server, Command::Remove, "1"), "Index entry 1 deleted");
        assert!(!server.cache().contains(1));
        assert_eq!(send(&mut server, Command::Query, "1"), "Document 1 not found");
        assert_eq!(send(&mut server, Command::Remove, "1"), "Document 1 not found");
    }

    #[test]
    fn test_invalid_ids() {
        let (_dir, mut server) = setup(10);
        assert_eq!(
            send(&mut server, Command::Query, "abc"),
            "Error: Invalid document id 'abc'"
        );
        assert_eq!(
            send(&mut server, Command::LineCount, "x|whale"),
            "Error: Invalid document id 'x'"
        );
    }

    #[test]
    fn test_line_count() {
        let (_dir, mut server) = setup(10);
        send(&mut server, Command::Add, "x|y|1851|moby.txt");

        assert_eq!(send(&mut server, Command::LineCount, "1|whale"), "2");
        assert_eq!(send(&mut server, Command::LineCount, "1|squid"), "0");
        assert_eq!(send(&mut server, Command::LineCount, "1"), "5");
        assert_eq!(send(&mut server, Command::LineCount, "2|whale"), "Document 2 not found");
    }

    #[test]
    fn test_search() {
        let (_dir, mut server) = setup(10);
        send(&mut server, Command::Add, "x|y|1851|moby.txt");
        send(&mut server, Command::Add, "x|y|2000|plain.txt");
        send(&mut server, Command::Add, "x|y|1851|moby.txt");

        assert_eq!(send(&mut server, Command::Search, "whale"), "[1, 3]");
        assert_eq!(send(&mut server, Command::Search, "whale|3"), "[1, 3]");
        assert_eq!(send(&mut server, Command::Search, "kraken|2"), "[]");
        assert_eq!(send(&mut server, Command::Search, ""), "[]");
    }

    #[test]
    fn test_unknown_command_and_shutdown() {
        let (_dir, mut server) = setup(10);

        let mut frame = Frame::new(Command::Query, "/tmp/r", "1").unwrap();
        frame.code = 17;
        let outcome = server.dispatch(&frame);
        assert_eq!(outcome.response, "Error: Unknown command");
        assert_eq!(outcome.flow, Flow::Continue);

        let outcome = server.dispatch(&Frame::new(Command::Shutdown, "/tmp/r", "").unwrap());
        assert_eq!(outcome.response, "Server is shutting down");
        assert_eq!(outcome.flow, Flow::Shutdown);
    }
}
