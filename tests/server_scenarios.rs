//! End-to-end request scenarios against a server backed by real files.

use std::fs;
use std::path::Path;

use docindex::config::ServerConfig;
use docindex::matcher::MatcherKind;
use docindex::protocol::{Command, Frame};
use docindex::server::{Flow, Server};
use docindex::transport::MemoryTransport;
use tempfile::TempDir;

const REPLY: &str = "/tmp/docindex_test_reply";

fn config(dir: &TempDir, cache_size: usize) -> ServerConfig {
    ServerConfig::new(dir.path().join("docs"))
        .with_data_dir(dir.path().join("data"))
        .with_cache_size(cache_size)
        .with_matcher(MatcherKind::Substring)
}

fn write_doc(dir: &TempDir, name: &str, body: &str) {
    let root = dir.path().join("docs");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join(name), body).unwrap();
}

fn send(server: &mut Server, command: Command, args: &str) -> String {
    let outcome = server.dispatch(&Frame::new(command, REPLY, args).unwrap());
    assert_eq!(outcome.flow, Flow::Continue);
    outcome.response
}

fn index_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_add_remove_and_reload() {
    let dir = TempDir::new().unwrap();
    for name in ["a.txt", "b.txt", "c.txt"] {
        write_doc(&dir, name, &format!("Title: Book {name}\nAuthor: Someone\nbody\n"));
    }

    let mut server = Server::open(config(&dir, 10)).unwrap();
    assert_eq!(send(&mut server, Command::Add, "t|a|2001|a.txt"), "Document 1 indexed");
    assert_eq!(send(&mut server, Command::Add, "t|a|2002|b.txt"), "Document 2 indexed");
    assert_eq!(send(&mut server, Command::Add, "t|a|2003|c.txt"), "Document 3 indexed");
    assert_eq!(send(&mut server, Command::Remove, "2"), "Index entry 2 deleted");

    let index_path = server.config().index_path();
    assert_eq!(
        index_lines(&index_path),
        vec![
            "1|Book a.txt|Someone|2001|a.txt",
            "3|Book c.txt|Someone|2003|c.txt",
        ]
    );
    drop(server);

    let mut reloaded = Server::open(config(&dir, 10)).unwrap();
    assert_eq!(reloaded.index().total(), 2);
    assert_eq!(send(&mut reloaded, Command::Query, "2"), "Document 2 not found");
    assert_eq!(
        send(&mut reloaded, Command::Query, "3"),
        "Title: Book c.txt\nAuthors: Someone\nYear: 2003\nPath: c.txt"
    );
}

#[test]
fn test_ids_keep_increasing_across_restarts() {
    let dir = TempDir::new().unwrap();
    write_doc(&dir, "a.txt", "body\n");

    let mut server = Server::open(config(&dir, 10)).unwrap();
    for _ in 0..3 {
        send(&mut server, Command::Add, "t|a|2001|a.txt");
    }
    send(&mut server, Command::Remove, "2");
    drop(server);

    let mut server = Server::open(config(&dir, 10)).unwrap();
    assert_eq!(server.index().next_id(), 4);
    assert_eq!(send(&mut server, Command::Add, "t|a|2001|a.txt"), "Document 4 indexed");
}

#[test]
fn test_malformed_index_lines_are_skipped() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("data")).unwrap();
    fs::write(
        dir.path().join("data/index.txt"),
        "1|Dune|Herbert|1965|dune.txt\ngarbage\n7|Emma|Austen|1815|emma.txt\n",
    )
    .unwrap();

    let server = Server::open(config(&dir, 10)).unwrap();
    assert_eq!(server.index().total(), 2);
    assert_eq!(server.index().next_id(), 8);
}

#[test]
fn test_cache_recency_and_statistics() {
    let dir = TempDir::new().unwrap();
    write_doc(&dir, "a.txt", "Title: Alpha\n");
    write_doc(&dir, "b.txt", "Title: Beta\n");
    write_doc(&dir, "c.txt", "Title: Gamma\n");

    let mut server = Server::open(config(&dir, 2)).unwrap();
    send(&mut server, Command::Add, "t|a|2001|a.txt");
    send(&mut server, Command::Add, "t|a|2002|b.txt");
    send(&mut server, Command::Add, "t|a|2003|c.txt");

    send(&mut server, Command::Query, "1");
    send(&mut server, Command::Query, "2");
    send(&mut server, Command::Query, "1");
    send(&mut server, Command::Query, "3");

    assert_eq!(server.cache().ids(), vec![3, 1]);
    let stats = server.cache().stats();
    assert_eq!((stats.hits, stats.misses), (1, 3));

    send(&mut server, Command::LineCount, "1|Alpha");
    assert_eq!(server.cache().ids(), vec![1, 3]);
    assert_eq!(server.cache().stats().hits, 2);
}

#[test]
fn test_partitioned_search_keeps_index_order() {
    let dir = TempDir::new().unwrap();
    let mut server = Server::open(config(&dir, 10)).unwrap();

    for i in 1..=10 {
        let body = if [2, 5, 9].contains(&i) {
            "there be a leviathan here\n"
        } else {
            "quiet waters\n"
        };
        write_doc(&dir, &format!("doc{i}.txt"), body);
        send(&mut server, Command::Add, &format!("t|a|2000|doc{i}.txt"));
    }

    assert_eq!(send(&mut server, Command::Search, "leviathan|4"), "[2, 5, 9]");
    assert_eq!(send(&mut server, Command::Search, "leviathan"), "[2, 5, 9]");
    assert_eq!(send(&mut server, Command::Search, "leviathan|64"), "[2, 5, 9]");
    assert_eq!(send(&mut server, Command::Search, "kraken|4"), "[]");
}

#[test]
fn test_shutdown_persists_index_and_snapshot() {
    let dir = TempDir::new().unwrap();
    write_doc(&dir, "a.txt", "Title: Alpha\nAuthor: Ann\n");

    let mut server = Server::open(config(&dir, 10)).unwrap();
    let mut transport = MemoryTransport::new();
    for (command, args) in [
        (Command::Add, "t|a|2001|a.txt"),
        (Command::Query, "1"),
        (Command::Shutdown, ""),
    ] {
        transport
            .push_frame(&Frame::new(command, REPLY, args).unwrap())
            .unwrap();
    }

    server.run(&mut transport).unwrap();

    assert_eq!(
        transport.replies_to(REPLY),
        vec![
            "Document 1 indexed",
            "Title: Alpha\nAuthors: Ann\nYear: 2001\nPath: a.txt",
            "Server is shutting down",
        ]
    );
    assert!(transport.is_closed());
    assert_eq!(
        index_lines(&server.config().index_path()),
        vec!["1|Alpha|Ann|2001|a.txt"]
    );
    assert_eq!(
        fs::read_to_string(server.config().snapshot_path()).unwrap(),
        "Cache Snapshot - 1 entries\nID 1: Alpha\n"
    );
}

#[test]
fn test_separator_in_extracted_title_survives_restart() {
    let dir = TempDir::new().unwrap();
    write_doc(&dir, "b.txt", "Title: Plain\nAuthor: Tester\n");
    write_doc(&dir, "a.txt", "Title: A|B\nAuthor: Tester\n");
    write_doc(&dir, "c.txt", "body\n");

    let mut server = Server::open(config(&dir, 10)).unwrap();
    send(&mut server, Command::Add, "t|a|2000|b.txt");
    assert_eq!(send(&mut server, Command::Add, "t|a|2000|a.txt"), "Document 2 indexed");
    drop(server);

    let mut server = Server::open(config(&dir, 10)).unwrap();
    assert_eq!(server.index().total(), 2);
    assert_eq!(server.index().next_id(), 3);
    assert_eq!(
        send(&mut server, Command::Query, "2"),
        "Title: A|B\nAuthors: Tester\nYear: 2000\nPath: a.txt"
    );
    assert_eq!(send(&mut server, Command::Add, "t|a|2000|c.txt"), "Document 3 indexed");
}

#[test]
fn test_grep_matcher_serves_search_and_line_count() {
    let dir = TempDir::new().unwrap();
    write_doc(&dir, "a.txt", "the whale\nnothing\nwhale\n");
    write_doc(&dir, "b.txt", "nothing here\n");
    write_doc(&dir, "c.txt", "a whale of a time\n");

    let mut server = Server::open(config(&dir, 10).with_matcher(MatcherKind::Grep)).unwrap();
    for name in ["a.txt", "b.txt", "c.txt"] {
        send(&mut server, Command::Add, &format!("t|a|2000|{name}"));
    }

    assert_eq!(send(&mut server, Command::Search, "whale"), "[1, 3]");
    assert_eq!(send(&mut server, Command::Search, "whale|3"), "[1, 3]");
    assert_eq!(send(&mut server, Command::Search, "w.ale|2"), "[1, 3]");
    assert_eq!(send(&mut server, Command::LineCount, "1|whale"), "2");
    assert_eq!(send(&mut server, Command::LineCount, "2|whale"), "0");
}
