//! Common test utilities

use capstan::config::Config;
use capstan::console::Console;
use serde_json::{json, Value};
use tempfile::TempDir;

/// Build a config pointed at a mock server with isolated storage
///
/// The poll interval is shortened so sync tests finish quickly.
#[allow(dead_code)]
pub fn test_config(server_uri: &str, dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.server.url = server_uri.to_string();
    config.storage.data_dir = dir.path().join("data");
    config.console.poll_interval_ms = 25;
    config
}

/// Build a wired console against a mock server
#[allow(dead_code)]
pub fn test_console(server_uri: &str, dir: &TempDir) -> Console {
    Console::new(test_config(server_uri, dir)).unwrap()
}

/// One resource row as the backend serializes it
#[allow(dead_code)]
pub fn resource_json(message_id: i64, title: &str) -> Value {
    json!({
        "message_id": message_id,
        "title": title,
        "tags": "#movie #hd",
        "pan_url": format!("https://pan.example.com/s/{message_id}"),
        "description": "",
    })
}

/// Browse-mode response body
#[allow(dead_code)]
pub fn browse_body(page: u32, total_pages: u32, total: u64, titles: &[&str]) -> Value {
    let resources: Vec<Value> = titles
        .iter()
        .enumerate()
        .map(|(i, title)| resource_json(i as i64 + 1, title))
        .collect();

    json!({
        "page": page,
        "total_pages": total_pages,
        "total": total,
        "resources": resources,
    })
}

/// Search-mode response body
#[allow(dead_code)]
pub fn search_body(titles: &[&str]) -> Value {
    let resources: Vec<Value> = titles
        .iter()
        .enumerate()
        .map(|(i, title)| resource_json(i as i64 + 1, title))
        .collect();

    json!({
        "count": titles.len(),
        "resources": resources,
    })
}

/// Dashboard summary body with a single channel
#[allow(dead_code)]
pub fn dashboard_body(total: u64, parsed: u64) -> Value {
    json!({
        "channels": [{
            "id": "movies",
            "name": "Movie Channel",
            "parse_mode": "telegraph",
            "total": total,
            "parsed": parsed,
            "unparsed": total - parsed,
        }],
        "total_resources": total,
        "total_parsed": parsed,
        "sync_status": { "running": false, "channel": null, "message": "" },
    })
}

/// Scheduled-task list body
#[allow(dead_code)]
pub fn tasks_body(ids: &[&str]) -> Value {
    let tasks: Vec<Value> = ids
        .iter()
        .map(|id| {
            json!({
                "id": id,
                "name": format!("Sync {id}"),
                "next_run": "2026-08-25T12:00:00Z",
            })
        })
        .collect();

    json!({ "tasks": tasks })
}
