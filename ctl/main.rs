#![forbid(unsafe_code)]

//! `lesson-admin-ctl`: terminal companion for `lesson-admin`.
//!
//! Drives the duplicate review queue over the HTTP API and prints the
//! `data` member of each response.

use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use reqwest::{Client, Method};
use serde_json::{json, Value};

#[derive(Debug, Parser)]
#[command(
    name = "lesson-admin-ctl",
    about = "Terminal client for the lesson-admin duplicate review queue",
    version,
    long_about = None
)]
struct Cli {
    /// Base URL of the lesson-admin HTTP API.
    #[arg(long, env = "LESSON_ADMIN_URL", default_value = "http://127.0.0.1:3000")]
    url: String,

    /// User id sent in the `x-user-id` header.
    #[arg(long, env = "LESSON_ADMIN_USER")]
    user: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum Choice {
    Keep,
    Archive,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the pending queue and any resolution notice.
    Queue,

    /// Reload the queue from the duplicate report.
    Reload,

    /// Open a group and show its selections.
    Show {
        /// Group id.
        group: String,
    },

    /// Set one lesson's selection.
    Select {
        /// Group id.
        group: String,
        /// Lesson id.
        lesson: String,
        /// Keep or archive.
        #[arg(value_enum)]
        choice: Choice,
        /// Lesson that absorbs an archived lesson.
        #[arg(long)]
        to: Option<String>,
    },

    /// Keep one lesson and archive the rest into it.
    Keep {
        /// Group id.
        group: String,
        /// Lesson to keep.
        lesson: String,
    },

    /// Dismiss the group: the lessons are not duplicates.
    KeepAll {
        /// Group id.
        group: String,
    },

    /// Submit the selections and move to the next group.
    Save {
        /// Group id.
        group: String,
    },

    /// Move to the next group without submitting.
    Skip {
        /// Group id.
        group: String,
    },

    /// Leave the open group.
    Leave {
        /// Discard unsaved selections.
        #[arg(long)]
        force: bool,
    },
}

impl Command {
    fn request(&self) -> (Method, String, Option<Value>) {
        match self {
            Self::Queue => (Method::GET, "/admin/duplicates".into(), None),
            Self::Reload => (Method::POST, "/admin/duplicates/reload".into(), None),
            Self::Show { group } => (Method::GET, format!("/admin/duplicates/{group}"), None),
            Self::Select {
                group,
                lesson,
                choice,
                to,
            } => {
                let body = match choice {
                    Choice::Keep => json!({ "action": "keep" }),
                    Choice::Archive => json!({ "action": "archive", "archive_to": to }),
                };
                (
                    Method::PUT,
                    format!("/admin/duplicates/{group}/selections/{lesson}"),
                    Some(body),
                )
            }
            Self::Keep { group, lesson } => (
                Method::POST,
                format!("/admin/duplicates/{group}/quick-keep/{lesson}"),
                None,
            ),
            Self::KeepAll { group } => (
                Method::POST,
                format!("/admin/duplicates/{group}/keep-all"),
                None,
            ),
            Self::Save { group } => (Method::POST, format!("/admin/duplicates/{group}/save"), None),
            Self::Skip { group } => (Method::POST, format!("/admin/duplicates/{group}/skip"), None),
            Self::Leave { force } => (
                Method::POST,
                format!("/admin/duplicates/leave?force={force}"),
                None,
            ),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Cli::parse();
    let (method, path, body) = args.command.request();
    let url = format!("{}{path}", args.url.trim_end_matches('/'));

    match send(&url, method, &args.user, body).await {
        Ok(response) => {
            let ok = response
                .get("ok")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            if ok {
                match response.get("data") {
                    Some(Value::Null) | None => println!("OK"),
                    Some(data) => {
                        println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
                    }
                }
                ExitCode::SUCCESS
            } else {
                let err_msg = response
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error");
                eprintln!("Error: {err_msg}");
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            eprintln!("Failed to reach server: {err}");
            eprintln!("Is lesson-admin running at '{}'?", args.url);
            ExitCode::FAILURE
        }
    }
}

/// Send one request and decode the JSON envelope, whatever the status.
async fn send(
    url: &str,
    method: Method,
    user: &str,
    body: Option<Value>,
) -> std::result::Result<Value, Box<dyn std::error::Error>> {
    let client = Client::new();
    let mut request = client.request(method, url).header("x-user-id", user);
    if let Some(body) = body {
        request = request.json(&body);
    }
    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|err| format!("{status}: {err}: {text}").into())
}
