//! Plain-text rendering of upstream results for tool output.

use chrono::{DateTime, Utc};

use crate::bitbucket::{Change, PullRequest, PullRequestState};

/// Render pull requests as one labelled block each, separated by blank lines.
///
/// Example output:
/// ```text
/// ID: 7
/// Title: Add retries
/// Description: Wraps the client
/// Source: refs/heads/feature/retries
/// Target: refs/heads/main
/// Author: Alice
/// Created: 2023-11-14 22:13 UTC
/// ```
pub fn render_pull_requests(prs: &[PullRequest], state: PullRequestState) -> String {
    if prs.is_empty() {
        return match state {
            PullRequestState::All => "No pull requests found.".to_string(),
            other => format!(
                "No {} pull requests found.",
                other.as_str().to_lowercase()
            ),
        };
    }

    prs.iter()
        .map(render_pull_request)
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_pull_request(pr: &PullRequest) -> String {
    let mut out = format!(
        "ID: {}\nTitle: {}\nDescription: {}\nSource: {}\nTarget: {}\n",
        pr.id,
        pr.title,
        pr.description.as_deref().unwrap_or("(none)"),
        pr.from_ref.id,
        pr.to_ref.id,
    );

    if let Some(author) = &pr.author {
        let name = author
            .user
            .display_name
            .as_deref()
            .unwrap_or(&author.user.name);
        out.push_str(&format!("Author: {}\n", name));
    }
    if let Some(created) = pr
        .created_date
        .and_then(DateTime::<Utc>::from_timestamp_millis)
    {
        out.push_str(&format!(
            "Created: {}\n",
            created.format("%Y-%m-%d %H:%M UTC")
        ));
    }
    out
}

/// Render changed files as `TYPE path` lines.
pub fn render_changes(changes: &[Change]) -> String {
    if changes.is_empty() {
        return "No changed files found.".to_string();
    }

    let mut out = String::new();
    for change in changes {
        out.push_str(&change.change_type);
        out.push(' ');
        out.push_str(&change.path.full_path);
        if let Some(src) = &change.src_path {
            out.push_str(&format!(" (from {})", src));
        }
        out.push('\n');
    }
    out
}
