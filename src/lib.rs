//! Bitbucket Server pull request proxy.
//!
//! Lists pull requests, their changed files and per-file diffs from a
//! Bitbucket Server instance, and exposes them both as a REST API
//! ([`api`]) and as MCP tools ([`mcp`]) for AI agents.

pub mod api;
pub mod bitbucket;
pub mod config;
pub mod mcp;
pub mod models;
