//! Request-scoped parameter shapes.
//!
//! Every REST route receives a raw query string ([`PullRequestQuery`],
//! [`PullRequestChangeQuery`], [`PullRequestDiffQuery`]) whose fields are all
//! optional, so a missing parameter is reported with its name instead of a
//! generic deserialization failure. `validate()` turns each into the typed
//! parameters handed to the upstream client.

mod query;

pub use query::*;
