use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Declares the closed model set together with its stable numeric ids and
/// snake_case names, so the three views can never drift apart.
macro_rules! models {
    (
        $(
            $(#[$meta:meta])*
            $variant:ident = $id:literal => $name:literal
        ),+ $(,)?
    ) => {
        /// Logical time-series model: a family of counters, distinct counters,
        /// or frequency tables addressed by the storage abstraction.
        ///
        /// Serializes to its snake_case name.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum Model {
            $(
                $(#[$meta])*
                $variant,
            )+
        }

        impl Model {
            /// Every model, in declaration order.
            pub const ALL: &'static [Model] = &[$(Model::$variant),+];

            /// Stable numeric identifier of this model.
            #[must_use]
            pub const fn id(self) -> u32 {
                match self {
                    $(Model::$variant => $id,)+
                }
            }

            /// Snake_case name of this model.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Model::$variant => $name,)+
                }
            }

            /// Looks a model up by its numeric identifier.
            #[must_use]
            pub fn from_id(id: u32) -> Option<Model> {
                match id {
                    $($id => Some(Model::$variant),)+
                    _ => None,
                }
            }

            /// Looks a model up by its snake_case name.
            #[must_use]
            pub fn from_name(name: &str) -> Option<Model> {
                match name {
                    $($name => Some(Model::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

models! {
    Internal = 0 => "internal",
    Project = 1 => "project",
    Group = 4 => "group",
    Release = 7 => "release",

    ProjectTotalReceived = 100 => "project_total_received",
    ProjectTotalRejected = 101 => "project_total_rejected",
    ProjectTotalBlacklisted = 104 => "project_total_blacklisted",

    OrganizationTotalReceived = 200 => "organization_total_received",
    OrganizationTotalRejected = 201 => "organization_total_rejected",
    OrganizationTotalBlacklisted = 202 => "organization_total_blacklisted",

    /// Distinct users seen per issue.
    UsersAffectedByGroup = 300 => "users_affected_by_group",
    /// Distinct users seen per project.
    UsersAffectedByProject = 301 => "users_affected_by_project",

    FrequentIssuesByProject = 401 => "frequent_issues_by_project",
    FrequentReleasesByGroup = 403 => "frequent_releases_by_group",
    FrequentEnvironmentsByGroup = 404 => "frequent_environments_by_group",

    KeyTotalReceived = 500 => "key_total_received",
    KeyTotalRejected = 501 => "key_total_rejected",
    KeyTotalBlacklisted = 502 => "key_total_blacklisted",
}

impl Model {
    /// Columns the analytical engine aggregates for this model: the key column
    /// and, for distinct-count and frequency models, the aggregated column.
    ///
    /// `None` means the analytical engine has no data for this model and it is
    /// served entirely by the counter store.
    #[must_use]
    pub const fn analytics_columns(self) -> Option<(&'static str, Option<&'static str>)> {
        match self {
            Model::Project => Some(("project_id", None)),
            Model::Group => Some(("issue", None)),
            Model::Release => Some(("tags[sentry:release]", None)),
            Model::UsersAffectedByGroup => Some(("issue", Some("tags[sentry:user]"))),
            Model::UsersAffectedByProject => Some(("project_id", Some("tags[sentry:user]"))),
            Model::FrequentIssuesByProject => Some(("project_id", Some("issue"))),
            Model::FrequentReleasesByGroup => Some(("issue", Some("tags[sentry:release]"))),
            Model::FrequentEnvironmentsByGroup => Some(("issue", Some("environment"))),
            _ => None,
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Error returned when a string names neither a model nor a model id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown model: {0}")]
pub struct ParseModelError(pub String);

impl FromStr for Model {
    type Err = ParseModelError;

    /// Accepts either the snake_case name or the numeric id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Model::from_name(trimmed)
            .or_else(|| trimmed.parse::<u32>().ok().and_then(Model::from_id))
            .ok_or_else(|| ParseModelError(s.to_string()))
    }
}

/// Concrete storage implementation a call can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Key-value counter store. Serves both reads and writes.
    Counter,
    /// Columnar analytical query engine. Read-only from the router's view.
    Analytics,
    /// Discards writes and answers reads with nothing.
    Sink,
}

impl Backend {
    /// Every backend, in declaration order.
    pub const ALL: &'static [Backend] = &[Backend::Counter, Backend::Analytics, Backend::Sink];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Backend::Counter => "counter",
            Backend::Analytics => "analytics",
            Backend::Sink => "sink",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Error returned when a string does not name a backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown backend: {0} (expected one of: counter, analytics, sink)")]
pub struct ParseBackendError(pub String);

impl FromStr for Backend {
    type Err = ParseBackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Backend::ALL
            .iter()
            .copied()
            .find(|backend| backend.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseBackendError(s.to_string()))
    }
}

/// Whether an operation reads from or writes to its backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Read,
    Write,
}

impl OperationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            OperationKind::Read => "read",
            OperationKind::Write => "write",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
