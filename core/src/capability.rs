//! Which verbs each resource kind supports.
//!
//! Some operations exist on the client surface but have no implementation
//! yet. They are listed here so callers can check up front instead of
//! discovering `NotImplemented` at call time.

use std::fmt;

/// A kind of remote resource the client knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    CustomName,
    MicrosoftEndpoint,
    MicrosoftAdPolicy,
    Workspace,
}

/// An operation on a resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Create,
    Read,
    ReadByName,
    Update,
    Delete,
}

impl ResourceKind {
    pub fn supports(self, verb: Verb) -> bool {
        use ResourceKind::*;
        use Verb::*;
        matches!(
            (self, verb),
            (CustomName, Create | Read | Delete)
                | (MicrosoftEndpoint, ReadByName)
                | (MicrosoftAdPolicy, Create | Read | Delete)
                | (Workspace, ReadByName)
        )
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::CustomName => "custom name",
            ResourceKind::MicrosoftEndpoint => "Microsoft endpoint",
            ResourceKind::MicrosoftAdPolicy => "Microsoft AD policy",
            ResourceKind::Workspace => "workspace",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Verb::Create => "create",
            Verb::Read => "read",
            Verb::ReadByName => "read by name",
            Verb::Update => "update",
            Verb::Delete => "delete",
        };
        f.write_str(name)
    }
}
