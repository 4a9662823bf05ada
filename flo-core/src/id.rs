//! Typed identifiers for every cross-boundary handle in the fabric.
//!
//! Each id is a thin `String` newtype — there is no UUID enforcement, just
//! strings underneath. The point of the wrapper is that a `WorkerId` can
//! never be passed where an `AgentId` is expected without the compiler
//! objecting.

use std::fmt;

macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Build a new id from anything string-like.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the underlying string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

typed_id!(AgentId, "Identifies one configured agent and its supervisor.");
typed_id!(WorkflowId, "Identifies a running instance of an agent (a supervisor's lifecycle session).");
typed_id!(WorkerId, "Identifies one worker (main or sub) inside a sandbox document.");
typed_id!(SubworkerId, "Identifies one subworker within its parent's subworker registry.");
typed_id!(HubConnectionId, "Identifies one configured Hub connection.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_display_matches_inner_string() {
        let id = AgentId::new("agent-42");
        assert_eq!(id.to_string(), "agent-42");
        assert_eq!(id.as_str(), "agent-42");
    }

    #[test]
    fn id_from_str_and_string() {
        let a: AgentId = "a1".into();
        let b: AgentId = String::from("a1").into();
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_id_types_do_not_compare() {
        let agent = AgentId::new("x");
        let worker = WorkerId::new("x");
        assert_eq!(agent.as_str(), worker.as_str());
        // no PartialEq<WorkerId> for AgentId exists: the line below would not compile.
        // assert_eq!(agent, worker);
    }
}
