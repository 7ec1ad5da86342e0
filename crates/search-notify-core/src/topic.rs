//! Topic configuration and subject routing
//!
//! The topic is the named broker destination for envelopes. Its name,
//! routing discipline and durability are fixed at configuration time and
//! shared read-only across publishes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Broker routing discipline for the configured topic.
///
/// Mapped onto the broker's stream model by the publisher:
/// - `Direct`: one subject, work-queue retention (each message consumed
///   by a single bound consumer).
/// - `Fanout`: one subject, limits retention (every consumer sees every
///   message).
/// - `Topic`: hierarchical subjects under `{name}.>`; the publish subject
///   carries a routing key derived from the resource path, so consumers
///   can subscribe to per-account or per-container subsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicKind {
    #[default]
    Direct,
    Fanout,
    Topic,
}

impl TopicKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Fanout => "fanout",
            Self::Topic => "topic",
        }
    }
}

impl fmt::Display for TopicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The named broker destination messages are published to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicConfig {
    /// Logical topic name; also the stream name
    pub name: String,

    /// Routing discipline
    #[serde(default)]
    pub kind: TopicKind,

    /// Whether messages survive broker restarts
    #[serde(default = "default_durable")]
    pub durable: bool,
}

fn default_durable() -> bool {
    true
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            name: "search".to_string(),
            kind: TopicKind::default(),
            durable: default_durable(),
        }
    }
}

impl TopicConfig {
    /// Subject space the stream binds to
    pub fn bind_subjects(&self) -> Vec<String> {
        match self.kind {
            TopicKind::Direct | TopicKind::Fanout => vec![self.name.clone()],
            TopicKind::Topic => vec![format!("{}.>", self.name)],
        }
    }

    /// Publish subject for a resource path.
    ///
    /// `direct` and `fanout` publish to the bare topic name; `topic`
    /// appends a routing key from the leading path segments (version,
    /// account, container for object-storage paths).
    pub fn subject_for(&self, path: &str) -> String {
        match self.kind {
            TopicKind::Direct | TopicKind::Fanout => self.name.clone(),
            TopicKind::Topic => match route_key(path) {
                Some(key) => format!("{}.{}", self.name, key),
                None => format!("{}.unrouted", self.name),
            },
        }
    }
}

/// Routing key from up to the first three path segments, sanitized for
/// the broker's subject syntax.
fn route_key(path: &str) -> Option<String> {
    let tokens: Vec<String> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .take(3)
        .map(sanitize_token)
        .collect();

    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join("."))
    }
}

fn sanitize_token(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c == '.' || c == '*' || c == '>' || c.is_whitespace() {
                '_'
            } else {
                c
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_and_fanout_use_the_bare_name() {
        for kind in [TopicKind::Direct, TopicKind::Fanout] {
            let topic = TopicConfig {
                name: "search".into(),
                kind,
                durable: true,
            };
            assert_eq!(topic.subject_for("/v1/acct/cont/obj"), "search");
            assert_eq!(topic.bind_subjects(), vec!["search".to_string()]);
        }
    }

    #[test]
    fn topic_kind_routes_by_path_segments() {
        let topic = TopicConfig {
            name: "search".into(),
            kind: TopicKind::Topic,
            durable: true,
        };
        assert_eq!(
            topic.subject_for("/v1/acct/cont/obj"),
            "search.v1.acct.cont"
        );
        assert_eq!(topic.bind_subjects(), vec!["search.>".to_string()]);
    }

    #[test]
    fn topic_kind_sanitizes_subject_tokens() {
        let topic = TopicConfig {
            name: "search".into(),
            kind: TopicKind::Topic,
            durable: true,
        };
        assert_eq!(
            topic.subject_for("/v1/a.b/c d*/obj"),
            "search.v1.a_b.c_d_"
        );
        assert_eq!(topic.subject_for(""), "search.unrouted");
        assert_eq!(topic.subject_for("///"), "search.unrouted");
    }
}
