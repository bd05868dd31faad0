// src/entity.rs
// =============================================================================
// This module defines how we name the thing whose docs we are tracking.
//
// Every documented component in the developer portal is identified by an
// entity reference with three parts: kind, namespace, and name. The full
// string form is "kind:namespace/name", but people rarely type all of it,
// so the parser fills in defaults for the parts they leave out.
//
// Rust concepts:
// - FromStr: The standard trait behind "some_string".parse()
// - Display: The standard trait behind format!("{}", value)
// - Struct methods: Behavior attached to a data type with impl blocks
// =============================================================================

use anyhow::{anyhow, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

// Identifies one documented entity in the portal catalog
//
// Example: kind = "component", namespace = "default", name = "petstore"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityRef {
    /// What sort of thing this is (component, api, system, ...)
    pub kind: String,
    /// Grouping namespace, "default" unless stated otherwise
    pub namespace: String,
    /// The entity's own name
    pub name: String,
}

impl EntityRef {
    pub const DEFAULT_KIND: &'static str = "component";
    pub const DEFAULT_NAMESPACE: &'static str = "default";

    // Returns the path segments used in docs backend URLs
    //
    // Backend routes address entities as {namespace}/{kind}/{name},
    // NOT in the display order, so this is its own method.
    pub fn path(&self) -> String {
        format!("{}/{}/{}", self.namespace, self.kind, self.name)
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.kind, self.namespace, self.name)
    }
}

impl FromStr for EntityRef {
    type Err = anyhow::Error;

    // Parses an entity reference, filling in defaults for missing parts
    //
    // Accepted forms:
    //   "component:default/petstore" - everything spelled out
    //   "component:petstore"         - namespace defaults to "default"
    //   "default/petstore"           - kind defaults to "component"
    //   "petstore"                   - both defaults applied
    //
    // Kind and namespace are case-insensitive and stored lowercased;
    // the name keeps whatever casing it was given.
    fn from_str(s: &str) -> Result<Self> {
        let (kind, rest) = match s.split_once(':') {
            Some((kind, rest)) => (kind.to_lowercase(), rest),
            None => (Self::DEFAULT_KIND.to_string(), s),
        };

        let (namespace, name) = match rest.split_once('/') {
            Some((namespace, name)) => (namespace.to_lowercase(), name.to_string()),
            None => (Self::DEFAULT_NAMESPACE.to_string(), rest.to_string()),
        };

        for (label, value) in [("kind", &kind), ("namespace", &namespace), ("name", &name)] {
            if value.is_empty() {
                return Err(anyhow!("Entity reference '{}' has an empty {}", s, label));
            }
            if !value.chars().all(valid_segment_char) {
                return Err(anyhow!(
                    "Entity reference '{}' has unsupported characters in its {}",
                    s,
                    label
                ));
            }
        }

        Ok(EntityRef { kind, namespace, name })
    }
}

// Entity references travel inside URL paths, so we only accept characters
// that never need percent-encoding.
fn valid_segment_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}
