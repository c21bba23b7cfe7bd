use core::fmt;

/// Stable identifier of one managed simulator entity.
///
/// Rendered as `<prefix>_<sequence>`; the sequence is the per-kind creation
/// counter at the time the entity was created.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct EntityId(String);

impl EntityId {
    /// Compose an id from a prefix and a sequence number.
    pub fn compose(prefix: &str, sequence: u64) -> Self {
        Self(format!("{prefix}_{sequence}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl core::borrow::Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn compose_renders_prefix_and_sequence() {
        let id = EntityId::compose("DHNetwork", 3);
        assert_eq!(id.as_str(), "DHNetwork_3");
        assert_eq!(id.to_string(), "DHNetwork_3");
        assert_eq!(format!("{id:?}"), "EntityId(DHNetwork_3)");
    }

    #[test]
    fn lookup_by_str_through_borrow() {
        let mut index = HashMap::new();
        index.insert(EntityId::compose("dh_net", 12), 0usize);
        assert_eq!(index.get("dh_net_12"), Some(&0));
        assert!(!index.contains_key("dh_net_1"));
    }
}
