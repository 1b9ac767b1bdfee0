use std::fmt;

/// The identity of an optimization unit: an item sold in a zone through a
/// sales channel.
///
/// A key is not unique across time (the warehouse holds one row per week),
/// but every per-group computation (smoothing, model selection) aggregates
/// over it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupKey {
    /// The item (material) identifier
    pub item_id: String,
    /// The sales zone identifier
    pub zone_id: String,
    /// The sales channel identifier, which also selects the price-range column
    pub channel_id: String,
}

impl GroupKey {
    /// Build a key from anything string-like
    pub fn new(
        item_id: impl Into<String>,
        zone_id: impl Into<String>,
        channel_id: impl Into<String>,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            zone_id: zone_id.into(),
            channel_id: channel_id.into(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.item_id, self.zone_id, self.channel_id)
    }
}
