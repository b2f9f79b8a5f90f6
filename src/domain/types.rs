//! Shared domain enumerations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The four persisted entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Delivery,
    Payment,
    Item,
    Order,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Delivery,
        EntityKind::Payment,
        EntityKind::Item,
        EntityKind::Order,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Delivery => "delivery",
            EntityKind::Payment => "payment",
            EntityKind::Item => "item",
            EntityKind::Order => "order",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for EntityKind {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "delivery" => Ok(EntityKind::Delivery),
            "payment" => Ok(EntityKind::Payment),
            "item" => Ok(EntityKind::Item),
            "order" => Ok(EntityKind::Order),
            _ => Err(()),
        }
    }
}
