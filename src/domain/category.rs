//! Category Entity
//!
//! A named taxonomy node, optionally nested under a parent and associated with stores.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use super::entity::{DomainError, Entity};

/// Opaque category identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(Uuid);

impl CategoryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CategoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for CategoryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Store identifier, owned by the external store directory
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreId(String);

impl StoreId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StoreId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Fixed color palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryColor {
    Blue,
    Green,
    Red,
    Orange,
    Purple,
    Pink,
    Teal,
    Yellow,
    #[default]
    Gray,
    Indigo,
}

impl CategoryColor {
    pub const ALL: [CategoryColor; 10] = [
        CategoryColor::Blue,
        CategoryColor::Green,
        CategoryColor::Red,
        CategoryColor::Orange,
        CategoryColor::Purple,
        CategoryColor::Pink,
        CategoryColor::Teal,
        CategoryColor::Yellow,
        CategoryColor::Gray,
        CategoryColor::Indigo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryColor::Blue => "blue",
            CategoryColor::Green => "green",
            CategoryColor::Red => "red",
            CategoryColor::Orange => "orange",
            CategoryColor::Purple => "purple",
            CategoryColor::Pink => "pink",
            CategoryColor::Teal => "teal",
            CategoryColor::Yellow => "yellow",
            CategoryColor::Gray => "gray",
            CategoryColor::Indigo => "indigo",
        }
    }
}

impl FromStr for CategoryColor {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        CategoryColor::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| DomainError::validation("color", format!("'{}' is not in the palette", s)))
    }
}

/// Fixed icon set. Unknown names fall back to [`CategoryIcon::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CategoryIcon {
    ShoppingBag,
    Shirt,
    Laptop,
    Food,
    Drink,
    Home,
    Book,
    Sports,
    Toy,
    Beauty,
    Health,
    Tools,
    Garden,
    Car,
    Pet,
    #[default]
    Other,
}

impl CategoryIcon {
    pub const ALL: [CategoryIcon; 16] = [
        CategoryIcon::ShoppingBag,
        CategoryIcon::Shirt,
        CategoryIcon::Laptop,
        CategoryIcon::Food,
        CategoryIcon::Drink,
        CategoryIcon::Home,
        CategoryIcon::Book,
        CategoryIcon::Sports,
        CategoryIcon::Toy,
        CategoryIcon::Beauty,
        CategoryIcon::Health,
        CategoryIcon::Tools,
        CategoryIcon::Garden,
        CategoryIcon::Car,
        CategoryIcon::Pet,
        CategoryIcon::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryIcon::ShoppingBag => "shopping_bag",
            CategoryIcon::Shirt => "shirt",
            CategoryIcon::Laptop => "laptop",
            CategoryIcon::Food => "food",
            CategoryIcon::Drink => "drink",
            CategoryIcon::Home => "home",
            CategoryIcon::Book => "book",
            CategoryIcon::Sports => "sports",
            CategoryIcon::Toy => "toy",
            CategoryIcon::Beauty => "beauty",
            CategoryIcon::Health => "health",
            CategoryIcon::Tools => "tools",
            CategoryIcon::Garden => "garden",
            CategoryIcon::Car => "car",
            CategoryIcon::Pet => "pet",
            CategoryIcon::Other => "other",
        }
    }

    /// Parse from string, unrecognized names map to `Other`
    pub fn from_name(s: &str) -> Self {
        let wanted = s.trim().to_ascii_lowercase();
        CategoryIcon::ALL
            .into_iter()
            .find(|i| i.as_str() == wanted)
            .unwrap_or(CategoryIcon::Other)
    }
}

impl Serialize for CategoryIcon {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CategoryIcon {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(CategoryIcon::from_name(&name))
    }
}

/// What happened to a category, as recorded in its audit log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "stores", rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Updated,
    Activated,
    Deactivated,
    StoresAdded(Vec<StoreId>),
    StoresRemoved(Vec<StoreId>),
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditAction::Created => f.write_str("created"),
            AuditAction::Updated => f.write_str("updated"),
            AuditAction::Activated => f.write_str("activated"),
            AuditAction::Deactivated => f.write_str("deactivated"),
            AuditAction::StoresAdded(ids) => write!(f, "stores added ({})", ids.len()),
            AuditAction::StoresRemoved(ids) => write!(f, "stores removed ({})", ids.len()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
}

/// Creation metadata, optimistic-concurrency version and append-only history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audit {
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bumped by the repository on every successful write
    pub version: u64,
    #[serde(default)]
    pub log: Vec<AuditEntry>,
}

impl Audit {
    pub fn new(created_by: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            created_by: created_by.into(),
            created_at: at,
            updated_at: at,
            version: 1,
            log: Vec::new(),
        }
    }
}

/// A category in the flat collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: CategoryId,
    pub name: String,
    /// Weak reference resolved by lookup in the same collection
    pub parent_id: Option<CategoryId>,
    pub color: CategoryColor,
    pub icon: CategoryIcon,
    #[serde(default)]
    pub stores: BTreeSet<StoreId>,
    pub is_active: bool,
    pub audit: Audit,
}

impl CategoryRecord {
    pub fn new(id: CategoryId, name: impl Into<String>, created_by: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parent_id: None,
            color: CategoryColor::default(),
            icon: CategoryIcon::default(),
            stores: BTreeSet::new(),
            is_active: true,
            audit: Audit::new(created_by, Utc::now()),
        }
    }

    pub fn with_parent(mut self, parent_id: CategoryId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn version(&self) -> u64 {
        self.audit.version
    }

    /// Append to the audit log and touch `updated_at`
    pub fn record_action(
        &mut self,
        actor: &str,
        action: AuditAction,
        at: DateTime<Utc>,
    ) -> AuditEntry {
        let entry = AuditEntry {
            actor: actor.to_string(),
            timestamp: at,
            action,
        };
        self.audit.updated_at = at;
        self.audit.log.push(entry.clone());
        entry
    }
}

impl Entity for CategoryRecord {
    type Id = CategoryId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Input for creating a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    #[serde(default)]
    pub color: CategoryColor,
    #[serde(default)]
    pub icon: CategoryIcon,
    #[serde(default)]
    pub stores: Vec<StoreId>,
    pub created_by: String,
}

impl NewCategory {
    pub fn new(name: impl Into<String>, created_by: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_id: None,
            color: CategoryColor::default(),
            icon: CategoryIcon::default(),
            stores: Vec::new(),
            created_by: created_by.into(),
        }
    }

    pub fn under(mut self, parent_id: CategoryId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// Partial update; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryPatch {
    pub name: Option<String>,
    /// `Some(None)` moves the category to the root level
    pub parent_id: Option<Option<CategoryId>>,
    pub color: Option<CategoryColor>,
    pub icon: Option<CategoryIcon>,
    /// When set, the update fails unless the stored version still matches
    pub expected_version: Option<u64>,
}

impl CategoryPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.parent_id.is_none() && self.color.is_none() && self.icon.is_none()
    }
}
