//! Vault attribute vocabulary and the query builder.
//!
//! Every vault call takes an [`Attributes`] map. [`QueryBuilder`] is the
//! only producer of those maps inside the store and enforces two rules:
//!
//! - namespace and identifier are lower-cased before insertion, so callers
//!   address the same entry regardless of casing;
//! - the sharing group, when configured, is attached to every query.
//!
//! Maps are ordered (`BTreeMap`), which keeps the output deterministic and
//! easy to compare in tests.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::auth::AuthContext;
use crate::policy::{AccessControl, Accessibility, BiometricGate};

// ---------------------------------------------------------------------------
// Vocabulary
// ---------------------------------------------------------------------------

/// Attribute keys understood by the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Attr {
    Class,
    Service,
    Account,
    AccessGroup,
    Accessible,
    AccessControl,
    ValueData,
    ReturnData,
    ReturnAttributes,
    MatchLimit,
    AuthenticationContext,
    CreationDate,
    ModificationDate,
}

impl Attr {
    /// The vault's key string for this attribute.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Service => "svce",
            Self::Account => "acct",
            Self::AccessGroup => "agrp",
            Self::Accessible => "pdmn",
            Self::AccessControl => "accc",
            Self::ValueData => "v_Data",
            Self::ReturnData => "r_Data",
            Self::ReturnAttributes => "r_Attributes",
            Self::MatchLimit => "m_Limit",
            Self::AuthenticationContext => "u_AuthCtx",
            Self::CreationDate => "cdat",
            Self::ModificationDate => "mdat",
        }
    }

    /// Whether this key narrows which entries a query matches (as opposed
    /// to shaping the result or carrying a new value).
    pub fn is_match_key(self) -> bool {
        matches!(
            self,
            Self::Class | Self::Service | Self::Account | Self::AccessGroup
        )
    }
}

impl std::fmt::Display for Attr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Item class. Only generic secrets are stored by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemClass {
    GenericPassword,
}

impl ItemClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GenericPassword => "genp",
        }
    }
}

/// How many matches a query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchLimit {
    One,
    All,
}

/// An attribute value.
#[derive(Clone, PartialEq)]
pub enum Value {
    Text(String),
    Data(Vec<u8>),
    Bool(bool),
    Class(ItemClass),
    Accessibility(Accessibility),
    AccessControl(AccessControl),
    Limit(MatchLimit),
    Date(DateTime<Utc>),
    Auth(AuthContext),
}

// Payload bytes stay out of logs and panic messages.
impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Self::Data(bytes) => write!(f, "Data(<{} bytes>)", bytes.len()),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Class(c) => f.debug_tuple("Class").field(c).finish(),
            Self::Accessibility(a) => f.debug_tuple("Accessibility").field(a).finish(),
            Self::AccessControl(ac) => f.debug_tuple("AccessControl").field(ac).finish(),
            Self::Limit(l) => f.debug_tuple("Limit").field(l).finish(),
            Self::Date(d) => f.debug_tuple("Date").field(d).finish(),
            Self::Auth(ctx) => f.debug_tuple("Auth").field(ctx).finish(),
        }
    }
}

/// An ordered attribute dictionary submitted to or returned by the vault.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes(BTreeMap<Attr, Value>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the previous one.
    pub fn insert(&mut self, attr: Attr, value: Value) -> Option<Value> {
        self.0.insert(attr, value)
    }

    /// Builder-style insert.
    pub fn with(mut self, attr: Attr, value: Value) -> Self {
        self.0.insert(attr, value);
        self
    }

    /// Copy every entry of `other` into `self`, overwriting on collision.
    pub fn merge(&mut self, other: &Attributes) {
        for (attr, value) in &other.0 {
            self.0.insert(*attr, value.clone());
        }
    }

    pub fn get(&self, attr: Attr) -> Option<&Value> {
        self.0.get(&attr)
    }

    pub fn contains(&self, attr: Attr) -> bool {
        self.0.contains_key(&attr)
    }

    pub fn remove(&mut self, attr: Attr) -> Option<Value> {
        self.0.remove(&attr)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Attr, &Value)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = Attr> + '_ {
        self.0.keys().copied()
    }

    // -- Typed accessors ----------------------------------------------------

    pub fn text(&self, attr: Attr) -> Option<&str> {
        match self.get(attr)? {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn data(&self, attr: Attr) -> Option<&[u8]> {
        match self.get(attr)? {
            Value::Data(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// A boolean flag; absent or non-boolean values read as `false`.
    pub fn flag(&self, attr: Attr) -> bool {
        matches!(self.get(attr), Some(Value::Bool(true)))
    }

    pub fn date(&self, attr: Attr) -> Option<DateTime<Utc>> {
        match self.get(attr)? {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn class(&self) -> Option<ItemClass> {
        match self.get(Attr::Class)? {
            Value::Class(c) => Some(*c),
            _ => None,
        }
    }

    pub fn accessibility(&self) -> Option<Accessibility> {
        match self.get(Attr::Accessible)? {
            Value::Accessibility(a) => Some(*a),
            _ => None,
        }
    }

    pub fn access_control(&self) -> Option<AccessControl> {
        match self.get(Attr::AccessControl)? {
            Value::AccessControl(ac) => Some(*ac),
            _ => None,
        }
    }

    pub fn match_limit(&self) -> Option<MatchLimit> {
        match self.get(Attr::MatchLimit)? {
            Value::Limit(l) => Some(*l),
            _ => None,
        }
    }

    pub fn auth_context(&self) -> Option<&AuthContext> {
        match self.get(Attr::AuthenticationContext)? {
            Value::Auth(ctx) => Some(ctx),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Query builder
// ---------------------------------------------------------------------------

/// Case-fold a namespace or identifier into its vault key form.
pub fn normalize(value: &str) -> String {
    value.to_lowercase()
}

/// Builds the attribute map for each kind of vault call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryBuilder {
    access_group: Option<String>,
}

impl QueryBuilder {
    pub fn new(access_group: Option<String>) -> Self {
        Self { access_group }
    }

    /// The sharing group attached to every query, if any.
    pub fn access_group(&self) -> Option<&str> {
        self.access_group.as_deref()
    }

    /// `{class}` plus the sharing group.
    fn base(&self) -> Attributes {
        let mut attrs =
            Attributes::new().with(Attr::Class, Value::Class(ItemClass::GenericPassword));
        if let Some(group) = &self.access_group {
            attrs.insert(Attr::AccessGroup, Value::Text(group.clone()));
        }
        attrs
    }

    /// Match predicate for a single entry. Also used for delete and as the
    /// match half of update.
    pub fn lookup(&self, namespace: &str, identifier: &str) -> Attributes {
        self.base()
            .with(Attr::Service, Value::Text(normalize(namespace)))
            .with(Attr::Account, Value::Text(normalize(identifier)))
    }

    /// Lookup requesting the payload of one entry, optionally with an
    /// authentication context for gated entries.
    pub fn read(&self, namespace: &str, identifier: &str, auth_reason: Option<&str>) -> Attributes {
        let mut attrs = self
            .lookup(namespace, identifier)
            .with(Attr::ReturnData, Value::Bool(true))
            .with(Attr::MatchLimit, Value::Limit(MatchLimit::One));
        if let Some(reason) = auth_reason {
            attrs.insert(
                Attr::AuthenticationContext,
                Value::Auth(AuthContext::new(reason)),
            );
        }
        attrs
    }

    /// Lookup asking for neither payload nor attributes, limited to one.
    pub fn existence(&self, namespace: &str, identifier: &str) -> Attributes {
        self.lookup(namespace, identifier)
            .with(Attr::ReturnData, Value::Bool(false))
            .with(Attr::ReturnAttributes, Value::Bool(false))
            .with(Attr::MatchLimit, Value::Limit(MatchLimit::One))
    }

    /// Lookup asking for the attribute projection of one entry.
    pub fn record(&self, namespace: &str, identifier: &str) -> Attributes {
        self.lookup(namespace, identifier)
            .with(Attr::ReturnAttributes, Value::Bool(true))
            .with(Attr::MatchLimit, Value::Limit(MatchLimit::One))
    }

    /// Full attribute set for a new entry.
    pub fn insert(
        &self,
        namespace: &str,
        identifier: &str,
        payload: Vec<u8>,
        accessibility: Accessibility,
        gate: Option<&BiometricGate>,
    ) -> Attributes {
        let mut attrs = self
            .lookup(namespace, identifier)
            .with(Attr::ValueData, Value::Data(payload))
            .with(
                Attr::Accessible,
                Value::Accessibility(accessibility.canonical()),
            );
        if let Some(ac) = gate.and_then(|g| g.access_control(accessibility)) {
            attrs.insert(Attr::AccessControl, Value::AccessControl(ac));
        }
        attrs
    }

    /// Replacement attributes for update. The match predicate is
    /// [`lookup`](Self::lookup) and must not carry these fields.
    pub fn update_attributes(&self, payload: Vec<u8>, accessibility: Accessibility) -> Attributes {
        Attributes::new()
            .with(Attr::ValueData, Value::Data(payload))
            .with(
                Attr::Accessible,
                Value::Accessibility(accessibility.canonical()),
            )
    }

    /// Match predicate over many entries, optionally one namespace. Used
    /// directly for delete-all.
    pub fn enumeration_filter(&self, namespace: Option<&str>) -> Attributes {
        let mut attrs = self.base();
        if let Some(ns) = namespace {
            attrs.insert(Attr::Service, Value::Text(normalize(ns)));
        }
        attrs
    }

    /// Enumeration requesting attribute projections with no result limit.
    pub fn enumerate(&self, namespace: Option<&str>) -> Attributes {
        self.enumeration_filter(namespace)
            .with(Attr::ReturnAttributes, Value::Bool(true))
            .with(Attr::MatchLimit, Value::Limit(MatchLimit::All))
    }
}
