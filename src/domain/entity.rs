//! Collector output: the named members of one target unit.
//!
//! This is the contract between an Entity Collector (the Python adapter, or a test fixture) and
//! the analysis core. Nothing here is computed by the core; it is consumed as reported.

use crate::domain::signature::{MethodKind, RawSignature};
use serde::Serialize;
use std::collections::BTreeMap;

/// Entity classification reported by the collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Type,
    Callable,
    Constant,
    SubUnit,
}

impl EntityKind {
    /// Only Types and Callables become graph nodes.
    pub fn is_graph_node(self) -> bool {
        matches!(self, EntityKind::Type | EntityKind::Callable)
    }

    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Type => "Type",
            EntityKind::Callable => "Callable",
            EntityKind::Constant => "Constant",
            EntityKind::SubUnit => "SubUnit",
        }
    }
}

/// A direct base as written in the type's declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaseRef {
    /// Unqualified base name (`Base` for `pkg.models.Base`).
    pub name: String,
    /// Unit that defines the base, as far as the collector can tell.
    pub qualifier: String,
}

impl BaseRef {
    pub fn new(name: impl Into<String>, qualifier: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qualifier: qualifier.into(),
        }
    }

    pub fn qualified(&self) -> String {
        if self.qualifier.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.qualifier, self.name)
        }
    }
}

/// A method visible on a type, including inherited ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodRecord {
    pub name: String,
    pub kind: MethodKind,
    /// Name of the type whose body defines the method.
    pub defined_in: String,
    /// `None` when the method cannot be introspected.
    pub raw: Option<RawSignature>,
    pub doc: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TypeDetail {
    /// Direct bases in declaration order.
    pub bases: Vec<BaseRef>,
    pub methods: Vec<MethodRecord>,
    /// Attributes assigned on the receiver inside the construction hook.
    pub instance_attributes: Vec<String>,
    /// Attributes assigned in the class body.
    pub class_attributes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CallableDetail {
    pub raw: Option<RawSignature>,
    pub is_async: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstantDetail {
    /// `str`, `int`, `float`, `bool`, `list`, `dict`, `tuple` or `set`.
    pub value_kind: String,
    pub preview: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubUnitDetail {
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "detail", rename_all = "snake_case")]
pub enum EntityDetail {
    Type(TypeDetail),
    Callable(CallableDetail),
    Constant(ConstantDetail),
    SubUnit(SubUnitDetail),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityRecord {
    pub name: String,
    pub kind: EntityKind,
    pub defining_unit: String,
    /// Absent when the entity was not loaded from retrievable text.
    pub source_text: Option<String>,
    pub doc: Option<String>,
    pub detail: EntityDetail,
}

impl EntityRecord {
    pub fn type_entity(
        name: impl Into<String>,
        defining_unit: impl Into<String>,
        source_text: Option<String>,
        detail: TypeDetail,
    ) -> Self {
        Self {
            name: name.into(),
            kind: EntityKind::Type,
            defining_unit: defining_unit.into(),
            source_text,
            doc: None,
            detail: EntityDetail::Type(detail),
        }
    }

    pub fn callable(
        name: impl Into<String>,
        defining_unit: impl Into<String>,
        source_text: Option<String>,
        detail: CallableDetail,
    ) -> Self {
        Self {
            name: name.into(),
            kind: EntityKind::Callable,
            defining_unit: defining_unit.into(),
            source_text,
            doc: None,
            detail: EntityDetail::Callable(detail),
        }
    }

    pub fn constant(
        name: impl Into<String>,
        defining_unit: impl Into<String>,
        detail: ConstantDetail,
    ) -> Self {
        Self {
            name: name.into(),
            kind: EntityKind::Constant,
            defining_unit: defining_unit.into(),
            source_text: None,
            doc: None,
            detail: EntityDetail::Constant(detail),
        }
    }

    pub fn sub_unit(
        name: impl Into<String>,
        defining_unit: impl Into<String>,
        location: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: EntityKind::SubUnit,
            defining_unit: defining_unit.into(),
            source_text: None,
            doc: None,
            detail: EntityDetail::SubUnit(SubUnitDetail { location }),
        }
    }

    pub fn with_doc(mut self, doc: Option<String>) -> Self {
        self.doc = doc;
        self
    }

    pub fn type_detail(&self) -> Option<&TypeDetail> {
        match &self.detail {
            EntityDetail::Type(t) => Some(t),
            _ => None,
        }
    }

    pub fn callable_detail(&self) -> Option<&CallableDetail> {
        match &self.detail {
            EntityDetail::Callable(c) => Some(c),
            _ => None,
        }
    }
}

/// Descriptive metadata of the unit itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnitInfo {
    /// Dotted unit name, e.g. `shop.models`.
    pub name: String,
    pub location: Option<String>,
    /// First line of the unit docstring.
    pub description: Option<String>,
    pub version: Option<String>,
    pub author: Option<String>,
    /// Names listed in the unit's export list, if it declares one.
    pub exports: Vec<String>,
}

/// Everything an Entity Collector reports for one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectedUnit {
    pub info: UnitInfo,
    pub entities: BTreeMap<String, EntityRecord>,
    /// Imported names that could not be resolved to a collected entity: local name -> qualified name.
    pub unresolved_imports: BTreeMap<String, String>,
}

impl CollectedUnit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: UnitInfo {
                name: name.into(),
                ..UnitInfo::default()
            },
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn insert(&mut self, entity: EntityRecord) {
        self.entities.insert(entity.name.clone(), entity);
    }

    pub fn get(&self, name: &str) -> Option<&EntityRecord> {
        self.entities.get(name)
    }

    /// True when the entity is defined by this unit or one of its sub-units,
    /// as opposed to being re-exported from elsewhere.
    pub fn owns(&self, entity: &EntityRecord) -> bool {
        let unit = self.name();
        entity.defining_unit == unit
            || entity
                .defining_unit
                .strip_prefix(unit)
                .is_some_and(|rest| rest.starts_with('.'))
    }

    /// Owned entities of the given kind, in name order.
    pub fn owned_of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &EntityRecord> + '_ {
        self.entities
            .values()
            .filter(move |e| e.kind == kind && self.owns(e))
    }

    pub fn count_of_kind(&self, kind: EntityKind) -> usize {
        self.owned_of_kind(kind).count()
    }
}
