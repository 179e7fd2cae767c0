use serde::Serialize;
use std::fmt;

/// Relation kind - the five typed relationships between entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    // ============ Type Hierarchy ============
    InheritsFrom, // Type → internal base Type

    // ============ Annotations ============
    AcceptsType, // Entity → Type named in a parameter annotation
    ReturnsType, // Entity → Type named in a return annotation

    // ============ Call Sites ============
    Instantiates,  // Entity → Type called like a function
    CallsFunction, // Entity → Callable
}

impl RelationKind {
    pub const ALL: [RelationKind; 5] = [
        RelationKind::InheritsFrom,
        RelationKind::AcceptsType,
        RelationKind::ReturnsType,
        RelationKind::Instantiates,
        RelationKind::CallsFunction,
    ];

    /// Label of the edge seen from its source.
    pub fn outgoing_label(self) -> &'static str {
        match self {
            RelationKind::InheritsFrom => "inherits_from",
            RelationKind::AcceptsType => "accepts_type",
            RelationKind::ReturnsType => "returns_type",
            RelationKind::Instantiates => "instantiates",
            RelationKind::CallsFunction => "calls_function",
        }
    }

    /// Label of the edge seen from its target.
    pub fn incoming_label(self) -> &'static str {
        match self {
            RelationKind::InheritsFrom => "inherited_by",
            RelationKind::AcceptsType => "accepted_by",
            RelationKind::ReturnsType => "returned_by",
            RelationKind::Instantiates => "instantiated_by",
            RelationKind::CallsFunction => "called_by",
        }
    }

    pub fn label(self, direction: Direction) -> &'static str {
        match direction {
            Direction::Outgoing => self.outgoing_label(),
            Direction::Incoming => self.incoming_label(),
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.outgoing_label() == label || k.incoming_label() == label)
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.outgoing_label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outgoing,
    Incoming,
}

/// One edge endpoint: an entity name plus the context that disambiguates repeated occurrences.
///
/// The same context is stored on both sides of an edge, so a descriptor can be rendered from
/// either view:
///
/// | member | parameter | outgoing (target)   | incoming (source) |
/// |--------|-----------|---------------------|-------------------|
/// | -      | -         | `A`                 | `make`            |
/// | -      | `x`       | `A (parameter: x)`  | `make(x)`         |
/// | `m`    | `x`       | `A (in m.x)`        | `B.m(x)`          |
/// | `m`    | -         | `A (from m)`        | `B.m`             |
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Descriptor {
    pub entity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
}

impl Descriptor {
    pub fn plain(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            member: None,
            parameter: None,
        }
    }

    pub fn with_member(mut self, member: impl Into<String>) -> Self {
        self.member = Some(member.into());
        self
    }

    pub fn with_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.parameter = Some(parameter.into());
        self
    }

    /// Same context, different entity: the other end of the edge.
    pub fn rebased(&self, entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            member: self.member.clone(),
            parameter: self.parameter.clone(),
        }
    }

    pub fn render(&self, direction: Direction) -> String {
        match direction {
            Direction::Outgoing => match (&self.member, &self.parameter) {
                (None, None) => self.entity.clone(),
                (None, Some(p)) => format!("{} (parameter: {p})", self.entity),
                (Some(m), Some(p)) => format!("{} (in {m}.{p})", self.entity),
                (Some(m), None) => format!("{} (from {m})", self.entity),
            },
            Direction::Incoming => match (&self.member, &self.parameter) {
                (None, None) => self.entity.clone(),
                (None, Some(p)) => format!("{}({p})", self.entity),
                (Some(m), Some(p)) => format!("{}.{m}({p})", self.entity),
                (Some(m), None) => format!("{}.{m}", self.entity),
            },
        }
    }
}

/// The atomic unit of the graph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RelationEdge {
    pub source: String,
    pub kind: RelationKind,
    pub target: Descriptor,
}

impl RelationEdge {
    pub fn new(source: impl Into<String>, kind: RelationKind, target: Descriptor) -> Self {
        Self {
            source: source.into(),
            kind,
            target,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum BaseOrigin {
    /// The base is itself an entity of the target unit.
    Internal,
    /// The base lives elsewhere; carries its qualified descriptor instead of a graph edge.
    External { qualified: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InheritanceEdge {
    pub base_name: String,
    pub origin: BaseOrigin,
}

impl InheritanceEdge {
    pub fn is_internal(&self) -> bool {
        matches!(self.origin, BaseOrigin::Internal)
    }

    pub fn display_name(&self) -> &str {
        match &self.origin {
            BaseOrigin::Internal => &self.base_name,
            BaseOrigin::External { qualified } => qualified,
        }
    }
}
