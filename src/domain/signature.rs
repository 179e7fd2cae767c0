//! Signature extraction for callables and type methods.

use crate::config::AnalysisOptions;
use crate::domain::entity::{CollectedUnit, EntityKind, EntityRecord, MethodRecord, TypeDetail};
use crate::domain::error::AnalysisIssue;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Literal name of the construction hook.
pub const CONSTRUCTION_HOOK: &str = "__init__";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    PositionalOnly,
    Regular,
    VarPositional,
    KeywordOnly,
    VarKeyword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    Instance,
    Class,
    Static,
    Property,
}

impl MethodKind {
    /// Whether the first positional parameter is an implicit receiver.
    pub fn has_receiver(self) -> bool {
        !matches!(self, MethodKind::Static)
    }
}

/// Parameter as reported by the collector, receiver included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawParameter {
    pub name: String,
    pub kind: ParamKind,
    pub annotation: Option<String>,
    pub default: Option<String>,
}

impl RawParameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Regular,
            annotation: None,
            default: None,
        }
    }

    pub fn kind(mut self, kind: ParamKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn annotated(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }

    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawSignature {
    pub parameters: Vec<RawParameter>,
    pub return_annotation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub kind: ParamKind,
    pub annotation: Option<String>,
    pub default: Option<String>,
}

/// Structural description of a callable. Computed once per pass and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Signature {
    pub parameters: Vec<Parameter>,
    pub return_annotation: Option<String>,
}

impl Signature {
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty() && self.return_annotation.is_none()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::with_capacity(self.parameters.len() + 2);
        let mut keyword_marker_needed = !self
            .parameters
            .iter()
            .any(|p| p.kind == ParamKind::VarPositional);

        for (i, p) in self.parameters.iter().enumerate() {
            if p.kind == ParamKind::KeywordOnly && keyword_marker_needed {
                parts.push("*".to_string());
                keyword_marker_needed = false;
            }

            let prefix = match p.kind {
                ParamKind::VarPositional => "*",
                ParamKind::VarKeyword => "**",
                _ => "",
            };
            let mut rendered = format!("{prefix}{}", p.name);
            match (&p.annotation, &p.default) {
                (Some(ann), Some(default)) => {
                    rendered.push_str(&format!(": {ann} = {default}"));
                }
                (Some(ann), None) => rendered.push_str(&format!(": {ann}")),
                (None, Some(default)) => rendered.push_str(&format!("={default}")),
                (None, None) => {}
            }
            parts.push(rendered);

            let next_is_positional_only = self
                .parameters
                .get(i + 1)
                .is_some_and(|n| n.kind == ParamKind::PositionalOnly);
            if p.kind == ParamKind::PositionalOnly && !next_is_positional_only {
                parts.push("/".to_string());
            }
        }

        write!(f, "({})", parts.join(", "))?;
        if let Some(ret) = &self.return_annotation {
            write!(f, " -> {ret}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodSignature {
    pub kind: MethodKind,
    pub defined_in: String,
    pub signature: Signature,
}

/// Methods of one type that survive enumeration, keyed by method name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TypeSignatures {
    pub methods: BTreeMap<String, MethodSignature>,
}

impl TypeSignatures {
    pub fn constructor(&self) -> Option<&Signature> {
        self.methods.get(CONSTRUCTION_HOOK).map(|m| &m.signature)
    }
}

/// All signatures of one analysis pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SignatureTable {
    pub callables: BTreeMap<String, Signature>,
    pub types: BTreeMap<String, TypeSignatures>,
    #[serde(skip)]
    pub issues: Vec<AnalysisIssue>,
}

/// Derives signatures from collector metadata. Total: missing metadata yields an empty signature.
#[derive(Debug, Clone)]
pub struct SignatureExtractor {
    lifecycle_hooks: BTreeSet<String>,
    include_private: bool,
}

impl Default for SignatureExtractor {
    fn default() -> Self {
        Self::new(&AnalysisOptions::default())
    }
}

impl SignatureExtractor {
    pub fn new(options: &AnalysisOptions) -> Self {
        Self {
            lifecycle_hooks: options.lifecycle_hooks.iter().cloned().collect(),
            include_private: options.include_private,
        }
    }

    pub fn is_lifecycle_hook(&self, name: &str) -> bool {
        self.lifecycle_hooks.contains(name)
    }

    /// Signature of a top-level callable entity.
    pub fn extract(&self, entity: &EntityRecord) -> Signature {
        let raw = entity.callable_detail().and_then(|c| c.raw.as_ref());
        self.from_raw(raw, false, &entity.name, &mut Vec::new())
    }

    /// Signature of a method, with the implicit receiver dropped where the kind has one.
    pub fn extract_method(&self, method: &MethodRecord) -> Signature {
        self.from_raw(
            method.raw.as_ref(),
            method.kind.has_receiver(),
            &method.name,
            &mut Vec::new(),
        )
    }

    /// Methods of `type_name` that are enumerated: those defined by the type itself, plus
    /// lifecycle hooks wherever they are defined. First occurrence of a name wins.
    pub fn enumerate_methods<'a>(
        &self,
        type_name: &str,
        detail: &'a TypeDetail,
    ) -> Vec<&'a MethodRecord> {
        let mut seen = BTreeSet::new();
        detail
            .methods
            .iter()
            .filter(|m| m.defined_in == type_name || self.is_lifecycle_hook(&m.name))
            .filter(|m| {
                self.include_private || !m.name.starts_with('_') || self.is_lifecycle_hook(&m.name)
            })
            .filter(|m| seen.insert(m.name.as_str()))
            .collect()
    }

    /// Extract every owned Callable and every method of every owned Type.
    pub fn extract_all(&self, unit: &CollectedUnit) -> SignatureTable {
        let mut table = SignatureTable::default();

        for entity in unit.owned_of_kind(EntityKind::Callable) {
            let raw = entity.callable_detail().and_then(|c| c.raw.as_ref());
            let sig = self.from_raw(raw, false, &entity.name, &mut table.issues);
            table.callables.insert(entity.name.clone(), sig);
        }

        for entity in unit.owned_of_kind(EntityKind::Type) {
            let Some(detail) = entity.type_detail() else {
                continue;
            };
            let mut sigs = TypeSignatures::default();
            for method in self.enumerate_methods(&entity.name, detail) {
                let owner = format!("{}.{}", entity.name, method.name);
                let signature = self.from_raw(
                    method.raw.as_ref(),
                    method.kind.has_receiver(),
                    &owner,
                    &mut table.issues,
                );
                sigs.methods.insert(
                    method.name.clone(),
                    MethodSignature {
                        kind: method.kind,
                        defined_in: method.defined_in.clone(),
                        signature,
                    },
                );
            }
            table.types.insert(entity.name.clone(), sigs);
        }

        table
    }

    fn from_raw(
        &self,
        raw: Option<&RawSignature>,
        drop_receiver: bool,
        owner: &str,
        issues: &mut Vec<AnalysisIssue>,
    ) -> Signature {
        let Some(raw) = raw else {
            return Signature::default();
        };

        let mut params = raw.parameters.iter().peekable();
        if drop_receiver
            && params
                .peek()
                .is_some_and(|p| matches!(p.kind, ParamKind::Regular | ParamKind::PositionalOnly))
        {
            params.next();
        }

        let parameters = params
            .map(|p| Parameter {
                name: p.name.clone(),
                kind: p.kind,
                annotation: normalize_slot(p.annotation.as_deref(), owner, &p.name, issues),
                default: p.default.clone(),
            })
            .collect();

        Signature {
            parameters,
            return_annotation: normalize_slot(
                raw.return_annotation.as_deref(),
                owner,
                "return",
                issues,
            ),
        }
    }
}

/// Textual form used for token matching: quotes removed, whitespace trimmed.
pub fn normalize_annotation(raw: &str) -> Option<String> {
    let text: String = raw.chars().filter(|c| *c != '\'' && *c != '"').collect();
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn normalize_slot(
    raw: Option<&str>,
    owner: &str,
    slot: &str,
    issues: &mut Vec<AnalysisIssue>,
) -> Option<String> {
    let raw = raw?;
    let normalized = normalize_annotation(raw);
    if normalized.is_none() {
        issues.push(AnalysisIssue::UnresolvableAnnotation {
            entity: owner.to_string(),
            slot: slot.to_string(),
        });
    }
    normalized
}
