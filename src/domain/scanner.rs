//! Source Scanner: resolves call expressions in an entity's source text against known names.
//!
//! Only two callee shapes are resolved: a bare identifier, and a single-level attribute access on
//! a bare identifier (resolved by the attribute name alone). Both `obj.method()` and
//! `module.function()` take the second path; the scanner cannot tell them apart.

use crate::domain::entity::{CollectedUnit, EntityKind, EntityRecord};
use crate::domain::error::AnalysisIssue;
use crate::domain::ports::{CallSite, CallSiteParser};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    /// Type names called like functions.
    pub instantiated: BTreeSet<String>,
    /// Callable names called.
    pub called: BTreeSet<String>,
}

impl ScanResult {
    pub fn is_empty(&self) -> bool {
        self.instantiated.is_empty() && self.called.is_empty()
    }
}

/// Names a call site may resolve to.
#[derive(Debug, Clone, Default)]
pub struct KnownEntities {
    pub types: BTreeSet<String>,
    pub callables: BTreeSet<String>,
}

impl KnownEntities {
    /// Owned Types and Callables of the unit.
    pub fn from_unit(unit: &CollectedUnit) -> Self {
        Self {
            types: unit
                .owned_of_kind(EntityKind::Type)
                .map(|e| e.name.clone())
                .collect(),
            callables: unit
                .owned_of_kind(EntityKind::Callable)
                .map(|e| e.name.clone())
                .collect(),
        }
    }

    pub fn kind_of(&self, name: &str) -> Option<EntityKind> {
        if self.types.contains(name) {
            Some(EntityKind::Type)
        } else if self.callables.contains(name) {
            Some(EntityKind::Callable)
        } else {
            None
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.kind_of(name).is_some()
    }
}

pub struct SourceScanner<'p> {
    parser: &'p dyn CallSiteParser,
}

impl<'p> SourceScanner<'p> {
    pub fn new(parser: &'p dyn CallSiteParser) -> Self {
        Self { parser }
    }

    /// Scan with the failure reason kept.
    pub fn try_scan(
        &self,
        entity: &EntityRecord,
        known: &KnownEntities,
    ) -> Result<ScanResult, AnalysisIssue> {
        let source = entity
            .source_text
            .as_deref()
            .ok_or_else(|| AnalysisIssue::MissingSource {
                entity: entity.name.clone(),
            })?;

        let sites = self
            .parser
            .call_sites(source)
            .map_err(|reason| AnalysisIssue::ParseFailure {
                entity: entity.name.clone(),
                reason,
            })?;

        let mut result = ScanResult::default();
        for site in sites {
            let name = match &site {
                CallSite::Bare(name) => name.as_str(),
                CallSite::Attribute { attribute, .. } => attribute.as_str(),
            };
            match known.kind_of(name) {
                Some(EntityKind::Type) => {
                    result.instantiated.insert(name.to_string());
                }
                Some(EntityKind::Callable) => {
                    result.called.insert(name.to_string());
                }
                _ => {}
            }
        }
        Ok(result)
    }

    /// Scan, degrading every failure to the empty result.
    pub fn scan(&self, entity: &EntityRecord, known: &KnownEntities) -> ScanResult {
        self.try_scan(entity, known).unwrap_or_else(|issue| {
            debug!(entity = %entity.name, %issue, "scan degraded to empty result");
            ScanResult::default()
        })
    }
}
