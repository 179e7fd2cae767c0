use super::syntax::{self, text};
use crate::adapters::fs::FileSourceReader;
use crate::config::AnalysisOptions;
use crate::domain::entity::{
    BaseRef, CallableDetail, CollectedUnit, ConstantDetail, EntityDetail, EntityKind,
    EntityRecord, MethodRecord, TypeDetail, UnitInfo,
};
use crate::domain::ports::{EntityCollector, SourceReader};
use crate::domain::signature::CONSTRUCTION_HOOK;
use anyhow::{Context, Result, bail};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use tree_sitter::{Node, Tree};

const PREVIEW_LIMIT: usize = 50;

/// Where a Python module lives and its dotted name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleLocation {
    pub name: String,
    pub file: PathBuf,
    pub is_package: bool,
    /// Directory absolute imports are resolved against.
    pub search_root: PathBuf,
}

impl ModuleLocation {
    /// Resolve a `.py`/`.pyi` file or a package directory.
    pub fn locate(target: &Path) -> Result<Self> {
        let target = target
            .canonicalize()
            .with_context(|| format!("Failed to resolve target: {}", target.display()))?;

        let (file, package_dir) = if target.is_dir() {
            let init = package_init(&target).with_context(|| {
                format!("Not a Python package (no __init__.py): {}", target.display())
            })?;
            (init, Some(target.clone()))
        } else {
            match target.extension().and_then(|e| e.to_str()) {
                Some("py") | Some("pyi") => {}
                _ => bail!("Not a Python source file: {}", target.display()),
            }
            let stem = file_stem(&target)?;
            let package_dir = (stem == "__init__")
                .then(|| target.parent().map(Path::to_path_buf))
                .flatten();
            (target.clone(), package_dir)
        };

        let start = package_dir.as_deref().unwrap_or(file.as_path());
        let mut parts = vec![match &package_dir {
            Some(dir) => dir_name(dir)?,
            None => file_stem(&file)?,
        }];
        let mut dir = start
            .parent()
            .map(Path::to_path_buf)
            .with_context(|| format!("No parent directory for {}", start.display()))?;

        while package_init(&dir).is_some() {
            let Some(up) = dir.parent().map(Path::to_path_buf) else {
                break;
            };
            parts.push(dir_name(&dir)?);
            dir = up;
        }
        parts.reverse();

        Ok(Self {
            name: parts.join("."),
            file,
            is_package: package_dir.is_some(),
            search_root: dir,
        })
    }

    /// Find the module `dotted` under `search_root`, if it exists on disk.
    pub fn find(search_root: &Path, dotted: &str) -> Option<Self> {
        if dotted.is_empty() {
            return None;
        }
        let mut base = search_root.to_path_buf();
        for part in dotted.split('.') {
            base.push(part);
        }

        if let Some(init) = package_init(&base) {
            return Some(Self {
                name: dotted.to_string(),
                file: init,
                is_package: true,
                search_root: search_root.to_path_buf(),
            });
        }
        ["py", "pyi"].into_iter().find_map(|ext| {
            let file = base.with_extension(ext);
            file.is_file().then(|| Self {
                name: dotted.to_string(),
                file,
                is_package: false,
                search_root: search_root.to_path_buf(),
            })
        })
    }

    pub fn is_stub(&self) -> bool {
        self.file.extension().is_some_and(|e| e == "pyi")
    }

    /// Absolute name for `from <dots><module> import ...` written in this module.
    fn absolute(&self, level: usize, module: &str) -> Option<String> {
        if level == 0 {
            return Some(module.to_string());
        }
        let package = if self.is_package {
            self.name.as_str()
        } else {
            self.name.rsplit_once('.').map_or("", |(p, _)| p)
        };
        let mut parts: Vec<&str> = package.split('.').filter(|p| !p.is_empty()).collect();
        for _ in 1..level {
            parts.pop()?;
        }
        if !module.is_empty() {
            parts.push(module);
        }
        (!parts.is_empty()).then(|| parts.join("."))
    }
}

fn package_init(dir: &Path) -> Option<PathBuf> {
    ["__init__.py", "__init__.pyi"]
        .into_iter()
        .map(|f| dir.join(f))
        .find(|p| p.is_file())
}

fn dir_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(String::from)
        .with_context(|| format!("Invalid directory name: {}", path.display()))
}

fn file_stem(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|n| n.to_str())
        .map(String::from)
        .with_context(|| format!("Invalid file name: {}", path.display()))
}

fn is_private(name: &str) -> bool {
    name.starts_with('_')
}

fn is_dunder(name: &str) -> bool {
    name.len() > 4 && name.starts_with("__") && name.ends_with("__")
}

#[derive(Debug, Clone, Copy)]
enum Definition<'t> {
    Class { outer: Node<'t>, node: Node<'t> },
    Function { outer: Node<'t>, node: Node<'t> },
    Value { right: Node<'t> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Import {
    /// `import a.b` binds `a`; `import a.b as x` binds `x` to `a.b`.
    Module { local: String, module: String },
    /// `from module import name as local`, module already absolute.
    From {
        module: String,
        name: String,
        local: String,
    },
    /// `from module import *`
    Wildcard { module: String },
}

/// Own bases and methods of a Type, keyed by (defining unit, type name).
type DeclaredTypes = BTreeMap<(String, String), (Vec<BaseRef>, Vec<MethodRecord>)>;

/// Top-level view of one parsed module.
struct ModuleSyntax<'t> {
    location: &'t ModuleLocation,
    source: &'t str,
    root: Node<'t>,
    include_private: bool,
    definitions: BTreeMap<String, Definition<'t>>,
    imports: Vec<Import>,
    /// Local name -> dotted name it was imported as.
    imported: BTreeMap<String, String>,
}

impl<'t> ModuleSyntax<'t> {
    fn new(
        location: &'t ModuleLocation,
        source: &'t str,
        tree: &'t Tree,
        include_private: bool,
    ) -> Self {
        let mut module = Self {
            location,
            source,
            root: tree.root_node(),
            include_private,
            definitions: BTreeMap::new(),
            imports: Vec::new(),
            imported: BTreeMap::new(),
        };

        let root = module.root;
        let mut cursor = root.walk();
        for statement in root.named_children(&mut cursor) {
            match statement.kind() {
                "class_definition" | "function_definition" | "decorated_definition" => {
                    module.define(statement)
                }
                "expression_statement" => module.assign(statement),
                "import_statement" => module.import(statement),
                "import_from_statement" => module.import_from(statement),
                _ => {}
            }
        }

        let imported = module
            .imports
            .iter()
            .filter_map(|import| match import {
                Import::Module { local, module } => Some((local.clone(), module.clone())),
                Import::From {
                    module,
                    name,
                    local,
                } => Some((local.clone(), format!("{module}.{name}"))),
                Import::Wildcard { .. } => None,
            })
            .collect();
        module.imported = imported;
        module
    }

    fn define(&mut self, outer: Node<'t>) {
        let node = syntax::unwrap_decorated(outer);
        let Some(name) = node.child_by_field_name("name") else {
            return;
        };
        let definition = match node.kind() {
            "class_definition" => Definition::Class { outer, node },
            "function_definition" => Definition::Function { outer, node },
            _ => return,
        };
        self.definitions
            .insert(text(name, self.source).to_string(), definition);
    }

    fn assign(&mut self, statement: Node<'t>) {
        let Some(assignment) = statement.named_child(0) else {
            return;
        };
        if assignment.kind() != "assignment" {
            return;
        }
        let (Some(left), Some(right)) = (
            assignment.child_by_field_name("left"),
            assignment.child_by_field_name("right"),
        ) else {
            return;
        };
        if left.kind() == "identifier" {
            self.definitions.insert(
                text(left, self.source).to_string(),
                Definition::Value { right },
            );
        }
    }

    fn import(&mut self, statement: Node<'t>) {
        let mut cursor = statement.walk();
        for name in statement.children_by_field_name("name", &mut cursor) {
            let import = match name.kind() {
                "dotted_name" => {
                    let full = text(name, self.source);
                    let head = full.split('.').next().unwrap_or(full).to_string();
                    Import::Module {
                        local: head.clone(),
                        module: head,
                    }
                }
                "aliased_import" => {
                    let (Some(module), Some(alias)) = (
                        name.child_by_field_name("name"),
                        name.child_by_field_name("alias"),
                    ) else {
                        continue;
                    };
                    Import::Module {
                        local: text(alias, self.source).to_string(),
                        module: text(module, self.source).to_string(),
                    }
                }
                _ => continue,
            };
            self.imports.push(import);
        }
    }

    fn import_from(&mut self, statement: Node<'t>) {
        let Some(module_node) = statement.child_by_field_name("module_name") else {
            return;
        };
        let (level, module) = if module_node.kind() == "relative_import" {
            let mut cursor = module_node.walk();
            let mut level = 0;
            let mut dotted = "";
            for part in module_node.named_children(&mut cursor) {
                match part.kind() {
                    "import_prefix" => level = text(part, self.source).matches('.').count(),
                    "dotted_name" => dotted = text(part, self.source),
                    _ => {}
                }
            }
            (level, dotted)
        } else {
            (0, text(module_node, self.source))
        };

        let Some(module) = self.location.absolute(level, module) else {
            debug!(module = %self.location.name, level, "relative import escapes the package");
            return;
        };

        let mut cursor = statement.walk();
        if statement
            .named_children(&mut cursor)
            .any(|child| child.kind() == "wildcard_import")
        {
            self.imports.push(Import::Wildcard { module });
            return;
        }

        for name in statement.children_by_field_name("name", &mut cursor) {
            let (imported, local) = match name.kind() {
                "dotted_name" => {
                    let n = text(name, self.source);
                    (n, n)
                }
                "aliased_import" => {
                    let (Some(n), Some(alias)) = (
                        name.child_by_field_name("name"),
                        name.child_by_field_name("alias"),
                    ) else {
                        continue;
                    };
                    (text(n, self.source), text(alias, self.source))
                }
                _ => continue,
            };
            self.imports.push(Import::From {
                module: module.clone(),
                name: imported.to_string(),
                local: local.to_string(),
            });
        }
    }

    fn info(&self) -> UnitInfo {
        UnitInfo {
            name: self.location.name.clone(),
            location: Some(self.location.file.display().to_string()),
            description: syntax::docstring(self.root, self.source)
                .and_then(|d| d.lines().next().map(|l| l.trim().to_string())),
            version: self.string_value_of("__version__"),
            author: self.string_value_of("__author__"),
            exports: self.exports(),
        }
    }

    fn string_value_of(&self, name: &str) -> Option<String> {
        match self.definitions.get(name)? {
            Definition::Value { right } => syntax::string_value(*right, self.source),
            _ => None,
        }
    }

    /// Names bound by `from <this module> import *`: `__all__` when present, else every
    /// top-level definition without a leading underscore.
    fn star_names(&self) -> Vec<String> {
        let exports = self.exports();
        if !exports.is_empty() {
            return exports;
        }
        self.definitions
            .keys()
            .filter(|name| !is_private(name))
            .cloned()
            .collect()
    }

    fn exports(&self) -> Vec<String> {
        let Some(Definition::Value { right }) = self.definitions.get("__all__") else {
            return Vec::new();
        };
        let mut cursor = right.walk();
        right
            .named_children(&mut cursor)
            .filter_map(|item| syntax::string_value(item, self.source))
            .collect()
    }

    fn entity(&self, local: &str, definition: Definition<'t>) -> Option<EntityRecord> {
        match definition {
            Definition::Class { outer, node } => Some(self.class_entity(local, outer, node)),
            Definition::Function { outer, node } => {
                let detail = CallableDetail {
                    raw: Some(syntax::raw_signature(node, self.source)),
                    is_async: syntax::is_async(node),
                };
                Some(
                    EntityRecord::callable(
                        local,
                        &self.location.name,
                        self.source_of(outer),
                        detail,
                    )
                    .with_doc(self.body_doc(node)),
                )
            }
            Definition::Value { right } => self.constant_entity(local, right),
        }
    }

    fn source_of(&self, outer: Node<'_>) -> Option<String> {
        (!self.location.is_stub()).then(|| text(outer, self.source).to_string())
    }

    fn body_doc(&self, node: Node<'_>) -> Option<String> {
        node.child_by_field_name("body")
            .and_then(|body| syntax::docstring(body, self.source))
    }

    fn class_entity(&self, local: &str, outer: Node<'t>, node: Node<'t>) -> EntityRecord {
        let mut detail = TypeDetail {
            bases: self.bases(node),
            ..TypeDetail::default()
        };

        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for statement in body.named_children(&mut cursor) {
                match statement.kind() {
                    "function_definition" | "decorated_definition" => {
                        let def = syntax::unwrap_decorated(statement);
                        if def.kind() != "function_definition" {
                            continue;
                        }
                        let Some(name) = def.child_by_field_name("name") else {
                            continue;
                        };
                        let name = text(name, self.source).to_string();
                        let decorators = syntax::decorator_names(statement, self.source);
                        if name == CONSTRUCTION_HOOK && detail.instance_attributes.is_empty() {
                            detail.instance_attributes = self.instance_attributes(def);
                        }
                        detail.methods.push(MethodRecord {
                            kind: syntax::method_kind(&decorators),
                            defined_in: local.to_string(),
                            raw: Some(syntax::raw_signature(def, self.source)),
                            doc: self.body_doc(def),
                            name,
                        });
                    }
                    "expression_statement" => {
                        let Some(assignment) = statement.named_child(0) else {
                            continue;
                        };
                        if assignment.kind() != "assignment" {
                            continue;
                        }
                        let Some(left) = assignment.child_by_field_name("left") else {
                            continue;
                        };
                        if left.kind() != "identifier" {
                            continue;
                        }
                        let name = text(left, self.source).to_string();
                        if (self.include_private || !is_private(&name))
                            && !detail.class_attributes.contains(&name)
                        {
                            detail.class_attributes.push(name);
                        }
                    }
                    _ => {}
                }
            }
        }

        EntityRecord::type_entity(local, &self.location.name, self.source_of(outer), detail)
            .with_doc(self.body_doc(node))
    }

    fn bases(&self, class: Node<'_>) -> Vec<BaseRef> {
        let Some(arguments) = class.child_by_field_name("superclasses") else {
            return Vec::new();
        };
        let mut cursor = arguments.walk();
        arguments
            .named_children(&mut cursor)
            .filter_map(|argument| self.base_ref(argument))
            .collect()
    }

    fn base_ref(&self, expr: Node<'_>) -> Option<BaseRef> {
        match expr.kind() {
            "identifier" => Some(self.qualify(text(expr, self.source))),
            "attribute" => {
                let object = text(expr.child_by_field_name("object")?, self.source);
                let attribute = text(expr.child_by_field_name("attribute")?, self.source);
                let (head, rest) = match object.split_once('.') {
                    Some((head, rest)) => (head, Some(rest)),
                    None => (object, None),
                };
                let qualifier = match (self.imported.get(head), rest) {
                    (Some(module), Some(rest)) => format!("{module}.{rest}"),
                    (Some(module), None) => module.clone(),
                    (None, _) => object.to_string(),
                };
                Some(BaseRef::new(attribute, qualifier))
            }
            "subscript" => self.base_ref(expr.child_by_field_name("value")?),
            _ => None,
        }
    }

    fn qualify(&self, name: &str) -> BaseRef {
        if matches!(self.definitions.get(name), Some(Definition::Class { .. })) {
            return BaseRef::new(name, &self.location.name);
        }
        match self.imported.get(name) {
            Some(qualified) => match qualified.rsplit_once('.') {
                Some((module, _)) => BaseRef::new(name, module),
                None => BaseRef::new(qualified.as_str(), ""),
            },
            None => BaseRef::new(name, "builtins"),
        }
    }

    /// Attributes assigned on the receiver anywhere in a construction hook body.
    fn instance_attributes(&self, function: Node<'_>) -> Vec<String> {
        let receiver = function
            .child_by_field_name("parameters")
            .and_then(|p| p.named_child(0))
            .filter(|p| p.kind() == "identifier")
            .map(|p| text(p, self.source))
            .unwrap_or("self");
        let Some(body) = function.child_by_field_name("body") else {
            return Vec::new();
        };

        let mut found = Vec::new();
        let mut stack = vec![body];
        while let Some(node) = stack.pop() {
            match node.kind() {
                "function_definition" | "class_definition" | "lambda" => continue,
                "assignment" | "augmented_assignment" => {
                    if let Some(left) = node.child_by_field_name("left") {
                        self.receiver_targets(left, receiver, &mut found);
                    }
                }
                _ => {}
            }
            let mut cursor = node.walk();
            let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
        found
    }

    fn receiver_targets(&self, target: Node<'_>, receiver: &str, found: &mut Vec<String>) {
        match target.kind() {
            "attribute" => {
                let (Some(object), Some(attribute)) = (
                    target.child_by_field_name("object"),
                    target.child_by_field_name("attribute"),
                ) else {
                    return;
                };
                if object.kind() != "identifier" || text(object, self.source) != receiver {
                    return;
                }
                let name = text(attribute, self.source).to_string();
                if (self.include_private || !is_private(&name)) && !found.contains(&name) {
                    found.push(name);
                }
            }
            "pattern_list" | "tuple_pattern" | "list_pattern" => {
                let mut cursor = target.walk();
                for element in target.named_children(&mut cursor) {
                    self.receiver_targets(element, receiver, found);
                }
            }
            _ => {}
        }
    }

    fn constant_entity(&self, local: &str, right: Node<'_>) -> Option<EntityRecord> {
        let literal = |kind: &str| Some((kind.to_string(), text(right, self.source).to_string()));
        let (value_kind, value) = match right.kind() {
            "string" | "concatenated_string" => {
                ("str".to_string(), syntax::string_value(right, self.source)?)
            }
            "integer" => literal("int")?,
            "float" => literal("float")?,
            "true" | "false" => literal("bool")?,
            "list" | "list_comprehension" => literal("list")?,
            "dictionary" | "dictionary_comprehension" => literal("dict")?,
            "tuple" => literal("tuple")?,
            "set" | "set_comprehension" => literal("set")?,
            "unary_operator" => match right.child_by_field_name("argument")?.kind() {
                "integer" => literal("int")?,
                "float" => literal("float")?,
                _ => return None,
            },
            _ => return None,
        };

        Some(EntityRecord::constant(
            local,
            &self.location.name,
            ConstantDetail {
                value_kind,
                preview: preview(&value),
            },
        ))
    }
}

fn preview(value: &str) -> String {
    if value.chars().count() > PREVIEW_LIMIT {
        let head: String = value.chars().take(PREVIEW_LIMIT).collect();
        format!("{head}...")
    } else {
        value.to_string()
    }
}

/// A module other than the target, parsed on first use.
struct ParsedModule {
    location: ModuleLocation,
    source: String,
    tree: Tree,
}

/// Collects the entities of one Python module or package with tree-sitter.
pub struct PythonCollector {
    target: PathBuf,
    options: AnalysisOptions,
    reader: Arc<dyn SourceReader>,
}

impl PythonCollector {
    pub fn new(target: impl Into<PathBuf>, options: AnalysisOptions) -> Self {
        Self::with_reader(target, options, Arc::new(FileSourceReader::new()))
    }

    pub fn with_reader(
        target: impl Into<PathBuf>,
        options: AnalysisOptions,
        reader: Arc<dyn SourceReader>,
    ) -> Self {
        Self {
            target: target.into(),
            options,
            reader,
        }
    }

    fn visible(&self, name: &str) -> bool {
        !is_dunder(name) && (self.options.include_private || !is_private(name))
    }

    fn parse_module(&self, location: ModuleLocation) -> Result<ParsedModule> {
        let source = self.reader.read(&location.file)?;
        let tree = syntax::parse(&source)
            .with_context(|| format!("Failed to parse {}", location.file.display()))?;
        if let Some((line, column)) = syntax::first_error(tree.root_node()) {
            warn!(
                file = %location.file.display(),
                line,
                column,
                "syntax errors in module, collecting what parsed"
            );
        }
        Ok(ParsedModule {
            location,
            source,
            tree,
        })
    }

    fn follow_import(
        &self,
        import: &Import,
        search_root: &Path,
        unit: &mut CollectedUnit,
        parsed: &mut HashMap<String, Option<ParsedModule>>,
    ) {
        match import {
            Import::Module { local, module } => {
                if !self.visible(local) {
                    return;
                }
                let location = ModuleLocation::find(search_root, module)
                    .map(|m| m.file.display().to_string());
                unit.insert(EntityRecord::sub_unit(local, module, location));
            }
            Import::From {
                module,
                name,
                local,
            } => {
                if !self.visible(local) {
                    return;
                }
                let qualified = format!("{module}.{name}");
                if let Some(sub) = ModuleLocation::find(search_root, &qualified) {
                    let location = Some(sub.file.display().to_string());
                    unit.insert(EntityRecord::sub_unit(local, &qualified, location));
                    return;
                }

                let entity = self.module_in(module, search_root, parsed).and_then(|m| {
                    let syntax = ModuleSyntax::new(
                        &m.location,
                        &m.source,
                        &m.tree,
                        self.options.include_private,
                    );
                    let definition = *syntax.definitions.get(name)?;
                    syntax.entity(local, definition)
                });

                match entity {
                    Some(entity) => unit.insert(entity),
                    None => {
                        debug!(local = %local, qualified = %qualified, "unresolved import");
                        unit.unresolved_imports.insert(local.clone(), qualified);
                    }
                }
            }
            Import::Wildcard { module } => {
                let Some(source_module) = self.module_in(module, search_root, parsed) else {
                    debug!(module = %module, "star import from a module outside the search root");
                    return;
                };
                let syntax = ModuleSyntax::new(
                    &source_module.location,
                    &source_module.source,
                    &source_module.tree,
                    self.options.include_private,
                );
                let listed = !syntax.exports().is_empty();
                for name in syntax.star_names() {
                    if !self.visible(&name) {
                        continue;
                    }
                    let entity = syntax
                        .definitions
                        .get(&name)
                        .and_then(|definition| syntax.entity(&name, *definition));
                    match entity {
                        Some(entity) => unit.insert(entity),
                        // Names listed in `__all__` but bound some other way.
                        None if listed && !syntax.definitions.contains_key(&name) => {
                            let qualified = format!("{module}.{name}");
                            debug!(local = %name, qualified = %qualified, "unresolved import");
                            unit.unresolved_imports.insert(name, qualified);
                        }
                        None => {}
                    }
                }
            }
        }
    }

    /// Parsed module `module`, read on first use. `None` when it is not under `search_root`
    /// or does not parse.
    fn module_in<'c>(
        &self,
        module: &str,
        search_root: &Path,
        parsed: &'c mut HashMap<String, Option<ParsedModule>>,
    ) -> Option<&'c ParsedModule> {
        parsed
            .entry(module.to_string())
            .or_insert_with(|| {
                let location = ModuleLocation::find(search_root, module)?;
                self.parse_module(location)
                    .map_err(|e| warn!(module = %module, error = %e, "cannot follow import"))
                    .ok()
            })
            .as_ref()
    }

    /// Bases and own methods of every Type in the unit and of every class reachable through
    /// their bases, whether or not the unit re-exports it.
    fn declared_types(
        &self,
        unit: &CollectedUnit,
        search_root: &Path,
        parsed: &mut HashMap<String, Option<ParsedModule>>,
    ) -> DeclaredTypes {
        let mut declared: DeclaredTypes = unit
            .entities
            .values()
            .filter_map(|e| {
                let detail = e.type_detail()?;
                Some((
                    (e.defining_unit.clone(), e.name.clone()),
                    (detail.bases.clone(), detail.methods.clone()),
                ))
            })
            .collect();

        let mut pending: Vec<BaseRef> = declared
            .values()
            .flat_map(|(bases, _)| bases.iter().cloned())
            .collect();
        let mut tried = BTreeSet::new();
        while let Some(base) = pending.pop() {
            let key = (base.qualifier.clone(), base.name.clone());
            if declared.contains_key(&key) || !tried.insert(key.clone()) {
                continue;
            }
            let Some(module) = self.module_in(&base.qualifier, search_root, parsed) else {
                continue;
            };
            let syntax = ModuleSyntax::new(
                &module.location,
                &module.source,
                &module.tree,
                self.options.include_private,
            );
            let Some(Definition::Class { outer, node }) = syntax.definitions.get(&base.name).copied()
            else {
                continue;
            };
            if let EntityDetail::Type(detail) = syntax.class_entity(&base.name, outer, node).detail {
                debug!(base = %base.qualified(), "resolved base outside the unit");
                pending.extend(detail.bases.iter().cloned());
                declared.insert(key, (detail.bases, detail.methods));
            }
        }
        declared
    }
}

impl EntityCollector for PythonCollector {
    fn collect(&self) -> Result<CollectedUnit> {
        let location = ModuleLocation::locate(&self.target)?;
        let search_root = location.search_root.clone();
        let target = self.parse_module(location)?;
        let module = ModuleSyntax::new(
            &target.location,
            &target.source,
            &target.tree,
            self.options.include_private,
        );

        let mut unit = CollectedUnit::new(&target.location.name);
        unit.info = module.info();

        // Local definitions shadow imports of the same name.
        let mut parsed = HashMap::new();
        for import in &module.imports {
            self.follow_import(import, &search_root, &mut unit, &mut parsed);
        }
        for (name, definition) in &module.definitions {
            if !self.visible(name) {
                continue;
            }
            if let Some(entity) = module.entity(name, *definition) {
                unit.unresolved_imports.remove(name);
                unit.insert(entity);
            }
        }

        let declared = self.declared_types(&unit, &search_root, &mut parsed);
        inherit_methods(&mut unit, &declared);

        info!(
            unit = unit.name(),
            types = unit.count_of_kind(EntityKind::Type),
            callables = unit.count_of_kind(EntityKind::Callable),
            constants = unit.count_of_kind(EntityKind::Constant),
            unresolved = unit.unresolved_imports.len(),
            "collected Python unit"
        );
        Ok(unit)
    }
}

/// Append methods inherited from declared Types, depth first in base declaration order. Names
/// already present are kept.
fn inherit_methods(unit: &mut CollectedUnit, declared: &DeclaredTypes) {
    for entity in unit.entities.values_mut() {
        let EntityDetail::Type(detail) = &mut entity.detail else {
            continue;
        };
        let mut seen: BTreeSet<String> = detail.methods.iter().map(|m| m.name.clone()).collect();
        let mut visited = BTreeSet::from([(entity.defining_unit.clone(), entity.name.clone())]);
        let mut stack: Vec<BaseRef> = detail.bases.iter().rev().cloned().collect();

        while let Some(base) = stack.pop() {
            let key = (base.qualifier.clone(), base.name.clone());
            let Some((bases, methods)) = declared.get(&key) else {
                continue;
            };
            if !visited.insert(key) {
                continue;
            }
            for method in methods {
                if seen.insert(method.name.clone()) {
                    detail.methods.push(method.clone());
                }
            }
            stack.extend(bases.iter().rev().cloned());
        }
    }
}
