//! Small helpers over the tree-sitter Python grammar.

use crate::domain::signature::{MethodKind, ParamKind, RawParameter, RawSignature};
use anyhow::{Result, anyhow};
use tree_sitter::{Node, Parser, Tree};

pub fn new_parser() -> Result<Parser> {
    let mut parser = Parser::new();
    let language: tree_sitter::Language = tree_sitter_python::LANGUAGE.into();
    parser
        .set_language(&language)
        .map_err(|e| anyhow!("Failed to set language: {e}"))?;
    Ok(parser)
}

pub fn parse(source: &str) -> Result<Tree> {
    new_parser()?
        .parse(source, None)
        .ok_or_else(|| anyhow!("Failed to parse source code"))
}

/// Source text covered by `node`.
pub fn text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    source.get(node.start_byte()..node.end_byte()).unwrap_or("")
}

/// Position of the first syntax error below `node`, 1-based.
pub fn first_error(node: Node<'_>) -> Option<(usize, usize)> {
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        if current.is_error() || current.is_missing() {
            let pos = current.start_position();
            return Some((pos.row + 1, pos.column + 1));
        }
        if current.has_error() {
            let mut cursor = current.walk();
            let children: Vec<_> = current.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }
    None
}

/// Value of a string literal without prefix and quotes. Concatenated literals are joined.
pub fn string_value(node: Node<'_>, source: &str) -> Option<String> {
    match node.kind() {
        "concatenated_string" => {
            let mut cursor = node.walk();
            let parts: Option<Vec<String>> = node
                .named_children(&mut cursor)
                .map(|part| string_value(part, source))
                .collect();
            parts.map(|p| p.concat())
        }
        "string" => {
            let raw = text(node, source);
            let body = raw.trim_start_matches(|c: char| c.is_ascii_alphabetic());
            ["\"\"\"", "'''", "\"", "'"].into_iter().find_map(|quote| {
                let inner = body.strip_prefix(quote)?.strip_suffix(quote)?;
                Some(inner.to_string())
            })
        }
        _ => None,
    }
}

/// Docstring of a module or block: the first statement, when it is a bare string.
pub fn docstring(body: Node<'_>, source: &str) -> Option<String> {
    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|n| n.kind() != "comment")?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let expr = first.named_child(0)?;
    let doc = string_value(expr, source)?;
    let doc = doc.trim();
    if doc.is_empty() {
        None
    } else {
        Some(doc.to_string())
    }
}

/// Definition wrapped by a decorated definition, or the node itself.
pub fn unwrap_decorated(node: Node<'_>) -> Node<'_> {
    if node.kind() == "decorated_definition" {
        node.child_by_field_name("definition").unwrap_or(node)
    } else {
        node
    }
}

/// Decorator expressions of a decorated definition, as written (`staticmethod`, `x.setter`).
/// Call decorators report their callee (`dataclass` for `@dataclass(frozen=True)`).
pub fn decorator_names(outer: Node<'_>, source: &str) -> Vec<String> {
    if outer.kind() != "decorated_definition" {
        return Vec::new();
    }
    let mut cursor = outer.walk();
    outer
        .named_children(&mut cursor)
        .filter(|n| n.kind() == "decorator")
        .filter_map(|d| d.named_child(0))
        .map(|expr| {
            let callee = if expr.kind() == "call" {
                expr.child_by_field_name("function").unwrap_or(expr)
            } else {
                expr
            };
            text(callee, source).to_string()
        })
        .collect()
}

pub fn method_kind(decorators: &[String]) -> MethodKind {
    for decorator in decorators {
        match decorator.as_str() {
            "staticmethod" => return MethodKind::Static,
            "classmethod" => return MethodKind::Class,
            "property" | "functools.cached_property" | "cached_property" => {
                return MethodKind::Property;
            }
            d if d.ends_with(".setter") || d.ends_with(".getter") || d.ends_with(".deleter") => {
                return MethodKind::Property;
            }
            _ => {}
        }
    }
    MethodKind::Instance
}

pub fn is_async(function: Node<'_>) -> bool {
    function.child(0).is_some_and(|c| c.kind() == "async")
}

/// Parameters and return annotation of a `function_definition`, receiver included.
pub fn raw_signature(function: Node<'_>, source: &str) -> RawSignature {
    let parameters = function
        .child_by_field_name("parameters")
        .map(|p| parameters(p, source))
        .unwrap_or_default();
    let return_annotation = function
        .child_by_field_name("return_type")
        .map(|t| text(t, source).to_string());
    RawSignature {
        parameters,
        return_annotation,
    }
}

fn parameters(node: Node<'_>, source: &str) -> Vec<RawParameter> {
    let mut out: Vec<RawParameter> = Vec::new();
    let mut keyword_only = false;
    let mut cursor = node.walk();

    for child in node.named_children(&mut cursor) {
        let regular = if keyword_only {
            ParamKind::KeywordOnly
        } else {
            ParamKind::Regular
        };

        match child.kind() {
            "identifier" => out.push(RawParameter::new(text(child, source)).kind(regular)),
            "typed_parameter" => {
                let Some(inner) = child.named_child(0) else {
                    continue;
                };
                let kind = match inner.kind() {
                    "list_splat_pattern" => {
                        keyword_only = true;
                        ParamKind::VarPositional
                    }
                    "dictionary_splat_pattern" => ParamKind::VarKeyword,
                    _ => regular,
                };
                let mut param = RawParameter::new(splat_name(inner, source)).kind(kind);
                if let Some(t) = child.child_by_field_name("type") {
                    param = param.annotated(text(t, source));
                }
                out.push(param);
            }
            "default_parameter" | "typed_default_parameter" => {
                let Some(name) = child.child_by_field_name("name") else {
                    continue;
                };
                let mut param = RawParameter::new(text(name, source)).kind(regular);
                if let Some(t) = child.child_by_field_name("type") {
                    param = param.annotated(text(t, source));
                }
                if let Some(v) = child.child_by_field_name("value") {
                    param = param.default_value(text(v, source));
                }
                out.push(param);
            }
            "list_splat_pattern" => {
                keyword_only = true;
                out.push(
                    RawParameter::new(splat_name(child, source)).kind(ParamKind::VarPositional),
                );
            }
            "dictionary_splat_pattern" => {
                out.push(RawParameter::new(splat_name(child, source)).kind(ParamKind::VarKeyword));
            }
            "keyword_separator" => keyword_only = true,
            "positional_separator" => {
                for p in out.iter_mut().filter(|p| p.kind == ParamKind::Regular) {
                    p.kind = ParamKind::PositionalOnly;
                }
            }
            _ => {}
        }
    }
    out
}

fn splat_name<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    text(node, source).trim_start_matches('*').trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_function(source: &str) -> RawSignature {
        let tree = parse(source).unwrap();
        let root = tree.root_node();
        let func = unwrap_decorated(root.named_child(0).unwrap());
        raw_signature(func, source)
    }

    #[test]
    fn test_parameter_kinds_and_annotations() {
        let sig = first_function(
            "def f(a, b: int, /, c='x', *args: str, d: 'Cat' = None, **kw) -> List[Cat]:\n    pass\n",
        );
        let summary: Vec<_> = sig
            .parameters
            .iter()
            .map(|p| (p.name.as_str(), p.kind, p.annotation.as_deref(), p.default.as_deref()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("a", ParamKind::PositionalOnly, None, None),
                ("b", ParamKind::PositionalOnly, Some("int"), None),
                ("c", ParamKind::Regular, None, Some("'x'")),
                ("args", ParamKind::VarPositional, Some("str"), None),
                ("d", ParamKind::KeywordOnly, Some("'Cat'"), Some("None")),
                ("kw", ParamKind::VarKeyword, None, None),
            ]
        );
        assert_eq!(sig.return_annotation.as_deref(), Some("List[Cat]"));
    }

    #[test]
    fn test_bare_star_marks_keyword_only() {
        let sig = first_function("def g(x, *, y):\n    pass\n");
        assert_eq!(sig.parameters[1].name, "y");
        assert_eq!(sig.parameters[1].kind, ParamKind::KeywordOnly);
    }

    #[test]
    fn test_docstring_and_string_values() {
        let source = "\"\"\"Shop models.\n\nMore text.\"\"\"\nX = 1\n";
        let tree = parse(source).unwrap();
        let doc = docstring(tree.root_node(), source).unwrap();
        assert!(doc.starts_with("Shop models."));

        let source = "v = r'raw' 'tail'\n";
        let tree = parse(source).unwrap();
        let assignment = tree.root_node().named_child(0).unwrap().named_child(0).unwrap();
        let right = assignment.child_by_field_name("right").unwrap();
        assert_eq!(string_value(right, source).as_deref(), Some("rawtail"));
    }

    #[test]
    fn test_decorators_select_method_kind() {
        let source = "@functools.wraps(x)\n@staticmethod\ndef h():\n    pass\n";
        let tree = parse(source).unwrap();
        let outer = tree.root_node().named_child(0).unwrap();
        let names = decorator_names(outer, source);
        assert_eq!(names, vec!["functools.wraps", "staticmethod"]);
        assert_eq!(method_kind(&names), MethodKind::Static);
        assert_eq!(method_kind(&["value.setter".to_string()]), MethodKind::Property);
        assert_eq!(method_kind(&[]), MethodKind::Instance);
    }

    #[test]
    fn test_first_error_reports_position() {
        let tree = parse("def broken(:\n    pass\n").unwrap();
        assert!(first_error(tree.root_node()).is_some());
        let tree = parse("def fine():\n    pass\n").unwrap();
        assert!(first_error(tree.root_node()).is_none());
    }
}
