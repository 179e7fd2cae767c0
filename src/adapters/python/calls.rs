use super::syntax::{first_error, parse, text};
use crate::domain::ports::{CallSite, CallSiteParser};
use tree_sitter::Node;

/// Call-site extraction backed by tree-sitter-python.
///
/// A parser is created per call; `tree_sitter::Parser` is not `Sync`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeSitterCallParser;

impl TreeSitterCallParser {
    pub fn new() -> Self {
        Self
    }
}

impl CallSiteParser for TreeSitterCallParser {
    fn call_sites(&self, source: &str) -> Result<Vec<CallSite>, String> {
        let tree = parse(source).map_err(|e| e.to_string())?;
        let root = tree.root_node();
        if root.has_error() {
            return Err(match first_error(root) {
                Some((line, column)) => format!("syntax error at {line}:{column}"),
                None => "syntax error".to_string(),
            });
        }

        let mut sites = Vec::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if node.kind() == "call" {
                if let Some(site) = node
                    .child_by_field_name("function")
                    .and_then(|callee| classify(callee, source))
                {
                    sites.push(site);
                }
            }
            let mut cursor = node.walk();
            let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
        Ok(sites)
    }
}

fn classify(callee: Node<'_>, source: &str) -> Option<CallSite> {
    match callee.kind() {
        "identifier" => Some(CallSite::Bare(text(callee, source).to_string())),
        "attribute" => {
            let object = callee.child_by_field_name("object")?;
            if object.kind() != "identifier" {
                return None;
            }
            let attribute = callee.child_by_field_name("attribute")?;
            Some(CallSite::Attribute {
                receiver: text(object, source).to_string(),
                attribute: text(attribute, source).to_string(),
            })
        }
        _ => None,
    }
}
