//! Test fixture generators for integration tests.
#![allow(dead_code)]

use std::fs;
use std::path::Path;

use entity_relations::domain::entity::{
    BaseRef, CallableDetail, CollectedUnit, ConstantDetail, EntityRecord, MethodRecord, TypeDetail,
};
use entity_relations::domain::signature::{MethodKind, RawParameter, RawSignature};

pub const UNIT: &str = "shapes";

pub fn raw(params: &[(&str, Option<&str>)], ret: Option<&str>) -> RawSignature {
    RawSignature {
        parameters: params
            .iter()
            .map(|(name, ann)| match ann {
                Some(a) => RawParameter::new(*name).annotated(*a),
                None => RawParameter::new(*name),
            })
            .collect(),
        return_annotation: ret.map(String::from),
    }
}

pub fn type_entity(name: &str, bases: &[&str], source: Option<&str>) -> EntityRecord {
    EntityRecord::type_entity(
        name,
        UNIT,
        source.map(String::from),
        TypeDetail {
            bases: bases.iter().map(|b| BaseRef::new(*b, UNIT)).collect(),
            ..TypeDetail::default()
        },
    )
}

pub fn with_method(mut entity: EntityRecord, method: &str, signature: RawSignature) -> EntityRecord {
    let owner = entity.name.clone();
    if let entity_relations::domain::entity::EntityDetail::Type(detail) = &mut entity.detail {
        detail.methods.push(MethodRecord {
            name: method.to_string(),
            kind: MethodKind::Instance,
            defined_in: owner,
            raw: Some(signature),
            doc: None,
        });
    }
    entity
}

pub fn callable(name: &str, signature: RawSignature, source: Option<&str>) -> EntityRecord {
    EntityRecord::callable(
        name,
        UNIT,
        source.map(String::from),
        CallableDetail {
            raw: Some(signature),
            is_async: false,
        },
    )
}

pub const MAKE_SOURCE: &str = "def make(x: A) -> B:\n    return B()\n";

/// Types A and B(A), and `make(x: A) -> B` whose body calls `B()`.
pub fn basic_unit() -> CollectedUnit {
    let mut unit = CollectedUnit::new(UNIT);
    unit.insert(type_entity("A", &[], Some("class A:\n    pass\n")));
    unit.insert(type_entity("B", &["A"], Some("class B(A):\n    pass\n")));
    unit.insert(callable(
        "make",
        raw(&[("x", Some("A"))], Some("B")),
        Some(MAKE_SOURCE),
    ));
    unit
}

pub fn with_noise(mut unit: CollectedUnit) -> CollectedUnit {
    unit.insert(EntityRecord::constant(
        "LIMIT",
        UNIT,
        ConstantDetail {
            value_kind: "int".into(),
            preview: "10".into(),
        },
    ));
    unit.insert(EntityRecord::sub_unit("helpers", "shapes.helpers", None));
    unit.insert(EntityRecord::type_entity(
        "Foreign",
        "othermod",
        Some("class Foreign:\n    pass\n".into()),
        TypeDetail::default(),
    ));
    unit
}

/// Write `files` (relative path, content) under `root`, creating directories.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (rel, content) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
}

pub const GALLERY_INIT: &str = r#""""Drawing toolkit."""
from .shapes import Shape, Circle, Square, area_of
from .canvas import Canvas, render
from . import shapes

__version__ = "0.3.1"
__all__ = ["Canvas", "Circle", "Square", "render"]

DEFAULT_COLOR = "black"
"#;

pub const GALLERY_SHAPES: &str = r#"import math


class Shape:
    """Anything that can be drawn."""

    def area(self) -> float:
        return 0.0


class Circle(Shape):
    def __init__(self, radius: float):
        self.radius = radius

    def area(self) -> float:
        return math.pi * self.radius ** 2

    def scaled(self, factor: float) -> "Circle":
        return Circle(self.radius * factor)


class Square(Shape):
    def __init__(self, side: float):
        self.side = side


def area_of(shape: Shape) -> float:
    return shape.area()
"#;

pub const GALLERY_CANVAS: &str = r#"from .shapes import Shape, Circle, area_of


class Canvas:
    def __init__(self, width: int, height: int):
        self.width = width
        self.height = height
        self.items = []

    def add(self, shape: Shape) -> None:
        self.items.append(shape)

    @classmethod
    def with_circle(cls, radius: float) -> "Canvas":
        canvas = cls(100, 100)
        canvas.add(Circle(radius))
        return canvas


def render(canvas: Canvas) -> float:
    total = 0.0
    for item in canvas.items:
        total += area_of(item)
    return total
"#;

/// A small package `gallery` with two modules re-exported from `__init__`.
pub fn gallery(root: &Path) {
    write_tree(
        root,
        &[
            ("gallery/__init__.py", GALLERY_INIT),
            ("gallery/shapes.py", GALLERY_SHAPES),
            ("gallery/canvas.py", GALLERY_CANVAS),
        ],
    );
}
