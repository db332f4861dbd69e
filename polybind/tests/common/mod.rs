//! Fixture hierarchies shared by the integration tests.
//!
//! ```text
//! geo::Shape {color}
//! ├── geo::Circle {radius}
//! ├── geo::Square {side}
//! ├── geo::Blob {}             (no own properties; not in geo_types)
//! └── geo::Polygon {vertices}
//!     ├── geo::Triangle {base, height}
//!     └── geo::Rect {width, height}
//!
//! fleet::Vehicle {wheels}      (own shape requires `wheels`)
//! ├── fleet::Car {doors}
//! └── fleet::Boat {hull}
//!
//! ui::Event {id}               (tree-backed)
//! └── ui::Click {x, y}
//!
//! tree::Node {children}        (recursive through deserialize_polymorphic)
//! ```

#![allow(dead_code)]

use polybind::{Bean, BeanType, JsonBean, TreeBacked, TypeMap, deserialize_polymorphic};
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// geo
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShapeFields {
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Circle {
    pub radius: f64,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Square {
    pub side: f64,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PolygonFields {
    pub vertices: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Triangle {
    pub vertices: u32,
    pub base: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Rect {
    pub vertices: u32,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Polygon {
    Triangle(Triangle),
    Rect(Rect),
    Plain(PolygonFields),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle(Circle),
    Square(Square),
    Polygon(Polygon),
    Plain(ShapeFields),
}

impl From<ShapeFields> for Shape {
    fn from(fields: ShapeFields) -> Self {
        Shape::Plain(fields)
    }
}

impl From<Circle> for Shape {
    fn from(circle: Circle) -> Self {
        Shape::Circle(circle)
    }
}

impl From<Square> for Shape {
    fn from(square: Square) -> Self {
        Shape::Square(square)
    }
}

impl From<Polygon> for Shape {
    fn from(polygon: Polygon) -> Self {
        Shape::Polygon(polygon)
    }
}

impl From<PolygonFields> for Polygon {
    fn from(fields: PolygonFields) -> Self {
        Polygon::Plain(fields)
    }
}

impl From<Triangle> for Polygon {
    fn from(triangle: Triangle) -> Self {
        Polygon::Triangle(triangle)
    }
}

impl From<Rect> for Polygon {
    fn from(rect: Rect) -> Self {
        Polygon::Rect(rect)
    }
}

/// Adds nothing to `Shape`, so its signature is empty.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Blob {
    pub color: Option<String>,
}

impl From<Blob> for Shape {
    fn from(blob: Blob) -> Self {
        Shape::Plain(ShapeFields { color: blob.color })
    }
}

impl Bean for Blob {
    const TYPE: &'static BeanType = &BeanType::subtype::<Blob, Shape>("geo::Blob", &["color"]);
}

impl<'de> Deserialize<'de> for Shape {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_polymorphic(deserializer)
    }
}

impl Bean for Shape {
    const TYPE: &'static BeanType =
        &BeanType::root_as::<Shape, ShapeFields>("geo::Shape", &["color"]);
}

impl Bean for Circle {
    // `color` is inherited and never discriminates
    const TYPE: &'static BeanType =
        &BeanType::subtype::<Circle, Shape>("geo::Circle", &["radius", "color"]);
}

impl Bean for Square {
    const TYPE: &'static BeanType = &BeanType::subtype::<Square, Shape>("geo::Square", &["side"]);
}

impl Bean for Polygon {
    const TYPE: &'static BeanType =
        &BeanType::subtype_as::<Polygon, PolygonFields, Shape>("geo::Polygon", &["vertices"]);
}

impl Bean for Triangle {
    const TYPE: &'static BeanType =
        &BeanType::subtype::<Triangle, Polygon>("geo::Triangle", &["base", "height"]);
}

impl Bean for Rect {
    const TYPE: &'static BeanType =
        &BeanType::subtype::<Rect, Polygon>("geo::Rect", &["width", "height"]);
}

/// Shape -> [Circle, Square, Polygon], Polygon -> [Triangle, Rect].
pub fn geo_types() -> TypeMap {
    TypeMap::builder()
        .register(Shape::TYPE, &[Circle::TYPE, Square::TYPE, Polygon::TYPE])
        .unwrap()
        .register(Polygon::TYPE, &[Triangle::TYPE, Rect::TYPE])
        .unwrap()
        .build()
        .unwrap()
}

#[derive(Debug, Deserialize)]
pub struct Drawing {
    pub title: String,
    pub shapes: Vec<Shape>,
    #[serde(default)]
    pub background: Option<Shape>,
}

// ============================================================================
// fleet
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct VehicleFields {
    pub wheels: u32,
}

#[derive(Debug, Deserialize)]
pub struct Car {
    pub wheels: u32,
    pub doors: u32,
}

#[derive(Debug, Deserialize)]
pub struct Boat {
    pub hull: String,
}

#[derive(Debug)]
pub enum Vehicle {
    Car(Car),
    Boat(Boat),
    Plain(VehicleFields),
}

impl From<VehicleFields> for Vehicle {
    fn from(fields: VehicleFields) -> Self {
        Vehicle::Plain(fields)
    }
}

impl From<Car> for Vehicle {
    fn from(car: Car) -> Self {
        Vehicle::Car(car)
    }
}

impl From<Boat> for Vehicle {
    fn from(boat: Boat) -> Self {
        Vehicle::Boat(boat)
    }
}

impl Bean for Vehicle {
    const TYPE: &'static BeanType =
        &BeanType::root_as::<Vehicle, VehicleFields>("fleet::Vehicle", &["wheels"]);
}

impl Bean for Car {
    const TYPE: &'static BeanType =
        &BeanType::subtype::<Car, Vehicle>("fleet::Car", &["wheels", "doors"]);
}

impl Bean for Boat {
    const TYPE: &'static BeanType = &BeanType::subtype::<Boat, Vehicle>("fleet::Boat", &["hull"]);
}

/// Vehicle has no `Deserialize` impl of its own; the field opts in.
#[derive(Debug, Deserialize)]
pub struct Garage {
    #[serde(deserialize_with = "deserialize_polymorphic")]
    pub parked: Vehicle,
}

pub fn fleet_types() -> TypeMap {
    TypeMap::builder()
        .register(Vehicle::TYPE, &[Car::TYPE, Boat::TYPE])
        .unwrap()
        .build()
        .unwrap()
}

// ============================================================================
// ui
// ============================================================================

#[derive(Debug, Deserialize, Serialize)]
pub struct EventFields {
    pub id: u64,
    #[serde(skip)]
    pub bean: JsonBean,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Click {
    pub id: u64,
    pub x: i32,
    pub y: i32,
    #[serde(skip)]
    pub bean: JsonBean,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Event {
    Click(Click),
    Plain(EventFields),
}

impl From<EventFields> for Event {
    fn from(fields: EventFields) -> Self {
        Event::Plain(fields)
    }
}

impl From<Click> for Event {
    fn from(click: Click) -> Self {
        Event::Click(click)
    }
}

impl TreeBacked for Event {
    fn bean(&self) -> &JsonBean {
        match self {
            Event::Click(click) => &click.bean,
            Event::Plain(fields) => &fields.bean,
        }
    }

    fn bean_mut(&mut self) -> &mut JsonBean {
        match self {
            Event::Click(click) => &mut click.bean,
            Event::Plain(fields) => &mut fields.bean,
        }
    }
}

impl Bean for Event {
    const TYPE: &'static BeanType = &BeanType::root_as::<Event, EventFields>("ui::Event", &["id"])
        .with_tree_slot::<Event>();
}

impl Bean for Click {
    const TYPE: &'static BeanType = &BeanType::subtype::<Click, Event>("ui::Click", &["x", "y"]);
}

pub fn ui_types() -> TypeMap {
    TypeMap::builder()
        .subtype::<Event, Click>()
        .unwrap()
        .build()
        .unwrap()
}

// ============================================================================
// tree
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct NodeFields {
    #[serde(default)]
    pub children: Vec<Node>,
}

#[derive(Debug)]
pub struct Node {
    pub children: Vec<Node>,
}

impl Node {
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(Node::depth).max().unwrap_or(0)
    }
}

impl From<NodeFields> for Node {
    fn from(fields: NodeFields) -> Self {
        Node {
            children: fields.children,
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_polymorphic(deserializer)
    }
}

impl Bean for Node {
    const TYPE: &'static BeanType =
        &BeanType::root_as::<Node, NodeFields>("tree::Node", &["children"]);
}

/// `{"children":[{"children":[ ... ]}]}`, `levels` objects deep.
pub fn nested_nodes(levels: usize) -> String {
    let mut text = String::from("{}");
    for _ in 1..levels {
        text = format!(r#"{{"children":[{text}]}}"#);
    }
    text
}
