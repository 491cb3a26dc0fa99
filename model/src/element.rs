use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Wildcard used by `WorldModel::get_relations` and by abstract relation endpoints.
pub const WILDCARD: &str = "-1";

/// A scalar value held by a property or a `System`/`Config` parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scalar {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    /// The IRI-ish type tag used as a parameter's `valueType` when the bound value is scalar.
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Str(_) => "xsd:string",
            Scalar::Int(_) => "xsd:integer",
            Scalar::Float(_) => "xsd:float",
            Scalar::Bool(_) => "xsd:boolean",
        }
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Str(s) => write!(f, "{s}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Str(s.to_string())
    }
}
impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Str(s)
    }
}
impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}
impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}
impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

/// A typed edge in the world graph. `src`/`dst` are either grounded element
/// ids or, when `is_abstract` is set, a param key (or [`WILDCARD`]) standing
/// in for an as-yet-ungrounded element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    pub src: String,
    pub predicate: String,
    pub dst: String,
    pub truth: bool,
    pub is_abstract: bool,
}

impl Relation {
    pub fn new(src: impl Into<String>, predicate: impl Into<String>, dst: impl Into<String>, truth: bool) -> Self {
        Relation {
            src: src.into(),
            predicate: predicate.into(),
            dst: dst.into(),
            truth,
            is_abstract: false,
        }
    }

    pub fn abstract_(src: impl Into<String>, predicate: impl Into<String>, dst: impl Into<String>, truth: bool) -> Self {
        Relation {
            src: src.into(),
            predicate: predicate.into(),
            dst: dst.into(),
            truth,
            is_abstract: true,
        }
    }
}

/// A node in the world graph. An empty `id` marks it *abstract* (a template
/// standing in for any grounded element matching `type`/`properties`); a
/// non-empty id marks it *grounded*.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub label: String,
    pub properties: IndexMap<String, Vec<Scalar>>,
    pub relations: Vec<Relation>,
}

impl Element {
    pub fn new(type_: impl Into<String>, label: impl Into<String>) -> Self {
        Element {
            id: String::new(),
            type_: type_.into(),
            label: label.into(),
            properties: IndexMap::new(),
            relations: Vec::new(),
        }
    }

    pub fn grounded(id: impl Into<String>, type_: impl Into<String>, label: impl Into<String>) -> Self {
        Element {
            id: id.into(),
            type_: type_.into(),
            label: label.into(),
            properties: IndexMap::new(),
            relations: Vec::new(),
        }
    }

    pub fn is_abstract(&self) -> bool {
        self.id.is_empty()
    }

    /// A positive integer for grounded elements, a sentinel `<0` otherwise.
    ///
    /// Ids are free-form strings (e.g. `":apple-3"`); the trailing run of
    /// digits after the last `-` is used as the numeric id when present,
    /// falling back to `1` for a grounded-but-non-numeric id so the sign
    /// still distinguishes grounded from abstract.
    pub fn id_number(&self) -> i64 {
        if self.id.is_empty() {
            return -1;
        }
        self.id
            .rsplit('-')
            .next()
            .and_then(|tail| tail.parse::<i64>().ok())
            .filter(|n| *n >= 0)
            .unwrap_or(1)
    }

    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn has_property_value(&self, key: &str, value: &Scalar) -> bool {
        self.properties.get(key).is_some_and(|values| values.contains(value))
    }

    pub fn property(&self, key: &str) -> Option<&[Scalar]> {
        self.properties.get(key).map(Vec::as_slice)
    }

    /// The first value of a property, if set.
    pub fn property_value(&self, key: &str) -> Option<&Scalar> {
        self.properties.get(key).and_then(|v| v.first())
    }

    pub fn is_specified(&self, key: &str) -> bool {
        self.properties.get(key).is_some_and(|v| !v.is_empty())
    }

    /// Overwrites the property with a single value.
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<Scalar>) {
        self.properties.insert(key.into(), vec![value.into()]);
    }

    /// Appends a value to a multi-valued property, if not already present.
    pub fn append_property(&mut self, key: impl Into<String>, value: impl Into<Scalar>) {
        let value = value.into();
        let entry = self.properties.entry(key.into()).or_default();
        if !entry.contains(&value) {
            entry.push(value);
        }
    }

    pub fn remove_property(&mut self, key: &str) {
        self.properties.shift_remove(key);
    }

    pub fn remove_property_value(&mut self, key: &str, value: &Scalar) {
        if let Some(values) = self.properties.get_mut(key) {
            values.retain(|v| v != value);
            if values.is_empty() {
                self.properties.shift_remove(key);
            }
        }
    }

    pub fn has_relation(&self, src: &str, predicate: &str, dst: &str, truth: bool) -> bool {
        self.relations
            .iter()
            .any(|r| r.src == src && r.predicate == predicate && r.dst == dst && r.truth == truth)
    }

    pub fn add_relation(&mut self, src: impl Into<String>, predicate: impl Into<String>, dst: impl Into<String>, truth: bool, abstract_: bool) {
        let relation = Relation {
            src: src.into(),
            predicate: predicate.into(),
            dst: dst.into(),
            truth,
            is_abstract: abstract_,
        };
        if !self.relations.contains(&relation) {
            self.relations.push(relation);
        }
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_abstract() {
            write!(f, "{}(abstract:{})", self.type_, self.label)
        } else {
            write!(f, "{}({})", self.type_, self.id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abstract_vs_grounded() {
        let abstract_elem = Element::new("skiros:Object", "Obj");
        assert!(abstract_elem.is_abstract());
        assert!(abstract_elem.id_number() < 0);

        let grounded = Element::grounded(":apple-7", "skiros:Object", "Obj");
        assert!(!grounded.is_abstract());
        assert_eq!(grounded.id_number(), 7);
    }

    #[test]
    fn properties_round_trip() {
        let mut e = Element::new("skiros:Object", "Obj");
        assert!(!e.has_property("skiros:done"));
        e.set_property("skiros:done", true);
        assert!(e.has_property_value("skiros:done", &Scalar::Bool(true)));
        e.remove_property("skiros:done");
        assert!(!e.has_property("skiros:done"));

        e.append_property("skiros:color", "red");
        e.append_property("skiros:color", "red");
        assert_eq!(e.property("skiros:color").unwrap().len(), 1);
        e.append_property("skiros:color", "blue");
        assert_eq!(e.property("skiros:color").unwrap().len(), 2);
        e.remove_property_value("skiros:color", &Scalar::from("red"));
        assert_eq!(e.property("skiros:color").unwrap(), &[Scalar::from("blue")]);
    }
}
