use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::element::{Element, Scalar};
use crate::error::{Result, SkirosError};

/// Binding discipline for a [`Parameter`].
///
/// `Required` must be specified before a skill may execute; the others are
/// never checked by `ParamHandler::all_required_specified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    Required,
    Optional,
    Inferred,
    Config,
    System,
}

/// What a [`Parameter`] is bound to: a world element, or a bare scalar
/// (used for `Config`/`System` parameters that never reference the world).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Element(Element),
    Scalar(Scalar),
}

impl Value {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Value::Element(e) => Some(e),
            Value::Scalar(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Value::Element(e) => Some(e),
            Value::Scalar(_) => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            Value::Element(_) => None,
        }
    }

    fn value_type(&self) -> String {
        match self {
            Value::Element(e) => e.type_.clone(),
            Value::Scalar(s) => s.type_name().to_string(),
        }
    }
}

impl From<Element> for Value {
    fn from(e: Element) -> Self {
        Value::Element(e)
    }
}
impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Scalar(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub key: String,
    pub param_type: ParamType,
    pub value_type: String,
    pub value: Value,
    pub specified: bool,
}

impl Parameter {
    pub fn new(key: impl Into<String>, value: Value, param_type: ParamType) -> Self {
        let value_type = value.value_type();
        Parameter {
            key: key.into(),
            param_type,
            value_type,
            specified: match &value {
                Value::Element(e) => !e.is_abstract(),
                Value::Scalar(_) => true,
            },
            value,
        }
    }
}

/// Ordered `key -> Parameter` map owned by the behavior-tree node it parameterises.
///
/// Keys are unique per handler; `specify` on an unknown key is a programmer
/// error ([`SkirosError::UnknownParam`]), matching the source system where
/// only declared keys can ever be bound.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParamHandler {
    params: IndexMap<String, Parameter>,
}

impl ParamHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_param(&mut self, key: impl Into<String>, value: impl Into<Value>, param_type: ParamType) {
        let key = key.into();
        let param = Parameter::new(key.clone(), value.into(), param_type);
        self.params.insert(key, param);
    }

    pub fn has_param(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn get_param(&self, key: &str) -> Result<&Parameter> {
        self.params.get(key).ok_or_else(|| SkirosError::UnknownParam(key.to_string()))
    }

    pub fn get_param_mut(&mut self, key: &str) -> Result<&mut Parameter> {
        self.params.get_mut(key).ok_or_else(|| SkirosError::UnknownParam(key.to_string()))
    }

    pub fn get_param_value(&self, key: &str) -> Result<&Value> {
        self.get_param(key).map(|p| &p.value)
    }

    pub fn get_element(&self, key: &str) -> Result<&Element> {
        self.get_param_value(key)?
            .as_element()
            .ok_or_else(|| SkirosError::InternalInvariant(format!("parameter `{key}` is not bound to an element")))
    }

    /// Binds `key` to `value`, overwriting silently if already specified.
    pub fn specify(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        let param = self.get_param_mut(key)?;
        param.value = value.into();
        param.specified = true;
        Ok(())
    }

    /// Re-initializes handler values from `defaults`; keys of this handler
    /// that are absent from `defaults` are left bound but marked unspecified.
    pub fn reset(&mut self, defaults: &IndexMap<String, Value>) {
        for (key, param) in self.params.iter_mut() {
            match defaults.get(key) {
                Some(value) => {
                    param.value = value.clone();
                    param.specified = true;
                }
                None => param.specified = false,
            }
        }
    }

    pub fn get_param_map(&self) -> &IndexMap<String, Parameter> {
        &self.params
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    /// True iff every `Required` parameter has been specified.
    pub fn all_required_specified(&self) -> bool {
        self.params
            .values()
            .all(|p| p.param_type != ParamType::Required || p.specified)
    }

    /// Renames a key in place, used when a child's params are folded into
    /// its parent's keyspace at tree-assembly time.
    pub fn remap(&mut self, old_key: &str, new_key: &str) {
        if let Some(mut param) = self.params.shift_remove(old_key) {
            param.key = new_key.to_string();
            self.params.insert(new_key.to_string(), param);
        }
    }

    pub fn print_state(&self) -> String {
        self.params
            .values()
            .map(|p| {
                let binding = match &p.value {
                    Value::Element(e) if e.is_abstract() => format!("<{}>", e.type_),
                    Value::Element(e) => e.to_string(),
                    Value::Scalar(s) => s.to_string(),
                };
                format!("{}[{:?}]={}({})", p.key, p.param_type, binding, p.specified)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_param_errors() {
        let ph = ParamHandler::new();
        assert!(matches!(ph.get_param("Missing"), Err(SkirosError::UnknownParam(_))));
    }

    #[test]
    fn specify_overwrites_silently() {
        let mut ph = ParamHandler::new();
        ph.add_param("Target", Element::new("skiros:Object", "Target"), ParamType::Required);
        assert!(!ph.all_required_specified());
        ph.specify("Target", Element::grounded(":o-1", "skiros:Object", "Target")).unwrap();
        assert!(ph.all_required_specified());
        ph.specify("Target", Element::grounded(":o-2", "skiros:Object", "Target")).unwrap();
        assert_eq!(ph.get_element("Target").unwrap().id, ":o-2");
    }

    #[test]
    fn remap_preserves_binding() {
        let mut ph = ParamHandler::new();
        ph.add_param("Child.Obj", Element::grounded(":o-1", "skiros:Object", "Obj"), ParamType::Required);
        ph.remap("Child.Obj", "Obj");
        assert!(!ph.has_param("Child.Obj"));
        assert_eq!(ph.get_element("Obj").unwrap().id, ":o-1");
    }
}
