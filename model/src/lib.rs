//! Data model for the skill-execution core: world elements, parameters, and
//! the `WorldModel` facade trait. No RDF store, no RPC — those are the named
//! external collaborators this crate only speaks to through traits.

pub mod element;
pub mod error;
pub mod param;
pub mod world_model;

pub use element::{Element, Relation, Scalar, WILDCARD};
pub use error::{Result, SkirosError};
pub use param::{ParamHandler, ParamType, Parameter, Value};
pub use world_model::{Binding, InMemoryWorldModel, OntologyQuery, WorldModel};
