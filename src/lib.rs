//! Stache - Template Engine
//!
//! Stache compiles Handlebars and Mustache templates, and renders them against
//! any data that implements [`serde::Serialize`].
//!
//! ```
//! use stache::Engine;
//! use serde_json::json;
//!
//! let engine = Engine::default();
//! let template = engine
//!     .compile("{{#each people}}{{name}}{{#unless @last}}, {{/unless}}{{/each}}")
//!     .unwrap();
//!
//! let result = engine.render(
//!     &template,
//!     &json!({"people": [{"name": "Erik"}, {"name": "Taylor"}]}),
//! );
//! assert_eq!(result.unwrap(), "Erik, Taylor");
//! ```
//!
//! Expressions written with two braces are HTML escaped, expressions written
//! with three braces, or with `{{&`, are not.
//!
//! Helpers extend the language, see the [`helper`] module.
mod compile;
mod config;
mod engine;
mod pipe;
mod region;
mod render;
mod report;
mod value;

pub mod helper;

pub use compile::{compile, Template};
pub use config::{Config, Unresolved};
pub use engine::{Engine, Resolver};
pub use helper::{Arguments, BlockHelper, FacadeLogger, Helper, Logger, Options};
pub use pipe::Pipe;
pub use region::Region;
pub use render::{is_truthy, render, Iteration};
pub use report::{Error, ErrorKind, Pointer, Visual};
pub use value::{to_value, Dynamic, Key, Map, Number, Record, Serializer, Value};
