//! Scheme Model
//!
//! A small data model that stores loosely-typed values under dotted paths
//! and coerces them to declared types when they are read back.
//!
//! ## Features
//!
//! - **Dotted paths**: `set("a.b.c", 1)` creates the intermediate levels
//! - **Lazy coercion**: values are stored raw and coerced on every `get`
//! - **Nested schemes**: records, arrays of schemes and primitive casters
//! - **Validation on read**: NaN numbers, invalid dates and non-object
//!   results of the object caster fail with a type coercion error
//!
//! ## Example
//!
//! ```
//! use scheme_model::{Model, Scheme, Value};
//!
//! let scheme = Scheme::record([
//!     ("num", Scheme::number()),
//!     ("tags", Scheme::array_of(Scheme::text())),
//!     ("deep", Scheme::record([("flag", Scheme::boolean())])),
//! ]);
//!
//! let mut model = Model::new(scheme);
//! model.set("num", "1234");
//! model.set("deep.flag", 0);
//!
//! assert_eq!(model.get("num").unwrap(), Some(Value::Number(1234.0)));
//! assert_eq!(model.get("deep.flag").unwrap(), Some(Value::Bool(false)));
//! assert_eq!(model.get("tags").unwrap(), None);
//! ```

pub mod coerce;
pub mod config;
pub mod error;
pub mod model;
pub mod path;
pub mod scheme;
pub mod value;

pub use coerce::{coerce, is_valid};
pub use config::ModelConfig;
pub use error::{Result, SchemeError};
pub use model::Model;
pub use scheme::{Caster, Scheme};
pub use value::{Timestamp, Value};
