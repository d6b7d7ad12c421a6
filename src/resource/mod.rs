//! The generic resource layer: route resolution, object handles,
//! filtered collections, configuration documents and status polling.

pub mod collection;
pub mod config;
pub mod object;
pub mod poll;
pub mod route;

pub use collection::{Collection, Filter, Pager, Paging};
pub use object::{Configurable, Entity, HasStatus, Obj, UpdateMode, WithActions};
pub use route::{Endpoint, PathArgs, Seg};
