pub mod audit;
pub mod builder;
pub mod editor;
pub mod engine;
pub mod index;
pub mod probe;
pub mod publish;
pub mod remote_zip;
pub mod search;
pub mod validator;

pub use crate::domain::model::{Catalog, Collection, Contact, Extent, Link, Record, Theme};
pub use crate::domain::ports::{ConfigProvider, Pipeline, RangeFetch, Storage, TailChunk};
pub use crate::utils::error::Result;
