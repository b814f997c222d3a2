//! The query, filter and aggregation core of an animal shelter dashboard.
//!
//! A [`Shelter`] wraps a [`RecordStore`] and answers find-style queries built
//! from the dashboard's filter control. Each user gets a [`Session`] that
//! holds the currently visible records and recomputes the views derived from
//! them: a breed [`Histogram`] for the bar chart and a [`MarkerView`] for the
//! selected row on the map.
//!
//! For the command line interface, see the `shelter-cli` crate.

pub mod category;
mod client;
mod collection;
mod config;
mod error;
mod histogram;
mod marker;
pub mod query;
mod session;
mod source;
mod store;
mod table;
mod value;

pub use category::Category;
pub use client::{Shelter, ID_FIELD};
pub use collection::Collection;
pub use config::Config;
pub use error::Error;
pub use histogram::{histogram, BarChart, Histogram, BREED_FIELD, UNKNOWN_BREED};
pub use marker::{project, MapView, MarkerFields, MarkerView};
pub use query::Predicate;
pub use session::{Render, Session};
pub use source::{Source, SourceIter};
pub use store::{MemoryStore, RecordStore};
pub use table::Table;
pub use value::{into_records, load_records, Map, Record, SupportedFormat, Value};
