//! Connectors turn a render function into a widget factory.
//!
//! A render function receives connector-specific options and whether this is the first render.
//! It is called once at `init` (with `true` and without results), then once per completed search.

use crate::{
	error::{Error, Result},
	results::Record,
};
use std::rc::Rc;

mod configure;
mod infinite_records;
mod pagination;
mod records;
mod search_box;

pub use configure::{connect_configure, ConfigureConnector, ConfigureParams, ConfigureRenderOptions, ConfigureWidget};
pub use infinite_records::{
	connect_infinite_records, connect_infinite_records_with_insights, InfiniteRecordsConnector, InfiniteRecordsParams, InfiniteRecordsRenderOptions, InfiniteRecordsWidget,
};
pub use pagination::{connect_pagination, PaginationConnector, PaginationParams, PaginationRenderOptions, PaginationWidget};
pub use records::{connect_records, connect_records_with_insights, RecordsConnector, RecordsParams, RecordsRenderOptions, RecordsWidget};
pub use search_box::{connect_search_box, QueryHook, SearchBoxConnector, SearchBoxParams, SearchBoxRenderOptions, SearchBoxWidget};

/// `(options, is_first_render)`.
pub type Renderer<O> = Rc<dyn Fn(O, bool)>;

/// Called when a widget is disposed.
pub type Unmounter = Rc<dyn Fn()>;

/// Applied to the annotated records of each response before they are rendered.
pub type TransformItems = Rc<dyn Fn(Vec<Record>) -> Vec<Record>>;

pub(crate) fn check_rendering<O>(render_fn: Option<Renderer<O>>, connector: &'static str) -> Result<Renderer<O>> {
	render_fn.ok_or(Error::InvalidRenderFunction(connector))
}

pub(crate) fn unmount_or_noop(unmount_fn: Option<Unmounter>) -> Unmounter {
	unmount_fn.unwrap_or_else(|| Rc::new(|| ()))
}

pub(crate) fn transform(transform_items: Option<&TransformItems>, records: Vec<Record>) -> Vec<Record> {
	match transform_items {
		Some(transform_items) => transform_items(records),
		None => records,
	}
}
