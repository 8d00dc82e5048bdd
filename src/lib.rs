#![doc(html_root_url = "https://docs.rs/vision-dom/0.1.0")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

mod client;
pub mod connectors;
mod dom;
mod error;
mod helper;
mod index;
pub mod insights;
mod listeners;
mod merge;
mod parameters;
pub mod refinements;
mod results;
pub mod routing;
mod scheduler;
mod vision;
mod widget;
pub mod widgets;

pub use client::{SearchClient, SearchRequest};
pub use dom::{escape_html, escape_records, Container};
pub use error::{Error, Result};
pub use helper::{ChangeEvent, DerivedHelper, Helper};
pub use index::{index, Index};
pub use listeners::ListenerId;
pub use merge::merge_search_parameters;
pub use parameters::{PlainSearchParameters, RefinementMap, SearchParameters};
pub use results::{add_absolute_position, add_query_id, FacetResult, Record, Records, ResponseMeta, SearchResponse, SearchResults};
pub use vision::{Vision, VisionOptions, WeakVision};
pub use widget::{
	DisposeOptions, IndexUiState, InitOptions, Lifecycle, RenderOptions, ScopedResult, UiState, Widget, WidgetKind, WidgetRef, WidgetSearchParametersOptions, WidgetStateOptions,
};
