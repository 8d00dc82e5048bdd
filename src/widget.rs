//! The widget contract.

use crate::{
	helper::Helper,
	index::Index,
	parameters::{PlainSearchParameters, SearchParameters},
	results::SearchResults,
	vision::Vision,
};
use core::fmt;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// The serializable selections of the widgets mounted on one index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexUiState {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub query: Option<String>,
	/// 1-based.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub page: Option<u32>,
	/// Not written by the widgets of this crate. Kept for [`WidgetKind::Custom`] widgets, and carried through routes.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub per_page: Option<u32>,
	/// Facet name → selected values. Like `per_page`, reserved for [`WidgetKind::Custom`] widgets.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refinement_list: Option<HashMap<String, Vec<String>>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub configure: Option<PlainSearchParameters>,
}
impl IndexUiState {
	#[must_use]
	pub fn is_empty(&self) -> bool {
		*self == Self::default()
	}

	/// Names of the keys that are set, as they appear in serialized form.
	pub(crate) fn keys(&self) -> Vec<&'static str> {
		let mut keys = Vec::new();
		if self.query.is_some() {
			keys.push("query");
		}
		if self.page.is_some() {
			keys.push("page");
		}
		if self.per_page.is_some() {
			keys.push("perPage");
		}
		if self.refinement_list.is_some() {
			keys.push("refinementList");
		}
		if self.configure.is_some() {
			keys.push("configure");
		}
		keys
	}
}

/// Index id → selections of that index.
pub type UiState = HashMap<String, IndexUiState>;

/// Runtime discrimination between widget kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
	Index,
	Configure,
	Records,
	InfiniteRecords,
	SearchBox,
	Pagination,
	/// A widget defined outside of this crate.
	Custom(&'static str),
}
impl WidgetKind {
	#[must_use]
	pub fn as_str(self) -> &'static str {
		match self {
			WidgetKind::Index => "vis.index",
			WidgetKind::Configure => "vis.configure",
			WidgetKind::Records => "vis.records",
			WidgetKind::InfiniteRecords => "vis.infiniteRecords",
			WidgetKind::SearchBox => "vis.searchBox",
			WidgetKind::Pagination => "vis.pagination",
			WidgetKind::Custom(name) => name,
		}
	}
}
impl fmt::Display for WidgetKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Which lifecycle hooks a widget actually implements.
///
/// An [`Index`] only accepts widgets that implement `init` or `render`, and only removes widgets that implement `dispose`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifecycle {
	pub init: bool,
	pub render: bool,
	pub dispose: bool,
}
impl Lifecycle {
	pub const ALL: Self = Self {
		init: true,
		render: true,
		dispose: true,
	};
	pub const NONE: Self = Self {
		init: false,
		render: false,
		dispose: false,
	};
}

pub struct InitOptions<'a> {
	pub vision: &'a Vision,
	pub helper: &'a Helper,
	pub parent: Option<&'a Index>,
	pub ui_state: &'a UiState,
	pub state: &'a SearchParameters,
	pub create_url: &'a dyn Fn(&SearchParameters) -> String,
}

/// Results of one index in the tree, handed to every widget for federated displays.
#[derive(Debug, Clone)]
pub struct ScopedResult {
	pub index_id: String,
	pub results: Rc<SearchResults>,
	pub helper: Helper,
}

pub struct RenderOptions<'a> {
	pub vision: &'a Vision,
	pub helper: &'a Helper,
	pub results: &'a Rc<SearchResults>,
	pub scoped_results: &'a [ScopedResult],
	/// The parameters that produced `results`.
	pub state: &'a SearchParameters,
	pub create_url: &'a dyn Fn(&SearchParameters) -> String,
}

pub struct DisposeOptions<'a> {
	pub helper: &'a Helper,
	pub state: &'a SearchParameters,
}

pub struct WidgetStateOptions<'a> {
	pub search_parameters: &'a SearchParameters,
	pub helper: &'a Helper,
}

pub struct WidgetSearchParametersOptions<'a> {
	pub ui_state: &'a IndexUiState,
}

/// A unit of composition. Contributes search parameters and consumes results.
///
/// Hooks take `&self`: widgets keep their mutable state behind interior mutability,
/// since callbacks (e.g. a `refine` from a render function) may re-enter the index tree at any time.
pub trait Widget {
	fn kind(&self) -> WidgetKind;

	fn lifecycle(&self) -> Lifecycle {
		Lifecycle::ALL
	}

	/// Called once when mounted to a live index, before the first search resolves.
	fn init(&self, _options: &InitOptions<'_>) {}

	/// Called once per completed search.
	fn render(&self, _options: &RenderOptions<'_>) {}

	/// Called once when unmounted. Returns the parameters without this widget's contributions.
	fn dispose(&self, _options: &DisposeOptions<'_>) -> Option<SearchParameters> {
		None
	}

	/// Adds this widget's selections to the UI state of its index.
	fn get_widget_state(&self, ui_state: IndexUiState, _options: &WidgetStateOptions<'_>) -> IndexUiState {
		ui_state
	}

	/// Applies this widget's contribution (restored from `ui_state` where applicable) to `state`.
	fn get_widget_search_parameters(&self, state: SearchParameters, _options: &WidgetSearchParametersOptions<'_>) -> SearchParameters {
		state
	}
}

/// A mounted child of an [`Index`]: either a nested index or a leaf widget.
#[derive(Clone)]
pub enum WidgetRef {
	Index(Index),
	Widget(Rc<dyn Widget>),
}
impl WidgetRef {
	#[must_use]
	pub fn new(widget: impl Widget + 'static) -> Self {
		Self::Widget(Rc::new(widget))
	}

	#[must_use]
	pub fn kind(&self) -> WidgetKind {
		match self {
			WidgetRef::Index(_) => WidgetKind::Index,
			WidgetRef::Widget(widget) => widget.kind(),
		}
	}

	#[must_use]
	pub fn lifecycle(&self) -> Lifecycle {
		match self {
			WidgetRef::Index(_) => Lifecycle::ALL,
			WidgetRef::Widget(widget) => widget.lifecycle(),
		}
	}

	#[must_use]
	pub fn as_index(&self) -> Option<&Index> {
		match self {
			WidgetRef::Index(index) => Some(index),
			WidgetRef::Widget(_) => None,
		}
	}

	/// Identity, not structural equality.
	#[must_use]
	pub fn ptr_eq(&self, other: &WidgetRef) -> bool {
		match (self, other) {
			(WidgetRef::Index(a), WidgetRef::Index(b)) => a.ptr_eq(b),
			(WidgetRef::Widget(a), WidgetRef::Widget(b)) => Rc::ptr_eq(a, b),
			_ => false,
		}
	}
}
impl fmt::Debug for WidgetRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			WidgetRef::Index(index) => index.fmt(f),
			WidgetRef::Widget(widget) => f.debug_tuple("Widget").field(&widget.kind()).finish(),
		}
	}
}
impl From<Index> for WidgetRef {
	fn from(index: Index) -> Self {
		WidgetRef::Index(index)
	}
}
impl<W: Widget + 'static> From<W> for WidgetRef {
	fn from(widget: W) -> Self {
		WidgetRef::new(widget)
	}
}
