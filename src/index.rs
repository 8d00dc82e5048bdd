//! The composite widget that binds a subtree of widgets to one backend index.

use crate::{
	error::{Error, Result},
	helper::{DerivedHelper, Helper},
	merge::merge_search_parameters,
	parameters::SearchParameters,
	results::SearchResults,
	vision::{Vision, WeakVision},
	widget::{DisposeOptions, IndexUiState, InitOptions, RenderOptions, ScopedResult, UiState, WidgetKind, WidgetRef, WidgetSearchParametersOptions, WidgetStateOptions},
};
use core::{cell::RefCell, fmt};
use std::rc::{Rc, Weak};
use tracing::{instrument, trace, warn};

/// A node of the index tree.
///
/// Created detached. [`init`](`Index::init`) binds it to a started [`Vision`] (as root, or through a parent index),
/// after which widgets added or removed take effect immediately.
///
/// Cloning yields another handle to the same index.
#[derive(Clone)]
pub struct Index(Rc<IndexInner>);

struct IndexInner {
	index_name: String,
	index_id: String,
	widgets: RefCell<Vec<WidgetRef>>,
	ui_state: RefCell<IndexUiState>,
	vision: RefCell<Option<WeakVision>>,
	parent: RefCell<Option<Weak<IndexInner>>>,
	helper: RefCell<Option<Helper>>,
	derived: RefCell<Option<DerivedHelper>>,
}

impl fmt::Debug for Index {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Index")
			.field("index_name", &self.0.index_name)
			.field("index_id", &self.0.index_id)
			.field("widgets", &*self.0.widgets.borrow())
			.finish()
	}
}

/// Creates a detached index whose id is its name.
///
/// # Errors
///
/// [`Error::MissingIndexName`] if `index_name` is empty.
pub fn index(index_name: &str) -> Result<Index> {
	Index::new(index_name, None)
}

impl Index {
	/// # Errors
	///
	/// [`Error::MissingIndexName`] if `index_name` is empty.
	pub fn new(index_name: &str, index_id: Option<&str>) -> Result<Self> {
		if index_name.is_empty() {
			return Err(Error::MissingIndexName);
		}
		Ok(Self(Rc::new(IndexInner {
			index_name: index_name.to_owned(),
			index_id: index_id.unwrap_or(index_name).to_owned(),
			widgets: RefCell::new(Vec::new()),
			ui_state: RefCell::new(IndexUiState::default()),
			vision: RefCell::new(None),
			parent: RefCell::new(None),
			helper: RefCell::new(None),
			derived: RefCell::new(None),
		})))
	}

	#[must_use]
	pub fn index_name(&self) -> &str {
		&self.0.index_name
	}

	#[must_use]
	pub fn index_id(&self) -> &str {
		&self.0.index_id
	}

	/// `None` until initialized and after disposal.
	#[must_use]
	pub fn helper(&self) -> Option<Helper> {
		self.0.helper.borrow().clone()
	}

	#[must_use]
	pub fn results(&self) -> Option<Rc<SearchResults>> {
		self.derived().and_then(|derived| derived.last_results())
	}

	#[must_use]
	pub fn parent(&self) -> Option<Index> {
		self.0.parent.borrow().as_ref().and_then(Weak::upgrade).map(Index)
	}

	/// The mounted children, in mount order.
	#[must_use]
	pub fn widgets(&self) -> Vec<WidgetRef> {
		self.0.widgets.borrow().clone()
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &Index) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	#[must_use]
	pub fn is_initialized(&self) -> bool {
		self.0.helper.borrow().is_some()
	}

	fn vision(&self) -> Option<Vision> {
		self.0.vision.borrow().as_ref().and_then(WeakVision::upgrade)
	}

	fn derived(&self) -> Option<DerivedHelper> {
		self.0.derived.borrow().clone()
	}

	/// Mounts `widgets` after the current children.
	///
	/// On a live index, their parameters are folded into the helper state (later-mounted widgets win),
	/// they are initialized and a search is scheduled.
	///
	/// # Errors
	///
	/// [`Error::MissingLifecycleMethod`] if a widget implements neither `init` nor `render`. Nothing is mounted in that case.
	#[instrument(skip_all, fields(index_id = %self.0.index_id, count = widgets.len()))]
	pub fn add_widgets(&self, widgets: &[WidgetRef]) -> Result<&Self> {
		if let Some(widget) = widgets.iter().find(|widget| {
			let lifecycle = widget.lifecycle();
			!lifecycle.init && !lifecycle.render
		}) {
			return Err(Error::MissingLifecycleMethod {
				kind: widget.kind().to_string(),
				method: "init` and/or `render",
			});
		}

		self.0.widgets.borrow_mut().extend(widgets.iter().cloned());

		let vision = match self.vision() {
			Some(vision) if !widgets.is_empty() => vision,
			_ => return Ok(self),
		};
		let helper = self.helper().ok_or(Error::NotStarted("addWidgets"))?;

		let local_ui_state = self.0.ui_state.borrow().clone();
		helper.set_state(local_widgets_search_parameters(&self.widgets(), &local_ui_state, helper.state()));

		let empty = UiState::new();
		for widget in widgets {
			self.init_widget(widget, &vision, &empty, &helper)?;
		}

		vision.schedule_search();
		Ok(self)
	}

	/// Unmounts `widgets`, disposing them in mount order.
	///
	/// Each `dispose` receives the state returned by the previous one.
	/// The parameters are then re-derived from the surviving widgets.
	///
	/// # Errors
	///
	/// [`Error::MissingLifecycleMethod`] if a widget doesn't implement `dispose`. Nothing is unmounted in that case.
	#[instrument(skip_all, fields(index_id = %self.0.index_id, count = widgets.len()))]
	pub fn remove_widgets(&self, widgets: &[WidgetRef]) -> Result<&Self> {
		if let Some(widget) = widgets.iter().find(|widget| !widget.lifecycle().dispose) {
			return Err(Error::MissingLifecycleMethod {
				kind: widget.kind().to_string(),
				method: "dispose",
			});
		}

		// Mount order, not argument order.
		let removed: Vec<WidgetRef> = self.widgets().into_iter().filter(|widget| widgets.iter().any(|w| w.ptr_eq(widget))).collect();
		self.0.widgets.borrow_mut().retain(|widget| !widgets.iter().any(|w| w.ptr_eq(widget)));

		let vision = match self.vision() {
			Some(vision) if !widgets.is_empty() => vision,
			_ => return Ok(self),
		};
		let helper = self.helper().ok_or(Error::NotStarted("removeWidgets"))?;

		let mut next_state = helper.state();
		for widget in &removed {
			match widget {
				WidgetRef::Index(index) => index.dispose(),
				WidgetRef::Widget(widget) => {
					let disposed = widget.dispose(&DisposeOptions {
						helper: &helper,
						state: &next_state,
					});
					if let Some(state) = disposed {
						next_state = state;
					}
				}
			}
		}

		let survivors = self.widgets();
		let local_ui_state = local_widgets_state(&survivors, &next_state, &helper);
		*self.0.ui_state.borrow_mut() = local_ui_state.clone();
		helper.set_state(local_widgets_search_parameters(&survivors, &local_ui_state, next_state));

		if !survivors.is_empty() {
			vision.schedule_search();
		}
		Ok(self)
	}

	/// Binds this index to `vision`, creates its helpers and initializes its children.
	///
	/// # Errors
	///
	/// [`Error::NotStarted`] if `vision` has no network-facing helper yet.
	#[instrument(skip_all, fields(index_id = %self.0.index_id))]
	pub fn init(&self, vision: &Vision, parent: Option<&Index>, ui_state: &UiState) -> Result<()> {
		let main = vision.helper().ok_or(Error::NotStarted("init"))?;

		*self.0.vision.borrow_mut() = Some(vision.downgrade());
		*self.0.parent.borrow_mut() = parent.map(|parent| Rc::downgrade(&parent.0));
		let local_ui_state = ui_state.get(self.index_id()).cloned().unwrap_or_default();
		*self.0.ui_state.borrow_mut() = local_ui_state.clone();

		let widgets = self.widgets();
		let parameters = local_widgets_search_parameters(&widgets, &local_ui_state, SearchParameters::for_index(self.index_name()));

		// Only the network-facing helper knows the search client. This one just holds state.
		let helper = Helper::scoped(&main, parameters);
		*self.0.helper.borrow_mut() = Some(helper.clone());

		let weak = Rc::downgrade(&self.0);
		let derived = main.derive(move |_| match weak.upgrade() {
			Some(inner) => merge_search_parameters(&resolve_search_parameters(&Index(inner))),
			None => SearchParameters::default(),
		})?;
		*self.0.derived.borrow_mut() = Some(derived.clone());

		// Registered before the widgets are initialized, like the page handling of a plain helper.
		let weak = Rc::downgrade(&self.0);
		helper.on_change(move |event| {
			if event.is_page_reset {
				if let Some(inner) = weak.upgrade() {
					reset_page_from_widgets(&Index(inner).widgets());
				}
			}
		});

		let weak = Rc::downgrade(&self.0);
		derived.on_search(move |_| {
			if let Some(inner) = weak.upgrade() {
				Index(inner).warn_missing_widgets();
			}
		});

		// Rendering waits until every index in the batch has its results.
		let weak = Rc::downgrade(&self.0);
		let weak_vision = vision.downgrade();
		derived.on_result(move |results| {
			if let Some(vision) = weak_vision.upgrade() {
				vision.schedule_render();
			}
			if let Some(helper) = weak.upgrade().and_then(|inner| Index(inner).helper()) {
				helper.set_last_results(Some(Rc::clone(results)));
			}
		});

		for widget in &widgets {
			self.init_widget(widget, vision, ui_state, &helper)?;
		}

		// Registered after `init` so that static widget configuration doesn't count as a UI state change.
		let weak = Rc::downgrade(&self.0);
		let weak_vision = vision.downgrade();
		helper.on_change(move |event| {
			if let Some(index) = weak.upgrade().map(Index) {
				if let Some(helper) = index.helper() {
					let local_ui_state = local_widgets_state(&index.widgets(), &event.state, &helper);
					*index.0.ui_state.borrow_mut() = local_ui_state;
				}
			}
			if let Some(vision) = weak_vision.upgrade() {
				vision.on_state_change();
			}
		});

		trace!("Index initialized with {} widget(s).", widgets.len());
		Ok(())
	}

	fn init_widget(&self, widget: &WidgetRef, vision: &Vision, ui_state: &UiState, helper: &Helper) -> Result<()> {
		match widget {
			WidgetRef::Index(index) => index.init(vision, Some(self), ui_state),
			WidgetRef::Widget(widget) => {
				if widget.lifecycle().init {
					let state = helper.state();
					let create_url = self.create_url_fn();
					widget.init(&InitOptions {
						vision,
						helper,
						parent: Some(self),
						ui_state,
						state: &state,
						create_url: &create_url,
					});
				}
				Ok(())
			}
		}
	}

	/// Renders the children in mount order. Skipped entirely while this index has no results yet.
	#[instrument(skip_all, fields(index_id = %self.0.index_id))]
	pub fn render(&self, vision: &Vision) {
		let (Some(helper), Some(results)) = (self.helper(), self.results()) else {
			trace!("No results yet, skipping render.");
			return;
		};

		let scoped_results = resolve_scoped_results_from_index(self);
		let create_url = self.create_url_fn();
		for widget in self.widgets() {
			match &widget {
				WidgetRef::Index(index) => index.render(vision),
				WidgetRef::Widget(widget) => {
					if widget.lifecycle().render {
						widget.render(&RenderOptions {
							vision,
							helper: &helper,
							results: &results,
							scoped_results: &scoped_results,
							state: &results.state,
							create_url: &create_url,
						});
					}
				}
			}
		}
	}

	/// Disposes every child in mount order and releases both helpers.
	///
	/// The children stay mounted, so that the index can be added again later.
	#[instrument(skip_all, fields(index_id = %self.0.index_id))]
	pub fn dispose(&self) {
		let helper = self.helper();
		for widget in self.widgets() {
			match &widget {
				WidgetRef::Index(index) => index.dispose(),
				WidgetRef::Widget(widget) => {
					if let (Some(helper), true) = (&helper, widget.lifecycle().dispose) {
						let state = helper.state();
						// The index itself is going away, so the returned state is irrelevant.
						let _ = widget.dispose(&DisposeOptions { helper, state: &state });
					}
				}
			}
		}

		*self.0.vision.borrow_mut() = None;
		*self.0.parent.borrow_mut() = None;

		let helper = self.0.helper.borrow_mut().take();
		if let Some(helper) = helper {
			helper.remove_all_listeners();
		}
		let derived = self.0.derived.borrow_mut().take();
		if let Some(derived) = derived {
			derived.detach();
		}
	}

	/// Adds this index's UI state (keyed by its id) and that of every nested index to `ui_state`.
	#[must_use]
	pub fn get_widget_state(&self, mut ui_state: UiState) -> UiState {
		ui_state.insert(self.index_id().to_owned(), self.0.ui_state.borrow().clone());
		let widgets = self.widgets();
		widgets.iter().filter_map(WidgetRef::as_index).fold(ui_state, |ui_state, index| index.get_widget_state(ui_state))
	}

	/// Restores this subtree from `ui_state` without emitting change events.
	pub(crate) fn apply_ui_state(&self, ui_state: &UiState) {
		let widgets = self.widgets();
		if let Some(helper) = self.helper() {
			let local_ui_state = ui_state.get(self.index_id()).cloned().unwrap_or_default();
			let next = local_widgets_search_parameters(&widgets, &local_ui_state, helper.state());
			*self.0.ui_state.borrow_mut() = local_widgets_state(&widgets, &next, &helper);
			helper.override_state_without_change(next);
		}
		for index in widgets.iter().filter_map(WidgetRef::as_index) {
			index.apply_ui_state(ui_state);
		}
	}

	fn create_url_fn(&self) -> impl Fn(&SearchParameters) -> String {
		let weak = Rc::downgrade(&self.0);
		move |next| {
			let Some(index) = weak.upgrade().map(Index) else {
				return String::from("#");
			};
			let (Some(vision), Some(helper)) = (index.vision(), index.helper()) else {
				return String::from("#");
			};
			let mut ui_state = UiState::new();
			ui_state.insert(index.index_id().to_owned(), local_widgets_state(&index.widgets(), next, &helper));
			vision.create_url(&ui_state)
		}
	}

	fn warn_missing_widgets(&self) {
		let local_ui_state = self.0.ui_state.borrow().clone();
		let mounted: Vec<WidgetKind> = self.widgets().iter().map(WidgetRef::kind).collect();

		let missing: Vec<String> = local_ui_state
			.keys()
			.into_iter()
			.filter_map(|key| {
				let required: &[WidgetKind] = match key {
					"query" => &[WidgetKind::SearchBox],
					"page" => &[WidgetKind::Pagination, WidgetKind::InfiniteRecords],
					"configure" => &[WidgetKind::Configure],
					_ => return None,
				};
				if required.iter().any(|kind| mounted.contains(kind)) {
					None
				} else {
					let names: Vec<&str> = required.iter().map(|kind| kind.as_str()).collect();
					Some(format!("`{}` needs one of these widgets: {}", key, names.join(", ")))
				}
			})
			.collect();

		if !missing.is_empty() {
			warn!(
				"The UI state for the index \"{}\" is not consistent with the widgets mounted.\n\
				Those query parameters are not sent to the API:\n{}",
				self.index_id(),
				missing.join("\n")
			);
		}
	}
}

fn local_widgets_state(widgets: &[WidgetRef], search_parameters: &SearchParameters, helper: &Helper) -> IndexUiState {
	let options = WidgetStateOptions { search_parameters, helper };
	widgets.iter().fold(IndexUiState::default(), |ui_state, widget| match widget {
		WidgetRef::Index(_) => ui_state,
		WidgetRef::Widget(widget) => widget.get_widget_state(ui_state, &options),
	})
}

/// Folds every leaf widget's contribution over `initial`, in mount order.
fn local_widgets_search_parameters(widgets: &[WidgetRef], ui_state: &IndexUiState, initial: SearchParameters) -> SearchParameters {
	let options = WidgetSearchParametersOptions { ui_state };
	widgets.iter().fold(initial, |state, widget| match widget {
		WidgetRef::Index(_) => state,
		WidgetRef::Widget(widget) => widget.get_widget_search_parameters(state, &options),
	})
}

fn reset_page_from_widgets(widgets: &[WidgetRef]) {
	for index in widgets.iter().filter_map(WidgetRef::as_index) {
		if let Some(helper) = index.helper() {
			helper.set_state(helper.state().reset_page());
		}
		reset_page_from_widgets(&index.widgets());
	}
}

/// The states of `index` and its ancestors, root first.
fn resolve_search_parameters(index: &Index) -> Vec<SearchParameters> {
	let mut states = Vec::new();
	let mut current = Some(index.clone());
	while let Some(index) = current {
		if let Some(helper) = index.helper() {
			states.push(helper.state());
		}
		current = index.parent();
	}
	states.reverse();
	states
}

fn resolve_scoped_results_from_widgets(widgets: &[WidgetRef]) -> Vec<ScopedResult> {
	widgets
		.iter()
		.filter_map(WidgetRef::as_index)
		.flat_map(|index| {
			let own = match (index.results(), index.helper()) {
				(Some(results), Some(helper)) => Some(ScopedResult {
					index_id: index.index_id().to_owned(),
					results,
					helper,
				}),
				_ => None,
			};
			own.into_iter().chain(resolve_scoped_results_from_widgets(&index.widgets()))
		})
		.collect()
}

/// Results of `index` and its siblings, with their nested indices.
fn resolve_scoped_results_from_index(index: &Index) -> Vec<ScopedResult> {
	let siblings = match index.parent() {
		Some(parent) => parent.widgets(),
		// The root is its own only sibling.
		None => vec![WidgetRef::Index(index.clone())],
	};
	let scoped_results = resolve_scoped_results_from_widgets(&siblings);
	trace!("Resolved {} scoped result(s).", scoped_results.len());
	scoped_results
}
