use super::{check_rendering, transform, unmount_or_noop, Renderer, TransformItems, Unmounter};
use crate::{
	error::Result,
	helper::Helper,
	insights::{with_insights, Insights, InsightsRenderOptions},
	parameters::SearchParameters,
	results::{add_absolute_position, add_query_id, Record, Records, SearchResults},
	vision::Vision,
	widget::{DisposeOptions, IndexUiState, InitOptions, RenderOptions, Widget, WidgetKind, WidgetSearchParametersOptions, WidgetStateOptions},
};
use core::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::trace;

#[derive(Clone, Default)]
pub struct InfiniteRecordsParams {
	pub transform_items: Option<TransformItems>,
	/// Whether earlier pages can be loaded. Only then is the page kept in the UI state.
	pub show_previous: bool,
}

#[derive(Clone)]
pub struct InfiniteRecordsRenderOptions {
	pub vision: Vision,
	/// Every record received since the last non-paging change, in page order.
	pub records: Records,
	/// `None` on the first render.
	pub results: Option<Rc<SearchResults>>,
	/// Only set by [`connect_infinite_records_with_insights`], once results are available.
	pub insights: Option<Insights>,
	pub is_first_page: bool,
	pub is_last_page: bool,
	pub widget_params: Rc<InfiniteRecordsParams>,
	helper: Helper,
	cache: Rc<RecordsCache>,
}

impl InfiniteRecordsRenderOptions {
	/// Loads the page after the last received one.
	///
	/// # Errors
	///
	/// Search errors.
	pub fn show_more(&self) -> Result<()> {
		self.helper.set_page(self.cache.last_received_page.get() + 1);
		self.helper.search()
	}

	/// Loads the page before the first received one, without emitting a change (so the URL stays as is).
	///
	/// Does nothing on the first page.
	///
	/// # Errors
	///
	/// Search errors.
	pub fn show_previous(&self) -> Result<()> {
		let Some(page) = self.cache.first_received_page.get().checked_sub(1) else {
			return Ok(());
		};
		self.helper.override_state_without_change(self.helper.state().set_page(page));
		self.helper.search()
	}
}

impl InsightsRenderOptions for InfiniteRecordsRenderOptions {
	fn vision(&self) -> &Vision {
		&self.vision
	}

	fn results(&self) -> Option<&Rc<SearchResults>> {
		self.results.as_ref()
	}

	fn records(&self) -> &Records {
		&self.records
	}

	fn set_insights(&mut self, insights: Insights) {
		self.insights = Some(insights);
	}
}

/// # Errors
///
/// [`Error::InvalidRenderFunction`](`crate::Error::InvalidRenderFunction`) without `render_fn`.
pub fn connect_infinite_records(render_fn: Option<Renderer<InfiniteRecordsRenderOptions>>, unmount_fn: Option<Unmounter>) -> Result<InfiniteRecordsConnector> {
	Ok(InfiniteRecordsConnector {
		render_fn: check_rendering(render_fn, "infinite-records")?,
		unmount_fn: unmount_or_noop(unmount_fn),
	})
}

/// Like [`connect_infinite_records`], with an [`Insights`] handle in the render options.
///
/// # Errors
///
/// [`Error::InvalidRenderFunction`](`crate::Error::InvalidRenderFunction`) without `render_fn`.
pub fn connect_infinite_records_with_insights(
	render_fn: Option<Renderer<InfiniteRecordsRenderOptions>>,
	unmount_fn: Option<Unmounter>,
) -> Result<InfiniteRecordsConnector> {
	connect_infinite_records(render_fn.map(with_insights), unmount_fn)
}

#[derive(Clone)]
pub struct InfiniteRecordsConnector {
	render_fn: Renderer<InfiniteRecordsRenderOptions>,
	unmount_fn: Unmounter,
}

impl InfiniteRecordsConnector {
	#[must_use]
	pub fn widget(&self, params: InfiniteRecordsParams) -> InfiniteRecordsWidget {
		InfiniteRecordsWidget {
			render_fn: Rc::clone(&self.render_fn),
			unmount_fn: Rc::clone(&self.unmount_fn),
			widget_params: Rc::new(params),
			cache: Rc::new(RecordsCache::default()),
		}
	}
}

#[derive(Default)]
struct RecordsCache {
	records: RefCell<Vec<Record>>,
	first_received_page: Cell<u32>,
	last_received_page: Cell<u32>,
	/// The last rendered state, without anything that only concerns paging.
	previous_state: RefCell<Option<SearchParameters>>,
}

impl RecordsCache {
	fn reset(&self, page: u32) {
		self.records.borrow_mut().clear();
		self.first_received_page.set(page);
		self.last_received_page.set(page);
	}

	/// Appends pages after the cached ones and prepends pages before them. Pages already seen are ignored.
	fn receive(&self, page: u32, records: Vec<Record>) {
		let mut cache = self.records.borrow_mut();
		if self.last_received_page.get() < page || cache.is_empty() {
			cache.extend(records);
			self.last_received_page.set(page);
		} else if self.first_received_page.get() > page {
			cache.splice(0..0, records);
			self.first_received_page.set(page);
		}
	}
}

/// `state` without `page`, the facet lists, `maxValuesPerFacet` and refinement entries without values.
fn without_paging(state: &SearchParameters) -> SearchParameters {
	let mut state = state.unset_all(["page", "facets", "disjunctiveFacets", "maxValuesPerFacet"]);
	for refinements in state.refinement_maps_mut() {
		refinements.retain(|_, values| !values.is_empty());
	}
	state
}

/// Accumulates the records of consecutive pages.
pub struct InfiniteRecordsWidget {
	render_fn: Renderer<InfiniteRecordsRenderOptions>,
	unmount_fn: Unmounter,
	widget_params: Rc<InfiniteRecordsParams>,
	cache: Rc<RecordsCache>,
}

impl InfiniteRecordsWidget {
	fn render_options(&self, vision: &Vision, helper: &Helper, results: Option<Rc<SearchResults>>, is_first_page: bool, is_last_page: bool) -> InfiniteRecordsRenderOptions {
		let escaped = results.as_ref().map_or(false, |results| results.records.is_escaped());
		InfiniteRecordsRenderOptions {
			vision: vision.clone(),
			records: Records::new(self.cache.records.borrow().clone()).with_escaped(escaped),
			results,
			insights: None,
			is_first_page,
			is_last_page,
			widget_params: Rc::clone(&self.widget_params),
			helper: helper.clone(),
			cache: Rc::clone(&self.cache),
		}
	}
}

impl Widget for InfiniteRecordsWidget {
	fn kind(&self) -> WidgetKind {
		WidgetKind::InfiniteRecords
	}

	fn init(&self, options: &InitOptions<'_>) {
		let page = options.helper.state().page().unwrap_or(0);
		self.cache.first_received_page.set(page);
		self.cache.last_received_page.set(page);

		let render_options = self.render_options(options.vision, options.helper, None, page == 0, true);
		(self.render_fn)(render_options, true);
	}

	fn render(&self, options: &RenderOptions<'_>) {
		let results = options.results;
		let page = options.state.page().unwrap_or(0);

		let current_state = without_paging(options.state);
		if self.cache.previous_state.borrow().as_ref() != Some(&current_state) {
			trace!("Search state changed, resetting the records cache to page {}.", page);
			self.cache.reset(page);
			*self.cache.previous_state.borrow_mut() = Some(current_state);
		}

		let records = add_absolute_position(results.records.clone(), results.page, results.per_page);
		let records = add_query_id(records, results.query_id.as_deref());
		let records = transform(self.widget_params.transform_items.as_ref(), records.into_vec());
		self.cache.receive(page, records);

		let is_first_page = self.cache.first_received_page.get() == 0;
		let is_last_page = results.num_pages <= results.page + 1;
		let render_options = self.render_options(options.vision, options.helper, Some(Rc::clone(results)), is_first_page, is_last_page);
		(self.render_fn)(render_options, false);
	}

	fn dispose(&self, options: &DisposeOptions<'_>) -> Option<SearchParameters> {
		(self.unmount_fn)();
		Some(options.state.unset("page"))
	}

	fn get_widget_state(&self, mut ui_state: IndexUiState, options: &WidgetStateOptions<'_>) -> IndexUiState {
		let page = options.search_parameters.page().unwrap_or(0);
		if self.widget_params.show_previous && page > 0 {
			// 1-based for users.
			ui_state.page = Some(page + 1);
		}
		ui_state
	}

	fn get_widget_search_parameters(&self, state: SearchParameters, options: &WidgetSearchParametersOptions<'_>) -> SearchParameters {
		state.set_page(options.ui_state.page.map_or(0, |page| page.saturating_sub(1)))
	}
}
