use super::{check_rendering, unmount_or_noop, Renderer, Unmounter};
use crate::{
	error::Result,
	helper::Helper,
	parameters::SearchParameters,
	vision::Vision,
	widget::{DisposeOptions, IndexUiState, InitOptions, RenderOptions, Widget, WidgetKind, WidgetSearchParametersOptions, WidgetStateOptions},
};
use std::rc::Rc;

/// Rewrites a query before it is searched, e.g. to trim it.
pub type QueryHook = Rc<dyn Fn(&str) -> String>;

#[derive(Clone, Default)]
pub struct SearchBoxParams {
	pub query_hook: Option<QueryHook>,
}

#[derive(Clone)]
pub struct SearchBoxRenderOptions {
	pub vision: Vision,
	/// The query of the index, `""` if none.
	pub query: String,
	pub widget_params: Rc<SearchBoxParams>,
	helper: Helper,
}

impl SearchBoxRenderOptions {
	/// Sets the query (resetting the page) and searches.
	///
	/// # Errors
	///
	/// Search errors.
	pub fn refine(&self, query: &str) -> Result<()> {
		let query = match &self.widget_params.query_hook {
			Some(query_hook) => query_hook(query),
			None => query.to_owned(),
		};
		self.helper.set_query(&query);
		self.helper.search()
	}

	/// # Errors
	///
	/// Search errors.
	pub fn clear(&self) -> Result<()> {
		self.helper.set_query("");
		self.helper.search()
	}
}

/// # Errors
///
/// [`Error::InvalidRenderFunction`](`crate::Error::InvalidRenderFunction`) without `render_fn`.
pub fn connect_search_box(render_fn: Option<Renderer<SearchBoxRenderOptions>>, unmount_fn: Option<Unmounter>) -> Result<SearchBoxConnector> {
	Ok(SearchBoxConnector {
		render_fn: check_rendering(render_fn, "search-box")?,
		unmount_fn: unmount_or_noop(unmount_fn),
	})
}

#[derive(Clone)]
pub struct SearchBoxConnector {
	render_fn: Renderer<SearchBoxRenderOptions>,
	unmount_fn: Unmounter,
}

impl SearchBoxConnector {
	#[must_use]
	pub fn widget(&self, params: SearchBoxParams) -> SearchBoxWidget {
		SearchBoxWidget {
			render_fn: Rc::clone(&self.render_fn),
			unmount_fn: Rc::clone(&self.unmount_fn),
			widget_params: Rc::new(params),
		}
	}
}

/// Owns the `query` of its index.
pub struct SearchBoxWidget {
	render_fn: Renderer<SearchBoxRenderOptions>,
	unmount_fn: Unmounter,
	widget_params: Rc<SearchBoxParams>,
}

impl SearchBoxWidget {
	fn call_render(&self, vision: &Vision, helper: &Helper, is_first_render: bool) {
		(self.render_fn)(
			SearchBoxRenderOptions {
				vision: vision.clone(),
				query: helper.state().query().unwrap_or_default().to_owned(),
				widget_params: Rc::clone(&self.widget_params),
				helper: helper.clone(),
			},
			is_first_render,
		);
	}
}

impl Widget for SearchBoxWidget {
	fn kind(&self) -> WidgetKind {
		WidgetKind::SearchBox
	}

	fn init(&self, options: &InitOptions<'_>) {
		self.call_render(options.vision, options.helper, true);
	}

	fn render(&self, options: &RenderOptions<'_>) {
		self.call_render(options.vision, options.helper, false);
	}

	fn dispose(&self, options: &DisposeOptions<'_>) -> Option<SearchParameters> {
		(self.unmount_fn)();
		Some(options.state.unset("query"))
	}

	fn get_widget_state(&self, mut ui_state: IndexUiState, options: &WidgetStateOptions<'_>) -> IndexUiState {
		match options.search_parameters.query() {
			Some(query) if !query.is_empty() => ui_state.query = Some(query.to_owned()),
			_ => (),
		}
		ui_state
	}

	fn get_widget_search_parameters(&self, state: SearchParameters, options: &WidgetSearchParametersOptions<'_>) -> SearchParameters {
		state.set_query(options.ui_state.query.clone().unwrap_or_default())
	}
}
