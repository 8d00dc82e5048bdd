use super::{unmount_or_noop, Renderer, Unmounter};
use crate::{
	error::Result,
	helper::Helper,
	merge::merge_pair,
	parameters::{PlainSearchParameters, SearchParameters},
	vision::Vision,
	widget::{DisposeOptions, IndexUiState, InitOptions, RenderOptions, Widget, WidgetKind, WidgetSearchParametersOptions, WidgetStateOptions},
};
use core::cell::RefCell;
use std::rc::Rc;
use tracing::{trace, warn};

#[derive(Debug, Clone, Default)]
pub struct ConfigureParams {
	/// Applied to the index while the widget is mounted.
	pub search_parameters: PlainSearchParameters,
}

#[derive(Clone)]
pub struct ConfigureRenderOptions {
	pub vision: Vision,
	pub helper: Helper,
	pub widget_params: Rc<ConfigureParams>,
	tracked: Rc<RefCell<PlainSearchParameters>>,
}

impl ConfigureRenderOptions {
	/// The parameters currently applied by the widget.
	#[must_use]
	pub fn search_parameters(&self) -> PlainSearchParameters {
		self.tracked.borrow().clone()
	}

	/// Replaces the applied parameters with `search_parameters` and searches.
	///
	/// # Errors
	///
	/// [`Error::InvalidSearchParameters`](`crate::Error::InvalidSearchParameters`) (before anything changes),
	/// and search errors.
	pub fn refine(&self, search_parameters: PlainSearchParameters) -> Result<()> {
		refine(&self.helper, &self.tracked, search_parameters)
	}
}

fn without_tracked(state: &SearchParameters, tracked: &PlainSearchParameters) -> SearchParameters {
	state.unset_all(tracked.keys().map(String::as_str))
}

fn refine(helper: &Helper, tracked: &RefCell<PlainSearchParameters>, search_parameters: PlainSearchParameters) -> Result<()> {
	let refined = SearchParameters::from_plain(&search_parameters)?;
	let actual = without_tracked(&helper.state(), &tracked.borrow());
	let next = merge_pair(actual, &refined);

	// Updated first, so that the UI state derived from the change already contains the new parameters.
	*tracked.borrow_mut() = search_parameters;
	helper.set_state(next);
	helper.search()
}

/// Creates a [`ConfigureConnector`]. Both functions are optional.
#[must_use]
pub fn connect_configure(render_fn: Option<Renderer<ConfigureRenderOptions>>, unmount_fn: Option<Unmounter>) -> ConfigureConnector {
	ConfigureConnector {
		render_fn,
		unmount_fn: unmount_or_noop(unmount_fn),
	}
}

#[derive(Clone)]
pub struct ConfigureConnector {
	render_fn: Option<Renderer<ConfigureRenderOptions>>,
	unmount_fn: Unmounter,
}

impl ConfigureConnector {
	/// # Errors
	///
	/// [`Error::InvalidSearchParameters`](`crate::Error::InvalidSearchParameters`)
	/// if `params.search_parameters` isn't a valid set of search parameters.
	pub fn widget(&self, params: ConfigureParams) -> Result<ConfigureWidget> {
		SearchParameters::from_plain(&params.search_parameters)?;
		Ok(ConfigureWidget {
			render_fn: self.render_fn.clone(),
			unmount_fn: Rc::clone(&self.unmount_fn),
			tracked: Rc::new(RefCell::new(params.search_parameters.clone())),
			widget_params: Rc::new(params),
		})
	}
}

/// Injects a fixed set of search parameters into its index.
///
/// These outrank a `configure` block restored from the UI state.
pub struct ConfigureWidget {
	render_fn: Option<Renderer<ConfigureRenderOptions>>,
	unmount_fn: Unmounter,
	widget_params: Rc<ConfigureParams>,
	tracked: Rc<RefCell<PlainSearchParameters>>,
}

impl ConfigureWidget {
	fn call_render(&self, vision: &Vision, helper: &Helper, is_first_render: bool) {
		if let Some(render_fn) = &self.render_fn {
			render_fn(
				ConfigureRenderOptions {
					vision: vision.clone(),
					helper: helper.clone(),
					widget_params: Rc::clone(&self.widget_params),
					tracked: Rc::clone(&self.tracked),
				},
				is_first_render,
			);
		}
	}
}

impl Widget for ConfigureWidget {
	fn kind(&self) -> WidgetKind {
		WidgetKind::Configure
	}

	fn init(&self, options: &InitOptions<'_>) {
		self.call_render(options.vision, options.helper, true);
	}

	fn render(&self, options: &RenderOptions<'_>) {
		self.call_render(options.vision, options.helper, false);
	}

	fn dispose(&self, options: &DisposeOptions<'_>) -> Option<SearchParameters> {
		(self.unmount_fn)();
		trace!("Removing {} configured parameter(s).", self.tracked.borrow().len());
		Some(without_tracked(options.state, &self.tracked.borrow()))
	}

	fn get_widget_search_parameters(&self, state: SearchParameters, options: &WidgetSearchParametersOptions<'_>) -> SearchParameters {
		let tracked = self.tracked.borrow();
		let mut plain = options.ui_state.configure.clone().unwrap_or_default();
		plain.extend(tracked.iter().map(|(key, value)| (key.clone(), value.clone())));

		let configured = SearchParameters::from_plain(&plain).or_else(|error| {
			warn!("Ignoring the `configure` UI state: {}", error);
			SearchParameters::from_plain(&tracked)
		});
		match configured {
			Ok(configured) => merge_pair(state, &configured),
			// Validated on construction and on every refinement.
			Err(_) => state,
		}
	}

	fn get_widget_state(&self, mut ui_state: IndexUiState, _options: &WidgetStateOptions<'_>) -> IndexUiState {
		let mut configure = ui_state.configure.take().unwrap_or_default();
		configure.extend(self.tracked.borrow().iter().map(|(key, value)| (key.clone(), value.clone())));
		ui_state.configure = Some(configure);
		ui_state
	}
}
