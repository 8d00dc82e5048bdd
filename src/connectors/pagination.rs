use super::{check_rendering, unmount_or_noop, Renderer, Unmounter};
use crate::{
	error::Result,
	helper::Helper,
	parameters::SearchParameters,
	vision::Vision,
	widget::{DisposeOptions, IndexUiState, InitOptions, RenderOptions, Widget, WidgetKind, WidgetSearchParametersOptions, WidgetStateOptions},
};
use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct PaginationParams {
	/// Caps the number of pages offered, regardless of the response.
	pub total_pages: Option<u32>,
	/// Number of pages shown on each side of the current one.
	pub padding: u32,
}

impl Default for PaginationParams {
	fn default() -> Self {
		Self { total_pages: None, padding: 3 }
	}
}

#[derive(Clone)]
pub struct PaginationRenderOptions {
	pub vision: Vision,
	/// 0-based.
	pub current_refinement: u32,
	pub nb_hits: u32,
	pub nb_pages: u32,
	/// The window of (0-based) pages around the current one.
	pub pages: Vec<u32>,
	pub is_first_page: bool,
	pub is_last_page: bool,
	pub widget_params: Rc<PaginationParams>,
	helper: Helper,
}

impl PaginationRenderOptions {
	/// Goes to the 0-based `page` and searches.
	///
	/// # Errors
	///
	/// Search errors.
	pub fn refine(&self, page: u32) -> Result<()> {
		self.helper.set_page(page);
		self.helper.search()
	}
}

/// At most `2 * padding + 1` consecutive pages containing `current`, shifted inward near either end.
fn pages(current: u32, total: u32, padding: u32) -> Vec<u32> {
	if total == 0 {
		return vec![0];
	}
	let displayed = total.min(padding.saturating_mul(2).saturating_add(1));
	if displayed == total {
		return (0..total).collect();
	}
	let current = current.min(total - 1);
	let padding_left = if current <= padding {
		current
	} else if current >= total - padding {
		displayed - (total - current)
	} else {
		padding
	};
	let first = current - padding_left;
	(first..first + displayed).collect()
}

/// # Errors
///
/// [`Error::InvalidRenderFunction`](`crate::Error::InvalidRenderFunction`) without `render_fn`.
pub fn connect_pagination(render_fn: Option<Renderer<PaginationRenderOptions>>, unmount_fn: Option<Unmounter>) -> Result<PaginationConnector> {
	Ok(PaginationConnector {
		render_fn: check_rendering(render_fn, "pagination")?,
		unmount_fn: unmount_or_noop(unmount_fn),
	})
}

#[derive(Clone)]
pub struct PaginationConnector {
	render_fn: Renderer<PaginationRenderOptions>,
	unmount_fn: Unmounter,
}

impl PaginationConnector {
	#[must_use]
	pub fn widget(&self, params: PaginationParams) -> PaginationWidget {
		PaginationWidget {
			render_fn: Rc::clone(&self.render_fn),
			unmount_fn: Rc::clone(&self.unmount_fn),
			widget_params: Rc::new(params),
		}
	}
}

/// Owns the `page` of its index.
pub struct PaginationWidget {
	render_fn: Renderer<PaginationRenderOptions>,
	unmount_fn: Unmounter,
	widget_params: Rc<PaginationParams>,
}

impl Widget for PaginationWidget {
	fn kind(&self) -> WidgetKind {
		WidgetKind::Pagination
	}

	fn init(&self, options: &InitOptions<'_>) {
		(self.render_fn)(
			PaginationRenderOptions {
				vision: options.vision.clone(),
				current_refinement: options.helper.state().page().unwrap_or(0),
				nb_hits: 0,
				nb_pages: 0,
				pages: Vec::new(),
				is_first_page: true,
				is_last_page: true,
				widget_params: Rc::clone(&self.widget_params),
				helper: options.helper.clone(),
			},
			true,
		);
	}

	fn render(&self, options: &RenderOptions<'_>) {
		let results = options.results;
		let current = options.state.page().unwrap_or(0);
		let nb_pages = match self.widget_params.total_pages {
			Some(total_pages) => results.num_pages.min(total_pages),
			None => results.num_pages,
		};
		(self.render_fn)(
			PaginationRenderOptions {
				vision: options.vision.clone(),
				current_refinement: current,
				nb_hits: results.total,
				nb_pages,
				pages: pages(current, nb_pages, self.widget_params.padding),
				is_first_page: current == 0,
				is_last_page: current + 1 >= nb_pages,
				widget_params: Rc::clone(&self.widget_params),
				helper: options.helper.clone(),
			},
			false,
		);
	}

	fn dispose(&self, options: &DisposeOptions<'_>) -> Option<SearchParameters> {
		(self.unmount_fn)();
		Some(options.state.unset("page"))
	}

	fn get_widget_state(&self, mut ui_state: IndexUiState, options: &WidgetStateOptions<'_>) -> IndexUiState {
		let page = options.search_parameters.page().unwrap_or(0);
		if page > 0 {
			ui_state.page = Some(page + 1);
		}
		ui_state
	}

	fn get_widget_search_parameters(&self, state: SearchParameters, options: &WidgetSearchParametersOptions<'_>) -> SearchParameters {
		state.set_page(options.ui_state.page.map_or(0, |page| page.saturating_sub(1)))
	}
}
