use super::{check_rendering, transform, unmount_or_noop, Renderer, TransformItems, Unmounter};
use crate::{
	error::Result,
	insights::{with_insights, Insights, InsightsRenderOptions},
	parameters::SearchParameters,
	results::{add_absolute_position, add_query_id, Records, SearchResults},
	vision::Vision,
	widget::{DisposeOptions, InitOptions, RenderOptions, Widget, WidgetKind},
};
use std::rc::Rc;
#[cfg(feature = "dangerous-logging")]
use tracing::trace;

#[derive(Clone, Default)]
pub struct RecordsParams {
	pub transform_items: Option<TransformItems>,
}

#[derive(Clone)]
pub struct RecordsRenderOptions {
	pub vision: Vision,
	/// Annotated with `__position` and `__queryID`, then transformed.
	pub records: Records,
	/// `None` on the first render.
	pub results: Option<Rc<SearchResults>>,
	/// Only set by [`connect_records_with_insights`], once results are available.
	pub insights: Option<Insights>,
	pub widget_params: Rc<RecordsParams>,
}

impl InsightsRenderOptions for RecordsRenderOptions {
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
pub fn connect_records(render_fn: Option<Renderer<RecordsRenderOptions>>, unmount_fn: Option<Unmounter>) -> Result<RecordsConnector> {
	Ok(RecordsConnector {
		render_fn: check_rendering(render_fn, "records")?,
		unmount_fn: unmount_or_noop(unmount_fn),
	})
}

/// Like [`connect_records`], with an [`Insights`] handle in the render options.
///
/// # Errors
///
/// [`Error::InvalidRenderFunction`](`crate::Error::InvalidRenderFunction`) without `render_fn`.
pub fn connect_records_with_insights(render_fn: Option<Renderer<RecordsRenderOptions>>, unmount_fn: Option<Unmounter>) -> Result<RecordsConnector> {
	connect_records(render_fn.map(with_insights), unmount_fn)
}

#[derive(Clone)]
pub struct RecordsConnector {
	render_fn: Renderer<RecordsRenderOptions>,
	unmount_fn: Unmounter,
}

impl RecordsConnector {
	#[must_use]
	pub fn widget(&self, params: RecordsParams) -> RecordsWidget {
		RecordsWidget {
			render_fn: Rc::clone(&self.render_fn),
			unmount_fn: Rc::clone(&self.unmount_fn),
			widget_params: Rc::new(params),
		}
	}
}

/// Renders the records of the latest response.
pub struct RecordsWidget {
	render_fn: Renderer<RecordsRenderOptions>,
	unmount_fn: Unmounter,
	widget_params: Rc<RecordsParams>,
}

impl Widget for RecordsWidget {
	fn kind(&self) -> WidgetKind {
		WidgetKind::Records
	}

	fn init(&self, options: &InitOptions<'_>) {
		(self.render_fn)(
			RecordsRenderOptions {
				vision: options.vision.clone(),
				records: Records::default(),
				results: None,
				insights: None,
				widget_params: Rc::clone(&self.widget_params),
			},
			true,
		);
	}

	fn render(&self, options: &RenderOptions<'_>) {
		let results = options.results;

		let records = add_absolute_position(results.records.clone(), results.page, results.per_page);
		let records = add_query_id(records, results.query_id.as_deref());
		// The escape marker survives the transformation, so that records aren't escaped twice.
		let records = records.map_records(|records| transform(self.widget_params.transform_items.as_ref(), records));

		#[cfg(feature = "dangerous-logging")]
		trace!(?records, "Rendering records.");

		(self.render_fn)(
			RecordsRenderOptions {
				vision: options.vision.clone(),
				records,
				results: Some(Rc::clone(results)),
				insights: None,
				widget_params: Rc::clone(&self.widget_params),
			},
			false,
		);
	}

	fn dispose(&self, options: &DisposeOptions<'_>) -> Option<SearchParameters> {
		(self.unmount_fn)();
		Some(options.state.clone())
	}
}
