//! Ready-made widgets that render plain HTML lists into a container.
//!
//! Clicks on elements carrying `data-insights-*` attributes (see [`write_data_attributes`](`crate::insights::write_data_attributes`))
//! inside a records container are reported through the [`Vision`](`crate::Vision`)'s insights client.

use crate::{
	connectors::{
		connect_configure, connect_infinite_records_with_insights, connect_records_with_insights, ConfigureParams, ConfigureWidget, InfiniteRecordsParams,
		InfiniteRecordsRenderOptions, InfiniteRecordsWidget, RecordsParams, RecordsRenderOptions, RecordsWidget, Renderer, TransformItems, Unmounter,
	},
	dom::{escape_html, escape_records, ClickListener, Container},
	error::Result,
	insights::{find_data_attributes, read_data_attributes, Insights},
	results::{Record, Records},
};
use core::cell::RefCell;
use std::rc::Rc;
use tracing::{error, instrument, trace};
use web_sys::Element;

/// Renders one record into HTML.
pub type Template = Rc<dyn Fn(&Record) -> String>;

const SHOW_MORE: &str = "show-more";
const SHOW_PREVIOUS: &str = "show-previous";
const ACTION_ATTRIBUTE: &str = "data-vis-action";

/// A renderless widget that applies `params.search_parameters`.
///
/// # Errors
///
/// [`Error::InvalidSearchParameters`](`crate::Error::InvalidSearchParameters`) for invalid parameters.
pub fn configure(params: ConfigureParams) -> Result<ConfigureWidget> {
	connect_configure(None, None).widget(params)
}

#[derive(Clone)]
pub struct RecordsWidgetParams {
	pub container: Container,
	/// Defaults to the record as JSON.
	pub item_template: Option<Template>,
	/// Rendered (as is) instead of the list when there are no records.
	pub empty_template: String,
	/// Whether string values of records are HTML-escaped before they reach `item_template`.
	pub escape_html: bool,
	pub transform_items: Option<TransformItems>,
}

impl Default for RecordsWidgetParams {
	fn default() -> Self {
		Self {
			container: Container::default(),
			item_template: None,
			empty_template: "No results".to_owned(),
			escape_html: true,
			transform_items: None,
		}
	}
}

#[derive(Clone)]
pub struct InfiniteRecordsWidgetParams {
	pub container: Container,
	pub item_template: Option<Template>,
	pub empty_template: String,
	pub escape_html: bool,
	pub transform_items: Option<TransformItems>,
	/// Adds a button to load earlier pages, and keeps the page in the UI state.
	pub show_previous: bool,
	pub show_more_label: String,
	pub show_previous_label: String,
}

impl Default for InfiniteRecordsWidgetParams {
	fn default() -> Self {
		Self {
			container: Container::default(),
			item_template: None,
			empty_template: "No results".to_owned(),
			escape_html: true,
			transform_items: None,
			show_previous: false,
			show_more_label: "Show more results".to_owned(),
			show_previous_label: "Show previous results".to_owned(),
		}
	}
}

fn default_item_template(record: &Record) -> String {
	serde_json::to_string_pretty(record).unwrap_or_default()
}

fn render_list(class: &str, records: &[Record], item_template: &Template, empty_template: &str) -> String {
	if records.is_empty() {
		return format!(r#"<div class="{0} {0}--empty">{1}</div>"#, class, empty_template);
	}
	let items: String = records.iter().map(|record| format!(r#"<li class="{}-item">{}</li>"#, class, item_template(record))).collect();
	format!(r#"<div class="{0}"><ol class="{0}-list">{1}</ol></div>"#, class, items)
}

fn prepare(records: Records, escape: bool) -> Records {
	if escape {
		escape_records(records)
	} else {
		records
	}
}

/// Forwards clicks on `data-insights-*` elements to the latest [`Insights`] handle.
fn report_insights(clicked: &Element, insights: &RefCell<Option<Insights>>) {
	let Some(element) = find_data_attributes(clicked) else { return };
	let Some(insights) = insights.borrow().clone() else {
		trace!("Insights click before the first results, ignored.");
		return;
	};
	let sent = read_data_attributes(&element).and_then(|(method, payload)| insights.send(method.as_str(), payload));
	if let Err(error) = sent {
		error!("Failed to send insights event: {}", error);
	}
}

/// Renders the records of the latest response into `params.container`.
///
/// # Errors
///
/// [`Error::InvalidContainer`](`crate::Error::InvalidContainer`) or [`Error::ContainerNotFound`](`crate::Error::ContainerNotFound`)
/// if the container can't be resolved.
#[instrument(skip_all)]
pub fn records(params: RecordsWidgetParams) -> Result<RecordsWidget> {
	let RecordsWidgetParams {
		container,
		item_template,
		empty_template,
		escape_html,
		transform_items,
	} = params;
	let container = container.resolve()?;
	let item_template = item_template.unwrap_or_else(|| Rc::new(default_item_template));

	let insights: Rc<RefCell<Option<Insights>>> = Rc::default();
	let listener = {
		let insights = Rc::clone(&insights);
		RefCell::new(Some(ClickListener::attach(&container, move |clicked| report_insights(clicked, &insights))))
	};

	let render_fn: Renderer<RecordsRenderOptions> = {
		let container = container.clone();
		let insights = Rc::clone(&insights);
		Rc::new(move |options: RecordsRenderOptions, is_first_render: bool| {
			if is_first_render {
				return;
			}
			*insights.borrow_mut() = options.insights.clone();
			let records = prepare(options.records, escape_html);
			container.set_inner_html(&render_list("vis-records", &records, &item_template, &empty_template));
		})
	};

	let unmount_fn: Unmounter = Rc::new(move || {
		drop(listener.borrow_mut().take());
		*insights.borrow_mut() = None;
		container.set_inner_html("");
	});

	Ok(connect_records_with_insights(Some(render_fn), Some(unmount_fn))?.widget(RecordsParams { transform_items }))
}

fn render_infinite_list(params: &InfiniteRecordsChrome, options: &InfiniteRecordsRenderOptions, records: &[Record]) -> String {
	let mut html = String::new();
	if params.show_previous && !options.is_first_page {
		html.push_str(&format!(
			r#"<button class="vis-infiniteRecords-loadPrevious" {}="{}">{}</button>"#,
			ACTION_ATTRIBUTE,
			SHOW_PREVIOUS,
			escape_html(&params.show_previous_label)
		));
	}
	html.push_str(&render_list("vis-infiniteRecords", records, &params.item_template, &params.empty_template));
	html.push_str(&format!(
		r#"<button class="vis-infiniteRecords-loadMore" {}="{}"{}>{}</button>"#,
		ACTION_ATTRIBUTE,
		SHOW_MORE,
		if options.is_last_page { " disabled" } else { "" },
		escape_html(&params.show_more_label)
	));
	html
}

/// The presentational part of [`InfiniteRecordsWidgetParams`].
struct InfiniteRecordsChrome {
	item_template: Template,
	empty_template: String,
	show_previous: bool,
	show_more_label: String,
	show_previous_label: String,
}

fn handle_infinite_click(clicked: &Element, latest: &RefCell<Option<InfiniteRecordsRenderOptions>>) {
	let Some(options) = latest.borrow().clone() else { return };

	if let Ok(Some(button)) = clicked.closest(&format!("[{}]", ACTION_ATTRIBUTE)) {
		let result = match button.get_attribute(ACTION_ATTRIBUTE).as_deref() {
			Some(SHOW_MORE) => options.show_more(),
			Some(SHOW_PREVIOUS) => options.show_previous(),
			_ => Ok(()),
		};
		if let Err(error) = result {
			error!("Failed to load more records: {}", error);
		}
		return;
	}

	let insights = RefCell::new(options.insights);
	report_insights(clicked, &insights);
}

/// Renders every record received since the last non-paging change into `params.container`,
/// with buttons to load further (and optionally earlier) pages.
///
/// # Errors
///
/// [`Error::InvalidContainer`](`crate::Error::InvalidContainer`) or [`Error::ContainerNotFound`](`crate::Error::ContainerNotFound`)
/// if the container can't be resolved.
#[instrument(skip_all)]
pub fn infinite_records(params: InfiniteRecordsWidgetParams) -> Result<InfiniteRecordsWidget> {
	let InfiniteRecordsWidgetParams {
		container,
		item_template,
		empty_template,
		escape_html,
		transform_items,
		show_previous,
		show_more_label,
		show_previous_label,
	} = params;
	let container = container.resolve()?;
	let chrome = InfiniteRecordsChrome {
		item_template: item_template.unwrap_or_else(|| Rc::new(default_item_template)),
		empty_template,
		show_previous,
		show_more_label,
		show_previous_label,
	};

	let latest: Rc<RefCell<Option<InfiniteRecordsRenderOptions>>> = Rc::default();
	let listener = {
		let latest = Rc::clone(&latest);
		RefCell::new(Some(ClickListener::attach(&container, move |clicked| handle_infinite_click(clicked, &latest))))
	};

	let render_fn: Renderer<InfiniteRecordsRenderOptions> = {
		let container = container.clone();
		let latest = Rc::clone(&latest);
		Rc::new(move |options: InfiniteRecordsRenderOptions, is_first_render: bool| {
			if is_first_render {
				return;
			}
			let records = prepare(options.records.clone(), escape_html);
			container.set_inner_html(&render_infinite_list(&chrome, &options, &records));
			*latest.borrow_mut() = Some(options);
		})
	};

	// Also breaks the cycle from the stored options back to the `Vision`.
	let unmount_fn: Unmounter = Rc::new(move || {
		drop(listener.borrow_mut().take());
		*latest.borrow_mut() = None;
		container.set_inner_html("");
	});

	Ok(connect_infinite_records_with_insights(Some(render_fn), Some(unmount_fn))?.widget(InfiniteRecordsParams { transform_items, show_previous }))
}
