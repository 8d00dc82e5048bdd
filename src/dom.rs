//! Browser plumbing of the DOM widgets.

use crate::{
	error::{Error, Result},
	results::{Record, Records},
};
use serde_json::Value;
use tracing::{error, instrument, trace};
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::Element;

/// Where a DOM widget renders. Resolved once, when the widget is created.
#[derive(Debug, Clone)]
pub enum Container {
	/// Looked up with `document.querySelector`.
	Selector(String),
	Element(Element),
}

impl Default for Container {
	fn default() -> Self {
		Container::Selector(String::new())
	}
}

impl From<&str> for Container {
	fn from(selector: &str) -> Self {
		Container::Selector(selector.to_owned())
	}
}

impl From<String> for Container {
	fn from(selector: String) -> Self {
		Container::Selector(selector)
	}
}

impl From<Element> for Container {
	fn from(element: Element) -> Self {
		Container::Element(element)
	}
}

impl Container {
	/// # Errors
	///
	/// [`Error::InvalidContainer`] for a blank or malformed selector,
	/// [`Error::ContainerNotFound`] if no element matches it.
	#[instrument]
	pub fn resolve(self) -> Result<Element> {
		match self {
			Container::Element(element) => Ok(element),
			Container::Selector(selector) => {
				if selector.trim().is_empty() {
					return Err(Error::InvalidContainer(selector));
				}
				let document = web_sys::window()
					.and_then(|window| window.document())
					.ok_or_else(|| Error::ContainerNotFound(selector.clone()))?;
				match document.query_selector(&selector) {
					Ok(Some(element)) => Ok(element),
					Ok(None) => Err(Error::ContainerNotFound(selector)),
					Err(_) => Err(Error::InvalidContainer(selector)),
				}
			}
		}
	}
}

/// Escapes the characters that are significant in HTML text and attribute values.
#[must_use]
pub fn escape_html(value: &str) -> String {
	let mut escaped = String::with_capacity(value.len());
	for c in value.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&#39;"),
			c => escaped.push(c),
		}
	}
	escaped
}

fn escape_value(value: Value) -> Value {
	match value {
		Value::String(string) => Value::String(escape_html(&string)),
		Value::Array(values) => Value::Array(values.into_iter().map(escape_value).collect()),
		Value::Object(fields) => Value::Object(fields.into_iter().map(|(key, value)| (key, escape_value(value))).collect()),
		other => other,
	}
}

/// Escapes every string in the fields of `records` and marks them as escaped.
///
/// Ids are left as they are, since insights look records up by id. Records that are already marked are returned unchanged.
#[must_use]
pub fn escape_records(records: Records) -> Records {
	if records.is_escaped() {
		return records;
	}
	records
		.map_records(|records| {
			records
				.into_iter()
				.map(|record| Record {
					fields: record.fields.into_iter().map(|(key, value)| (key, escape_value(value))).collect(),
					..record
				})
				.collect()
		})
		.with_escaped(true)
}

/// A `click` listener on `target`, removed again on drop.
pub(crate) struct ClickListener {
	target: Element,
	handler: Closure<dyn Fn(web_sys::Event)>,
}

impl ClickListener {
	/// `handler` receives the clicked element.
	pub fn attach(target: &Element, handler: impl Fn(&Element) + 'static) -> Self {
		let handler = Closure::wrap(Box::new(move |event: web_sys::Event| {
			if let Some(element) = event.target().and_then(|target| target.dyn_into::<Element>().ok()) {
				handler(&element);
			}
		}) as Box<dyn Fn(web_sys::Event)>);
		if let Err(error) = target.add_event_listener_with_callback("click", handler.as_ref().unchecked_ref()) {
			error!("Failed to add click listener: {:?}", error);
		}
		trace!("Click listener attached.");
		Self { target: target.clone(), handler }
	}
}

impl Drop for ClickListener {
	fn drop(&mut self) {
		if let Err(error) = self.target.remove_event_listener_with_callback("click", self.handler.as_ref().unchecked_ref()) {
			error!("Failed to remove click listener: {:?}", error);
		}
		trace!("Click listener removed.");
	}
}
