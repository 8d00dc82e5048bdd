//! Click and conversion analytics for rendered records.
//!
//! [`with_insights`] decorates a render function so that its options carry an [`Insights`] handle.
//! That handle infers the query id and absolute positions of the records it is given ids of,
//! and forwards the completed event to the [`InsightsClient`] configured on the [`Vision`](`crate::Vision`).

use crate::{
	connectors::Renderer,
	error::{Error, Result},
	results::{Record, Records, SearchResults},
	vision::Vision,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use core::{fmt, str::FromStr};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::rc::Rc;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InsightsMethod {
	#[serde(rename = "clickedRecordIDsAfterSearch")]
	ClickedRecordIdsAfterSearch,
	#[serde(rename = "convertedRecordIDsAfterSearch")]
	ConvertedRecordIdsAfterSearch,
}

impl InsightsMethod {
	#[must_use]
	pub fn as_str(self) -> &'static str {
		match self {
			InsightsMethod::ClickedRecordIdsAfterSearch => "clickedRecordIDsAfterSearch",
			InsightsMethod::ConvertedRecordIdsAfterSearch => "convertedRecordIDsAfterSearch",
		}
	}
}

impl fmt::Display for InsightsMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for InsightsMethod {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"clickedRecordIDsAfterSearch" => Ok(InsightsMethod::ClickedRecordIdsAfterSearch),
			"convertedRecordIDsAfterSearch" => Ok(InsightsMethod::ConvertedRecordIdsAfterSearch),
			other => Err(Error::UnsupportedInsightsMethod(other.to_owned())),
		}
	}
}

/// `{eventName, index, queryID, ids, positions?}` and whatever else the caller adds.
pub type InsightsPayload = Map<String, Value>;

/// The analytics backend.
pub trait InsightsClient {
	fn send(&self, method: InsightsMethod, payload: &InsightsPayload);
}

impl<F> InsightsClient for F
where
	F: Fn(InsightsMethod, &InsightsPayload),
{
	fn send(&self, method: InsightsMethod, payload: &InsightsPayload) {
		self(method, payload);
	}
}

fn selected_records<'a>(records: &'a [Record], ids: &[String]) -> Result<Vec<&'a Record>> {
	ids.iter()
		.map(|id| records.iter().find(|record| record.id == *id).ok_or_else(|| Error::UnknownRecordId(id.clone())))
		.collect()
}

fn query_id(selected: &[&Record]) -> Result<String> {
	let mut query_ids: Vec<Option<&str>> = Vec::new();
	for record in selected {
		let query_id = record.query_id.as_deref();
		if !query_ids.contains(&query_id) {
			query_ids.push(query_id);
		}
	}
	match query_ids.as_slice() {
		[Some(query_id)] => Ok((*query_id).to_owned()),
		[] | [None] => Err(Error::MissingQueryId),
		_ => Err(Error::AmbiguousQueryId(query_ids.iter().map(|query_id| query_id.unwrap_or("undefined").to_owned()).collect())),
	}
}

/// Infers `index`, `queryID` and (for clicks) `positions` of the records with the given `ids`.
///
/// # Errors
///
/// [`Error::UnknownRecordId`] if an id isn't among `records`,
/// [`Error::AmbiguousQueryId`] or [`Error::MissingQueryId`] unless the selected records share exactly one query id.
pub fn infer_payload(method: InsightsMethod, results: &SearchResults, records: &[Record], ids: &[String]) -> Result<InsightsPayload> {
	let selected = selected_records(records, ids)?;
	let query_id = query_id(&selected)?;

	let mut payload = InsightsPayload::new();
	payload.insert("index".to_owned(), Value::from(results.index.clone()));
	payload.insert("queryID".to_owned(), Value::from(query_id));
	payload.insert("ids".to_owned(), Value::from(ids.to_vec()));
	if method == InsightsMethod::ClickedRecordIdsAfterSearch {
		let positions: Vec<Value> = selected.iter().map(|record| record.position.map_or(Value::Null, Value::from)).collect();
		payload.insert("positions".to_owned(), Value::Array(positions));
	}
	Ok(payload)
}

/// The `insights` function of decorated render options, bound to the results and records of one render.
#[derive(Clone)]
pub struct Insights {
	client: Option<Rc<dyn InsightsClient>>,
	results: Rc<SearchResults>,
	records: Records,
}

impl fmt::Debug for Insights {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Insights")
			.field("has_client", &self.client.is_some())
			.field("index", &self.results.index)
			.field("records", &self.records.len())
			.finish()
	}
}

impl Insights {
	#[must_use]
	pub fn new(client: Option<Rc<dyn InsightsClient>>, results: Rc<SearchResults>, records: Records) -> Self {
		Self { client, results, records }
	}

	/// Sends `method` with the inferred payload, overridden by the fields of `payload`.
	///
	/// # Errors
	///
	/// - [`Error::InsightsClientMissing`] if the [`Vision`] has no insights client,
	/// - [`Error::InvalidInsightsPayload`] if `payload` isn't an object,
	/// - [`Error::InvalidInsightsIds`] if `payload.ids` isn't a list of strings,
	/// - [`Error::UnsupportedInsightsMethod`] for an unknown `method`,
	/// - the errors of [`infer_payload`].
	pub fn send(&self, method: &str, payload: Value) -> Result<()> {
		let client = self.client.as_ref().ok_or(Error::InsightsClientMissing)?;
		let Value::Object(payload) = payload else {
			return Err(Error::InvalidInsightsPayload("expected an object".to_owned()));
		};
		let ids: Vec<String> = match payload.get("ids") {
			Some(Value::Array(ids)) => ids.iter().map(|id| id.as_str().map(str::to_owned).ok_or(Error::InvalidInsightsIds)).collect::<Result<_>>()?,
			_ => return Err(Error::InvalidInsightsIds),
		};
		let method: InsightsMethod = method.parse()?;

		let mut inferred = infer_payload(method, &self.results, &self.records, &ids)?;
		inferred.extend(payload);
		trace!("Sending insights event `{}` for {} record(s).", method, ids.len());
		client.send(method, &inferred);
		Ok(())
	}
}

/// Render options that can carry an [`Insights`] handle.
pub trait InsightsRenderOptions {
	fn vision(&self) -> &Vision;
	/// `None` on the first render.
	fn results(&self) -> Option<&Rc<SearchResults>>;
	fn records(&self) -> &Records;
	fn set_insights(&mut self, insights: Insights);
}

/// Wraps `render_fn` so that, whenever results are available, its options carry an [`Insights`] handle
/// bound to those results and the rendered records.
#[must_use]
pub fn with_insights<O: InsightsRenderOptions + 'static>(render_fn: Renderer<O>) -> Renderer<O> {
	Rc::new(move |mut options: O, is_first_render: bool| {
		if let Some(results) = options.results().cloned() {
			let insights = Insights::new(options.vision().insights_client(), results, options.records().clone());
			options.set_insights(insights);
		}
		render_fn(options, is_first_render);
	})
}

const METHOD_ATTRIBUTE: &str = "data-insights-method";
const PAYLOAD_ATTRIBUTE: &str = "data-insights-payload";

/// Renders `data-insights-*` attributes, for templates of clickable elements.
///
/// # Errors
///
/// [`Error::InvalidInsightsPayload`] if `payload` isn't an object.
pub fn write_data_attributes(method: InsightsMethod, payload: &Value) -> Result<String> {
	if !payload.is_object() {
		return Err(Error::InvalidInsightsPayload("The insights helper expects the payload to be an object.".to_owned()));
	}
	let serialized = serde_json::to_string(payload).map_err(|error| Error::InvalidInsightsPayload(error.to_string()))?;
	Ok(format!(
		r#"{}="{}" {}="{}""#,
		METHOD_ATTRIBUTE,
		method,
		PAYLOAD_ATTRIBUTE,
		STANDARD.encode(serialized)
	))
}

/// Decodes the value of a `data-insights-payload` attribute.
///
/// # Errors
///
/// [`Error::InvalidInsightsPayload`] unless `encoded` is base64-encoded JSON.
pub fn decode_payload(encoded: &str) -> Result<Value> {
	let invalid = || Error::InvalidInsightsPayload("The insights helper was unable to parse `data-insights-payload`.".to_owned());
	let bytes = STANDARD.decode(encoded.trim()).map_err(|_| invalid())?;
	serde_json::from_slice(&bytes).map_err(|_| invalid())
}

#[must_use]
pub fn has_data_attributes(element: &web_sys::Element) -> bool {
	element.has_attribute(METHOD_ATTRIBUTE)
}

/// The closest inclusive ancestor of `target` that has `data-insights-*` attributes.
#[must_use]
pub fn find_data_attributes(target: &web_sys::Element) -> Option<web_sys::Element> {
	target.closest(&format!("[{}]", METHOD_ATTRIBUTE)).ok().flatten()
}

/// # Errors
///
/// [`Error::UnsupportedInsightsMethod`] for a missing or unknown method,
/// [`Error::InvalidInsightsPayload`] for a missing or malformed payload.
pub fn read_data_attributes(element: &web_sys::Element) -> Result<(InsightsMethod, Value)> {
	let method = element.get_attribute(METHOD_ATTRIBUTE).unwrap_or_default().parse()?;
	let payload = element
		.get_attribute(PAYLOAD_ATTRIBUTE)
		.ok_or_else(|| Error::InvalidInsightsPayload(format!("missing `{}`", PAYLOAD_ATTRIBUTE)))?;
	Ok((method, decode_payload(&payload)?))
}
