use crate::parameters::SearchParameters;
use core::ops::Deref;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One search hit.
///
/// `__position` and `__queryID` are filled in by the records connectors before rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
	pub id: String,
	#[serde(rename = "__position", default, skip_serializing_if = "Option::is_none")]
	pub position: Option<u32>,
	#[serde(rename = "__queryID", default, skip_serializing_if = "Option::is_none")]
	pub query_id: Option<String>,
	#[serde(flatten)]
	pub fields: Map<String, Value>,
}
impl Record {
	#[must_use]
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			position: None,
			query_id: None,
			fields: Map::new(),
		}
	}

	#[must_use]
	pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.fields.insert(key.into(), value.into());
		self
	}
}

/// An ordered list of records, plus whether its values have already been HTML-escaped.
///
/// The marker travels with the list through connector transforms,
/// so that several widgets reading the same results don't escape them twice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Records {
	records: Vec<Record>,
	escaped: bool,
}
impl Records {
	#[must_use]
	pub fn new(records: Vec<Record>) -> Self {
		Self { records, escaped: false }
	}

	#[must_use]
	pub fn is_escaped(&self) -> bool {
		self.escaped
	}

	#[must_use]
	pub fn with_escaped(mut self, escaped: bool) -> Self {
		self.escaped = escaped;
		self
	}

	#[must_use]
	pub fn into_vec(self) -> Vec<Record> {
		self.records
	}

	/// Maps the records while keeping the escape marker.
	#[must_use]
	pub fn map_records(self, f: impl FnOnce(Vec<Record>) -> Vec<Record>) -> Self {
		let escaped = self.escaped;
		Self::new(f(self.records)).with_escaped(escaped)
	}
}
impl Deref for Records {
	type Target = [Record];

	fn deref(&self) -> &Self::Target {
		&self.records
	}
}
impl From<Vec<Record>> for Records {
	fn from(records: Vec<Record>) -> Self {
		Self::new(records)
	}
}

/// Annotates each record with its 1-based position across all pages.
///
/// Positions beyond [`u32::MAX`] saturate.
#[must_use]
pub fn add_absolute_position(records: Records, page: u32, per_page: u32) -> Records {
	let offset = per_page.saturating_mul(page);
	records.map_records(|records| {
		records
			.into_iter()
			.zip(1_u32..)
			.map(|(record, index)| Record {
				position: Some(offset.saturating_add(index)),
				..record
			})
			.collect()
	})
}

/// Copies `query_id` onto every record. Without a query id, the records are returned unchanged.
#[must_use]
pub fn add_query_id(records: Records, query_id: Option<&str>) -> Records {
	match query_id {
		None | Some("") => records,
		Some(query_id) => records.map_records(|records| {
			records
				.into_iter()
				.map(|record| Record {
					query_id: Some(query_id.to_owned()),
					..record
				})
				.collect()
		}),
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
	#[serde(default)]
	pub query: String,
	#[serde(default)]
	pub page: u32,
	#[serde(default = "default_per_page")]
	pub per_page: u32,
	#[serde(default)]
	pub total: u32,
	#[serde(default)]
	pub num_pages: u32,
	#[serde(default)]
	pub params: String,
	#[serde(default)]
	pub exhaustive_total_records: bool,
	#[serde(default)]
	pub exhaustive_facets_count: bool,
	#[serde(rename = "processingTimeMS", default)]
	pub processing_time_ms: u64,
}
impl Default for ResponseMeta {
	fn default() -> Self {
		Self {
			query: String::new(),
			page: 0,
			per_page: default_per_page(),
			total: 0,
			num_pages: 0,
			params: String::new(),
			exhaustive_total_records: true,
			exhaustive_facets_count: true,
			processing_time_ms: 0,
		}
	}
}

fn default_per_page() -> u32 {
	20
}

/// Value counts of one facet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacetResult {
	pub name: String,
	#[serde(default)]
	pub data: HashMap<String, u32>,
	#[serde(default)]
	pub exhaustive: Option<bool>,
}

/// The backend's answer to one [`SearchRequest`](`crate::client::SearchRequest`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
	#[serde(default)]
	pub meta: ResponseMeta,
	#[serde(default)]
	pub records: Vec<Record>,
	#[serde(rename = "queryID", alias = "queryId", default, skip_serializing_if = "Option::is_none")]
	pub query_id: Option<String>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub facets: Vec<FacetResult>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub disjunctive_facets: Vec<FacetResult>,
}
impl SearchResponse {
	/// A single page response holding `records`, with the totals derived from them.
	#[must_use]
	pub fn with_records(records: Vec<Record>) -> Self {
		let total = u32::try_from(records.len()).unwrap_or(u32::MAX);
		let meta = ResponseMeta {
			total,
			num_pages: total.div_ceil(default_per_page()),
			..ResponseMeta::default()
		};
		Self {
			meta,
			records,
			..Self::default()
		}
	}

	#[must_use]
	pub fn page(mut self, page: u32) -> Self {
		self.meta.page = page;
		self
	}

	#[must_use]
	pub fn per_page(mut self, per_page: u32) -> Self {
		self.meta.per_page = per_page;
		self
	}

	#[must_use]
	pub fn num_pages(mut self, num_pages: u32) -> Self {
		self.meta.num_pages = num_pages;
		self
	}

	#[must_use]
	pub fn query_id(mut self, query_id: impl Into<String>) -> Self {
		self.query_id = Some(query_id.into());
		self
	}
}

/// A response bound to the parameters that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResults {
	pub index: String,
	pub state: SearchParameters,
	pub query: String,
	pub page: u32,
	pub per_page: u32,
	pub num_pages: u32,
	pub total: u32,
	pub processing_time_ms: u64,
	pub query_id: Option<String>,
	pub records: Records,
	pub facets: Vec<FacetResult>,
	pub disjunctive_facets: Vec<FacetResult>,
}
impl SearchResults {
	#[must_use]
	pub fn new(state: SearchParameters, response: SearchResponse) -> Self {
		let SearchResponse {
			meta,
			records,
			query_id,
			facets,
			disjunctive_facets,
		} = response;
		Self {
			index: state.index().unwrap_or_default().to_owned(),
			state,
			query: meta.query,
			page: meta.page,
			per_page: meta.per_page,
			num_pages: meta.num_pages,
			total: meta.total,
			processing_time_ms: meta.processing_time_ms,
			query_id,
			records: Records::new(records),
			facets,
			disjunctive_facets,
		}
	}
}
