//! The [`SearchParameters`] value object.
//!
//! Every transformation returns a new instance. The receiver is never mutated.

use crate::error::{Error, Result};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The plain key/value form of [`SearchParameters`], as written by users (e.g. in a configure widget) or stored in UI state.
pub type PlainSearchParameters = Map<String, Value>;

/// Facet name → selected (or excluded) values.
pub type RefinementMap = HashMap<String, Vec<String>>;

/// Query state of one index.
///
/// Fields that are not modelled explicitly (analytics flags, filters, …) are kept as pass-through options
/// and forwarded to the search client unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParameters {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	index: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	query: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	page: Option<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	per_page: Option<u32>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	facets: Vec<String>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	disjunctive_facets: Vec<String>,
	#[serde(default, skip_serializing_if = "HashMap::is_empty")]
	facets_refinements: RefinementMap,
	#[serde(default, skip_serializing_if = "HashMap::is_empty")]
	disjunctive_facets_refinements: RefinementMap,
	#[serde(default, skip_serializing_if = "HashMap::is_empty")]
	facets_excludes: RefinementMap,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	rule_contexts: Option<Vec<String>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	max_values_per_facet: Option<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	highlight_pre_tag: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	highlight_post_tag: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	query_type: Option<String>,
	#[serde(flatten)]
	options: Map<String, Value>,
}

/// Keys whose values are merged structurally rather than overwritten.
pub(crate) const STRUCTURAL_KEYS: [&str; 6] = [
	"facets",
	"disjunctiveFacets",
	"facetsRefinements",
	"facetsExcludes",
	"disjunctiveFacetsRefinements",
	"ruleContexts",
];

impl SearchParameters {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn for_index(index: impl Into<String>) -> Self {
		Self {
			index: Some(index.into()),
			..Self::default()
		}
	}

	/// Reads parameters from their plain form.
	///
	/// # Errors
	///
	/// [`Error::InvalidSearchParameters`] if a known key holds a value of the wrong shape, e.g. a string `page`.
	pub fn from_plain(plain: &PlainSearchParameters) -> Result<Self> {
		serde_json::from_value(Value::Object(plain.clone())).map_err(|error| Error::InvalidSearchParameters(error.to_string()))
	}

	/// The plain form. Unset fields and empty collections are omitted.
	#[must_use]
	pub fn to_plain(&self) -> PlainSearchParameters {
		match serde_json::to_value(self) {
			Ok(Value::Object(plain)) => plain,
			_ => unreachable!("`SearchParameters` always serializes into an object"),
		}
	}

	/// Overwrites every key present in `plain`. A `null` value unsets the key.
	///
	/// # Errors
	///
	/// [`Error::InvalidSearchParameters`] if the result is not a valid parameter set.
	pub fn set_query_parameters(&self, plain: &PlainSearchParameters) -> Result<Self> {
		let mut next = self.to_plain();
		for (key, value) in plain {
			if value.is_null() {
				next.remove(key);
			} else {
				next.insert(key.clone(), value.clone());
			}
		}
		Self::from_plain(&next)
	}

	/// # Errors
	///
	/// [`Error::InvalidSearchParameters`] if `value` has the wrong shape for `key`.
	pub fn set_query_parameter(&self, key: &str, value: Value) -> Result<Self> {
		let mut plain = Map::new();
		plain.insert(key.to_owned(), value);
		self.set_query_parameters(&plain)
	}

	/// Removes `key` entirely, so that it falls through to the backend's default.
	#[must_use]
	pub fn unset(&self, key: &str) -> Self {
		let mut next = self.clone();
		match key {
			"index" => next.index = None,
			"query" => next.query = None,
			"page" => next.page = None,
			"perPage" => next.per_page = None,
			"facets" => next.facets.clear(),
			"disjunctiveFacets" => next.disjunctive_facets.clear(),
			"facetsRefinements" => next.facets_refinements.clear(),
			"disjunctiveFacetsRefinements" => next.disjunctive_facets_refinements.clear(),
			"facetsExcludes" => next.facets_excludes.clear(),
			"ruleContexts" => next.rule_contexts = None,
			"maxValuesPerFacet" => next.max_values_per_facet = None,
			"highlightPreTag" => next.highlight_pre_tag = None,
			"highlightPostTag" => next.highlight_post_tag = None,
			"queryType" => next.query_type = None,
			other => {
				next.options.remove(other);
			}
		}
		next
	}

	#[must_use]
	pub fn unset_all<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> Self {
		keys.into_iter().fold(self.clone(), |state, key| state.unset(key))
	}

	pub fn index(&self) -> Option<&str> {
		self.index.as_deref()
	}

	pub fn query(&self) -> Option<&str> {
		self.query.as_deref()
	}

	pub fn page(&self) -> Option<u32> {
		self.page
	}

	pub fn per_page(&self) -> Option<u32> {
		self.per_page
	}

	pub fn facets(&self) -> &[String] {
		&self.facets
	}

	pub fn disjunctive_facets(&self) -> &[String] {
		&self.disjunctive_facets
	}

	pub fn facets_refinements(&self) -> &RefinementMap {
		&self.facets_refinements
	}

	pub fn disjunctive_facets_refinements(&self) -> &RefinementMap {
		&self.disjunctive_facets_refinements
	}

	pub fn facets_excludes(&self) -> &RefinementMap {
		&self.facets_excludes
	}

	pub fn rule_contexts(&self) -> Option<&[String]> {
		self.rule_contexts.as_deref()
	}

	pub fn max_values_per_facet(&self) -> Option<u32> {
		self.max_values_per_facet
	}

	pub fn highlight_pre_tag(&self) -> Option<&str> {
		self.highlight_pre_tag.as_deref()
	}

	pub fn highlight_post_tag(&self) -> Option<&str> {
		self.highlight_post_tag.as_deref()
	}

	pub fn query_type(&self) -> Option<&str> {
		self.query_type.as_deref()
	}

	/// A pass-through option that is not modelled as a field.
	pub fn option(&self, key: &str) -> Option<&Value> {
		self.options.get(key)
	}

	#[must_use]
	pub fn set_index(&self, index: impl Into<String>) -> Self {
		Self {
			index: Some(index.into()),
			..self.clone()
		}
	}

	#[must_use]
	pub fn set_query(&self, query: impl Into<String>) -> Self {
		Self {
			query: Some(query.into()),
			..self.clone()
		}
	}

	#[must_use]
	pub fn set_page(&self, page: u32) -> Self {
		Self {
			page: Some(page),
			..self.clone()
		}
	}

	#[must_use]
	pub fn set_per_page(&self, per_page: u32) -> Self {
		Self {
			per_page: Some(per_page),
			..self.clone()
		}
	}

	#[must_use]
	pub fn set_highlight_tags(&self, pre: impl Into<String>, post: impl Into<String>) -> Self {
		Self {
			highlight_pre_tag: Some(pre.into()),
			highlight_post_tag: Some(post.into()),
			..self.clone()
		}
	}

	/// Sets the page back to `0`, unless no page was set at all.
	#[must_use]
	pub fn reset_page(&self) -> Self {
		match self.page {
			None => self.clone(),
			Some(_) => self.set_page(0),
		}
	}

	#[must_use]
	pub fn add_facet(&self, facet: &str) -> Self {
		let mut next = self.clone();
		if !next.facets.iter().any(|f| f == facet) {
			next.facets.push(facet.to_owned());
		}
		next
	}

	#[must_use]
	pub fn add_disjunctive_facet(&self, facet: &str) -> Self {
		let mut next = self.clone();
		if !next.disjunctive_facets.iter().any(|f| f == facet) {
			next.disjunctive_facets.push(facet.to_owned());
		}
		next
	}

	#[must_use]
	pub fn set_rule_contexts(&self, rule_contexts: Option<Vec<String>>) -> Self {
		Self {
			rule_contexts,
			..self.clone()
		}
	}

	pub fn is_conjunctive_facet(&self, facet: &str) -> bool {
		self.facets.iter().any(|f| f == facet)
	}

	pub fn is_disjunctive_facet(&self, facet: &str) -> bool {
		self.disjunctive_facets.iter().any(|f| f == facet)
	}

	pub fn is_facet_refined(&self, facet: &str, value: &str) -> bool {
		contains(&self.facets_refinements, facet, value)
	}

	pub fn is_disjunctive_facet_refined(&self, facet: &str, value: &str) -> bool {
		contains(&self.disjunctive_facets_refinements, facet, value)
	}

	pub fn is_exclude_refined(&self, facet: &str, value: &str) -> bool {
		contains(&self.facets_excludes, facet, value)
	}

	#[must_use]
	pub fn add_facet_refinement(&self, facet: &str, value: &str) -> Self {
		let mut next = self.clone();
		add_value(&mut next.facets_refinements, facet, value);
		next
	}

	/// Removes one value, or every value of `facet` if `value` is `None`.
	#[must_use]
	pub fn remove_facet_refinement(&self, facet: &str, value: Option<&str>) -> Self {
		let mut next = self.clone();
		remove_value(&mut next.facets_refinements, facet, value);
		next
	}

	#[must_use]
	pub fn toggle_facet_refinement(&self, facet: &str, value: &str) -> Self {
		if self.is_facet_refined(facet, value) {
			self.remove_facet_refinement(facet, Some(value))
		} else {
			self.add_facet_refinement(facet, value)
		}
	}

	#[must_use]
	pub fn add_disjunctive_facet_refinement(&self, facet: &str, value: &str) -> Self {
		let mut next = self.clone();
		add_value(&mut next.disjunctive_facets_refinements, facet, value);
		next
	}

	#[must_use]
	pub fn remove_disjunctive_facet_refinement(&self, facet: &str, value: Option<&str>) -> Self {
		let mut next = self.clone();
		remove_value(&mut next.disjunctive_facets_refinements, facet, value);
		next
	}

	#[must_use]
	pub fn toggle_disjunctive_facet_refinement(&self, facet: &str, value: &str) -> Self {
		if self.is_disjunctive_facet_refined(facet, value) {
			self.remove_disjunctive_facet_refinement(facet, Some(value))
		} else {
			self.add_disjunctive_facet_refinement(facet, value)
		}
	}

	#[must_use]
	pub fn add_exclude_refinement(&self, facet: &str, value: &str) -> Self {
		let mut next = self.clone();
		add_value(&mut next.facets_excludes, facet, value);
		next
	}

	#[must_use]
	pub fn remove_exclude_refinement(&self, facet: &str, value: Option<&str>) -> Self {
		let mut next = self.clone();
		remove_value(&mut next.facets_excludes, facet, value);
		next
	}

	#[must_use]
	pub fn toggle_exclude_refinement(&self, facet: &str, value: &str) -> Self {
		if self.is_exclude_refined(facet, value) {
			self.remove_exclude_refinement(facet, Some(value))
		} else {
			self.add_exclude_refinement(facet, value)
		}
	}

	pub(crate) fn refinement_maps_mut(&mut self) -> [&mut RefinementMap; 3] {
		[&mut self.facets_refinements, &mut self.disjunctive_facets_refinements, &mut self.facets_excludes]
	}

	pub(crate) fn facet_lists_mut(&mut self) -> (&mut Vec<String>, &mut Vec<String>) {
		(&mut self.facets, &mut self.disjunctive_facets)
	}

	pub(crate) fn rule_contexts_mut(&mut self) -> &mut Option<Vec<String>> {
		&mut self.rule_contexts
	}
}

fn contains(map: &RefinementMap, facet: &str, value: &str) -> bool {
	map.get(facet).map_or(false, |values| values.iter().any(|v| v == value))
}

fn add_value(map: &mut RefinementMap, facet: &str, value: &str) {
	let values = map.entry(facet.to_owned()).or_default();
	if !values.iter().any(|v| v == value) {
		values.push(value.to_owned());
	}
}

// Removing the last value keeps an empty entry, clearing the facet drops it.
fn remove_value(map: &mut RefinementMap, facet: &str, value: Option<&str>) {
	match value {
		None => {
			map.remove(facet);
		}
		Some(value) => {
			if let Some(values) = map.get_mut(facet) {
				values.retain(|v| v != value);
			}
		}
	}
}
