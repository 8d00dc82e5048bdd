//! Listing and clearing the refinements of an index.

use crate::{
	helper::Helper,
	parameters::{RefinementMap, SearchParameters},
	results::{FacetResult, SearchResults},
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RefinementKind {
	Facet,
	Exclude,
	Disjunctive,
	Query,
}

/// One active selection, as listed by [`get_refinements`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Refinement {
	#[serde(rename = "type")]
	pub kind: RefinementKind,
	/// The facet name, or `"query"`.
	pub property: String,
	/// The refined value, or the query.
	pub name: String,
	/// How many records have this value, if the response counted it.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub count: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub exhaustive: Option<bool>,
}

impl Refinement {
	fn new(kind: RefinementKind, property: &str, name: &str) -> Self {
		Self {
			kind,
			property: property.to_owned(),
			name: name.to_owned(),
			count: None,
			exhaustive: None,
		}
	}

	fn with_facet_data(mut self, facets: &[FacetResult]) -> Self {
		if let Some(facet) = facets.iter().find(|facet| facet.name == self.property) {
			self.count = facet.data.get(&self.name).copied();
			self.exhaustive = facet.exhaustive;
		}
		self
	}
}

/// Facet names in a stable order.
fn sorted_entries(refinements: &RefinementMap) -> Vec<(&String, &Vec<String>)> {
	let mut entries: Vec<_> = refinements.iter().collect();
	entries.sort_unstable_by_key(|(property, _)| *property);
	entries
}

/// Negative numeric values are escaped in disjunctive refinements.
fn unescape_refinement(value: &str) -> &str {
	match value.strip_prefix("\\-") {
		Some(_) => &value[1..],
		None => value,
	}
}

/// Lists the conjunctive, exclude and disjunctive refinements of `state` (each group ordered by facet name),
/// with counts from `results`, and the query last if `clears_query` is set and it isn't blank.
#[must_use]
pub fn get_refinements(results: &SearchResults, state: &SearchParameters, clears_query: bool) -> Vec<Refinement> {
	let mut refinements = Vec::new();

	for (property, values) in sorted_entries(state.facets_refinements()) {
		refinements.extend(values.iter().map(|value| Refinement::new(RefinementKind::Facet, property, value).with_facet_data(&results.facets)));
	}
	for (property, values) in sorted_entries(state.facets_excludes()) {
		refinements.extend(values.iter().map(|value| Refinement::new(RefinementKind::Exclude, property, value)));
	}
	for (property, values) in sorted_entries(state.disjunctive_facets_refinements()) {
		refinements.extend(
			values
				.iter()
				.map(|value| Refinement::new(RefinementKind::Disjunctive, property, unescape_refinement(value)).with_facet_data(&results.disjunctive_facets)),
		);
	}

	if let Some(query) = state.query().filter(|query| clears_query && !query.trim().is_empty()) {
		refinements.push(Refinement::new(RefinementKind::Query, "query", query));
	}
	refinements
}

/// The state of `helper` at page 0 with the refinements of `properties_to_clear` removed.
///
/// `"query"` clears the query. Without a list, every refined facet is cleared (but not the query).
/// The result is not applied to `helper`.
#[must_use]
pub fn clear_refinements(helper: &Helper, properties_to_clear: Option<&[&str]>) -> SearchParameters {
	let state = helper.state().set_page(0);

	let refined: Vec<String>;
	let properties: Vec<&str> = match properties_to_clear {
		Some(properties) => properties.to_vec(),
		None => {
			refined = state
				.facets_refinements()
				.keys()
				.chain(state.disjunctive_facets_refinements().keys())
				.chain(state.facets_excludes().keys())
				.cloned()
				.collect();
			refined.iter().map(String::as_str).collect()
		}
	};

	let mut next = properties.iter().fold(state.clone(), |next, property| {
		if state.is_disjunctive_facet(property) {
			next.remove_disjunctive_facet_refinement(property, None)
		} else if state.is_conjunctive_facet(property) {
			next.remove_facet_refinement(property, None).remove_exclude_refinement(property, None)
		} else {
			next
		}
	});

	if properties.contains(&"query") {
		next = next.set_query("");
	}
	next
}
