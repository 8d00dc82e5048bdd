use crate::parameters::{SearchParameters, STRUCTURAL_KEYS};

/// Folds `parameters` from left to right into one parameter set.
///
/// For each `(left, right)` pair:
///
/// - refinement maps (disjunctive, excludes, conjunctive) are unioned, `right` wins per facet,
/// - facet name lists and rule contexts are unioned in first-seen order without duplicates,
///   and an empty rule context union is left unset,
/// - every other field present on `right` overwrites `left`.
///
/// An empty slice yields default parameters.
#[must_use]
pub fn merge_search_parameters(parameters: &[SearchParameters]) -> SearchParameters {
	let mut parameters = parameters.iter();
	let first = parameters.next().cloned().unwrap_or_default();
	parameters.fold(first, merge_pair)
}

pub(crate) fn merge_pair(left: SearchParameters, right: &SearchParameters) -> SearchParameters {
	let mut merged = left;

	{
		let [facets_refinements, disjunctive_refinements, excludes] = merged.refinement_maps_mut();
		disjunctive_refinements.extend(right.disjunctive_facets_refinements().iter().map(|(k, v)| (k.clone(), v.clone())));
		excludes.extend(right.facets_excludes().iter().map(|(k, v)| (k.clone(), v.clone())));
		facets_refinements.extend(right.facets_refinements().iter().map(|(k, v)| (k.clone(), v.clone())));
	}

	{
		let (facets, disjunctive_facets) = merged.facet_lists_mut();
		union_into(disjunctive_facets, right.disjunctive_facets());
		union_into(facets, right.facets());
	}

	{
		let rule_contexts = merged.rule_contexts_mut();
		let previous = rule_contexts.take().unwrap_or_default();
		let mut union = Vec::new();
		union_into(&mut union, previous.iter().chain(right.rule_contexts().unwrap_or_default()).filter(|context| !context.is_empty()));
		*rule_contexts = if union.is_empty() { None } else { Some(union) };
	}

	let mut rest = right.to_plain();
	for key in STRUCTURAL_KEYS {
		rest.remove(key);
	}
	if rest.is_empty() {
		return merged;
	}

	// Every remaining key came out of a valid parameter set, so it can't fail to apply.
	let mut plain = merged.to_plain();
	plain.extend(rest);
	SearchParameters::from_plain(&plain).unwrap_or(merged)
}

fn union_into<'a>(target: &mut Vec<String>, source: impl IntoIterator<Item = &'a String>) {
	for value in source {
		if !target.contains(value) {
			target.push(value.clone());
		}
	}
}
