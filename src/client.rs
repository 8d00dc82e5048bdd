use crate::{error::Result, parameters::SearchParameters, results::SearchResponse};
use serde::{Deserialize, Serialize};

/// One query of a batched search, scoped to one backend index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
	pub index_name: String,
	pub params: SearchParameters,
}

/// The backend. Called once per batched round trip with one request per index in the tree.
///
/// Implementations must answer with exactly one response per request, in request order.
/// Failures are reported as [`Error::Client`](`crate::Error::Client`) and propagate to whatever triggered the search.
pub trait SearchClient {
	fn search(&self, requests: &[SearchRequest]) -> Result<Vec<SearchResponse>>;
}

impl<F> SearchClient for F
where
	F: Fn(&[SearchRequest]) -> Result<Vec<SearchResponse>>,
{
	fn search(&self, requests: &[SearchRequest]) -> Result<Vec<SearchResponse>> {
		self(requests)
	}
}
