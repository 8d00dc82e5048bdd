use thiserror::Error;

/// Everything that can go wrong while composing widgets, searching or reporting insights.
///
/// All of these are returned at the call that violates the contract. Nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
	#[error("The render function is not valid (received `{0}` without one). See the `{0}` connector documentation.")]
	InvalidRenderFunction(&'static str),

	#[error("The widget definition expects a `{method}` method (widget kind: `{kind}`).")]
	MissingLifecycleMethod { kind: String, method: &'static str },

	#[error("The `searchParameters` option expects an object of search parameters: {0}")]
	InvalidSearchParameters(String),

	#[error("The `indexName` option is required.")]
	MissingIndexName,

	#[error("The `start` method has already been called once.")]
	AlreadyStarted,

	#[error("The `start` method needs to be called before `{0}`.")]
	NotStarted(&'static str),

	#[error("Could not find id \"{0}\" passed to `insights` in the returned records. This is necessary to infer the absolute position and the query id.")]
	UnknownRecordId(String),

	#[error("Insights currently allows a single `queryID`. The `ids` provided map to multiple `queryID`s: {0:?}")]
	AmbiguousQueryId(Vec<String>),

	#[error("Could not infer `queryID`. Ensure `clickAnalytics: true` was added with the Configure widget.")]
	MissingQueryId,

	#[error("Unsupported method passed to insights: \"{0}\".")]
	UnsupportedInsightsMethod(String),

	#[error("The `insightsClient` option has not been provided to `Vision`.")]
	InsightsClientMissing,

	#[error("Expected `ids` to be an array of strings.")]
	InvalidInsightsIds,

	#[error("The insights payload is not valid: {0}")]
	InvalidInsightsPayload(String),

	#[error("The route state could not be read as UI state: {0}")]
	InvalidRouteState(String),

	#[error("Container must be a CSS selector or an element (received `{0}`).")]
	InvalidContainer(String),

	#[error("Container not found: no element matches `{0}`.")]
	ContainerNotFound(String),

	#[error("The search client returned {received} result(s) for {expected} request(s).")]
	ResponseMismatch { expected: usize, received: usize },

	#[error("The search client failed: {0}")]
	Client(String),
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
