#![allow(dead_code)]

use std::{cell::RefCell, rc::Rc};
use vision_dom::{
	connectors::Renderer, DisposeOptions, InitOptions, Lifecycle, Record, RenderOptions, SearchClient, SearchParameters, SearchRequest, SearchResponse, VisionOptions,
	Widget, WidgetKind, WidgetSearchParametersOptions,
};

/// Answers every request with `respond` and remembers each batch.
pub struct MockClient {
	batches: RefCell<Vec<Vec<SearchRequest>>>,
	respond: Box<dyn Fn(&SearchRequest) -> SearchResponse>,
}

impl MockClient {
	pub fn new(respond: impl Fn(&SearchRequest) -> SearchResponse + 'static) -> Rc<Self> {
		Rc::new(Self {
			batches: RefCell::default(),
			respond: Box::new(respond),
		})
	}

	pub fn empty() -> Rc<Self> {
		Self::new(|_| SearchResponse::default())
	}

	pub fn batches(&self) -> Vec<Vec<SearchRequest>> {
		self.batches.borrow().clone()
	}

	pub fn last_batch(&self) -> Vec<SearchRequest> {
		self.batches.borrow().last().cloned().expect("no search was sent")
	}
}

impl SearchClient for MockClient {
	fn search(&self, requests: &[SearchRequest]) -> vision_dom::Result<Vec<SearchResponse>> {
		self.batches.borrow_mut().push(requests.to_vec());
		Ok(requests.iter().map(|request| (self.respond)(request)).collect())
	}
}

/// Two records per page out of five pages, with ids `"{page}-{n}"` and the query id `"qid"`.
pub fn paged_response(request: &SearchRequest) -> SearchResponse {
	let page = request.params.page().unwrap_or(0);
	SearchResponse::with_records(vec![Record::new(format!("{}-0", page)), Record::new(format!("{}-1", page))])
		.page(page)
		.per_page(2)
		.num_pages(5)
		.query_id("qid")
}

pub fn options(client: &Rc<MockClient>) -> VisionOptions {
	VisionOptions {
		index_name: "facilities".to_owned(),
		..VisionOptions::new(Rc::clone(client) as Rc<dyn SearchClient>)
	}
}

pub type Calls<O> = Rc<RefCell<Vec<(O, bool)>>>;

/// A render function that keeps every call.
pub fn spy<O: 'static>() -> (Renderer<O>, Calls<O>) {
	let calls: Calls<O> = Rc::default();
	let render_fn: Renderer<O> = {
		let calls = Rc::clone(&calls);
		Rc::new(move |options: O, is_first_render: bool| calls.borrow_mut().push((options, is_first_render)))
	};
	(render_fn, calls)
}

pub fn last<O: Clone>(calls: &Calls<O>) -> O {
	calls.borrow().last().map(|(options, _)| options.clone()).expect("never rendered")
}

pub type Log = Rc<RefCell<Vec<String>>>;

/// Writes `"<hook> <name>"` to its log for every lifecycle hook.
pub struct LoggingWidget {
	pub name: &'static str,
	pub log: Log,
	pub lifecycle: Lifecycle,
	pub parameters: Option<Box<dyn Fn(SearchParameters) -> SearchParameters>>,
	/// Index ids of the scoped results of the last render.
	pub scoped: Rc<RefCell<Vec<String>>>,
}

impl LoggingWidget {
	pub fn new(name: &'static str, log: &Log) -> Self {
		Self {
			name,
			log: Rc::clone(log),
			lifecycle: Lifecycle::ALL,
			parameters: None,
			scoped: Rc::default(),
		}
	}

	fn write(&self, hook: &str) {
		self.log.borrow_mut().push(format!("{} {}", hook, self.name));
	}
}

impl Widget for LoggingWidget {
	fn kind(&self) -> WidgetKind {
		WidgetKind::Custom("test.logging")
	}

	fn lifecycle(&self) -> Lifecycle {
		self.lifecycle
	}

	fn init(&self, _options: &InitOptions<'_>) {
		self.write("init");
	}

	fn render(&self, options: &RenderOptions<'_>) {
		self.write("render");
		*self.scoped.borrow_mut() = options.scoped_results.iter().map(|scoped| scoped.index_id.clone()).collect();
	}

	fn dispose(&self, options: &DisposeOptions<'_>) -> Option<SearchParameters> {
		self.write("dispose");
		Some(options.state.clone())
	}

	fn get_widget_search_parameters(&self, state: SearchParameters, _options: &WidgetSearchParametersOptions<'_>) -> SearchParameters {
		match &self.parameters {
			Some(parameters) => parameters(state),
			None => state,
		}
	}
}

pub fn plain(value: serde_json::Value) -> vision_dom::PlainSearchParameters {
	match value {
		serde_json::Value::Object(plain) => plain,
		other => panic!("expected an object, got {}", other),
	}
}
