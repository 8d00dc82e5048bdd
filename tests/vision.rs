mod common;

use common::{last, options, spy, LoggingWidget, Log, MockClient};
use serde_json::json;
use std::rc::Rc;
use vision_dom::{
	connectors::{connect_search_box, SearchBoxParams, SearchBoxRenderOptions},
	routing::{MemoryRouter, Routing, SimpleStateMapping, SingleIndexStateMapping, StateMapping},
	Error, IndexUiState, SearchClient, SearchRequest, SearchResponse, UiState, Vision, VisionOptions, WidgetRef,
};

fn search_box() -> (WidgetRef, common::Calls<SearchBoxRenderOptions>) {
	let (render_fn, calls) = spy();
	(connect_search_box(Some(render_fn), None).unwrap().widget(SearchBoxParams::default()).into(), calls)
}

fn routed(client: &Rc<MockClient>, router: &Rc<MemoryRouter>) -> Vision {
	Vision::new(VisionOptions {
		routing: Some(Routing::new(Rc::clone(router) as _, Rc::new(SimpleStateMapping))),
		..options(client)
	})
	.unwrap()
}

fn query(query: &str) -> UiState {
	let mut ui_state = UiState::new();
	ui_state.insert(
		"facilities".to_owned(),
		IndexUiState {
			query: Some(query.to_owned()),
			..IndexUiState::default()
		},
	);
	ui_state
}

#[test]
fn index_name_is_required() {
	let client = MockClient::empty();
	assert!(matches!(Vision::new(VisionOptions::new(client)), Err(Error::MissingIndexName)));
}

#[test]
fn start_only_once() {
	let client = MockClient::empty();
	let vision = Vision::new(options(&client)).unwrap();
	assert!(!vision.is_started());
	assert!(vision.helper().is_none());

	vision.start().unwrap();
	assert!(vision.is_started());
	assert_eq!(vision.start(), Err(Error::AlreadyStarted));
}

#[test]
fn requests_are_batched_until_flushed() {
	let client = MockClient::empty();
	let log = Log::default();
	let vision = Vision::new(options(&client)).unwrap();
	vision.add_widgets(&[LoggingWidget::new("a", &log).into()]).unwrap();
	vision.start().unwrap();

	vision.schedule_search();
	vision.schedule_render();
	vision.schedule_search();
	assert!(client.batches().is_empty());

	vision.flush().unwrap();
	assert_eq!(client.batches().len(), 1);
	assert_eq!(*log.borrow(), ["init a", "render a"]);

	vision.flush().unwrap();
	assert_eq!(client.batches().len(), 1);
}

#[test]
fn search_errors_reach_flush() {
	let client: Rc<dyn SearchClient> = Rc::new(|_: &[SearchRequest]| -> vision_dom::Result<Vec<SearchResponse>> { Err(Error::Client("offline".to_owned())) });
	let vision = Vision::new(VisionOptions {
		index_name: "facilities".to_owned(),
		..VisionOptions::new(client)
	})
	.unwrap();
	vision.start().unwrap();
	assert_eq!(vision.flush(), Err(Error::Client("offline".to_owned())));
}

#[test]
fn malformed_batches_are_rejected() {
	let client: Rc<dyn SearchClient> = Rc::new(|_: &[SearchRequest]| -> vision_dom::Result<Vec<SearchResponse>> { Ok(Vec::new()) });
	let vision = Vision::new(VisionOptions {
		index_name: "facilities".to_owned(),
		..VisionOptions::new(client)
	})
	.unwrap();
	vision.start().unwrap();
	assert_eq!(vision.flush(), Err(Error::ResponseMismatch { expected: 1, received: 0 }));
}

#[test]
fn dispose_allows_restarting() {
	let client = MockClient::empty();
	let log = Log::default();
	let vision = Vision::new(options(&client)).unwrap();
	vision.add_widgets(&[LoggingWidget::new("a", &log).into()]).unwrap();
	vision.start().unwrap();
	vision.flush().unwrap();

	vision.dispose();
	assert!(!vision.is_started());
	assert!(!vision.main_index().is_initialized());
	assert_eq!(log.borrow().last().map(String::as_str), Some("dispose a"));

	vision.start().unwrap();
	vision.flush().unwrap();
	assert_eq!(client.batches().len(), 2);
	assert_eq!(client.last_batch().len(), 1);
}

#[test]
fn set_ui_state_requires_start() {
	let client = MockClient::empty();
	let vision = Vision::new(options(&client)).unwrap();
	assert_eq!(vision.set_ui_state(&query("x")), Err(Error::NotStarted("setUiState")));
}

#[test]
fn set_ui_state_restores_and_searches() {
	let client = MockClient::empty();
	let (widget, calls) = search_box();
	let vision = Vision::new(options(&client)).unwrap();
	vision.add_widgets(&[widget]).unwrap();
	vision.start().unwrap();
	vision.flush().unwrap();

	vision.set_ui_state(&query("urgent care")).unwrap();
	vision.flush().unwrap();
	assert_eq!(client.last_batch()[0].params.query(), Some("urgent care"));
	assert_eq!(last(&calls).query, "urgent care");
	assert_eq!(vision.get_ui_state(), query("urgent care"));
}

#[test]
fn route_state_overrides_the_initial_ui_state() {
	let client = MockClient::empty();
	let router = Rc::new(MemoryRouter::new(json!({ "facilities": { "query": "dentist" } })));
	let (widget, _) = search_box();

	let vision = Vision::new(VisionOptions {
		initial_ui_state: query("optician"),
		routing: Some(Routing::new(Rc::clone(&router) as _, Rc::new(SimpleStateMapping))),
		..options(&client)
	})
	.unwrap();
	vision.add_widgets(&[widget]).unwrap();
	vision.start().unwrap();
	vision.flush().unwrap();

	assert_eq!(client.last_batch()[0].params.query(), Some("dentist"));
	assert!(router.writes().is_empty());
}

#[test]
fn state_changes_are_written_to_the_route() {
	let client = MockClient::empty();
	let router = Rc::new(MemoryRouter::default());
	let (widget, calls) = search_box();
	let vision = routed(&client, &router);
	vision.add_widgets(&[widget]).unwrap();
	vision.start().unwrap();
	vision.flush().unwrap();

	last(&calls).refine("clinic").unwrap();
	assert_eq!(router.writes(), [json!({ "facilities": { "query": "clinic" } })]);

	// Unchanged routes aren't written again.
	last(&calls).refine("clinic").unwrap();
	assert_eq!(router.writes().len(), 1);
}

#[test]
fn route_updates_are_applied_without_writing_back() {
	let client = MockClient::empty();
	let router = Rc::new(MemoryRouter::default());
	let (widget, calls) = search_box();
	let vision = routed(&client, &router);
	vision.add_widgets(&[widget]).unwrap();
	vision.start().unwrap();
	vision.flush().unwrap();

	router.navigate(json!({ "facilities": { "query": "pharmacy" } }));
	vision.flush().unwrap();

	assert_eq!(client.last_batch()[0].params.query(), Some("pharmacy"));
	assert_eq!(last(&calls).query, "pharmacy");
	assert!(router.writes().is_empty());
	assert_eq!(vision.get_ui_state(), query("pharmacy"));
}

#[test]
fn unreadable_routes_are_ignored() {
	let client = MockClient::empty();
	let router = Rc::new(MemoryRouter::new(json!({ "facilities": { "page": "first" } })));
	let (widget, _) = search_box();
	let vision = routed(&client, &router);
	vision.add_widgets(&[widget]).unwrap();
	vision.start().unwrap();
	vision.flush().unwrap();
	assert_eq!(client.last_batch()[0].params.query(), Some(""));
}

#[test]
fn urls_merge_over_the_current_state() {
	let client = MockClient::empty();
	let without_routing = Vision::new(options(&client)).unwrap();
	assert_eq!(without_routing.create_url(&query("x")), "#");

	let router = Rc::new(MemoryRouter::default());
	let (widget, calls) = search_box();
	let vision = routed(&client, &router);
	vision.add_widgets(&[widget]).unwrap();
	vision.start().unwrap();
	vision.flush().unwrap();
	last(&calls).refine("clinic").unwrap();

	assert_eq!(vision.create_url(&UiState::new()), r##"#{"facilities":{"query":"clinic"}}"##);
	assert_eq!(vision.create_url(&query("pharmacy")), r##"#{"facilities":{"query":"pharmacy"}}"##);
}

#[test]
fn configure_blocks_stay_out_of_routes() {
	let mut ui_state = query("clinic");
	if let Some(facilities) = ui_state.get_mut("facilities") {
		facilities.configure = Some(common::plain(json!({ "analytics": false })));
	}

	let route = SimpleStateMapping.state_to_route(&ui_state);
	assert_eq!(route, json!({ "facilities": { "query": "clinic" } }));
	assert_eq!(SimpleStateMapping.route_to_state(&route).unwrap(), query("clinic"));
	assert_eq!(SimpleStateMapping.route_to_state(&serde_json::Value::Null).unwrap(), UiState::new());
	assert!(matches!(SimpleStateMapping.route_to_state(&json!(["clinic"])), Err(Error::InvalidRouteState(_))));

	let single = SingleIndexStateMapping::new("facilities");
	let route = single.state_to_route(&ui_state);
	assert_eq!(route, json!({ "query": "clinic" }));
	assert_eq!(single.route_to_state(&route).unwrap(), query("clinic"));
}

#[test]
fn reserved_ui_state_fields_are_carried_through_routes() {
	let mut ui_state = UiState::new();
	ui_state.insert(
		"facilities".to_owned(),
		IndexUiState {
			per_page: Some(40),
			refinement_list: Some([("city".to_owned(), vec!["Oslo".to_owned()])].into_iter().collect()),
			..IndexUiState::default()
		},
	);

	let route = SimpleStateMapping.state_to_route(&ui_state);
	assert_eq!(route, json!({ "facilities": { "perPage": 40, "refinementList": { "city": ["Oslo"] } } }));
	assert_eq!(SimpleStateMapping.route_to_state(&route).unwrap(), ui_state);
}
