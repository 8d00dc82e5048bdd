mod common;

use common::{last, options, paged_response, spy, Calls, MockClient};
use serde_json::json;
use std::{cell::Cell, rc::Rc};
use vision_dom::{
	connectors::{connect_infinite_records, InfiniteRecordsParams, InfiniteRecordsRenderOptions, Unmounter},
	DisposeOptions, Error, Helper, IndexUiState, SearchParameters, UiState, Vision, VisionOptions, Widget, WidgetSearchParametersOptions,
	WidgetStateOptions,
};

fn ids(options: &InfiniteRecordsRenderOptions) -> Vec<&str> {
	options.records.iter().map(|record| record.id.as_str()).collect()
}

fn mount(params: InfiniteRecordsParams, initial_ui_state: UiState) -> (Rc<MockClient>, Vision, Calls<InfiniteRecordsRenderOptions>) {
	let client = MockClient::new(paged_response);
	let (render_fn, calls) = spy();
	let widget = connect_infinite_records(Some(render_fn), None).unwrap().widget(params);

	let vision = Vision::new(VisionOptions {
		initial_ui_state,
		..options(&client)
	})
	.unwrap();
	vision.add_widgets(&[widget.into()]).unwrap();
	vision.start().unwrap();
	vision.flush().unwrap();
	(client, vision, calls)
}

#[test]
fn render_function_is_required() {
	assert_eq!(connect_infinite_records(None, None).err(), Some(Error::InvalidRenderFunction("infinite-records")));
}

#[test]
fn first_render_has_no_results() {
	let (_, _, calls) = mount(InfiniteRecordsParams::default(), UiState::new());
	let calls = calls.borrow();
	assert_eq!(calls.len(), 2);

	let (first, is_first_render) = &calls[0];
	assert!(*is_first_render);
	assert!(first.results.is_none());
	assert!(first.records.is_empty());
	assert!(first.is_first_page);

	let (second, is_first_render) = &calls[1];
	assert!(!*is_first_render);
	assert_eq!(ids(second), ["0-0", "0-1"]);
	assert!(second.is_first_page);
	assert!(!second.is_last_page);
}

#[test]
fn show_more_appends_the_next_page() {
	let (client, vision, calls) = mount(InfiniteRecordsParams::default(), UiState::new());

	last(&calls).show_more().unwrap();
	assert_eq!(client.last_batch()[0].params.page(), Some(1));
	vision.flush().unwrap();

	let options = last(&calls);
	assert_eq!(ids(&options), ["0-0", "0-1", "1-0", "1-1"]);
	let positions: Vec<_> = options.records.iter().map(|record| record.position).collect();
	assert_eq!(positions, [Some(1), Some(2), Some(3), Some(4)]);
	assert!(options.records.iter().all(|record| record.query_id.as_deref() == Some("qid")));
}

#[test]
fn rendering_the_same_page_twice_keeps_the_cache() {
	let (_, vision, calls) = mount(InfiniteRecordsParams::default(), UiState::new());
	last(&calls).show_more().unwrap();
	vision.flush().unwrap();

	vision.schedule_search();
	vision.flush().unwrap();

	assert_eq!(ids(&last(&calls)), ["0-0", "0-1", "1-0", "1-1"]);
}

#[test]
fn a_new_query_resets_the_cache() {
	let (_, vision, calls) = mount(InfiniteRecordsParams::default(), UiState::new());
	last(&calls).show_more().unwrap();
	vision.flush().unwrap();

	vision.main_index().helper().unwrap().set_query("pharmacy");
	vision.schedule_search();
	vision.flush().unwrap();

	let options = last(&calls);
	assert_eq!(ids(&options), ["0-0", "0-1"]);
	assert!(options.is_first_page);
}

#[test]
fn facet_lists_and_empty_refinements_keep_the_cache() {
	let (client, vision, calls) = mount(InfiniteRecordsParams::default(), UiState::new());
	last(&calls).show_more().unwrap();
	vision.flush().unwrap();

	let helper = vision.main_index().helper().unwrap();
	let state = helper
		.state()
		.add_facet("type")
		.add_disjunctive_facet("city")
		.set_query_parameter("maxValuesPerFacet", json!(50))
		.unwrap()
		.add_facet_refinement("type", "hospital")
		.remove_facet_refinement("type", Some("hospital"));
	assert_eq!(state.facets_refinements()["type"], Vec::<String>::new());
	helper.set_state(state);
	vision.schedule_search();
	vision.flush().unwrap();

	assert_eq!(client.last_batch()[0].params.max_values_per_facet(), Some(50));
	assert_eq!(ids(&last(&calls)), ["0-0", "0-1", "1-0", "1-1"]);

	// A refinement with a value is a real change.
	helper.set_state(helper.state().add_facet_refinement("type", "hospital"));
	vision.schedule_search();
	vision.flush().unwrap();
	assert_eq!(ids(&last(&calls)), ["1-0", "1-1"]);
}

#[test]
fn dispose_unsets_the_page_and_keeps_highlight_tags() {
	let unmounted = Rc::new(Cell::new(false));
	let unmount_fn: Unmounter = {
		let unmounted = Rc::clone(&unmounted);
		Rc::new(move || unmounted.set(true))
	};
	let (render_fn, _) = spy();
	let widget = connect_infinite_records(Some(render_fn), Some(unmount_fn)).unwrap().widget(InfiniteRecordsParams::default());
	let helper = Helper::new(MockClient::empty(), SearchParameters::new());
	let state = SearchParameters::for_index("facilities")
		.set_page(3)
		.set_query("clinic")
		.set_highlight_tags("<em class=\"hit\">", "</em>");

	let disposed = widget.dispose(&DisposeOptions { helper: &helper, state: &state }).unwrap();
	assert!(unmounted.get());
	assert_eq!(disposed.page(), None);
	assert_eq!(disposed.query(), Some("clinic"));
	assert_eq!(disposed.highlight_pre_tag(), Some("<em class=\"hit\">"));
	assert_eq!(disposed.highlight_post_tag(), Some("</em>"));
	assert_eq!(disposed, state.unset("page"));
}

#[test]
fn show_previous_prepends_earlier_pages() {
	let mut initial_ui_state = UiState::new();
	initial_ui_state.insert(
		"facilities".to_owned(),
		IndexUiState {
			page: Some(3),
			..IndexUiState::default()
		},
	);
	let params = InfiniteRecordsParams {
		show_previous: true,
		..InfiniteRecordsParams::default()
	};
	let (client, vision, calls) = mount(params, initial_ui_state);
	assert_eq!(client.last_batch()[0].params.page(), Some(2));

	let options = last(&calls);
	assert_eq!(ids(&options), ["2-0", "2-1"]);
	assert!(!options.is_first_page);

	options.show_previous().unwrap();
	vision.flush().unwrap();
	assert_eq!(ids(&last(&calls)), ["1-0", "1-1", "2-0", "2-1"]);

	last(&calls).show_previous().unwrap();
	vision.flush().unwrap();
	let options = last(&calls);
	assert_eq!(ids(&options), ["0-0", "0-1", "1-0", "1-1", "2-0", "2-1"]);
	assert!(options.is_first_page);

	let sent = client.batches().len();
	options.show_previous().unwrap();
	assert_eq!(client.batches().len(), sent);
}

#[test]
fn last_page_is_detected() {
	let (_, vision, calls) = mount(InfiniteRecordsParams::default(), UiState::new());
	for _ in 0..4 {
		last(&calls).show_more().unwrap();
		vision.flush().unwrap();
	}
	let options = last(&calls);
	assert_eq!(options.records.len(), 10);
	assert!(options.is_last_page);
}

#[test]
fn page_is_only_kept_in_the_ui_state_with_show_previous() {
	let (render_fn, _) = spy();
	let connector = connect_infinite_records(Some(render_fn), None).unwrap();
	let helper = Helper::new(MockClient::empty(), SearchParameters::new());
	let state = SearchParameters::new().set_page(2);
	let options = WidgetStateOptions {
		search_parameters: &state,
		helper: &helper,
	};

	let plain = connector.widget(InfiniteRecordsParams::default());
	assert_eq!(plain.get_widget_state(IndexUiState::default(), &options).page, None);

	let with_previous = connector.widget(InfiniteRecordsParams {
		show_previous: true,
		..InfiniteRecordsParams::default()
	});
	assert_eq!(with_previous.get_widget_state(IndexUiState::default(), &options).page, Some(3));

	let restored = with_previous.get_widget_search_parameters(
		SearchParameters::new(),
		&WidgetSearchParametersOptions {
			ui_state: &IndexUiState {
				page: Some(3),
				..IndexUiState::default()
			},
		},
	);
	assert_eq!(restored.page(), Some(2));
	let defaulted = plain.get_widget_search_parameters(SearchParameters::new(), &WidgetSearchParametersOptions { ui_state: &IndexUiState::default() });
	assert_eq!(defaulted.page(), Some(0));
}
