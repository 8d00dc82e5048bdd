mod common;

use common::{last, options, spy, MockClient};
use std::rc::Rc;
use vision_dom::{
	connectors::{connect_records, RecordsParams, RecordsRenderOptions, TransformItems},
	add_absolute_position, escape_records, Error, Record, Records, RenderOptions, SearchParameters, SearchResponse, SearchResults, Vision, Widget,
};

fn response() -> SearchResponse {
	SearchResponse::with_records(vec![
		Record::new("1").with_field("name", "Northside Clinic"),
		Record::new("2").with_field("name", "<b>Harbour</b> Pharmacy"),
	])
	.page(2)
	.per_page(10)
	.num_pages(3)
	.query_id("q-42")
}

#[test]
fn render_function_is_required() {
	assert_eq!(connect_records(None, None).err(), Some(Error::InvalidRenderFunction("records")));
}

#[test]
fn records_are_annotated_then_transformed() {
	let client = MockClient::new(|_| response());
	let (render_fn, calls) = spy::<RecordsRenderOptions>();
	let transform_items: TransformItems = Rc::new(|records: Vec<Record>| -> Vec<Record> { records.into_iter().rev().collect() });
	let widget = connect_records(Some(render_fn), None).unwrap().widget(RecordsParams {
		transform_items: Some(transform_items),
	});

	let vision = Vision::new(options(&client)).unwrap();
	vision.add_widgets(&[widget.into()]).unwrap();
	vision.start().unwrap();
	assert_eq!(calls.borrow().len(), 1);
	assert!(calls.borrow()[0].1);
	assert!(calls.borrow()[0].0.results.is_none());

	vision.flush().unwrap();
	let options = last(&calls);
	let annotated: Vec<_> = options.records.iter().map(|record| (record.id.as_str(), record.position, record.query_id.as_deref())).collect();
	assert_eq!(annotated, [("2", Some(22), Some("q-42")), ("1", Some(21), Some("q-42"))]);
	assert_eq!(options.results.unwrap().total, 2);
	assert!(options.insights.is_none());
}

#[test]
fn the_escape_marker_survives_transformation() {
	let client = MockClient::empty();
	let vision = Vision::new(options(&client)).unwrap();
	vision.start().unwrap();
	let helper = vision.main_index().helper().unwrap();

	let (render_fn, calls) = spy::<RecordsRenderOptions>();
	let transform_items: TransformItems = Rc::new(|records: Vec<Record>| -> Vec<Record> { records.into_iter().take(1).collect() });
	let widget = connect_records(Some(render_fn), None).unwrap().widget(RecordsParams {
		transform_items: Some(transform_items),
	});

	let state = SearchParameters::for_index("facilities");
	let mut results = SearchResults::new(state.clone(), response());
	results.records = escape_records(results.records);
	let results = Rc::new(results);

	widget.render(&RenderOptions {
		vision: &vision,
		helper: &helper,
		results: &results,
		scoped_results: &[],
		state: &state,
		create_url: &|_: &SearchParameters| String::new(),
	});

	let options = last(&calls);
	assert!(options.records.is_escaped());
	assert_eq!(options.records.len(), 1);
	assert_eq!(options.records[0].fields["name"], "Northside Clinic");
}

#[test]
fn escaping_leaves_ids_alone() {
	let records = Records::new(vec![Record::new("<id>").with_field("name", "Tom & Jerry's").with_field("tags", vec!["<a>"])]);
	let escaped = escape_records(records);
	assert!(escaped.is_escaped());
	assert_eq!(escaped[0].id, "<id>");
	assert_eq!(escaped[0].fields["name"], "Tom &amp; Jerry&#39;s");
	assert_eq!(escaped[0].fields["tags"][0], "&lt;a&gt;");

	let twice = escape_records(escaped.clone());
	assert_eq!(twice, escaped);
}

#[test]
fn positions_saturate_on_huge_pages() {
	let records = Records::new(vec![Record::new("a"), Record::new("b")]);
	let annotated = add_absolute_position(records.clone(), 5_000_000, 1000);
	assert!(annotated.iter().all(|record| record.position == Some(u32::MAX)));

	let near_the_end = add_absolute_position(records, 1, u32::MAX - 3);
	let positions: Vec<_> = near_the_end.iter().map(|record| record.position).collect();
	assert_eq!(positions, [Some(u32::MAX - 2), Some(u32::MAX - 1)]);
}
