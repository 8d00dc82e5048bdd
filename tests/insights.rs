mod common;

use common::{last, options, spy, MockClient};
use serde_json::{json, Value};
use std::{cell::RefCell, rc::Rc};
use vision_dom::{
	connectors::{connect_records_with_insights, RecordsParams, RecordsRenderOptions},
	insights::{decode_payload, infer_payload, write_data_attributes, Insights, InsightsClient, InsightsMethod, InsightsPayload},
	Error, Record, Records, SearchParameters, SearchResponse, SearchResults, Vision, VisionOptions,
};

type Sent = Rc<RefCell<Vec<(InsightsMethod, InsightsPayload)>>>;

fn recording_client() -> (Rc<dyn InsightsClient>, Sent) {
	let sent: Sent = Rc::default();
	let client: Rc<dyn InsightsClient> = {
		let sent = Rc::clone(&sent);
		Rc::new(move |method: InsightsMethod, payload: &InsightsPayload| sent.borrow_mut().push((method, payload.clone())))
	};
	(client, sent)
}

fn record(id: &str, query_id: Option<&str>, position: u32) -> Record {
	Record {
		position: Some(position),
		query_id: query_id.map(str::to_owned),
		..Record::new(id)
	}
}

fn insights(client: Option<Rc<dyn InsightsClient>>, records: Vec<Record>) -> Insights {
	let results = Rc::new(SearchResults::new(SearchParameters::for_index("facilities"), SearchResponse::default()));
	Insights::new(client, results, Records::new(records))
}

#[test]
fn positions_and_query_id_are_inferred() {
	let (client, sent) = recording_client();
	let insights = insights(Some(client), vec![record("1", Some("Q"), 9), record("3", Some("Q"), 11)]);

	insights
		.send("clickedRecordIDsAfterSearch", json!({ "ids": ["3"], "eventName": "Add to Cart" }))
		.unwrap();

	let sent = sent.borrow();
	assert_eq!(sent.len(), 1);
	assert_eq!(sent[0].0, InsightsMethod::ClickedRecordIdsAfterSearch);
	assert_eq!(
		Value::Object(sent[0].1.clone()),
		json!({
			"eventName": "Add to Cart",
			"index": "facilities",
			"queryID": "Q",
			"ids": ["3"],
			"positions": [11],
		})
	);
}

#[test]
fn conversions_carry_no_positions() {
	let results = SearchResults::new(SearchParameters::for_index("facilities"), SearchResponse::default());
	let records = [record("1", Some("Q"), 1), record("2", Some("Q"), 2)];
	let payload = infer_payload(InsightsMethod::ConvertedRecordIdsAfterSearch, &results, &records, &["2".to_owned(), "1".to_owned()]).unwrap();
	assert_eq!(Value::Object(payload), json!({ "index": "facilities", "queryID": "Q", "ids": ["2", "1"] }));
}

#[test]
fn explicit_fields_override_inferred_ones() {
	let (client, sent) = recording_client();
	let insights = insights(Some(client), vec![record("1", Some("Q"), 4)]);
	insights
		.send("convertedRecordIDsAfterSearch", json!({ "ids": ["1"], "eventName": "Booked", "index": "archive" }))
		.unwrap();
	assert_eq!(sent.borrow()[0].1["index"], "archive");
}

#[test]
fn invalid_events_are_rejected() {
	let (client, sent) = recording_client();
	let records = vec![record("1", Some("Q"), 1), record("2", Some("R"), 2), record("3", None, 3)];
	let insights = insights(Some(client), records.clone());

	let send = |method: &str, payload: Value| insights.send(method, payload).err();
	assert_eq!(send("clickedRecordIDsAfterSearch", json!({ "ids": ["4"] })), Some(Error::UnknownRecordId("4".to_owned())));
	assert_eq!(
		send("clickedRecordIDsAfterSearch", json!({ "ids": ["1", "2"] })),
		Some(Error::AmbiguousQueryId(vec!["Q".to_owned(), "R".to_owned()]))
	);
	assert_eq!(send("clickedRecordIDsAfterSearch", json!({ "ids": ["3"] })), Some(Error::MissingQueryId));
	assert_eq!(send("viewedRecordIDs", json!({ "ids": ["1"] })), Some(Error::UnsupportedInsightsMethod("viewedRecordIDs".to_owned())));
	assert_eq!(send("clickedRecordIDsAfterSearch", json!({ "ids": "1" })), Some(Error::InvalidInsightsIds));
	assert_eq!(send("clickedRecordIDsAfterSearch", json!({ "ids": [1] })), Some(Error::InvalidInsightsIds));
	assert!(matches!(send("clickedRecordIDsAfterSearch", json!(["1"])), Some(Error::InvalidInsightsPayload(_))));
	assert!(sent.borrow().is_empty());

	let without_client = self::insights(None, records);
	assert_eq!(
		without_client.send("clickedRecordIDsAfterSearch", json!({ "ids": ["1"] })).err(),
		Some(Error::InsightsClientMissing)
	);
}

#[test]
fn decorated_render_options_carry_insights() {
	let client = MockClient::new(|_| SearchResponse::with_records(vec![Record::new("a"), Record::new("b")]).query_id("qid"));
	let (insights_client, sent) = recording_client();
	let (render_fn, calls) = spy::<RecordsRenderOptions>();
	let widget = connect_records_with_insights(Some(render_fn), None).unwrap().widget(RecordsParams::default());

	let vision = Vision::new(VisionOptions {
		insights_client: Some(insights_client),
		..options(&client)
	})
	.unwrap();
	vision.add_widgets(&[widget.into()]).unwrap();
	vision.start().unwrap();
	assert!(last(&calls).insights.is_none());

	vision.flush().unwrap();
	let insights = last(&calls).insights.expect("decorated after the first search");
	insights.send("clickedRecordIDsAfterSearch", json!({ "ids": ["b"], "eventName": "Open" })).unwrap();

	let sent = sent.borrow();
	assert_eq!(sent[0].1["queryID"], "qid");
	assert_eq!(sent[0].1["index"], "facilities");
	assert_eq!(sent[0].1["positions"], json!([2]));
}

#[test]
fn data_attributes_carry_a_base64_payload() {
	let payload = json!({ "ids": ["1"], "eventName": "Add to Cart" });
	let attributes = write_data_attributes(InsightsMethod::ClickedRecordIdsAfterSearch, &payload).unwrap();

	let (method, rest) = attributes.split_once(' ').unwrap();
	assert_eq!(method, r#"data-insights-method="clickedRecordIDsAfterSearch""#);
	let encoded = rest.strip_prefix(r#"data-insights-payload=""#).unwrap().strip_suffix('"').unwrap();
	assert_eq!(decode_payload(encoded).unwrap(), payload);

	assert!(matches!(
		write_data_attributes(InsightsMethod::ClickedRecordIdsAfterSearch, &json!("ids")),
		Err(Error::InvalidInsightsPayload(_))
	));
	assert!(matches!(decode_payload("not base64!"), Err(Error::InvalidInsightsPayload(_))));
}

#[test]
fn methods_parse_from_their_names() {
	assert_eq!("convertedRecordIDsAfterSearch".parse::<InsightsMethod>(), Ok(InsightsMethod::ConvertedRecordIdsAfterSearch));
	assert_eq!(InsightsMethod::ClickedRecordIdsAfterSearch.to_string(), "clickedRecordIDsAfterSearch");
	assert_eq!("clicked".parse::<InsightsMethod>(), Err(Error::UnsupportedInsightsMethod("clicked".to_owned())));
}
