//! State containers that sit between widgets and the search client.
//!
//! A [`Vision`](`crate::Vision`) owns exactly one network-facing [`Helper`].
//! Every [`Index`](`crate::Index`) owns a scoped [`Helper`] that only holds state and forwards [`Helper::search`] to it,
//! plus a [`DerivedHelper`] registered on it that resolves the parameters actually sent for that index.

use crate::{
	client::{SearchClient, SearchRequest},
	error::{Error, Result},
	listeners::{ListenerId, Listeners},
	parameters::SearchParameters,
	results::SearchResults,
};
use core::{cell::RefCell, fmt};
use std::rc::{Rc, Weak};
use tracing::{info, instrument, trace, warn};

/// Emitted whenever a helper's state is replaced through a notifying setter.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
	pub state: SearchParameters,
	/// Whether the change reset the page, which nested indices have to follow.
	pub is_page_reset: bool,
}

#[derive(Clone)]
pub struct Helper(Rc<HelperInner>);

struct HelperInner {
	state: RefCell<SearchParameters>,
	last_results: RefCell<Option<Rc<SearchResults>>>,
	change: Listeners<ChangeEvent>,
	backend: Backend,
}

enum Backend {
	Client {
		client: Rc<dyn SearchClient>,
		derived: RefCell<Vec<DerivedHelper>>,
	},
	Forward(Weak<HelperInner>),
}

impl fmt::Debug for Helper {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Helper")
			.field("state", &*self.0.state.borrow())
			.field("network_facing", &matches!(self.0.backend, Backend::Client { .. }))
			.finish()
	}
}

impl Helper {
	/// A network-facing helper. Searching sends one request per derived helper.
	#[must_use]
	pub fn new(client: Rc<dyn SearchClient>, state: SearchParameters) -> Self {
		Self::with_backend(
			state,
			Backend::Client {
				client,
				derived: RefCell::new(Vec::new()),
			},
		)
	}

	/// A pure state container whose [`search`](`Helper::search`) and [`derive`](`Helper::derive`) go to `main`.
	#[must_use]
	pub fn scoped(main: &Helper, state: SearchParameters) -> Self {
		Self::with_backend(state, Backend::Forward(Rc::downgrade(&main.0)))
	}

	fn with_backend(state: SearchParameters, backend: Backend) -> Self {
		Self(Rc::new(HelperInner {
			state: RefCell::new(state),
			last_results: RefCell::new(None),
			change: Listeners::default(),
			backend,
		}))
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &Helper) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	#[must_use]
	pub fn state(&self) -> SearchParameters {
		self.0.state.borrow().clone()
	}

	#[must_use]
	pub fn last_results(&self) -> Option<Rc<SearchResults>> {
		self.0.last_results.borrow().clone()
	}

	pub(crate) fn set_last_results(&self, results: Option<Rc<SearchResults>>) {
		*self.0.last_results.borrow_mut() = results;
	}

	fn change(&self, state: SearchParameters, is_page_reset: bool) -> &Self {
		*self.0.state.borrow_mut() = state.clone();
		self.0.change.emit(&ChangeEvent { state, is_page_reset });
		self
	}

	pub fn set_state(&self, state: SearchParameters) -> &Self {
		self.change(state, false)
	}

	/// Replaces the state without notifying change listeners, so that e.g. the URL isn't updated.
	pub fn override_state_without_change(&self, state: SearchParameters) -> &Self {
		*self.0.state.borrow_mut() = state;
		self
	}

	pub fn set_query(&self, query: &str) -> &Self {
		let state = self.state().reset_page().set_query(query);
		self.change(state, true)
	}

	pub fn set_page(&self, page: u32) -> &Self {
		let state = self.state().set_page(page);
		self.change(state, false)
	}

	pub fn toggle_facet_refinement(&self, facet: &str, value: &str) -> &Self {
		let state = self.state().reset_page().toggle_facet_refinement(facet, value);
		self.change(state, true)
	}

	pub fn toggle_disjunctive_facet_refinement(&self, facet: &str, value: &str) -> &Self {
		let state = self.state().reset_page().toggle_disjunctive_facet_refinement(facet, value);
		self.change(state, true)
	}

	pub fn toggle_exclude_refinement(&self, facet: &str, value: &str) -> &Self {
		let state = self.state().reset_page().toggle_exclude_refinement(facet, value);
		self.change(state, true)
	}

	pub fn clear_refinements(&self, facet: Option<&str>) -> &Self {
		let state = self.state().reset_page();
		let state = match facet {
			Some(facet) => state.remove_facet_refinement(facet, None).remove_disjunctive_facet_refinement(facet, None).remove_exclude_refinement(facet, None),
			None => state.unset_all(["facetsRefinements", "disjunctiveFacetsRefinements", "facetsExcludes"]),
		};
		self.change(state, true)
	}

	pub fn on_change(&self, listener: impl Fn(&ChangeEvent) + 'static) -> ListenerId {
		self.0.change.publish(listener)
	}

	pub fn off_change(&self, id: ListenerId) -> bool {
		self.0.change.unpublish(id)
	}

	pub fn remove_all_listeners(&self) {
		self.0.change.clear();
	}

	/// Registers a derived helper on the network-facing helper this one belongs to.
	///
	/// `resolve` receives the network-facing helper's state and returns the parameters to send.
	pub fn derive(&self, resolve: impl Fn(&SearchParameters) -> SearchParameters + 'static) -> Result<DerivedHelper> {
		let main = self.main().ok_or(Error::NotStarted("derive"))?;
		let derived = DerivedHelper(Rc::new(DerivedInner {
			main: Rc::downgrade(&main.0),
			resolve: Box::new(resolve),
			last_results: RefCell::new(None),
			search: Listeners::default(),
			result: Listeners::default(),
		}));
		if let Backend::Client { derived: list, .. } = &main.0.backend {
			list.borrow_mut().push(derived.clone());
		}
		trace!("Derived helper registered.");
		Ok(derived)
	}

	fn main(&self) -> Option<Helper> {
		match &self.0.backend {
			Backend::Client { .. } => Some(self.clone()),
			Backend::Forward(main) => main.upgrade().map(Helper),
		}
	}

	/// Searches through the network-facing helper, with one request per derived helper.
	///
	/// Results are handed to each derived helper's result listeners before this returns.
	///
	/// # Errors
	///
	/// Errors of the search client, [`Error::ResponseMismatch`] for a malformed batch,
	/// and [`Error::NotStarted`] if the network-facing helper is gone.
	pub fn search(&self) -> Result<()> {
		let main = self.main().ok_or(Error::NotStarted("search"))?;
		main.search_with_derived()
	}

	#[instrument(skip(self))]
	fn search_with_derived(&self) -> Result<()> {
		let (client, derived) = match &self.0.backend {
			Backend::Client { client, derived } => (Rc::clone(client), derived.borrow().clone()),
			Backend::Forward(_) => unreachable!("only called on the network-facing helper"),
		};
		if derived.is_empty() {
			warn!("Search requested without any derived helper. Nothing to send.");
			return Ok(());
		}

		let main_state = self.state();
		let states: Vec<SearchParameters> = derived.iter().map(|derived| (derived.0.resolve)(&main_state)).collect();
		let requests: Vec<SearchRequest> = states
			.iter()
			.map(|state| SearchRequest {
				index_name: state.index().unwrap_or_default().to_owned(),
				params: state.unset("index"),
			})
			.collect();

		for (derived, state) in derived.iter().zip(&states) {
			derived.0.search.emit(state);
		}

		info!("Sending {} request(s).", requests.len());
		let responses = client.search(&requests)?;
		if responses.len() != requests.len() {
			return Err(Error::ResponseMismatch {
				expected: requests.len(),
				received: responses.len(),
			});
		}

		for ((derived, state), response) in derived.iter().zip(states).zip(responses) {
			let results = Rc::new(SearchResults::new(state, response));
			*derived.0.last_results.borrow_mut() = Some(Rc::clone(&results));
			derived.0.result.emit(&results);
		}
		Ok(())
	}
}

/// Read-only parameter resolver registered on the network-facing helper.
#[derive(Clone)]
pub struct DerivedHelper(Rc<DerivedInner>);

struct DerivedInner {
	main: Weak<HelperInner>,
	resolve: Box<dyn Fn(&SearchParameters) -> SearchParameters>,
	last_results: RefCell<Option<Rc<SearchResults>>>,
	search: Listeners<SearchParameters>,
	result: Listeners<Rc<SearchResults>>,
}

impl fmt::Debug for DerivedHelper {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DerivedHelper").field("has_results", &self.0.last_results.borrow().is_some()).finish()
	}
}

impl DerivedHelper {
	#[must_use]
	pub fn last_results(&self) -> Option<Rc<SearchResults>> {
		self.0.last_results.borrow().clone()
	}

	/// Called with the resolved parameters right before they are sent.
	pub fn on_search(&self, listener: impl Fn(&SearchParameters) + 'static) -> ListenerId {
		self.0.search.publish(listener)
	}

	pub fn on_result(&self, listener: impl Fn(&Rc<SearchResults>) + 'static) -> ListenerId {
		self.0.result.publish(listener)
	}

	/// Unregisters from the network-facing helper and drops all listeners.
	pub fn detach(&self) {
		if let Some(main) = self.0.main.upgrade() {
			if let Backend::Client { derived, .. } = &main.backend {
				derived.borrow_mut().retain(|derived| !Rc::ptr_eq(&derived.0, &self.0));
			}
		}
		self.0.search.clear();
		self.0.result.clear();
		trace!("Derived helper detached.");
	}
}
