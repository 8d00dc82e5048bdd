//! Synchronization between the [`UiState`] of a [`Vision`](`crate::Vision`) and some external storage, usually the URL.

use crate::{
	error::{Error, Result},
	listeners::Listeners,
	widget::UiState,
};
use core::cell::RefCell;
use serde_json::{Map, Value};
use std::rc::Rc;
use tracing::{trace, warn};

/// The form in which a [`Router`] stores state. Produced by a [`StateMapping`].
pub type RouteState = Value;

/// Reads and writes route state from and to a storage.
pub trait Router {
	fn read(&self) -> RouteState;
	fn write(&self, route: &RouteState);
	/// May return an empty string.
	fn create_url(&self, route: &RouteState) -> String;
	/// Registers `callback` to be called whenever the storage changes from outside (e.g. on navigation).
	fn on_update(&self, callback: Box<dyn Fn(&RouteState)>);
	/// Called when the [`Vision`](`crate::Vision`) is disposed.
	fn dispose(&self) {}
}

/// Converts between [`UiState`] and route state.
///
/// For every [`UiState`] `u`, `route_to_state(&state_to_route(&u))` must reconstruct `u`
/// (for the fields that the mapping keeps).
pub trait StateMapping {
	fn state_to_route(&self, ui_state: &UiState) -> RouteState;

	/// # Errors
	///
	/// [`Error::InvalidRouteState`] if `route` can't be read.
	fn route_to_state(&self, route: &RouteState) -> Result<UiState>;
}

fn without_configure(ui_state: &UiState) -> UiState {
	ui_state
		.iter()
		.map(|(index_id, index_ui_state)| {
			let mut index_ui_state = index_ui_state.clone();
			index_ui_state.configure = None;
			(index_id.clone(), index_ui_state)
		})
		.collect()
}

fn parse_ui_state(route: &RouteState) -> Result<UiState> {
	if route.is_null() {
		return Ok(UiState::new());
	}
	serde_json::from_value(route.clone()).map_err(|error| Error::InvalidRouteState(error.to_string()))
}

/// Keeps the full [`UiState`], minus the `configure` blocks (which are owned by the page, not the user).
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleStateMapping;

impl StateMapping for SimpleStateMapping {
	fn state_to_route(&self, ui_state: &UiState) -> RouteState {
		serde_json::to_value(without_configure(ui_state)).unwrap_or_else(|_| Value::Object(Map::new()))
	}

	fn route_to_state(&self, route: &RouteState) -> Result<UiState> {
		parse_ui_state(route).map(|ui_state| without_configure(&ui_state))
	}
}

/// Keeps only the state of one index, flattened into the route.
#[derive(Debug, Clone)]
pub struct SingleIndexStateMapping {
	index_name: String,
}

impl SingleIndexStateMapping {
	#[must_use]
	pub fn new(index_name: impl Into<String>) -> Self {
		Self { index_name: index_name.into() }
	}
}

impl StateMapping for SingleIndexStateMapping {
	fn state_to_route(&self, ui_state: &UiState) -> RouteState {
		without_configure(ui_state)
			.remove(&self.index_name)
			.and_then(|index_ui_state| serde_json::to_value(index_ui_state).ok())
			.unwrap_or_else(|| Value::Object(Map::new()))
	}

	fn route_to_state(&self, route: &RouteState) -> Result<UiState> {
		let mut wrapped = Map::new();
		wrapped.insert(self.index_name.clone(), route.clone());
		SimpleStateMapping.route_to_state(&Value::Object(wrapped))
	}
}

/// A [`Router`] without persistence, e.g. for tests or embedded UIs.
///
/// [`navigate`](`MemoryRouter::navigate`) simulates a change from outside.
#[derive(Default)]
pub struct MemoryRouter {
	route: RefCell<RouteState>,
	writes: RefCell<Vec<RouteState>>,
	update: Listeners<RouteState>,
}

impl MemoryRouter {
	#[must_use]
	pub fn new(initial: RouteState) -> Self {
		Self {
			route: RefCell::new(initial),
			..Self::default()
		}
	}

	#[must_use]
	pub fn route(&self) -> RouteState {
		self.route.borrow().clone()
	}

	/// Every route written so far, oldest first.
	#[must_use]
	pub fn writes(&self) -> Vec<RouteState> {
		self.writes.borrow().clone()
	}

	pub fn navigate(&self, route: RouteState) {
		*self.route.borrow_mut() = route.clone();
		self.update.emit(&route);
	}
}

impl Router for MemoryRouter {
	fn read(&self) -> RouteState {
		self.route()
	}

	fn write(&self, route: &RouteState) {
		*self.route.borrow_mut() = route.clone();
		self.writes.borrow_mut().push(route.clone());
	}

	fn create_url(&self, route: &RouteState) -> String {
		format!("#{}", route)
	}

	fn on_update(&self, callback: Box<dyn Fn(&RouteState)>) {
		self.update.publish(callback);
	}

	fn dispose(&self) {
		self.update.clear();
	}
}

/// Routing configuration of a [`Vision`](`crate::Vision`).
#[derive(Clone)]
pub struct Routing {
	pub router: Rc<dyn Router>,
	pub state_mapping: Rc<dyn StateMapping>,
}

impl Routing {
	#[must_use]
	pub fn new(router: Rc<dyn Router>, state_mapping: Rc<dyn StateMapping>) -> Self {
		Self { router, state_mapping }
	}
}

/// Owns the routing of one [`Vision`](`crate::Vision`) and suppresses redundant writes.
pub(crate) struct RoutingManager {
	routing: Routing,
	last_route: RefCell<Option<RouteState>>,
}

impl RoutingManager {
	pub fn new(routing: Routing) -> Self {
		Self {
			routing,
			last_route: RefCell::new(None),
		}
	}

	/// Unreadable route state is reported and treated as empty.
	pub fn read(&self) -> UiState {
		let route = self.routing.router.read();
		self.to_ui_state(&route)
	}

	pub fn to_ui_state(&self, route: &RouteState) -> UiState {
		match self.routing.state_mapping.route_to_state(route) {
			Ok(ui_state) => {
				*self.last_route.borrow_mut() = Some(route.clone());
				ui_state
			}
			Err(error) => {
				warn!("Ignoring route state: {}", error);
				UiState::new()
			}
		}
	}

	pub fn write(&self, ui_state: &UiState) {
		let route = self.routing.state_mapping.state_to_route(ui_state);
		if self.last_route.borrow().as_ref() == Some(&route) {
			trace!("Route unchanged, not written.");
			return;
		}
		self.routing.router.write(&route);
		*self.last_route.borrow_mut() = Some(route);
	}

	pub fn create_url(&self, ui_state: &UiState) -> String {
		let route = self.routing.state_mapping.state_to_route(ui_state);
		self.routing.router.create_url(&route)
	}

	pub fn on_update(&self, callback: impl Fn(&RouteState) + 'static) {
		self.routing.router.on_update(Box::new(callback));
	}

	pub fn dispose(&self) {
		self.routing.router.dispose();
		*self.last_route.borrow_mut() = None;
	}
}
