//! The top-level controller.

use crate::{
	client::SearchClient,
	error::{Error, Result},
	helper::Helper,
	index::Index,
	insights::InsightsClient,
	parameters::SearchParameters,
	routing::{Routing, RoutingManager},
	scheduler::{queue_microtask, Scheduler},
	widget::{UiState, WidgetRef},
};
use core::{cell::Cell, cell::RefCell, fmt};
use std::rc::{Rc, Weak};
use tracing::{error, info, instrument, trace};

/// Configuration of a [`Vision`].
///
/// ```rust
/// use std::rc::Rc;
/// use vision_dom::{SearchRequest, SearchResponse, Vision, VisionOptions};
///
/// let client = Rc::new(|requests: &[SearchRequest]| -> vision_dom::Result<Vec<SearchResponse>> {
/// 	Ok(requests.iter().map(|_| SearchResponse::default()).collect())
/// });
/// let vision = Vision::new(VisionOptions {
/// 	index_name: "health_facilities".to_owned(),
/// 	..VisionOptions::new(client)
/// })?;
/// vision.start()?;
/// vision.flush()?;
/// # Ok::<(), vision_dom::Error>(())
/// ```
#[derive(Clone)]
pub struct VisionOptions {
	/// Name of the backend index that the root [`Index`] searches.
	pub index_name: String,
	pub search_client: Rc<dyn SearchClient>,
	/// Selections to restore on [`start`](`Vision::start`). Overridden by route state where routing is enabled.
	pub initial_ui_state: UiState,
	pub routing: Option<Routing>,
	pub insights_client: Option<Rc<dyn InsightsClient>>,
}

impl VisionOptions {
	/// Options without an index name. Fill it in with struct update syntax.
	#[must_use]
	pub fn new(search_client: Rc<dyn SearchClient>) -> Self {
		Self {
			index_name: String::new(),
			search_client,
			initial_ui_state: UiState::new(),
			routing: None,
			insights_client: None,
		}
	}
}

/// Owns the root [`Index`], the one network-facing [`Helper`] and the batching scheduler.
///
/// Cloning yields another handle to the same controller.
#[derive(Clone)]
pub struct Vision(Rc<VisionInner>);

/// A non-owning handle to a [`Vision`].
#[derive(Clone)]
pub struct WeakVision(Weak<VisionInner>);

impl WeakVision {
	#[must_use]
	pub fn upgrade(&self) -> Option<Vision> {
		self.0.upgrade().map(Vision)
	}
}

struct VisionInner {
	client: Rc<dyn SearchClient>,
	main_index: Index,
	main_helper: RefCell<Option<Helper>>,
	initial_ui_state: UiState,
	routing: Option<RoutingManager>,
	insights_client: Option<Rc<dyn InsightsClient>>,
	scheduler: Scheduler,
	started: Cell<bool>,
}

impl fmt::Debug for Vision {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Vision")
			.field("main_index", &self.0.main_index)
			.field("started", &self.0.started.get())
			.finish()
	}
}

impl Vision {
	/// # Errors
	///
	/// [`Error::MissingIndexName`] if `options.index_name` is empty.
	pub fn new(options: VisionOptions) -> Result<Self> {
		let VisionOptions {
			index_name,
			search_client,
			initial_ui_state,
			routing,
			insights_client,
		} = options;
		Ok(Self(Rc::new(VisionInner {
			client: search_client,
			main_index: Index::new(&index_name, None)?,
			main_helper: RefCell::new(None),
			initial_ui_state,
			routing: routing.map(RoutingManager::new),
			insights_client,
			scheduler: Scheduler::default(),
			started: Cell::new(false),
		})))
	}

	#[must_use]
	pub fn downgrade(&self) -> WeakVision {
		WeakVision(Rc::downgrade(&self.0))
	}

	#[must_use]
	pub fn main_index(&self) -> &Index {
		&self.0.main_index
	}

	/// The network-facing helper. `None` unless started.
	#[must_use]
	pub fn helper(&self) -> Option<Helper> {
		self.0.main_helper.borrow().clone()
	}

	#[must_use]
	pub fn insights_client(&self) -> Option<Rc<dyn InsightsClient>> {
		self.0.insights_client.clone()
	}

	#[must_use]
	pub fn is_started(&self) -> bool {
		self.0.started.get()
	}

	/// Mounts `widgets` on the root index.
	///
	/// # Errors
	///
	/// See [`Index::add_widgets`].
	pub fn add_widgets(&self, widgets: &[WidgetRef]) -> Result<&Self> {
		self.0.main_index.add_widgets(widgets)?;
		Ok(self)
	}

	/// Unmounts `widgets` from the root index.
	///
	/// # Errors
	///
	/// See [`Index::remove_widgets`].
	pub fn remove_widgets(&self, widgets: &[WidgetRef]) -> Result<&Self> {
		self.0.main_index.remove_widgets(widgets)?;
		Ok(self)
	}

	/// Creates the network-facing helper, initializes the index tree and schedules the first search.
	///
	/// # Errors
	///
	/// [`Error::AlreadyStarted`] on a second call.
	#[instrument(skip(self))]
	pub fn start(&self) -> Result<()> {
		if self.0.started.get() {
			return Err(Error::AlreadyStarted);
		}

		let main_index = &self.0.main_index;
		let helper = Helper::new(Rc::clone(&self.0.client), SearchParameters::for_index(main_index.index_name()));
		*self.0.main_helper.borrow_mut() = Some(helper);

		let mut ui_state = self.0.initial_ui_state.clone();
		if let Some(routing) = &self.0.routing {
			ui_state.extend(routing.read());
		}

		main_index.init(self, None, &ui_state)?;
		self.0.started.set(true);

		if let Some(routing) = &self.0.routing {
			let weak = self.downgrade();
			routing.on_update(move |route| {
				let Some(vision) = weak.upgrade() else { return };
				if let Some(routing) = &vision.0.routing {
					let ui_state = routing.to_ui_state(route);
					vision.apply_ui_state(&ui_state);
				}
			});
		}

		info!("Started with {} root widget(s).", main_index.widgets().len());
		self.schedule_search();
		Ok(())
	}

	/// Disposes the index tree and the routing, and drops the network-facing helper.
	///
	/// Pending work is cancelled. The [`Vision`] can be started again afterwards.
	#[instrument(skip(self))]
	pub fn dispose(&self) {
		self.0.scheduler.cancel();
		self.0.main_index.dispose();
		if let Some(routing) = &self.0.routing {
			routing.dispose();
		}
		let helper = self.0.main_helper.borrow_mut().take();
		if let Some(helper) = helper {
			helper.remove_all_listeners();
		}
		self.0.started.set(false);
	}

	/// Requests a search. Requests made before the next [`flush`](`Vision::flush`) are batched.
	pub fn schedule_search(&self) {
		if self.0.scheduler.request_search() {
			self.queue_flush();
		}
	}

	/// Requests a render pass. Requests made before the next [`flush`](`Vision::flush`) are batched.
	pub fn schedule_render(&self) {
		if self.0.scheduler.request_render() {
			self.queue_flush();
		}
	}

	fn queue_flush(&self) {
		let weak = self.downgrade();
		let queued = queue_microtask(move || {
			let Some(vision) = weak.upgrade() else { return };
			vision.0.scheduler.set_flush_queued(false);
			if let Err(error) = vision.flush() {
				error!("Scheduled search failed: {}", error);
			}
		});
		self.0.scheduler.set_flush_queued(queued);
	}

	/// Performs the pending search, then the pending render pass, until neither is requested anymore.
	///
	/// Browsers call this automatically on a microtask. Elsewhere, call it after changing state.
	///
	/// # Errors
	///
	/// The first search error. A pending render stays scheduled.
	#[instrument(skip(self))]
	pub fn flush(&self) -> Result<()> {
		loop {
			if self.0.scheduler.take_search() {
				let helper = self.helper().ok_or(Error::NotStarted("search"))?;
				helper.search()?;
			} else if self.0.scheduler.take_render() {
				trace!("Rendering.");
				self.0.main_index.render(self);
			} else {
				debug_assert!(self.0.scheduler.is_idle());
				return Ok(());
			}
		}
	}

	/// The selections of every index in the tree.
	#[must_use]
	pub fn get_ui_state(&self) -> UiState {
		self.0.main_index.get_widget_state(UiState::new())
	}

	/// Restores the index tree from `ui_state`, writes the route and schedules a search.
	///
	/// # Errors
	///
	/// [`Error::NotStarted`] before [`start`](`Vision::start`).
	pub fn set_ui_state(&self, ui_state: &UiState) -> Result<()> {
		if !self.0.started.get() {
			return Err(Error::NotStarted("setUiState"));
		}
		self.0.main_index.apply_ui_state(ui_state);
		self.on_state_change();
		self.schedule_search();
		Ok(())
	}

	/// Like [`set_ui_state`](`Vision::set_ui_state`), but without writing the route, which it came from.
	fn apply_ui_state(&self, ui_state: &UiState) {
		if !self.0.started.get() {
			return;
		}
		self.0.main_index.apply_ui_state(ui_state);
		self.schedule_search();
	}

	/// The URL of the current state with `ui_state` merged over it (per index id). `"#"` without routing.
	#[must_use]
	pub fn create_url(&self, ui_state: &UiState) -> String {
		let Some(routing) = &self.0.routing else {
			return String::from("#");
		};
		let mut full = self.get_ui_state();
		full.extend(ui_state.iter().map(|(index_id, state)| (index_id.clone(), state.clone())));
		routing.create_url(&full)
	}

	/// Called by the index tree whenever a helper state changes through a notifying setter.
	pub(crate) fn on_state_change(&self) {
		if let Some(routing) = &self.0.routing {
			routing.write(&self.get_ui_state());
		}
	}
}
