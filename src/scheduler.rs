use core::cell::Cell;
use tracing::trace;

/// Cooperative batching of search and render requests.
///
/// Requests only raise flags. Any number of requests made before the next flush
/// collapse into one network round trip and one render pass.
#[derive(Debug, Default)]
pub(crate) struct Scheduler {
	search: Cell<bool>,
	render: Cell<bool>,
	flush_queued: Cell<bool>,
}

impl Scheduler {
	/// Returns whether a flush has to be queued.
	pub fn request_search(&self) -> bool {
		if !self.search.replace(true) {
			trace!("Search scheduled.");
		}
		!self.flush_queued.get()
	}

	/// Returns whether a flush has to be queued.
	pub fn request_render(&self) -> bool {
		if !self.render.replace(true) {
			trace!("Render scheduled.");
		}
		!self.flush_queued.get()
	}

	pub fn take_search(&self) -> bool {
		self.search.replace(false)
	}

	pub fn take_render(&self) -> bool {
		self.render.replace(false)
	}

	pub fn is_idle(&self) -> bool {
		!self.search.get() && !self.render.get()
	}

	pub fn set_flush_queued(&self, queued: bool) {
		self.flush_queued.set(queued);
	}

	pub fn cancel(&self) {
		self.search.set(false);
		self.render.set(false);
		trace!("Scheduled work cancelled.");
	}
}

/// Runs `flush` on the next microtask. Returns whether it was queued.
#[cfg(target_arch = "wasm32")]
pub(crate) fn queue_microtask(flush: impl FnOnce() + 'static) -> bool {
	use wasm_bindgen::{closure::Closure, JsValue};

	let callback = Closure::once(move |_: JsValue| flush());
	// The returned promise is not needed: the callback reports its own errors.
	let _ = js_sys::Promise::resolve(&JsValue::UNDEFINED).then(&callback);
	// Leaks one small closure per flush.
	callback.forget();
	true
}

/// Outside of a browser there is no event loop to hook into. Call [`Vision::flush`](`crate::Vision::flush`) instead.
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn queue_microtask(flush: impl FnOnce() + 'static) -> bool {
	drop(flush);
	false
}
