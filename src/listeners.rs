use core::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::trace;

/// Handle returned by [`Listeners::publish`], used to unpublish the listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Handler<E> = Rc<dyn Fn(&E)>;

/// Ordered callback registry for one kind of event.
///
/// Listeners are called in registration order.
/// They may publish or unpublish listeners (including themselves) while an event is emitted;
/// such changes take effect from the next emission on.
pub(crate) struct Listeners<E: ?Sized> {
	next_id: Cell<u64>,
	handlers: RefCell<Vec<(ListenerId, Handler<E>)>>,
}
impl<E: ?Sized> Default for Listeners<E> {
	fn default() -> Self {
		Self {
			next_id: Cell::new(0),
			handlers: RefCell::new(Vec::new()),
		}
	}
}
impl<E: ?Sized> Listeners<E> {
	pub fn publish(&self, handler: impl Fn(&E) + 'static) -> ListenerId {
		let id = ListenerId(self.next_id.get());
		self.next_id.set(id.0 + 1);
		self.handlers.borrow_mut().push((id, Rc::new(handler)));
		trace!("Published listener {}.", id.0);
		id
	}

	/// Returns whether a listener was removed.
	pub fn unpublish(&self, id: ListenerId) -> bool {
		let mut handlers = self.handlers.borrow_mut();
		let count = handlers.len();
		handlers.retain(|(handler_id, _)| *handler_id != id);
		let removed = handlers.len() != count;
		if removed {
			trace!("Unpublished listener {}.", id.0);
		}
		removed
	}

	pub fn clear(&self) {
		let drained = self.handlers.borrow_mut().drain(..).count();
		trace!("Unpublished {} listener(s).", drained);
	}

	pub fn emit(&self, event: &E) {
		let handlers: Vec<Handler<E>> = self.handlers.borrow().iter().map(|(_, handler)| Rc::clone(handler)).collect();
		for handler in handlers {
			handler(event);
		}
	}
}
