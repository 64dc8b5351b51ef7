//! Input and output ports.
//!
//! A VM talks to its owner only through two ports supplied at construction:
//! - [`InputPort`]: polled once per `IN` instruction; `None` means "not yet
//!   available" and suspends the machine. Polling again after `None` must be
//!   safe, since a blocked instruction is retried verbatim.
//! - [`OutputPort`]: receives every `OUT` value; never blocks, never fails.
//!
//! Stock implementations cover the common wiring: a [`VecDeque`] input queue,
//! a [`Vec`] output collector, closures, and [`Pipe`] for connecting one
//! machine's output to another's input.

use crate::virtual_machine::Word;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Source of input values for `IN`.
pub trait InputPort {
    /// Returns the next value, or `None` if none is available yet.
    fn read(&mut self) -> Option<Word>;
}

/// Sink for values emitted by `OUT`.
pub trait OutputPort {
    /// Accepts one value.
    fn write(&mut self, value: Word);
}

impl<T: InputPort + ?Sized> InputPort for &mut T {
    fn read(&mut self) -> Option<Word> {
        (**self).read()
    }
}

impl<T: OutputPort + ?Sized> OutputPort for &mut T {
    fn write(&mut self, value: Word) {
        (**self).write(value)
    }
}

impl<T: InputPort + ?Sized> InputPort for Box<T> {
    fn read(&mut self) -> Option<Word> {
        (**self).read()
    }
}

impl<T: OutputPort + ?Sized> OutputPort for Box<T> {
    fn write(&mut self, value: Word) {
        (**self).write(value)
    }
}

impl InputPort for VecDeque<Word> {
    fn read(&mut self) -> Option<Word> {
        self.pop_front()
    }
}

impl OutputPort for VecDeque<Word> {
    fn write(&mut self, value: Word) {
        self.push_back(value);
    }
}

impl OutputPort for Vec<Word> {
    fn write(&mut self, value: Word) {
        self.push(value);
    }
}

/// Input port that never has a value.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoInput;

impl InputPort for NoInput {
    fn read(&mut self) -> Option<Word> {
        None
    }
}

/// Output port that drops everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct Discard;

impl OutputPort for Discard {
    fn write(&mut self, _value: Word) {}
}

/// Input port backed by a closure.
pub struct ReadFn<F>(pub F);

impl<F: FnMut() -> Option<Word>> InputPort for ReadFn<F> {
    fn read(&mut self) -> Option<Word> {
        (self.0)()
    }
}

/// Output port backed by a closure.
pub struct WriteFn<F>(pub F);

impl<F: FnMut(Word)> OutputPort for WriteFn<F> {
    fn write(&mut self, value: Word) {
        (self.0)(value)
    }
}

/// Wraps a closure as an [`InputPort`].
pub fn read_fn<F: FnMut() -> Option<Word>>(f: F) -> ReadFn<F> {
    ReadFn(f)
}

/// Wraps a closure as an [`OutputPort`].
pub fn write_fn<F: FnMut(Word)>(f: F) -> WriteFn<F> {
    WriteFn(f)
}

/// Shared single-threaded FIFO between a producer and a consumer.
///
/// The consumer reads from its pipe as an [`InputPort`]; the producer holds a
/// clone and pushes into it as an [`OutputPort`]. Clones share one queue.
#[derive(Clone, Debug, Default)]
pub struct Pipe {
    queue: Rc<RefCell<VecDeque<Word>>>,
}

impl Pipe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pipe pre-loaded with `values`.
    pub fn with_values<I: IntoIterator<Item = Word>>(values: I) -> Self {
        Self {
            queue: Rc::new(RefCell::new(values.into_iter().collect())),
        }
    }

    pub fn push(&self, value: Word) {
        self.queue.borrow_mut().push_back(value);
    }

    pub fn pop(&self) -> Option<Word> {
        self.queue.borrow_mut().pop_front()
    }

    /// Returns the oldest queued value without removing it.
    pub fn front(&self) -> Option<Word> {
        self.queue.borrow().front().copied()
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Removes and returns everything queued, oldest first.
    pub fn drain(&self) -> Vec<Word> {
        self.queue.borrow_mut().drain(..).collect()
    }
}

impl InputPort for Pipe {
    fn read(&mut self) -> Option<Word> {
        self.pop()
    }
}

impl OutputPort for Pipe {
    fn write(&mut self, value: Word) {
        self.push(value);
    }
}
