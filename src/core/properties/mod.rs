/*!
Flat string properties owned by a provider.

A provider's declarative form is a `key=value` stream: one entry per service,
one per alias and one per attribute. [`PropertyBag`] holds the entries in
insertion order and [`format`] reads and writes the textual form.
*/

pub mod bag;
pub mod format;

pub use bag::PropertyBag;
pub use format::{parse, store};
