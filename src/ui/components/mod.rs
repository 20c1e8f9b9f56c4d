mod command_input;
mod confirm;
mod course_form;
mod input;

pub use command_input::{CommandEvent, CommandInput};
pub use confirm::{ConfirmEvent, ConfirmPrompt};
pub use course_form::{CourseForm, FormEvent};

/// Result of a component handling a key event.
///
/// Components return this to their parent view instead of a
/// component-specific result enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Key was consumed, no event for parent to handle
  Handled,
  /// Key was consumed, here's an event for parent to process
  Event(T),
  /// Key was not consumed, parent should try next handler
  NotHandled,
}
