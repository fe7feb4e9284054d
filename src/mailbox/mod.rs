pub mod engine;
pub mod selection;
pub mod state;
pub mod view;

pub use engine::{BulkOutcome, DEFAULT_PAGE_SIZE, Mailbox};
pub use selection::Selection;
pub use state::{Generation, MailboxState, PendingDelete, Reconciliation};
pub use view::View;
