pub mod counter;
pub mod domain;
pub mod ports;
pub mod progress;
pub mod validation;

pub use counter::{CounterUpdate, ReadingCounter};
pub use domain::{Book, PasswordResetToken, Reading, ReadingEntry, User, UserCredentials};
pub use ports::{DatabaseService, PortError, PortResult, ResetNotifier};
pub use progress::{summarize_books, BookProgress, BookSummary};
pub use validation::{Credentials, NewBook, NewReading, ValidationError};
