//! Data models for Libshare

pub mod book_copy;
pub mod book_info;
pub mod library;
pub mod user;

// Re-export commonly used types
pub use book_copy::{BookCopy, BookCopyDetails, CopyAction, CopyStatus};
pub use book_info::BookInfo;
pub use library::{Library, LibraryDetails, LibrarySummary};
pub use user::{User, UserDetails, UserSummary};
