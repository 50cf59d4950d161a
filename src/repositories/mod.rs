pub mod entry;

pub use entry::{EntryRepository, PgEntryRepository, RepositoryError};

#[cfg(test)]
pub use entry::MockEntryRepository;
