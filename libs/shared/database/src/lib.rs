pub mod notify_db;

pub use notify_db::NotifyDb;
