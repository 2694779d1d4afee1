pub mod accounts;
pub mod catalog;

pub use accounts::AccountService;
pub use catalog::CatalogService;
