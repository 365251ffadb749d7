pub mod contact_lists;
pub mod session;
pub mod templates;
