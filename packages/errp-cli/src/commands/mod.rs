pub mod defaults;
pub mod extract;
pub mod fetch;
pub mod inspect;
