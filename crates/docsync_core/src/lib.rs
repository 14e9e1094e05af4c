pub mod algolia;
pub mod config;
pub mod dom;
pub mod page;
pub mod parameters;
pub mod permalink;
pub mod record;
pub mod sync;
pub mod text;
pub mod walker;
