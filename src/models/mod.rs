mod item;
mod report;
mod settings;

pub use item::{Item, ItemFilter, NewItem, Selector};
pub use report::{ProcessResult, SyncResult};
pub use settings::Settings;
