mod command;
pub use command::{Invoker, SchematicCommand, EXPORT, IMPORT};

mod cooldown;
pub use cooldown::CooldownService;

mod session;
pub use session::{ImportSession, SessionStore};
