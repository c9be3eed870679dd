pub mod args;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod logger;
pub mod output;
pub mod query;
pub mod render;
pub mod selector;

pub use args::{ CliArgs, CommandArgs, LineArgs };
pub use dispatch::Dispatcher;
pub use error::*;
pub use executor::{ ExecutionOutcome, OrderMode, WidgetExecutor };
pub use output::Output;
pub use query::*;
pub use render::*;
pub use selector::{ ELLIPSIS_MARKER, Selection, abbreviate_lists, format_template, select };
