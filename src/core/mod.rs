//! Core engine
//!
//! Contains the argument/option model, the token binder, commands and the
//! application that resolves and dispatches them.

pub mod application;
pub mod argument;
pub mod builtin;
pub mod command;
pub mod definition;
pub mod input;
pub mod loader;
pub mod option;
pub mod similarity;
pub mod tokenizer;
pub mod value;

pub use application::{Application, DispatchState};
pub use argument::Argument;
pub use command::{Command, CommandHandler, Context};
pub use definition::Definition;
pub use input::Input;
pub use loader::{CommandLoader, FactoryCommandLoader};
pub use option::InputOption;
pub use similarity::find_similar_names;
pub use tokenizer::CommandLineTokenizer;
pub use value::Value;
