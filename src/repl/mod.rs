mod core;
mod input;
mod interrupt;
mod reader;

pub use self::core::{LoopControl, ReplCore};
pub use input::{ParsedInput, parse_input};
pub use interrupt::InterruptHandle;
pub use reader::{LineReader, ScriptedReader, StdinLines, StdinReader};
