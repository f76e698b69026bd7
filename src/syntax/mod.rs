pub mod parse;
pub mod print;
pub mod tree;
pub mod visit;

pub use parse::{PythonParser, decode_string, parse_module};
pub use print::{quote, unparse};
pub use tree::{Alias, CompKind, Literal, Node, NodeId, ParamKind, Slot, SlotMut, Tree};
pub use visit::{Rewrite, splice_list};
