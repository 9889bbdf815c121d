mod condition;
mod operand;
mod ordered;

pub use condition::*;
pub use operand::*;
pub use ordered::*;
