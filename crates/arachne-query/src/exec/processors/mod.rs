//! Processor implementations, one module per statement family.

pub mod aggregate;
pub mod expand;
pub mod has;
pub mod limit;
pub mod mark;
pub mod match_;
pub mod script;
pub mod source;
pub mod values;

pub use aggregate::{CountOp, FoldOp, GroupCountOp, VertexFoldOp};
pub use expand::{Direction, ExpandKind, ExpandOp};
pub use has::{HasIdOp, HasLabelOp, HasOp};
pub use limit::LimitOp;
pub use mark::{MarkOp, SelectOp};
pub use match_::{MatchOp, SeedOp, SeedSlot, SubPipeline};
pub use script::{FilterOp, MapOp};
pub use source::{EdgeSourceOp, VertexSourceOp};
pub use values::{ValuesOp, VertexFromValuesOp};
