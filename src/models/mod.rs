pub mod item;
pub mod job;
pub mod loaders;
pub mod row;
pub mod scores;
pub mod tier;

pub use item::{Criterion, CriterionKind, EvalTarget, Item, RawCriterion, RawItem};
pub use job::{Assessment, Job, JobHandle, JobSnapshot, JobStatus};
pub use loaders::{load_item_ids, load_toml_to_item};
pub use row::{CalibrationRow, Verdict, Verdicts};
pub use scores::TierScores;
pub use tier::Tier;
