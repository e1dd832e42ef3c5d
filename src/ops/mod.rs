pub mod clock;
pub mod select;
pub mod task_ops;
pub mod workflow;
