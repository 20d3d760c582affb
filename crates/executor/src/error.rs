use model::ids::BatchId;
use model::settlement::BatchStatus;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("batch has {actual} settlements, exceeding max_batch_size {max}")]
    BatchTooLarge { actual: usize, max: usize },
    #[error("validation failed: {0:?}")]
    ValidationFailed(Vec<String>),
    #[error("batch {0} is not known to this executor")]
    UnknownBatch(BatchId),
    #[error("batch {batch_id} is not ready to execute (status: {status:?})")]
    NotReady { batch_id: BatchId, status: BatchStatus },
    #[error("step {step:?} failed: {reason}")]
    StepFailed { step: crate::steps::Step, reason: String },
}
