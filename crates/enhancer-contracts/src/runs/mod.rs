mod outcome;

pub use outcome::{
    ErrorCode, OutputImage, ProcessOutcome, ProcessResult, TokenUsage, VerifyResponse,
    OUTPUT_MIME,
};
