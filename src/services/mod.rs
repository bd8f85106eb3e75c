pub mod answer_generator;
pub mod calibration_validator;
pub mod job_poller;
pub mod job_submitter;
pub mod prompt_synthesizer;
pub mod question_source;
pub mod result_sink;
pub mod score_aggregator;

pub use answer_generator::AnswerGenerator;
pub use calibration_validator::CalibrationValidator;
pub use job_poller::JobPoller;
pub use job_submitter::JobSubmitter;
pub use prompt_synthesizer::PromptSynthesizer;
pub use question_source::{QuestionSource, TomlQuestionSource};
pub use result_sink::{JsonlResultSink, ResultSink};
pub use score_aggregator::ScoreAggregator;
