pub mod app_error;
pub mod classifier;

pub use app_error::{AppError, AppResult};
pub use classifier::{
    classify, Classification, ClassifiedError, ErrorKind, RecommendedAction, Severity,
};
