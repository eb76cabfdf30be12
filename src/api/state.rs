use std::sync::Arc;

use crate::services::aggregator::JobContext;

pub type AppState = Arc<JobContext>;
