use order_pipeline::OrderPipeline;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<OrderPipeline>,
}

impl AppState {
    pub fn new(pipeline: OrderPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}
