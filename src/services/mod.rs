pub mod order_service;
pub mod task_service;

pub use order_service::OrderService;
pub use task_service::TaskService;
