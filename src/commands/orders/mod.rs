pub mod create_order_command;
pub mod delete_orders_command;
pub mod transition_order_command;
pub mod update_order_command;

// Re-export commands for easier access
pub use create_order_command::CreateOrderCommand;
pub use delete_orders_command::DeleteOrdersCommand;
pub use transition_order_command::TransitionOrderCommand;
pub use update_order_command::UpdateOrderCommand;
