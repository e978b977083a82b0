pub mod classify_op;
pub mod diagnostic_op;
pub mod op_helper;
pub mod watch_op;
