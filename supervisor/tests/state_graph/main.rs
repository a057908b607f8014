//! StateGraph engine tests: invoke, routing, step limit, middleware.

#[path = "../init_logging.rs"]
mod init_logging;

mod common;
mod invoke;
mod middleware;
