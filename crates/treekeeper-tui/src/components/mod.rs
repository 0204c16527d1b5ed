pub mod visit_log;
