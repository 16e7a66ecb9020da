mod config_tests;
mod router_tests;
