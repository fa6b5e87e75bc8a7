mod generator;
mod session_store;
mod support;
