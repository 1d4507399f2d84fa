pub mod kv_run_store;
