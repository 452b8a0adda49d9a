pub mod local_timestamp;
