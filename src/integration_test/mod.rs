#![cfg(test)]

mod consumer_integration_test;
mod schema_sync_integration_test;
mod signing_integration_test;
mod test_utils;
