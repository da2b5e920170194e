#![allow(missing_docs)]

pub(crate) mod http;

pub(crate) use http::{
    TEST_PASSWORD, assert_error, get_test_server, get_test_server_with_state, get_test_state,
    log_in_test_user, register_test_user,
};
