//! Integration tests against real git repositories and the built binary

mod helpers;
mod test_history;
mod test_publish;
mod test_update;
