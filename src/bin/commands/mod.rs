pub mod bench_cmd;
pub mod inspect_cmd;
pub mod query_cmd;

pub use bench_cmd::cmd_bench;
pub use inspect_cmd::cmd_inspect;
pub use query_cmd::cmd_query;
