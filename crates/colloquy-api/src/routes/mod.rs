pub mod assistants;
pub mod threads;
pub mod runs;
pub mod health;

fn default_skip() -> i64 {
    0
}

fn default_limit() -> i64 {
    20
}

/// Pagination caps keep a single request from scanning the whole table.
fn cap_limit(limit: i64) -> i64 {
    limit.clamp(1, 100)
}
