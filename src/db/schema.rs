// Shared by both backends: INTEGER/BIGINT map cleanly onto SQLite's INTEGER.

diesel::table! {
    visitor_count (id) {
        id -> Integer,
        count -> BigInt,
    }
}
