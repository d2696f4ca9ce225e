pub struct Migration {
    pub id: &'static str,
    pub sql: &'static str,
}

/// Every migration, oldest first
pub fn get_migrations() -> Vec<Migration> {
    vec![Migration {
        id: "001_items",
        sql: include_str!("../../migrations/001_items.sql"),
    }]
}
