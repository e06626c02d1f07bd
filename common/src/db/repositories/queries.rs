// SQL fragments shared by the PostgreSQL adapters

/// SQL query fragments for the contents table
pub mod content_queries {
    /// Columns mapped onto `ContentItem`
    pub const SELECT_ITEM_COLUMNS: &str = "id, title, status, content_type, scheduled_at_utc";

    /// Overdue candidates, oldest first. Binds: types, status, cutoff, limit.
    ///
    /// Rows carrying the zero timestamp are legacy rows that were never
    /// really scheduled and must not be published.
    pub const SELECT_OVERDUE: &str = r#"
        SELECT id, scheduled_at_utc
        FROM contents
        WHERE content_type = ANY($1)
          AND status = $2
          AND scheduled_at_utc < $3
          AND scheduled_at_utc <> to_timestamp(0)
        ORDER BY scheduled_at_utc ASC, id ASC
        LIMIT $4
    "#;

    /// Conditional transition; affects zero rows unless the item is still scheduled
    pub const PUBLISH_IF_SCHEDULED: &str = r#"
        UPDATE contents
        SET status = $2, published_at = now(), updated_at = now()
        WHERE id = $1 AND status = $3
    "#;
}

/// SQL query fragments for the content_types table
pub mod content_type_queries {
    /// Public types registered beyond the built-in ones
    pub const SELECT_REGISTERED_PUBLIC: &str =
        "SELECT name FROM content_types WHERE public = true AND builtin = false ORDER BY name";
}

/// SQL query fragments for the publisher_options table
pub mod option_queries {
    pub const SELECT_VALUE: &str = "SELECT value FROM publisher_options WHERE name = $1";

    pub const UPSERT_VALUE: &str = r#"
        INSERT INTO publisher_options (name, value, updated_at)
        VALUES ($1, $2, now())
        ON CONFLICT (name) DO UPDATE SET value = EXCLUDED.value, updated_at = now()
    "#;

    pub const INSERT_IF_ABSENT: &str = r#"
        INSERT INTO publisher_options (name, value, updated_at)
        VALUES ($1, $2, now())
        ON CONFLICT (name) DO NOTHING
    "#;
}
