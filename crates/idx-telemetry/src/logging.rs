//! Structured log helpers.
//!
//! Every indexer event carries an `indexer_id` field so log aggregation can
//! group lines per indexer.

/// Log an indexer event with the standard `indexer_id` field.
///
/// # Example
///
/// ```rust,ignore
/// use idx_telemetry::log_indexer_event;
///
/// log_indexer_event!(info, "catalog_product_price", "Rebuilt", duration_ms = 120);
/// ```
#[macro_export]
macro_rules! log_indexer_event {
    ($level:ident, $indexer_id:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            indexer_id = %$indexer_id,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a batch-level event with the standard `operation` field.
#[macro_export]
macro_rules! log_batch_event {
    ($level:ident, $operation:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            operation = $operation,
            $($($field)*,)?
            $msg
        )
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_macros_expand_without_subscriber() {
        log_indexer_event!(info, "catalog_product_price", "Rebuilt", duration_ms = 120u64);
        log_indexer_event!(warn, String::from("customer_grid"), "Skipped");
        log_batch_event!(debug, "reindex", "Batch finished", steps = 3usize);
    }
}
