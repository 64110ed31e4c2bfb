//! Database dispatch macros for reducing code duplication.
//!
//! Every operation is written once per backend in `db::backend`; these macros
//! pick the backend module and the sqlx executor (pool or open transaction)
//! for a given target. The match expands at compile time.

/// Dispatch on a [`DbPool`](crate::db::pool::DbPool).
///
/// ```ignore
/// impl_db_dispatch!(pool, |backend, exec| backend::execute(exec, sql, args).await)
/// ```
macro_rules! impl_db_dispatch {
    ($pool:expr, |$backend:ident, $exec:ident| $body:expr) => {
        match $pool {
            $crate::db::pool::DbPool::MySql(pool) => {
                use $crate::db::backend::mysql as $backend;
                let $exec = pool;
                $body
            }
            $crate::db::pool::DbPool::Postgres(pool) => {
                use $crate::db::backend::postgres as $backend;
                let $exec = pool;
                $body
            }
            $crate::db::pool::DbPool::SQLite(pool) => {
                use $crate::db::backend::sqlite as $backend;
                let $exec = pool;
                $body
            }
        }
    };
}

/// Dispatch on an open [`DbTransaction`](crate::db::transaction::DbTransaction),
/// executing on the transaction's connection.
macro_rules! impl_tx_dispatch {
    ($tx:expr, |$backend:ident, $exec:ident| $body:expr) => {
        match $tx {
            $crate::db::transaction::DbTransaction::MySql(tx) => {
                use $crate::db::backend::mysql as $backend;
                let $exec = &mut **tx;
                $body
            }
            $crate::db::transaction::DbTransaction::Postgres(tx) => {
                use $crate::db::backend::postgres as $backend;
                let $exec = &mut **tx;
                $body
            }
            $crate::db::transaction::DbTransaction::SQLite(tx) => {
                use $crate::db::backend::sqlite as $backend;
                let $exec = &mut **tx;
                $body
            }
        }
    };
}

/// Build a `Vec<QueryParam>` from heterogeneous values.
///
/// ```
/// use sqlbridge::params;
/// use sqlbridge::models::QueryParam;
///
/// let args = params![1, "two", None::<f64>];
/// assert_eq!(args[1], QueryParam::String("two".into()));
/// assert!(args[2].is_null());
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::models::QueryParam>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::models::QueryParam::from($value)),+]
    };
}
