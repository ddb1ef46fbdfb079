//! Dialect registry: name normalization, sqlparser dialect selection and
//! per-dialect function catalogs.
//!
//! All tables here are immutable statics built on first use. Lookups only
//! read them, so they are shared freely across threads.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;

use serde::Serialize;
use sqlparser::dialect::{
    BigQueryDialect, ClickHouseDialect, Dialect, DuckDbDialect, GenericDialect, MySqlDialect,
    PostgreSqlDialect, SQLiteDialect, SnowflakeDialect,
};

/// Canonical SQL dialects the engine knows function catalogs for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    Postgres,
    Sqlite,
    DuckDb,
    BigQuery,
    Snowflake,
    ClickHouse,
    MySql,
}

impl SqlDialect {
    pub const ALL: [SqlDialect; 7] = [
        SqlDialect::Postgres,
        SqlDialect::Sqlite,
        SqlDialect::DuckDb,
        SqlDialect::BigQuery,
        SqlDialect::Snowflake,
        SqlDialect::ClickHouse,
        SqlDialect::MySql,
    ];

    /// Normalize a user-supplied dialect name.
    ///
    /// Matching is trimmed and case-insensitive. An empty or unrecognized
    /// name returns `None`, meaning "auto-detect".
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Some(SqlDialect::Postgres),
            "sqlite" | "sqlite3" => Some(SqlDialect::Sqlite),
            "duckdb" => Some(SqlDialect::DuckDb),
            "bigquery" | "bq" => Some(SqlDialect::BigQuery),
            "snowflake" => Some(SqlDialect::Snowflake),
            "clickhouse" => Some(SqlDialect::ClickHouse),
            "mysql" | "mariadb" => Some(SqlDialect::MySql),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SqlDialect::Postgres => "postgres",
            SqlDialect::Sqlite => "sqlite",
            SqlDialect::DuckDb => "duckdb",
            SqlDialect::BigQuery => "bigquery",
            SqlDialect::Snowflake => "snowflake",
            SqlDialect::ClickHouse => "clickhouse",
            SqlDialect::MySql => "mysql",
        }
    }

    /// The sqlparser grammar for this dialect
    pub fn parser_dialect(self) -> Box<dyn Dialect> {
        match self {
            SqlDialect::Postgres => Box::new(PostgreSqlDialect {}),
            SqlDialect::Sqlite => Box::new(SQLiteDialect {}),
            SqlDialect::DuckDb => Box::new(DuckDbDialect {}),
            SqlDialect::BigQuery => Box::new(BigQueryDialect {}),
            SqlDialect::Snowflake => Box::new(SnowflakeDialect {}),
            SqlDialect::ClickHouse => Box::new(ClickHouseDialect {}),
            SqlDialect::MySql => Box::new(MySqlDialect {}),
        }
    }

    /// The sqlparser grammar for an optional dialect; auto-detect uses the generic grammar
    pub fn parser_dialect_for(dialect: Option<SqlDialect>) -> Box<dyn Dialect> {
        match dialect {
            Some(d) => d.parser_dialect(),
            None => Box::new(GenericDialect {}),
        }
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Functions valid in every dialect
const COMMON_FUNCTIONS: &[&str] = &[
    "COUNT",
    "SUM",
    "AVG",
    "MIN",
    "MAX",
    "ABS",
    "ROUND",
    "CEIL",
    "FLOOR",
    "UPPER",
    "LOWER",
    "TRIM",
    "LTRIM",
    "RTRIM",
    "LENGTH",
    "SUBSTRING",
    "CONCAT",
    "REPLACE",
    "CAST",
    "CONVERT",
    "COALESCE",
    "NULLIF",
    "IFNULL",
    "NOW",
    "CURRENT_DATE",
    "CURRENT_TIME",
    "CURRENT_TIMESTAMP",
    "YEAR",
    "MONTH",
    "DAY",
    "HOUR",
    "MINUTE",
    "SECOND",
    "ROW_NUMBER",
    "RANK",
    "DENSE_RANK",
    "LAG",
    "LEAD",
    "FIRST_VALUE",
    "LAST_VALUE",
    "OVER",
    "PARTITION",
    "ORDER",
    "EXTRACT",
    "POSITION",
];

const POSTGRES_FUNCTIONS: &[&str] = &[
    "DATE_TRUNC",
    "DATE_PART",
    "AGE",
    "TO_CHAR",
    "TO_DATE",
    "TO_TIMESTAMP",
    "TO_NUMBER",
    "STRING_AGG",
    "ARRAY_AGG",
    "ARRAY_LENGTH",
    "UNNEST",
    "GENERATE_SERIES",
    "JSON_BUILD_OBJECT",
    "JSONB_BUILD_OBJECT",
    "JSON_AGG",
    "JSONB_AGG",
    "JSONB_EXTRACT_PATH",
    "REGEXP_REPLACE",
    "REGEXP_MATCHES",
    "SPLIT_PART",
    "LEFT",
    "RIGHT",
    "INITCAP",
    "GREATEST",
    "LEAST",
    "PERCENTILE_CONT",
    "PERCENTILE_DISC",
    "NTILE",
    "CUME_DIST",
    "PERCENT_RANK",
    "BOOL_AND",
    "BOOL_OR",
    "OVERLAY",
    "MD5",
    "TRY_CAST",
];

const SQLITE_FUNCTIONS: &[&str] = &[
    "DATE",
    "TIME",
    "DATETIME",
    "JULIANDAY",
    "STRFTIME",
    "UNIXEPOCH",
    "SUBSTR",
    "INSTR",
    "PRINTF",
    "GROUP_CONCAT",
    "TOTAL",
    "IIF",
    "TYPEOF",
    "RANDOM",
    "HEX",
    "QUOTE",
    "GLOB",
    "LIKE",
    "JSON_EXTRACT",
    "JSON_OBJECT",
    "JSON_ARRAY",
    "NTILE",
    "CUME_DIST",
    "PERCENT_RANK",
];

const DUCKDB_FUNCTIONS: &[&str] = &[
    "DATE_TRUNC",
    "DATE_PART",
    "DATE_DIFF",
    "DATEDIFF",
    "DATE_ADD",
    "STRFTIME",
    "STRPTIME",
    "LIST",
    "LIST_AGG",
    "ARRAY_AGG",
    "STRING_AGG",
    "UNNEST",
    "GENERATE_SERIES",
    "RANGE",
    "REGEXP_MATCHES",
    "REGEXP_REPLACE",
    "REGEXP_EXTRACT",
    "SPLIT_PART",
    "STRING_SPLIT",
    "TRY_CAST",
    "IF",
    "IFF",
    "GREATEST",
    "LEAST",
    "ARG_MAX",
    "ARG_MIN",
    "MEDIAN",
    "QUANTILE_CONT",
    "APPROX_COUNT_DISTINCT",
    "EPOCH",
    "EPOCH_MS",
    "MAKE_DATE",
    "NTILE",
];

const BIGQUERY_FUNCTIONS: &[&str] = &[
    "SAFE_DIVIDE",
    "SAFE_MULTIPLY",
    "SAFE_NEGATE",
    "SAFE_ADD",
    "SAFE_SUBTRACT",
    "DATE_DIFF",
    "DATE_ADD",
    "DATE_SUB",
    "DATE_TRUNC",
    "DATETIME_DIFF",
    "TIMESTAMP_DIFF",
    "TIMESTAMP_ADD",
    "TIMESTAMP_SUB",
    "TIMESTAMP_TRUNC",
    "PARSE_DATE",
    "PARSE_DATETIME",
    "PARSE_TIMESTAMP",
    "FORMAT_DATE",
    "ARRAY_AGG",
    "ARRAY_LENGTH",
    "ARRAY_TO_STRING",
    "GENERATE_ARRAY",
    "STRUCT",
    "UNNEST",
    "ARRAY",
    "CURRENT_DATE",
    "CURRENT_TIMESTAMP",
    "IFNULL",
    "NULLIF",
    "COALESCE",
    "IF",
    "CASE",
    "REGEXP_CONTAINS",
    "REGEXP_EXTRACT",
    "REGEXP_REPLACE",
    "JSON_EXTRACT",
    "JSON_EXTRACT_SCALAR",
    "JSON_QUERY",
    "JSON_VALUE",
    "ST_GEOGPOINT",
    "ST_DISTANCE",
    "ST_CONTAINS",
    "ST_INTERSECTS",
    "APPROX_COUNT_DISTINCT",
    "APPROX_QUANTILES",
    "APPROX_TOP_COUNT",
    "FARM_FINGERPRINT",
    "MD5",
    "SHA256",
    "SHA512",
    "NET.IP_FROM_STRING",
    "NET.SAFE_IP_FROM_STRING",
    "NET.IP_TO_STRING",
    "SAFE_CAST",
];

const SNOWFLAKE_FUNCTIONS: &[&str] = &[
    "DATEADD",
    "DATEDIFF",
    "DATE_TRUNC",
    "DATE_PART",
    "DAYNAME",
    "MONTHNAME",
    "TIMEADD",
    "TIMEDIFF",
    "TIMESTAMPADD",
    "TIMESTAMPDIFF",
    "TO_DATE",
    "TO_TIMESTAMP",
    "TO_TIME",
    "TO_CHAR",
    "TO_VARCHAR",
    "TRY_TO_DATE",
    "TRY_TO_TIMESTAMP",
    "TRY_TO_NUMBER",
    "ARRAY_AGG",
    "ARRAY_SIZE",
    "ARRAY_SLICE",
    "ARRAY_CAT",
    "ARRAY_COMPACT",
    "OBJECT_CONSTRUCT",
    "OBJECT_KEYS",
    "OBJECT_AGG",
    "PARSE_JSON",
    "TRY_PARSE_JSON",
    "GET_PATH",
    "FLATTEN",
    "IFF",
    "IFNULL",
    "NVL",
    "NVL2",
    "NULLIF",
    "COALESCE",
    "ZEROIFNULL",
    "REGEXP_LIKE",
    "REGEXP_REPLACE",
    "REGEXP_SUBSTR",
    "REGEXP_COUNT",
    "SPLIT",
    "SPLIT_PART",
    "STRTOK",
    "STRTOK_TO_ARRAY",
    "HASH",
    "MD5",
    "SHA1",
    "SHA2",
    "LISTAGG",
    "WITHIN GROUP",
    "QUALIFY",
    "RATIO_TO_REPORT",
    "CUME_DIST",
    "PERCENT_RANK",
    "NTILE",
    "CURRENT_DATABASE",
    "CURRENT_SCHEMA",
    "CURRENT_WAREHOUSE",
    "SYSTEM$TYPEOF",
    "TYPEOF",
    "IS_INTEGER",
    "IS_DECIMAL",
    "TRY_CAST",
];

const CLICKHOUSE_FUNCTIONS: &[&str] = &[
    "TODATE",
    "TODATETIME",
    "TOSTARTOFMONTH",
    "TOSTARTOFWEEK",
    "TOSTARTOFDAY",
    "TOYEAR",
    "TOMONTH",
    "DATEDIFF",
    "DATE_TRUNC",
    "FORMATDATETIME",
    "NOW64",
    "UNIQ",
    "UNIQEXACT",
    "GROUPARRAY",
    "GROUPUNIQARRAY",
    "ARGMAX",
    "ARGMIN",
    "COUNTIF",
    "SUMIF",
    "AVGIF",
    "ANY",
    "ANYLAST",
    "QUANTILE",
    "MEDIAN",
    "ARRAYJOIN",
    "ARRAYMAP",
    "ARRAYFILTER",
    "HAS",
    "IF",
    "MULTIIF",
    "TOSTRING",
    "TOINT32",
    "TOINT64",
    "TOFLOAT64",
    "SPLITBYCHAR",
    "LENGTHUTF8",
];

const MYSQL_FUNCTIONS: &[&str] = &[
    "DATE_FORMAT",
    "DATE_ADD",
    "DATE_SUB",
    "DATEDIFF",
    "TIMESTAMPDIFF",
    "STR_TO_DATE",
    "CURDATE",
    "CURTIME",
    "UNIX_TIMESTAMP",
    "FROM_UNIXTIME",
    "LAST_DAY",
    "WEEK",
    "GROUP_CONCAT",
    "IF",
    "ISNULL",
    "SUBSTR",
    "LOCATE",
    "INSTR",
    "LEFT",
    "RIGHT",
    "LPAD",
    "RPAD",
    "CHAR_LENGTH",
    "CONCAT_WS",
    "FIND_IN_SET",
    "GREATEST",
    "LEAST",
    "JSON_EXTRACT",
    "JSON_UNQUOTE",
    "JSON_OBJECT",
    "JSON_ARRAYAGG",
    "NTILE",
    "CUME_DIST",
    "PERCENT_RANK",
    "MD5",
    "SHA1",
    "SHA2",
];

/// Unit keywords accepted by date arithmetic and truncation functions
const DATE_PARTS: &[&str] = &[
    "YEAR",
    "YEARS",
    "ISOYEAR",
    "QUARTER",
    "MONTH",
    "MONTHS",
    "WEEK",
    "WEEKS",
    "ISOWEEK",
    "WEEKDAY",
    "DAY",
    "DAYS",
    "DAYOFWEEK",
    "DAYOFYEAR",
    "HOUR",
    "HOURS",
    "MINUTE",
    "MINUTES",
    "SECOND",
    "SECONDS",
    "MILLISECOND",
    "MICROSECOND",
    "NANOSECOND",
    "EPOCH",
    "YY",
    "YYYY",
    "QTR",
    "MM",
    "WK",
    "DD",
    "DW",
    "DOY",
    "HH",
    "MI",
    "SS",
    "MS",
    "US",
    "NS",
];

static DATE_PART_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| DATE_PARTS.iter().copied().collect());

/// Whether `word` names a date or time unit (`day`, `MONTH`, `yyyy`, ...)
pub fn is_date_part(word: &str) -> bool {
    DATE_PART_SET.contains(word.to_uppercase().as_str())
}

fn dialect_specific(dialect: SqlDialect) -> &'static [&'static str] {
    match dialect {
        SqlDialect::Postgres => POSTGRES_FUNCTIONS,
        SqlDialect::Sqlite => SQLITE_FUNCTIONS,
        SqlDialect::DuckDb => DUCKDB_FUNCTIONS,
        SqlDialect::BigQuery => BIGQUERY_FUNCTIONS,
        SqlDialect::Snowflake => SNOWFLAKE_FUNCTIONS,
        SqlDialect::ClickHouse => CLICKHOUSE_FUNCTIONS,
        SqlDialect::MySql => MYSQL_FUNCTIONS,
    }
}

static COMMON_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| COMMON_FUNCTIONS.iter().copied().collect());

/// Common functions merged with each dialect's own catalog
static DIALECT_SETS: LazyLock<HashMap<SqlDialect, HashSet<&'static str>>> = LazyLock::new(|| {
    SqlDialect::ALL
        .iter()
        .map(|&dialect| {
            let mut set = COMMON_SET.clone();
            set.extend(dialect_specific(dialect).iter().copied());
            (dialect, set)
        })
        .collect()
});

/// How an alternate function spelling resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionAlias {
    /// Wrapper names that are valid regardless of dialect
    AlwaysValid,
    /// Valid when the target spelling is in the dialect's catalog
    Target(&'static str),
}

static FUNCTION_ALIASES: LazyLock<HashMap<&'static str, FunctionAlias>> = LazyLock::new(|| {
    HashMap::from([
        ("ANONYMOUS", FunctionAlias::AlwaysValid),
        ("CASE", FunctionAlias::AlwaysValid),
        ("IF", FunctionAlias::Target("IFF")),
        ("SUBSTR", FunctionAlias::Target("SUBSTRING")),
        ("LEN", FunctionAlias::Target("LENGTH")),
        ("CHARINDEX", FunctionAlias::Target("POSITION")),
    ])
});

/// The valid-function set for a dialect; auto-detect gets the common set only
pub fn dialect_functions(dialect: Option<SqlDialect>) -> &'static HashSet<&'static str> {
    dialect
        .and_then(|d| DIALECT_SETS.get(&d))
        .unwrap_or(&COMMON_SET)
}

/// Whether `name` is a built-in function of the named dialect (case-insensitive)
pub fn is_valid_function(name: &str, dialect: &str) -> bool {
    dialect_functions(SqlDialect::from_name(dialect)).contains(name.to_uppercase().as_str())
}

pub fn function_alias(name: &str) -> Option<FunctionAlias> {
    FUNCTION_ALIASES.get(name).copied()
}

/// A dialect's function catalog joined with a schema's custom functions
#[derive(Debug, Clone, Copy)]
pub struct FunctionCatalog<'a> {
    builtin: &'static HashSet<&'static str>,
    custom: &'a BTreeSet<String>,
}

impl<'a> FunctionCatalog<'a> {
    pub fn new(dialect: Option<SqlDialect>, custom: &'a BTreeSet<String>) -> Self {
        Self {
            builtin: dialect_functions(dialect),
            custom,
        }
    }

    /// Membership check; `upper` must already be upper-cased
    pub fn contains(&self, upper: &str) -> bool {
        self.builtin.contains(upper) || self.custom.contains(upper)
    }

    /// Whether the function is in the catalog or is a recognized alias of one that is
    pub fn accepts(&self, upper: &str) -> bool {
        if self.contains(upper) {
            return true;
        }
        match function_alias(upper) {
            Some(FunctionAlias::AlwaysValid) => true,
            Some(FunctionAlias::Target(target)) => self.contains(target),
            None => false,
        }
    }
}
