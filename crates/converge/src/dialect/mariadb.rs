//! The MariaDB/MySQL dialect.

use converge_schema::{Column, FieldKind, Index, SqlValue, Table, TagMap};
use converge_sql::{Ident, QuoteStyle};
use indexmap::IndexMap;

use crate::dialect::{
    Dialect, DialectId, column_clause, column_from_tags, declared_width, render_create_index,
    render_create_table,
};
use crate::error::Error;
use crate::executor::Connection;

const DEFAULT_ENGINE: &str = "InnoDB";
const DEFAULT_CHARSET: &str = "utf8mb4";
const DEFAULT_COLLATE: &str = "utf8mb4_unicode_ci";

/// MariaDB: `?` placeholders, backtick identifiers, the `AUTO_INCREMENT`
/// column attribute, unsigned integer types, case-insensitive identifier
/// matching.
#[derive(Debug, Clone, Default)]
pub struct MariaDbDialect;

impl MariaDbDialect {
    pub fn new() -> Self {
        MariaDbDialect
    }

    fn table_suffix(table: &Table) -> String {
        let options = table.extra_options();
        let engine = options.get("engine").map(String::as_str).unwrap_or(DEFAULT_ENGINE);
        let charset = options.get("charset").map(String::as_str).unwrap_or(DEFAULT_CHARSET);
        let collate = options.get("collate").map(String::as_str).unwrap_or(DEFAULT_COLLATE);
        let mut suffix = format!(
            " ENGINE={} DEFAULT CHARSET={} COLLATE={}",
            engine, charset, collate
        );
        if let Some(offset) = table
            .columns
            .iter()
            .find(|column| column.auto_increment && column.auto_increment_offset > 0)
            .map(|column| column.auto_increment_offset)
        {
            suffix.push_str(&format!(" AUTO_INCREMENT={}", offset));
        }
        suffix
    }
}

impl Dialect for MariaDbDialect {
    fn id(&self) -> DialectId {
        DialectId::MariaDb
    }

    fn quote_style(&self) -> QuoteStyle {
        QuoteStyle::Backtick
    }

    fn placeholder(&self, _position: usize) -> String {
        "?".to_string()
    }

    fn case_insensitive_identifiers(&self) -> bool {
        true
    }

    fn map_field_kind(
        &self,
        name: &str,
        kind: FieldKind,
        tags: &TagMap,
        optional: bool,
    ) -> Result<Column, Error> {
        let width = declared_width(tags);
        let sql_type = match kind {
            FieldKind::String => {
                if width > 0 {
                    format!("VARCHAR({width})")
                } else {
                    "TEXT".to_string()
                }
            }
            FieldKind::Int8 => "TINYINT".to_string(),
            FieldKind::Int16 => "SMALLINT".to_string(),
            FieldKind::Int32 => "INT".to_string(),
            FieldKind::Int64 => "BIGINT".to_string(),
            FieldKind::UInt8 => "TINYINT UNSIGNED".to_string(),
            FieldKind::UInt16 => "SMALLINT UNSIGNED".to_string(),
            FieldKind::UInt32 => "INT UNSIGNED".to_string(),
            FieldKind::UInt64 => "BIGINT UNSIGNED".to_string(),
            FieldKind::Float32 => "FLOAT".to_string(),
            FieldKind::Float64 => "DOUBLE".to_string(),
            FieldKind::Bool => "BOOLEAN".to_string(),
            FieldKind::Bytes => "LONGBLOB".to_string(),
            FieldKind::Timestamp => "DATETIME".to_string(),
        };
        Ok(column_from_tags(name, kind, sql_type, tags, optional))
    }

    fn normalize_type(&self, sql_type: &str) -> String {
        let lower = sql_type.trim().to_ascii_lowercase();
        // The catalog reports BOOLEAN columns as tinyint(1); tinyint(1)
        // unsigned is a real integer type and goes through the width branch.
        if lower == "tinyint(1)" || lower == "bool" || lower == "boolean" {
            return "boolean".to_string();
        }
        // Integer display widths, e.g. int(11), carry no schema meaning.
        const INT_TYPES: [&str; 5] = ["tinyint", "smallint", "mediumint", "int", "bigint"];
        if let Some((base, rest)) = lower.split_once('(')
            && INT_TYPES.contains(&base)
        {
            if rest.contains("unsigned") {
                return format!("{base} unsigned");
            }
            return base.to_string();
        }
        lower
    }

    fn create_table_sql(&self, table: &Table) -> String {
        render_create_table(
            table,
            self.quote_style(),
            Some("AUTO_INCREMENT"),
            &Self::table_suffix(table),
        )
    }

    fn add_column_sql(&self, table: &Table, column: &Column) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN {};",
            Ident(&table.name, self.quote_style()),
            column_clause(column, self.quote_style(), Some("AUTO_INCREMENT"))
        )
    }

    fn alter_column_sql(&self, table: &Table, column: &Column) -> String {
        format!(
            "ALTER TABLE {} MODIFY COLUMN {};",
            Ident(&table.name, self.quote_style()),
            column_clause(column, self.quote_style(), Some("AUTO_INCREMENT"))
        )
    }

    fn create_index_sql(&self, index: &Index) -> String {
        render_create_index(index, self.quote_style(), false)
    }

    fn rename_table_sql(&self, table: &Table, new_name: &str) -> String {
        let style = self.quote_style();
        format!(
            "RENAME TABLE {} TO {};",
            Ident(&table.name, style),
            Ident(new_name, style)
        )
    }

    fn drop_index_sql(&self, index: &Index) -> String {
        let style = self.quote_style();
        format!(
            "DROP INDEX {} ON {};",
            Ident(index.name(), style),
            Ident(index.table(), style)
        )
    }

    fn upsert_sql(&self, table: &Table, columns: &[&Column], keys: &[&Column]) -> String {
        let style = self.quote_style();
        let mut updates = columns
            .iter()
            .filter(|column| !column.primary_key)
            .map(|column| {
                let name = Ident(&column.name, style);
                format!("{} = VALUES({})", name, name)
            })
            .collect::<Vec<_>>()
            .join(", ");
        if updates.is_empty() {
            // Key-only tables: make the update arm a no-op.
            let key = Ident(&keys[0].name, style);
            updates = format!("{} = {}", key, key);
        }
        let insert = self.insert_sql(table, columns);
        format!(
            "{} ON DUPLICATE KEY UPDATE {};",
            insert.trim_end_matches(';'),
            updates
        )
    }

    fn introspect(
        &self,
        conn: &mut dyn Connection,
        table_name: &str,
    ) -> Result<Option<Table>, Error> {
        const COLUMNS_SQL: &str =
            "SELECT COLUMN_NAME, COLUMN_TYPE, IS_NULLABLE, COLUMN_DEFAULT, COLUMN_KEY, EXTRA \
             FROM INFORMATION_SCHEMA.COLUMNS \
             WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? \
             ORDER BY ORDINAL_POSITION";
        const INDEXES_SQL: &str = "SELECT INDEX_NAME, COLUMN_NAME, NON_UNIQUE \
             FROM INFORMATION_SCHEMA.STATISTICS \
             WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? AND INDEX_NAME <> 'PRIMARY' \
             ORDER BY INDEX_NAME, SEQ_IN_INDEX";

        let params = [SqlValue::from(table_name)];
        let mut table = Table::new(table_name);
        {
            let wrap = |e| Error::execution(COLUMNS_SQL, e);
            let mut cursor = conn.query(COLUMNS_SQL, &params).map_err(wrap)?;
            let mut ordinal = 0;
            while let Some(row) = cursor.next_row().map_err(wrap)? {
                let mut column =
                    Column::introspected(row.text(0).map_err(wrap)?, row.text(1).map_err(wrap)?);
                column.nullable = row.text(2).map_err(wrap)?.eq_ignore_ascii_case("YES");
                column.default = row.opt_text(3).map_err(wrap)?.map(str::to_string);
                column.primary_key = row.text(4).map_err(wrap)?.eq_ignore_ascii_case("PRI");
                column.auto_increment = row.text(5).map_err(wrap)?.contains("auto_increment");
                column.ordinal = ordinal;
                ordinal += 1;
                table.columns.push(column);
            }
        }
        if table.columns.is_empty() {
            return Ok(None);
        }

        let wrap = |e| Error::execution(INDEXES_SQL, e);
        let mut cursor = conn.query(INDEXES_SQL, &params).map_err(wrap)?;
        let mut groups: IndexMap<String, (Vec<String>, bool)> = IndexMap::new();
        while let Some(row) = cursor.next_row().map_err(wrap)? {
            let name = row.text(0).map_err(wrap)?.to_string();
            let column = row.text(1).map_err(wrap)?.to_string();
            let unique = row.int(2).map_err(wrap)? == 0;
            groups.entry(name).or_insert_with(|| (Vec::new(), unique)).0.push(column);
        }
        drop(cursor);
        for (name, (columns, unique)) in groups {
            table
                .indexes
                .push(Index::new(table_name, name, columns, unique));
        }
        Ok(Some(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use converge_schema::parse_tag;

    fn map(kind: FieldKind, tag: &str) -> Column {
        let tags = parse_tag(tag).unwrap();
        MariaDbDialect::new()
            .map_field_kind("f", kind, &tags, false)
            .unwrap()
    }

    #[test]
    fn unsigned_kinds_map_to_unsigned_types() {
        assert_eq!(map(FieldKind::UInt8, "").sql_type, "TINYINT UNSIGNED");
        assert_eq!(map(FieldKind::UInt32, "").sql_type, "INT UNSIGNED");
        assert_eq!(map(FieldKind::UInt64, "").sql_type, "BIGINT UNSIGNED");
    }

    #[test]
    fn create_table_carries_engine_and_charset() {
        let mut table = Table::new("user");
        table.columns.push(map(FieldKind::Int64, "primary;auto_increment"));
        let sql = MariaDbDialect::new().create_table_sql(&table);
        assert_eq!(
            sql,
            "CREATE TABLE `user` (`f` BIGINT NOT NULL AUTO_INCREMENT, PRIMARY KEY (`f`)) \
             ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci;"
        );
    }

    #[test]
    fn auto_increment_offset_lands_in_table_options() {
        let mut table = Table::new("user");
        table.columns.push(map(FieldKind::Int64, "primary;auto_increment:1000"));
        let sql = MariaDbDialect::new().create_table_sql(&table);
        assert!(sql.ends_with("AUTO_INCREMENT=1000;"), "{sql}");
    }

    #[test]
    fn display_widths_normalize_away() {
        let maria = MariaDbDialect::new();
        assert_eq!(maria.normalize_type("int(11)"), "int");
        assert_eq!(maria.normalize_type("INT"), "int");
        assert_eq!(maria.normalize_type("int(10) unsigned"), "int unsigned");
        assert_eq!(maria.normalize_type("INT UNSIGNED"), "int unsigned");
        assert_eq!(maria.normalize_type("tinyint(1)"), "boolean");
        assert_eq!(maria.normalize_type("BOOLEAN"), "boolean");
        assert_eq!(maria.normalize_type("tinyint(1) unsigned"), "tinyint unsigned");
        assert_eq!(
            maria.normalize_type("tinyint(1) unsigned"),
            maria.normalize_type("TINYINT UNSIGNED")
        );
        assert_eq!(maria.normalize_type("varchar(255)"), "varchar(255)");
    }

    #[test]
    fn rename_uses_rename_table_syntax() {
        let maria = MariaDbDialect::new();
        let table = Table::new("old_name");
        assert_eq!(
            maria.rename_table_sql(&table, "new_name"),
            "RENAME TABLE `old_name` TO `new_name`;"
        );
    }

    #[test]
    fn upsert_updates_non_key_columns() {
        let maria = MariaDbDialect::new();
        let mut table = Table::new("t");
        table.columns.push(map(FieldKind::Int64, "primary"));
        table.columns.push({
            let mut c = map(FieldKind::String, "");
            c.name = "v".to_string();
            c
        });
        let columns: Vec<&Column> = table.columns.iter().collect();
        let keys = table.primary_columns();
        let sql = maria.upsert_sql(&table, &columns, &keys);
        assert_eq!(
            sql,
            "INSERT INTO `t` (`f`, `v`) VALUES (?, ?) ON DUPLICATE KEY UPDATE `v` = VALUES(`v`);"
        );
    }
}
