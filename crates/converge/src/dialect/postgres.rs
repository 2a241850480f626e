//! The PostgreSQL dialect.

use converge_schema::{Column, FieldKind, Index, SqlValue, Table, TagMap};
use converge_sql::{Ident, QuoteStyle};
use indexmap::IndexMap;

use crate::dialect::{
    Dialect, DialectId, column_clause, column_from_tags, declared_width, render_create_index,
    render_create_table, render_default,
};
use crate::error::Error;
use crate::executor::Connection;

/// PostgreSQL: `$n` placeholders, double-quoted identifiers, serial types for
/// auto-increment, case-sensitive identifier matching.
///
/// Sequences always start at 1; a declared auto-increment offset is accepted
/// but not applied.
#[derive(Debug, Clone)]
pub struct PostgresDialect {
    schema: String,
}

impl Default for PostgresDialect {
    fn default() -> Self {
        PostgresDialect {
            schema: "public".to_string(),
        }
    }
}

impl PostgresDialect {
    pub fn new() -> Self {
        PostgresDialect::default()
    }

    /// Introspect against a schema other than `public`.
    pub fn with_schema(schema: impl Into<String>) -> Self {
        PostgresDialect {
            schema: schema.into(),
        }
    }

    /// The plain integer type behind a serial type, for ALTER COLUMN.
    fn alter_type(column: &Column) -> &str {
        match column.sql_type.as_str() {
            "SMALLSERIAL" => "SMALLINT",
            "SERIAL" => "INTEGER",
            "BIGSERIAL" => "BIGINT",
            other => other,
        }
    }
}

impl Dialect for PostgresDialect {
    fn id(&self) -> DialectId {
        DialectId::Postgres
    }

    fn quote_style(&self) -> QuoteStyle {
        QuoteStyle::DoubleQuote
    }

    fn placeholder(&self, position: usize) -> String {
        format!("${position}")
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
            FieldKind::Int8 | FieldKind::Int16 | FieldKind::UInt8 => "SMALLINT".to_string(),
            FieldKind::Int32 | FieldKind::UInt16 => "INTEGER".to_string(),
            // No unsigned types; the wider signed type holds the full range,
            // except uint64 which maps to BIGINT with documented truncation
            // of the upper half.
            FieldKind::Int64 | FieldKind::UInt32 | FieldKind::UInt64 => "BIGINT".to_string(),
            FieldKind::Float32 => "REAL".to_string(),
            FieldKind::Float64 => "DOUBLE PRECISION".to_string(),
            FieldKind::Bool => "BOOLEAN".to_string(),
            FieldKind::Bytes => "BYTEA".to_string(),
            FieldKind::Timestamp => "TIMESTAMP WITH TIME ZONE".to_string(),
        };
        let mut column = column_from_tags(name, kind, sql_type, tags, optional);
        if column.auto_increment {
            // Serial pseudo-types carry the sequence default; non-integer
            // kinds keep their type and the flag is inert.
            column.sql_type = match column.sql_type.as_str() {
                "SMALLINT" => "SMALLSERIAL".to_string(),
                "INTEGER" => "SERIAL".to_string(),
                "BIGINT" => "BIGSERIAL".to_string(),
                other => other.to_string(),
            };
        }
        Ok(column)
    }

    fn normalize_type(&self, sql_type: &str) -> String {
        let lower = sql_type.to_ascii_lowercase();
        let base = match lower.split_once('(') {
            Some((base, _)) => base.trim().to_string(),
            None => lower,
        };
        let canon = match base.as_str() {
            "int2" | "smallint" | "smallserial" => "smallint",
            "int4" | "int" | "integer" | "serial" => "integer",
            "int8" | "bigint" | "bigserial" => "bigint",
            "float4" | "real" => "real",
            "float8" | "double precision" => "double precision",
            "bool" | "boolean" => "boolean",
            "varchar" | "character varying" => "varchar",
            "bpchar" | "char" | "character" => "char",
            "timestamptz" | "timestamp with time zone" => "timestamptz",
            "timestamp" | "timestamp without time zone" => "timestamp",
            _ => return base,
        };
        canon.to_string()
    }

    fn create_table_sql(&self, table: &Table) -> String {
        render_create_table(table, self.quote_style(), None, "")
    }

    fn add_column_sql(&self, table: &Table, column: &Column) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN {};",
            Ident(&table.name, self.quote_style()),
            column_clause(column, self.quote_style(), None)
        )
    }

    fn alter_column_sql(&self, table: &Table, column: &Column) -> String {
        let style = self.quote_style();
        let name = Ident(&column.name, style);
        let mut actions = vec![format!(
            "ALTER COLUMN {} SET DATA TYPE {}",
            name,
            Self::alter_type(column)
        )];
        if column.nullable {
            actions.push(format!("ALTER COLUMN {} DROP NOT NULL", name));
        } else {
            actions.push(format!("ALTER COLUMN {} SET NOT NULL", name));
        }
        // Serial columns own their sequence default; leave it alone.
        if !column.auto_increment {
            match render_default(column) {
                Some(default) => {
                    actions.push(format!("ALTER COLUMN {} SET DEFAULT {}", name, default))
                }
                None => actions.push(format!("ALTER COLUMN {} DROP DEFAULT", name)),
            }
        }
        format!(
            "ALTER TABLE {} {};",
            Ident(&table.name, style),
            actions.join(", ")
        )
    }

    fn create_index_sql(&self, index: &Index) -> String {
        render_create_index(index, self.quote_style(), true)
    }

    fn drop_index_sql(&self, index: &Index) -> String {
        format!(
            "DROP INDEX IF EXISTS {};",
            Ident(index.name(), self.quote_style())
        )
    }

    fn upsert_sql(&self, table: &Table, columns: &[&Column], keys: &[&Column]) -> String {
        let style = self.quote_style();
        let conflict = keys
            .iter()
            .map(|column| Ident(&column.name, style).to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let updates = columns
            .iter()
            .filter(|column| !column.primary_key)
            .map(|column| {
                let name = Ident(&column.name, style);
                format!("{} = EXCLUDED.{}", name, name)
            })
            .collect::<Vec<_>>()
            .join(", ");
        let insert = self.insert_sql(table, columns);
        let insert = insert.trim_end_matches(';');
        if updates.is_empty() {
            format!("{} ON CONFLICT ({}) DO NOTHING;", insert, conflict)
        } else {
            format!(
                "{} ON CONFLICT ({}) DO UPDATE SET {};",
                insert, conflict, updates
            )
        }
    }

    fn introspect(
        &self,
        conn: &mut dyn Connection,
        table_name: &str,
    ) -> Result<Option<Table>, Error> {
        const COLUMNS_SQL: &str = "SELECT column_name, udt_name, is_nullable, column_default \
             FROM information_schema.columns \
             WHERE table_schema = $1 AND table_name = $2 \
             ORDER BY ordinal_position";
        const INDEXES_SQL: &str = "SELECT i.relname, a.attname, ix.indisunique, ix.indisprimary \
             FROM pg_class t \
             JOIN pg_namespace n ON n.oid = t.relnamespace \
             JOIN pg_index ix ON ix.indrelid = t.oid \
             JOIN pg_class i ON i.oid = ix.indexrelid \
             JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = ANY(ix.indkey) \
             WHERE t.relname = $1 AND n.nspname = $2 \
             ORDER BY i.relname, array_position(ix.indkey, a.attnum)";

        let mut table = Table::new(table_name);
        {
            let wrap = |e| Error::execution(COLUMNS_SQL, e);
            let params = [
                SqlValue::from(self.schema.as_str()),
                SqlValue::from(table_name),
            ];
            let mut cursor = conn.query(COLUMNS_SQL, &params).map_err(wrap)?;
            let mut ordinal = 0;
            while let Some(row) = cursor.next_row().map_err(wrap)? {
                let mut column =
                    Column::introspected(row.text(0).map_err(wrap)?, row.text(1).map_err(wrap)?);
                column.nullable = row.text(2).map_err(wrap)?.eq_ignore_ascii_case("YES");
                column.default = row.opt_text(3).map_err(wrap)?.map(str::to_string);
                if let Some(default) = &column.default
                    && default.starts_with("nextval(")
                {
                    column.auto_increment = true;
                }
                column.ordinal = ordinal;
                ordinal += 1;
                table.columns.push(column);
            }
        }
        if table.columns.is_empty() {
            return Ok(None);
        }

        let wrap = |e| Error::execution(INDEXES_SQL, e);
        let params = [
            SqlValue::from(table_name),
            SqlValue::from(self.schema.as_str()),
        ];
        let mut cursor = conn.query(INDEXES_SQL, &params).map_err(wrap)?;
        let mut groups: IndexMap<String, (Vec<String>, bool)> = IndexMap::new();
        while let Some(row) = cursor.next_row().map_err(wrap)? {
            let name = row.text(0).map_err(wrap)?.to_string();
            let column = row.text(1).map_err(wrap)?.to_string();
            let unique = row.bool(2).map_err(wrap)?;
            // The primary index carries the key role; it is not a secondary
            // index.
            if row.bool(3).map_err(wrap)? {
                if let Some(col) = table.columns.iter_mut().find(|c| c.name == column) {
                    col.primary_key = true;
                }
                continue;
            }
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
