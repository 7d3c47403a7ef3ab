use sqlparser::ast::{self, Expr, FromTable, ObjectNamePart, SetExpr, Statement, TableFactor, TableObject, Value, ValueWithSpan};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

use crate::model::*;

/// Parsed operator command. Field values are raw; the shell validates them.
#[derive(Debug, PartialEq)]
pub enum Command {
    Reserve(Reservation),
    Cancel(SlotRange),
    Search { date: String, hour: u8, room: String },
    ListAll,
    ListByDate { date: String },
    ListByRoom { room: String },
    ViewWaitlist { date: String, hour: u8, room: String },
}

impl Command {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Command::Reserve(_) => "reserve",
            Command::Cancel(_) => "cancel",
            Command::Search { .. } => "search",
            Command::ListAll => "list_all",
            Command::ListByDate { .. } => "list_by_date",
            Command::ListByRoom { .. } => "list_by_room",
            Command::ViewWaitlist { .. } => "view_waitlist",
        }
    }
}

/// Equality filters collected from a WHERE clause.
#[derive(Debug, Default)]
struct SlotFilter {
    date: Option<String>,
    hour: Option<u8>,
    room: Option<String>,
    duration: Option<u8>,
}

pub fn parse_sql(sql: &str) -> Result<Command, SqlError> {
    let dialect = PostgreSqlDialect {};
    let stmts = Parser::parse_sql(&dialect, sql).map_err(|e| SqlError::Parse(e.to_string()))?;
    if stmts.is_empty() {
        return Err(SqlError::Empty);
    }
    if stmts.len() > 1 {
        return Err(SqlError::Unsupported("one statement per line".into()));
    }

    match &stmts[0] {
        Statement::Insert(insert) => parse_insert(insert),
        Statement::Delete(delete) => parse_delete(delete),
        Statement::Query(query) => parse_select(query),
        other => Err(SqlError::Unsupported(format!("{other}"))),
    }
}

/// `INSERT INTO bookings (date, hour, duration, room, lecturer, course) VALUES (...)`.
/// Values are positional; the column list is documentation only.
fn parse_insert(insert: &ast::Insert) -> Result<Command, SqlError> {
    let table = insert_table_name(insert)?;
    if table != "bookings" {
        return Err(SqlError::UnknownTable(table));
    }
    let values = extract_insert_values(insert)?;
    if values.len() != 6 {
        return Err(SqlError::WrongArity("bookings", 6, values.len()));
    }
    Ok(Command::Reserve(Reservation {
        date: parse_text(&values[0])?,
        start_hour: parse_u8(&values[1])?,
        duration: parse_u8(&values[2])?,
        room: parse_text(&values[3])?,
        lecturer: parse_text(&values[4])?,
        course: parse_text(&values[5])?,
    }))
}

/// `DELETE FROM bookings WHERE date = .. AND hour = .. AND room = .. [AND duration = n]`.
fn parse_delete(delete: &ast::Delete) -> Result<Command, SqlError> {
    let table = delete_table_name(delete)?;
    if table != "bookings" {
        return Err(SqlError::UnknownTable(table));
    }
    let mut filter = SlotFilter::default();
    let selection = delete
        .selection
        .as_ref()
        .ok_or(SqlError::MissingFilter("date"))?;
    extract_filters(selection, &mut filter)?;

    Ok(Command::Cancel(SlotRange {
        date: filter.date.ok_or(SqlError::MissingFilter("date"))?,
        start_hour: filter.hour.ok_or(SqlError::MissingFilter("hour"))?,
        duration: filter.duration.unwrap_or(1),
        room: filter.room.ok_or(SqlError::MissingFilter("room"))?,
    }))
}

fn parse_select(query: &ast::Query) -> Result<Command, SqlError> {
    let select = match query.body.as_ref() {
        SetExpr::Select(s) => s,
        _ => return Err(SqlError::Unsupported("non-SELECT query".into())),
    };

    if select.from.is_empty() {
        return Err(SqlError::Parse("SELECT without FROM".into()));
    }
    let table = table_factor_name(&select.from[0].relation)?;

    let mut filter = SlotFilter::default();
    if let Some(selection) = &select.selection {
        extract_filters(selection, &mut filter)?;
    }
    if filter.duration.is_some() {
        return Err(SqlError::Unsupported("duration filter in SELECT".into()));
    }

    match table.as_str() {
        "bookings" => match filter {
            SlotFilter { date: None, hour: None, room: None, .. } => Ok(Command::ListAll),
            SlotFilter { date: Some(date), hour: None, room: None, .. } => {
                Ok(Command::ListByDate { date })
            }
            SlotFilter { date: None, hour: None, room: Some(room), .. } => {
                Ok(Command::ListByRoom { room })
            }
            SlotFilter { date: Some(date), hour: Some(hour), room: Some(room), .. } => {
                Ok(Command::Search { date, hour, room })
            }
            _ => Err(SqlError::Unsupported(
                "filter by date, by room, or by date, hour and room".into(),
            )),
        },
        "waitlist" => Ok(Command::ViewWaitlist {
            date: filter.date.ok_or(SqlError::MissingFilter("date"))?,
            hour: filter.hour.ok_or(SqlError::MissingFilter("hour"))?,
            room: filter.room.ok_or(SqlError::MissingFilter("room"))?,
        }),
        _ => Err(SqlError::UnknownTable(table)),
    }
}

fn extract_filters(expr: &Expr, filter: &mut SlotFilter) -> Result<(), SqlError> {
    match expr {
        Expr::Nested(inner) => extract_filters(inner, filter),
        Expr::BinaryOp { left, op: ast::BinaryOperator::And, right } => {
            extract_filters(left, filter)?;
            extract_filters(right, filter)
        }
        Expr::BinaryOp { left, op: ast::BinaryOperator::Eq, right } => {
            match expr_column_name(left).as_deref() {
                Some("date") => filter.date = Some(parse_text(right)?),
                Some("hour") => filter.hour = Some(parse_u8(right)?),
                Some("room") => filter.room = Some(parse_text(right)?),
                Some("duration") => filter.duration = Some(parse_u8(right)?),
                Some(other) => return Err(SqlError::UnknownColumn(other.to_string())),
                None => return Err(SqlError::Unsupported(format!("{left}"))),
            }
            Ok(())
        }
        other => Err(SqlError::Unsupported(format!("{other}"))),
    }
}

// ── Helpers ───────────────────────────────────────────────────

fn object_name_last(name: &ast::ObjectName) -> Option<String> {
    name.0.last().and_then(|part| match part {
        ObjectNamePart::Identifier(ident) => Some(ident.value.to_lowercase()),
        _ => None,
    })
}

fn insert_table_name(insert: &ast::Insert) -> Result<String, SqlError> {
    match &insert.table {
        TableObject::TableName(name) => {
            object_name_last(name).ok_or_else(|| SqlError::Parse("empty table name".into()))
        }
        _ => Err(SqlError::Parse("unsupported table object in INSERT".into())),
    }
}

fn delete_table_name(delete: &ast::Delete) -> Result<String, SqlError> {
    let tables_with_joins = match &delete.from {
        FromTable::WithFromKeyword(t) | FromTable::WithoutKeyword(t) => t,
    };
    if let Some(first) = tables_with_joins.first() {
        table_factor_name(&first.relation)
    } else {
        Err(SqlError::Parse("DELETE without table".into()))
    }
}

fn table_factor_name(tf: &TableFactor) -> Result<String, SqlError> {
    match tf {
        TableFactor::Table { name, .. } => {
            object_name_last(name).ok_or_else(|| SqlError::Parse("empty table name".into()))
        }
        _ => Err(SqlError::Parse("complex table expression".into())),
    }
}

fn extract_insert_values(insert: &ast::Insert) -> Result<Vec<Expr>, SqlError> {
    let body = insert
        .source
        .as_ref()
        .ok_or(SqlError::Parse("no VALUES".into()))?;
    match body.body.as_ref() {
        SetExpr::Values(values) => match values.rows.as_slice() {
            [] => Err(SqlError::Parse("empty VALUES".into())),
            [row] => Ok(row.clone()),
            _ => Err(SqlError::Unsupported("multi-row INSERT".into())),
        },
        _ => Err(SqlError::Parse("expected VALUES".into())),
    }
}

fn expr_column_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Identifier(ident) => Some(ident.value.to_lowercase()),
        Expr::CompoundIdentifier(parts) => parts.last().map(|i| i.value.to_lowercase()),
        _ => None,
    }
}

fn extract_value(expr: &Expr) -> Option<&Value> {
    match expr {
        Expr::Value(ValueWithSpan { value, .. }) => Some(value),
        _ => None,
    }
}

/// A string or a bare number, taken literally (leading zeros survive).
fn parse_text(expr: &Expr) -> Result<String, SqlError> {
    match extract_value(expr) {
        Some(Value::SingleQuotedString(s) | Value::Number(s, _)) => Ok(s.clone()),
        Some(value) => Err(SqlError::Parse(format!("expected string, got {value}"))),
        None => Err(SqlError::Parse(format!("expected value, got {expr}"))),
    }
}

fn parse_i64(expr: &Expr) -> Result<i64, SqlError> {
    if let Some(value) = extract_value(expr) {
        match value {
            Value::Number(s, _) | Value::SingleQuotedString(s) => s
                .parse()
                .map_err(|e| SqlError::Parse(format!("bad integer {s:?}: {e}"))),
            _ => Err(SqlError::Parse(format!("expected number, got {value}"))),
        }
    } else if let Expr::UnaryOp {
        op: ast::UnaryOperator::Minus,
        expr,
    } = expr
    {
        Ok(-parse_i64(expr)?)
    } else {
        Err(SqlError::Parse(format!("expected value, got {expr}")))
    }
}

fn parse_u8(expr: &Expr) -> Result<u8, SqlError> {
    let v = parse_i64(expr)?;
    u8::try_from(v).map_err(|_| SqlError::Parse(format!("{v} out of range")))
}

// ── Errors ────────────────────────────────────────────────────

#[derive(Debug)]
pub enum SqlError {
    Parse(String),
    Empty,
    Unsupported(String),
    UnknownTable(String),
    UnknownColumn(String),
    WrongArity(&'static str, usize, usize),
    MissingFilter(&'static str),
}

impl std::fmt::Display for SqlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlError::Parse(s) => write!(f, "parse error: {s}"),
            SqlError::Empty => write!(f, "empty query"),
            SqlError::Unsupported(s) => write!(f, "unsupported: {s}"),
            SqlError::UnknownTable(t) => write!(f, "unknown table: {t}"),
            SqlError::UnknownColumn(c) => write!(f, "unknown column: {c}"),
            SqlError::WrongArity(t, expected, got) => {
                write!(f, "{t}: expected {expected} values, got {got}")
            }
            SqlError::MissingFilter(col) => write!(f, "missing filter: {col}"),
        }
    }
}

impl std::error::Error for SqlError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_insert_booking() {
        let sql = "INSERT INTO bookings (date, hour, duration, room, lecturer, course) VALUES ('260102', 10, 2, '5', 'Dr Tan', 'CS101')";
        let cmd = parse_sql(sql).unwrap();
        assert_eq!(
            cmd,
            Command::Reserve(Reservation {
                date: "260102".into(),
                start_hour: 10,
                duration: 2,
                room: "5".into(),
                lecturer: "Dr Tan".into(),
                course: "CS101".into(),
            })
        );
    }

    #[test]
    fn parse_insert_without_column_list_and_bare_numbers() {
        let sql = "INSERT INTO bookings VALUES (060102, 9, 1, 05, 'Lee', 'MA200')";
        match parse_sql(sql).unwrap() {
            Command::Reserve(r) => {
                assert_eq!(r.date, "060102");
                assert_eq!(r.room, "05");
                assert_eq!(r.start_hour, 9);
            }
            other => panic!("expected Reserve, got {other:?}"),
        }
    }

    #[test]
    fn parse_insert_wrong_arity() {
        let sql = "INSERT INTO bookings VALUES ('260102', 10, '5')";
        assert!(matches!(parse_sql(sql), Err(SqlError::WrongArity("bookings", 6, 3))));
    }

    #[test]
    fn parse_insert_multi_row_rejected() {
        let sql = "INSERT INTO bookings VALUES ('260102', 10, 1, '5', 'a', 'b'), ('260102', 11, 1, '5', 'a', 'b')";
        assert!(matches!(parse_sql(sql), Err(SqlError::Unsupported(_))));
    }

    #[test]
    fn parse_insert_hour_out_of_u8() {
        let sql = "INSERT INTO bookings VALUES ('260102', 300, 1, '5', 'a', 'b')";
        assert!(matches!(parse_sql(sql), Err(SqlError::Parse(_))));
    }

    #[test]
    fn parse_delete_defaults_duration() {
        let sql = "DELETE FROM bookings WHERE date = '260102' AND hour = 10 AND room = '5'";
        assert_eq!(
            parse_sql(sql).unwrap(),
            Command::Cancel(SlotRange {
                date: "260102".into(),
                start_hour: 10,
                duration: 1,
                room: "5".into(),
            })
        );
    }

    #[test]
    fn parse_delete_with_duration() {
        let sql = "DELETE FROM bookings WHERE room = '5' AND date = '260102' AND hour = 10 AND duration = 3";
        match parse_sql(sql).unwrap() {
            Command::Cancel(range) => assert_eq!(range.duration, 3),
            other => panic!("expected Cancel, got {other:?}"),
        }
    }

    #[test]
    fn parse_delete_requires_slot() {
        let sql = "DELETE FROM bookings WHERE date = '260102' AND room = '5'";
        assert!(matches!(parse_sql(sql), Err(SqlError::MissingFilter("hour"))));
        let sql = "DELETE FROM bookings";
        assert!(matches!(parse_sql(sql), Err(SqlError::MissingFilter(_))));
    }

    #[test]
    fn parse_select_variants() {
        assert_eq!(parse_sql("SELECT * FROM bookings").unwrap(), Command::ListAll);
        assert_eq!(
            parse_sql("SELECT * FROM bookings WHERE date = '260102'").unwrap(),
            Command::ListByDate { date: "260102".into() }
        );
        assert_eq!(
            parse_sql("SELECT * FROM bookings WHERE room = '7'").unwrap(),
            Command::ListByRoom { room: "7".into() }
        );
        assert_eq!(
            parse_sql("SELECT * FROM bookings WHERE date = '260102' AND hour = 9 AND room = '7'").unwrap(),
            Command::Search { date: "260102".into(), hour: 9, room: "7".into() }
        );
    }

    #[test]
    fn parse_select_waitlist() {
        let sql = "SELECT * FROM waitlist WHERE date = '260102' AND hour = 9 AND room = '7'";
        assert_eq!(
            parse_sql(sql).unwrap(),
            Command::ViewWaitlist { date: "260102".into(), hour: 9, room: "7".into() }
        );
        let sql = "SELECT * FROM waitlist WHERE date = '260102'";
        assert!(matches!(parse_sql(sql), Err(SqlError::MissingFilter("hour"))));
    }

    #[test]
    fn parse_select_odd_filter_combination() {
        let sql = "SELECT * FROM bookings WHERE date = '260102' AND hour = 9";
        assert!(matches!(parse_sql(sql), Err(SqlError::Unsupported(_))));
    }

    #[test]
    fn parse_select_non_equality_rejected() {
        let sql = "SELECT * FROM bookings WHERE hour > 9";
        assert!(matches!(parse_sql(sql), Err(SqlError::Unsupported(_))));
    }

    #[test]
    fn parse_unknown_column() {
        let sql = "SELECT * FROM bookings WHERE lecturer = 'Tan'";
        assert!(matches!(parse_sql(sql), Err(SqlError::UnknownColumn(c)) if c == "lecturer"));
    }

    #[test]
    fn parse_unknown_table_errors() {
        assert!(matches!(
            parse_sql("SELECT * FROM rooms"),
            Err(SqlError::UnknownTable(t)) if t == "rooms"
        ));
        assert!(matches!(
            parse_sql("INSERT INTO waitlist VALUES ('260102', 10, 1, '5', 'a', 'b')"),
            Err(SqlError::UnknownTable(_))
        ));
    }

    #[test]
    fn parse_empty_errors() {
        assert!(matches!(parse_sql(""), Err(SqlError::Empty)));
    }

    #[test]
    fn command_labels() {
        assert_eq!(Command::ListAll.label(), "list_all");
        assert_eq!(parse_sql("SELECT * FROM bookings WHERE room = '1'").unwrap().label(), "list_by_room");
    }
}
