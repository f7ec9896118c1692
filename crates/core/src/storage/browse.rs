/// Columns the stored-event listing may be ordered by. Only these names ever reach the
/// `ORDER BY` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Id,
    Ticker,
    TargetFrom,
    TargetTo,
    Company,
    Action,
    Brokerage,
    RatingFrom,
    RatingTo,
    #[default]
    Time,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    const ALL: [SortField; 12] = [
        SortField::Id,
        SortField::Ticker,
        SortField::TargetFrom,
        SortField::TargetTo,
        SortField::Company,
        SortField::Action,
        SortField::Brokerage,
        SortField::RatingFrom,
        SortField::RatingTo,
        SortField::Time,
        SortField::CreatedAt,
        SortField::UpdatedAt,
    ];

    pub fn column(self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Ticker => "ticker",
            SortField::TargetFrom => "target_from",
            SortField::TargetTo => "target_to",
            SortField::Company => "company",
            SortField::Action => "action",
            SortField::Brokerage => "brokerage",
            SortField::RatingFrom => "rating_from",
            SortField::RatingTo => "rating_to",
            SortField::Time => "time",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }

    /// Case-insensitive, whitespace-tolerant lookup by column name.
    pub fn parse(raw: &str) -> Option<Self> {
        let wanted = raw.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|f| f.column() == wanted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// Ordering for [`PgRatingEventStore::list`](crate::storage::PgRatingEventStore::list).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventSort {
    pub field: SortField,
    pub order: SortOrder,
}

impl EventSort {
    /// Unknown or missing values fall back to `time` / `desc` independently.
    pub fn sanitize(field: Option<&str>, order: Option<&str>) -> Self {
        Self {
            field: field.and_then(SortField::parse).unwrap_or_default(),
            order: order.and_then(SortOrder::parse).unwrap_or_default(),
        }
    }

    /// `ORDER BY` body. `id` breaks ties so pages don't overlap.
    pub(crate) fn order_by(&self) -> String {
        let dir = self.order.as_sql();
        match self.field {
            SortField::Id => format!("id {dir}"),
            field => format!("{} {dir}, id {dir}", field.column()),
        }
    }
}

/// `ILIKE` pattern matching `query` anywhere, with LIKE metacharacters taken literally.
pub(crate) fn contains_pattern(query: &str) -> String {
    let mut out = String::with_capacity(query.len() + 2);
    out.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}
